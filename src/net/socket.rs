//! # Socket Handle
//! src/net/socket.rs
//!
//! Envoltura delgada sobre un descriptor de socket del SO.
//!
//! Operaciones (todas bloqueantes y sin cancelación; las lecturas solo tienen
//! timeout si se pide con `set_read_timeout`):
//!
//! - `read`: bloquea hasta que haya al menos 1 byte o el peer cierre (0 = EOF)
//! - `write`: bloquea hasta que el SO acepte los bytes
//! - `accept`: bloquea hasta que exista una conexión pendiente
//! - `close`: libera el descriptor. Consume el handle, así que no se puede
//!   cerrar dos veces.
//! - `shutdown_write`: manda FIN sin liberar el descriptor; se puede seguir
//!   leyendo lo que el peer mande.
//!
//! Los errores del SO se propagan tal cual, excepto `EINTR`, que se reintenta.

use socket2::Socket;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};
use std::time::Duration;

/// Stream de una conexión aceptada, visto por el Server Loop
///
/// Se cierra exactamente una vez al terminar el ciclo request/response.
pub trait Connection: Read + Write {
    /// Libera el recurso. Consume la conexión.
    fn close(self) -> io::Result<()>;

    /// Dirección del cliente, si se conoce (solo para logs)
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Cierra el lado de escritura; el peer ve EOF después de la response
    fn shutdown_write(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Tope de espera para cada lectura siguiente (`None` = sin tope)
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// Fuente de conexiones entrantes
pub trait Acceptor {
    type Conn: Connection;

    /// Bloquea hasta que llegue una conexión
    fn accept(&self) -> io::Result<Self::Conn>;
}

/// Descriptor de socket del SO (de escucha o de conexión)
#[derive(Debug)]
pub struct SocketHandle {
    inner: Socket,
    peer: Option<SocketAddr>,
}

impl SocketHandle {
    pub(crate) fn from_socket(inner: Socket) -> Self {
        Self { inner, peer: None }
    }

    /// Descriptor crudo
    pub fn fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    /// Dirección local a la que está bindeado el socket
    ///
    /// Útil cuando se bindea al puerto 0 y el SO elige uno libre.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()?.as_socket().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "socket is not an inet socket")
        })
    }

    /// Acepta una conexión pendiente
    ///
    /// El nuevo descriptor se crea con close-on-exec.
    pub fn accept(&self) -> io::Result<SocketHandle> {
        let (socket, addr) = retry_interrupted(|| self.inner.accept())?;
        Ok(SocketHandle {
            inner: socket,
            peer: addr.as_socket(),
        })
    }

    /// Cierra el descriptor con `close(2)` y reporta su error
    pub fn close(self) -> io::Result<()> {
        let fd = self.inner.into_raw_fd();
        // SAFETY: `into_raw_fd` transfiere la propiedad del descriptor,
        // nadie más lo va a cerrar.
        let rc = unsafe { libc::close(fd) };
        // EINTR no se reintenta: en Linux el descriptor ya quedó liberado.
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Reintenta una syscall interrumpida por una señal
fn retry_interrupted<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

impl Read for SocketHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let socket = &self.inner;
        retry_interrupted(|| (&*socket).read(&mut *buf))
    }
}

impl Write for SocketHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let socket = &self.inner;
        retry_interrupted(|| (&*socket).write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        // Sin buffer propio: cada write ya es una syscall
        Ok(())
    }
}

impl Connection for SocketHandle {
    fn close(self) -> io::Result<()> {
        SocketHandle::close(self)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn shutdown_write(&mut self) -> io::Result<()> {
        self.inner.shutdown(Shutdown::Write)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.inner.set_read_timeout(timeout)
    }
}

impl Acceptor for SocketHandle {
    type Conn = SocketHandle;

    fn accept(&self) -> io::Result<SocketHandle> {
        SocketHandle::accept(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::bind_listener;
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use std::thread;

    fn loopback_listener() -> SocketHandle {
        bind_listener(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).expect("bind")
    }

    #[test]
    fn test_retry_interrupted_retries_eintr() {
        let mut calls = 0;
        let result = retry_interrupted(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from(io::ErrorKind::Interrupted))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_interrupted_propagates_other_errors() {
        let result: io::Result<()> =
            retry_interrupted(|| Err(io::Error::from(io::ErrorKind::ConnectionReset)));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_accept_read_write_close() {
        let listener = loopback_listener();
        let addr = listener.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"ping").unwrap();
            let mut reply = Vec::new();
            stream.read_to_end(&mut reply).unwrap();
            reply
        });

        let mut conn = listener.accept().unwrap();
        assert!(conn.peer_addr().is_some());

        let mut buf = [0u8; 4];
        conn.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        conn.write_all(b"pong").unwrap();
        conn.close().unwrap();

        assert_eq!(client.join().unwrap(), b"pong");
    }

    #[test]
    fn test_read_returns_zero_on_peer_close() {
        let listener = loopback_listener();
        let addr = listener.local_addr().unwrap();

        drop(TcpStream::connect(addr).unwrap());

        let mut conn = listener.accept().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(conn.read(&mut buf).unwrap(), 0);
        conn.close().unwrap();
    }

    #[test]
    fn test_shutdown_write_sends_eof_but_keeps_reading() {
        let listener = loopback_listener();
        let addr = listener.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let mut reply = Vec::new();
            // EOF llega por el shutdown, antes del close
            stream.read_to_end(&mut reply).unwrap();
            stream.write_all(b"late").unwrap();
            reply
        });

        let mut conn = listener.accept().unwrap();
        conn.write_all(b"done").unwrap();
        Connection::shutdown_write(&mut conn).unwrap();

        let mut late = Vec::new();
        conn.read_to_end(&mut late).unwrap();
        assert_eq!(late, b"late");
        assert_eq!(client.join().unwrap(), b"done");
        conn.close().unwrap();
    }

    #[test]
    fn test_read_timeout_expires() {
        let listener = loopback_listener();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).unwrap();

        let mut conn = listener.accept().unwrap();
        Connection::set_read_timeout(&mut conn, Some(Duration::from_millis(20))).unwrap();

        let mut buf = [0u8; 8];
        let err = conn.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
        conn.close().unwrap();
    }

    #[test]
    fn test_read_with_empty_buffer() {
        let mut handle = loopback_listener();
        let mut empty: [u8; 0] = [];
        assert_eq!(handle.read(&mut empty).unwrap(), 0);
    }
}
