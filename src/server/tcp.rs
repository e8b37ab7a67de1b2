//! # Server Loop
//! src/server/tcp.rs
//!
//! Orquesta el ciclo completo de cada conexión, de a una por vez:
//!
//! ```text
//! Idle → Accepting → Reading → Routing → Writing → (close) → Accepting
//! ```
//!
//! - Un error de parse, de routing o de escritura se loguea y el loop vuelve
//!   a aceptar. Nunca termina el proceso.
//! - El socket de la conexión se cierra siempre, exactamente una vez, antes
//!   de aceptar la siguiente. Antes del close se manda FIN y se descarta lo
//!   que el cliente no alcanzó a enviar, para que no reciba un RST en lugar
//!   de la response.
//! - Si `accept` falla, el loop espera (backoff exponencial) antes de
//!   reintentar.
//! - Todo es bloqueante: un cliente lento detiene al servidor completo.

use super::backoff::accept_backoff;
use super::ResponseWriter;
use crate::config::Config;
use crate::error::{ServerError, SetupError};
use crate::http::{Method, Request, Response, StatusCode};
use crate::limits::RequestLimits;
use crate::metrics::ConnectionCounters;
use crate::net::{bind_listener, Acceptor, Connection, SocketHandle};
use crate::router::Router;
use std::io::{self, BufReader, Read};
use std::net::SocketAddr;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Servidor HTTP/1.0 secuencial
pub struct Server<A: Acceptor = SocketHandle> {
    acceptor: A,
    router: Router,
    limits: RequestLimits,
    counters: ConnectionCounters,
}

impl Server<SocketHandle> {
    /// Crea el socket de escucha según la configuración
    ///
    /// Un fallo acá es fatal para el arranque.
    pub fn bind(config: &Config, router: Router) -> Result<Self, SetupError> {
        let listener = bind_listener(config.ip_addr, config.port)?;
        Ok(Self::new(listener, router, RequestLimits::from_config(config)))
    }

    /// Dirección real de escucha (relevante si se pidió el puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }
}

impl<A: Acceptor> Server<A> {
    /// La Route Table se recibe ya armada y no se modifica más
    pub fn new(acceptor: A, router: Router, limits: RequestLimits) -> Self {
        Self {
            acceptor,
            router,
            limits,
            counters: ConnectionCounters::new(),
        }
    }

    pub fn counters(&self) -> &ConnectionCounters {
        &self.counters
    }

    /// Atiende conexiones para siempre
    pub fn run(&self) -> ! {
        info!(routes = ?self.router, "serving one connection at a time");
        let mut accept_failures = 0;
        loop {
            accept_failures = self.serve_next(accept_failures);
        }
    }

    /// Un paso del loop: atiende una conexión y, si `accept` falló, espera
    /// antes de volver
    ///
    /// Recibe y retorna la cantidad de fallos de accept consecutivos.
    fn serve_next(&self, accept_failures: u32) -> u32 {
        match self.serve_one() {
            Ok(()) => 0,
            Err(ServerError::Accept(e)) => {
                let failures = accept_failures.saturating_add(1);
                let delay = accept_backoff(failures);
                warn!(
                    error = %e,
                    failures,
                    delay_ms = delay.as_millis() as u64,
                    "accept failed, backing off"
                );
                thread::sleep(delay);
                failures
            }
            Err(e) => {
                warn!(error = %e, "connection failed");
                0
            }
        }
    }

    /// Atiende exactamente una conexión: accept, request, response, close
    pub fn serve_one(&self) -> Result<(), ServerError> {
        debug!("accepting");
        let mut conn = self.acceptor.accept().map_err(ServerError::Accept)?;
        self.counters.record_accepted();

        let start = Instant::now();
        let peer = conn
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(%peer, "incoming connection");

        let outcome = self.exchange(&mut conn);
        self.drain(&mut conn);
        let closed = conn.close();
        self.counters.record_closed();

        let result = match (outcome, closed) {
            (Ok(status), Ok(())) => {
                info!(
                    %peer,
                    status = status.as_u16(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "connection closed"
                );
                Ok(())
            }
            (Ok(_), Err(e)) => Err(ServerError::Close(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!(%peer, error = %close_err, "failed closing connection");
                Err(e)
            }
        };

        if result.is_err() {
            self.counters.record_failed();
        }
        result
    }

    /// Reading → Routing → Writing sobre una conexión ya aceptada
    fn exchange(&self, conn: &mut A::Conn) -> Result<StatusCode, ServerError> {
        debug!("reading request");
        let parsed = {
            let mut reader = BufReader::new(&mut *conn);
            Request::read_from(&mut reader, &self.limits)
        };

        let request = match parsed {
            Ok(request) => request,
            Err(e) => {
                if let Some(status) = e.status() {
                    // Mejor esfuerzo: la conexión se abandona igual
                    let response = Response::error(status);
                    if let Err(write_err) = ResponseWriter::new(&mut *conn).send(&response, false) {
                        debug!(error = %write_err, "could not report parse error");
                    }
                }
                return Err(ServerError::Parse(e));
            }
        };

        debug!(uri = request.uri(), "routing");
        let (response, routed) = match self.router.route(&request) {
            Ok(response) => (response, Ok(())),
            Err(e) => (Response::not_found(), Err(e)),
        };

        debug!(status = %response.status(), "writing response");
        let head_only = *request.method() == Method::Head;
        ResponseWriter::new(&mut *conn)
            .send(&response, head_only)
            .map_err(ServerError::Write)?;

        routed?;
        Ok(response.status())
    }

    /// Manda FIN y descarta lo que quede sin leer del request
    ///
    /// Cerrar con bytes pendientes en el buffer de recepción hace que el
    /// kernel mande RST, y el cliente puede perder la response. El descarte
    /// está acotado en bytes y en tiempo de espera.
    fn drain(&self, conn: &mut A::Conn) {
        if let Err(e) = conn.shutdown_write() {
            debug!(error = %e, "shutdown before close failed");
            return;
        }
        if let Err(e) = conn.set_read_timeout(Some(self.limits.drain_timeout)) {
            debug!(error = %e, "could not set drain timeout");
            return;
        }

        let mut pending = (&mut *conn).take(self.limits.drain_bytes as u64);
        match io::copy(&mut pending, &mut io::sink()) {
            Ok(0) => {}
            Ok(discarded) => debug!(discarded, "discarded unread request bytes"),
            Err(e) => debug!(error = %e, "stopped draining"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::default_router;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::{Cursor, Write};
    use std::rc::Rc;
    use std::time::Duration;

    /// Registro compartido de lo que hizo cada conexión
    #[derive(Default)]
    struct Ledger {
        closed: usize,
        outputs: Vec<Vec<u8>>,
        /// Si se hizo shutdown de escritura antes de cada close
        shut_before_close: Vec<bool>,
        /// Bytes del request que quedaron sin leer al cerrar
        unread: Vec<u64>,
    }

    struct MockConn {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        fail_writes: bool,
        shut: bool,
        ledger: Rc<RefCell<Ledger>>,
    }

    impl MockConn {
        fn new(input: &[u8], fail_writes: bool, ledger: &Rc<RefCell<Ledger>>) -> Self {
            MockConn {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
                fail_writes,
                shut: false,
                ledger: Rc::clone(ledger),
            }
        }
    }

    impl Read for MockConn {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockConn {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Connection for MockConn {
        fn close(self) -> io::Result<()> {
            let unread = self.input.get_ref().len() as u64 - self.input.position();
            let mut ledger = self.ledger.borrow_mut();
            ledger.closed += 1;
            ledger.outputs.push(self.output);
            ledger.shut_before_close.push(self.shut);
            ledger.unread.push(unread);
            Ok(())
        }

        fn shutdown_write(&mut self) -> io::Result<()> {
            self.shut = true;
            Ok(())
        }
    }

    struct MockAcceptor {
        pending: RefCell<VecDeque<MockConn>>,
        accepted: RefCell<usize>,
    }

    impl Acceptor for MockAcceptor {
        type Conn = MockConn;

        fn accept(&self) -> io::Result<MockConn> {
            let conn = self
                .pending
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))?;
            *self.accepted.borrow_mut() += 1;
            Ok(conn)
        }
    }

    fn mock_server(requests: &[&str], fail_writes: bool) -> (Server<MockAcceptor>, Rc<RefCell<Ledger>>) {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let pending = requests
            .iter()
            .map(|raw| MockConn::new(raw.as_bytes(), fail_writes, &ledger))
            .collect();
        let acceptor = MockAcceptor {
            pending: RefCell::new(pending),
            accepted: RefCell::new(0),
        };
        let server = Server::new(acceptor, default_router(), RequestLimits::default());
        (server, ledger)
    }

    fn output_text(ledger: &Rc<RefCell<Ledger>>, index: usize) -> String {
        String::from_utf8(ledger.borrow().outputs[index].clone()).unwrap()
    }

    #[test]
    fn test_serve_hello() {
        let (server, ledger) = mock_server(&["GET /hello HTTP/1.0\r\n\r\n"], false);

        server.serve_one().unwrap();

        let text = output_text(&ledger, 0);
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Length: 20\r\n"));
        assert!(text.ends_with("<h1>Hello world</h1>"));
    }

    #[test]
    fn test_every_connection_closed_exactly_once() {
        let requests = [
            "GET /hello HTTP/1.0\r\n\r\n",
            "GARBAGE\r\n\r\n",
            "",
            "POST /echo HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello",
            "GET /anything HTTP/1.0\r\n\r\n",
        ];
        let (server, ledger) = mock_server(&requests, false);

        for _ in 0..requests.len() {
            let _ = server.serve_one();
        }

        assert_eq!(*server.acceptor.accepted.borrow(), 5);
        assert_eq!(ledger.borrow().closed, 5);

        let snapshot = server.counters().snapshot();
        assert_eq!(snapshot.accepted, 5);
        assert_eq!(snapshot.closed, 5);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(server.counters().open(), 0);
    }

    #[test]
    fn test_parse_error_does_not_stop_the_loop() {
        let (server, ledger) = mock_server(
            &["NONSENSE\r\n\r\n", "GET /hello HTTP/1.0\r\n\r\n"],
            false,
        );

        let first = server.serve_one().unwrap_err();
        assert!(matches!(first, ServerError::Parse(_)));
        assert!(!first.is_fatal());
        assert!(output_text(&ledger, 0).starts_with("HTTP/1.0 400 Bad Request\r\n"));

        server.serve_one().unwrap();
        assert!(output_text(&ledger, 1).starts_with("HTTP/1.0 200 OK\r\n"));
    }

    #[test]
    fn test_empty_connection_gets_no_response() {
        let (server, ledger) = mock_server(&[""], false);

        let err = server.serve_one().unwrap_err();
        assert!(matches!(err, ServerError::Parse(_)));
        assert!(ledger.borrow().outputs[0].is_empty());
        assert_eq!(ledger.borrow().closed, 1);
    }

    #[test]
    fn test_body_too_large_gets_413() {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let acceptor = MockAcceptor {
            pending: RefCell::new(VecDeque::from([MockConn::new(
                b"POST /echo HTTP/1.0\r\nContent-Length: 10\r\n\r\n0123456789",
                false,
                &ledger,
            )])),
            accepted: RefCell::new(0),
        };
        let limits = RequestLimits {
            max_body_bytes: 4,
            ..RequestLimits::default()
        };
        let server = Server::new(acceptor, default_router(), limits);

        assert!(server.serve_one().is_err());
        let text = output_text(&ledger, 0);
        assert!(text.starts_with("HTTP/1.0 413 Payload Too Large\r\n"));
        assert!(text.contains("Connection: close\r\n"));

        // El body rechazado se descarta después del FIN, antes del close
        assert_eq!(ledger.borrow().shut_before_close, vec![true]);
        assert_eq!(ledger.borrow().unread, vec![0]);
    }

    #[test]
    fn test_unmatched_route_gets_404_consistently() {
        let mut router = Router::new();
        router.register("/only", |_req: &Request| Response::html("only"));

        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let pending = (0..3)
            .map(|_| MockConn::new(b"GET /missing HTTP/1.0\r\n\r\n", false, &ledger))
            .collect();
        let acceptor = MockAcceptor {
            pending: RefCell::new(pending),
            accepted: RefCell::new(0),
        };
        let server = Server::new(acceptor, router, RequestLimits::default());

        for _ in 0..3 {
            let err = server.serve_one().unwrap_err();
            assert!(matches!(err, ServerError::Route(_)));
        }

        let expected = Response::not_found().to_bytes();
        for output in &ledger.borrow().outputs {
            assert_eq!(output, &expected);
        }
        assert_eq!(ledger.borrow().closed, 3);
    }

    #[test]
    fn test_write_error_closes_connection() {
        let (server, ledger) = mock_server(&["GET /hello HTTP/1.0\r\n\r\n"], true);

        let err = server.serve_one().unwrap_err();
        assert!(matches!(err, ServerError::Write(_)));
        assert_eq!(ledger.borrow().closed, 1);
    }

    #[test]
    fn test_head_request_omits_body() {
        let (server, ledger) = mock_server(&["HEAD /hello HTTP/1.0\r\n\r\n"], false);

        server.serve_one().unwrap();

        let text = output_text(&ledger, 0);
        assert!(text.contains("Content-Length: 20\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_accept_error_is_reported() {
        let (server, ledger) = mock_server(&[], false);

        let err = server.serve_one().unwrap_err();
        assert!(matches!(err, ServerError::Accept(_)));
        assert_eq!(ledger.borrow().closed, 0);
        assert_eq!(server.counters().snapshot().accepted, 0);
    }

    /// Atiende un POST con 100000 bytes de body contra un tope de 16 y
    /// retorna cuántos bytes quedaron sin leer al cerrar
    fn unread_after_rejected_body(drain_bytes: usize) -> u64 {
        let ledger = Rc::new(RefCell::new(Ledger::default()));
        let mut raw = b"POST /echo HTTP/1.0\r\nContent-Length: 100000\r\n\r\n".to_vec();
        raw.extend(std::iter::repeat(b'x').take(100_000));
        let acceptor = MockAcceptor {
            pending: RefCell::new(VecDeque::from([MockConn::new(&raw, false, &ledger)])),
            accepted: RefCell::new(0),
        };
        let limits = RequestLimits {
            max_body_bytes: 16,
            drain_bytes,
            ..RequestLimits::default()
        };
        let server = Server::new(acceptor, default_router(), limits);

        assert!(server.serve_one().is_err());
        assert!(output_text(&ledger, 0).starts_with("HTTP/1.0 413 Payload Too Large\r\n"));
        assert_eq!(ledger.borrow().shut_before_close, vec![true]);
        let unread = ledger.borrow().unread[0];
        unread
    }

    #[test]
    fn test_rejected_body_is_drained_before_close() {
        assert_eq!(unread_after_rejected_body(256 * 1024), 0);
    }

    #[test]
    fn test_drain_is_bounded() {
        assert!(unread_after_rejected_body(1000) > 0);
    }

    /// Acceptor que siempre falla como si no quedaran descriptores
    struct ExhaustedAcceptor {
        calls: Cell<usize>,
    }

    impl Acceptor for ExhaustedAcceptor {
        type Conn = MockConn;

        fn accept(&self) -> io::Result<MockConn> {
            self.calls.set(self.calls.get() + 1);
            Err(io::Error::from_raw_os_error(libc::EMFILE))
        }
    }

    #[test]
    fn test_failing_accept_backs_off() {
        let acceptor = ExhaustedAcceptor { calls: Cell::new(0) };
        let server = Server::new(acceptor, default_router(), RequestLimits::default());

        let start = Instant::now();
        let mut failures = 0;
        while start.elapsed() < Duration::from_millis(100) {
            failures = server.serve_next(failures);
        }

        // 10 + 20 + 40 + 80 ms: unas pocas llamadas, no millones
        let calls = server.acceptor.calls.get();
        assert!(calls <= 8, "accept called {} times in 100ms", calls);
        assert_eq!(failures as usize, calls);
        assert_eq!(server.counters().snapshot().accepted, 0);
    }

    #[test]
    fn test_served_connection_resets_accept_failures() {
        let (server, ledger) = mock_server(&["GET /hello HTTP/1.0\r\n\r\n"], false);

        assert_eq!(server.serve_next(5), 0);
        assert_eq!(ledger.borrow().closed, 1);

        // Sin conexiones pendientes el mock falla en accept
        assert_eq!(server.serve_next(0), 1);
    }
}
