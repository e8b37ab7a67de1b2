//! # Response Writer
//! src/server/writer.rs
//!
//! Envuelve la escritura sobre la conexión y loguea cada write.

use crate::http::Response;
use std::io::{self, Write};
use tracing::debug;

/// Writer de respuestas sobre una conexión
pub struct ResponseWriter<'a, W: Write> {
    inner: &'a mut W,
    written: usize,
}

impl<'a, W: Write> ResponseWriter<'a, W> {
    pub fn new(inner: &'a mut W) -> Self {
        Self { inner, written: 0 }
    }

    /// Escribe la respuesta completa
    ///
    /// Con `head_only` (requests HEAD) se omite el body pero se mantiene el
    /// `Content-Length` original. Retorna los bytes escritos.
    pub fn send(&mut self, response: &Response, head_only: bool) -> io::Result<usize> {
        self.write_all(&response.head_bytes())?;
        if !head_only {
            self.write_all(response.body())?;
        }
        self.flush()?;
        Ok(self.written)
    }

    /// Bytes escritos hasta ahora
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> Write for ResponseWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        debug!("writing: {}", String::from_utf8_lossy(buf));
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    /// Writer que acepta a lo sumo `chunk` bytes por llamada
    struct ChunkedSink {
        data: Vec<u8>,
        chunk: usize,
        calls: usize,
    }

    impl Write for ChunkedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.chunk);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_full_response() {
        let response = Response::html("<h1>Hello world</h1>");
        let mut out = Vec::new();

        let written = ResponseWriter::new(&mut out).send(&response, false).unwrap();

        assert_eq!(out, response.to_bytes());
        assert_eq!(written, out.len());
    }

    #[test]
    fn test_send_head_only() {
        let response = Response::html("<h1>Hello world</h1>");
        let mut out = Vec::new();

        ResponseWriter::new(&mut out).send(&response, true).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Content-Length: 20\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_short_writes_are_completed() {
        let response = Response::new(StatusCode::Ok).with_body("0123456789");
        let mut sink = ChunkedSink {
            data: Vec::new(),
            chunk: 3,
            calls: 0,
        };

        let written = ResponseWriter::new(&mut sink).send(&response, false).unwrap();

        assert_eq!(sink.data, response.to_bytes());
        assert_eq!(written, sink.data.len());
        assert!(sink.calls > 2);
    }

    #[test]
    fn test_write_error_propagates() {
        let response = Response::not_found();
        let mut sink = BrokenPipe;

        let mut writer = ResponseWriter::new(&mut sink);
        let err = writer.send(&response, false).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(writer.written(), 0);
    }
}
