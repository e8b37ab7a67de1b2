//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Los handlers devuelven un [`Response`]; el Server Loop lo serializa y lo
//! escribe en la conexión. Así los handlers se pueden probar sin sockets.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html; charset=utf-8\r\n
//! Content-Length: 20\r\n
//! \r\n
//! <h1>Hello world</h1>
//! ```
//!
//! Los headers se serializan en el orden en que se agregaron, así que la
//! salida es reproducible byte a byte.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use raw_http_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("Hello");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;

/// Versión con la que responde el servidor
pub const HTTP_VERSION: &str = "HTTP/1.0";

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción, sin claves repetidas
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (builder)
    ///
    /// Si el header ya existe (comparando sin mayúsculas) se sobrescribe en
    /// su posición original.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body desde un string y actualiza `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el body desde bytes y actualiza `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// 200 OK con body HTML
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::Response;
    ///
    /// let response = Response::html("<h1>Hi</h1>");
    /// assert_eq!(response.header("content-length"), Some("11"));
    /// ```
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", CONTENT_TYPE_HTML)
            .with_body(body)
    }

    /// Respuesta de error: body vacío y `Connection: close`
    pub fn error(status: StatusCode) -> Self {
        Self::new(status)
            .with_header("Content-Type", CONTENT_TYPE_TEXT)
            .with_body_bytes(Vec::new())
            .with_header("Connection", "close")
    }

    /// 404 Not Found con body vacío
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    /// Status line, headers y línea vacía (sin body)
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        // Formato: HTTP/1.0 200 OK\r\n
        result.extend_from_slice(format!("{} {}\r\n", HTTP_VERSION, self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para enviar por el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Valor de un header (búsqueda case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
