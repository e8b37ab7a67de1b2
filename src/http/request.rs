//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser que consume bytes de una conexión y produce un [`Request`].
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /echo HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Etapas
//!
//! 1. **Request Line**: `METHOD URI VERSION`, exactamente tres tokens
//! 2. **Headers**: líneas `Key: Value` hasta una línea vacía. Las líneas que
//!    empiezan con espacio o tab continúan el valor anterior.
//! 3. **Body**: vacío para GET/HEAD. Para el resto:
//!    - con `Content-Length`, se leen exactamente esos bytes (si supera el
//!      límite, [`ParseError::BodyTooLarge`])
//!    - sin `Content-Length`, una sola lectura de hasta `max_body_bytes`;
//!      lo que sobre se descarta sin aviso. Es una limitación conocida.
//!
//! No hay soporte para chunked encoding.

use super::headers::{canonical_key, Headers};
use super::StatusCode;
use crate::limits::RequestLimits;
use std::fmt;
use std::io::{self, BufRead, Read};
use thiserror::Error;
use tracing::debug;

/// Método HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    /// Cualquier otro token (se conserva tal cual)
    Other(String),
}

impl Method {
    /// Interpreta un token de método. Nunca falla.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(token) => token,
        }
    }

    /// GET y HEAD nunca llevan body
    pub fn has_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// El peer cerró sin mandar nada
    #[error("empty request")]
    EmptyRequest,

    /// EOF antes de terminar headers o body
    #[error("incomplete HTTP request")]
    IncompleteRequest,

    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),

    #[error("invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("invalid header: {0:?}")]
    InvalidHeader(String),

    #[error("request is not valid UTF-8")]
    InvalidEncoding,

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("body of {declared} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { declared: usize, limit: usize },

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Status con el que se le responde al cliente, si corresponde
    ///
    /// `None` cuando no tiene sentido responder: el peer no mandó nada o la
    /// conexión ya falló a nivel de I/O.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ParseError::EmptyRequest | ParseError::Io(_) => None,
            ParseError::BodyTooLarge { .. } => Some(StatusCode::PayloadTooLarge),
            _ => Some(StatusCode::BadRequest),
        }
    }
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD, POST, ...)
    method: Method,

    /// URI cruda, con query y fragmento sin parsear
    uri: String,

    /// Versión del protocolo (ej: "HTTP/1.0")
    version: String,

    headers: Headers,

    /// Body (vacío para GET/HEAD), nunca mayor a `max_body_bytes`
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request desde bytes en memoria con los límites por defecto
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use raw_http_server::http::Request;
    ///
    /// let raw = b"GET /hello?name=x HTTP/1.0\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.uri(), "/hello?name=x");
    /// assert_eq!(request.header("host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let mut reader = buffer;
        Self::read_from(&mut reader, &RequestLimits::default())
    }

    /// Lee exactamente un request desde `reader`
    ///
    /// No lee más allá del body: si el cliente mandó bytes extra quedan en
    /// el buffer del reader.
    pub fn read_from<R: BufRead>(reader: &mut R, limits: &RequestLimits) -> Result<Self, ParseError> {
        // 1. Request line
        let line = read_line(reader, limits.max_line_bytes)?.ok_or(ParseError::EmptyRequest)?;
        let (method, uri, version) = parse_request_line(&line)?;
        debug!(%method, %uri, %version, "parsed request line");

        // 2. Headers
        let headers = read_headers(reader, limits.max_line_bytes)?;
        for (name, values) in headers.iter() {
            for value in values {
                debug!("    {}: {}", name, value);
            }
        }

        // 3. Body
        let body = if method.has_body() {
            read_body(reader, &headers, limits.max_body_bytes)?
        } else {
            Vec::new()
        };
        if !body.is_empty() {
            debug!(bytes = body.len(), body = %String::from_utf8_lossy(&body), "request body");
        }

        Ok(Request {
            method,
            uri,
            version,
            headers,
            body,
        })
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URI tal como llegó en la request line
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Primer valor de un header (búsqueda case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }
}

/// Lee una línea terminada en CRLF (también acepta LF solo)
///
/// Retorna `None` si hay EOF antes de leer cualquier byte. La línea se
/// devuelve sin el terminador.
fn read_line<R: BufRead>(reader: &mut R, max_len: usize) -> Result<Option<String>, ParseError> {
    let mut buf = Vec::new();
    // +2 para dejar entrar el CRLF de una línea de largo exactamente `max_len`
    let read = reader
        .by_ref()
        .take(max_len as u64 + 2)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > max_len {
        return Err(ParseError::LineTooLong { limit: max_len });
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ParseError::InvalidEncoding)
}

/// Parsea la request line: `METHOD URI VERSION`
fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    // Debe tener exactamente 3 partes
    let [method, uri, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine(line.to_string()));
    };

    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidHttpVersion(version.to_string()));
    }

    Ok((Method::parse(method), uri.to_string(), version.to_string()))
}

/// Lee headers hasta la línea vacía
///
/// Una línea que empieza con espacio o tab continúa el valor del header
/// anterior (se une con un espacio).
fn read_headers<R: BufRead>(reader: &mut R, max_line: usize) -> Result<Headers, ParseError> {
    let mut headers = Headers::new();
    let mut last_key: Option<String> = None;

    loop {
        let line = read_line(reader, max_line)?.ok_or(ParseError::IncompleteRequest)?;

        // La línea vacía marca el fin de los headers
        if line.is_empty() {
            return Ok(headers);
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let folded = last_key
                .as_deref()
                .is_some_and(|key| headers.extend_last(key, line.trim()));
            if !folded {
                return Err(ParseError::InvalidHeader(line));
            }
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(ParseError::InvalidHeader(line));
        };
        if name.is_empty() || name.contains(|c: char| c.is_ascii_whitespace()) {
            return Err(ParseError::InvalidHeader(line));
        }

        let key = canonical_key(name);
        headers.append(&key, value.trim());
        last_key = Some(key);
    }
}

/// Lee el body de un método que lo admite
fn read_body<R: BufRead>(reader: &mut R, headers: &Headers, limit: usize) -> Result<Vec<u8>, ParseError> {
    let Some(declared) = content_length(headers.get_all("Content-Length"))? else {
        // Sin Content-Length: una sola lectura, lo que exceda el tope se pierde
        let mut body = vec![0u8; limit];
        let read = reader.read(&mut body)?;
        body.truncate(read);
        return Ok(body);
    };

    if declared > limit {
        return Err(ParseError::BodyTooLarge { declared, limit });
    }

    let mut body = vec![0u8; declared];
    reader.read_exact(&mut body).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ParseError::IncompleteRequest,
        _ => ParseError::Io(e),
    })?;
    Ok(body)
}

/// Interpreta los valores de `Content-Length`
///
/// Solo dígitos ASCII (sin signo). Si el header se repite, todos los valores
/// tienen que coincidir.
fn content_length(values: &[String]) -> Result<Option<usize>, ParseError> {
    let mut declared = None;
    for raw in values {
        let value = raw.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidContentLength(raw.clone()));
        }
        let parsed: usize = value
            .parse()
            .map_err(|_| ParseError::InvalidContentLength(raw.clone()))?;
        match declared {
            Some(previous) if previous != parsed => {
                return Err(ParseError::InvalidContentLength(values.join(", ")));
            }
            _ => declared = Some(parsed),
        }
    }
    Ok(declared)
}
