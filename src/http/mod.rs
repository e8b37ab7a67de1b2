//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa el protocolo HTTP/1.0 desde cero, sin librerías de alto nivel:
//!
//! - Parsing de requests (request line, headers MIME, body)
//! - Mapa de headers case-insensitive
//! - Construcción y serialización de responses
//! - Códigos de estado
//!
//! ## Especificación HTTP/1.0
//!
//! El protocolo HTTP/1.0 (RFC 1945) es más simple que HTTP/1.1:
//! - No requiere el header `Host`
//! - No tiene chunked transfer encoding
//! - No mantiene conexiones persistentes: una conexión, un request
//!
//! ### Formato de Request
//!
//! ```text
//! METHOD SP URI SP VERSION CRLF
//! Key: Value CRLF
//! CRLF
//! [body]
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! VERSION SP STATUS SP REASON CRLF
//! Key: Value CRLF
//! CRLF
//! [body]
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod status;

pub use headers::Headers;
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
