//! # Raw HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 mínimo construido directamente sobre syscalls de
//! sockets, sin librerías de red ni de HTTP de alto nivel. Muestra el ciclo
//! de vida de los sockets, el parsing de request line y headers, y el
//! despacho por prefijo de path.
//!
//! ## Arquitectura
//!
//! De la hoja a la raíz:
//! - `net`: Socket Handle y Listener Factory (`socket`/`bind`/`listen`/`accept`)
//! - `http`: parsing de requests, headers, responses y status codes
//! - `router`: Route Table con resolución por prefijo más largo
//! - `handlers`: handlers de referencia y la Route Table por defecto
//! - `server`: Response Writer y Server Loop secuencial
//! - `config`, `limits`, `error`, `logging`, `metrics`: soporte
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use raw_http_server::config::Config;
//! use raw_http_server::handlers::default_router;
//! use raw_http_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config, default_router()).expect("bind");
//! server.run();
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod limits;
pub mod logging;
pub mod metrics;
pub mod net;
pub mod router;
pub mod server;
