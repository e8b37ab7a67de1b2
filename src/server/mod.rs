//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el Server Loop que:
//! 1. Acepta una conexión
//! 2. Lee y parsea el request
//! 3. Lo despacha al handler del prefijo más largo
//! 4. Escribe la respuesta y cierra la conexión
//!
//! Maneja una conexión a la vez; la siguiente se acepta recién cuando la
//! anterior quedó cerrada.

pub mod backoff;
pub mod tcp;
pub mod writer;

// Re-exportar para facilitar el uso
pub use tcp::Server;
pub use writer::ResponseWriter;
