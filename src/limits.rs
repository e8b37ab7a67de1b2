//! # Límites de Requests
//! src/limits.rs
//!
//! Topes aplicados por el parser a cada request.
//!
//! - `max_body_bytes`: tamaño máximo del body. Con `Content-Length` se
//!   rechaza lo que lo supere; sin él, lo que sobre se descarta.
//! - `max_line_bytes`: largo máximo de la request line y de cada header.
//! - `drain_bytes` / `drain_timeout`: cuánto de lo que el cliente siga
//!   mandando se lee y descarta antes de cerrar la conexión.

use crate::config::Config;
use std::time::Duration;

/// Tope de body por defecto (1 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024;

/// Tope de cada línea del request por defecto (8 KiB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;

/// Bytes sin leer que se descartan, como mucho, antes del close (256 KiB)
pub const DEFAULT_DRAIN_BYTES: usize = 256 * 1024;

/// Espera máxima por cada lectura del descarte
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Límites del Request Parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_body_bytes: usize,
    pub max_line_bytes: usize,
    pub drain_bytes: usize,
    pub drain_timeout: Duration,
}

impl RequestLimits {
    /// Toma los límites de la configuración del CLI
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            max_line_bytes: config.max_line_bytes,
            ..Self::default()
        }
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            drain_bytes: DEFAULT_DRAIN_BYTES,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
