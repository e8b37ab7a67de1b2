//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` con un subscriber de texto. El nivel se toma de
//! `RUST_LOG`; por defecto `info` para este crate (`debug` muestra cada
//! write sobre el socket y los headers de cada request).

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtro usado cuando `RUST_LOG` no está definida
pub const DEFAULT_FILTER: &str = "raw_http_server=info";

/// Instala el subscriber global
///
/// Falla si ya había uno instalado.
pub fn init() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_fails() {
        // El primer init puede fallar si otro test ya instaló un subscriber
        let _ = init();
        assert!(init().is_err());
    }
}
