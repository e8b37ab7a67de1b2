//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor a partir de argumentos CLI.
//!
//! ## Ejemplo de uso
//!
//! ```bash
//! ./raw_http_server --ip_addr 0.0.0.0 --port 8080 --max-body-bytes 4096
//! ```

use crate::limits::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_LINE_BYTES};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;

/// Línea más corta con sentido: "GET / HTTP/1.0" más margen
const MIN_LINE_BYTES: usize = 16;

/// Tope absoluto del body (64 MiB): el buffer se reserva de una vez
const MAX_BODY_CEILING: usize = 64 * 1024 * 1024;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "raw_http_server")]
#[command(about = "Servidor HTTP/1.0 secuencial sobre syscalls de sockets")]
#[command(version)]
pub struct Config {
    /// IP en la que escucha
    #[arg(long = "ip_addr", default_value = "127.0.0.1")]
    pub ip_addr: IpAddr,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Tamaño máximo del body de un request, en bytes
    #[arg(long = "max-body-bytes", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Largo máximo de la request line y de cada header, en bytes
    #[arg(long = "max-line-bytes", default_value_t = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (ip:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use raw_http_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address().to_string(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.ip_addr, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_bytes < MIN_LINE_BYTES {
            return Err(format!("Max line bytes must be >= {}", MIN_LINE_BYTES));
        }

        if self.max_body_bytes > MAX_BODY_CEILING {
            return Err(format!("Max body bytes must be <= {}", MAX_BODY_CEILING));
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        info!("Configuración:");
        info!("   Address:        {}", self.address());
        info!("   Max body:       {} bytes", self.max_body_bytes);
        info!("   Max line:       {} bytes", self.max_line_bytes);
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            ip_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}
