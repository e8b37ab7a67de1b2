//! # Raw HTTP Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0.
//!
//! Sale con código distinto de cero solo si el arranque falla (configuración
//! inválida o error de socket/bind/listen). Si no, corre hasta que lo maten.

use raw_http_server::config::Config;
use raw_http_server::handlers::default_router;
use raw_http_server::logging;
use raw_http_server::server::Server;
use std::process;
use tracing::{error, info};

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("failed to initialize logging: {}", e);
    }

    let config = Config::new();
    if let Err(e) = config.validate() {
        error!("Configuración inválida: {}", e);
        process::exit(1);
    }
    config.log_summary();

    // La Route Table se arma una vez acá y pasa a ser del servidor
    let server = match Server::bind(&config, default_router()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Error fatal al iniciar el servidor");
            process::exit(1);
        }
    };

    let addr = server.local_addr().unwrap_or_else(|_| config.address());
    info!("===============");
    info!("Server Started!");
    info!("===============");
    info!("addr: http://{}", addr);

    server.run()
}
