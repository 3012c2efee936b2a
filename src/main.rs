//! # HTTP Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.1.
//!
//! Parsea la configuración (CLI + entorno), inicializa el logging, arma el
//! responder de archivos y corre el accept loop hasta que el proceso muere.

use http11_server::config::Config;
use http11_server::router::FileResponder;
use http11_server::server::Server;
use tracing::{error, info};

fn main() {
    let config = Config::new();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_thread_names(true)
        .with_max_level(config.log_level)
        .init();

    if let Err(e) = config.validate() {
        error!("invalid configuration: {}", e);
        std::process::exit(2);
    }

    info!("HTTP/1.1 server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let responder = match FileResponder::from_config(&config) {
        Ok(responder) => responder,
        Err(e) => {
            error!("cannot open document root {}: {}", config.root, e);
            std::process::exit(1);
        }
    };

    // Crear el servidor e iniciarlo (esto bloqueará el thread)
    let result = Server::bind(&config, responder).and_then(|server| server.run());
    if let Err(e) = result {
        error!("fatal error: {}", e);
        std::process::exit(1);
    }
}
