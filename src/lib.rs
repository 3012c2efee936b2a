//! # HTTP/1.1 Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 implementado desde cero sobre sockets bloqueantes y
//! un pool fijo de threads: conexiones persistentes, compresión gzip,
//! framing `Content-Length` o chunked, y archivos servidos desde un
//! document root del que no se puede escapar.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `net`: Socket con buffer de recepción y lectura por líneas CRLF
//! - `workers`: Pool de threads con un handler reutilizable por worker
//! - `http`: Parsing, construcción y codificación de mensajes HTTP/1.1
//! - `server`: Sesión por conexión (máquina de estados) y accept loop
//! - `router`: Responders, incluido el de archivos estáticos
//! - `config`: Argumentos CLI y variables de entorno
//! - `error`: Errores de conexión, pool y ruteo
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use http11_server::config::Config;
//! use http11_server::router::FileResponder;
//! use http11_server::server::Server;
//!
//! let config = Config::default();
//! let responder = FileResponder::from_config(&config).expect("document root");
//! let server = Server::bind(&config, responder).expect("bind");
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod router;
pub mod server;
pub mod workers;
