//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread acepta conexiones y las encola en un [`WorkerPool`] de
//! tamaño fijo. Cada worker es dueño de una [`HttpSession`] y atiende una
//! conexión completa por vez.
//!
//! ```text
//! accept() ──▶ pool.submit(stream) ──▶ worker-N: session.handle(stream)
//!                 │
//!                 └─ PoolError → 503 + Connection: close, y se suelta
//! ```
//!
//! Si `accept()` falla (por ejemplo `EMFILE`), el loop espera antes de
//! reintentar; la espera se duplica con cada fallo consecutivo.
//!
//! El accept loop corre hasta que alguien llama a
//! [`ShutdownHandle::shutdown`]; entonces deja de aceptar y drena el pool.

use super::session::{HttpSession, SessionConfig};
use crate::config::Config;
use crate::error::PoolError;
use crate::http::{encoding, headers, ContentCoding, Response, StatusCode};
use crate::router::Responder;
use crate::workers::WorkerPool;
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Límite de escritura para el 503; el accept loop no puede quedar bloqueado
const REJECT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Primera espera tras un `accept()` fallido
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);

/// Espera máxima entre reintentos de `accept()`
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Servidor HTTP/1.1 con pool de workers
pub struct Server<R: Responder> {
    listener: TcpListener,
    responder: Arc<R>,
    session_config: Arc<SessionConfig>,
    workers: usize,
    queue_capacity: usize,
    shutdown: Arc<AtomicBool>,
}

/// Permite detener un [`Server`] desde otro thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Marca el servidor para detenerse y despierta al accept loop
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);

        // accept() no tiene timeout: una conexión propia lo desbloquea
        if let Err(e) = TcpStream::connect(wake_addr(self.addr)) {
            warn!("could not wake accept loop: {}", e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl<R: Responder> Server<R> {
    /// Hace bind en `config.address()`
    pub fn bind(config: &Config, responder: R) -> io::Result<Self> {
        let address = config.address();
        let listener = TcpListener::bind(&address)?;
        info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            responder: Arc::new(responder),
            session_config: Arc::new(SessionConfig::from_config(config)),
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: self.local_addr()?,
        })
    }

    /// Corre el accept loop hasta el shutdown y luego drena el pool
    pub fn run(self) -> io::Result<()> {
        let responder = Arc::clone(&self.responder);
        let session_config = Arc::clone(&self.session_config);
        let mut pool = WorkerPool::with_capacity(self.workers, self.queue_capacity, |id| {
            HttpSession::new(id, Arc::clone(&responder), Arc::clone(&session_config))
        })?;
        info!(
            "{} workers ready (queue capacity {})",
            pool.workers(),
            self.queue_capacity
        );

        let mut backoff = Backoff::new(ACCEPT_BACKOFF_MIN, ACCEPT_BACKOFF_MAX);
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    backoff.reset();
                    if let Err((e, stream)) = pool.try_submit(stream) {
                        warn!("dropping connection: {}", e);
                        reject(stream, &e);
                    }
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    error!("accept failed: {} (retrying in {:?})", e, delay);
                    thread::sleep(delay);
                }
            }
        }

        info!("shutting down, draining {} pending connections", pool.outstanding());
        pool.drain_and_stop();
        info!("server stopped");
        Ok(())
    }
}

/// Responde 503 a una conexión que el pool no pudo encolar y la cierra
///
/// No se lee el request: la respuesta sale apenas se acepta el socket.
fn reject(mut stream: TcpStream, reason: &PoolError) {
    let response = Response::error(StatusCode::ServiceUnavailable, &reason.to_string())
        .with_header(headers::CONNECTION, "close");

    let result = encoding::encode(response, ContentCoding::Identity, "HTTP/1.1", true)
        .and_then(|wire| {
            stream.set_write_timeout(Some(REJECT_WRITE_TIMEOUT))?;
            stream.write_all(&wire)
        });
    if let Err(e) = result {
        debug!("could not send 503: {}", e);
    }
    let _ = stream.shutdown(Shutdown::Write);
}

/// Espera exponencial acotada entre reintentos
#[derive(Debug)]
struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            current: min,
        }
    }

    /// Espera a aplicar ahora; la siguiente será el doble, hasta `max`
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Una dirección sin especificar (`0.0.0.0`) no sirve para conectarse
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
