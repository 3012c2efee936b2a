//! # Sesión HTTP
//! src/server/session.rs
//!
//! Máquina de estados que atiende una conexión completa:
//!
//! ```text
//! AwaitRequest ──▶ Routing ──▶ Encoding ──▶ Sending ──┬──▶ AwaitRequest (keep-alive)
//!      │                                      ▲      └──▶ Closed
//!      └──── error de protocolo (400/501/505) ┘
//! ```
//!
//! `AwaitRequest` lee y parsea la request line y los headers. Cualquier
//! estado puede terminar la sesión:
//!
//! - El peer cierra entre requests → [`SessionEnd::PeerClosed`]
//! - Request inválido → se responde el código y se cierra
//! - `Connection: close` → se responde y se cierra sin leer lo que siga
//! - Error 5xx del responder → se responde y se cierra
//! - Fallo de E/S o timeout → se cierra sin responder
//!
//! Cada worker es dueño de una sesión y la reutiliza conexión tras
//! conexión, incluido el buffer de recepción.

use crate::config::Config;
use crate::error::ConnectionError;
use crate::http::encoding;
use crate::http::request::RecvError;
use crate::http::{headers, ContentCoding, Method, Protocol, Request, Response, StatusCode};
use crate::net::{BufferedConnection, DEFAULT_BUFFER_SIZE};
use crate::router::{error_response, Responder};
use crate::workers::Handler;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

const SERVER_NAME: &str = concat!("http11_server/", env!("CARGO_PKG_VERSION"));

/// Tiempo máximo que se espera a que el peer cierre tras nuestro FIN
const LINGER_TIMEOUT: Duration = Duration::from_millis(500);

/// Parámetros inmutables compartidos por todas las sesiones
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub protocol: Protocol,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub buffer_size: usize,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            protocol: Protocol::default(),
            read_timeout: config.timeout(),
            write_timeout: config.timeout(),
            buffer_size: config.buffer_size,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            read_timeout: None,
            write_timeout: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Motivo por el que terminó una sesión sin error de E/S
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// El peer cerró la conexión entre requests
    PeerClosed,

    /// El request pidió `Connection: close`
    CloseRequested,

    /// Request inválido; se envió este código
    ProtocolError(StatusCode),

    /// El responder falló de forma irrecuperable; se envió este código
    RouteFailure(StatusCode),
}

enum State {
    AwaitRequest,
    Routing(Request),
    Encoding {
        response: Response,
        coding: ContentCoding,
        include_body: bool,
        then: Option<SessionEnd>,
    },
    Sending {
        wire: Vec<u8>,
        then: Option<SessionEnd>,
    },
    Closed(SessionEnd),
}

/// Atiende conexiones HTTP/1.1 con un responder compartido
pub struct HttpSession<R> {
    id: usize,
    responder: Arc<R>,
    config: Arc<SessionConfig>,

    /// Buffer de recepción reutilizado entre conexiones
    buffer: Vec<u8>,
}

impl<R: Responder> HttpSession<R> {
    pub fn new(id: usize, responder: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self {
            id,
            responder,
            config,
            buffer: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Atiende requests sobre la conexión hasta que la sesión termina
    ///
    /// Retorna `Err` solo ante fallos de E/S; en ese caso no se envió
    /// (o no se terminó de enviar) ninguna respuesta.
    pub fn serve<S: Read + Write>(
        &mut self,
        conn: &mut BufferedConnection<S>,
    ) -> Result<SessionEnd, ConnectionError> {
        let mut state = State::AwaitRequest;

        loop {
            state = match state {
                State::AwaitRequest => self.await_request(conn)?,
                State::Routing(request) => self.route(request),
                State::Encoding {
                    mut response,
                    coding,
                    include_body,
                    then,
                } => {
                    let connection = if then.is_some() { "close" } else { "keep-alive" };
                    response.add_header(headers::CONNECTION, connection);
                    response.add_header(headers::SERVER, SERVER_NAME);
                    let wire = encoding::encode(
                        response,
                        coding,
                        &self.config.protocol.version,
                        include_body,
                    )?;
                    State::Sending { wire, then }
                }
                State::Sending { wire, then } => {
                    conn.send_all(&wire)?;
                    match then {
                        None => State::AwaitRequest,
                        Some(end) => State::Closed(end),
                    }
                }
                State::Closed(end) => return Ok(end),
            };
        }
    }

    fn await_request<S: Read + Write>(
        &self,
        conn: &mut BufferedConnection<S>,
    ) -> Result<State, ConnectionError> {
        match Request::read_from(conn, &self.config.protocol) {
            Ok(request) => {
                info!("{} {}", request.method(), request.target());
                debug!(headers = ?request.headers(), "request headers");
                Ok(State::Routing(request))
            }
            Err(RecvError::Connection(ConnectionError::PrematureClose)) => {
                Ok(State::Closed(SessionEnd::PeerClosed))
            }
            Err(RecvError::Connection(e)) => Err(e),
            Err(RecvError::Status(status)) => {
                warn!("rejecting request: {}", status);
                Ok(State::Encoding {
                    response: Response::for_status(status),
                    coding: ContentCoding::Identity,
                    include_body: true,
                    then: Some(SessionEnd::ProtocolError(status)),
                })
            }
        }
    }

    fn route(&self, request: Request) -> State {
        let coding = ContentCoding::negotiate(&request);
        let include_body = request.method() != Method::HEAD;
        let close = if request.keep_alive() {
            None
        } else {
            Some(SessionEnd::CloseRequested)
        };

        let (response, then) = match self.responder.respond(&request) {
            Ok(response) => (response, close),
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    error!("responder failed on {}: {}", request.target(), e);
                    (error_response(&e), Some(SessionEnd::RouteFailure(status)))
                } else {
                    info!("{} → {}", request.target(), status);
                    (error_response(&e), close)
                }
            }
        };

        State::Encoding {
            response,
            coding,
            include_body,
            then,
        }
    }

    /// Prepara el socket y el buffer, y atiende la conexión
    fn handle_stream(&mut self, stream: TcpStream) -> Result<SessionEnd, ConnectionError> {
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)?;

        let mut buffer = std::mem::take(&mut self.buffer);
        if buffer.len() != self.config.buffer_size {
            buffer = vec![0u8; self.config.buffer_size];
        }

        let mut conn = BufferedConnection::with_buffer(stream, buffer);
        let result = self.serve(&mut conn);

        let (stream, buffer) = conn.into_parts();
        self.buffer = buffer;
        linger_close(stream);
        result
    }
}

impl<R: Responder> Handler for HttpSession<R> {
    type Task = TcpStream;

    fn handle(&mut self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let span = info_span!("conn", worker = self.id, %peer);
        let _enter = span.enter();

        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

        match self.handle_stream(stream) {
            Ok(end) => info!("closed ({:?}, {:.2}ms)", end, elapsed_ms()),
            Err(e) if e.is_peer_gone() => info!("peer went away ({:.2}ms)", elapsed_ms()),
            Err(e) if e.is_timeout() => warn!("{} ({:.2}ms)", e, elapsed_ms()),
            Err(e) => error!("connection failed: {}", e),
        }
    }
}

/// Cierra el socket sin descartar la respuesta ya enviada
///
/// Cerrar con bytes sin leer en el socket provoca un RST que puede
/// descartar la respuesta en el peer. Se envía FIN y se consume lo que
/// quede hasta que el peer cierre o venza [`LINGER_TIMEOUT`].
fn linger_close(mut stream: TcpStream) {
    if stream.shutdown(Shutdown::Write).is_err() {
        return;
    }
    if stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_err() {
        return;
    }

    let deadline = Instant::now() + LINGER_TIMEOUT;
    let mut scratch = [0u8; 512];
    while Instant::now() < deadline {
        match stream.read(&mut scratch) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}
