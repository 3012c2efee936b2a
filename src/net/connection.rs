//! # Socket con Buffer de Líneas
//! src/net/connection.rs
//!
//! Envuelve una conexión aceptada con un buffer de recepción de tamaño fijo.
//! Expone dos operaciones:
//!
//! - [`BufferedConnection::recv_line`]: lee una línea terminada en CRLF
//! - [`BufferedConnection::send_all`]: escribe exactamente N bytes
//!
//! ## Estado del buffer
//!
//! ```text
//! 0            data_begin            data_end          capacity
//! |  consumido  |   datos sin leer    |     libre       |
//! ```
//!
//! Invariante: `data_begin <= data_end <= capacity`. Los bytes ya entregados
//! nunca se vuelven a leer. No hay límite de largo de línea aquí: el
//! acumulador crece con cada recarga y es el caller quien debe acotarlo.

use crate::error::ConnectionError;
use std::io::{self, Read, Write};

/// Capacidad por defecto del buffer de recepción
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

const CRLF: &[u8] = b"\r\n";

/// Conexión con buffer de recepción fijo y escritura completa
pub struct BufferedConnection<S> {
    stream: S,
    buffer: Vec<u8>,
    data_begin: usize,
    data_end: usize,
}

impl<S: Read + Write> BufferedConnection<S> {
    /// Crea una conexión con el buffer por defecto
    pub fn new(stream: S) -> Self {
        Self::with_buffer(stream, vec![0u8; DEFAULT_BUFFER_SIZE])
    }

    /// Crea una conexión reutilizando un buffer existente
    ///
    /// La capacidad es el largo del vector. Un buffer vacío se reemplaza
    /// por uno de [`DEFAULT_BUFFER_SIZE`] bytes.
    pub fn with_buffer(stream: S, mut buffer: Vec<u8>) -> Self {
        if buffer.is_empty() {
            buffer.resize(DEFAULT_BUFFER_SIZE, 0);
        }
        Self {
            stream,
            buffer,
            data_begin: 0,
            data_end: 0,
        }
    }

    /// Lee una línea terminada en CRLF (sin incluir el delimitador)
    ///
    /// # Errores
    ///
    /// - `PrematureClose` si el peer cierra antes de completar la línea
    /// - `ReadTimeout` si vence el timeout del socket
    /// - `MalformedLine` si la línea no es UTF-8
    /// - `Io` para cualquier otro fallo de recepción
    pub fn recv_line(&mut self) -> Result<String, ConnectionError> {
        let mut line = Vec::new();

        loop {
            let window = &self.buffer[self.data_begin..self.data_end];

            // CRLF partido entre la recarga anterior y esta
            if line.last() == Some(&b'\r') && window.first() == Some(&b'\n') {
                line.pop();
                self.data_begin += 1;
                return Self::into_line(line);
            }

            if let Some(pos) = find_crlf(window) {
                line.extend_from_slice(&window[..pos]);
                self.data_begin += pos + CRLF.len();
                return Self::into_line(line);
            }

            // Sin delimitador: guardar lo que hay y recargar desde el inicio
            line.extend_from_slice(window);
            self.data_begin = 0;
            self.data_end = 0;

            let n = self.fill()?;
            if n == 0 {
                return Err(ConnectionError::PrematureClose);
            }
            self.data_end = n;
        }
    }

    /// Escribe todos los bytes, repitiendo ante escrituras parciales
    pub fn send_all(&mut self, mut bytes: &[u8]) -> Result<(), ConnectionError> {
        while !bytes.is_empty() {
            match self.stream.write(bytes) {
                Ok(0) => {
                    return Err(ConnectionError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "socket accepted zero bytes",
                    )));
                }
                Ok(n) => bytes = &bytes[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Err(ConnectionError::WriteTimeout),
                Err(e) => return Err(ConnectionError::Io(e)),
            }
        }
        self.stream.flush().map_err(|e| {
            if is_timeout(&e) {
                ConnectionError::WriteTimeout
            } else {
                ConnectionError::Io(e)
            }
        })
    }

    /// Bytes recibidos que todavía no se consumieron
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.data_begin..self.data_end]
    }

    /// Capacidad del buffer de recepción
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Separa el stream y el buffer para reutilizar este último
    pub fn into_parts(self) -> (S, Vec<u8>) {
        (self.stream, self.buffer)
    }

    /// Una sola lectura del socket sobre todo el buffer
    fn fill(&mut self) -> Result<usize, ConnectionError> {
        loop {
            match self.stream.read(&mut self.buffer) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Err(ConnectionError::ReadTimeout),
                Err(e) => return Err(ConnectionError::Io(e)),
            }
        }
    }

    fn into_line(bytes: Vec<u8>) -> Result<String, ConnectionError> {
        String::from_utf8(bytes).map_err(|_| ConnectionError::MalformedLine)
    }
}

fn find_crlf(window: &[u8]) -> Option<usize> {
    window.windows(CRLF.len()).position(|w| w == CRLF)
}

// SO_RCVTIMEO/SO_SNDTIMEO reportan WouldBlock en Unix y TimedOut en Windows
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
