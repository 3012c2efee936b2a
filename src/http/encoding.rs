//! # Codificación de Respuestas
//! src/http/encoding.rs
//!
//! Convierte una [`Response`] en bytes para el socket, en orden fijo:
//!
//! 1. **Content-Encoding**: gzip si el cliente lo acepta, si no identity
//! 2. **Framing**: `Content-Length` o `Transfer-Encoding: chunked`,
//!    nunca ambos
//! 3. Serialización: status line, headers, línea vacía, body
//!
//! ## Formato chunked
//!
//! ```text
//! C\r\n
//! hello world!\r\n
//! 0\r\n
//! \r\n
//! ```

use super::headers;
use super::{Request, Response};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Codificación de contenido aplicada al body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
}

impl ContentCoding {
    /// Elige la codificación según `Accept-Encoding`
    pub fn negotiate(request: &Request) -> Self {
        if request.accepts_gzip() {
            ContentCoding::Gzip
        } else {
            ContentCoding::Identity
        }
    }

    /// Valor para el header `Content-Encoding`
    pub fn token(&self) -> Option<&'static str> {
        match self {
            ContentCoding::Identity => None,
            ContentCoding::Gzip => Some("gzip"),
        }
    }

    /// Codifica el body de la respuesta
    ///
    /// Si el responder ya fijó un `Content-Encoding` el body se deja intacto.
    pub fn apply(self, response: &mut Response) -> io::Result<()> {
        if self == ContentCoding::Identity || response.header(headers::CONTENT_ENCODING).is_some() {
            return Ok(());
        }

        let compressed = gzip(response.body())?;
        response.set_body(compressed);
        if let Some(token) = self.token() {
            response.add_header(headers::CONTENT_ENCODING, token);
        }
        Ok(())
    }
}

/// Comprime bytes con gzip
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Estrategia de framing del body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// `Content-Length` con el largo del body (ya codificado)
    #[default]
    ContentLength,

    /// `Transfer-Encoding: chunked` con chunks de tamaño fijo
    Chunked { chunk_size: usize },
}

impl Framing {
    /// Ajusta los headers de framing, quitando cualquier valor previo
    pub fn apply(self, response: &mut Response) {
        response.remove_header(headers::CONTENT_LENGTH);
        response.remove_header(headers::TRANSFER_ENCODING);

        match self {
            Framing::ContentLength => {
                let len = response.body().len().to_string();
                response.add_header(headers::CONTENT_LENGTH, &len);
            }
            Framing::Chunked { .. } => {
                response.add_header(headers::TRANSFER_ENCODING, "chunked");
            }
        }
    }

    /// Escribe el body con este framing
    fn write_body(self, body: &[u8], out: &mut Vec<u8>) {
        match self {
            Framing::ContentLength => out.extend_from_slice(body),
            Framing::Chunked { chunk_size } => {
                for chunk in body.chunks(chunk_size.max(1)) {
                    out.extend_from_slice(format!("{:X}\r\n", chunk.len()).as_bytes());
                    out.extend_from_slice(chunk);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(b"0\r\n\r\n");
            }
        }
    }
}

/// Serializa una respuesta ya codificada y con framing aplicado
///
/// Con `include_body = false` (HEAD) solo se escribe la cabecera.
pub fn to_wire(response: &Response, version: &str, include_body: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(response.body().len() + 256);

    // 1. Status line
    out.extend_from_slice(
        format!("{} {} {}\r\n", version, response.status().as_u16(), response.reason()).as_bytes(),
    );

    // 2. Headers
    for (name, value) in response.headers() {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }

    // 3. Línea vacía que separa headers del body
    out.extend_from_slice(b"\r\n");

    // 4. Body
    if include_body {
        response.framing().write_body(response.body(), &mut out);
    }

    out
}

/// Pipeline completo: codificación de contenido, framing y serialización
pub fn encode(
    mut response: Response,
    coding: ContentCoding,
    version: &str,
    include_body: bool,
) -> io::Result<Vec<u8>> {
    coding.apply(&mut response)?;
    let framing = response.framing();
    framing.apply(&mut response);
    Ok(to_wire(&response, version, include_body))
}
