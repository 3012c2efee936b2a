//! # Nombres de Headers
//! src/http/headers.rs
//!
//! Los nombres de header no distinguen mayúsculas. Se normalizan una sola
//! vez al parsear (o al insertarlos en una respuesta) a la forma canónica
//! `Palabra-Palabra`, así las búsquedas posteriores son exactas.

use std::collections::HashMap;

/// Mapa nombre canónico → valor (el último duplicado gana)
pub type HeaderMap = HashMap<String, String>;

pub const CONNECTION: &str = "Connection";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const ALLOW: &str = "Allow";
pub const SERVER: &str = "Server";

/// Convierte un nombre de header a su forma canónica
///
/// # Ejemplo
/// ```
/// use http11_server::http::headers::canonical_name;
///
/// assert_eq!(canonical_name("accept-encoding"), "Accept-Encoding");
/// assert_eq!(canonical_name("CONTENT-LENGTH"), "Content-Length");
/// ```
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// `true` si `value` contiene `token` sin distinguir mayúsculas
pub fn contains_ignore_case(value: &str, token: &str) -> bool {
    value.to_ascii_lowercase().contains(&token.to_ascii_lowercase())
}
