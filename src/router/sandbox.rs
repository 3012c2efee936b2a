//! # Document Root
//! src/router/sandbox.rs
//!
//! Mapea el target de un request a una ruta dentro del document root.
//!
//! ## Pasos
//!
//! 1. Decodificar escapes `%XX` del path (sin query ni fragmento)
//! 2. Normalizar léxicamente (`.` y `..`); si sube por encima de la
//!    raíz → 403, aunque el archivo no exista
//! 3. Canonicalizar contra la raíz canónica; si no existe → 404
//! 4. Verificar que el resultado canónico sigue bajo la raíz; un symlink
//!    que apunta afuera → 403
//!
//! Ninguna ruta llega al sistema de archivos sin pasar por aquí.

use crate::error::RouteError;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Raíz canónica desde la que se sirven archivos
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    /// Canonicaliza la raíz; falla si no existe o no es un directorio
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document root {} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resuelve un target (p. ej. `/docs/a%20b.txt?x=1`) a una ruta canónica
    ///
    /// # Errores
    ///
    /// - [`RouteError::BadTarget`]: no empieza con `/` o tiene escapes inválidos
    /// - [`RouteError::Forbidden`]: escapa de la raíz
    /// - [`RouteError::NotFound`]: no existe
    pub fn resolve(&self, target: &str) -> Result<PathBuf, RouteError> {
        if !target.starts_with('/') {
            return Err(RouteError::BadTarget(target.to_string()));
        }
        let end = target.find(&['?', '#'][..]).unwrap_or(target.len());
        let decoded = percent_decode(&target[..end])
            .ok_or_else(|| RouteError::BadTarget(target.to_string()))?;

        let relative = normalize(&decoded).ok_or_else(|| RouteError::Forbidden(decoded.clone()))?;

        let canonical = match self.root.join(&relative).canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(RouteError::Forbidden(decoded));
            }
            Err(_) => return Err(RouteError::NotFound(decoded)),
        };

        if !canonical.starts_with(&self.root) {
            return Err(RouteError::Forbidden(decoded));
        }
        Ok(canonical)
    }
}

/// Decodifica `%XX`; retorna `None` si un escape es inválido o el
/// resultado no es UTF-8 (o contiene un byte nulo)
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    if out.contains(&0) {
        return None;
    }
    String::from_utf8(out).ok()
}

/// Normalización léxica relativa a la raíz
///
/// Retorna `None` si algún `..` sube por encima de la raíz.
fn normalize(path: &str) -> Option<PathBuf> {
    let mut parts: Vec<&str> = Vec::new();

    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}
