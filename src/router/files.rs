//! # Archivos Estáticos
//! src/router/files.rs
//!
//! Responder que sirve el contenido de un [`DocumentRoot`]:
//!
//! - Archivo regular → 200 con `Content-Type` según la extensión
//! - Directorio → 200 con un índice HTML (nombre, fecha, tamaño, tipo)
//! - Solo `GET` y `HEAD`; otros métodos → 405 con `Allow: GET, HEAD`
//!
//! El body siempre se construye completo; con `HEAD` la sesión envía solo
//! la cabecera.

use super::sandbox::DocumentRoot;
use super::Responder;
use crate::config::Config;
use crate::error::RouteError;
use crate::http::{headers, Framing, Method, Request, Response, StatusCode};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Sirve archivos e índices de directorio desde un document root
#[derive(Debug, Clone)]
pub struct FileResponder {
    root: DocumentRoot,
    framing: Framing,
}

impl FileResponder {
    /// Crea un responder con framing `Content-Length`
    pub fn new(root: DocumentRoot) -> Self {
        Self {
            root,
            framing: Framing::ContentLength,
        }
    }

    /// Cambia el framing de todas las respuestas exitosas
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Construye el responder desde la configuración del servidor
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let root = DocumentRoot::new(&config.root)?;
        Ok(Self::new(root).with_framing(config.framing()))
    }

    /// Lee un archivo regular completo
    pub fn serve_file(&self, path: &Path) -> Result<Response, RouteError> {
        let body = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => RouteError::Forbidden(path.display().to_string()),
            _ => RouteError::Internal(e),
        })?;

        Ok(Response::new(StatusCode::Ok)
            .with_header(headers::CONTENT_TYPE, content_type(path))
            .with_body_bytes(body)
            .with_framing(self.framing))
    }

    /// Genera el índice HTML de un directorio
    ///
    /// `request_path` es el path tal como lo pidió el cliente (ya viene
    /// codificado); a él se le agrega cada nombre con [`encode_segment`].
    pub fn serve_index(&self, request_path: &str, dir: &Path) -> Result<Response, RouteError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            entries.push((entry.file_name().to_string_lossy().into_owned(), metadata));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let base = if request_path.ends_with('/') {
            request_path.to_string()
        } else {
            format!("{}/", request_path)
        };
        let title = escape_html(&base);

        let mut rows = String::new();
        if base != "/" {
            rows.push_str("<tr><td><a href=\"../\">../</a></td><td></td><td></td><td>Parent Folder</td></tr>\n");
        }

        for (name, metadata) in &entries {
            let is_dir = metadata.is_dir();
            let slash = if is_dir { "/" } else { "" };
            let modified = metadata
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            let (size, kind) = if is_dir {
                (String::new(), "Directory")
            } else {
                (metadata.len().to_string(), content_type(Path::new(name)))
            };

            // Escribir a un String no falla
            let _ = writeln!(
                rows,
                "<tr><td><a href=\"{href}{slash}\">{text}{slash}</a></td><td>{modified}</td><td>{size}</td><td>{kind}</td></tr>",
                href = escape_html(&format!("{}{}", base, encode_segment(name))),
                text = escape_html(name),
            );
        }

        let body = format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Index of {title}</title></head>\n\
             <body>\n<h1>Index of {title}</h1>\n<table>\n\
             <thead><tr><th>Name</th><th>Last Modified</th><th>Size</th><th>Type</th></tr></thead>\n\
             <tbody>\n{rows}</tbody>\n</table>\n</body>\n</html>\n"
        );

        Ok(Response::new(StatusCode::Ok)
            .with_header(headers::CONTENT_TYPE, "text/html; charset=utf-8")
            .with_body(&body)
            .with_framing(self.framing))
    }
}

impl Responder for FileResponder {
    fn respond(&self, request: &Request) -> Result<Response, RouteError> {
        if !matches!(request.method(), Method::GET | Method::HEAD) {
            return Ok(
                Response::error(StatusCode::MethodNotAllowed, "only GET and HEAD are allowed")
                    .with_header(headers::ALLOW, "GET, HEAD"),
            );
        }

        let path = self.root.resolve(request.target())?;
        debug!("{} → {}", request.target(), path.display());

        if path.is_dir() {
            self.serve_index(request.path(), &path)
        } else {
            self.serve_file(&path)
        }
    }
}

/// `Content-Type` según la extensión (texto plano si no se reconoce)
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "eot" => "application/vnd.ms-fontobject",
        "ttf" => "font/ttf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webm" => "video/webm",
        _ => "text/plain",
    }
}

/// Percent-encoding de un nombre de archivo para usarlo como segmento de URL
///
/// Solo quedan sin codificar los caracteres no reservados; `%`, `#`, `?`,
/// espacios, `/` y cualquier byte fuera de ASCII van como `%XX`, de modo que
/// `DocumentRoot::resolve` recupere el nombre original.
fn encode_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, FileResponder) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "hi").unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("<b>.txt"), "tag").unwrap();
        let responder = FileResponder::new(DocumentRoot::new(dir.path()).unwrap());
        (dir, responder)
    }

    fn get(target: &str) -> Request {
        Request::new(Method::GET, target, "HTTP/1.1")
    }

    #[test]
    fn test_serves_file_with_content_type() {
        let (_dir, responder) = fixture();

        let response = responder.respond(&get("/index.html")).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"hi");
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(response.framing(), Framing::ContentLength);

        let css = responder.respond(&get("/style.css")).unwrap();
        assert_eq!(css.header("Content-Type"), Some("text/css"));
    }

    #[test]
    fn test_head_builds_same_response() {
        let (_dir, responder) = fixture();
        let request = Request::new(Method::HEAD, "/index.html", "HTTP/1.1");
        let response = responder.respond(&request).unwrap();
        assert_eq!(response.body(), b"hi");
    }

    #[test]
    fn test_directory_index() {
        let (_dir, responder) = fixture();

        let response = responder.respond(&get("/")).unwrap();
        let html = String::from_utf8(response.body().to_vec()).unwrap();

        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert!(html.contains("Index of /"));
        assert!(html.contains("href=\"/docs/\""));
        assert!(html.contains("href=\"/index.html\""));
        assert!(html.contains("Directory"));
        assert!(!html.contains("Parent Folder"));
    }

    #[test]
    fn test_subdirectory_index_escapes_names() {
        let (_dir, responder) = fixture();

        let response = responder.respond(&get("/docs")).unwrap();
        let html = String::from_utf8(response.body().to_vec()).unwrap();

        assert!(html.contains("Index of /docs/"));
        assert!(html.contains("&lt;b&gt;.txt"));
        assert!(!html.contains("<b>.txt"));
        assert!(html.contains("Parent Folder"));
    }

    /// Todos los `href="..."` de un índice, tal como aparecen en el HTML
    fn index_links(html: &str) -> Vec<String> {
        html.split("href=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(|href| href.replace("&amp;", "&"))
            .collect()
    }

    #[test]
    fn test_index_links_resolve_for_special_names() {
        let dir = TempDir::new().unwrap();
        for name in ["50%off.txt", "a#b.txt", "q?x.txt", "with space.txt", "ñandú.txt", "a&b.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        fs::create_dir(dir.path().join("sub dir")).unwrap();
        fs::write(dir.path().join("sub dir").join("x%y.txt"), "nested").unwrap();
        let responder = FileResponder::new(DocumentRoot::new(dir.path()).unwrap());

        let root = responder.respond(&get("/")).unwrap();
        let links = index_links(&String::from_utf8(root.body().to_vec()).unwrap());
        assert_eq!(links.len(), 7);
        assert!(links.contains(&"/50%25off.txt".to_string()));
        assert!(links.contains(&"/a%23b.txt".to_string()));
        assert!(links.contains(&"/q%3Fx.txt".to_string()));
        assert!(links.contains(&"/sub%20dir/".to_string()));

        for link in &links {
            let response = responder.respond(&get(link)).unwrap();
            assert_eq!(response.status(), StatusCode::Ok, "{}", link);
        }

        let sub = responder.respond(&get("/sub%20dir/")).unwrap();
        let nested: Vec<_> = index_links(&String::from_utf8(sub.body().to_vec()).unwrap())
            .into_iter()
            .filter(|href| href != "../")
            .collect();
        assert_eq!(nested, vec!["/sub%20dir/x%25y.txt".to_string()]);
        assert_eq!(responder.respond(&get(&nested[0])).unwrap().body(), b"nested");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("plain-name_1.txt"), "plain-name_1.txt");
        assert_eq!(encode_segment("50%off?#"), "50%25off%3F%23");
        assert_eq!(encode_segment("ñ"), "%C3%B1");
    }

    #[test]
    fn test_route_errors() {
        let (_dir, responder) = fixture();

        assert!(matches!(responder.respond(&get("/missing")), Err(RouteError::NotFound(_))));
        assert!(matches!(
            responder.respond(&get("/../../etc/passwd")),
            Err(RouteError::Forbidden(_))
        ));
        assert!(matches!(responder.respond(&get("*")), Err(RouteError::BadTarget(_))));
    }

    #[test]
    fn test_other_methods_not_allowed() {
        let (_dir, responder) = fixture();

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let request = Request::new(method, "/index.html", "HTTP/1.1");
            let response = responder.respond(&request).unwrap();
            assert_eq!(response.status(), StatusCode::MethodNotAllowed);
            assert_eq!(response.header("Allow"), Some("GET, HEAD"));
        }
    }

    #[test]
    fn test_chunked_framing_is_propagated() {
        let (_dir, responder) = fixture();
        let responder = responder.with_framing(Framing::Chunked { chunk_size: 16 });

        let response = responder.respond(&get("/index.html")).unwrap();
        assert_eq!(response.framing(), Framing::Chunked { chunk_size: 16 });
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("font.woff2")), "font/woff2");
        assert_eq!(content_type(Path::new("clip.webm")), "video/webm");
        assert_eq!(content_type(Path::new("README")), "text/plain");
    }
}
