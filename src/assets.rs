//! Static asset lookup for the web client.
//!
//! Maps a request path to a file under a root directory. Only the lookup
//! contract lives here; serving it over HTTP is left to the embedder.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// A resolved file and the content type to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug)]
pub enum AssetError {
    /// Path tries to escape the root or contains forbidden characters.
    Forbidden,
    NotFound,
    Io(std::io::Error),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Forbidden => write!(f, "Forbidden path"),
            AssetError::NotFound => write!(f, "Not found"),
            AssetError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AssetError {}

pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a request path such as `/` or `/js/app.js`.
    pub fn resolve(&self, request_path: &str) -> Result<Asset, AssetError> {
        let relative = sanitize_path(request_path)?;
        let full = self.root.join(relative);
        match std::fs::read(&full) {
            Ok(bytes) => Ok(Asset {
                bytes,
                content_type: content_type(&full),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetError::NotFound),
            // a directory or similar is not something we serve
            Err(e) if full.is_dir() => {
                log::debug!("Refusing directory {}: {}", full.display(), e);
                Err(AssetError::NotFound)
            }
            Err(e) => Err(AssetError::Io(e)),
        }
    }
}

/// Strip the query string and leading slash; reject traversal.
fn sanitize_path(request_path: &str) -> Result<PathBuf, AssetError> {
    let path = request_path.split(|ch| ch == '?' || ch == '#').next().unwrap_or("");
    if path.contains('\\') || path.contains('\0') {
        return Err(AssetError::Forbidden);
    }
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(PathBuf::from("index.html"));
    }
    let mut clean = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AssetError::Forbidden)
            }
        }
    }
    Ok(clean)
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
