//! Byte sources for asset loading.
//!
//! Loaders never talk to the network directly; they go through an
//! [`AssetSource`]. The browser build uses a `fetch`-backed source, tests and
//! embedders can serve bytes from memory with [`MemorySource`].

use super::{LoadError, LoadProgress};
use base64::Engine as _;
use std::cell::RefCell;
use std::collections::HashMap;

/// Something that can produce the bytes behind a URL.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    /// Fetch `url`, reporting byte progress as data arrives.
    async fn fetch(&self, url: &str, on_progress: &mut dyn FnMut(&LoadProgress)) -> Result<Vec<u8>, LoadError>;
}

/// Resolve `uri` relative to the document at `base`.
///
/// Absolute URLs (`scheme://`), `data:` URIs and root-relative paths are
/// returned unchanged; anything else replaces the last path segment of `base`.
pub fn resolve_uri(base: &str, uri: &str) -> String {
    if uri.contains("://") || uri.starts_with("data:") || uri.starts_with('/') {
        return uri.to_string();
    }
    let uri = uri.strip_prefix("./").unwrap_or(uri);
    match base.rfind('/') {
        Some(idx) => format!("{}{}", &base[..=idx], uri),
        None => uri.to_string(),
    }
}

/// Decode a base64 `data:` URI. Returns `None` for anything else.
pub fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, base64::DecodeError>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    Some(base64::engine::general_purpose::STANDARD.decode(payload))
}

/// Serves assets from an in-memory map and records every request.
#[derive(Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `url`.
    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(url.into(), bytes.into());
    }

    /// Builder form of [`Self::insert`].
    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl AssetSource for MemorySource {
    async fn fetch(&self, url: &str, on_progress: &mut dyn FnMut(&LoadProgress)) -> Result<Vec<u8>, LoadError> {
        self.requests.borrow_mut().push(url.to_string());

        let bytes = self.assets.get(url).cloned().ok_or_else(|| LoadError::Http {
            url: url.to_string(),
            status: 404,
        })?;

        let total = bytes.len() as u64;
        on_progress(&LoadProgress::new(url, total / 2, Some(total)));
        on_progress(&LoadProgress::new(url, total, Some(total)));
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_to_document() {
        assert_eq!(resolve_uri("./DamagedHelmet.gltf", "DamagedHelmet.bin"), "./DamagedHelmet.bin");
        assert_eq!(resolve_uri("models/helmet.gltf", "./tex/a.png"), "models/tex/a.png");
        assert_eq!(resolve_uri("helmet.gltf", "a.bin"), "a.bin");
    }

    #[test]
    fn test_resolve_keeps_absolute() {
        assert_eq!(resolve_uri("a/b.gltf", "https://x.org/c.bin"), "https://x.org/c.bin");
        assert_eq!(resolve_uri("a/b.gltf", "/c.bin"), "/c.bin");
        assert_eq!(resolve_uri("a/b.gltf", "data:application/octet-stream;base64,AA=="), "data:application/octet-stream;base64,AA==");
    }

    #[test]
    fn test_decode_data_uri() {
        let bytes = decode_data_uri("data:application/octet-stream;base64,AQID").unwrap().unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(decode_data_uri("file.bin").is_none());
        assert!(decode_data_uri("data:text/plain,hello").is_none());
    }

    #[test]
    fn test_memory_source_records_requests() {
        let source = MemorySource::new().with("a", vec![0u8; 10]);
        let mut seen = Vec::new();
        let bytes = pollster::block_on(source.fetch("a", &mut |p| seen.push(p.loaded))).unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(seen, vec![5, 10]);

        let err = pollster::block_on(source.fetch("missing", &mut |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 404, .. }));
        assert_eq!(source.requests(), vec!["a".to_string(), "missing".to_string()]);
    }
}
