//! Filesystem-backed static assets.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use stacklens_core::{
    traits::StaticAssets,
    types::AssetResponse,
    Error, Result,
};

/// Serves the built frontend from a directory.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a request path inside the root. `/` maps to
    /// `index.html`; traversal components resolve to `None`.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        let relative = if trimmed.is_empty() { "index.html" } else { trimmed };

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return None;
                }
            }
        }
        Some(resolved)
    }
}

#[async_trait]
impl StaticAssets for DirAssets {
    async fn fetch(&self, path: &str) -> Result<Option<AssetResponse>> {
        let Some(resolved) = self.resolve(path) else {
            return Ok(None);
        };

        match tokio::fs::read(&resolved).await {
            Ok(bytes) => {
                let content_type = mime_guess::from_path(&resolved)
                    .first_or_octet_stream()
                    .to_string();
                Ok(Some(AssetResponse {
                    content_type,
                    body: bytes.into(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::assets(format!(
                "Failed to read asset {}: {}",
                resolved.display(),
                e
            ))),
        }
    }
}
