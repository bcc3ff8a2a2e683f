use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, error};
use crate::domain::{error::BillingError, ports::FileFetcher};

/// Serves objects from a local directory laid out as `<root>/<bucket>/<name>`.
pub struct FsAdapter {
    root: PathBuf,
}

impl FsAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, name: &str) -> Result<PathBuf, BillingError> {
        let escapes = |p: &str| {
            Path::new(p)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        };
        if escapes(bucket) || escapes(name) {
            return Err(BillingError::Fetch(format!(
                "object path {}/{} leaves the storage root", bucket, name
            )));
        }
        Ok(self.root.join(bucket).join(name))
    }
}

#[async_trait]
impl FileFetcher for FsAdapter {
    async fn fetch_file(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BillingError> {
        let path = self.object_path(bucket, name)?;
        debug!("Opening {}", path.display());

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            error!("Failed to open {}: {}", path.display(), e);
            BillingError::Fetch(format!("{}: {}", path.display(), e))
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            BillingError::Fetch(format!("{}: {}", path.display(), e))
        })?;

        debug!("Read {} bytes from {}", buf.len(), path.display());
        Ok(buf)
    }
}
