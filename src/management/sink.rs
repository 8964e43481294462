use std::{future::Future, path::PathBuf};

use crate::error::Result;

/// Destination for a fetched liked-songs collection.
pub trait ResultSink {
    fn store(&self, tracks: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Writes the collection as a pretty-printed JSON array of track names.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    async fn store(&self, tracks: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(tracks)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}
