use crate::region::AnvilRegion;
use crate::RegionStore;
use retrograde_common::Result;
use std::path::{Path, PathBuf};

/// Region files on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnvilStore;

impl RegionStore for AnvilStore {
    type Handle = AnvilRegion;

    async fn open(&self, path: &Path) -> Result<AnvilRegion> {
        AnvilRegion::open(path).await
    }

    async fn create(&self, path: &Path) -> Result<AnvilRegion> {
        AnvilRegion::create(path).await
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file()
                && path.extension().is_some_and(|ext| ext == "mca")
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn remove_dir(&self, dir: &Path) -> Result<()> {
        tokio::fs::remove_dir(dir).await?;
        Ok(())
    }
}
