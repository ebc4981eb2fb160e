//! Anvil (`.mca`) region files: 32x32 chunks behind an 8 KiB header.
//!
//! - Bytes 0-4095: location table (3-byte sector offset, 1-byte sector count)
//! - Bytes 4096-8191: timestamp table
//! - Sector 2 onwards: chunk payloads (4-byte length, compression byte, data)

#![allow(async_fn_in_trait)]

pub mod header;
pub mod region;
pub mod store;

use retrograde_common::{LocalChunkPos, Result};
use retrograde_nbt::NBTFile;
use std::path::{Path, PathBuf};

pub use header::{Location, RegionHeader, HEADER_SIZE, SECTOR_SIZE};
pub use region::{AnvilRegion, CompressionType};
pub use store::AnvilStore;

/// Chunk access to one region, exclusively owned by the task working on it.
pub trait RegionHandle {
    async fn has_chunk(&mut self, pos: LocalChunkPos) -> Result<bool>;

    async fn read(&mut self, pos: LocalChunkPos) -> Result<NBTFile>;

    async fn write(&mut self, pos: LocalChunkPos, chunk: &NBTFile) -> Result<()>;

    /// Flushes pending writes and releases the handle.
    async fn close(self) -> Result<()>;
}

/// Opens and creates region handles, and manages the folders holding them.
pub trait RegionStore {
    type Handle: RegionHandle;

    async fn open(&self, path: &Path) -> Result<Self::Handle>;

    /// Fails if `path` already exists.
    async fn create(&self, path: &Path) -> Result<Self::Handle>;

    async fn remove(&self, path: &Path) -> Result<()>;

    /// Region files directly inside `dir`, sorted by path.
    async fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    async fn remove_dir(&self, dir: &Path) -> Result<()>;
}
