use crate::header::{check_pos, Location, RegionHeader, HEADER_SIZE, SECTOR_SIZE};
use crate::RegionHandle;
use bytes::{BufMut, BytesMut};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use retrograde_common::{LocalChunkPos, Result, RetrogradeError};
use retrograde_nbt::NBTFile;
use std::io::{Cursor, Read, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Largest payload a location entry can describe.
pub const MAX_CHUNK_SECTORS: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionType {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(CompressionType::Gzip),
            2 => Ok(CompressionType::Zlib),
            3 => Ok(CompressionType::Uncompressed),
            _ => Err(RetrogradeError::invalid_format(format!(
                "unknown chunk compression type {}",
                byte
            ))),
        }
    }

    fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decompressed = Vec::new();
        match self {
            CompressionType::Gzip => {
                GzDecoder::new(data).read_to_end(&mut decompressed)?;
            }
            CompressionType::Zlib => {
                ZlibDecoder::new(data).read_to_end(&mut decompressed)?;
            }
            CompressionType::Uncompressed => decompressed.extend_from_slice(data),
        }
        Ok(decompressed)
    }
}

/// An open `.mca` region file.
///
/// Reads go through the location table loaded at open time. Writes always
/// append whole sectors after the last used one, so a region created for
/// output never reuses space.
#[derive(Debug)]
pub struct AnvilRegion {
    path: PathBuf,
    file: File,
    header: RegionHeader,
    next_sector: u32,
}

impl AnvilRegion {
    /// Opens an existing region file for reading.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).await?;
        let length = file.metadata().await?.len();

        // Region files for never-generated areas may be zero bytes long
        let header = if length == 0 {
            RegionHeader::default()
        } else {
            let mut bytes = vec![0u8; HEADER_SIZE];
            file.read_exact(&mut bytes).await.map_err(|e| {
                RetrogradeError::invalid_format(format!(
                    "{} has a truncated header: {}",
                    path.display(),
                    e
                ))
            })?;
            RegionHeader::parse(&bytes)?
        };

        let next_sector = header.next_free_sector();
        Ok(AnvilRegion {
            path,
            file,
            header,
            next_sector,
        })
    }

    /// Creates a new region file with an empty header; fails if the file exists.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = RegionHeader::default();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&header.to_bytes()).await?;

        let next_sector = header.next_free_sector();
        Ok(AnvilRegion {
            path,
            file,
            header,
            next_sector,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    async fn read_payload(&mut self, pos: LocalChunkPos, location: Location) -> Result<Vec<u8>> {
        let start = location.offset as u64 * SECTOR_SIZE as u64;
        let capacity = location.sectors as usize * SECTOR_SIZE;

        self.file.seek(SeekFrom::Start(start)).await?;
        let length = self.file.read_u32().await? as usize;
        if length == 0 || length + 4 > capacity {
            return Err(RetrogradeError::invalid_format(format!(
                "{} claims {} bytes but owns {} sectors",
                pos, length, location.sectors
            )));
        }

        let compression = CompressionType::from_byte(self.file.read_u8().await?)?;
        let mut compressed = vec![0u8; length - 1];
        self.file.read_exact(&mut compressed).await?;
        compression.decompress(&compressed)
    }
}

fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or_default()
}

/// Length prefix, compression byte and zlib data, padded to whole sectors.
fn encode_payload(chunk: &NBTFile) -> Result<BytesMut> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    chunk.write(&mut encoder)?;
    let compressed = encoder.finish()?;

    let length = compressed.len() + 1;
    let sectors = (length + 4).div_ceil(SECTOR_SIZE);
    if sectors > MAX_CHUNK_SECTORS {
        return Err(RetrogradeError::invalid_argument(format!(
            "chunk needs {} sectors, a region entry holds at most {}",
            sectors, MAX_CHUNK_SECTORS
        )));
    }

    let mut payload = BytesMut::with_capacity(sectors * SECTOR_SIZE);
    payload.put_u32(length as u32);
    payload.put_u8(CompressionType::Zlib as u8);
    payload.put_slice(&compressed);
    payload.resize(sectors * SECTOR_SIZE, 0);
    Ok(payload)
}

impl RegionHandle for AnvilRegion {
    async fn has_chunk(&mut self, pos: LocalChunkPos) -> Result<bool> {
        check_pos(pos)?;
        Ok(self.header.location(pos).is_present())
    }

    async fn read(&mut self, pos: LocalChunkPos) -> Result<NBTFile> {
        check_pos(pos)?;
        let location = self.header.location(pos);
        if !location.is_present() {
            return Err(RetrogradeError::invalid_argument(format!(
                "{} is not present in {}",
                pos,
                self.path.display()
            )));
        }

        let payload = self.read_payload(pos, location).await?;
        NBTFile::read(&mut Cursor::new(payload)).map_err(|e| {
            RetrogradeError::invalid_format(format!("{} holds malformed NBT: {}", pos, e))
        })
    }

    async fn write(&mut self, pos: LocalChunkPos, chunk: &NBTFile) -> Result<()> {
        check_pos(pos)?;
        let payload = encode_payload(chunk)?;
        let location = Location {
            offset: self.next_sector,
            sectors: (payload.len() / SECTOR_SIZE) as u8,
        };

        self.file
            .seek(SeekFrom::Start(location.offset as u64 * SECTOR_SIZE as u64))
            .await?;
        self.file.write_all(&payload).await?;
        // The sectors stay claimed even if the entry below never lands
        self.next_sector = location.end();

        let timestamp = unix_timestamp();
        let (location_at, location_bytes, timestamp_at, timestamp_bytes) =
            RegionHeader::entry_bytes(pos, location, timestamp);
        self.file.seek(SeekFrom::Start(location_at)).await?;
        self.file.write_all(&location_bytes).await?;
        self.file.seek(SeekFrom::Start(timestamp_at)).await?;
        self.file.write_all(&timestamp_bytes).await?;
        self.file.flush().await?;

        self.header.set(pos, location, timestamp);
        Ok(())
    }

    async fn close(mut self) -> Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}
