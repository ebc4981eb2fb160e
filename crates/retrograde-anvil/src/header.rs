use byteorder::{BigEndian, ByteOrder};
use retrograde_common::{LocalChunkPos, Result, RetrogradeError, REGION_WIDTH};

/// Size of one sector in bytes.
pub const SECTOR_SIZE: usize = 4096;
/// Location table plus timestamp table.
pub const HEADER_SIZE: usize = SECTOR_SIZE * 2;
/// First sector available to chunk payloads.
pub const FIRST_DATA_SECTOR: u32 = (HEADER_SIZE / SECTOR_SIZE) as u32;

const ENTRY_COUNT: usize = REGION_WIDTH * REGION_WIDTH;

/// Where a chunk lives in the file, in whole sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub offset: u32,
    pub sectors: u8,
}

impl Location {
    fn decode(entry: u32) -> Self {
        Location {
            offset: entry >> 8,
            sectors: (entry & 0xFF) as u8,
        }
    }

    fn encode(self) -> u32 {
        (self.offset << 8) | self.sectors as u32
    }

    pub fn is_present(&self) -> bool {
        self.offset >= FIRST_DATA_SECTOR && self.sectors > 0
    }

    pub fn end(&self) -> u32 {
        self.offset + self.sectors as u32
    }
}

/// In-memory copy of the 8 KiB region header.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionHeader {
    locations: Vec<Location>,
    timestamps: Vec<u32>,
}

impl Default for RegionHeader {
    fn default() -> Self {
        RegionHeader {
            locations: vec![Location::default(); ENTRY_COUNT],
            timestamps: vec![0; ENTRY_COUNT],
        }
    }
}

impl RegionHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RetrogradeError::invalid_format(format!(
                "region header is {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let (location_table, timestamp_table) = bytes[..HEADER_SIZE].split_at(SECTOR_SIZE);
        let locations = location_table
            .chunks_exact(4)
            .map(|entry| Location::decode(BigEndian::read_u32(entry)))
            .collect();
        let timestamps = timestamp_table
            .chunks_exact(4)
            .map(BigEndian::read_u32)
            .collect();
        Ok(RegionHeader {
            locations,
            timestamps,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        for (i, location) in self.locations.iter().enumerate() {
            BigEndian::write_u32(&mut bytes[i * 4..], location.encode());
        }
        for (i, &timestamp) in self.timestamps.iter().enumerate() {
            BigEndian::write_u32(&mut bytes[SECTOR_SIZE + i * 4..], timestamp);
        }
        bytes
    }

    pub fn location(&self, pos: LocalChunkPos) -> Location {
        self.locations[pos.index()]
    }

    pub fn timestamp(&self, pos: LocalChunkPos) -> u32 {
        self.timestamps[pos.index()]
    }

    pub fn set(&mut self, pos: LocalChunkPos, location: Location, timestamp: u32) {
        self.locations[pos.index()] = location;
        self.timestamps[pos.index()] = timestamp;
    }

    /// Entry bytes for `pos` as (location offset, location, timestamp offset, timestamp).
    pub fn entry_bytes(
        pos: LocalChunkPos,
        entry: Location,
        entry_timestamp: u32,
    ) -> (u64, [u8; 4], u64, [u8; 4]) {
        let index = pos.index();
        let mut location = [0u8; 4];
        let mut timestamp = [0u8; 4];
        BigEndian::write_u32(&mut location, entry.encode());
        BigEndian::write_u32(&mut timestamp, entry_timestamp);
        (
            (index * 4) as u64,
            location,
            (SECTOR_SIZE + index * 4) as u64,
            timestamp,
        )
    }

    /// First sector after every chunk currently in the file.
    pub fn next_free_sector(&self) -> u32 {
        self.locations
            .iter()
            .filter(|location| location.is_present())
            .map(Location::end)
            .max()
            .unwrap_or(FIRST_DATA_SECTOR)
            .max(FIRST_DATA_SECTOR)
    }
}

pub(crate) fn check_pos(pos: LocalChunkPos) -> Result<()> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(RetrogradeError::invalid_argument(format!(
            "{} is outside of the region",
            pos
        )))
    }
}
