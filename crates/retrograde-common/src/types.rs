use std::fmt;

pub type Result<T> = std::result::Result<T, crate::error::RetrogradeError>;

/// Number of chunks along each side of a region file.
pub const REGION_WIDTH: usize = 32;

/// Chunk coordinate local to one region file, both axes in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalChunkPos {
    pub x: usize,
    pub z: usize,
}

impl LocalChunkPos {
    pub fn new(x: usize, z: usize) -> Self {
        LocalChunkPos { x, z }
    }

    pub fn is_valid(&self) -> bool {
        self.x < REGION_WIDTH && self.z < REGION_WIDTH
    }

    /// Index into the region header tables.
    pub fn index(&self) -> usize {
        self.x + self.z * REGION_WIDTH
    }

    /// Every position of a region, x-major.
    pub fn all() -> impl Iterator<Item = LocalChunkPos> {
        (0..REGION_WIDTH)
            .flat_map(|x| (0..REGION_WIDTH).map(move |z| LocalChunkPos { x, z }))
    }
}

impl fmt::Display for LocalChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk@({},{})", self.x, self.z)
    }
}
