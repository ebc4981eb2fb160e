pub mod error;
pub mod types;

pub use error::RetrogradeError;
pub use types::{LocalChunkPos, Result, REGION_WIDTH};
