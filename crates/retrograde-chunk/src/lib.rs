//! Downgrades 1.13 chunk trees to the 1.12 block-id layout.

pub mod biome;
pub mod bits;
mod field;
pub mod mapping;
pub mod section;
pub mod transcode;
pub mod warning;

// Re-export commonly used items
pub use mapping::{BlockMapping, DowngradeTables};
pub use transcode::{downgrade_chunk, downgrade_tag, Downgraded, LEGACY_DATA_VERSION};
pub use warning::{summarize, DowngradeWarning};
