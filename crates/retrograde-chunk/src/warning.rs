use std::fmt;

/// Recoverable problems met while downgrading; the affected value falls back to 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DowngradeWarning {
    PaletteOutOfRange { index: u32, palette_len: usize },
    UnmappedBlock { name: String },
    UnmappedBiome { biome: i32 },
    DataOutOfRange { name: String, data: i32 },
}

impl fmt::Display for DowngradeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DowngradeWarning::PaletteOutOfRange { index, palette_len } => write!(
                f,
                "out-of-range block palette index {} (palette only contains {} entries)",
                index, palette_len
            ),
            DowngradeWarning::UnmappedBlock { name } => {
                write!(f, "no legacy mapping for block \"{}\"", name)
            }
            DowngradeWarning::UnmappedBiome { biome } => {
                write!(f, "no legacy mapping for biome {}", biome)
            }
            DowngradeWarning::DataOutOfRange { name, data } => write!(
                f,
                "out-of-range block data value {} for block \"{}\"",
                data, name
            ),
        }
    }
}

/// Collapses repeated warnings, keeping first-seen order.
pub fn summarize(warnings: &[DowngradeWarning]) -> Vec<(&DowngradeWarning, usize)> {
    let mut summary: Vec<(&DowngradeWarning, usize)> = Vec::new();
    for warning in warnings {
        match summary.iter_mut().find(|(seen, _)| *seen == warning) {
            Some((_, count)) => *count += 1,
            None => summary.push((warning, 1)),
        }
    }
    summary
}
