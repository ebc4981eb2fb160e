use crate::bits::unpack_bits;
use crate::mapping::DowngradeTables;
use crate::warning::DowngradeWarning;
use retrograde_common::{Result, RetrogradeError};
use std::collections::BTreeSet;

/// Columns in a chunk, one biome and one height per column.
pub const COLUMN_COUNT: usize = 256;
/// Bits per packed height in `Heightmaps`.
pub const HEIGHTMAP_WIDTH: u32 = 9;

/// Maps each column biome to its legacy id; unknown biomes become 0.
pub fn downgrade_biomes(
    biomes: &[i32],
    tables: &DowngradeTables,
    warnings: &mut Vec<DowngradeWarning>,
) -> Result<Vec<i8>> {
    if biomes.len() != COLUMN_COUNT {
        return Err(RetrogradeError::invalid_format(format!(
            "chunk has {} biome entries, expected {}",
            biomes.len(),
            COLUMN_COUNT
        )));
    }

    let mut unmapped = BTreeSet::new();
    let legacy = biomes
        .iter()
        .map(|&biome| match tables.biome(biome) {
            Some(id) => id as i8,
            None => {
                unmapped.insert(biome);
                0
            }
        })
        .collect();

    warnings.extend(
        unmapped
            .into_iter()
            .map(|biome| DowngradeWarning::UnmappedBiome { biome }),
    );
    Ok(legacy)
}

/// Unpacks a light-blocking heightmap into one int per column.
pub fn downgrade_heightmap(packed: Option<&[i64]>) -> Result<Vec<i32>> {
    let Some(packed) = packed else {
        return Ok(vec![0; COLUMN_COUNT]);
    };

    let mut heights = unpack_bits(packed, HEIGHTMAP_WIDTH)?;
    if heights.len() < COLUMN_COUNT {
        return Err(RetrogradeError::invalid_format(format!(
            "heightmap holds {} values, expected {}",
            heights.len(),
            COLUMN_COUNT
        )));
    }
    heights.truncate(COLUMN_COUNT);
    Ok(heights.into_iter().map(|height| height as i32).collect())
}
