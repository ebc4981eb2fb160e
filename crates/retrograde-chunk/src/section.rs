use crate::bits::unpack_bits;
use crate::field::{list_items, long_array, required, string};
use crate::mapping::DowngradeTables;
use crate::warning::DowngradeWarning;
use retrograde_common::{Result, RetrogradeError};
use retrograde_nbt::{encode_text, EncodedValue, Tag};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Blocks in one 16x16x16 section.
pub const SECTION_VOLUME: usize = 4096;
/// Bytes of a nibble array covering one section.
pub const NIBBLE_ARRAY_LEN: usize = SECTION_VOLUME / 2;

/// One palette entry: a namespaced block name and its block-state properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>) -> Self {
        PaletteEntry {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    fn from_encoded(entry: &EncodedValue) -> Result<Self> {
        let name = string(required(entry, "palette entry", "Name")?, "palette entry name")?;
        let mut properties = BTreeMap::new();
        if let Some(encoded) = entry.get("Properties") {
            let encoded = encoded.as_compound().ok_or_else(|| {
                RetrogradeError::invalid_format(format!("properties of {} should be a compound", name))
            })?;
            for (key, value) in encoded {
                properties.insert(key.clone(), string(value, "block property")?);
            }
        }
        Ok(PaletteEntry { name, properties })
    }
}

/// Palette-encoded block storage of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSection {
    pub palette: Vec<PaletteEntry>,
    /// Palette indices packed at `bits_per_block(palette.len())` bits each
    pub block_states: Vec<i64>,
}

impl ChunkSection {
    pub fn from_encoded(section: &EncodedValue) -> Result<Self> {
        let palette = list_items(required(section, "section", "Palette")?, "section palette")?
            .iter()
            .map(PaletteEntry::from_encoded)
            .collect::<Result<Vec<_>>>()?;
        let block_states = long_array(
            required(section, "section", "BlockStates")?,
            "section block states",
        )?;
        Ok(ChunkSection {
            palette,
            block_states,
        })
    }
}

/// Legacy block ids and packed data nibbles of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Depalettized {
    pub blocks: Vec<i8>,
    pub data: Vec<i8>,
}

/// Index width for a palette: at least 4 bits, otherwise the bits needed for `palette_len - 1`.
pub fn bits_per_block(palette_len: usize) -> u32 {
    if palette_len <= 16 {
        4
    } else {
        usize::BITS - (palette_len - 1).leading_zeros()
    }
}

struct Resolved {
    block: i8,
    nibble: u8,
    warning: Option<DowngradeWarning>,
}

fn resolve(entry: &PaletteEntry, tables: &DowngradeTables) -> Resolved {
    let Some(mapping) = tables.block(&entry.name) else {
        return Resolved {
            block: 0,
            nibble: 0,
            warning: Some(DowngradeWarning::UnmappedBlock {
                name: entry.name.clone(),
            }),
        };
    };

    let data = mapping.data_for(&entry.properties);
    let warning = (!(0..=15).contains(&data)).then(|| DowngradeWarning::DataOutOfRange {
        name: entry.name.clone(),
        data,
    });
    Resolved {
        // ids above 127 wrap into the negative byte range
        block: mapping.id as u8 as i8,
        nibble: (data & 0xF) as u8,
        warning,
    }
}

/// Packs one nibble per block, the even block in the low half of each byte.
pub fn pack_nibbles(nibbles: &[u8]) -> Vec<i8> {
    nibbles
        .chunks(2)
        .map(|pair| {
            let low = pair[0] & 0xF;
            let high = pair.get(1).copied().unwrap_or(0) & 0xF;
            ((high << 4) | low) as i8
        })
        .collect()
}

/// Resolves every block of a section to its legacy id and data value.
///
/// Unknown names, out-of-range data values and indices past the end of the
/// palette fall back to id 0 / data 0 (data keeps its low nibble) and are
/// recorded in `warnings`, once per offending palette entry or index value.
pub fn depalettize(
    section: &ChunkSection,
    tables: &DowngradeTables,
    warnings: &mut Vec<DowngradeWarning>,
) -> Result<Depalettized> {
    let palette_len = section.palette.len();
    if palette_len == 0 {
        return Err(RetrogradeError::invalid_format("section palette is empty"));
    }

    let indices = unpack_bits(&section.block_states, bits_per_block(palette_len))?;
    if indices.len() < SECTION_VOLUME {
        return Err(RetrogradeError::invalid_format(format!(
            "block states hold {} indices, expected {}",
            indices.len(),
            SECTION_VOLUME
        )));
    }

    let resolved: Vec<Resolved> = section
        .palette
        .iter()
        .map(|entry| resolve(entry, tables))
        .collect();
    let mut used = vec![false; palette_len];
    let mut out_of_range = BTreeSet::new();

    let mut blocks = Vec::with_capacity(SECTION_VOLUME);
    let mut nibbles = Vec::with_capacity(SECTION_VOLUME);
    for &index in &indices[..SECTION_VOLUME] {
        match resolved.get(index as usize) {
            Some(entry) => {
                used[index as usize] = true;
                blocks.push(entry.block);
                nibbles.push(entry.nibble);
            }
            None => {
                out_of_range.insert(index);
                blocks.push(0);
                nibbles.push(0);
            }
        }
    }

    warnings.extend(
        resolved
            .iter()
            .zip(&used)
            .filter(|(_, used)| **used)
            .filter_map(|(entry, _)| entry.warning.clone()),
    );
    warnings.extend(
        out_of_range
            .into_iter()
            .map(|index| DowngradeWarning::PaletteOutOfRange { index, palette_len }),
    );

    Ok(Depalettized {
        blocks,
        data: pack_nibbles(&nibbles),
    })
}

/// Rewrites an encoded 1.13 section as a legacy section with `Blocks` and `Data`.
pub fn downgrade_section(
    section: &EncodedValue,
    tables: &DowngradeTables,
    warnings: &mut Vec<DowngradeWarning>,
) -> Result<EncodedValue> {
    let y = required(section, "section", "Y")?;
    let depalettized = depalettize(&ChunkSection::from_encoded(section)?, tables, warnings)?;
    debug_assert_eq!(depalettized.blocks.len(), SECTION_VOLUME);
    debug_assert_eq!(depalettized.data.len(), NIBBLE_ARRAY_LEN);

    let mut legacy = HashMap::new();
    legacy.insert("Y".to_owned(), y.clone());
    for key in ["BlockLight", "SkyLight"] {
        if let Some(light) = section.get(key) {
            legacy.insert(key.to_owned(), light.clone());
        }
    }
    legacy.insert(
        "Blocks".to_owned(),
        encode_text(&Tag::ByteArray(depalettized.blocks))?,
    );
    legacy.insert(
        "Data".to_owned(),
        encode_text(&Tag::ByteArray(depalettized.data))?,
    );
    Ok(EncodedValue::Compound(legacy))
}
