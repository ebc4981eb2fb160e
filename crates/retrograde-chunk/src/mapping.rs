use once_cell::sync::OnceCell;
use retrograde_common::{Result, RetrogradeError};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

const BUILTIN_BLOCK_MAPPING: &str = include_str!("../assets/block-mapping.json");
const BUILTIN_BIOME_MAPPING: &str = include_str!("../assets/biome-mapping.json");

static BUILTIN: OnceCell<Arc<DowngradeTables>> = OnceCell::new();

/// Legacy id and base data value for one namespaced block name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockMapping {
    pub id: u16,
    #[serde(default)]
    pub data: i32,
    /// Data offsets per property name and property value.
    #[serde(default)]
    pub properties: HashMap<String, HashMap<String, i32>>,
}

impl BlockMapping {
    /// Base data plus the offsets of every known property value.
    pub fn data_for(&self, properties: &BTreeMap<String, String>) -> i32 {
        properties
            .iter()
            .filter_map(|(name, value)| self.properties.get(name)?.get(value))
            .fold(self.data, |data, offset| data + offset)
    }
}

/// Read-only block and biome tables shared by every downgrade task.
#[derive(Debug, Clone, PartialEq)]
pub struct DowngradeTables {
    blocks: HashMap<String, BlockMapping>,
    biomes: HashMap<i32, u8>,
}

impl DowngradeTables {
    pub fn new(blocks: HashMap<String, BlockMapping>, biomes: HashMap<i32, u8>) -> Result<Self> {
        if let Some((name, mapping)) = blocks.iter().find(|(_, mapping)| mapping.id > 255) {
            return Err(RetrogradeError::invalid_format(format!(
                "legacy id {} for {} does not fit in a byte",
                mapping.id, name
            )));
        }
        Ok(DowngradeTables { blocks, biomes })
    }

    pub fn from_json(block_json: &str, biome_json: &str) -> Result<Self> {
        let blocks: HashMap<String, BlockMapping> = serde_json::from_str(block_json)?;
        let raw_biomes: HashMap<String, u8> = serde_json::from_str(biome_json)?;

        let mut biomes = HashMap::with_capacity(raw_biomes.len());
        for (key, legacy) in raw_biomes {
            let biome = key.trim().parse::<i32>().map_err(|_| {
                RetrogradeError::invalid_format(format!("biome key {:?} is not a number", key))
            })?;
            biomes.insert(biome, legacy);
        }

        DowngradeTables::new(blocks, biomes)
    }

    /// Tables compiled into the binary, parsed on first use.
    pub fn builtin() -> Result<Arc<DowngradeTables>> {
        BUILTIN
            .get_or_try_init(|| {
                DowngradeTables::from_json(BUILTIN_BLOCK_MAPPING, BUILTIN_BIOME_MAPPING)
                    .map(Arc::new)
            })
            .cloned()
    }

    /// Loads the tables once at startup; a missing path falls back to the builtin table.
    pub async fn load(
        block_path: Option<&Path>,
        biome_path: Option<&Path>,
    ) -> Result<Arc<DowngradeTables>> {
        if block_path.is_none() && biome_path.is_none() {
            return DowngradeTables::builtin();
        }

        let block_json = match block_path {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => BUILTIN_BLOCK_MAPPING.to_owned(),
        };
        let biome_json = match biome_path {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => BUILTIN_BIOME_MAPPING.to_owned(),
        };

        DowngradeTables::from_json(&block_json, &biome_json).map(Arc::new)
    }

    pub fn block(&self, name: &str) -> Option<&BlockMapping> {
        self.blocks.get(name)
    }

    pub fn biome(&self, biome: i32) -> Option<u8> {
        self.biomes.get(&biome).copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn biome_count(&self) -> usize {
        self.biomes.len()
    }
}
