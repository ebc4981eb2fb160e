use crate::biome::{downgrade_biomes, downgrade_heightmap};
use crate::field::{int_array, list_items, long_array, required};
use crate::mapping::DowngradeTables;
use crate::section::downgrade_section;
use crate::warning::DowngradeWarning;
use retrograde_common::{Result, RetrogradeError};
use retrograde_nbt::{decode_text, encode_text, EncodedValue, Tag};
use std::collections::HashMap;

/// Data version stamped on every downgraded chunk (1.12.2).
pub const LEGACY_DATA_VERSION: i32 = 1343;

const COPIED_LEVEL_FIELDS: [&str; 4] = ["xPos", "zPos", "InhabitedTime", "LastUpdate"];

/// A downgraded chunk and the recoverable problems met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Downgraded {
    pub chunk: EncodedValue,
    pub warnings: Vec<DowngradeWarning>,
}

/// Rewrites an encoded 1.13 chunk into the 1.12 layout.
///
/// Only the level fields the legacy format needs survive; entities, tile
/// entities and structure data are dropped.
pub fn downgrade_chunk(chunk: &EncodedValue, tables: &DowngradeTables) -> Result<Downgraded> {
    let old_level = required(chunk, "chunk", "Level")?;
    if old_level.as_compound().is_none() {
        return Err(RetrogradeError::invalid_format("chunk Level should be a compound"));
    }

    let mut warnings = Vec::new();
    let mut level = HashMap::new();

    for key in COPIED_LEVEL_FIELDS {
        match old_level.get(key) {
            Some(value) => {
                level.insert(key.to_owned(), value.clone());
            }
            None if key == "xPos" || key == "zPos" => {
                return Err(RetrogradeError::invalid_format(format!(
                    "chunk Level has no {} field",
                    key
                )))
            }
            None => {}
        }
    }

    level.insert("LightPopulated".to_owned(), encode_text(&Tag::Byte(0))?);
    level.insert("TerrainPopulated".to_owned(), encode_text(&Tag::Byte(1))?);

    let biomes = int_array(required(old_level, "chunk Level", "Biomes")?, "chunk biomes")?;
    let biomes = downgrade_biomes(&biomes, tables, &mut warnings)?;
    level.insert("Biomes".to_owned(), encode_text(&Tag::ByteArray(biomes))?);

    let old_sections = required(old_level, "chunk Level", "Sections")?;
    let sections = if old_sections.is_empty_list() {
        old_sections.clone()
    } else {
        EncodedValue::List(
            list_items(old_sections, "chunk sections")?
                .iter()
                .map(|section| downgrade_section(section, tables, &mut warnings))
                .collect::<Result<Vec<_>>>()?,
        )
    };
    level.insert("Sections".to_owned(), sections);

    let light_blocking = match old_level
        .get("Heightmaps")
        .and_then(|heightmaps| heightmaps.get("LIGHT_BLOCKING"))
    {
        Some(packed) => Some(long_array(packed, "light blocking heightmap")?),
        None => None,
    };
    let heightmap = downgrade_heightmap(light_blocking.as_deref())?;
    level.insert("HeightMap".to_owned(), encode_text(&Tag::IntArray(heightmap))?);

    let mut root = HashMap::new();
    root.insert("Level".to_owned(), EncodedValue::Compound(level));
    root.insert(
        "DataVersion".to_owned(),
        encode_text(&Tag::Int(LEGACY_DATA_VERSION))?,
    );

    Ok(Downgraded {
        chunk: EncodedValue::Compound(root),
        warnings,
    })
}

/// Same as [`downgrade_chunk`] on a parsed tag tree.
pub fn downgrade_tag(chunk: &Tag, tables: &DowngradeTables) -> Result<(Tag, Vec<DowngradeWarning>)> {
    let downgraded = downgrade_chunk(&encode_text(chunk)?, tables)?;
    Ok((decode_text(&downgraded.chunk)?, downgraded.warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{NIBBLE_ARRAY_LEN, SECTION_VOLUME};
    use assert_matches::assert_matches;
    use retrograde_nbt::TagType;

    fn compound(entries: Vec<(&str, Tag)>) -> Tag {
        Tag::Compound(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn stone_section(y: i8) -> Tag {
        compound(vec![
            ("Y", Tag::Byte(y)),
            ("BlockLight", Tag::ByteArray(vec![0; 2048])),
            ("SkyLight", Tag::ByteArray(vec![-1; 2048])),
            (
                "Palette",
                Tag::List(
                    TagType::Compound,
                    vec![compound(vec![(
                        "Name",
                        Tag::String("minecraft:stone".into()),
                    )])],
                ),
            ),
            ("BlockStates", Tag::LongArray(vec![0; 256])),
        ])
    }

    fn chunk(sections: Tag, heightmaps: Option<Tag>) -> Tag {
        let mut level = vec![
            ("xPos", Tag::Int(3)),
            ("zPos", Tag::Int(-2)),
            ("InhabitedTime", Tag::Long(1200)),
            ("LastUpdate", Tag::Long(987_654_321)),
            ("Status", Tag::String("full".into())),
            ("Biomes", Tag::IntArray(vec![1; 256])),
            ("Sections", sections),
            ("Entities", Tag::List(TagType::Compound, vec![])),
        ];
        if let Some(heightmaps) = heightmaps {
            level.push(("Heightmaps", heightmaps));
        }
        compound(vec![
            ("Level", compound(level)),
            ("DataVersion", Tag::Int(1631)),
        ])
    }

    fn level(tag: &Tag) -> &std::collections::HashMap<String, Tag> {
        tag.as_compound().unwrap()["Level"].as_compound().unwrap()
    }

    #[test]
    fn test_downgrade_tag_builds_legacy_chunk() {
        let tables = DowngradeTables::builtin().unwrap();
        let input = chunk(
            Tag::List(TagType::Compound, vec![stone_section(0), stone_section(1)]),
            None,
        );

        let (output, warnings) = downgrade_tag(&input, &tables).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(output.as_compound().unwrap()["DataVersion"], Tag::Int(1343));
        let level = level(&output);
        assert_eq!(level["xPos"], Tag::Int(3));
        assert_eq!(level["zPos"], Tag::Int(-2));
        assert_eq!(level["InhabitedTime"], Tag::Long(1200));
        assert_eq!(level["LastUpdate"], Tag::Long(987_654_321));
        assert_eq!(level["LightPopulated"], Tag::Byte(0));
        assert_eq!(level["TerrainPopulated"], Tag::Byte(1));
        assert_eq!(level["Biomes"], Tag::ByteArray(vec![1; 256]));
        assert_eq!(level["HeightMap"], Tag::IntArray(vec![0; 256]));
        assert!(!level.contains_key("Status"));
        assert!(!level.contains_key("Entities"));
        assert!(!level.contains_key("Heightmaps"));

        let sections = level["Sections"].as_list().unwrap();
        assert_eq!(sections.len(), 2);
        let section = sections[1].as_compound().unwrap();
        assert_eq!(section["Y"], Tag::Byte(1));
        assert_eq!(section["Blocks"], Tag::ByteArray(vec![1; SECTION_VOLUME]));
        assert_eq!(section["Data"], Tag::ByteArray(vec![0; NIBBLE_ARRAY_LEN]));
        assert_eq!(section["SkyLight"], Tag::ByteArray(vec![-1; 2048]));
        assert!(!section.contains_key("Palette"));
    }

    #[test]
    fn test_empty_sections_pass_through() {
        let tables = DowngradeTables::builtin().unwrap();
        let input = encode_text(&chunk(Tag::List(TagType::Compound, vec![]), None)).unwrap();
        let old_sections = input.get("Level").unwrap().get("Sections").unwrap().clone();

        let downgraded = downgrade_chunk(&input, &tables).unwrap();

        assert_eq!(
            downgraded.chunk.get("Level").unwrap().get("Sections"),
            Some(&old_sections)
        );
        let (tag, _) = downgrade_tag(&decode_text(&input).unwrap(), &tables).unwrap();
        assert_eq!(level(&tag)["Sections"], Tag::List(TagType::Compound, vec![]));
    }

    #[test]
    fn test_heightmap_comes_from_light_blocking() {
        let tables = DowngradeTables::builtin().unwrap();
        let mut packed = vec![0i64; 36];
        packed[0] = 70 | (71 << 9);
        let heightmaps = compound(vec![
            ("LIGHT_BLOCKING", Tag::LongArray(packed)),
            ("WORLD_SURFACE", Tag::LongArray(vec![-1; 36])),
        ]);
        let input = chunk(Tag::List(TagType::Compound, vec![]), Some(heightmaps));

        let (output, _) = downgrade_tag(&input, &tables).unwrap();

        let Tag::IntArray(heights) = &level(&output)["HeightMap"] else {
            panic!("HeightMap should be an int array");
        };
        assert_eq!(heights.len(), 256);
        assert_eq!(&heights[..3], &[70, 71, 0]);
    }

    #[test]
    fn test_warnings_are_collected_across_sections() {
        let tables = DowngradeTables::builtin().unwrap();
        let unknown = compound(vec![
            ("Y", Tag::Byte(2)),
            (
                "Palette",
                Tag::List(
                    TagType::Compound,
                    vec![compound(vec![(
                        "Name",
                        Tag::String("minecraft:not_a_block".into()),
                    )])],
                ),
            ),
            ("BlockStates", Tag::LongArray(vec![0; 256])),
        ]);
        let mut input = chunk(Tag::List(TagType::Compound, vec![stone_section(0), unknown]), None);
        if let Tag::Compound(root) = &mut input {
            if let Some(Tag::Compound(level)) = root.get_mut("Level") {
                let mut biomes = vec![1; 256];
                biomes[0] = 100;
                level.insert("Biomes".into(), Tag::IntArray(biomes));
            }
        }

        let (_, warnings) = downgrade_tag(&input, &tables).unwrap();

        assert_eq!(
            warnings,
            vec![
                DowngradeWarning::UnmappedBiome { biome: 100 },
                DowngradeWarning::UnmappedBlock {
                    name: "minecraft:not_a_block".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let tables = DowngradeTables::builtin().unwrap();
        assert_matches!(
            downgrade_tag(&compound(vec![("DataVersion", Tag::Int(1631))]), &tables),
            Err(RetrogradeError::InvalidFormat(_))
        );

        for field in ["xPos", "Biomes", "Sections"] {
            let mut input = chunk(Tag::List(TagType::Compound, vec![]), None);
            if let Tag::Compound(root) = &mut input {
                if let Some(Tag::Compound(level)) = root.get_mut("Level") {
                    level.remove(field);
                }
            }
            assert_matches!(
                downgrade_tag(&input, &tables),
                Err(RetrogradeError::InvalidFormat(_)),
                "without {}",
                field
            );
        }
    }

    #[test]
    fn test_wrong_biome_kind_is_invalid() {
        let tables = DowngradeTables::builtin().unwrap();
        let mut input = chunk(Tag::List(TagType::Compound, vec![]), None);
        if let Tag::Compound(root) = &mut input {
            if let Some(Tag::Compound(level)) = root.get_mut("Level") {
                level.insert("Biomes".into(), Tag::ByteArray(vec![1; 256]));
            }
        }
        assert_matches!(
            downgrade_tag(&input, &tables),
            Err(RetrogradeError::InvalidFormat(_))
        );
    }
}
