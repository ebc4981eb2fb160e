mod common;

use assert_matches::assert_matches;
use common::*;
use retrograde_anvil::{AnvilRegion, RegionHandle};
use retrograde_cli::config::Config;
use retrograde_cli::run;
use retrograde_common::{LocalChunkPos, RetrogradeError};
use retrograde_nbt::Tag;

#[tokio::test]
async fn test_run_converts_world_on_disk() {
    let dir = scratch_dir("run").await;
    let config = Config::new(dir.join("old"), dir.join("new"));
    tokio::fs::create_dir_all(config.input.join("region")).await.unwrap();
    tokio::fs::create_dir_all(config.input.join("DIM1")).await.unwrap();
    tokio::fs::write(config.input.join("level.dat"), b"level").await.unwrap();

    let mut region = AnvilRegion::create(config.input.join("region/r.0.0.mca"))
        .await
        .unwrap();
    region
        .write(LocalChunkPos::new(5, 5), &chunk_fixture(5, 5))
        .await
        .unwrap();
    region
        .write(LocalChunkPos::new(31, 0), &chunk_fixture(31, 0))
        .await
        .unwrap();
    region.close().await.unwrap();

    let report = run(&config).await.unwrap();

    let region_report = report.folders[0].as_ref().unwrap();
    assert_eq!(region_report.files.len(), 1);
    let file = region_report.files[0].as_ref().unwrap();
    assert_eq!(file.converted(), 2);
    assert_eq!(file.failed(), 0);
    assert!(report.folders[1].as_ref().unwrap().files.is_empty());
    // DIM-1 is missing from the input, so its empty output folder is removed
    assert!(report.folders[2].is_err());
    assert!(tokio::fs::metadata(config.output.join("DIM-1")).await.is_err());
    assert!(report.level_dat.is_ok());

    let mut converted = AnvilRegion::open(config.output.join("region/r.0.0.mca"))
        .await
        .unwrap();
    assert!(!converted.has_chunk(LocalChunkPos::new(0, 0)).await.unwrap());
    let chunk = converted.read(LocalChunkPos::new(31, 0)).await.unwrap();
    let root = chunk.root.as_compound().unwrap();
    assert_eq!(root["DataVersion"], Tag::Int(1343));
    let level = root["Level"].as_compound().unwrap();
    assert_eq!(level["xPos"], Tag::Int(31));
    assert_eq!(level["TerrainPopulated"], Tag::Byte(1));
    converted.close().await.unwrap();

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_run_refuses_existing_output() {
    let dir = scratch_dir("existing").await;
    let config = Config::new(dir.join("old"), dir.join("new"));
    tokio::fs::create_dir_all(&config.input).await.unwrap();
    tokio::fs::create_dir_all(&config.output).await.unwrap();

    assert_matches!(
        run(&config).await,
        Err(RetrogradeError::InvalidArgument(_))
    );

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_run_reports_bad_mapping_file() {
    let dir = scratch_dir("mapping").await;
    let mut config = Config::new(dir.join("old"), dir.join("new"));
    tokio::fs::create_dir_all(&config.input).await.unwrap();
    let mapping = dir.join("blocks.json");
    tokio::fs::write(&mapping, b"{not json").await.unwrap();
    config.block_mapping = Some(mapping);

    assert_matches!(
        run(&config).await,
        Err(RetrogradeError::InvalidFormat(_))
    );
    assert!(tokio::fs::metadata(&config.output).await.is_err());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
