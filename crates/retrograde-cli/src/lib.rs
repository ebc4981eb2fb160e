pub mod config;
pub mod orchestrator;

use config::Config;
use orchestrator::{Downgrader, WorldReport};
use retrograde_anvil::AnvilStore;
use retrograde_chunk::DowngradeTables;
use retrograde_common::Result;
use retrograde_logger::log;
use retrograde_logger::LogSeverity::Info;

/// Prepares the output world and converts it on the local file system.
///
/// Errors are setup failures only; per-file and per-chunk failures end up in
/// the report.
pub async fn run(config: &Config) -> Result<WorldReport> {
    let tables = DowngradeTables::load(
        config.block_mapping.as_deref(),
        config.biome_mapping.as_deref(),
    )
    .await?;
    log(
        format!(
            "Loaded {} block and {} biome mappings",
            tables.block_count(),
            tables.biome_count()
        ),
        Info,
    );

    config.prepare().await?;
    Ok(Downgrader::new(AnvilStore, tables)
        .downgrade_world(config)
        .await)
}
