use clap::Parser;
use retrograde_common::{Result, RetrogradeError};
use retrograde_logger::LogSeverity;
use std::path::PathBuf;

/// Region folders of a world, relative to its root.
pub const WORLD_FOLDERS: [&str; 3] = ["region", "DIM1", "DIM-1"];
/// Copied through unchanged.
pub const LEVEL_DAT: &str = "level.dat";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "retrograde",
    version,
    about = "Downgrades a 1.13 Minecraft world to the 1.12 chunk format"
)]
pub struct Cli {
    /// Folder of the existing 1.13 world
    pub input: PathBuf,

    /// Folder for the new 1.12 world; must not exist yet
    pub output: PathBuf,

    /// Minimum severity to print (debug, info, warning, error)
    #[arg(long = "log-level", env = "RETROGRADE_LOG_LEVEL", default_value = "info")]
    pub log_level: LogSeverity,

    /// JSON block table used instead of the builtin one
    #[arg(long = "block-mapping", env = "RETROGRADE_BLOCK_MAPPING")]
    pub block_mapping: Option<PathBuf>,

    /// JSON biome table used instead of the builtin one
    #[arg(long = "biome-mapping", env = "RETROGRADE_BIOME_MAPPING")]
    pub biome_mapping: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub log_level: LogSeverity,
    pub block_mapping: Option<PathBuf>,
    pub biome_mapping: Option<PathBuf>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            input: cli.input,
            output: cli.output,
            log_level: cli.log_level,
            block_mapping: cli.block_mapping,
            biome_mapping: cli.biome_mapping,
        }
    }
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Config {
            input: input.into(),
            output: output.into(),
            log_level: LogSeverity::Info,
            block_mapping: None,
            biome_mapping: None,
        }
    }

    /// Checks the input world and creates the output folder with its region folders.
    pub async fn prepare(&self) -> Result<()> {
        let is_dir = tokio::fs::metadata(&self.input)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(RetrogradeError::invalid_argument(format!(
                "the 1.13 world folder {} must already exist",
                self.input.display()
            )));
        }

        tokio::fs::create_dir(&self.output).await.map_err(|e| {
            RetrogradeError::invalid_argument(format!(
                "the 1.12 world folder {} must not exist yet and must be creatable: {}",
                self.output.display(),
                e
            ))
        })?;
        for folder in WORLD_FOLDERS {
            tokio::fs::create_dir(self.output.join(folder)).await?;
        }
        Ok(())
    }
}
