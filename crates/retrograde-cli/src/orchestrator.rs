use crate::config::{Config, LEVEL_DAT, WORLD_FOLDERS};
use futures::future::join_all;
use retrograde_anvil::{RegionHandle, RegionStore};
use retrograde_chunk::{downgrade_tag, summarize, DowngradeTables, DowngradeWarning};
use retrograde_common::{LocalChunkPos, Result, RetrogradeError, REGION_WIDTH};
use retrograde_logger::LogSeverity::{Debug, Info, Warning};
use retrograde_logger::{log_error, log_event};
use retrograde_nbt::NBTFile;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a region file was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Opening,
    Processing,
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStage::Opening => write!(f, "OPENING"),
            FileStage::Processing => write!(f, "PROCESSING"),
        }
    }
}

/// Where a chunk was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    Checking,
    Reading,
    Processing,
    Writing,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkStage::Checking => write!(f, "CHECKING"),
            ChunkStage::Reading => write!(f, "READING"),
            ChunkStage::Processing => write!(f, "PROCESSING"),
            ChunkStage::Writing => write!(f, "WRITING"),
        }
    }
}

#[derive(Debug)]
pub enum ChunkOutcome {
    Absent,
    Converted { warnings: Vec<DowngradeWarning> },
    Failed { stage: ChunkStage, error: RetrogradeError },
}

/// Outcome of every chunk position of a region file that made it to the end.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub chunks: Vec<(LocalChunkPos, ChunkOutcome)>,
}

impl FileReport {
    pub fn converted(&self) -> usize {
        self.chunks
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChunkOutcome::Converted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.chunks
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChunkOutcome::Failed { .. }))
            .count()
    }

    pub fn outcome(&self, pos: LocalChunkPos) -> Option<&ChunkOutcome> {
        self.chunks
            .iter()
            .find(|(chunk, _)| *chunk == pos)
            .map(|(_, outcome)| outcome)
    }
}

/// A region file that could not be opened or finished.
#[derive(Debug)]
pub struct FileFailure {
    pub stage: FileStage,
    pub path: PathBuf,
    pub error: RetrogradeError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} FILE {}: {}", self.stage, self.path.display(), self.error)
    }
}

#[derive(Debug)]
pub struct FolderReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub files: Vec<std::result::Result<FileReport, FileFailure>>,
}

#[derive(Debug)]
pub struct WorldReport {
    /// One entry per world folder; an error means the folder could not be listed.
    pub folders: Vec<Result<FolderReport>>,
    pub level_dat: Result<()>,
}

/// Runs region files through the chunk transcoder.
pub struct Downgrader<S> {
    store: S,
    tables: Arc<DowngradeTables>,
}

impl<S: RegionStore> Downgrader<S> {
    pub fn new(store: S, tables: Arc<DowngradeTables>) -> Self {
        Downgrader { store, tables }
    }

    /// Converts every present chunk of `input` into a new region file at `output`.
    ///
    /// Chunk failures are logged and recorded; only failing to open either file
    /// or to close it fails the whole file, and a partial output is removed.
    pub async fn downgrade_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> std::result::Result<FileReport, FileFailure> {
        let mut source = match self.store.open(input).await {
            Ok(handle) => handle,
            Err(error) => return Err(file_failure(FileStage::Opening, input, error)),
        };
        let mut target = match self.store.create(output).await {
            Ok(handle) => handle,
            Err(error) => {
                let _ = source.close().await;
                return Err(file_failure(FileStage::Opening, output, error));
            }
        };

        let mut chunks = Vec::with_capacity(REGION_WIDTH * REGION_WIDTH);
        for pos in LocalChunkPos::all() {
            let outcome = match self.convert_chunk(&mut source, &mut target, pos).await {
                Ok(None) => ChunkOutcome::Absent,
                Ok(Some(warnings)) => ChunkOutcome::Converted { warnings },
                Err((stage, error)) => ChunkOutcome::Failed { stage, error },
            };
            log_outcome(input, output, pos, &outcome);
            chunks.push((pos, outcome));
        }

        if let Err(error) = source.close().await {
            let _ = target.close().await;
            let _ = self.store.remove(output).await;
            return Err(file_failure(FileStage::Processing, input, error));
        }
        if let Err(error) = target.close().await {
            let _ = self.store.remove(output).await;
            return Err(file_failure(FileStage::Processing, output, error));
        }

        log_event(
            Info,
            "COMPLETED FILE",
            &format!("{} -> {}", input.display(), output.display()),
        );
        Ok(FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            chunks,
        })
    }

    async fn convert_chunk(
        &self,
        source: &mut S::Handle,
        target: &mut S::Handle,
        pos: LocalChunkPos,
    ) -> std::result::Result<Option<Vec<DowngradeWarning>>, (ChunkStage, RetrogradeError)> {
        let at = |stage: ChunkStage| move |error: RetrogradeError| (stage, error);

        if !source
            .has_chunk(pos)
            .await
            .map_err(at(ChunkStage::Checking))?
        {
            return Ok(None);
        }
        let chunk = source.read(pos).await.map_err(at(ChunkStage::Reading))?;
        let (root, warnings) =
            downgrade_tag(&chunk.root, &self.tables).map_err(at(ChunkStage::Processing))?;
        target
            .write(pos, &NBTFile::new(chunk.name, root))
            .await
            .map_err(at(ChunkStage::Writing))?;
        Ok(Some(warnings))
    }

    /// Converts every region file of `input` into `output`, one file at a time.
    pub async fn downgrade_folder(&self, input: &Path, output: &Path) -> Result<FolderReport> {
        let files = match self.store.list(input).await {
            Ok(files) => files,
            Err(error) => {
                log_error(&error, "READING FOLDER", &input.display().to_string());
                let _ = self.store.remove_dir(output).await;
                return Err(error);
            }
        };

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let report = self.downgrade_file(&file, &output.join(name)).await;
            reports.push(report);
        }

        log_event(
            Info,
            "COMPLETED FOLDER",
            &format!("{} -> {}", input.display(), output.display()),
        );
        Ok(FolderReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            files: reports,
        })
    }

    /// Converts the three region folders concurrently, then copies `level.dat`.
    pub async fn downgrade_world(&self, config: &Config) -> WorldReport {
        let folders = join_all(WORLD_FOLDERS.iter().map(|folder| async move {
            let input = config.input.join(folder);
            let output = config.output.join(folder);
            self.downgrade_folder(&input, &output).await
        }))
        .await;

        let target = format!("{} -> {}", config.input.display(), config.output.display());
        let level_dat = tokio::fs::copy(config.input.join(LEVEL_DAT), config.output.join(LEVEL_DAT))
            .await
            .map(|_| ())
            .map_err(RetrogradeError::from);
        match &level_dat {
            Ok(()) => log_event(Info, "COPIED LEVEL.DAT", &target),
            Err(error) => log_error(error, "COPYING LEVEL.DAT", &target),
        }

        WorldReport { folders, level_dat }
    }
}

fn file_failure(stage: FileStage, path: &Path, error: RetrogradeError) -> FileFailure {
    log_error(
        &error,
        &format!("{} FILE", stage),
        &path.display().to_string(),
    );
    FileFailure {
        stage,
        path: path.to_path_buf(),
        error,
    }
}

fn log_outcome(input: &Path, output: &Path, pos: LocalChunkPos, outcome: &ChunkOutcome) {
    match outcome {
        ChunkOutcome::Absent => {}
        ChunkOutcome::Converted { warnings } => {
            let target = format!("{}/{}", input.display(), pos);
            if warnings.is_empty() {
                log_event(Debug, "CONVERTED CHUNK", &target);
            }
            for (warning, count) in summarize(warnings) {
                let repeats = if count > 1 {
                    format!(" ({} times)", count)
                } else {
                    String::new()
                };
                log_event(
                    Warning,
                    "PROCESSING CHUNK",
                    &format!("{}: {}{}", target, warning, repeats),
                );
            }
        }
        ChunkOutcome::Failed { stage, error } => {
            let file = match stage {
                ChunkStage::Writing => output,
                _ => input,
            };
            log_error(
                error,
                &format!("{} CHUNK", stage),
                &format!("{}/{}", file.display(), pos),
            );
        }
    }
}
