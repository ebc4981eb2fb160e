#![allow(dead_code)]

use retrograde_anvil::{RegionHandle, RegionStore};
use retrograde_common::{LocalChunkPos, Result, RetrogradeError};
use retrograde_nbt::{NBTFile, Tag, TagType};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    Open(PathBuf),
    Create(PathBuf),
    Check(PathBuf, LocalChunkPos),
    Read(PathBuf, LocalChunkPos),
    Write(PathBuf, LocalChunkPos),
    Close(PathBuf),
    List(PathBuf),
}

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, HashMap<LocalChunkPos, NBTFile>>,
    failures: HashSet<Failure>,
    open_handles: usize,
    removed_files: Vec<PathBuf>,
    removed_dirs: Vec<PathBuf>,
}

/// Region files held in memory, with injectable failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<State>>,
}

fn injected(failure: &Failure) -> RetrogradeError {
    RetrogradeError::IoError(io::Error::new(
        io::ErrorKind::Other,
        format!("injected failure: {:?}", failure),
    ))
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn fail(&self, failure: Failure) {
        self.state.borrow_mut().failures.insert(failure);
    }

    fn check(&self, failure: Failure) -> Result<()> {
        if self.state.borrow().failures.contains(&failure) {
            Err(injected(&failure))
        } else {
            Ok(())
        }
    }

    pub fn insert_chunk(&self, path: impl AsRef<Path>, pos: LocalChunkPos, chunk: NBTFile) {
        self.state
            .borrow_mut()
            .files
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .insert(pos, chunk);
    }

    pub fn insert_file(&self, path: impl AsRef<Path>) {
        self.state
            .borrow_mut()
            .files
            .entry(path.as_ref().to_path_buf())
            .or_default();
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.state.borrow().files.contains_key(path.as_ref())
    }

    pub fn chunk(&self, path: impl AsRef<Path>, pos: LocalChunkPos) -> Option<NBTFile> {
        self.state
            .borrow()
            .files
            .get(path.as_ref())
            .and_then(|chunks| chunks.get(&pos).cloned())
    }

    pub fn chunk_count(&self, path: impl AsRef<Path>) -> usize {
        self.state
            .borrow()
            .files
            .get(path.as_ref())
            .map_or(0, HashMap::len)
    }

    pub fn open_handles(&self) -> usize {
        self.state.borrow().open_handles
    }

    pub fn removed_files(&self) -> Vec<PathBuf> {
        self.state.borrow().removed_files.clone()
    }

    pub fn removed_dirs(&self) -> Vec<PathBuf> {
        self.state.borrow().removed_dirs.clone()
    }
}

pub struct MemoryRegion {
    path: PathBuf,
    store: MemoryStore,
}

impl RegionHandle for MemoryRegion {
    async fn has_chunk(&mut self, pos: LocalChunkPos) -> Result<bool> {
        self.store.check(Failure::Check(self.path.clone(), pos))?;
        Ok(self.store.chunk(&self.path, pos).is_some())
    }

    async fn read(&mut self, pos: LocalChunkPos) -> Result<NBTFile> {
        self.store.check(Failure::Read(self.path.clone(), pos))?;
        self.store
            .chunk(&self.path, pos)
            .ok_or_else(|| RetrogradeError::invalid_argument(format!("{} is absent", pos)))
    }

    async fn write(&mut self, pos: LocalChunkPos, chunk: &NBTFile) -> Result<()> {
        self.store.check(Failure::Write(self.path.clone(), pos))?;
        self.store.insert_chunk(&self.path, pos, chunk.clone());
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.store.state.borrow_mut().open_handles -= 1;
        self.store.check(Failure::Close(self.path.clone()))
    }
}

impl RegionStore for MemoryStore {
    type Handle = MemoryRegion;

    async fn open(&self, path: &Path) -> Result<MemoryRegion> {
        self.check(Failure::Open(path.to_path_buf()))?;
        if !self.exists(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound).into());
        }
        self.state.borrow_mut().open_handles += 1;
        Ok(MemoryRegion {
            path: path.to_path_buf(),
            store: self.clone(),
        })
    }

    async fn create(&self, path: &Path) -> Result<MemoryRegion> {
        self.check(Failure::Create(path.to_path_buf()))?;
        if self.exists(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists).into());
        }
        self.insert_file(path);
        self.state.borrow_mut().open_handles += 1;
        Ok(MemoryRegion {
            path: path.to_path_buf(),
            store: self.clone(),
        })
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.files.remove(path);
        state.removed_files.push(path.to_path_buf());
        Ok(())
    }

    async fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.check(Failure::List(dir.to_path_buf()))?;
        Ok(self
            .state
            .borrow()
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    async fn remove_dir(&self, dir: &Path) -> Result<()> {
        self.state.borrow_mut().removed_dirs.push(dir.to_path_buf());
        Ok(())
    }
}

fn compound(entries: Vec<(&str, Tag)>) -> Tag {
    Tag::Compound(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

/// A 1.13 chunk with one all-stone section at y 0.
pub fn chunk_fixture(x: i32, z: i32) -> NBTFile {
    let section = compound(vec![
        ("Y", Tag::Byte(0)),
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
    ]);
    let level = compound(vec![
        ("xPos", Tag::Int(x)),
        ("zPos", Tag::Int(z)),
        ("InhabitedTime", Tag::Long(0)),
        ("LastUpdate", Tag::Long(100)),
        ("Biomes", Tag::IntArray(vec![1; 256])),
        ("Sections", Tag::List(TagType::Compound, vec![section])),
    ]);
    NBTFile::new(
        String::new(),
        compound(vec![("Level", level), ("DataVersion", Tag::Int(1631))]),
    )
}

/// A chunk the transcoder rejects: its level has no biomes.
pub fn broken_chunk_fixture() -> NBTFile {
    let level = compound(vec![
        ("xPos", Tag::Int(0)),
        ("zPos", Tag::Int(0)),
        ("Sections", Tag::List(TagType::Compound, vec![])),
    ]);
    NBTFile::new(String::new(), compound(vec![("Level", level)]))
}

/// Fills every position of a region with [`chunk_fixture`] chunks.
pub fn full_region(store: &MemoryStore, path: impl AsRef<Path>) {
    for pos in LocalChunkPos::all() {
        store.insert_chunk(
            path.as_ref(),
            pos,
            chunk_fixture(pos.x as i32, pos.z as i32),
        );
    }
}

pub async fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "retrograde-cli-{}-{}",
        name,
        std::process::id()
    ));
    let _ = tokio::fs::remove_dir_all(&dir).await;
    tokio::fs::create_dir_all(&dir).await.unwrap();
    dir
}
