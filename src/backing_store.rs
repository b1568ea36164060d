//! Where block bytes live. Commit and sync semantics belong to whatever sits
//! behind this trait; the engine only reads and writes whole files.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub const BLOCK_EXTENSION: &str = "json";

pub trait BackingStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Byte size of the file at `path`.
    fn size(&self, path: &Path) -> io::Result<u64>;

    /// Sorted block names (file stems of `*.json`) directly under `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

impl<T: BackingStore + ?Sized> BackingStore for Arc<T> {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write(path, bytes)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        (**self).size(path)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).list(dir)
    }
}

/// Plain filesystem store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl BackingStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                if let Some(name) = block_name(&path) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-process store. Counts reads so callers can observe caching.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful and failed `read` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn files(&self) -> io::Result<MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>>> {
        self.files
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store lock poisoned"))
    }
}

impl BackingStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files()?
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.files()?.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        self.files()?
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = self
            .files()?
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| block_name(path))
            .collect();
        names.sort();
        Ok(names)
    }
}

fn block_name(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != BLOCK_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such block file: {}", path.display()),
    )
}
