//! Caching of tabulations.
//!
//! Constructing and tabulating elements is the expensive part of a verification run, and the
//! reference tabulation of an example is needed once for every library it is compared with.
//! Tabulations are therefore memoised in memory for the duration of a run and, if caching is
//! enabled, stored on disk between runs. Disk entries record the library version and the cache
//! format version; an entry is only used if both match.
use crate::points::points_digest;
use crate::settings::Settings;
use crate::tabulation::{EntityDofMap, Tabulation};
use crate::util::sha256_hex;
use eyre::WrapErr;
use log::{debug, warn};
use nalgebra::DMatrix;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Version of the on-disk format. Entries written with another version are ignored.
pub const CACHE_VERSION: &str = "1.0.0";

/// A tabulated element together with its entity map in reference numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTabulation {
    pub entity_dofs: EntityDofMap,
    pub tabulation: Tabulation,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    library: String,
    library_version: String,
    cache_version: String,
    content: CachedTabulation,
}

/// Identifies one tabulation.
#[derive(Debug, Clone, Copy)]
pub struct CacheKey<'a> {
    pub library: &'a str,
    pub library_version: &'a str,
    pub element: &'a str,
    pub example: &'a str,
    /// The implementation string the element was constructed from, as rendered by
    /// `ImplementationString`'s `Display`. Entries of a changed recipe are never reused.
    pub recipe: &'a str,
    pub points: &'a DMatrix<f64>,
}

impl CacheKey<'_> {
    /// The SHA-256 digest of all parts of the key.
    pub fn digest(&self) -> String {
        let points = points_digest(self.points);
        let parts = [
            self.library,
            self.library_version,
            self.element,
            self.example,
            self.recipe,
            "tabulate",
            &points,
        ];
        // Parts are joined with a separator that cannot occur in any of them
        sha256_hex(parts.join("\u{0}").as_bytes())
    }
}

#[derive(Debug, Default)]
pub struct TabulationCache {
    directory: Option<PathBuf>,
    memory: Mutex<FxHashMap<String, Arc<CachedTabulation>>>,
}

impl TabulationCache {
    /// A cache as configured by the settings: on disk under `cache_path` if caching is
    /// enabled, in memory only otherwise.
    pub fn new(settings: &Settings) -> Self {
        if settings.caching {
            Self::on_disk(&settings.cache_path)
        } else {
            Self::in_memory()
        }
    }

    pub fn on_disk(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            memory: Mutex::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    fn entry_path(&self, digest: &str) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{digest}.json")))
    }

    pub fn load(&self, key: &CacheKey<'_>) -> Option<Arc<CachedTabulation>> {
        let digest = key.digest();
        if let Some(hit) = self.memory.lock().get(&digest) {
            return Some(Arc::clone(hit));
        }

        let path = self.entry_path(&digest)?;
        if !path.exists() {
            return None;
        }
        let entry = match read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("ignoring unreadable cache entry {}: {e:#}", path.display());
                return None;
            }
        };
        if entry.cache_version != CACHE_VERSION || entry.library_version != key.library_version {
            debug!("stale cache entry {}", path.display());
            return None;
        }
        let content = Arc::new(entry.content);
        self.memory.lock().insert(digest, Arc::clone(&content));
        Some(content)
    }

    /// Stores a tabulation. Failing to write to disk is logged, but not an error.
    pub fn save(&self, key: &CacheKey<'_>, content: CachedTabulation) -> Arc<CachedTabulation> {
        let digest = key.digest();
        let content = Arc::new(content);
        self.memory.lock().insert(digest.clone(), Arc::clone(&content));

        if let Some(path) = self.entry_path(&digest) {
            let entry = CacheEntry {
                library: key.library.to_string(),
                library_version: key.library_version.to_string(),
                cache_version: CACHE_VERSION.to_string(),
                content: (*content).clone(),
            };
            if let Err(e) = write_entry(&path, &entry) {
                warn!("failed to write cache entry {}: {e:#}", path.display());
            }
        }
        content
    }

    /// Removes disk entries that can no longer be used: entries of another cache version,
    /// entries of a library whose current version differs, and unreadable entries.
    ///
    /// `versions` maps library ids to their current versions. Returns the number of entries
    /// removed.
    pub fn tidy(&self, versions: &BTreeMap<String, String>) -> eyre::Result<usize> {
        let Some(directory) = &self.directory else {
            return Ok(0);
        };
        if !directory.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        let entries = std::fs::read_dir(directory)
            .wrap_err_with(|| format!("failed to read cache directory {}", directory.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = match read_entry(&path) {
                Ok(entry) => {
                    entry.cache_version != CACHE_VERSION
                        || versions
                            .get(&entry.library)
                            .map_or(false, |v| *v != entry.library_version)
                }
                Err(_) => true,
            };
            if stale {
                std::fs::remove_file(&path)
                    .wrap_err_with(|| format!("failed to remove {}", path.display()))?;
                removed += 1;
            }
        }
        debug!("removed {removed} stale cache entries");
        Ok(removed)
    }
}

fn read_entry(path: &Path) -> eyre::Result<CacheEntry> {
    let file = std::fs::File::open(path)?;
    let entry = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(entry)
}

fn write_entry(path: &Path, entry: &CacheEntry) -> eyre::Result<()> {
    let directory = path
        .parent()
        .ok_or_else(|| eyre::eyre!("cache entry has no parent directory"))?;
    std::fs::create_dir_all(directory)?;
    // Entries are renamed into place so that concurrent readers never see partial files
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    serde_json::to_writer(&mut file, entry)?;
    file.flush()?;
    file.persist(path)?;
    Ok(())
}
