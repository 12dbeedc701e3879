use crate::digest::{content_digest, size_of};
use anyhow::Result;
use chrono::NaiveDateTime;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Tag name -> value as reported by a metadata reader. Absent tags are absent
/// keys.
pub type TagMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    #[default]
    Exiftool,
    Builtin,
}

pub trait MetadataReader: Sync {
    fn read(&self, path: &Path) -> Result<TagMap>;

    /// Reads every path, returning maps in the same order as `paths`.
    fn read_batch(&self, paths: &[PathBuf]) -> Result<Vec<TagMap>> {
        paths.iter().map(|path| self.read(path)).collect()
    }
}

/// Reader backed by maps prepared ahead of time. Paths without an entry get an
/// empty map.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataReader {
    entries: HashMap<PathBuf, TagMap>,
}

impl StaticMetadataReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, tags: TagMap) {
        self.entries.insert(path.into(), tags);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, tags: &[(&str, &str)]) -> Self {
        let tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.insert(path, tags);
        self
    }
}

impl MetadataReader for StaticMetadataReader {
    fn read(&self, path: &Path) -> Result<TagMap> {
        Ok(self.entries.get(path).cloned().unwrap_or_default())
    }
}

/// One discovered file, enriched stage by stage.
#[derive(Debug)]
pub struct FileRecord {
    pub path: PathBuf,
    pub tags: TagMap,
    pub timestamp: Option<NaiveDateTime>,
    pub model: Option<String>,
    size: OnceCell<u64>,
    digest: OnceCell<String>,
}

impl FileRecord {
    pub fn new(path: PathBuf, tags: TagMap) -> Self {
        Self {
            path,
            tags,
            timestamp: None,
            model: None,
            size: OnceCell::new(),
            digest: OnceCell::new(),
        }
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn size(&self) -> Result<u64> {
        self.size.get_or_try_init(|| size_of(&self.path)).copied()
    }

    /// Content digest, computed on first use and reused afterwards.
    pub fn digest(&self) -> Result<&str> {
        self.digest
            .get_or_try_init(|| content_digest(&self.path))
            .map(String::as_str)
    }
}
