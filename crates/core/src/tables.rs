use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FILE_TYPE_TAG: &str = "FileType";
pub const MODEL_TAG: &str = "Model";
pub const FILE_MODIFY_DATE_TAG: &str = "FileModifyDate";

const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("JPEG", "jpg"),
    ("PNG", "png"),
    ("GIF", "gif"),
    ("BMP", "bmp"),
    ("WEBP", "webp"),
    ("HEIC", "heic"),
    ("HEIF", "heif"),
    ("TIFF", "tif"),
    ("DNG", "dng"),
    ("CR2", "cr2"),
    ("CR3", "cr3"),
    ("NEF", "nef"),
    ("ARW", "arw"),
    ("RAF", "raf"),
    ("ORF", "orf"),
    ("RW2", "rw2"),
    ("MP4", "mp4"),
    ("MOV", "mov"),
    ("M4V", "m4v"),
    ("3GP", "3gp"),
    ("AVI", "avi"),
    ("M2TS", "mts"),
    ("MKV", "mkv"),
    ("WMV", "wmv"),
];

const DEFAULT_MODEL_ALIASES: &[(&str, &str)] = &[
    ("SM-G960F", "Galaxy S9"),
    ("SM-G965F", "Galaxy S9+"),
    ("SM-G973F", "Galaxy S10"),
    ("SM-G991B", "Galaxy S21"),
    ("SM-A520F", "Galaxy A5"),
    ("Canon EOS 5D Mark III", "EOS 5D3"),
    ("Canon EOS 5D Mark IV", "EOS 5D4"),
    ("DMC-TZ101", "TZ101"),
];

// Capture time first, container/file times last.
const DEFAULT_TAG_PRIORITY: &[&str] = &[
    "DateTimeOriginal",
    "CreateDate",
    "DateTimeDigitized",
    "MediaCreateDate",
    "TrackCreateDate",
    "CreationDate",
    "ModifyDate",
];

/// Fixed lookup data consulted by the resolvers. Built once per run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTables {
    pub extensions: BTreeMap<String, String>,
    pub model_aliases: BTreeMap<String, String>,
    pub tag_priority: Vec<String>,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self {
            extensions: to_map(DEFAULT_EXTENSIONS),
            model_aliases: to_map(DEFAULT_MODEL_ALIASES),
            tag_priority: DEFAULT_TAG_PRIORITY
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
        }
    }
}

impl LookupTables {
    /// Canonical lowercase extension for a reported file type.
    pub fn extension_for(&self, file_type: &str) -> Option<&str> {
        self.extensions.get(file_type.trim()).map(String::as_str)
    }

    pub fn alias_for(&self, raw_model: &str) -> Option<&str> {
        self.model_aliases.get(raw_model).map(String::as_str)
    }

    /// Layers user supplied entries on top of the built-in tables. A non-empty
    /// priority list replaces the default order entirely.
    pub fn with_overrides(mut self, overrides: &TableOverrides) -> Self {
        for (file_type, ext) in &overrides.extensions {
            self.extensions
                .insert(file_type.trim().to_string(), ext.trim().to_lowercase());
        }
        for (raw, alias) in &overrides.model_aliases {
            self.model_aliases
                .insert(raw.trim().to_string(), alias.trim().to_string());
        }
        if !overrides.tag_priority.is_empty() {
            self.tag_priority = overrides.tag_priority.clone();
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    pub extensions: BTreeMap<String, String>,
    pub model_aliases: BTreeMap<String, String>,
    pub tag_priority: Vec<String>,
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
