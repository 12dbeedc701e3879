use crate::config::DEFAULT_ZERO_PAD;
use crate::destination::{build_destination, Destination, Layout, Naming};
use crate::discovery::discover_files;
use crate::duplicates::find_duplicates;
use crate::error::OrganizeError;
use crate::metadata::{FileRecord, MetadataReader, TagMap};
use crate::model::resolve_model;
use crate::tables::{LookupTables, FILE_TYPE_TAG};
use crate::timestamp::{resolve_timestamp, TimestampFallbacks};
use anyhow::Result;
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub inputs: Vec<PathBuf>,
    pub output_root: PathBuf,
    pub extra_dir: Option<String>,
    pub extra_suffix: Option<String>,
    pub no_exif_prefix: Option<String>,
    pub zero_pad: usize,
    pub use_filename_for_timestamp: bool,
    pub check_file_modify_date: bool,
    pub dry_run: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_root: PathBuf::new(),
            extra_dir: None,
            extra_suffix: None,
            no_exif_prefix: None,
            zero_pad: DEFAULT_ZERO_PAD,
            use_filename_for_timestamp: false,
            check_file_modify_date: false,
            dry_run: false,
        }
    }
}

impl OrganizeOptions {
    pub fn validate(&self) -> Result<(), OrganizeError> {
        if self.output_root.as_os_str().is_empty() {
            return Err(OrganizeError::MissingOutputRoot);
        }
        if self.zero_pad == 0 {
            return Err(OrganizeError::InvalidZeroPad(self.zero_pad));
        }
        Ok(())
    }

    fn layout(&self) -> Layout<'_> {
        Layout {
            output_root: &self.output_root,
            extra_dir: non_empty(&self.extra_dir),
            extra_suffix: non_empty(&self.extra_suffix),
            zero_pad: self.zero_pad,
        }
    }

    fn fallbacks(&self) -> TimestampFallbacks {
        TimestampFallbacks {
            check_file_modify_date: self.check_file_modify_date,
            use_filename_for_timestamp: self.use_filename_for_timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: Destination,
    pub timestamp: Option<NaiveDateTime>,
    pub ordinal: Option<u64>,
    pub model: Option<String>,
    pub digest: String,
}

impl PlannedMove {
    pub fn target_path(&self) -> PathBuf {
        self.destination.path()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    UnknownFileType { file_type: Option<String> },
    NoTimestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OrganizeStats {
    pub scanned_files: usize,
    pub recognized: usize,
    pub skipped_unknown_type: usize,
    pub skipped_no_timestamp: usize,
    pub timestamped: usize,
    pub ordinal_named: usize,
    pub planned: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizePlan {
    pub output_root: PathBuf,
    pub moves: Vec<PlannedMove>,
    pub skipped: Vec<SkippedFile>,
    pub stats: OrganizeStats,
}

/// Per-run counter for files named without a timestamp. Ordinals start at 1
/// and are handed out in discovery order.
#[derive(Debug)]
struct OrdinalCounter {
    next: u64,
}

impl OrdinalCounter {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn take(&mut self) -> u64 {
        let current = self.next;
        self.next += 1;
        current
    }
}

/// Runs every step short of touching the filesystem: discovery, the duplicate
/// gate, per-file resolution, naming and collision checks.
///
/// Any confirmed duplicate aborts with [`OrganizeError::DuplicatesFound`]
/// before metadata is even read. A destination that already exists, or that
/// two files of this run would share, aborts with a collision error.
pub fn generate_plan(
    options: &OrganizeOptions,
    tables: &LookupTables,
    reader: &dyn MetadataReader,
) -> Result<OrganizePlan> {
    options.validate()?;

    let files = discover_files(&options.inputs)?;
    info!(files = files.len(), "ファイル一覧を取得しました");
    let records: Vec<FileRecord> = files
        .iter()
        .map(|path| FileRecord::new(path.clone(), TagMap::new()))
        .collect();

    let duplicates = find_duplicates(&records)?;
    if !duplicates.is_empty() {
        for pair in &duplicates {
            warn!(first = %pair.first.display(), second = %pair.second.display(), "重複ファイル");
        }
        return Err(OrganizeError::DuplicatesFound(duplicates).into());
    }

    let tag_maps = reader.read_batch(&files)?;
    if tag_maps.len() != files.len() {
        return Err(OrganizeError::MetadataReader(format!(
            "{}件中{}件分しか返されませんでした",
            files.len(),
            tag_maps.len()
        ))
        .into());
    }
    let mut stats = OrganizeStats {
        scanned_files: records.len(),
        ..OrganizeStats::default()
    };
    let mut skipped = Vec::new();
    let layout = options.layout();
    let prefix = non_empty(&options.no_exif_prefix);

    let mut ordinals = OrdinalCounter::new();
    let mut pending = Vec::<(FileRecord, String, Naming<'_>)>::with_capacity(records.len());
    for (mut record, tags) in records.into_iter().zip(tag_maps) {
        record.tags = tags;

        let Some(extension) = record
            .tag(FILE_TYPE_TAG)
            .and_then(|file_type| tables.extension_for(file_type))
            .map(str::to_string)
        else {
            let file_type = record.tag(FILE_TYPE_TAG).map(str::to_string);
            warn!(path = %record.path.display(), file_type = ?file_type, "未対応のファイル形式のためスキップします");
            stats.skipped_unknown_type += 1;
            skipped.push(SkippedFile {
                path: record.path,
                reason: SkipReason::UnknownFileType { file_type },
            });
            continue;
        };
        stats.recognized += 1;

        record.timestamp = resolve_timestamp(
            &record.tags,
            &record.path,
            &tables.tag_priority,
            options.fallbacks(),
        );
        let naming = match (record.timestamp, prefix) {
            (Some(ts), _) => Naming::Timestamp(ts),
            (None, Some(prefix)) => Naming::Ordinal {
                prefix,
                ordinal: ordinals.take(),
            },
            (None, None) => {
                warn!(path = %record.path.display(), "日時が取得できず接頭辞も未指定のためスキップします");
                stats.skipped_no_timestamp += 1;
                skipped.push(SkippedFile {
                    path: record.path,
                    reason: SkipReason::NoTimestamp,
                });
                continue;
            }
        };
        record.model = resolve_model(&record.tags, tables, layout.extra_suffix);
        pending.push((record, extension, naming));
    }

    // Digests are memoized on each record; naming below reads them in order.
    pending
        .par_iter()
        .try_for_each(|(record, _, _)| record.digest().map(|_| ()))?;

    let mut claimed = HashMap::<PathBuf, PathBuf>::new();
    let mut moves = Vec::with_capacity(pending.len());
    for (record, extension, naming) in pending {
        let ordinal = match naming {
            Naming::Ordinal { ordinal, .. } => Some(ordinal),
            Naming::Timestamp(_) => None,
        };
        let digest = record.digest()?.to_string();
        let destination = build_destination(
            &layout,
            &naming,
            &digest,
            record.model.as_deref(),
            &extension,
        );
        let target = destination.path();
        check_collision(&record.path, &target, &mut claimed)?;
        debug!(source = %record.path.display(), target = %target.display(), "移動先を決定");

        if ordinal.is_some() {
            stats.ordinal_named += 1;
        } else {
            stats.timestamped += 1;
        }
        moves.push(PlannedMove {
            source: record.path,
            destination,
            timestamp: record.timestamp,
            ordinal,
            model: record.model,
            digest,
        });
    }
    stats.planned = moves.len();

    info!(
        planned = stats.planned,
        skipped = skipped.len(),
        "移動計画を作成しました"
    );

    Ok(OrganizePlan {
        output_root: options.output_root.clone(),
        moves,
        skipped,
        stats,
    })
}

fn check_collision(
    source: &Path,
    target: &Path,
    claimed: &mut HashMap<PathBuf, PathBuf>,
) -> Result<(), OrganizeError> {
    if let Some(first) = claimed.get(target) {
        return Err(OrganizeError::DestinationConflict {
            first: first.clone(),
            second: source.to_path_buf(),
            target: target.to_path_buf(),
        });
    }
    if target.exists() {
        return Err(OrganizeError::DestinationExists {
            source_path: source.to_path_buf(),
            target: target.to_path_buf(),
        });
    }
    claimed.insert(target.to_path_buf(), source.to_path_buf());
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
