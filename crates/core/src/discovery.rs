use crate::error::OrganizeError;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Regular files under every root, in a stable order: roots in the order
/// given, files within a root sorted by path. Symlinks are not followed and
/// not returned. A file reachable from two overlapping roots is listed once.
///
/// Sorting is lexical over path components (byte order), not natural or
/// locale-aware: `IMG_10.jpg` comes before `IMG_2.jpg`.
pub fn discover_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut seen = HashSet::<PathBuf>::new();
    for root in roots {
        if !root.is_dir() {
            return Err(OrganizeError::InputNotFound(root.clone()).into());
        }
        let mut files = collect_files(root)?;
        files.sort();
        out.extend(files.into_iter().filter(|path| seen.insert(path.clone())));
    }
    Ok(out)
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        out.push(entry.into_path());
    }
    Ok(out)
}
