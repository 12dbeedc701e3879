use crate::digest::files_identical;
use crate::metadata::FileRecord;
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Two byte-identical files. `first` always sorts before `second`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl DuplicatePair {
    fn new(a: &Path, b: &Path) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_path_buf(),
            second: second.to_path_buf(),
        }
    }
}

pub fn group_by_size(records: &[FileRecord]) -> Result<BTreeMap<u64, Vec<&Path>>> {
    let mut groups = BTreeMap::<u64, Vec<&Path>>::new();
    for record in records {
        groups
            .entry(record.size()?)
            .or_default()
            .push(record.path.as_path());
    }
    Ok(groups)
}

/// Returns every confirmed duplicate pair, sorted. Only files that share a
/// size are ever opened, and a pair is confirmed by full comparison.
pub fn find_duplicates(records: &[FileRecord]) -> Result<Vec<DuplicatePair>> {
    let groups = group_by_size(records)?;

    let candidates: Vec<(&Path, &Path)> = groups
        .values()
        .filter(|group| group.len() > 1)
        .flat_map(|group| {
            group
                .iter()
                .enumerate()
                .flat_map(move |(i, &a)| group[i + 1..].iter().map(move |&b| (a, b)))
        })
        .collect();

    info!(
        files = records.len(),
        size_groups = groups.len(),
        candidate_pairs = candidates.len(),
        "重複チェック"
    );

    let mut pairs = candidates
        .par_iter()
        .map(|(a, b)| -> Result<Option<DuplicatePair>> {
            let same = files_identical(a, b)?;
            debug!(a = %a.display(), b = %b.display(), same, "バイト比較");
            Ok(same.then(|| DuplicatePair::new(a, b)))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    pairs.sort();
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TagMap;
    use std::fs;
    use tempfile::tempdir;

    fn records(paths: &[PathBuf]) -> Vec<FileRecord> {
        paths
            .iter()
            .map(|p| FileRecord::new(p.clone(), TagMap::new()))
            .collect()
    }

    #[test]
    fn equal_content_is_reported_as_pair() {
        let temp = tempdir().expect("tempdir");
        let b = temp.path().join("b.jpg");
        let a = temp.path().join("a.jpg");
        fs::write(&a, b"same bytes").expect("write a");
        fs::write(&b, b"same bytes").expect("write b");

        let pairs = find_duplicates(&records(&[b.clone(), a.clone()])).expect("detect");
        assert_eq!(
            pairs,
            vec![DuplicatePair {
                first: a,
                second: b
            }]
        );
    }

    #[test]
    fn same_size_different_content_is_not_reported() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"abcd").expect("write a");
        fs::write(&b, b"abce").expect("write b");

        assert!(find_duplicates(&records(&[a, b])).expect("detect").is_empty());
    }

    #[test]
    fn different_sizes_are_never_compared() {
        let temp = tempdir().expect("tempdir");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"abc").expect("write a");
        fs::write(&b, b"abcd").expect("write b");

        let recs = records(&[a.clone(), b.clone()]);
        let groups = group_by_size(&recs).expect("group");
        assert!(groups.values().all(|g| g.len() == 1));
        assert!(find_duplicates(&records(&[a, b])).expect("detect").is_empty());
    }

    #[test]
    fn every_pair_in_a_group_is_reported_in_order() {
        let temp = tempdir().expect("tempdir");
        let paths: Vec<PathBuf> = ["c.jpg", "a.jpg", "b.jpg"]
            .iter()
            .map(|name| temp.path().join(name))
            .collect();
        for path in &paths {
            fs::write(path, b"triplet").expect("write");
        }
        let unique = temp.path().join("d.jpg");
        fs::write(&unique, b"tripleT").expect("write unique");

        let mut all = paths.clone();
        all.push(unique);
        let pairs = find_duplicates(&records(&all)).expect("detect");
        let names: Vec<(String, String)> = pairs
            .iter()
            .map(|p| {
                (
                    p.first.file_name().unwrap().to_string_lossy().to_string(),
                    p.second.file_name().unwrap().to_string_lossy().to_string(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.jpg".to_string(), "b.jpg".to_string()),
                ("a.jpg".to_string(), "c.jpg".to_string()),
                ("b.jpg".to_string(), "c.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn unreadable_file_is_fatal() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("gone.jpg");

        let err = find_duplicates(&records(&[missing])).expect_err("missing file must fail");
        assert!(err.to_string().contains("gone.jpg"));
    }
}
