use crate::error::OrganizeError;
use crate::metadata::MetadataReader;
use crate::planner::{generate_plan, OrganizeOptions, OrganizePlan, PlannedMove};
use crate::tables::LookupTables;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub moved: usize,
}

/// Outcome of a full run. `applied` is `None` for dry runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeReport {
    pub plan: OrganizePlan,
    pub applied: Option<ApplyResult>,
}

/// Moves every planned file, in plan order. The first failure stops the run;
/// files moved before it stay where they were moved.
pub fn apply_plan(plan: &OrganizePlan) -> Result<ApplyResult> {
    let mut moved = 0usize;
    for planned in &plan.moves {
        move_one(planned)?;
        moved += 1;
    }
    info!(moved, "移動が完了しました");
    Ok(ApplyResult { moved })
}

fn move_one(planned: &PlannedMove) -> Result<()> {
    let target = planned.target_path();
    fs::create_dir_all(&planned.destination.dir).with_context(|| {
        format!(
            "移動先フォルダを作成できませんでした: {}",
            planned.destination.dir.display()
        )
    })?;

    // The tree may have changed since planning.
    if target.exists() {
        return Err(OrganizeError::DestinationExists {
            source_path: planned.source.clone(),
            target,
        }
        .into());
    }

    fs::rename(&planned.source, &target).with_context(|| {
        format!(
            "移動に失敗しました: {} -> {}",
            planned.source.display(),
            target.display()
        )
    })?;
    debug!(source = %planned.source.display(), target = %target.display(), "移動");
    Ok(())
}

/// Plans and, unless `options.dry_run` is set, applies.
pub fn organize(
    options: &OrganizeOptions,
    tables: &LookupTables,
    reader: &dyn MetadataReader,
) -> Result<OrganizeReport> {
    let plan = generate_plan(options, tables, reader)?;
    let applied = if options.dry_run {
        info!(planned = plan.moves.len(), "dry-run: ファイルは移動していません");
        None
    } else {
        Some(apply_plan(&plan)?)
    };
    Ok(OrganizeReport { plan, applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use crate::metadata::StaticMetadataReader;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn planned(source: &Path, dir: &Path, file_name: &str) -> PlannedMove {
        PlannedMove {
            source: source.to_path_buf(),
            destination: Destination {
                dir: dir.to_path_buf(),
                file_name: file_name.to_string(),
            },
            timestamp: None,
            ordinal: Some(1),
            model: None,
            digest: "00000000".to_string(),
        }
    }

    fn plan_of(output_root: &Path, moves: Vec<PlannedMove>) -> OrganizePlan {
        OrganizePlan {
            output_root: output_root.to_path_buf(),
            moves,
            skipped: Vec::new(),
            stats: Default::default(),
        }
    }

    #[test]
    fn apply_creates_directories_and_moves() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("a.jpg");
        fs::write(&source, b"a").expect("write");
        let dir = temp.path().join("out").join("2021").join("03");

        let plan = plan_of(&temp.path().join("out"), vec![planned(&source, &dir, "x.jpg")]);
        let result = apply_plan(&plan).expect("apply");

        assert_eq!(result.moved, 1);
        assert!(!source.exists());
        assert_eq!(fs::read(dir.join("x.jpg")).expect("read moved"), b"a");
    }

    #[test]
    fn apply_refuses_to_overwrite_and_stops() {
        let temp = tempdir().expect("tempdir");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).expect("create out");
        let a = temp.path().join("a.jpg");
        let b = temp.path().join("b.jpg");
        fs::write(&a, b"a").expect("write a");
        fs::write(&b, b"b").expect("write b");
        fs::write(out.join("taken.jpg"), b"existing").expect("write taken");

        let plan = plan_of(
            &out,
            vec![planned(&a, &out, "taken.jpg"), planned(&b, &out, "free.jpg")],
        );
        let err = apply_plan(&plan).expect_err("must refuse");

        assert!(matches!(
            err.downcast_ref::<OrganizeError>(),
            Some(OrganizeError::DestinationExists { .. })
        ));
        assert_eq!(fs::read(out.join("taken.jpg")).expect("read"), b"existing");
        assert!(a.exists());
        assert!(b.exists(), "later files must not be moved after a failure");
        assert!(!out.join("free.jpg").exists());
    }

    #[test]
    fn missing_source_reports_paths() {
        let temp = tempdir().expect("tempdir");
        let out = temp.path().join("out");
        let plan = plan_of(
            &out,
            vec![planned(&temp.path().join("gone.jpg"), &out, "x.jpg")],
        );

        let err = apply_plan(&plan).expect_err("must fail");
        assert!(err.to_string().contains("移動に失敗しました"));
        assert!(err.to_string().contains("gone.jpg"));
    }

    #[test]
    fn organize_end_to_end_and_dry_run() {
        let temp = tempdir().expect("tempdir");
        let input = temp.path().join("in");
        let out = temp.path().join("out");
        fs::create_dir_all(&input).expect("create input");
        let photo = input.join("IMG_0001.JPG");
        let note = input.join("notes.txt");
        fs::write(&photo, b"jpeg bytes").expect("write photo");
        fs::write(&note, b"text").expect("write note");
        let reader = StaticMetadataReader::new()
            .with(
                &photo,
                &[
                    ("FileType", "JPEG"),
                    ("DateTimeOriginal", "2021:03:04 10:20:30"),
                    ("Model", "SM-G960F"),
                ],
            )
            .with(&note, &[("FileType", "TXT")]);
        let mut options = OrganizeOptions {
            inputs: vec![input.clone()],
            output_root: out.clone(),
            dry_run: true,
            ..OrganizeOptions::default()
        };
        let tables = LookupTables::default();

        let dry = organize(&options, &tables, &reader).expect("dry run");
        assert!(dry.applied.is_none());
        assert!(photo.exists());
        assert!(!out.exists());

        options.dry_run = false;
        let report = organize(&options, &tables, &reader).expect("run");
        assert_eq!(report.applied.map(|a| a.moved), Some(1));
        let target: PathBuf = report.plan.moves[0].target_path();
        assert_eq!(target, dry.plan.moves[0].target_path());
        assert!(target.exists());
        assert!(!photo.exists());
        assert!(note.exists(), "unknown types stay in place");
        assert!(target
            .file_name()
            .map(|n| n.to_string_lossy().ends_with("-Galaxy_S9.jpg"))
            .unwrap_or(false));
    }

    #[test]
    fn organize_moves_nothing_when_duplicates_exist() {
        let temp = tempdir().expect("tempdir");
        let input = temp.path().join("in");
        let out = temp.path().join("out");
        fs::create_dir_all(&input).expect("create input");
        let a = input.join("a.jpg");
        let b = input.join("b.jpg");
        let c = input.join("c.jpg");
        fs::write(&a, b"same").expect("write a");
        fs::write(&b, b"same").expect("write b");
        fs::write(&c, b"unique content").expect("write c");
        let reader = StaticMetadataReader::new()
            .with(&a, &[("FileType", "JPEG"), ("DateTimeOriginal", "2021:01:01 00:00:00")])
            .with(&b, &[("FileType", "JPEG"), ("DateTimeOriginal", "2021:01:01 00:00:01")])
            .with(&c, &[("FileType", "JPEG"), ("DateTimeOriginal", "2021:01:01 00:00:02")]);
        let options = OrganizeOptions {
            inputs: vec![input],
            output_root: out.clone(),
            ..OrganizeOptions::default()
        };

        let err = organize(&options, &LookupTables::default(), &reader).expect_err("abort");
        assert!(err.to_string().contains("a.jpg == "));
        assert!(a.exists() && b.exists() && c.exists());
        assert!(!out.exists());
    }
}
