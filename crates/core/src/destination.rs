use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a file is named: by its capture time, or by a run-wide ordinal when no
/// time could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Naming<'a> {
    Timestamp(NaiveDateTime),
    Ordinal { prefix: &'a str, ordinal: u64 },
}

/// Inputs shared by every file of a run.
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    pub output_root: &'a Path,
    pub extra_dir: Option<&'a str>,
    pub extra_suffix: Option<&'a str>,
    pub zero_pad: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Destination {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

pub fn build_destination(
    layout: &Layout<'_>,
    naming: &Naming<'_>,
    digest: &str,
    model: Option<&str>,
    extension: &str,
) -> Destination {
    let (mut dir, stem) = match naming {
        Naming::Timestamp(ts) => (
            layout
                .output_root
                .join(format!("{:04}", ts.year()))
                .join(format!("{:02}", ts.month())),
            format!(
                "{:04}_{:02}_{:02}-{:02}_{:02}_{:02}",
                ts.year(),
                ts.month(),
                ts.day(),
                ts.hour(),
                ts.minute(),
                ts.second()
            ),
        ),
        Naming::Ordinal { prefix, ordinal } => (
            layout.output_root.to_path_buf(),
            format!("{}-{:0width$}", prefix, ordinal, width = layout.zero_pad),
        ),
    };
    if let Some(extra) = layout.extra_dir {
        dir.push(extra);
    }

    let mut file_name = format!("{}-{}", stem, digest);
    for tag in [model, layout.extra_suffix].into_iter().flatten() {
        file_name.push('-');
        file_name.push_str(tag);
    }
    file_name.push('.');
    file_name.push_str(extension);

    Destination { dir, file_name }
}
