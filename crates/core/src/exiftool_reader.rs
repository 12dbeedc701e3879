use crate::error::OrganizeError;
use crate::metadata::{MetadataReader, TagMap};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const DEFAULT_CHUNK: usize = 200;

/// Reads metadata by running the `exiftool` binary with JSON output. Paths are
/// passed in chunks to keep process start-up cost down.
#[derive(Debug, Clone)]
pub struct ExiftoolReader {
    program: PathBuf,
    chunk_size: usize,
}

impl Default for ExiftoolReader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("exiftool"),
            chunk_size: DEFAULT_CHUNK,
        }
    }
}

impl ExiftoolReader {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    fn command(&self, paths: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-j", "-q", "-d", "%Y:%m:%d %H:%M:%S", "-charset", "filename=utf8"])
            // Paths starting with '-' must not be read as options.
            .arg("--")
            .args(paths);
        command
    }

    fn run(&self, paths: &[PathBuf]) -> Result<Vec<TagMap>> {
        debug!(program = %self.program.display(), files = paths.len(), "exiftool実行");
        let output = self
            .command(paths)
            .output()
            .map_err(|err| {
                OrganizeError::MetadataReader(format!(
                    "{} を起動できませんでした: {err}",
                    self.program.display()
                ))
            })?;

        // exiftool exits non-zero when any single file fails but still prints
        // JSON for the rest.
        if output.stdout.is_empty() {
            if output.status.success() {
                return Ok(vec![TagMap::new(); paths.len()]);
            }
            return Err(OrganizeError::MetadataReader(format!(
                "exiftoolが失敗しました ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        let by_source = parse_exiftool_json(&output.stdout)?;
        Ok(paths
            .iter()
            .map(|path| {
                by_source
                    .get(&source_key(path))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }
}

impl MetadataReader for ExiftoolReader {
    fn read(&self, path: &Path) -> Result<TagMap> {
        let mut maps = self.run(&[path.to_path_buf()])?;
        Ok(maps.pop().unwrap_or_default())
    }

    fn read_batch(&self, paths: &[PathBuf]) -> Result<Vec<TagMap>> {
        let mut out = Vec::with_capacity(paths.len());
        for chunk in paths.chunks(self.chunk_size.max(1)) {
            out.extend(self.run(chunk)?);
        }
        Ok(out)
    }
}

/// Parses exiftool's `-j` output into maps keyed by `SourceFile`.
pub fn parse_exiftool_json(raw: &[u8]) -> Result<HashMap<String, TagMap>> {
    let entries: Vec<serde_json::Map<String, Value>> =
        serde_json::from_slice(raw).context("exiftoolの出力を解析できませんでした")?;

    let mut out = HashMap::with_capacity(entries.len());
    for entry in entries {
        let Some(source) = entry.get("SourceFile").and_then(Value::as_str) else {
            continue;
        };
        let source = source.to_string();
        let tags = entry
            .into_iter()
            .filter(|(name, _)| name != "SourceFile")
            .filter_map(|(name, value)| stringify(value).map(|v| (name, v)))
            .collect();
        out.insert(source, tags);
    }
    Ok(out)
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn source_key(path: &Path) -> String {
    // exiftool echoes the argument with forward slashes.
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_by_source_file() {
        let raw = br#"[
            {"SourceFile": "in/a.jpg", "FileType": "JPEG", "Model": "SM-G960F",
             "DateTimeOriginal": "2021:03:04 10:20:30", "ISO": 100, "Flash": null},
            {"SourceFile": "in/b.mov", "FileType": "MOV"},
            {"FileType": "PNG"}
        ]"#;

        let parsed = parse_exiftool_json(raw).expect("parse");
        assert_eq!(parsed.len(), 2);
        let a = &parsed["in/a.jpg"];
        assert_eq!(a.get("FileType").map(String::as_str), Some("JPEG"));
        assert_eq!(a.get("ISO").map(String::as_str), Some("100"));
        assert!(!a.contains_key("Flash"));
        assert!(!a.contains_key("SourceFile"));
        assert_eq!(parsed["in/b.mov"].get("FileType").map(String::as_str), Some("MOV"));
    }

    #[test]
    fn rejects_non_json_output() {
        let err = parse_exiftool_json(b"Error: File not found").expect_err("must fail");
        assert!(err.to_string().contains("exiftoolの出力"));
    }

    #[test]
    fn paths_follow_end_of_options_marker() {
        let reader = ExiftoolReader::default();
        let command = reader.command(&[PathBuf::from("-odd.jpg"), PathBuf::from("b.jpg")]);
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();

        let marker = args.iter().position(|arg| arg == "--").expect("end of options");
        assert_eq!(&args[marker + 1..], ["-odd.jpg", "b.jpg"]);
        assert_eq!(args[0], "-j");
    }

    #[test]
    fn missing_binary_is_a_reader_error() {
        let reader = ExiftoolReader::with_program("/nonexistent/exiftool-binary");
        let err = reader
            .read(Path::new("a.jpg"))
            .expect_err("spawn must fail");
        assert!(matches!(
            err.downcast_ref::<OrganizeError>(),
            Some(OrganizeError::MetadataReader(_))
        ));
    }
}
