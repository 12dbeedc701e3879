use crate::metadata::{MetadataReader, TagMap};
use crate::tables::{FILE_MODIFY_DATE_TAG, FILE_TYPE_TAG};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use exif::{In, Reader, Tag};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

const FILE_TYPES_BY_EXTENSION: &[(&str, &str)] = &[
    ("jpg", "JPEG"),
    ("jpeg", "JPEG"),
    ("png", "PNG"),
    ("gif", "GIF"),
    ("bmp", "BMP"),
    ("webp", "WEBP"),
    ("heic", "HEIC"),
    ("heif", "HEIF"),
    ("tif", "TIFF"),
    ("tiff", "TIFF"),
    ("dng", "DNG"),
    ("cr2", "CR2"),
    ("cr3", "CR3"),
    ("nef", "NEF"),
    ("arw", "ARW"),
    ("raf", "RAF"),
    ("orf", "ORF"),
    ("rw2", "RW2"),
    ("mp4", "MP4"),
    ("mov", "MOV"),
    ("m4v", "M4V"),
    ("3gp", "3GP"),
    ("avi", "AVI"),
    ("mts", "M2TS"),
    ("m2ts", "M2TS"),
    ("mkv", "MKV"),
    ("wmv", "WMV"),
];

/// In-process reader built on `kamadak-exif`. Tag names follow the EXIF
/// field names (`DateTimeOriginal`, `Model`, ...). `FileType` is guessed from
/// the extension and `FileModifyDate` comes from the filesystem, so files
/// without an EXIF block still produce a usable map.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl MetadataReader for ExifReader {
    fn read(&self, path: &Path) -> Result<TagMap> {
        let mut tags = match read_exif_fields(path) {
            Ok(tags) => tags,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "EXIFなし");
                TagMap::new()
            }
        };

        if let Some(file_type) = file_type_from_extension(path) {
            tags.insert(FILE_TYPE_TAG.to_string(), file_type.to_string());
        }
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("更新日時を取得できませんでした: {}", path.display()))?;
        tags.insert(
            FILE_MODIFY_DATE_TAG.to_string(),
            DateTime::<Local>::from(modified)
                .format("%Y:%m:%d %H:%M:%S%:z")
                .to_string(),
        );
        Ok(tags)
    }
}

fn read_exif_fields(path: &Path) -> Result<TagMap> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("EXIFを解析できませんでした: {}", path.display()))?;

    let mut tags = TagMap::new();
    // Thumbnail IFD fields would shadow the primary image's.
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = field.display_value().to_string();
        let value = value.trim().trim_matches('"').trim();
        if value.is_empty() {
            continue;
        }
        tags.entry(tag_name(field.tag))
            .or_insert_with(|| value.to_string());
    }
    Ok(tags)
}

// kamadak-exif names that differ from what exiftool reports, which is what
// the tag priority list is written against.
const EXIFTOOL_NAMES: &[(&str, &str)] = &[
    ("DateTime", "ModifyDate"),
    ("DateTimeDigitized", "CreateDate"),
];

fn tag_name(tag: Tag) -> String {
    let name = tag.to_string();
    EXIFTOOL_NAMES
        .iter()
        .find(|(exif_name, _)| *exif_name == name)
        .map(|(_, exiftool_name)| exiftool_name.to_string())
        .unwrap_or(name)
}

fn file_type_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    FILE_TYPES_BY_EXTENSION
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, file_type)| *file_type)
}
