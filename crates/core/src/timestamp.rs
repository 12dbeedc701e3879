use crate::metadata::TagMap;
use crate::tables::FILE_MODIFY_DATE_TAG;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

// Tag values: "2021:03:04 10:20:30", "2021-03-04T10:20:30.123+09:00", ...
static TAG_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\D(\d{2})\D(\d{2})\D+(\d{2})\D(\d{2})\D(\d{2})")
        .expect("failed to compile tag date regex")
});

// Filenames: "IMG_20200501_123000", "2020-05-01_12-30-00", "VID 2020.05.01 12h30m00s"
static FILENAME_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})\D*(\d{2})\D*(\d{2})\D*(\d{2})\D*(\d{2})\D*(\d{2})")
        .expect("failed to compile filename date regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampFallbacks {
    pub check_file_modify_date: bool,
    pub use_filename_for_timestamp: bool,
}

/// Resolves the canonical capture time of a file.
///
/// The priority list is walked first; with `check_file_modify_date` the
/// `FileModifyDate` tag is consulted after it. Values that do not parse into
/// a valid date-time count as absent. With `use_filename_for_timestamp`, the
/// file stem is tried last.
pub fn resolve_timestamp(
    tags: &TagMap,
    path: &Path,
    priority: &[String],
    fallbacks: TimestampFallbacks,
) -> Option<NaiveDateTime> {
    let modify_tag = fallbacks
        .check_file_modify_date
        .then_some(FILE_MODIFY_DATE_TAG);
    let names = priority.iter().map(String::as_str).chain(modify_tag);

    for name in names {
        let Some(raw) = tags.get(name) else {
            continue;
        };
        match parse_tag_timestamp(raw) {
            Some(ts) => {
                debug!(path = %path.display(), tag = name, %ts, "タグから日時を取得");
                return Some(ts);
            }
            None => debug!(path = %path.display(), tag = name, raw = %raw, "日時として解釈できないタグ"),
        }
    }

    if fallbacks.use_filename_for_timestamp {
        let stem = path.file_stem()?.to_string_lossy();
        if let Some(ts) = parse_filename_timestamp(&stem) {
            debug!(path = %path.display(), %ts, "ファイル名から日時を取得");
            return Some(ts);
        }
    }

    None
}

pub fn parse_tag_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let caps = TAG_DATE_RE.captures(raw.trim())?;
    from_groups(&caps)
}

/// First valid date-time embedded in `name`. Every digit position is tried as
/// a start, so a leading counter like `DSC_1234_` cannot swallow the date.
pub fn parse_filename_timestamp(name: &str) -> Option<NaiveDateTime> {
    name.char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .find_map(|(start, _)| {
            let caps = FILENAME_DATE_RE.captures_at(name, start)?;
            from_groups(&caps)
        })
}

fn from_groups(caps: &regex::Captures<'_>) -> Option<NaiveDateTime> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}
