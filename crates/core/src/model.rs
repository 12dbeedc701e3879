use crate::metadata::TagMap;
use crate::tables::{LookupTables, MODEL_TAG};
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s-]+").expect("failed to compile separator regex"));

/// Filesystem-safe device label, or `None` when the model tag is missing or
/// the label would just repeat `extra_suffix`.
pub fn resolve_model(
    tags: &TagMap,
    tables: &LookupTables,
    extra_suffix: Option<&str>,
) -> Option<String> {
    let raw = tags.get(MODEL_TAG).map(|v| v.trim()).filter(|v| !v.is_empty())?;
    let label = normalize_label(tables.alias_for(raw).unwrap_or(raw));
    if label.is_empty() || extra_suffix == Some(label.as_str()) {
        return None;
    }
    Some(label)
}

pub fn normalize_label(value: &str) -> String {
    SEPARATOR_RUN_RE
        .replace_all(value.trim(), "_")
        .trim_matches('_')
        .to_string()
}
