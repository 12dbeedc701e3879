use crate::duplicates::DuplicatePair;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("出力先フォルダが指定されていません (--output-root)")]
    MissingOutputRoot,
    #[error("ゼロ埋め桁数は1以上を指定してください: {0}")]
    InvalidZeroPad(usize),
    #[error("入力フォルダが存在しません: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("{}", format_duplicates(.0))]
    DuplicatesFound(Vec<DuplicatePair>),
    #[error("移動先に同名ファイルが既に存在します: {} -> {}", source_path.display(), target.display())]
    DestinationExists {
        source_path: PathBuf,
        target: PathBuf,
    },
    #[error(
        "移動先が他のファイルと衝突しました: {} と {} -> {}",
        first.display(),
        second.display(),
        target.display()
    )]
    DestinationConflict {
        first: PathBuf,
        second: PathBuf,
        target: PathBuf,
    },
    #[error("メタデータを読み取れませんでした: {0}")]
    MetadataReader(String),
}

fn format_duplicates(pairs: &[DuplicatePair]) -> String {
    let mut out = format!(
        "重複ファイルが{}組見つかりました。処理を中止します:",
        pairs.len()
    );
    for pair in pairs {
        let _ = write!(
            out,
            "\n  {} == {}",
            pair.first.display(),
            pair.second.display()
        );
    }
    out
}
