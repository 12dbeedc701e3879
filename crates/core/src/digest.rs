use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

pub const DIGEST_LEN: usize = 8;

const CHUNK_SIZE: usize = 64 * 1024;

pub fn size_of(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path)
        .with_context(|| format!("ファイル情報を取得できませんでした: {}", path.display()))?;
    Ok(meta.len())
}

/// First `DIGEST_LEN` hex characters of the file's BLAKE3 hash. Only used to
/// make filenames distinguishable, never to decide equality.
pub fn content_digest(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("ハッシュ対象を開けませんでした: {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_reader(file)
        .with_context(|| format!("ハッシュ計算中に読み込みに失敗しました: {}", path.display()))?;
    let hex = hasher.finalize().to_hex();
    Ok(hex[..DIGEST_LEN].to_string())
}

/// Full byte comparison of two files. Callers compare only equal-size files,
/// but a length mismatch is still reported as "different".
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let mut left = BufReader::with_capacity(
        CHUNK_SIZE,
        File::open(a).with_context(|| format!("比較対象を開けませんでした: {}", a.display()))?,
    );
    let mut right = BufReader::with_capacity(
        CHUNK_SIZE,
        File::open(b).with_context(|| format!("比較対象を開けませんでした: {}", b.display()))?,
    );

    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = read_full(&mut left, &mut left_buf)
            .with_context(|| format!("比較中に読み込みに失敗しました: {}", a.display()))?;
        let m = read_full(&mut right, &mut right_buf)
            .with_context(|| format!("比較中に読み込みに失敗しました: {}", b.display()))?;
        if n != m || left_buf[..n] != right_buf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

// Fills `buf` unless EOF comes first, so both sides advance in lockstep.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
