//! Program sourcing - turning files into a digit stream and back
//!
//! A program is either:
//! - a directory of `*.y2k` files whose modification times, read in name
//!   order, spell the digits
//! - a single file, read by its timestamp when it has a timestamp program
//!   in it, or as raw text otherwise
//!
//! Raw text uses one `<digits> : <comment>` line per statement. Export turns
//! raw text back into a directory of timestamp-only files.

use crate::error::{Error, Result};
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Extension of program files inside a directory
pub const EXTENSION: &str = "y2k";

/// Largest nanosecond timestamp that still holds a program. Files touched
/// after this are ordinary files.
pub const MAX_TIMESTAMP: u128 = 999_999_999_999_999_999;

/// Digits held by one exported timestamp
pub const TIMESTAMP_DIGITS: usize = 18;

/// Filler digit prefixed to every exported timestamp after the first
const FILLER: char = '8';

/// Characters that start a comment in raw text
const COMMENT_MARKERS: [char; 2] = ['#', ':'];

/// Load the digit stream for `path` (a directory or a single file).
pub fn load(path: &Path, window: usize) -> Result<String> {
    if path.is_dir() {
        load_dir(path, window)
    } else {
        load_file(path, window)
    }
}

/// A single file: its timestamp if it is a timestamp program, otherwise its
/// raw text.
pub fn load_file(path: &Path, window: usize) -> Result<String> {
    match file_timestamp(path, window)? {
        Some(digits) => Ok(digits),
        None => read_raw(path),
    }
}

/// Every `*.y2k` file in `dir`, by name. All contributions after the first
/// lose their leading `window` digits, which only exist so the timestamp
/// does not start with a 0.
pub fn load_dir(dir: &Path, window: usize) -> Result<String> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == EXTENSION))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut digits = String::new();
    for file in &files {
        let Some(stamp) = file_timestamp(file, window)? else {
            debug!(file = %file.display(), "not a timestamp program, skipped");
            continue;
        };
        if digits.is_empty() {
            digits.push_str(&stamp);
        } else {
            digits.push_str(stamp.get(window..).unwrap_or(""));
        }
    }
    Ok(digits)
}

/// Modification time in Unix nanoseconds, or `None` for files touched after
/// [`MAX_TIMESTAMP`]. A window wider than 1 gets a leading 0 so the first
/// group lines up.
pub fn file_timestamp(path: &Path, window: usize) -> Result<Option<String>> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(path, e))?;
    let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) else {
        return Ok(None);
    };
    let nanos = since_epoch.as_nanos();
    if nanos > MAX_TIMESTAMP {
        return Ok(None);
    }
    let prefix = if window > 1 { "0" } else { "" };
    Ok(Some(format!("{prefix}{nanos}")))
}

/// Read raw text: comments and everything that is not a digit are dropped.
pub fn read_raw(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(strip_raw(&text))
}

/// Strip comments and non-digits from raw program text.
pub fn strip_raw(text: &str) -> String {
    text.lines()
        .map(|line| match line.find(COMMENT_MARKERS) {
            Some(at) => &line[..at],
            None => line,
        })
        .flat_map(|line| line.chars().filter(char::is_ascii_digit))
        .collect()
}

/// Split a digit stream into the timestamps of an exported directory.
///
/// The first file holds [`TIMESTAMP_DIGITS`] digits; every later one holds
/// filler digits (dropped again on load) plus the next chunk. The last chunk
/// is padded with trailing zeros.
///
/// A timestamp loses its leading zeros, which [`file_timestamp`] puts back
/// as a single `0` when the window is wider than 1. So such a program must
/// start with `0`, and later files need one filler digit less.
pub fn export_chunks(digits: &str, window: usize) -> Result<Vec<String>> {
    if window == 0 || window >= TIMESTAMP_DIGITS {
        return Err(Error::export(format!(
            "window {window} does not fit in a {TIMESTAMP_DIGITS}-digit timestamp"
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::export("program contains non-digit characters"));
    }
    if window > 1 && !digits.is_empty() && !digits.starts_with('0') {
        return Err(Error::export(format!(
            "a program read {window} digits at a time must start with 0"
        )));
    }
    let filler = filler_len(window);

    let mut chunks = Vec::new();
    let mut rest = digits;
    while !rest.is_empty() {
        let first = chunks.is_empty();
        let take = if first {
            TIMESTAMP_DIGITS
        } else {
            TIMESTAMP_DIGITS - filler
        };
        let (chunk, tail) = rest.split_at(take.min(rest.len()));
        let mut stamp = String::with_capacity(TIMESTAMP_DIGITS);
        if !first {
            stamp.extend(std::iter::repeat_n(FILLER, filler));
        }
        stamp.push_str(chunk);
        while stamp.len() < TIMESTAMP_DIGITS {
            stamp.push('0');
        }
        chunks.push(stamp);
        rest = tail;
    }
    Ok(chunks)
}

/// Filler digits before each later file's chunk, so that the `window`
/// digits trimmed on load are exactly the filler (plus the restored `0`).
fn filler_len(window: usize) -> usize {
    if window > 1 { window - 1 } else { 1 }
}

/// Convert an 18-digit timestamp to a system time.
pub fn timestamp_to_time(stamp: &str) -> Result<SystemTime> {
    if stamp.len() != TIMESTAMP_DIGITS {
        return Err(Error::export(format!(
            "invalid timestamp length {} (must be {TIMESTAMP_DIGITS})",
            stamp.len()
        )));
    }
    let (secs, nanos) = stamp.split_at(9);
    let parse = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| Error::export(format!("invalid timestamp digits: {stamp}")))
    };
    let (secs, nanos) = (parse(secs)?, parse(nanos)?);
    Ok(UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_nanos(nanos))
}

/// Write `digits` to `outdir` as a set of empty, timestamped files. Returns
/// the files written, in load order.
pub fn export(digits: &str, outdir: &Path, window: usize) -> Result<Vec<PathBuf>> {
    let chunks = export_chunks(digits, window)?;
    fs::create_dir_all(outdir).map_err(|e| Error::io(outdir, e))?;

    let mut written = Vec::with_capacity(chunks.len());
    for (n, stamp) in chunks.iter().enumerate() {
        let path = outdir.join(format!("{n:04}.{EXTENSION}"));
        let time = timestamp_to_time(stamp)?;
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
            .map_err(|e| Error::io(&path, e))?;

        let shown = chrono::DateTime::<chrono::Utc>::from(time);
        info!("Writing {} -- {stamp} ({shown})", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_raw_comments_and_whitespace() {
        let text = "8 1 2 3 : create x\n1 0 0   # value\n\n9 2 1 1 : print x\n";
        assert_eq!(strip_raw(text), "81231009211");
    }

    #[test]
    fn test_strip_raw_full_line_comment() {
        assert_eq!(strip_raw(": nothing here\n91289"), "91289");
    }

    #[test]
    fn test_export_chunks_first_and_rest() {
        let digits = "1".repeat(20);
        let chunks = export_chunks(&digits, 1).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "1".repeat(18));
        assert_eq!(chunks[1], "811".to_string() + &"0".repeat(15));
    }

    #[test]
    fn test_export_chunks_window_two_filler() {
        let digits = "0".to_string() + &"2".repeat(18);
        let chunks = export_chunks(&digits, 2).unwrap();
        assert_eq!(chunks[0], "0".to_string() + &"2".repeat(17));
        assert_eq!(chunks[1], "82".to_string() + &"0".repeat(16));
    }

    #[test]
    fn test_export_chunks_window_three_filler() {
        let digits = "0".to_string() + &"3".repeat(20);
        let chunks = export_chunks(&digits, 3).unwrap();
        assert_eq!(chunks[1], "8833".to_string() + &"0".repeat(14));
    }

    #[test]
    fn test_export_wide_window_needs_leading_zero() {
        assert_eq!(export_chunks("0901040809", 2).unwrap().len(), 1);
        assert!(matches!(export_chunks("1901", 2), Err(Error::Export { .. })));
    }

    #[test]
    fn test_export_chunks_rejects_bad_input() {
        assert!(export_chunks("12a", 1).is_err());
        assert!(export_chunks("12", 0).is_err());
        assert!(export_chunks("12", 18).is_err());
        assert!(export_chunks("", 1).unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_to_time() {
        let time = timestamp_to_time("000000001000000005").unwrap();
        let since = time.duration_since(UNIX_EPOCH).unwrap();
        assert_eq!(since.as_secs(), 1);
        assert_eq!(since.subsec_nanos(), 5);
        assert!(timestamp_to_time("123").is_err());
    }

    #[test]
    fn test_export_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let program = "8123100921191289";
        let files = export(program, dir.path(), 1).unwrap();
        assert_eq!(files.len(), 1);

        let loaded = load(dir.path(), 1).unwrap();
        assert!(loaded.starts_with(program));
        assert!(loaded[program.len()..].bytes().all(|b| b == b'0'));
    }

    #[test]
    fn test_export_then_load_multiple_files() {
        let dir = tempfile::tempdir().unwrap();
        let program: String = "123456789".repeat(4);
        let files = export(&program, dir.path(), 1).unwrap();
        assert_eq!(files.len(), 3);

        let loaded = load(dir.path(), 1).unwrap();
        assert!(loaded.starts_with(&program));
    }

    #[test]
    fn test_export_then_load_window_two() {
        let dir = tempfile::tempdir().unwrap();
        let program = "0".to_string() + &"1".repeat(40);
        let files = export(&program, dir.path(), 2).unwrap();
        assert_eq!(files.len(), 3);

        let loaded = load(dir.path(), 2).unwrap();
        assert!(loaded.starts_with(&program));
        assert!(loaded[program.len()..].bytes().all(|b| b == b'0'));
    }

    #[test]
    fn test_load_dir_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        export("91289", dir.path(), 1).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let loaded = load(dir.path(), 1).unwrap();
        assert!(loaded.starts_with("91289"));
    }

    #[test]
    fn test_recent_file_reads_as_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.y2k");
        fs::write(&path, "9 1 2 8 9 : print hi\n").unwrap();
        assert_eq!(file_timestamp(&path, 1).unwrap(), None);
        assert_eq!(load(&path, 1).unwrap(), "91289");
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let err = load(Path::new("/definitely/not/here.y2k"), 1).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
