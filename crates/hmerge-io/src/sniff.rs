//! Delimiter detection.
//!
//! Counts each candidate in the first line and picks the most frequent one that
//! occurs at least once. Ties go to the earlier candidate. A readable header
//! with none of them is a single column and reads as comma-delimited.

use std::path::Path;

use crate::buf::{bounded_from_path, first_line};
use crate::error::{Error, Result};

/// Candidates in tie-break order.
pub const CANDIDATES: [u8; 3] = [b',', b'\t', b'|'];

/// Upper bound on bytes examined when looking for the first line.
const HEADER_SCAN_LIMIT: usize = 4 << 20;

pub fn detect_delimiter(line: &[u8]) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for cand in CANDIDATES {
        let n = line.iter().filter(|&&b| b == cand).count();
        if n == 0 {
            continue;
        }
        match best {
            Some((_, m)) if m >= n => {}
            _ => best = Some((cand, n)),
        }
    }
    best.map(|(d, _)| d)
}

/// Detect the delimiter of the file at `path` from its first line.
pub fn sniff_delimiter(path: &Path) -> Result<u8> {
    let mut rdr = bounded_from_path(path, 64 * 1024)?;
    let line = first_line(&mut rdr, HEADER_SCAN_LIMIT)?;
    if line.is_empty() {
        return Err(Error::MissingHeader(path.to_path_buf()));
    }
    if let Some(d) = detect_delimiter(&line) {
        return Ok(d);
    }
    if std::str::from_utf8(&line).is_err() {
        return Err(Error::UndetectableDelimiter(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), "no delimiter in header, reading as one column");
    Ok(b',')
}

/// Printable name for log lines.
pub fn delimiter_name(d: u8) -> &'static str {
    match d {
        b',' => "comma",
        b'\t' => "tab",
        b'|' => "pipe",
        b';' => "semicolon",
        _ => "custom",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_frequent() {
        assert_eq!(detect_delimiter(b"a|b|c,d"), Some(b'|'));
        assert_eq!(detect_delimiter(b"a\tb\tc"), Some(b'\t'));
        assert_eq!(detect_delimiter(b"a,b"), Some(b','));
    }

    #[test]
    fn ties_prefer_comma_then_tab() {
        assert_eq!(detect_delimiter(b"a,b\tc"), Some(b','));
        assert_eq!(detect_delimiter(b"a|b\tc"), Some(b'\t'));
    }

    fn write_tmp(name: &str, body: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hmerge-io-sniff-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn single_column_header_reads_as_comma() {
        let p = write_tmp("one.csv", b"y\ncat\nNA\n");
        assert_eq!(sniff_delimiter(&p).unwrap(), b',');
    }

    #[test]
    fn unreadable_or_empty_header_is_rejected() {
        let p = write_tmp("binary.csv", b"\xff\xfe\x00\n1\n");
        assert!(matches!(sniff_delimiter(&p), Err(Error::UndetectableDelimiter(_))));
        let p = write_tmp("empty.csv", b"\n1,2\n");
        assert!(matches!(sniff_delimiter(&p), Err(Error::MissingHeader(_))));
    }

    #[test]
    fn none_when_absent() {
        assert_eq!(detect_delimiter(b"single_column"), None);
        assert_eq!(detect_delimiter(b""), None);
    }
}
