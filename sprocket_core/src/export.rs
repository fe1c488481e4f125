//! # Export Files
//!
//! Naming and writing of export artifacts. Files are written atomically:
//! the bytes go to a `.tmp` sibling, are synced, then renamed into place, so
//! a failed export never leaves a partial file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{CalcError, CalcResult};

/// Kind of export artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Spreadsheet,
}

impl ExportKind {
    /// Text appended to the product name
    pub fn suffix(self) -> &'static str {
        match self {
            ExportKind::Pdf => "_manufacturing_report",
            ExportKind::Spreadsheet => "_report",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Spreadsheet => "xlsx",
        }
    }

    /// e.g. `12.7X40_Simplex_manufacturing_report.pdf`
    pub fn file_name(self, product_name: &str) -> String {
        format!("{}{}.{}", sanitize_file_stem(product_name), self.suffix(), self.extension())
    }
}

/// Make a product name safe to use as a file name.
///
/// Letters, digits, `.`, `-` and `_` are kept; everything else becomes `_`.
/// An empty name becomes `"sprocket"`.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "sprocket".to_string()
    } else {
        stem.to_string()
    }
}

/// Write `bytes` to `path` via a synced temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    let written = tmp_file.write_all(bytes).and_then(|_| tmp_file.sync_all());
    drop(tmp_file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Write an export artifact into `dir`, creating the directory if needed.
pub fn write_export(dir: &Path, kind: ExportKind, product_name: &str, bytes: &[u8]) -> CalcResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        CalcError::file_error("create directory", dir.display().to_string(), e.to_string())
    })?;

    let path = dir.join(kind.file_name(product_name));
    write_atomic(&path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(
            ExportKind::Pdf.file_name("12.7X40 Simplex"),
            "12.7X40_Simplex_manufacturing_report.pdf"
        );
        assert_eq!(ExportKind::Spreadsheet.file_name("12.7X40"), "12.7X40_report.xlsx");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_file_stem("  "), "sprocket");
        assert_eq!(sanitize_file_stem(".."), "sprocket");
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("out.bin.tmp").exists());
    }

    #[test]
    fn test_write_export_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("2024");

        let path = write_export(&nested, ExportKind::Pdf, "12.7X40", b"%PDF-1.7").unwrap();
        assert_eq!(path, nested.join("12.7X40_manufacturing_report.pdf"));
        assert_eq!(fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_write_atomic_missing_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");
        let err = write_atomic(&path, b"x").unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
