//! Report directory persistence: write/read/verify a [`SuiteReport`] on disk.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   report.json          canonical JSON of the suite report
//!   report_digest.txt    ASCII digest string (e.g. "sha256:...")
//! ```
//!
//! The directory path is never part of the hash surface.
//!
//! # Fail-closed semantics
//!
//! - Missing report or digest file → error
//! - Extra files → error (subdirectories and `.tmp_*` leftovers of an
//!   interrupted write are ignored)
//! - Non-canonical report bytes → error
//! - Digest mismatch → error

use std::path::Path;

use checkpoint_kernel::proof::canon::canonical_json_bytes;
use checkpoint_kernel::proof::hash::{canonical_hash, ContentHash, DOMAIN_SUITE_REPORT};

use crate::report::SuiteReport;

const REPORT_FILENAME: &str = "report.json";
const DIGEST_FILENAME: &str = "report_digest.txt";

/// Error writing a report directory.
#[derive(Debug)]
pub enum ReportDirWriteError {
    /// I/O error during write.
    Io { detail: String },
    /// Canonical JSON serialization failed.
    CanonError { detail: String },
}

impl std::fmt::Display for ReportDirWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for ReportDirWriteError {}

/// Error reading a report directory.
#[derive(Debug)]
pub enum ReportDirReadError {
    /// I/O error during read.
    Io { detail: String },
    /// A required file is missing.
    MissingFile { filename: String },
    /// A file not in the layout is present.
    ExtraFile { filename: String },
    /// `report.json` is not valid JSON.
    InvalidJson { detail: String },
    /// `report.json` is valid JSON but not in canonical form.
    NonCanonical,
    /// `report_digest.txt` does not hold a parseable digest.
    InvalidDigest { content: String },
    /// Recomputed digest differs from the stored one.
    DigestMismatch {
        declared: ContentHash,
        computed: ContentHash,
    },
}

impl std::fmt::Display for ReportDirReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingFile { filename } => write!(f, "missing file: {filename}"),
            Self::ExtraFile { filename } => write!(f, "unexpected file: {filename}"),
            Self::InvalidJson { detail } => write!(f, "invalid report JSON: {detail}"),
            Self::NonCanonical => write!(f, "report JSON is not canonical"),
            Self::InvalidDigest { content } => write!(f, "invalid digest: {content:?}"),
            Self::DigestMismatch { declared, computed } => write!(
                f,
                "digest mismatch: declared={}, computed={}",
                declared.as_str(),
                computed.as_str()
            ),
        }
    }
}

impl std::error::Error for ReportDirReadError {}

/// A report loaded back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    /// Parsed report JSON.
    pub report: serde_json::Value,
    /// The exact canonical bytes on disk.
    pub canonical_bytes: Vec<u8>,
    /// Verified digest.
    pub digest: ContentHash,
}

/// Write `report` into `dir`, creating it if needed.
///
/// Files are written to a temp name and renamed into place.
///
/// # Errors
///
/// Returns [`ReportDirWriteError`] on I/O or canonicalization failure.
pub fn write_report_dir(
    report: &SuiteReport,
    dir: &Path,
) -> Result<ContentHash, ReportDirWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| ReportDirWriteError::Io {
        detail: format!("create {}: {e}", dir.display()),
    })?;

    let bytes = report
        .to_canonical_json()
        .map_err(|e| ReportDirWriteError::CanonError {
            detail: e.to_string(),
        })?;
    let digest = canonical_hash(DOMAIN_SUITE_REPORT, &bytes);

    write_atomic(dir.join(REPORT_FILENAME), &bytes)?;
    write_atomic(dir.join(DIGEST_FILENAME), digest.as_str().as_bytes())?;

    tracing::info!(dir = %dir.display(), digest = digest.as_str(), "report written");
    Ok(digest)
}

/// Read and verify a report directory.
///
/// # Errors
///
/// Returns [`ReportDirReadError`] if the layout, canonical form, or digest
/// does not check out.
pub fn read_report_dir(dir: &Path) -> Result<StoredReport, ReportDirReadError> {
    for filename in list_files(dir)? {
        if filename != REPORT_FILENAME && filename != DIGEST_FILENAME {
            return Err(ReportDirReadError::ExtraFile { filename });
        }
    }

    let bytes = read_required(dir, REPORT_FILENAME)?;
    let digest_raw = read_required(dir, DIGEST_FILENAME)?;

    let report: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| ReportDirReadError::InvalidJson {
            detail: e.to_string(),
        })?;
    let recanonical =
        canonical_json_bytes(&report).map_err(|e| ReportDirReadError::InvalidJson {
            detail: e.to_string(),
        })?;
    if recanonical != bytes {
        return Err(ReportDirReadError::NonCanonical);
    }

    let digest_text = String::from_utf8_lossy(&digest_raw).trim().to_string();
    let declared =
        ContentHash::parse(&digest_text).ok_or(ReportDirReadError::InvalidDigest {
            content: digest_text,
        })?;
    let computed = canonical_hash(DOMAIN_SUITE_REPORT, &bytes);
    if declared != computed {
        return Err(ReportDirReadError::DigestMismatch { declared, computed });
    }

    Ok(StoredReport {
        report,
        canonical_bytes: bytes,
        digest: computed,
    })
}

/// Verify a report directory without keeping its contents.
///
/// # Errors
///
/// Same as [`read_report_dir`].
pub fn verify_report_dir(dir: &Path) -> Result<ContentHash, ReportDirReadError> {
    read_report_dir(dir).map(|stored| stored.digest)
}

fn write_atomic(path: impl AsRef<Path>, content: &[u8]) -> Result<(), ReportDirWriteError> {
    let path = path.as_ref();
    let dir = path.parent().ok_or_else(|| ReportDirWriteError::Io {
        detail: "no parent directory".into(),
    })?;

    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dir.join(temp_name);

    std::fs::write(&temp_path, content).map_err(|e| ReportDirWriteError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| ReportDirWriteError::Io {
        detail: format!("rename {} → {}: {e}", temp_path.display(), path.display()),
    })?;
    Ok(())
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, ReportDirReadError> {
    std::fs::read(dir.join(filename)).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReportDirReadError::MissingFile {
                filename: filename.to_string(),
            }
        } else {
            ReportDirReadError::Io {
                detail: format!("read {filename}: {e}"),
            }
        }
    })
}

/// Regular files in `dir`, sorted. Subdirectories and leftover
/// `write_atomic` temp files are not listed.
fn list_files(dir: &Path) -> Result<Vec<String>, ReportDirReadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ReportDirReadError::Io {
        detail: format!("read_dir {}: {e}", dir.display()),
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportDirReadError::Io {
            detail: e.to_string(),
        })?;
        let file_type = entry.file_type().map_err(|e| ReportDirReadError::Io {
            detail: format!("file_type: {e}"),
        })?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(".tmp_") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
