// LogWarden - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Only two conditions are allowed to abort an operation: a missing/unreadable
// input file and a failure writing the JSON report. Everything arising from
// per-line parsing, caching, or enrichment degrades locally and never
// appears here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogWarden operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogWardenError {
    /// Input file validation or reading failed.
    Input(InputError),

    /// Report serialisation or writing failed.
    Report(ReportError),
}

impl fmt::Display for LogWardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "Input error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
        }
    }
}

impl std::error::Error for LogWardenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Report(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors related to the input log file.
#[derive(Debug)]
pub enum InputError {
    /// The input path does not exist.
    NotFound { path: PathBuf },

    /// The input path exists but is not a regular file.
    NotAFile { path: PathBuf },

    /// I/O error opening the input file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Log file not found: '{}'", path.display())
            }
            Self::NotAFile { path } => {
                write!(f, "Not a file: '{}'", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot open '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<InputError> for LogWardenError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to writing the JSON report.
#[derive(Debug)]
pub enum ReportError {
    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// I/O error writing the report file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { path, source } => {
                write!(f, "JSON report error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Report I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ReportError> for LogWardenError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

/// Convenience type alias for LogWarden results.
pub type Result<T> = std::result::Result<T, LogWardenError>;
