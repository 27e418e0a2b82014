// LogWarden - app/analyze.rs
//
// Orchestration for the two analysis operations. This layer owns file I/O
// and wires core parsing, detection, and enrichment together; the core
// layer itself never opens files.

use crate::core::detect::{self, DetectionParams};
use crate::core::model::{AnalysisReport, FormatTag, LogRecord, SeveritySummary, SourceSummary};
use crate::core::parser::Records;
use crate::enrich::cache::FileCache;
use crate::enrich::geoip::GeoClient;
use crate::platform::config::PlatformPaths;
use crate::util::constants;
use crate::util::error::{InputError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Attach geolocation context to findings.
    pub enrich: bool,

    /// Rule thresholds.
    pub detection: DetectionParams,

    /// Enrichment cache directory override. `None` resolves the platform
    /// default (honouring the `LOGWARDEN_CACHE_DIR` environment variable).
    pub cache_dir: Option<PathBuf>,

    /// Enrichment cache time-to-live.
    pub cache_ttl: Duration,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            enrich: false,
            detection: DetectionParams::default(),
            cache_dir: None,
            cache_ttl: Duration::from_secs(constants::DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Validate the input path and open it for reading.
///
/// A missing path is the distinct "not found" condition the CLI maps to its
/// exit code; everything downstream of this check degrades instead of
/// erroring.
fn open_input(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    if !path.is_file() {
        return Err(InputError::NotAFile {
            path: path.to_path_buf(),
        }
        .into());
    }
    File::open(path).map_err(|e| {
        InputError::Io {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

/// Analyse a log file: parse, run every detection rule, optionally enrich,
/// and assemble the report.
pub fn analyze(input: &Path, options: &AnalyzeOptions) -> Result<AnalysisReport> {
    let file = open_input(input)?;

    let records: Vec<LogRecord> = Records::new(BufReader::new(file)).collect();
    tracing::info!(
        path = %input.display(),
        records = records.len(),
        "Input parsed"
    );

    let mut findings = detect::run_all_with(&records, &options.detection);
    tracing::info!(findings = findings.len(), "Detection complete");

    if options.enrich && !findings.is_empty() {
        let cache_dir = options
            .cache_dir
            .clone()
            .unwrap_or_else(|| PlatformPaths::resolve().cache_dir);
        let client = GeoClient::new(FileCache::at(cache_dir)).with_cache_ttl(options.cache_ttl);
        client.enrich_all(&mut findings);
    }

    let summary = SeveritySummary::tally(&findings);
    Ok(AnalysisReport {
        total_records: records.len(),
        findings,
        summary,
        generated_at: Utc::now(),
    })
}

/// Quick statistics for a log file, without running detections.
pub fn summarize(input: &Path) -> Result<SourceSummary> {
    let file = open_input(input)?;

    let mut record_count = 0;
    let mut counts_by_format: Vec<(FormatTag, usize)> = Vec::new();
    let mut unique_sources: HashSet<String> = HashSet::new();

    for record in Records::new(BufReader::new(file)) {
        record_count += 1;
        match counts_by_format
            .iter_mut()
            .find(|(tag, _)| *tag == record.format)
        {
            Some((_, count)) => *count += 1,
            None => counts_by_format.push((record.format, 1)),
        }
        unique_sources.insert(record.source_ip);
    }

    Ok(SourceSummary {
        record_count,
        counts_by_format,
        unique_sources: unique_sources.len(),
    })
}
