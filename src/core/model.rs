// LogWarden - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Format tag
// =============================================================================

/// The log formats LogWarden understands.
///
/// A record is only ever created for a recognised format: lines that match
/// no grammar produce no record at all, so `Unknown` never appears on a
/// parsed [`LogRecord`]. It exists as the "none of the above" answer from
/// format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatTag {
    /// Apache-style web access log.
    WebAccess,
    /// sshd authentication log (syslog framing).
    RemoteLogin,
    /// Structured `AUTH SUCCESS|FAILURE` application log.
    StructuredAuth,
    /// No supported grammar matched.
    Unknown,
}

impl FormatTag {
    /// Stable string label used in summaries and reports.
    pub fn label(&self) -> &'static str {
        match self {
            FormatTag::WebAccess => "web-access",
            FormatTag::RemoteLogin => "remote-login",
            FormatTag::StructuredAuth => "structured-auth",
            FormatTag::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Threat severity levels, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Explicit sort rank: CRITICAL=0, HIGH=1, MEDIUM=2, LOW=3.
    ///
    /// All severity ordering goes through this table rather than enum
    /// declaration order, so the ordering survives reordering of variants.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Returns all variants in display order (most severe first).
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
    }

    /// Lowercase label for summaries and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Bracketed tag for the console report.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]",
            Severity::Medium => "[MEDIUM]",
            Severity::Low => "[LOW]",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Log record (normalised output of parsing)
// =============================================================================

/// A single parsed log event, normalised across all formats.
///
/// Source address and raw line are always present; every other field may be
/// absent depending on the format and the line. Records are created once by
/// the parser and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Parsed timestamp in UTC. `None` if the line's timestamp field could
    /// not be parsed (the record is still produced).
    pub timestamp: Option<DateTime<Utc>>,

    /// Source IPv4 address, dotted-quad.
    pub source_ip: String,

    /// The format this record was parsed from. Never `Unknown`.
    pub format: FormatTag,

    /// Original unparsed line, kept verbatim for evidence display.
    pub raw_line: String,

    /// Acting user, where the format carries one (`-` in web logs maps
    /// to `None`).
    pub user: Option<String>,

    /// Format-specific action description (e.g. "GET /index.html",
    /// "ssh_login").
    pub action: Option<String>,

    /// Normalised status: "success"/"failure", or the protocol status code
    /// as a string for web access logs.
    pub status: Option<String>,

    /// Free-form extra detail (request size, originating host, failure
    /// reason).
    pub details: Option<String>,
}

// =============================================================================
// Geolocation context
// =============================================================================

/// Geolocation/organisation context attached to a finding by enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub country: String,
    pub region: String,
    pub city: String,
    pub isp: String,
    pub org: String,
}

impl GeoInfo {
    /// Fallback used for any field the geolocation API did not return.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Fixed marker for private/reserved addresses, which have no meaningful
    /// geolocation and are classified without a network call.
    pub fn private_network() -> Self {
        Self {
            country: "Private Network".to_string(),
            region: Self::UNKNOWN.to_string(),
            city: Self::UNKNOWN.to_string(),
            isp: Self::UNKNOWN.to_string(),
            org: Self::UNKNOWN.to_string(),
        }
    }
}

// =============================================================================
// Finding
// =============================================================================

/// One detected security-relevant condition.
///
/// Created by a detection rule; mutated exactly once, by the enrichment
/// client, to attach geolocation context; otherwise immutable.
#[derive(Debug, Clone)]
pub struct Finding {
    /// Name of the detection rule that fired.
    pub rule_name: &'static str,

    /// Threat severity assigned by the rule.
    pub severity: Severity,

    /// The offending source address.
    pub source_ip: String,

    /// Human-readable description, including counts where relevant.
    pub description: String,

    /// The records that triggered the finding, in encounter order, capped at
    /// `MAX_EVIDENCE_RECORDS`. Never empty for a rule-triggered finding.
    pub evidence: Vec<LogRecord>,

    /// Geolocation context. Absent until enrichment runs (and stays absent
    /// when the address cannot be resolved).
    pub geo: Option<GeoInfo>,
}

// =============================================================================
// Severity summary
// =============================================================================

/// Finding counts per severity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeveritySummary {
    /// Tally findings by severity.
    pub fn tally(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }
}

// =============================================================================
// Analysis report
// =============================================================================

/// Aggregate result of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Total records parsed from the input.
    pub total_records: usize,

    /// All findings, ordered by severity rank (stable within rank).
    pub findings: Vec<Finding>,

    /// Finding counts per severity.
    pub summary: SeveritySummary,

    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// Source summary (output of the summary operation)
// =============================================================================

/// Quick statistics about a parsed log file, without running detections.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    /// Total records parsed.
    pub record_count: usize,

    /// Records per format tag, in first-seen order.
    pub counts_by_format: Vec<(FormatTag, usize)>,

    /// Number of distinct source addresses.
    pub unique_sources: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_table() {
        assert_eq!(Severity::Critical.rank(), 0);
        assert_eq!(Severity::High.rank(), 1);
        assert_eq!(Severity::Medium.rank(), 2);
        assert_eq!(Severity::Low.rank(), 3);
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Critical.label(), "critical");
        assert_eq!(Severity::Low.to_string(), "low");
        assert_eq!(Severity::High.tag(), "[HIGH]");
    }

    #[test]
    fn format_labels() {
        assert_eq!(FormatTag::WebAccess.label(), "web-access");
        assert_eq!(FormatTag::RemoteLogin.label(), "remote-login");
        assert_eq!(FormatTag::StructuredAuth.label(), "structured-auth");
        assert_eq!(FormatTag::Unknown.label(), "unknown");
    }

    #[test]
    fn geo_private_marker() {
        let geo = GeoInfo::private_network();
        assert_eq!(geo.country, "Private Network");
        assert_eq!(geo.city, GeoInfo::UNKNOWN);
    }

    #[test]
    fn severity_summary_tally() {
        let finding = |severity| Finding {
            rule_name: "test",
            severity,
            source_ip: "1.2.3.4".to_string(),
            description: String::new(),
            evidence: Vec::new(),
            geo: None,
        };
        let findings = vec![
            finding(Severity::Critical),
            finding(Severity::High),
            finding(Severity::High),
            finding(Severity::Low),
        ];
        let summary = SeveritySummary::tally(&findings);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
    }
}
