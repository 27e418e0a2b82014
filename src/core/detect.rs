// LogWarden - core/detect.rs
//
// Rule-based threat detection over parsed log records.
// Core layer: pure logic, no I/O or platform dependencies.
//
// Every rule is a pure function from a record slice to zero or more
// findings. Rules never mutate records and never interact with each other;
// the same record may appear as evidence under several rules, but within a
// single rule each record belongs to at most one (per-address) group. The
// coordinator runs the rules in a fixed order and stable-sorts the combined
// result by severity rank.

use crate::core::model::{Finding, FormatTag, LogRecord, Severity};
use crate::util::constants;
use std::collections::HashMap;

// =============================================================================
// Signature tables
// =============================================================================

/// SQL injection indicators, matched as case-sensitive substrings against
/// the request action plus the raw line. Upper- and lowercase variants are
/// listed explicitly.
const SQL_SIGNATURES: &[&str] = &[
    "' OR '",
    "' or '",
    "1=1",
    "1 = 1",
    "DROP TABLE",
    "drop table",
    "UNION SELECT",
    "union select",
    "--",
    ";--",
    "/*",
    "*/",
    "@@version",
    "SLEEP(",
    "sleep(",
    "BENCHMARK(",
];

/// Directory traversal indicators, matched against the lowercased action.
const TRAVERSAL_SIGNATURES: &[&str] = &["../", "..\\", "%2e%2e/", "%2e%2e%2f"];

/// Commonly probed administrative endpoints, matched against the lowercased
/// action.
const ADMIN_ENDPOINTS: &[&str] = &[
    "/admin",
    "/wp-admin",
    "/administrator",
    "/phpmyadmin",
    "/manager",
    "/console",
    "/.env",
    "/config",
];

// =============================================================================
// Grouping
// =============================================================================

/// Group records by source address, preserving first-seen address order and
/// the original record order within each group. Deterministic iteration
/// order is what keeps the coordinator's stable sort reproducible.
fn group_by_source<'a>(
    records: impl Iterator<Item = &'a LogRecord>,
) -> Vec<(String, Vec<&'a LogRecord>)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a LogRecord>)> = Vec::new();

    for record in records {
        match index.get(record.source_ip.as_str()) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                index.insert(record.source_ip.as_str(), groups.len());
                groups.push((record.source_ip.clone(), vec![record]));
            }
        }
    }
    groups
}

/// Clone the first `MAX_EVIDENCE_RECORDS` group members as finding evidence.
fn take_evidence(group: &[&LogRecord]) -> Vec<LogRecord> {
    group
        .iter()
        .take(constants::MAX_EVIDENCE_RECORDS)
        .map(|record| (*record).clone())
        .collect()
}

/// Whether a record represents a failed authentication attempt.
///
/// Login-style formats normalise to "failure"; web access logs carry the
/// protocol status code, where 401/403 count as auth failures.
fn is_auth_failure(record: &LogRecord) -> bool {
    match record.status.as_deref() {
        Some("failure") => true,
        Some(code) => {
            record.format == FormatTag::WebAccess && (code == "401" || code == "403")
        }
        None => false,
    }
}

// =============================================================================
// Detection rules
// =============================================================================

/// Repeated authentication failures from a single address.
///
/// One HIGH finding per address with at least `threshold` failures.
pub fn detect_brute_force(records: &[LogRecord], threshold: usize) -> Vec<Finding> {
    group_by_source(records.iter().filter(|r| is_auth_failure(r)))
        .into_iter()
        .filter(|(_, group)| group.len() >= threshold)
        .map(|(ip, group)| {
            let description = format!(
                "Possible brute force: {} failed attempts from {ip}",
                group.len()
            );
            Finding {
                rule_name: "brute_force",
                severity: Severity::High,
                source_ip: ip,
                description,
                evidence: take_evidence(&group),
                geo: None,
            }
        })
        .collect()
}

/// SQL injection indicators in web request lines.
///
/// One CRITICAL finding per address with at least one suspicious request.
pub fn detect_sql_injection(records: &[LogRecord]) -> Vec<Finding> {
    let suspicious = records.iter().filter(|r| {
        if r.format != FormatTag::WebAccess {
            return false;
        }
        let haystack = format!("{} {}", r.action.as_deref().unwrap_or(""), r.raw_line);
        SQL_SIGNATURES.iter().any(|sig| haystack.contains(sig))
    });

    group_by_source(suspicious)
        .into_iter()
        .map(|(ip, group)| {
            let description = format!(
                "SQL injection attempt detected from {ip} ({} suspicious requests)",
                group.len()
            );
            Finding {
                rule_name: "sql_injection",
                severity: Severity::Critical,
                source_ip: ip,
                description,
                evidence: take_evidence(&group),
                geo: None,
            }
        })
        .collect()
}

/// Directory traversal indicators in request paths.
///
/// One HIGH finding per address.
pub fn detect_directory_traversal(records: &[LogRecord]) -> Vec<Finding> {
    let suspicious = records.iter().filter(|r| match &r.action {
        Some(action) => {
            let action = action.to_lowercase();
            TRAVERSAL_SIGNATURES.iter().any(|sig| action.contains(sig))
        }
        None => false,
    });

    group_by_source(suspicious)
        .into_iter()
        .map(|(ip, group)| {
            let description = format!("Directory traversal attempt from {ip}");
            Finding {
                rule_name: "directory_traversal",
                severity: Severity::High,
                source_ip: ip,
                description,
                evidence: take_evidence(&group),
                geo: None,
            }
        })
        .collect()
}

/// Repeated access to common administrative endpoints.
///
/// One MEDIUM finding per address with at least `threshold` hits.
pub fn detect_admin_probe(records: &[LogRecord], threshold: usize) -> Vec<Finding> {
    let suspicious = records.iter().filter(|r| match &r.action {
        Some(action) => {
            let action = action.to_lowercase();
            ADMIN_ENDPOINTS.iter().any(|path| action.contains(path))
        }
        None => false,
    });

    group_by_source(suspicious)
        .into_iter()
        .filter(|(_, group)| group.len() >= threshold)
        .map(|(ip, group)| {
            let description =
                format!("Admin page probing from {ip} ({} requests)", group.len());
            Finding {
                rule_name: "admin_probe",
                severity: Severity::Medium,
                source_ip: ip,
                description,
                evidence: take_evidence(&group),
                geo: None,
            }
        })
        .collect()
}

// =============================================================================
// Coordinator
// =============================================================================

/// Rule thresholds for one analysis run. Defaults reproduce the reference
/// behaviour; config can override them.
#[derive(Debug, Clone, Copy)]
pub struct DetectionParams {
    pub brute_force_threshold: usize,
    pub admin_probe_threshold: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            brute_force_threshold: constants::BRUTE_FORCE_THRESHOLD,
            admin_probe_threshold: constants::ADMIN_PROBE_THRESHOLD,
        }
    }
}

/// Run every detection rule with default thresholds.
pub fn run_all(records: &[LogRecord]) -> Vec<Finding> {
    run_all_with(records, &DetectionParams::default())
}

/// Run every detection rule in fixed order (brute_force, sql_injection,
/// directory_traversal, admin_probe), then stable-sort the combined findings
/// by severity rank. Within equal severity, rule order and per-rule
/// first-seen address order are preserved.
pub fn run_all_with(records: &[LogRecord], params: &DetectionParams) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(detect_brute_force(records, params.brute_force_threshold));
    findings.extend(detect_sql_injection(records));
    findings.extend(detect_directory_traversal(records));
    findings.extend(detect_admin_probe(records, params.admin_probe_threshold));

    findings.sort_by_key(|finding| finding.severity.rank());

    tracing::debug!(
        records = records.len(),
        findings = findings.len(),
        "Detection pass complete"
    );
    findings
}
