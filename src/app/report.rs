// LogWarden - app/report.rs
//
// Report rendering: human-readable console output and the persisted JSON
// document. Evidence is summarised by count in the JSON form -- raw lines
// appear only in the console preview.

use crate::core::model::{AnalysisReport, Finding, GeoInfo, SeveritySummary, SourceSummary};
use crate::util::constants;
use crate::util::error::{ReportError, Result};
use serde::Serialize;
use std::path::Path;

// =============================================================================
// JSON document
// =============================================================================

/// Persisted report shape.
#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    total_entries_analyzed: usize,
    summary: &'a SeveritySummary,
    findings: Vec<FindingDocument<'a>>,
}

/// One finding in the persisted report. Evidence records are not embedded
/// verbatim; only their count is carried.
#[derive(Debug, Serialize)]
struct FindingDocument<'a> {
    rule_name: &'a str,
    severity: &'a str,
    source_ip: &'a str,
    description: &'a str,
    evidence_count: usize,
    geo_info: Option<&'a GeoInfo>,
}

fn build_document(report: &AnalysisReport) -> ReportDocument<'_> {
    ReportDocument {
        generated_at: report.generated_at.to_rfc3339(),
        total_entries_analyzed: report.total_records,
        summary: &report.summary,
        findings: report
            .findings
            .iter()
            .map(|finding| FindingDocument {
                rule_name: finding.rule_name,
                severity: finding.severity.label(),
                source_ip: &finding.source_ip,
                description: &finding.description,
                evidence_count: finding.evidence.len(),
                geo_info: finding.geo.as_ref(),
            })
            .collect(),
    }
}

/// Write the analysis report as a JSON document.
pub fn save_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let document = build_document(report);
    let text = serde_json::to_string_pretty(&document).map_err(|e| ReportError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, text).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "JSON report written");
    Ok(())
}

// =============================================================================
// Console rendering
// =============================================================================

/// Print findings in a readable console format.
pub fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        println!("\n[OK] No security threats detected!");
        return;
    }

    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("SECURITY ANALYSIS REPORT");
    println!("{rule}");
    println!("Total Findings: {}", findings.len());
    println!("{}", "-".repeat(60));

    for (index, finding) in findings.iter().enumerate() {
        println!(
            "\n{} Finding #{}: {}",
            finding.severity.tag(),
            index + 1,
            finding.rule_name.to_uppercase()
        );
        println!("   Source IP: {}", finding.source_ip);
        println!("   Description: {}", finding.description);

        if let Some(geo) = &finding.geo {
            println!("   Location: {}, {} ({})", geo.city, geo.country, geo.isp);
        }

        if !finding.evidence.is_empty() {
            println!("   Evidence ({} entries):", finding.evidence.len());
            for record in finding.evidence.iter().take(constants::REPORT_EVIDENCE_LINES) {
                let mut line = record.raw_line.clone();
                if line.len() > constants::REPORT_LINE_PREVIEW {
                    line.truncate(constants::REPORT_LINE_PREVIEW);
                    line.push_str("...");
                }
                println!("      - {line}");
            }
        }
    }

    println!("\n{rule}");
}

/// Print quick statistics about a parsed file.
pub fn print_summary(summary: &SourceSummary) {
    let rule = "=".repeat(40);
    println!("\n{rule}");
    println!("LOG FILE SUMMARY");
    println!("{rule}");
    println!("Total Entries: {}", summary.record_count);

    println!("\nBy Log Format:");
    let mut counts = summary.counts_by_format.clone();
    counts.sort_by_key(|(tag, _)| tag.label());
    for (tag, count) in counts {
        println!("  {tag}: {count}");
    }

    println!("\nUnique IPs: {}", summary.unique_sources);
    println!("{rule}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_report() -> AnalysisReport {
        let finding = Finding {
            rule_name: "sql_injection",
            severity: Severity::Critical,
            source_ip: "203.0.113.50".to_string(),
            description: "SQL injection attempt detected from 203.0.113.50 (2 suspicious requests)"
                .to_string(),
            evidence: vec![
                crate::core::parser::parse_line(
                    r#"203.0.113.50 - - [25/Dec/2024:10:17:00 +0000] "GET /q?id=1;DROP TABLE users HTTP/1.1" 500 0"#,
                    None,
                )
                .unwrap(),
            ],
            geo: Some(GeoInfo {
                country: "Testland".to_string(),
                region: "Region".to_string(),
                city: "City".to_string(),
                isp: "ISP".to_string(),
                org: "ORG".to_string(),
            }),
        };
        AnalysisReport {
            total_records: 10,
            summary: SeveritySummary::tally(std::slice::from_ref(&finding)),
            findings: vec![finding],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn document_carries_evidence_by_count_only() {
        let report = sample_report();
        let value = serde_json::to_value(build_document(&report)).unwrap();

        assert_eq!(value["total_entries_analyzed"], 10);
        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["summary"]["high"], 0);

        let finding = &value["findings"][0];
        assert_eq!(finding["rule_name"], "sql_injection");
        assert_eq!(finding["severity"], "critical");
        assert_eq!(finding["source_ip"], "203.0.113.50");
        assert_eq!(finding["evidence_count"], 1);
        assert_eq!(finding["geo_info"]["country"], "Testland");
        assert!(
            finding.get("evidence").is_none(),
            "evidence records must not be embedded"
        );
    }

    #[test]
    fn generated_at_is_iso8601() {
        let report = sample_report();
        let value = serde_json::to_value(build_document(&report)).unwrap();
        let stamp = value["generated_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn save_json_writes_parseable_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        save_json(&sample_report(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["findings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn save_json_into_missing_directory_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("report.json");
        let result = save_json(&sample_report(), &path);
        assert!(result.is_err());
    }
}
