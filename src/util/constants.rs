// LogWarden - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogWarden";

/// Application identifier used for config/cache directories.
pub const APP_ID: &str = "LogWarden";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Detection defaults and limits
// =============================================================================

/// Default number of authentication failures from one address before a
/// brute-force finding is raised.
pub const BRUTE_FORCE_THRESHOLD: usize = 5;

/// Default number of admin-endpoint hits from one address before an
/// admin-probe finding is raised.
pub const ADMIN_PROBE_THRESHOLD: usize = 3;

/// Maximum number of evidence records attached to a single finding.
/// Keeps memory and report size predictable regardless of input volume.
pub const MAX_EVIDENCE_RECORDS: usize = 10;

/// Minimum user-configurable rule threshold (a threshold of 0 would fire
/// a finding for every address that appears at all).
pub const MIN_RULE_THRESHOLD: usize = 1;

/// Maximum user-configurable rule threshold (prevents configuration
/// mistakes that silently disable a rule).
pub const MAX_RULE_THRESHOLD: usize = 10_000;

// =============================================================================
// Enrichment
// =============================================================================

/// Geolocation API endpoint base. The address under query is appended as the
/// final path segment.
pub const GEO_API_BASE: &str = "http://ip-api.com/json";

/// Field list requested from the geolocation API.
pub const GEO_API_FIELDS: &str = "status,country,regionName,city,isp,org";

/// Timeout for a single geolocation lookup, in seconds.
pub const LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Default time-to-live for cached enrichment results, in seconds (24 h).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Minimum user-configurable cache TTL in seconds (0 = never reuse).
pub const MIN_CACHE_TTL_SECS: u64 = 0;

/// Maximum user-configurable cache TTL in seconds (30 days).
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 86_400;

/// Environment variable overriding the enrichment cache directory.
pub const CACHE_DIR_ENV: &str = "LOGWARDEN_CACHE_DIR";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

// =============================================================================
// Report rendering
// =============================================================================

/// Maximum evidence lines printed per finding in the console report.
pub const REPORT_EVIDENCE_LINES: usize = 3;

/// Maximum length of a raw evidence line in the console report before
/// truncation with an ellipsis.
pub const REPORT_LINE_PREVIEW: usize = 90;
