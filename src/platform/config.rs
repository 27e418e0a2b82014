// LogWarden - platform/config.rs
//
// Platform path resolution and config.toml loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogWarden configuration and cache data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logwarden/ or
    /// %APPDATA%\LogWarden\).
    pub config_dir: PathBuf,

    /// Enrichment cache directory. The `LOGWARDEN_CACHE_DIR` environment
    /// variable overrides the platform default.
    pub cache_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        let env_cache = std::env::var(constants::CACHE_DIR_ENV)
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let cache_dir =
                env_cache.unwrap_or_else(|| proj_dirs.cache_dir().to_path_buf());

            tracing::debug!(
                config = %config_dir.display(),
                cache = %cache_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                cache_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                cache_dir: env_cache.unwrap_or(fallback),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[detection]` section.
    pub detection: DetectionSection,
    /// `[enrichment]` section.
    pub enrichment: EnrichmentSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[detection]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DetectionSection {
    /// Failed attempts from one address before a brute-force finding.
    pub brute_force_threshold: Option<usize>,
    /// Admin-endpoint hits from one address before an admin-probe finding.
    pub admin_probe_threshold: Option<usize>,
}

/// `[enrichment]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct EnrichmentSection {
    /// Cache time-to-live in seconds.
    pub cache_ttl_seconds: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time. Invalid
/// values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Brute-force rule threshold.
    pub brute_force_threshold: usize,
    /// Admin-probe rule threshold.
    pub admin_probe_threshold: usize,
    /// Enrichment cache TTL in seconds.
    pub cache_ttl_secs: u64,
    /// Logging level string (consumed before tracing is initialised).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brute_force_threshold: constants::BRUTE_FORCE_THRESHOLD,
            admin_probe_threshold: constants::ADMIN_PROBE_THRESHOLD,
            cache_ttl_secs: constants::DEFAULT_CACHE_TTL_SECS,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. If the file does not exist, returns defaults with no warnings
/// (first-run). If the file is unparseable, returns defaults with a warning
/// -- the application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    // Validate each field against named constants, accumulating all warnings.
    let mut config = AppConfig::default();

    // -- Detection: brute_force_threshold --
    if let Some(threshold) = raw.detection.brute_force_threshold {
        if (constants::MIN_RULE_THRESHOLD..=constants::MAX_RULE_THRESHOLD).contains(&threshold)
        {
            config.brute_force_threshold = threshold;
        } else {
            warnings.push(format!(
                "[detection] brute_force_threshold = {threshold} is out of range ({}-{}). Using default ({}).",
                constants::MIN_RULE_THRESHOLD,
                constants::MAX_RULE_THRESHOLD,
                constants::BRUTE_FORCE_THRESHOLD,
            ));
        }
    }

    // -- Detection: admin_probe_threshold --
    if let Some(threshold) = raw.detection.admin_probe_threshold {
        if (constants::MIN_RULE_THRESHOLD..=constants::MAX_RULE_THRESHOLD).contains(&threshold)
        {
            config.admin_probe_threshold = threshold;
        } else {
            warnings.push(format!(
                "[detection] admin_probe_threshold = {threshold} is out of range ({}-{}). Using default ({}).",
                constants::MIN_RULE_THRESHOLD,
                constants::MAX_RULE_THRESHOLD,
                constants::ADMIN_PROBE_THRESHOLD,
            ));
        }
    }

    // -- Enrichment: cache_ttl_seconds --
    if let Some(ttl) = raw.enrichment.cache_ttl_seconds {
        if (constants::MIN_CACHE_TTL_SECS..=constants::MAX_CACHE_TTL_SECS).contains(&ttl) {
            config.cache_ttl_secs = ttl;
        } else {
            warnings.push(format!(
                "[enrichment] cache_ttl_seconds = {ttl} is out of range ({}-{}). Using default ({}).",
                constants::MIN_CACHE_TTL_SECS,
                constants::MAX_CACHE_TTL_SECS,
                constants::DEFAULT_CACHE_TTL_SECS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path, content: &str) {
        std::fs::write(dir.join(constants::CONFIG_FILE_NAME), content).unwrap();
    }

    #[test]
    fn missing_file_yields_defaults_without_warnings() {
        let dir = tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
        assert_eq!(config.brute_force_threshold, constants::BRUTE_FORCE_THRESHOLD);
        assert_eq!(config.cache_ttl_secs, constants::DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn unparseable_file_yields_defaults_with_warning() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "this is [not valid toml");
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.brute_force_threshold, constants::BRUTE_FORCE_THRESHOLD);
    }

    #[test]
    fn valid_values_are_applied() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[detection]
brute_force_threshold = 8
admin_probe_threshold = 2

[enrichment]
cache_ttl_seconds = 600

[logging]
level = "debug"
"#,
        );
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.brute_force_threshold, 8);
        assert_eq!(config.admin_probe_threshold, 2);
        assert_eq!(config.cache_ttl_secs, 600);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn out_of_range_threshold_warns_and_falls_back() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[detection]
brute_force_threshold = 0
"#,
        );
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("brute_force_threshold"));
        assert_eq!(config.brute_force_threshold, constants::BRUTE_FORCE_THRESHOLD);
    }

    #[test]
    fn unknown_log_level_warns_and_falls_back() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[logging]
level = "verbose"
"#,
        );
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[future_section]
mystery = true
"#,
        );
        let (_, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
    }
}
