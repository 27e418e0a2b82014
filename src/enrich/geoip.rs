// LogWarden - enrich/geoip.rs
//
// Best-effort geolocation enrichment for findings.
//
// Lookups consult the disk cache first, classify private/reserved addresses
// without touching the network, and otherwise perform one short-timeout HTTP
// GET against the geolocation API. Every failure -- network, HTTP status,
// decode, cache -- degrades to "no information"; enrichment can never abort
// an analysis run.

use crate::core::model::{Finding, GeoInfo};
use crate::enrich::cache::FileCache;
use crate::util::constants;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Whether `ip` falls in a private/loopback range: 10.0.0.0/8,
/// 172.16.0.0/12, 192.168.0.0/16, or 127.0.0.0/8.
///
/// Classification requires a dotted quad and parses only the first two
/// components; malformed input classifies as not-private rather than
/// failing.
pub fn is_private_address(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    let first: u32 = match parts[0].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };
    let second: u32 = match parts[1].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };

    match first {
        10 | 127 => true,
        172 => (16..=31).contains(&second),
        192 => second == 168,
        _ => false,
    }
}

/// Wire shape of the geolocation API response. All fields optional; absent
/// ones fall back to "Unknown".
#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    status: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    isp: Option<String>,
    org: Option<String>,
}

/// Geolocation lookup client over a [`FileCache`].
pub struct GeoClient {
    cache: FileCache,
    cache_ttl: Duration,
    timeout: Duration,
}

impl GeoClient {
    /// Create a client with the default cache TTL and lookup timeout.
    pub fn new(cache: FileCache) -> Self {
        Self {
            cache,
            cache_ttl: Duration::from_secs(constants::DEFAULT_CACHE_TTL_SECS),
            timeout: Duration::from_secs(constants::LOOKUP_TIMEOUT_SECS),
        }
    }

    /// Override the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn cache_key(ip: &str) -> String {
        format!("geo:{ip}")
    }

    /// Resolve geolocation/organisation context for one address.
    ///
    /// Order of resolution:
    /// 1. cache (when `use_cache`),
    /// 2. private-range classification -- returns the fixed marker without a
    ///    network call and without caching it (free to recompute),
    /// 3. one HTTP GET with a fixed short timeout, cached on success.
    ///
    /// Returns `None` for every failure mode.
    pub fn lookup(&self, ip: &str, use_cache: bool) -> Option<GeoInfo> {
        let key = Self::cache_key(ip);

        if use_cache {
            if let Some(info) = self.cache.get::<GeoInfo>(&key, self.cache_ttl) {
                tracing::debug!(ip, "Geolocation cache hit");
                return Some(info);
            }
        }

        if is_private_address(ip) {
            return Some(GeoInfo::private_network());
        }

        let info = self.fetch(ip)?;
        if use_cache {
            self.cache.set(&key, &info);
        }
        Some(info)
    }

    /// One blocking GET against the geolocation API.
    fn fetch(&self, ip: &str) -> Option<GeoInfo> {
        let url = format!(
            "{}/{}?fields={}",
            constants::GEO_API_BASE,
            ip,
            constants::GEO_API_FIELDS
        );

        let response = match ureq::get(&url).timeout(self.timeout).call() {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(ip, error = %e, "Geolocation request failed");
                return None;
            }
        };

        let data: GeoApiResponse = match response.into_json() {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(ip, error = %e, "Geolocation response not decodable");
                return None;
            }
        };

        if data.status.as_deref() != Some("success") {
            tracing::debug!(ip, status = ?data.status, "Geolocation lookup unsuccessful");
            return None;
        }

        let unknown = || GeoInfo::UNKNOWN.to_string();
        Some(GeoInfo {
            country: data.country.unwrap_or_else(unknown),
            region: data.region_name.unwrap_or_else(unknown),
            city: data.city.unwrap_or_else(unknown),
            isp: data.isp.unwrap_or_else(unknown),
            org: data.org.unwrap_or_else(unknown),
        })
    }

    /// Attach geolocation context to every finding whose address resolves.
    ///
    /// Distinct addresses are resolved exactly once each (bounding network
    /// calls), fanned out over the rayon pool. Each address writes only its
    /// own cache key, so concurrent lookups never race on the same file.
    /// Findings whose address cannot be resolved are left without context.
    pub fn enrich_all(&self, findings: &mut [Finding]) {
        let addresses: HashSet<String> = findings
            .iter()
            .map(|finding| finding.source_ip.clone())
            .collect();
        let addresses: Vec<String> = addresses.into_iter().collect();

        tracing::debug!(addresses = addresses.len(), "Enriching findings");

        let resolved: HashMap<String, GeoInfo> = addresses
            .par_iter()
            .filter_map(|ip| self.lookup(ip, true).map(|info| (ip.clone(), info)))
            .collect();

        for finding in findings.iter_mut() {
            if let Some(info) = resolved.get(&finding.source_ip) {
                finding.geo = Some(info.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;
    use tempfile::tempdir;

    fn sample_geo() -> GeoInfo {
        GeoInfo {
            country: "Testland".to_string(),
            region: "Region".to_string(),
            city: "City".to_string(),
            isp: "ISP".to_string(),
            org: "ORG".to_string(),
        }
    }

    fn finding(ip: &str) -> Finding {
        Finding {
            rule_name: "brute_force",
            severity: Severity::High,
            source_ip: ip.to_string(),
            description: format!("test finding for {ip}"),
            evidence: Vec::new(),
            geo: None,
        }
    }

    // -------------------------------------------------------------------------
    // Private-range classification
    // -------------------------------------------------------------------------

    #[test]
    fn private_ranges_classify_true() {
        assert!(is_private_address("10.0.0.1"));
        assert!(is_private_address("192.168.1.2"));
        assert!(is_private_address("172.16.0.5"));
        assert!(is_private_address("172.31.255.254"));
        assert!(is_private_address("127.0.0.1"));
    }

    #[test]
    fn public_addresses_classify_false() {
        assert!(!is_private_address("8.8.8.8"));
        assert!(!is_private_address("203.0.113.50"));
        assert!(!is_private_address("172.15.0.1"), "below the /12 block");
        assert!(!is_private_address("172.32.0.1"), "above the /12 block");
        assert!(!is_private_address("192.169.0.1"));
    }

    #[test]
    fn malformed_input_classifies_not_private() {
        assert!(!is_private_address(""));
        assert!(!is_private_address("not.an.ip.x"));
        assert!(!is_private_address("10"));
        assert!(!is_private_address("10.0.0"), "not a dotted quad");
        assert!(!is_private_address("300.168.0.1"));
        assert!(!is_private_address("10.x.0.1"));
    }

    // -------------------------------------------------------------------------
    // Lookup (offline paths only; no test touches the network)
    // -------------------------------------------------------------------------

    #[test]
    fn lookup_private_returns_marker_without_caching() {
        let dir = tempdir().unwrap();
        let client = GeoClient::new(FileCache::at(dir.path().to_path_buf()));

        let info = client.lookup("192.168.1.2", true).expect("marker expected");
        assert_eq!(info.country, "Private Network");

        // Private results are free to recompute and are never cached.
        assert_eq!(
            std::fs::read_dir(dir.path()).unwrap().count(),
            0,
            "no cache file should be written for a private address"
        );
    }

    #[test]
    fn lookup_returns_cached_value_before_any_network_call() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());
        assert!(cache.set("geo:8.8.8.8", &sample_geo()));

        let client = GeoClient::new(cache);
        let info = client.lookup("8.8.8.8", true).expect("cache hit expected");
        assert_eq!(info, sample_geo());
    }

    #[test]
    fn lookup_ignores_cache_when_disabled_for_private() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());
        assert!(cache.set("geo:10.0.0.1", &sample_geo()));

        // use_cache = false skips the seeded entry; the private classifier
        // answers instead.
        let client = GeoClient::new(cache);
        let info = client.lookup("10.0.0.1", false).expect("marker expected");
        assert_eq!(info.country, "Private Network");
    }

    // -------------------------------------------------------------------------
    // enrich_all
    // -------------------------------------------------------------------------

    #[test]
    fn enrich_all_attaches_to_every_finding_sharing_an_address() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());
        assert!(cache.set("geo:198.51.100.7", &sample_geo()));

        let client = GeoClient::new(cache);
        let mut findings = vec![
            finding("198.51.100.7"),
            finding("10.0.0.1"),
            finding("198.51.100.7"),
        ];
        client.enrich_all(&mut findings);

        assert_eq!(findings[0].geo.as_ref().unwrap(), &sample_geo());
        assert_eq!(findings[2].geo.as_ref().unwrap(), &sample_geo());
        assert_eq!(
            findings[1].geo.as_ref().unwrap().country,
            "Private Network"
        );
    }

    #[test]
    fn enrich_all_with_no_findings_is_a_no_op() {
        let dir = tempdir().unwrap();
        let client = GeoClient::new(FileCache::at(dir.path().to_path_buf()));
        let mut findings: Vec<Finding> = Vec::new();
        client.enrich_all(&mut findings);
        assert!(findings.is_empty());
    }
}
