//! Collector configuration read from the Lambda environment

use std::path::PathBuf;
use support_insights_common::defaults::{
    HEALTH_API_REGION, HEALTH_REGION_ENV, S3_BUCKET_ENV, TA_CHECKS_INFO_ENV,
};

/// Settings read once at cold start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Destination bucket for support-case-update events
    pub bucket_name: Option<String>,
    /// Region the Health API is called in
    pub health_region: String,
    /// Check metadata file replacing the bundled catalog
    pub checks_info_path: Option<PathBuf>,
}

impl CollectorConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup; empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            bucket_name: get(S3_BUCKET_ENV),
            health_region: get(HEALTH_REGION_ENV).unwrap_or_else(|| HEALTH_API_REGION.to_string()),
            checks_info_path: get(TA_CHECKS_INFO_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> CollectorConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CollectorConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.bucket_name, None);
        assert_eq!(cfg.health_region, "us-east-1");
        assert_eq!(cfg.checks_info_path, None);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("S3_BUCKET_NAME", "central"),
            ("HEALTH_API_REGION", "us-west-2"),
            ("TA_CHECKS_INFO_PATH", "/opt/ta_checks_info.json"),
        ]);
        assert_eq!(cfg.bucket_name.as_deref(), Some("central"));
        assert_eq!(cfg.health_region, "us-west-2");
        assert_eq!(
            cfg.checks_info_path,
            Some(PathBuf::from("/opt/ta_checks_info.json"))
        );
    }

    #[test]
    fn empty_values_are_unset() {
        let cfg = config(&[("S3_BUCKET_NAME", ""), ("HEALTH_API_REGION", "  ")]);
        assert_eq!(cfg.bucket_name, None);
        assert_eq!(cfg.health_region, "us-east-1");
    }
}
