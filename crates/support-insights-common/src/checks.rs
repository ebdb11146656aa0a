//! Static Trusted Advisor check metadata
//!
//! The Trusted Advisor API returns check results without a human-readable
//! description, so recommendations are enriched from a local catalog keyed
//! by check id. A default catalog is bundled with the crate.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUNDLED_CHECKS: &str = include_str!("data/ta_checks_info.json");

/// Fallback when a check id is missing from the catalog
pub const NO_DESCRIPTION: &str = "No description provided";

#[derive(Debug, Error)]
pub enum CheckCatalogError {
    #[error("Failed to read check metadata from {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid check metadata JSON")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInfo {
    pub check_id: String,
    pub name: String,
    pub description: String,
}

/// Check metadata indexed by check id
#[derive(Debug, Clone, Default)]
pub struct CheckCatalog {
    checks: HashMap<String, CheckInfo>,
}

impl CheckCatalog {
    /// Catalog shipped with the collector
    pub fn bundled() -> Result<Self, CheckCatalogError> {
        Self::from_json(BUNDLED_CHECKS)
    }

    pub fn from_json(json: &str) -> Result<Self, CheckCatalogError> {
        let entries: Vec<CheckInfo> = serde_json::from_str(json)?;
        Ok(entries.into_iter().collect())
    }

    pub fn from_file(path: &Path) -> Result<Self, CheckCatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CheckCatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn get(&self, check_id: &str) -> Option<&CheckInfo> {
        self.checks.get(check_id)
    }

    /// Description for a check, or [`NO_DESCRIPTION`]
    pub fn description(&self, check_id: &str) -> &str {
        self.get(check_id)
            .map(|c| c.description.as_str())
            .unwrap_or(NO_DESCRIPTION)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl FromIterator<CheckInfo> for CheckCatalog {
    fn from_iter<I: IntoIterator<Item = CheckInfo>>(iter: I) -> Self {
        Self {
            checks: iter
                .into_iter()
                .map(|c| (c.check_id.clone(), c))
                .collect(),
        }
    }
}
