//! Validation of user-supplied OU ids against the live Organization tree

use crate::aws::OrganizationOperations;
use anyhow::{Result, bail};
use support_insights_common::split_csv;
use tracing::{info, warn};

/// Requested OU ids split by whether they exist under the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OuResolution {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Split `requested` into ids present in `live` and the rest.
///
/// Order of first appearance is kept; repeated ids are reported once.
pub fn partition_ou_ids(requested: &[String], live: &[String]) -> OuResolution {
    let mut resolution = OuResolution::default();
    for id in requested {
        let bucket = if live.contains(id) {
            &mut resolution.valid
        } else {
            &mut resolution.invalid
        };
        if !bucket.contains(id) {
            bucket.push(id.clone());
        }
    }
    resolution
}

/// Resolve a comma-separated OU list against the OUs directly under the root.
///
/// Unknown ids are logged and dropped; an empty result is an error.
pub async fn resolve_ou_ids<O: OrganizationOperations>(org: &O, input: &str) -> Result<Vec<String>> {
    let requested = split_csv(input);
    let root_id = org.root_id().await?;
    let live = org.list_child_ous(&root_id).await?;

    let resolution = partition_ou_ids(&requested, &live);
    for id in &resolution.invalid {
        warn!(ou_id = %id, "OU id is not valid");
    }
    if resolution.valid.is_empty() {
        bail!("No valid OU ids provided (requested: {input})");
    }

    info!(ou_ids = ?resolution.valid, "Resolved OUs");
    Ok(resolution.valid)
}

/// Account ids directly under each OU, in OU order
pub async fn accounts_in_ous<O: OrganizationOperations>(
    org: &O,
    ou_ids: &[String],
) -> Result<Vec<String>> {
    let mut accounts = Vec::new();
    for ou_id in ou_ids {
        accounts.extend(org.list_accounts_for_parent(ou_id).await?);
    }
    Ok(accounts)
}
