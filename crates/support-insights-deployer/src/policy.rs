//! Bucket policy generation for the central data bucket

use crate::aws::{BucketOperations, OrganizationOperations};
use crate::config::PolicyConfig;
use crate::resolver::accounts_in_ous;
use anyhow::{Context, Result};
use std::path::Path;
use support_insights_common::BucketPolicy;
use tracing::{error, info};

/// Result of generating and optionally applying a policy
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub policy: BucketPolicy,
    /// Whether `PutBucketPolicy` succeeded
    pub applied: bool,
}

/// Build the policy granting the collector role in every account under `ou_ids`
pub async fn generate_bucket_policy<O: OrganizationOperations>(
    org: &O,
    bucket: &str,
    ou_ids: &[String],
    role_name: &str,
) -> Result<BucketPolicy> {
    let accounts = accounts_in_ous(org, ou_ids).await?;
    let org_id = org.organization_id().await?;
    let root_id = org.root_id().await?;

    info!(
        bucket = %bucket,
        accounts = accounts.len(),
        ous = ou_ids.len(),
        "Generated bucket policy"
    );
    Ok(BucketPolicy::for_accounts(
        bucket, &org_id, &root_id, ou_ids, &accounts, role_name,
    ))
}

/// Write the policy as four-space indented JSON
pub async fn write_policy(policy: &BucketPolicy, path: &Path) -> Result<()> {
    let json = policy
        .to_pretty_json()
        .context("Failed to serialize bucket policy")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write bucket policy to {}", path.display()))?;
    Ok(())
}

/// Generate the policy, always write it locally, and apply it when
/// `config.overwrite` is set.
///
/// A failed apply is logged and reported through [`PolicyOutcome::applied`].
pub async fn publish_bucket_policy<O, B>(
    org: &O,
    buckets: &B,
    config: &PolicyConfig,
    ou_ids: &[String],
) -> Result<PolicyOutcome>
where
    O: OrganizationOperations,
    B: BucketOperations,
{
    let policy = generate_bucket_policy(org, &config.bucket, ou_ids, &config.role_name).await?;
    write_policy(&policy, &config.output_path).await?;
    info!(
        path = %config.output_path.display(),
        bucket = %config.bucket,
        "Bucket policy JSON saved"
    );

    if !config.overwrite {
        info!(bucket = %config.bucket, "Not updating the data bucket policy");
        return Ok(PolicyOutcome {
            policy,
            applied: false,
        });
    }

    let json = policy.to_json().context("Failed to serialize bucket policy")?;
    let applied = match buckets.put_bucket_policy(&config.bucket, &json).await {
        Ok(()) => {
            info!(bucket = %config.bucket, "Data bucket policy updated");
            true
        }
        Err(e) => {
            error!(bucket = %config.bucket, error = %format!("{e:#}"), "Failed to update data bucket policy");
            false
        }
    };

    Ok(PolicyOutcome { policy, applied })
}
