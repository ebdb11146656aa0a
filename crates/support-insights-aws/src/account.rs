//! AWS account identity and cross-account role assumption

use crate::context::AwsContext;
use crate::error::into_aws_error;
use anyhow::{Context, Result};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use support_insights_common::policy::role_arn;
use tracing::{debug, info};

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// Extract the account from an ARN (`arn:partition:service:region:account:...`)
    pub fn from_arn(arn: &str) -> Option<Self> {
        arn.split(':')
            .nth(4)
            .filter(|account| !account.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid.
pub async fn get_current_account_id(ctx: &AwsContext) -> Result<AccountId> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .map_err(into_aws_error)
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId::new(account))
}

/// Assume `role_name` in `account_id` and return a context using the
/// temporary credentials (same region as `ctx`).
pub async fn assume_role(
    ctx: &AwsContext,
    account_id: &str,
    role_name: &str,
    session_name: &str,
) -> Result<AwsContext> {
    let arn = role_arn(account_id, role_name);
    debug!(role_arn = %arn, "Assuming member account role");

    let response = ctx
        .sts_client()
        .assume_role()
        .role_arn(&arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(into_aws_error)
        .with_context(|| format!("Failed to assume role {arn}"))?;

    let creds = response
        .credentials()
        .with_context(|| format!("No credentials returned when assuming {arn}"))?;

    let credentials = Credentials::new(
        creds.access_key_id(),
        creds.secret_access_key(),
        Some(creds.session_token().to_string()),
        std::time::SystemTime::try_from(*creds.expiration()).ok(),
        "support-insights-assume-role",
    );

    let config = ctx
        .sdk_config()
        .to_builder()
        .credentials_provider(SharedCredentialsProvider::new(credentials))
        .build();

    Ok(AwsContext::from_sdk_config(config))
}
