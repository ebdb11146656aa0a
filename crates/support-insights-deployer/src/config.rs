//! Configuration types for the deployer commands

use crate::aws::StackParameter;
use crate::wait::PollConfig;
use std::path::PathBuf;
use support_insights_aws::AwsContext;

/// AWS credential and region selection
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    /// Region override (SDK default chain when unset)
    pub region: Option<String>,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

impl AwsConfig {
    /// Load the SDK configuration for this region and profile
    pub async fn load(&self) -> AwsContext {
        AwsContext::new(self.region.as_deref(), self.aws_profile.as_deref()).await
    }
}

/// Bucket policy generation
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Central data bucket
    pub bucket: String,
    /// Role name granted access in every member account
    pub role_name: String,
    /// Local file the policy is always written to
    pub output_path: PathBuf,
    /// Replace the live bucket policy
    pub overwrite: bool,
}

/// Organization-wide support collector rollout
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub policy: PolicyConfig,
    /// Comma-separated OU ids to target
    pub ou_ids: String,
    pub member_template: PathBuf,
    pub historical_template: PathBuf,
    pub poll: PollConfig,
}

/// A single StackSet deployment
#[derive(Debug, Clone)]
pub struct StackSetConfig {
    pub name: String,
    pub template: PathBuf,
    /// Comma-separated OU ids to target
    pub ou_ids: String,
    pub parameters: Vec<StackParameter>,
    pub poll: PollConfig,
}

/// Central stack plus member StackSet for the case collector
#[derive(Debug, Clone)]
pub struct CaseCollectorConfig {
    /// Central account trusted by member roles (caller's account when unset)
    pub central_account_id: Option<String>,
    pub central_template: PathBuf,
    pub central_stack_name: String,
    pub member_template: PathBuf,
    pub member_stack_set_name: String,
    pub poll: PollConfig,
}

/// Collector Lambda stack in a single account
#[derive(Debug, Clone)]
pub struct MemberStackConfig {
    pub template: PathBuf,
    pub stack_name: String,
    pub role_name: String,
    /// Central data bucket
    pub master_bucket: String,
    /// Bucket holding the Lambda package
    pub member_bucket: String,
    pub poll: PollConfig,
}

/// Cross-account case upload
#[derive(Debug, Clone)]
pub struct BulkUploadConfig {
    pub bucket: String,
    /// Role assumed in every member account
    pub role_name: String,
    pub session_name: String,
    pub past_days: u32,
    pub exclude_accounts: Vec<String>,
}
