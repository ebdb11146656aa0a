//! Default configuration values shared between the collector and the deployer
//!
//! These constants keep the CloudFormation parameters, the S3 layout and the
//! role names consistent across both binaries.

/// Prefix for the member-account resources StackSet
pub const STACKSET_PREFIX: &str = "support-insights";

/// Prefix for the one-time historical data sync StackSet
pub const STACKSET_HISTORICAL_PREFIX: &str = "support-insights-historical-data";

/// Template deploying the collector Lambda into member accounts
pub const DEFAULT_MEMBER_TEMPLATE: &str = "member_account_resources.yaml";

/// Template deploying the one-time historical sync rule
pub const DEFAULT_HISTORICAL_SYNC_TEMPLATE: &str = "member_account_historical_data_sync.yaml";

/// Template for the central case collector stack
pub const DEFAULT_CENTRAL_TEMPLATE: &str = "central_account_resources.yaml";

/// Template for the case collector member StackSet
pub const DEFAULT_CASE_MEMBER_TEMPLATE: &str = "member_accounts_resources.yaml";

/// Stack name of the central case collector stack
pub const DEFAULT_CENTRAL_STACK_NAME: &str = "CentralAccountResourcesStack";

/// StackSet name of the case collector member roles
pub const DEFAULT_CASE_MEMBER_STACKSET_NAME: &str = "MemberAccountResourcesStackSet3";

/// Stack name used for a single-account Lambda deployment
pub const DEFAULT_MEMBER_STACK_NAME: &str = "SupportInsightsLambdaStack";

/// Name of the collector Lambda's execution role in each member account
pub const LAMBDA_ROLE_NAME: &str = "SupportInsightsLambdaRole-9c8794ee-f9e8";

/// Role assumed in member accounts by the cross-account case uploader
pub const MEMBER_ACCOUNT_ROLE_NAME: &str = "CentralUserSupportCaseInsightsRole";

/// Session name used when assuming the member account role
pub const ROLE_SESSION_NAME: &str = "SupportCaseSession";

/// Local file the generated bucket policy is written to
pub const BUCKET_POLICY_FILE: &str = "output_bucket_policy.json";

/// Seconds between StackSet operation status polls
pub const POLL_INTERVAL_SECS: u64 = 15;

/// Region the AWS Health API is called in
pub const HEALTH_API_REGION: &str = "us-east-1";

/// Maximum number of event ARNs accepted by DescribeEventDetails
pub const HEALTH_DETAILS_BATCH_SIZE: usize = 10;

/// Days of case history collected by the cross-account uploader
pub const DEFAULT_PAST_DAYS: u32 = 180;

/// Language requested from the Support API
pub const SUPPORT_LANGUAGE: &str = "en";

/// Environment variable holding the bucket for event-driven case updates
pub const S3_BUCKET_ENV: &str = "S3_BUCKET_NAME";

/// Environment variable overriding the Health API region
pub const HEALTH_REGION_ENV: &str = "HEALTH_API_REGION";

/// Environment variable pointing at a Trusted Advisor check metadata file
pub const TA_CHECKS_INFO_ENV: &str = "TA_CHECKS_INFO_PATH";
