//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating multiple service clients from the same config.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration context for creating service clients.
///
/// This struct holds a loaded AWS SDK config and provides methods
/// to create service clients without re-loading configuration.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new(Some("us-west-2"), None).await;
///
/// // Create multiple clients from the same config
/// let s3 = S3Client::from_context(&aws);
/// let cfn = aws.cloudformation_client();
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration, optionally pinning the region and profile.
    ///
    /// Without a region the SDK's default resolution applies (environment,
    /// profile, instance metadata). This loads credentials from the
    /// environment, config files, and IAM roles.
    pub async fn new(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        Self::from_sdk_config(loader.load().await)
    }

    /// Wrap an already-loaded SDK config.
    pub fn from_sdk_config(config: SdkConfig) -> Self {
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            region,
        }
    }

    /// Same credentials, different region.
    pub fn with_region(&self, region: &str) -> Self {
        Self::from_sdk_config(
            self.config
                .to_builder()
                .region(Region::new(region.to_string()))
                .build(),
        )
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the region string (empty when none could be resolved).
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cloudformation_client(&self) -> aws_sdk_cloudformation::Client {
        aws_sdk_cloudformation::Client::new(self.sdk_config())
    }

    pub fn health_client(&self) -> aws_sdk_health::Client {
        aws_sdk_health::Client::new(self.sdk_config())
    }

    pub fn organizations_client(&self) -> aws_sdk_organizations::Client {
        aws_sdk_organizations::Client::new(self.sdk_config())
    }

    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }

    pub fn support_client(&self) -> aws_sdk_support::Client {
        aws_sdk_support::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
