//! Bucket checks and policy updates on the central data bucket

use anyhow::Result;
use support_insights_aws::S3Client;

/// Trait for bucket operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait BucketOperations: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Replace the bucket policy
    async fn put_bucket_policy(&self, bucket: &str, policy_json: &str) -> Result<()>;
}

impl BucketOperations for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        S3Client::bucket_exists(self, bucket).await
    }

    async fn put_bucket_policy(&self, bucket: &str, policy_json: &str) -> Result<()> {
        S3Client::put_bucket_policy(self, bucket, policy_json).await
    }
}
