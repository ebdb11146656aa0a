//! S3 bucket checks, bucket policies and object uploads

use crate::context::AwsContext;
use crate::error::into_aws_error;
use anyhow::{Context, Result};
use aws_sdk_s3::{Client, primitives::ByteStream};
use tracing::{debug, info};

/// S3 client for the central data bucket
#[derive(Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Check whether a bucket exists and is reachable with these credentials
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                debug!(bucket = %bucket, "Bucket not found");
                Ok(false)
            }
            Err(e) => Err(into_aws_error(e))
                .with_context(|| format!("Failed to check bucket {bucket}")),
        }
    }

    /// Replace the bucket policy
    pub async fn put_bucket_policy(&self, bucket: &str, policy_json: &str) -> Result<()> {
        info!(bucket = %bucket, "Applying bucket policy");

        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy_json)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to put bucket policy on {bucket}"))?;

        Ok(())
    }

    /// Upload bytes to S3
    pub async fn upload_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        debug!(bucket = %bucket, key = %key, size = data.len(), "Uploading bytes");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to upload s3://{bucket}/{key}"))?;

        Ok(())
    }
}
