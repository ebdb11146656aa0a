//! Destination for collected records

use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use support_insights_aws::S3Client;

/// Trait for object writes that can be faked in tests.
///
/// A write to an existing key replaces the object.
pub trait ObjectSink: Send + Sync {
    /// Write `body` as a JSON object under `bucket/key`
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl ObjectSink for S3Client {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.upload_bytes(bucket, key, body, "application/json").await
    }
}

/// Serialize a record as UTF-8 JSON and write it
pub async fn put_record<O, T>(sink: &O, bucket: &str, key: &str, record: &T) -> Result<()>
where
    O: ObjectSink,
    T: Serialize + Sync,
{
    let body = serde_json::to_vec(record)?;
    sink.put_object(bucket, key, body).await
}
