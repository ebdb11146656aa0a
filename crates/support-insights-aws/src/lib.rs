//! AWS client modules shared by the collector and the deployer
//!
//! This crate provides:
//! - context: Shared SDK configuration and client construction
//! - account: Account ids, caller identity and role assumption
//! - error: Typed classification of AWS SDK errors
//! - s3: Bucket checks, bucket policies and object uploads

pub mod account;
pub mod context;
pub mod error;
pub mod s3;

pub use account::{AccountId, assume_role, get_current_account_id};
pub use context::AwsContext;
pub use error::{AwsError, classify_aws_error, into_aws_error, is_subscription_required};
pub use s3::S3Client;
