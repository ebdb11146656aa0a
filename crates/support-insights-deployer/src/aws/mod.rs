//! AWS client modules for the deployer
//!
//! - CloudFormation: stacks and service-managed StackSets
//! - Organizations: root, OU and account lookups
//! - S3: central bucket checks and policy updates

pub mod cloudformation;
pub mod organizations;
pub mod s3;

pub use cloudformation::{CloudFormationClient, StackParameter, StackProgress, StackSetOperations};
pub use organizations::{OrganizationOperations, OrganizationsClient};
pub use s3::BucketOperations;

#[cfg(test)]
pub use s3::MockBucketOperations;
