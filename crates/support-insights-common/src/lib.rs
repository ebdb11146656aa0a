//! support-insights-common - Shared types and utilities
//!
//! This crate provides the types shared by the collector Lambda and the
//! deployment CLI, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`checks`]: Static Trusted Advisor check metadata
//! - [`defaults`]: Default names, paths and intervals
//! - [`keys`]: S3 object key scheme for collected records
//! - [`policy`]: Central bucket policy document
//! - [`records`]: Support case, Health event and Trusted Advisor records
//! - [`status`]: StackSet operation status

pub mod checks;
pub mod defaults;
pub mod keys;
pub mod policy;
pub mod records;
pub mod status;

// Re-export commonly used types
pub use checks::{CheckCatalog, CheckInfo};
pub use policy::BucketPolicy;
pub use records::{
    CaseRecord, HealthEvent, HealthRecord, RecommendationRecord, SupportCase,
    TrustedAdvisorResult,
};
pub use status::OperationStatus;

/// Split a comma-separated list, trimming whitespace and dropping empty entries.
pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
