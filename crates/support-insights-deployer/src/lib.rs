//! support-insights deployer
//!
//! Rolls the Support insights collection resources out across an AWS
//! Organization with CloudFormation StackSets, generates the central data
//! bucket policy, and backfills support cases from member accounts.

pub mod aws;
pub mod bulk;
pub mod config;
pub mod deploy;
pub mod policy;
pub mod resolver;
pub mod stackset;
pub mod wait;

#[cfg(test)]
mod testing;
