//! Collectors that copy Support, Trusted Advisor and Health data into S3
//!
//! Each collector reads one read-only API for the current account and writes
//! one JSON object per record. Object keys are deterministic, so a second run
//! overwrites rather than duplicates.

pub mod cases;
pub mod health;
pub mod trusted_advisor;

use crate::health::HealthApi;
use crate::sink::ObjectSink;
use crate::support::SupportApi;
use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use strum::{Display, EnumIter};
use support_insights_common::CheckCatalog;

/// One collector selectable from a scheduled request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Collector {
    #[strum(serialize = "case")]
    Cases,
    #[strum(serialize = "ta")]
    TrustedAdvisor,
    #[strum(serialize = "health")]
    Health,
}

impl Collector {
    /// Order in which a scheduled run executes its collectors
    pub const ORDER: [Collector; 3] = [Self::Cases, Self::TrustedAdvisor, Self::Health];

    pub fn start_message(self) -> &'static str {
        match self {
            Self::Cases => "Searching AWS Support Cases..",
            Self::TrustedAdvisor => "Searching AWS Trusted Advisor recommendations..",
            Self::Health => "Searching AWS Health notifications..",
        }
    }

    pub fn done_message(self) -> &'static str {
        match self {
            Self::Cases => "Cases uploaded successfully.",
            Self::TrustedAdvisor => "Trusted Advisor recommendations uploaded successfully.",
            Self::Health => "Health events uploaded successfully.",
        }
    }

    /// Run this collector for one account
    pub async fn run<B: CollectorBackend>(
        self,
        backend: &B,
        bucket: &str,
        account_id: &str,
        past_days: u32,
    ) -> Result<usize> {
        match self {
            Self::Cases => backend.upload_cases(bucket, account_id, past_days).await,
            Self::TrustedAdvisor => backend.upload_recommendations(bucket, account_id).await,
            Self::Health => {
                backend
                    .upload_health_events(bucket, account_id, past_days)
                    .await
            }
        }
    }
}

/// Trait for the collector operations the dispatcher drives.
///
/// Implemented by [`Collectors`]; tests substitute a recording fake.
pub trait CollectorBackend: Send + Sync {
    fn upload_cases(
        &self,
        bucket: &str,
        account_id: &str,
        past_days: u32,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Upload one case by display id, returning its object key
    fn upload_case(
        &self,
        bucket: &str,
        account_id: &str,
        display_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn upload_recommendations(
        &self,
        bucket: &str,
        account_id: &str,
    ) -> impl Future<Output = Result<usize>> + Send;

    fn upload_health_events(
        &self,
        bucket: &str,
        account_id: &str,
        past_days: u32,
    ) -> impl Future<Output = Result<usize>> + Send;
}

/// Collectors backed by API clients and an object sink
pub struct Collectors<S, H, O> {
    support: S,
    health: H,
    sink: O,
    catalog: CheckCatalog,
}

impl<S, H, O> Collectors<S, H, O> {
    pub fn new(support: S, health: H, sink: O, catalog: CheckCatalog) -> Self {
        Self {
            support,
            health,
            sink,
            catalog,
        }
    }
}

impl<S, H, O> CollectorBackend for Collectors<S, H, O>
where
    S: SupportApi,
    H: HealthApi,
    O: ObjectSink,
{
    async fn upload_cases(&self, bucket: &str, account_id: &str, past_days: u32) -> Result<usize> {
        let today = Utc::now().date_naive();
        cases::upload_cases(&self.support, &self.sink, bucket, account_id, past_days, today).await
    }

    async fn upload_case(&self, bucket: &str, account_id: &str, display_id: &str) -> Result<String> {
        let today = Utc::now().date_naive();
        cases::upload_case(&self.support, &self.sink, bucket, account_id, display_id, today).await
    }

    async fn upload_recommendations(&self, bucket: &str, account_id: &str) -> Result<usize> {
        trusted_advisor::upload_recommendations(
            &self.support,
            &self.sink,
            &self.catalog,
            bucket,
            account_id,
        )
        .await
    }

    async fn upload_health_events(
        &self,
        bucket: &str,
        account_id: &str,
        past_days: u32,
    ) -> Result<usize> {
        health::upload_health_events(
            &self.health,
            &self.sink,
            bucket,
            account_id,
            past_days,
            Utc::now(),
        )
        .await
    }
}
