//! In-memory fakes for the AWS seams used by collector tests

use crate::health::{EventDetail, HealthApi};
use crate::sink::ObjectSink;
use crate::support::{CaseQuery, SupportApi};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use support_insights_aws::classify_aws_error;
use support_insights_common::{HealthEvent, SupportCase, TrustedAdvisorResult};

/// Object store keyed by `(bucket, key)`; a later write replaces the object
#[derive(Default)]
pub struct MemorySink {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemorySink {
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn json(&self, bucket: &str, key: &str) -> Option<serde_json::Value> {
        let objects = self.objects.lock().unwrap();
        let body = objects.get(&(bucket.to_string(), key.to_string()))?;
        serde_json::from_slice(body).ok()
    }
}

impl ObjectSink for MemorySink {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}

/// Support API returning canned cases and check results
#[derive(Default)]
pub struct FakeSupport {
    cases: Vec<SupportCase>,
    results: Vec<TrustedAdvisorResult>,
    error_code: Option<String>,
    queries: Mutex<Vec<CaseQuery>>,
}

impl FakeSupport {
    pub fn with_cases(cases: Vec<SupportCase>) -> Self {
        Self {
            cases,
            ..Default::default()
        }
    }

    pub fn with_results(results: Vec<TrustedAdvisorResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn and_results(mut self, results: Vec<TrustedAdvisorResult>) -> Self {
        self.results = results;
        self
    }

    /// Every call fails with the given AWS error code
    pub fn failing(code: &str) -> Self {
        Self {
            error_code: Some(code.to_string()),
            ..Default::default()
        }
    }

    pub fn subscription_required() -> Self {
        Self::failing("SubscriptionRequiredException")
    }

    pub fn case_queries(&self) -> Vec<CaseQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn check_error(&self, what: &str) -> Result<()> {
        match &self.error_code {
            Some(code) => Err(anyhow::Error::new(classify_aws_error(Some(code), None))
                .context(format!("Failed to {what}"))),
            None => Ok(()),
        }
    }
}

impl SupportApi for FakeSupport {
    async fn describe_cases(&self, query: CaseQuery) -> Result<Vec<SupportCase>> {
        self.queries.lock().unwrap().push(query.clone());
        self.check_error("describe support cases")?;

        Ok(self
            .cases
            .iter()
            .filter(|c| {
                query
                    .display_id
                    .as_deref()
                    .is_none_or(|id| c.display_id.as_deref() == Some(id))
            })
            .cloned()
            .collect())
    }

    async fn list_check_ids(&self) -> Result<Vec<String>> {
        self.check_error("describe Trusted Advisor checks")?;
        Ok(self.results.iter().map(|r| r.check_id.clone()).collect())
    }

    async fn check_result(&self, check_id: &str) -> Result<Option<TrustedAdvisorResult>> {
        self.check_error("describe Trusted Advisor check result")?;
        Ok(self.results.iter().find(|r| r.check_id == check_id).cloned())
    }
}

/// Health API returning canned events; every ARN gets a description
pub struct FakeHealth {
    events: Vec<HealthEvent>,
    windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
    batches: Mutex<Vec<usize>>,
}

impl FakeHealth {
    pub fn new(events: Vec<HealthEvent>) -> Self {
        Self {
            events,
            windows: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn detail_batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.windows.lock().unwrap().last().copied()
    }
}

impl HealthApi for FakeHealth {
    async fn describe_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HealthEvent>> {
        self.windows.lock().unwrap().push((from, to));
        Ok(self.events.clone())
    }

    async fn describe_event_details(&self, arns: Vec<String>) -> Result<Vec<EventDetail>> {
        assert!(arns.len() <= 10, "DescribeEventDetails accepts at most 10 ARNs");
        self.batches.lock().unwrap().push(arns.len());
        Ok(arns
            .into_iter()
            .map(|arn| EventDetail {
                latest_description: Some(format!("Description of {arn}")),
                arn,
            })
            .collect())
    }
}

pub fn case(display_id: &str, time_created: Option<&str>, subject: &str) -> SupportCase {
    SupportCase {
        case_id: Some(format!("case-111122223333-muen-2024-{display_id}")),
        display_id: Some(display_id.to_string()),
        subject: Some(subject.to_string()),
        status: Some("opened".to_string()),
        service_code: Some("amazon-simple-storage-service".to_string()),
        severity_code: Some("low".to_string()),
        time_created: time_created.map(str::to_string),
        ..Default::default()
    }
}

pub fn ta_result(check_id: &str, status: &str) -> TrustedAdvisorResult {
    TrustedAdvisorResult {
        check_id: check_id.to_string(),
        timestamp: Some("2024-06-01T00:00:00Z".to_string()),
        status: status.to_string(),
        ..Default::default()
    }
}

pub fn health_event(arn: &str, start_time: Option<DateTime<Utc>>) -> HealthEvent {
    HealthEvent {
        arn: arn.to_string(),
        service: Some("EC2".to_string()),
        start_time,
        ..Default::default()
    }
}
