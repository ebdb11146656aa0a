//! AWS Health API access
//!
//! The Health control plane is served from a single region, so the client
//! is always built for that region regardless of where the Lambda runs.

use anyhow::{Context, Result};
use aws_sdk_health::Client;
use aws_sdk_health::primitives::DateTime as SmithyDateTime;
use aws_sdk_health::types::{DateTimeRange, EventFilter, EventStatusCode};
use chrono::{DateTime, Utc};
use std::future::Future;
use support_insights_aws::{AwsContext, into_aws_error};
use support_insights_common::HealthEvent;
use tracing::debug;

/// Latest description resolved for one event ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub arn: String,
    pub latest_description: Option<String>,
}

/// Trait for Health API operations that can be faked in tests.
pub trait HealthApi: Send + Sync {
    /// Events starting in `[from, to]` with status open, upcoming or closed
    fn describe_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<HealthEvent>>> + Send;

    /// Resolve details for at most ten event ARNs
    fn describe_event_details(
        &self,
        arns: Vec<String>,
    ) -> impl Future<Output = Result<Vec<EventDetail>>> + Send;
}

/// Health API client pinned to the Health control plane region
#[derive(Clone)]
pub struct HealthClient {
    client: Client,
}

impl HealthClient {
    pub fn from_context(ctx: &AwsContext, health_region: &str) -> Self {
        Self {
            client: ctx.with_region(health_region).health_client(),
        }
    }
}

impl HealthApi for HealthClient {
    async fn describe_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HealthEvent>> {
        let filter = EventFilter::builder()
            .start_times(
                DateTimeRange::builder()
                    .from(SmithyDateTime::from_secs(from.timestamp()))
                    .to(SmithyDateTime::from_secs(to.timestamp()))
                    .build(),
            )
            .event_status_codes(EventStatusCode::Open)
            .event_status_codes(EventStatusCode::Upcoming)
            .event_status_codes(EventStatusCode::Closed)
            .build();

        let mut events = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.describe_events().filter(filter.clone());
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(into_aws_error)
                .context("Failed to describe Health events")?;
            events.extend(response.events().iter().filter_map(event_from_sdk));

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = events.len(), "Described Health events");
        Ok(events)
    }

    async fn describe_event_details(&self, arns: Vec<String>) -> Result<Vec<EventDetail>> {
        let response = self
            .client
            .describe_event_details()
            .set_event_arns(Some(arns))
            .send()
            .await
            .map_err(into_aws_error)
            .context("Failed to describe Health event details")?;

        Ok(response
            .successful_set()
            .iter()
            .filter_map(|detail| {
                let arn = detail.event()?.arn()?.to_string();
                let latest_description = detail
                    .event_description()
                    .and_then(|d| d.latest_description())
                    .map(str::to_string);
                Some(EventDetail {
                    arn,
                    latest_description,
                })
            })
            .collect())
    }
}

fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Events without an ARN cannot be keyed and are skipped
fn event_from_sdk(event: &aws_sdk_health::types::Event) -> Option<HealthEvent> {
    Some(HealthEvent {
        arn: event.arn()?.to_string(),
        service: event.service().map(str::to_string),
        event_type_code: event.event_type_code().map(str::to_string),
        event_type_category: event.event_type_category().map(|c| c.as_str().to_string()),
        region: event.region().map(str::to_string),
        availability_zone: event.availability_zone().map(str::to_string),
        start_time: event.start_time().and_then(to_chrono),
        end_time: event.end_time().and_then(to_chrono),
        last_updated_time: event.last_updated_time().and_then(to_chrono),
        status_code: event.status_code().map(|c| c.as_str().to_string()),
        event_scope_code: event.event_scope_code().map(|c| c.as_str().to_string()),
        details: None,
    })
}
