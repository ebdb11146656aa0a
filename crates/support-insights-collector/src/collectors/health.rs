//! AWS Health event collection

use crate::health::HealthApi;
use crate::sink::{ObjectSink, put_record};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use support_insights_common::defaults::HEALTH_DETAILS_BATCH_SIZE;
use support_insights_common::keys::health_key;
use support_insights_common::{HealthEvent, HealthRecord};
use tracing::{debug, info};

/// Describe events of the last `past_days` days and merge in their latest
/// descriptions, resolved in batches of at most ten ARNs.
pub async fn list_events<H: HealthApi>(
    health: &H,
    past_days: u32,
    now: DateTime<Utc>,
) -> Result<Vec<HealthEvent>> {
    let from = now - Duration::days(i64::from(past_days));
    let mut events = health.describe_events(from, now).await?;

    let arns: Vec<String> = events.iter().map(|e| e.arn.clone()).collect();
    let mut details = HashMap::new();
    for batch in arns.chunks(HEALTH_DETAILS_BATCH_SIZE) {
        for detail in health.describe_event_details(batch.to_vec()).await? {
            if let Some(description) = detail.latest_description {
                details.insert(detail.arn, description);
            }
        }
    }
    debug!(events = events.len(), details = details.len(), "Resolved Health event details");

    for event in &mut events {
        if let Some(description) = details.remove(&event.arn) {
            event.details = Some(description);
        }
    }
    Ok(events)
}

/// Upload Health events of the last `past_days` days, returning the number
/// of objects written.
///
/// Events without a start time are partitioned under `now`.
pub async fn upload_health_events<H, O>(
    health: &H,
    sink: &O,
    bucket: &str,
    account_id: &str,
    past_days: u32,
    now: DateTime<Utc>,
) -> Result<usize>
where
    H: HealthApi,
    O: ObjectSink,
{
    let events = list_events(health, past_days, now).await?;
    info!(
        account_id = %account_id,
        bucket = %bucket,
        count = events.len(),
        "Uploading Health events"
    );

    let mut written = 0;
    for event in events {
        let key = health_key(account_id, event.start_time.unwrap_or(now), &event.arn);
        let record = HealthRecord {
            account_id: account_id.to_string(),
            event,
        };
        put_record(sink, bucket, &key, &record).await?;
        info!(key = %key, "Uploaded Health event");
        written += 1;
    }

    info!(account_id = %account_id, written, "Health upload done");
    Ok(written)
}
