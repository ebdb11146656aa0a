//! Trusted Advisor recommendation collection

use crate::sink::{ObjectSink, put_record};
use crate::support::SupportApi;
use anyhow::Result;
use support_insights_aws::is_subscription_required;
use support_insights_common::keys::ta_key;
use support_insights_common::records::{is_actionable_status, recommendation_description};
use support_insights_common::{CheckCatalog, RecommendationRecord, TrustedAdvisorResult};
use tracing::{debug, info, warn};

/// Fetch the latest result of every Trusted Advisor check
async fn list_results<S: SupportApi>(support: &S) -> Result<Vec<TrustedAdvisorResult>> {
    let mut results = Vec::new();
    for check_id in support.list_check_ids().await? {
        match support.check_result(&check_id).await? {
            Some(result) => results.push(result),
            None => debug!(check_id = %check_id, "Check has no result"),
        }
    }
    Ok(results)
}

/// Upload recommendations whose status needs attention, returning the
/// number of objects written.
///
/// Results with any other status are never written. An account without a
/// Support subscription uploads nothing and succeeds.
pub async fn upload_recommendations<S, O>(
    support: &S,
    sink: &O,
    catalog: &CheckCatalog,
    bucket: &str,
    account_id: &str,
) -> Result<usize>
where
    S: SupportApi,
    O: ObjectSink,
{
    info!(account_id = %account_id, "Finding Trusted Advisor recommendations");
    let results = match list_results(support).await {
        Ok(results) => results,
        Err(e) if is_subscription_required(&e) => {
            warn!(
                account_id = %account_id,
                "Trusted Advisor checks require a Business, Enterprise On-Ramp or Enterprise Support plan"
            );
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    let mut written = 0;
    for mut result in results {
        if !is_actionable_status(&result.status) {
            continue;
        }

        let status = result.status.to_ascii_lowercase();
        result.description = Some(recommendation_description(
            account_id,
            &status,
            catalog.description(&result.check_id),
        ));

        let key = ta_key(account_id, &result.check_id);
        let record = RecommendationRecord {
            account_id: account_id.to_string(),
            recommendation: result,
        };
        put_record(sink, bucket, &key, &record).await?;
        info!(key = %key, "Uploaded Trusted Advisor recommendation");
        written += 1;
    }

    info!(account_id = %account_id, written, "Trusted Advisor upload done");
    Ok(written)
}
