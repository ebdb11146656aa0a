//! Support case collection

use crate::sink::{ObjectSink, put_record};
use crate::support::{CaseQuery, SupportApi};
use anyhow::{Result, bail};
use chrono::{Days, NaiveDate};
use support_insights_aws::is_subscription_required;
use support_insights_common::keys::{case_key, case_partition};
use support_insights_common::{CaseRecord, SupportCase};
use tracing::{info, warn};

const SUBSCRIPTION_HINT: &str = "A Business, Enterprise On-Ramp or Enterprise Support plan is \
     required to use the AWS Support API";

/// `today - past_days` as the `YYYY-MM-DD` lower bound `DescribeCases` expects
pub fn after_date(today: NaiveDate, past_days: u32) -> String {
    today
        .checked_sub_days(Days::new(u64::from(past_days)))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y-%m-%d")
        .to_string()
}

/// Upload every case created in the last `past_days` days.
///
/// Returns the number of objects written. An account without a Support
/// subscription uploads nothing and succeeds.
pub async fn upload_cases<S, O>(
    support: &S,
    sink: &O,
    bucket: &str,
    account_id: &str,
    past_days: u32,
    today: NaiveDate,
) -> Result<usize>
where
    S: SupportApi,
    O: ObjectSink,
{
    let query = CaseQuery::after(after_date(today, past_days));
    let cases = match support.describe_cases(query).await {
        Ok(cases) => cases,
        Err(e) if is_subscription_required(&e) => {
            warn!(account_id = %account_id, "{SUBSCRIPTION_HINT}");
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    info!(
        account_id = %account_id,
        bucket = %bucket,
        count = cases.len(),
        "Uploading support cases"
    );

    let mut written = 0;
    for case in cases {
        if write_case(sink, bucket, account_id, case, today)
            .await?
            .is_some()
        {
            written += 1;
        }
    }

    info!(account_id = %account_id, written, "Support cases upload done");
    Ok(written)
}

/// Upload the single case with `display_id`, returning its object key
pub async fn upload_case<S, O>(
    support: &S,
    sink: &O,
    bucket: &str,
    account_id: &str,
    display_id: &str,
    today: NaiveDate,
) -> Result<String>
where
    S: SupportApi,
    O: ObjectSink,
{
    let cases = support
        .describe_cases(CaseQuery::by_display_id(display_id))
        .await?;

    let Some(case) = cases.into_iter().next() else {
        bail!("No support case found with display id {display_id}");
    };

    match write_case(sink, bucket, account_id, case, today).await? {
        Some(key) => Ok(key),
        None => bail!("Support case {display_id} has no identifier"),
    }
}

async fn write_case<O: ObjectSink>(
    sink: &O,
    bucket: &str,
    account_id: &str,
    case: SupportCase,
    today: NaiveDate,
) -> Result<Option<String>> {
    let Some(id) = case.key_id().map(str::to_string) else {
        warn!(account_id = %account_id, "Skipping support case without an id");
        return Ok(None);
    };

    let partition = case_partition(case.time_created.as_deref(), today);
    let key = case_key(account_id, &partition, &id);
    put_record(sink, bucket, &key, &CaseRecord::new(account_id, case)).await?;

    info!(key = %key, "Uploaded support case");
    Ok(Some(key))
}
