//! S3 object key scheme for collected records
//!
//! Layout:
//! - `support-cases/<account>/<YYYY/MM>/<displayId>.json`
//! - `health/<account>/<YYYY>/<M>/<sanitized-arn>.json`
//! - `ta/<account>/<checkId>.json`
//!
//! Keys are deterministic, so re-collecting a record overwrites the previous
//! object.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub const CASES_PREFIX: &str = "support-cases";
pub const HEALTH_PREFIX: &str = "health";
pub const TA_PREFIX: &str = "ta";

/// Partition for a case: creation `YYYY/MM`, or `today` as `YYYY-MM-DD`
/// when the creation time is missing or unparseable.
pub fn case_partition(time_created: Option<&str>, today: NaiveDate) -> String {
    time_created
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| format!("{}/{:02}", dt.year(), dt.month()))
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string())
}

pub fn case_key(account_id: &str, partition: &str, case_id: &str) -> String {
    format!("{CASES_PREFIX}/{account_id}/{partition}/{case_id}.json")
}

/// Turn an event ARN into a file name: last `:` segment, `/` replaced by `_`
pub fn sanitize_arn(arn: &str) -> String {
    arn.rsplit(':').next().unwrap_or(arn).replace('/', "_")
}

/// Key for a Health event; the month is not zero-padded.
pub fn health_key(account_id: &str, start_time: DateTime<Utc>, arn: &str) -> String {
    format!(
        "{HEALTH_PREFIX}/{account_id}/{}/{}/{}.json",
        start_time.year(),
        start_time.month(),
        sanitize_arn(arn)
    )
}

pub fn ta_key(account_id: &str, check_id: &str) -> String {
    format!("{TA_PREFIX}/{account_id}/{check_id}.json")
}
