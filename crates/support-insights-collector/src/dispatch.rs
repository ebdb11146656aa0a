//! Routing of Lambda invocations to collectors
//!
//! Two event shapes are accepted:
//! - an EventBridge `aws.support` "Support Case Update" event, which uploads
//!   the one case it names and always answers with a response
//! - a scheduled request `{bucket_name, past_no_of_days, case?, ta?, health?}`
//!   which runs every flagged collector in turn

use crate::collectors::{Collector, CollectorBackend};
use crate::config::CollectorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use support_insights_aws::AccountId;
use support_insights_common::defaults::S3_BUCKET_ENV;
use thiserror::Error;
use tracing::{error, info};

pub const CASE_UPDATE_SOURCE: &str = "aws.support";
pub const CASE_UPDATE_DETAIL_TYPE: &str = "Support Case Update";

const MISSING_DAYS: &str = "Error: PAST_NO_OF_DAYS parameter is missing.";
const MISSING_BUCKET: &str = "Error: BUCKET_NAME parameter is missing.";
const NO_FLAGS: &str =
    "Error: No scripts specified to run. Please provide at least one flag ('case', 'health', 'ta').";

/// HTTP-shaped result returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

/// Failures of a scheduled run, reported as a Lambda error
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Cannot derive an account id from function ARN '{0}'")]
    InvalidFunctionArn(String),

    #[error("{collector} collector failed")]
    Collector {
        collector: Collector,
        #[source]
        source: anyhow::Error,
    },
}

/// Scheduled bulk collection request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkRequest {
    pub bucket_name: Option<String>,
    pub past_no_of_days: Option<u32>,
    #[serde(default)]
    pub case: bool,
    #[serde(default)]
    pub health: bool,
    #[serde(default)]
    pub ta: bool,
}

impl BulkRequest {
    /// Flagged collectors in execution order
    pub fn collectors(&self) -> Vec<Collector> {
        Collector::ORDER
            .into_iter()
            .filter(|c| match c {
                Collector::Cases => self.case,
                Collector::TrustedAdvisor => self.ta,
                Collector::Health => self.health,
            })
            .collect()
    }
}

/// Whether `event` is an EventBridge support case update
pub fn is_case_update(event: &Value) -> bool {
    event.get("source").and_then(Value::as_str) == Some(CASE_UPDATE_SOURCE)
        && event.get("detail-type").and_then(Value::as_str) == Some(CASE_UPDATE_DETAIL_TYPE)
}

/// Route one invocation.
///
/// `function_arn` is the invoked function's ARN; its account field names the
/// account the records are collected from.
pub async fn dispatch<B: CollectorBackend>(
    backend: &B,
    config: &CollectorConfig,
    function_arn: &str,
    event: Value,
) -> Result<HandlerResponse, DispatchError> {
    if is_case_update(&event) {
        return Ok(handle_case_update(backend, config, function_arn, &event).await);
    }

    let account_id = AccountId::from_arn(function_arn)
        .ok_or_else(|| DispatchError::InvalidFunctionArn(function_arn.to_string()))?;
    let request: BulkRequest = match serde_json::from_value(event) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Scheduled request is malformed");
            return Ok(HandlerResponse::new(400, format!("Error: invalid request: {e}")));
        }
    };
    handle_bulk(backend, account_id.as_str(), &request).await
}

async fn handle_bulk<B: CollectorBackend>(
    backend: &B,
    account_id: &str,
    request: &BulkRequest,
) -> Result<HandlerResponse, DispatchError> {
    let Some(past_days) = request.past_no_of_days else {
        return Ok(HandlerResponse::new(400, MISSING_DAYS));
    };
    let collectors = request.collectors();
    if collectors.is_empty() {
        return Ok(HandlerResponse::new(400, NO_FLAGS));
    }
    let Some(bucket) = request.bucket_name.as_deref() else {
        return Ok(HandlerResponse::new(400, MISSING_BUCKET));
    };

    let mut lines = Vec::with_capacity(collectors.len() * 2);
    for collector in collectors {
        info!(%collector, account_id = %account_id, past_days, "Running collector");
        lines.push(collector.start_message());
        let written = collector
            .run(backend, bucket, account_id, past_days)
            .await
            .map_err(|source| DispatchError::Collector { collector, source })?;
        info!(%collector, written, "Collector finished");
        lines.push(collector.done_message());
    }

    Ok(HandlerResponse::new(200, lines.join("\n")))
}

/// Never fails: every error becomes a 500 response
async fn handle_case_update<B: CollectorBackend>(
    backend: &B,
    config: &CollectorConfig,
    function_arn: &str,
    event: &Value,
) -> HandlerResponse {
    let display_id = event
        .get("detail")
        .and_then(|d| d.get("display-id"))
        .and_then(Value::as_str);
    let Some(display_id) = display_id else {
        return missing_field("detail.display-id");
    };
    let Some(bucket) = config.bucket_name.as_deref() else {
        return missing_field(S3_BUCKET_ENV);
    };
    let Some(account_id) = AccountId::from_arn(function_arn) else {
        return missing_field("invoked_function_arn");
    };

    info!(case_id = %display_id, account_id = %account_id, "Handling support case update");
    match backend.upload_case(bucket, account_id.as_str(), display_id).await {
        Ok(key) => HandlerResponse::new(
            200,
            format!("Support case {display_id} uploaded to s3://{bucket}/{key}"),
        ),
        Err(e) => {
            error!(case_id = %display_id, error = %format!("{e:#}"), "Support case update failed");
            HandlerResponse::new(500, format!("{e:#}"))
        }
    }
}

fn missing_field(field: &str) -> HandlerResponse {
    error!(field = %field, "Support case update is missing a field");
    HandlerResponse::new(500, format!("Missing required field: {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use serde_json::json;
    use std::sync::Mutex;

    const FUNCTION_ARN: &str =
        "arn:aws:lambda:us-east-2:111122223333:function:SupportInsightsCollector";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Cases { bucket: String, account: String, days: u32 },
        Case { bucket: String, account: String, id: String },
        TrustedAdvisor { bucket: String, account: String },
        Health { bucket: String, account: String, days: u32 },
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl RecordingBackend {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                bail!("AccessDeniedException: not authorized");
            }
            Ok(())
        }
    }

    impl CollectorBackend for RecordingBackend {
        async fn upload_cases(&self, bucket: &str, account_id: &str, past_days: u32) -> Result<usize> {
            self.record(Call::Cases {
                bucket: bucket.into(),
                account: account_id.into(),
                days: past_days,
            })?;
            Ok(1)
        }

        async fn upload_case(&self, bucket: &str, account_id: &str, display_id: &str) -> Result<String> {
            self.record(Call::Case {
                bucket: bucket.into(),
                account: account_id.into(),
                id: display_id.into(),
            })?;
            Ok(format!("support-cases/{account_id}/2024/06/{display_id}.json"))
        }

        async fn upload_recommendations(&self, bucket: &str, account_id: &str) -> Result<usize> {
            self.record(Call::TrustedAdvisor {
                bucket: bucket.into(),
                account: account_id.into(),
            })?;
            Ok(1)
        }

        async fn upload_health_events(
            &self,
            bucket: &str,
            account_id: &str,
            past_days: u32,
        ) -> Result<usize> {
            self.record(Call::Health {
                bucket: bucket.into(),
                account: account_id.into(),
                days: past_days,
            })?;
            Ok(1)
        }
    }

    fn config(bucket: Option<&str>) -> CollectorConfig {
        CollectorConfig::from_vars(|name| match name {
            "S3_BUCKET_NAME" => bucket.map(str::to_string),
            _ => None,
        })
    }

    fn case_update(display_id: Option<&str>) -> Value {
        let detail = match display_id {
            Some(id) => json!({ "display-id": id, "case-id": "case-111122223333-muen-2024-x" }),
            None => json!({}),
        };
        json!({
            "source": "aws.support",
            "detail-type": "Support Case Update",
            "detail": detail,
        })
    }

    #[tokio::test]
    async fn health_flag_runs_only_health() {
        let backend = RecordingBackend::default();
        let event = json!({ "bucket_name": "b", "past_no_of_days": 7, "health": true });

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            "Searching AWS Health notifications..\nHealth events uploaded successfully."
        );
        assert_eq!(
            backend.calls(),
            vec![Call::Health {
                bucket: "b".into(),
                account: "111122223333".into(),
                days: 7
            }]
        );
    }

    #[tokio::test]
    async fn all_flags_run_cases_then_ta_then_health() {
        let backend = RecordingBackend::default();
        let event = json!({
            "bucket_name": "b",
            "past_no_of_days": 30,
            "health": true,
            "ta": true,
            "case": true,
        });

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap();

        let lines: Vec<_> = response.body.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Searching AWS Support Cases..",
                "Cases uploaded successfully.",
                "Searching AWS Trusted Advisor recommendations..",
                "Trusted Advisor recommendations uploaded successfully.",
                "Searching AWS Health notifications..",
                "Health events uploaded successfully.",
            ]
        );
        assert!(matches!(backend.calls()[0], Call::Cases { days: 30, .. }));
        assert!(matches!(backend.calls()[1], Call::TrustedAdvisor { .. }));
        assert!(matches!(backend.calls()[2], Call::Health { .. }));
    }

    #[tokio::test]
    async fn missing_days_is_rejected() {
        let backend = RecordingBackend::default();
        let event = json!({ "bucket_name": "b", "case": true });

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap();

        assert_eq!(response, HandlerResponse::new(400, MISSING_DAYS));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn no_flags_is_rejected() {
        let backend = RecordingBackend::default();
        let event = json!({ "bucket_name": "b", "past_no_of_days": 7, "case": false });

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, NO_FLAGS);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_bucket_is_rejected() {
        let backend = RecordingBackend::default();
        let event = json!({ "past_no_of_days": 7, "ta": true });

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap();
        assert_eq!(response, HandlerResponse::new(400, MISSING_BUCKET));
    }

    #[tokio::test]
    async fn mistyped_fields_are_rejected() {
        let backend = RecordingBackend::default();

        for event in [
            json!({ "bucket_name": "b", "past_no_of_days": "7", "case": true }),
            json!({ "bucket_name": "b", "past_no_of_days": 7, "case": "true" }),
            json!({ "bucket_name": "b", "past_no_of_days": -1, "ta": true }),
        ] {
            let response = dispatch(&backend, &config(None), FUNCTION_ARN, event)
                .await
                .unwrap();
            assert_eq!(response.status_code, 400);
            assert!(response.body.starts_with("Error: invalid request:"), "{}", response.body);
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn collector_failure_is_a_lambda_error() {
        let backend = RecordingBackend::failing();
        let event = json!({ "bucket_name": "b", "past_no_of_days": 7, "case": true, "health": true });

        let err = dispatch(&backend, &config(None), FUNCTION_ARN, event)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Collector {
                collector: Collector::Cases,
                ..
            }
        ));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn scheduled_run_needs_account_in_function_arn() {
        let backend = RecordingBackend::default();
        let event = json!({ "bucket_name": "b", "past_no_of_days": 7, "case": true });

        let err = dispatch(&backend, &config(None), "", event).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidFunctionArn(_)));
    }

    #[tokio::test]
    async fn case_update_uploads_single_case() {
        let backend = RecordingBackend::default();

        let response = dispatch(
            &backend,
            &config(Some("central")),
            FUNCTION_ARN,
            case_update(Some("123456789")),
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("123456789"));
        assert_eq!(
            backend.calls(),
            vec![Call::Case {
                bucket: "central".into(),
                account: "111122223333".into(),
                id: "123456789".into()
            }]
        );
    }

    #[tokio::test]
    async fn case_update_missing_display_id_is_500() {
        let backend = RecordingBackend::default();

        let response = dispatch(&backend, &config(Some("central")), FUNCTION_ARN, case_update(None))
            .await
            .unwrap();

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, "Missing required field: detail.display-id");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn case_update_missing_bucket_is_500() {
        let backend = RecordingBackend::default();

        let response = dispatch(&backend, &config(None), FUNCTION_ARN, case_update(Some("1")))
            .await
            .unwrap();

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, "Missing required field: S3_BUCKET_NAME");
    }

    #[tokio::test]
    async fn case_update_errors_become_500() {
        let backend = RecordingBackend::failing();

        let response = dispatch(
            &backend,
            &config(Some("central")),
            FUNCTION_ARN,
            case_update(Some("123456789")),
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("AccessDeniedException"));
    }

    #[test]
    fn response_uses_status_code_field() {
        let json = serde_json::to_value(HandlerResponse::new(200, "ok")).unwrap();
        assert_eq!(json, json!({ "statusCode": 200, "body": "ok" }));
    }

    #[test]
    fn other_sources_are_scheduled_runs() {
        assert!(!is_case_update(&json!({ "source": "aws.events", "detail-type": "Scheduled Event" })));
        assert!(!is_case_update(&json!({ "source": "aws.support" })));
        assert!(is_case_update(&case_update(Some("1"))));
    }
}
