//! AWS Support API access for cases and Trusted Advisor

use anyhow::{Context, Result};
use aws_sdk_support::Client;
use aws_sdk_support::types::TrustedAdvisorResourceDetail;
use std::future::Future;
use support_insights_aws::{AwsContext, into_aws_error};
use support_insights_common::defaults::SUPPORT_LANGUAGE;
use support_insights_common::records::{Communication, FlaggedResource};
use support_insights_common::{SupportCase, TrustedAdvisorResult};
use tracing::debug;

/// Filter for `DescribeCases`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseQuery {
    /// Only cases created after this date (`YYYY-MM-DD`)
    pub after_time: Option<String>,
    /// Only the case with this display id
    pub display_id: Option<String>,
}

impl CaseQuery {
    pub fn after(date: impl Into<String>) -> Self {
        Self {
            after_time: Some(date.into()),
            display_id: None,
        }
    }

    pub fn by_display_id(display_id: impl Into<String>) -> Self {
        Self {
            after_time: None,
            display_id: Some(display_id.into()),
        }
    }
}

/// Trait for Support API operations that can be faked in tests.
///
/// Resolved cases and communications are always included.
pub trait SupportApi: Send + Sync {
    /// List all cases matching `query`, following pagination
    fn describe_cases(&self, query: CaseQuery)
    -> impl Future<Output = Result<Vec<SupportCase>>> + Send;

    /// List the ids of all Trusted Advisor checks
    fn list_check_ids(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Fetch the latest result of one Trusted Advisor check
    fn check_result(
        &self,
        check_id: &str,
    ) -> impl Future<Output = Result<Option<TrustedAdvisorResult>>> + Send;
}

/// Support API client
#[derive(Clone)]
pub struct SupportClient {
    client: Client,
}

impl SupportClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.support_client(),
        }
    }
}

impl SupportApi for SupportClient {
    async fn describe_cases(&self, query: CaseQuery) -> Result<Vec<SupportCase>> {
        let mut cases = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .describe_cases()
                .set_after_time(query.after_time.clone())
                .set_display_id(query.display_id.clone())
                .include_resolved_cases(true)
                .include_communications(true)
                .language(SUPPORT_LANGUAGE);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(into_aws_error)
                .context("Failed to describe support cases")?;
            cases.extend(response.cases().iter().map(case_from_sdk));

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = cases.len(), "Described support cases");
        Ok(cases)
    }

    async fn list_check_ids(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_trusted_advisor_checks()
            .language(SUPPORT_LANGUAGE)
            .send()
            .await
            .map_err(into_aws_error)
            .context("Failed to describe Trusted Advisor checks")?;

        Ok(response
            .checks()
            .iter()
            .map(|check| check.id().to_string())
            .collect())
    }

    async fn check_result(&self, check_id: &str) -> Result<Option<TrustedAdvisorResult>> {
        let response = self
            .client
            .describe_trusted_advisor_check_result()
            .check_id(check_id)
            .language(SUPPORT_LANGUAGE)
            .send()
            .await
            .map_err(into_aws_error)
            .with_context(|| format!("Failed to describe Trusted Advisor check {check_id}"))?;

        Ok(response.result().map(result_from_sdk))
    }
}

fn case_from_sdk(case: &aws_sdk_support::types::CaseDetails) -> SupportCase {
    let recent_communications = case
        .recent_communications()
        .map(|recent| {
            recent
                .communications()
                .iter()
                .map(|c| Communication {
                    case_id: c.case_id().map(str::to_string),
                    body: c.body().map(str::to_string),
                    submitted_by: c.submitted_by().map(str::to_string),
                    time_created: c.time_created().map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    SupportCase {
        case_id: case.case_id().map(str::to_string),
        display_id: case.display_id().map(str::to_string),
        subject: case.subject().map(str::to_string),
        status: case.status().map(str::to_string),
        service_code: case.service_code().map(str::to_string),
        category_code: case.category_code().map(str::to_string),
        severity_code: case.severity_code().map(str::to_string),
        submitted_by: case.submitted_by().map(str::to_string),
        time_created: case.time_created().map(str::to_string),
        language: case.language().map(str::to_string),
        cc_email_addresses: case.cc_email_addresses().to_vec(),
        recent_communications,
    }
}

fn flagged_from_sdk(r: &TrustedAdvisorResourceDetail) -> FlaggedResource {
    FlaggedResource {
        status: r.status().to_string(),
        region: r.region().map(str::to_string),
        resource_id: r.resource_id().to_string(),
        is_suppressed: r.is_suppressed(),
        metadata: r.metadata().to_vec(),
    }
}

fn result_from_sdk(result: &aws_sdk_support::types::TrustedAdvisorCheckResult) -> TrustedAdvisorResult {
    TrustedAdvisorResult {
        check_id: result.check_id().to_string(),
        timestamp: Some(result.timestamp().to_string()),
        status: result.status().to_string(),
        flagged_resources: result
            .flagged_resources()
            .iter()
            .map(flagged_from_sdk)
            .collect(),
        description: None,
    }
}
