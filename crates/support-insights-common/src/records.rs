//! Records written to the central bucket
//!
//! Each record wraps the payload returned by a read-only AWS API together
//! with the account it was collected from. Field names follow the API's
//! camelCase spelling so downstream indexing sees the familiar shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statuses that make a Trusted Advisor recommendation worth uploading
pub const ACTIONABLE_TA_STATUSES: &[&str] = &["warning", "error", "yellow", "red"];

/// Check whether a Trusted Advisor status needs attention (case-insensitive)
pub fn is_actionable_status(status: &str) -> bool {
    let status = status.to_ascii_lowercase();
    ACTIONABLE_TA_STATUSES.contains(&status.as_str())
}

/// A communication attached to a support case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub case_id: Option<String>,
    pub body: Option<String>,
    pub submitted_by: Option<String>,
    pub time_created: Option<String>,
}

/// A support case as returned by `DescribeCases`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportCase {
    pub case_id: Option<String>,
    pub display_id: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub service_code: Option<String>,
    pub category_code: Option<String>,
    pub severity_code: Option<String>,
    pub submitted_by: Option<String>,
    pub time_created: Option<String>,
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_email_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_communications: Vec<Communication>,
}

impl SupportCase {
    /// Identifier used in the object key: the display id, falling back to the case id
    pub fn key_id(&self) -> Option<&str> {
        self.display_id.as_deref().or(self.case_id.as_deref())
    }
}

/// A support case tagged with its account and a search-friendly summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub account_id: String,
    pub case: SupportCase,
    pub context: String,
}

impl CaseRecord {
    pub fn new(account_id: &str, case: SupportCase) -> Self {
        let context = case_context(account_id, &case);
        Self {
            account_id: account_id.to_string(),
            case,
            context,
        }
    }
}

/// Natural-language summary of a case for downstream search indexing
pub fn case_context(account_id: &str, case: &SupportCase) -> String {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "unknown".to_string());
    format!(
        "The AWS Support case {} was opened from AWS account Id {} and has status '{}'. \
         It concerns the service '{}' with severity '{}'. The case subject is: {}",
        case.key_id().unwrap_or("unknown"),
        account_id,
        or_unknown(&case.status),
        or_unknown(&case.service_code),
        or_unknown(&case.severity_code),
        or_unknown(&case.subject),
    )
}

/// An AWS Health event, optionally enriched with its latest description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEvent {
    pub arn: String,
    pub service: Option<String>,
    pub event_type_code: Option<String>,
    pub event_type_category: Option<String>,
    pub region: Option<String>,
    pub availability_zone: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub status_code: Option<String>,
    pub event_scope_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A Health event tagged with its account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub account_id: String,
    pub event: HealthEvent,
}

/// A resource flagged by a Trusted Advisor check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedResource {
    pub status: String,
    pub region: Option<String>,
    pub resource_id: String,
    #[serde(default)]
    pub is_suppressed: bool,
    /// Positional columns of the check; a cell may be null
    #[serde(default)]
    pub metadata: Vec<Option<String>>,
}

/// A Trusted Advisor check result as returned by `DescribeTrustedAdvisorCheckResult`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedAdvisorResult {
    pub check_id: String,
    pub timestamp: Option<String>,
    pub status: String,
    #[serde(default)]
    pub flagged_resources: Vec<FlaggedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A Trusted Advisor recommendation tagged with its account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub account_id: String,
    pub recommendation: TrustedAdvisorResult,
}

/// Description attached to an uploaded recommendation
pub fn recommendation_description(account_id: &str, status: &str, check_description: &str) -> String {
    format!(
        "The Trusted Advisor (TA) recommendation is for AWS account Id {account_id} that has TA \
         status as '{status}'. This status {status} indicates the account owner should take \
         action on the resources stated here as per this recommendation. The recommendation is \
         as follows: {check_description}"
    )
}
