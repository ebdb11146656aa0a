//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the error code
//! reported by `ProvideErrorMetadata` instead of string matching on the
//! Debug format.

use aws_sdk_sts::error::ProvideErrorMetadata;
use thiserror::Error;

/// AWS error categories used to decide whether to abort, skip or report
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// The account has no Business, Enterprise On-Ramp or Enterprise Support plan
    #[error("AWS Support API requires a Business, Enterprise On-Ramp or Enterprise Support plan")]
    SubscriptionRequired,

    /// Caller lacks permission for the operation
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// The account is not a member of an organization
    #[error("AWS Organizations is not set up for this account")]
    OrganizationsNotInUse,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if the Support API rejected the call for lack of a support plan
    pub fn is_subscription_required(&self) -> bool {
        matches!(self, AwsError::SubscriptionRequired)
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::SubscriptionRequired => suggestion_for_code("SubscriptionRequiredException"),
            AwsError::OrganizationsNotInUse => {
                suggestion_for_code("AWSOrganizationsNotInUseException")
            }
            AwsError::AccessDenied { .. } => suggestion_for_code("AccessDeniedException"),
            AwsError::Throttled => suggestion_for_code("ThrottlingException"),
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "NoSuchKey",
    "StackSetNotFoundException",
    "OperationNotFoundException",
    "ParentNotFoundException",
    "CaseIdNotFound",
];

/// Known AWS error codes for missing permissions
const ACCESS_DENIED_CODES: &[&str] = &["AccessDenied", "AccessDeniedException"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some("SubscriptionRequiredException") => AwsError::SubscriptionRequired,
        Some("AWSOrganizationsNotInUseException") => AwsError::OrganizationsNotInUse,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Wrap an SDK error so its classification can be recovered later.
///
/// The returned error displays the classified [`AwsError`] and keeps the
/// original SDK error as its source, so both `downcast_ref::<AwsError>()`
/// and the cause chain work.
pub fn into_aws_error<E>(err: E) -> anyhow::Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let classified = classify_aws_error(err.code(), err.message());
    anyhow::Error::new(err).context(classified)
}

/// Check whether any error in the chain is a Support subscription error
pub fn is_subscription_required(error: &anyhow::Error) -> bool {
    // Context layers are only visible through anyhow's own downcast.
    if let Some(aws) = error.downcast_ref::<AwsError>() {
        return aws.is_subscription_required();
    }
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<AwsError>())
        .any(AwsError::is_subscription_required)
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "SubscriptionRequiredException",
        "Upgrade to a Business, Enterprise On-Ramp, or Enterprise Support plan to use the AWS Support API.",
    ),
    (
        "AWSOrganizationsNotInUseException",
        "Run this from the management account of an AWS Organization.",
    ),
    (
        "AccessDeniedException",
        "Check the IAM permissions of the credentials in use.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit. Wait a moment and run the command again.",
    ),
    (
        "NameAlreadyExistsException",
        "A StackSet with this name already exists. Choose another name.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn subscription_required() {
        let err = classify_aws_error(Some("SubscriptionRequiredException"), Some("no plan"));
        assert!(err.is_subscription_required());
        assert!(err.suggestion().unwrap().contains("Business"));
    }

    #[test]
    fn access_denied_and_throttling() {
        assert!(matches!(
            classify_aws_error(Some("AccessDeniedException"), Some("nope")),
            AwsError::AccessDenied { .. }
        ));
        for code in THROTTLING_CODES {
            assert!(matches!(
                classify_aws_error(Some(code), None),
                AwsError::Throttled
            ));
        }
    }

    #[test]
    fn organizations_not_in_use() {
        let err = classify_aws_error(Some("AWSOrganizationsNotInUseException"), None);
        assert!(matches!(err, AwsError::OrganizationsNotInUse));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));
        assert!(err.suggestion().is_none());

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn subscription_detected_through_context() {
        let err = anyhow::Error::new(AwsError::SubscriptionRequired)
            .context("Failed to describe support cases");
        assert!(is_subscription_required(&err));

        let other = anyhow::Error::new(AwsError::Throttled).context("Failed");
        assert!(!is_subscription_required(&other));
    }

    #[test]
    fn suggestions_for_known_codes() {
        for (code, _) in SUGGESTIONS {
            assert!(
                suggestion_for_code(code).is_some(),
                "No suggestion for code: {code}"
            );
        }
        assert!(suggestion_for_code("SomeUnknownCode").is_none());
    }
}
