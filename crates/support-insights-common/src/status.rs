//! StackSet operation status
//!
//! Mirrors the `Status` reported by `DescribeStackSetOperation` so the
//! poller can decide when an operation is finished without depending on the
//! CloudFormation SDK types.

/// Status of a StackSet operation
///
/// `Succeeded`, `Failed` and `Stopped` are terminal; everything else keeps
/// the poller waiting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(ascii_case_insensitive, serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Stopping,
    Stopped,
}

impl OperationStatus {
    /// Check if the status represents a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }

    /// Check if the operation finished successfully
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }

    /// Parse from string, returning None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}
