/// Crawl request lifecycle states
///
/// `Queued → Processing → {Completed, Failed}`. Terminal states are absorbing.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Submitted and waiting for a worker to claim it
    Queued,

    /// Claimed by a worker; fetch and analysis in progress
    Processing,

    /// Analysis succeeded and the result was persisted
    Completed,

    /// Fetch, analysis or persistence failed for this attempt
    Failed,
}

impl RequestStatus {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal lifecycle step
    ///
    /// Re-writing the current status is always allowed so that status writes
    /// stay idempotent.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            Self::Queued => matches!(next, Self::Processing),
            Self::Processing => matches!(next, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses in lifecycle order
    pub fn all() -> [Self; 4] {
        [Self::Queued, Self::Processing, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_db_string())
    }
}
