use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::NodeKind;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The same path carries different node kinds in two records.
    #[error("Schema mismatch at `{path}`: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("Repository error: {0}")]
    Repository(String),
}

/// Why a single match was left out of an aggregate. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum MatchIssue {
    #[error("tracked player is not in this match")]
    IdentityNotFound,

    #[error("statistics unavailable: {reason}")]
    StatisticsUnavailable { reason: String },

    #[error("unsupported match with {participant_count} participants")]
    UnsupportedMatchShape { participant_count: usize },
}

impl MatchIssue {
    pub fn statistics_unavailable(reason: impl Into<String>) -> Self {
        MatchIssue::StatisticsUnavailable {
            reason: reason.into(),
        }
    }

    /// Unsupported matches are shown differently from missing data.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MatchIssue::UnsupportedMatchShape { .. })
    }
}
