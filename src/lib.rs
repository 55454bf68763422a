// Library crate for cross-match replay statistics
// Resolves the tracked player in every match and sums their statistics

pub mod config;
pub mod roster;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use roster::{MatchRoster, Participant, ParticipantType, SlotIndex, TrackedIdentity};
pub use stats::{
    aggregate_records, AggregateStatistics, AggregationReport, MatchIssue, MatchRecord,
    MatchStatistics, StatNode, StatsError, StatsService,
};
