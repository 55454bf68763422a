pub mod aggregator;
pub mod extractor;
pub mod repository;
pub mod service;
pub mod summary;

mod errors;
pub mod models;

pub use aggregator::{aggregate, Aggregator};
pub use errors::{MatchIssue, StatsError};
pub use extractor::{extract_slot_statistics, group_by_slot, SlotExtraction};
pub use models::*;
pub use repository::{InMemoryMatchRecordRepository, JsonDirectoryRepository, MatchRecordRepository};
pub use service::{
    aggregate_records, AggregationReport, MatchExclusion, StatsService, UnavailableLeaf,
};
pub use summary::PlayerSummary;
