use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::roster::{resolve_slot_indices, Participant, SlotIndex, TrackedIdentity};

use super::{
    aggregator::Aggregator,
    extractor::{extract_slot_statistics, group_by_slot, SlotExtraction},
    models::{AggregateStatistics, MatchRecord, SlotStatistics},
    repository::MatchRecordRepository,
    summary::PlayerSummary,
    MatchIssue, StatsError,
};

/// Only one-on-one matches can be attributed to a single opponent pairing.
pub const SUPPORTED_PARTICIPANT_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExclusion {
    pub match_index: usize,
    pub match_id: String,
    #[serde(flatten)]
    pub issue: MatchIssue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableLeaf {
    pub match_index: usize,
    pub match_id: String,
    pub path: String,
}

/// The aggregate for one tracked player plus what was left out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub aggregate: AggregateStatistics,
    pub selected_matches: usize,
    pub exclusions: Vec<MatchExclusion>,
    pub unavailable_leaves: Vec<UnavailableLeaf>,
    pub player: Option<PlayerSummary>,
}

impl AggregationReport {
    /// `(contributing, selected)`
    pub fn coverage(&self) -> (usize, usize) {
        (self.aggregate.matches, self.selected_matches)
    }

    pub fn coverage_label(&self) -> String {
        let (contributing, selected) = self.coverage();
        format!("aggregated over {contributing} of {selected} selected matches")
    }

    pub fn is_complete(&self) -> bool {
        self.exclusions.is_empty()
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &MatchExclusion> {
        self.exclusions
            .iter()
            .filter(|exclusion| exclusion.issue.is_unsupported())
    }
}

enum MatchEntry<'a> {
    Loaded(&'a MatchRecord),
    Failed { match_id: String, reason: String },
}

impl MatchEntry<'_> {
    fn match_id(&self) -> &str {
        match self {
            MatchEntry::Loaded(record) => &record.match_id,
            MatchEntry::Failed { match_id, .. } => match_id,
        }
    }
}

pub struct StatsService {
    repository: Arc<dyn MatchRecordRepository>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn MatchRecordRepository>) -> Self {
        Self { repository }
    }

    /// Loads the requested matches concurrently and aggregates them in the
    /// order given. A match that fails to load is reported as having no
    /// statistics.
    #[instrument(skip_all, fields(requested = match_ids.len()))]
    pub async fn aggregate_matches(
        &self,
        match_ids: &[String],
        identity: Option<&TrackedIdentity>,
    ) -> Result<AggregationReport, StatsError> {
        let loads = join_all(
            match_ids
                .iter()
                .map(|match_id| self.repository.load_match(match_id)),
        )
        .await;

        let records: Vec<Result<MatchRecord, (String, StatsError)>> = match_ids
            .iter()
            .zip(loads)
            .map(|(match_id, load)| load.map_err(|err| (match_id.clone(), err)))
            .collect();

        let entries: Vec<MatchEntry<'_>> = records
            .iter()
            .map(|record| match record {
                Ok(record) => MatchEntry::Loaded(record),
                Err((match_id, err)) => {
                    warn!(match_id = %match_id, ?err, "Failed to load match record");
                    MatchEntry::Failed {
                        match_id: match_id.clone(),
                        reason: err.to_string(),
                    }
                }
            })
            .collect();

        build_report(&entries, identity)
    }

    /// Aggregates every match the repository knows about.
    pub async fn aggregate_all(
        &self,
        identity: Option<&TrackedIdentity>,
    ) -> Result<AggregationReport, StatsError> {
        let match_ids = self.repository.list_matches().await?;
        self.aggregate_matches(&match_ids, identity).await
    }
}

/// Aggregates already-loaded match records for one tracked player.
///
/// Per-match problems never fail the call: the match is excluded and listed
/// in the report. Only a schema mismatch between matches is an error.
pub fn aggregate_records(
    records: &[MatchRecord],
    identity: Option<&TrackedIdentity>,
) -> Result<AggregationReport, StatsError> {
    let entries: Vec<MatchEntry<'_>> = records.iter().map(MatchEntry::Loaded).collect();
    build_report(&entries, identity)
}

fn build_report(
    entries: &[MatchEntry<'_>],
    identity: Option<&TrackedIdentity>,
) -> Result<AggregationReport, StatsError> {
    let loaded: Vec<&MatchRecord> = entries
        .iter()
        .filter_map(|entry| match entry {
            MatchEntry::Loaded(record) => Some(*record),
            MatchEntry::Failed { .. } => None,
        })
        .collect();
    let mut slots = resolve_slot_indices(loaded.iter().map(|record| &record.roster), identity)
        .into_iter();

    let mut aggregator = Aggregator::new();
    let mut exclusions = Vec::new();
    let mut unavailable_leaves = Vec::new();
    let mut tracked: Vec<&Participant> = Vec::new();

    for (match_index, entry) in entries.iter().enumerate() {
        let outcome = match entry {
            MatchEntry::Loaded(record) => {
                let slot = slots.next().flatten();
                evaluate_match(record, slot)
            }
            MatchEntry::Failed { reason, .. } => Err(MatchIssue::statistics_unavailable(reason)),
        };

        match outcome {
            Ok((participant, extraction)) => {
                aggregator.add(&extraction.statistics)?;
                tracked.push(participant);
                unavailable_leaves.extend(extraction.unavailable_leaves.into_iter().map(|path| {
                    UnavailableLeaf {
                        match_index,
                        match_id: entry.match_id().to_string(),
                        path,
                    }
                }));
            }
            Err(issue) => {
                debug!(match_index, match_id = entry.match_id(), ?issue, "Excluding match");
                exclusions.push(MatchExclusion {
                    match_index,
                    match_id: entry.match_id().to_string(),
                    issue,
                });
            }
        }
    }

    let mut aggregate = aggregator.finish();
    if aggregate.matches == 0 {
        // Nothing contributed; show the schema at zero instead of an empty tree.
        if let Some(template) = schema_template(&loaded) {
            aggregate = Aggregator::seeded(&template).finish();
        }
    }

    let report = AggregationReport {
        aggregate,
        selected_matches: entries.len(),
        exclusions,
        unavailable_leaves,
        player: PlayerSummary::from_participants(tracked),
    };

    info!(
        contributing = report.aggregate.matches,
        selected = report.selected_matches,
        excluded = report.exclusions.len(),
        "Aggregated match statistics"
    );

    Ok(report)
}

fn evaluate_match(
    record: &MatchRecord,
    slot: Option<SlotIndex>,
) -> Result<(&Participant, SlotExtraction), MatchIssue> {
    let participant_count = record.roster.len();
    if participant_count != SUPPORTED_PARTICIPANT_COUNT {
        return Err(MatchIssue::UnsupportedMatchShape { participant_count });
    }

    let participant = slot
        .and_then(|slot| record.roster.participant(slot))
        .ok_or(MatchIssue::IdentityNotFound)?;

    let statistics = record
        .statistics
        .as_ref()
        .ok_or_else(|| MatchIssue::statistics_unavailable("no statistics computed for match"))?;

    Ok((
        participant,
        extract_slot_statistics(Some(statistics), Some(participant.slot_index)),
    ))
}

/// Any slot of the first supported match with statistics. Only used when no
/// match contributed, so it never merges with real data.
fn schema_template(records: &[&MatchRecord]) -> Option<SlotStatistics> {
    records
        .iter()
        .filter(|record| record.roster.len() == SUPPORTED_PARTICIPANT_COUNT)
        .find_map(|record| record.statistics.as_ref())
        .and_then(|statistics| group_by_slot(statistics).into_values().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{MatchRoster, Participant};
    use crate::stats::models::{MatchStatistics, SlotRecord, StatGroup, StatNode};
    use crate::stats::repository::InMemoryMatchRecordRepository;

    fn one_on_one(match_id: &str, tracked_slot: SlotIndex, kills: f64) -> MatchRecord {
        let other_slot = if tracked_slot == 0 { 1 } else { 0 };
        let roster = MatchRoster::new(vec![
            Participant::new(0, if tracked_slot == 0 { "Alice" } else { "Bob" }),
            Participant::new(1, if tracked_slot == 1 { "Alice" } else { "Bob" }),
        ]);
        let statistics = MatchStatistics::new().with_group(
            "overall",
            StatGroup::PerSlot {
                entries: vec![
                    SlotRecord {
                        slot_index: tracked_slot,
                        fields: [("kill_count".to_string(), StatNode::count(kills))]
                            .into_iter()
                            .collect(),
                    },
                    SlotRecord {
                        slot_index: other_slot,
                        fields: [("kill_count".to_string(), StatNode::count(100.0))]
                            .into_iter()
                            .collect(),
                    },
                ],
            },
        );
        MatchRecord::new(match_id, roster, Some(statistics))
    }

    fn alice() -> TrackedIdentity {
        TrackedIdentity::by_display_name("Alice")
    }

    #[test]
    fn follows_the_player_across_slots() {
        let report = aggregate_records(
            &[one_on_one("m1", 1, 3.0), one_on_one("m2", 0, 5.0)],
            Some(&alice()),
        )
        .unwrap();

        assert_eq!(
            report
                .aggregate
                .counter("overall", "kill_count")
                .and_then(StatNode::as_count),
            Some(8.0)
        );
        assert!(report.is_complete());
        assert_eq!(report.coverage(), (2, 2));
        assert_eq!(report.player.unwrap().label, "Alice");
    }

    #[test]
    fn missing_statistics_are_excluded_and_reported() {
        let mut broken = one_on_one("m2", 0, 5.0);
        broken.statistics = None;

        let report = aggregate_records(
            &[one_on_one("m1", 1, 3.0), broken],
            Some(&alice()),
        )
        .unwrap();

        assert_eq!(
            report
                .aggregate
                .counter("overall", "kill_count")
                .and_then(StatNode::as_count),
            Some(3.0)
        );
        assert_eq!(report.exclusions.len(), 1);
        assert_eq!(report.exclusions[0].match_index, 1);
        assert!(matches!(
            report.exclusions[0].issue,
            MatchIssue::StatisticsUnavailable { .. }
        ));
        assert_eq!(
            report.coverage_label(),
            "aggregated over 1 of 2 selected matches"
        );
    }

    #[test]
    fn no_identity_excludes_everything_but_keeps_schema() {
        let report = aggregate_records(&[one_on_one("m1", 0, 2.0)], None).unwrap();

        assert_eq!(report.exclusions[0].issue, MatchIssue::IdentityNotFound);
        assert_eq!(report.aggregate.matches, 0);
        assert_eq!(
            report
                .aggregate
                .counter("overall", "kill_count")
                .and_then(StatNode::as_count),
            Some(0.0)
        );
        assert!(report.player.is_none());
    }

    #[tokio::test]
    async fn load_failures_become_exclusions() {
        let repo = Arc::new(InMemoryMatchRecordRepository::with_records(vec![
            one_on_one("m1", 0, 4.0),
        ]));
        let service = StatsService::new(repo);

        let report = service
            .aggregate_matches(&["m1".to_string(), "gone".to_string()], Some(&alice()))
            .await
            .unwrap();

        assert_eq!(report.coverage(), (1, 2));
        assert_eq!(report.exclusions[0].match_id, "gone");
        assert!(matches!(
            report.exclusions[0].issue,
            MatchIssue::StatisticsUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn aggregate_all_uses_every_listed_match() {
        let repo = Arc::new(InMemoryMatchRecordRepository::with_records(vec![
            one_on_one("m1", 0, 1.0),
            one_on_one("m2", 1, 2.0),
        ]));
        let service = StatsService::new(repo);

        let report = service.aggregate_all(Some(&alice())).await.unwrap();
        assert_eq!(report.coverage(), (2, 2));
    }

    fn with_overall_field(
        mut record: MatchRecord,
        slot_index: SlotIndex,
        name: &str,
        node: StatNode,
    ) -> MatchRecord {
        if let Some(StatGroup::PerSlot { entries }) = record
            .statistics
            .as_mut()
            .and_then(|statistics| statistics.groups.get_mut("overall"))
        {
            if let Some(entry) = entries.iter_mut().find(|e| e.slot_index == slot_index) {
                entry.fields.insert(name.to_string(), node);
            }
        }
        record
    }

    #[test]
    fn excluded_match_with_other_field_kinds_does_not_fail_the_batch() {
        let mut stranger = one_on_one("stranger", 0, 1.0);
        stranger.roster = MatchRoster::new(vec![
            Participant::new(0, "Carol"),
            Participant::new(1, "Dave"),
        ]);
        let stranger = with_overall_field(stranger, 0, "openings", StatNode::count(7.0));
        let tracked = with_overall_field(
            one_on_one("m2", 1, 2.0),
            1,
            "openings",
            StatNode::ratio(1.0, 4.0),
        );

        let report = aggregate_records(&[stranger, tracked], Some(&alice())).unwrap();

        assert_eq!(report.exclusions[0].issue, MatchIssue::IdentityNotFound);
        assert_eq!(
            report.aggregate.counter("overall", "openings"),
            Some(&StatNode::ratio(1.0, 4.0))
        );
    }

    #[test]
    fn opponent_only_fields_stay_out_of_the_aggregate() {
        let record = with_overall_field(
            one_on_one("m1", 1, 2.0),
            0,
            "opponent_only",
            StatNode::count(3.0),
        );

        let report = aggregate_records(&[record], Some(&alice())).unwrap();

        assert_eq!(
            report
                .aggregate
                .counter("overall", "kill_count")
                .and_then(StatNode::as_count),
            Some(2.0)
        );
        assert!(report.aggregate.counter("overall", "opponent_only").is_none());
    }

    #[test]
    fn unavailable_leaves_are_tagged_with_their_match() {
        let first = with_overall_field(
            one_on_one("m1", 0, 1.0),
            0,
            "neutral_win_ratio",
            StatNode::ratio(1.0, 2.0),
        );
        let second = with_overall_field(
            one_on_one("m2", 1, 1.0),
            1,
            "neutral_win_ratio",
            StatNode::Unavailable,
        );

        let report = aggregate_records(&[first, second], Some(&alice())).unwrap();

        assert_eq!(
            report.unavailable_leaves,
            vec![UnavailableLeaf {
                match_index: 1,
                match_id: "m2".to_string(),
                path: "overall.neutral_win_ratio".to_string(),
            }]
        );
        assert_eq!(
            report.aggregate.counter("overall", "neutral_win_ratio"),
            Some(&StatNode::ratio(1.0, 2.0))
        );
        assert_eq!(report.coverage(), (2, 2));
    }
}
