use std::collections::BTreeMap;

use matchstats::{
    stats::{SlotEvent, SlotRecord, StatFields, StatGroup},
    MatchRecord, MatchRoster, MatchStatistics, Participant, SlotIndex, StatNode,
};
use serde_json::json;

// ============================================================================
// Match Record Builder
// ============================================================================

pub struct MatchBuilder {
    match_id: String,
    participants: Vec<Participant>,
    per_slot: BTreeMap<String, Vec<SlotRecord>>,
    events: BTreeMap<String, Vec<SlotEvent>>,
    without_statistics: bool,
}

impl MatchBuilder {
    pub fn new(match_id: &str) -> Self {
        Self {
            match_id: match_id.to_string(),
            participants: vec![],
            per_slot: BTreeMap::new(),
            events: BTreeMap::new(),
            without_statistics: false,
        }
    }

    pub fn with_player(mut self, slot_index: SlotIndex, name: &str, code: &str) -> Self {
        self.participants
            .push(Participant::new(slot_index, name).with_connect_code(code));
        self
    }

    /// Two named players in slots 0 and 1.
    pub fn one_on_one(self, first: (&str, &str), second: (&str, &str)) -> Self {
        self.with_player(0, first.0, first.1)
            .with_player(1, second.0, second.1)
    }

    pub fn with_counters(
        mut self,
        group: &str,
        slot_index: SlotIndex,
        fields: Vec<(&str, StatNode)>,
    ) -> Self {
        let fields: StatFields = fields
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect();
        self.per_slot
            .entry(group.to_string())
            .or_default()
            .push(SlotRecord { slot_index, fields });
        self
    }

    pub fn with_event(mut self, group: &str, slot_index: SlotIndex, tag: &str) -> Self {
        self.events
            .entry(group.to_string())
            .or_default()
            .push(SlotEvent {
                slot_index,
                payload: json!({ "tag": tag })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            });
        self
    }

    pub fn without_statistics(mut self) -> Self {
        self.without_statistics = true;
        self
    }

    pub fn build(self) -> MatchRecord {
        let statistics = (!self.without_statistics).then(|| {
            let mut statistics = MatchStatistics::new();
            for (group, entries) in self.per_slot {
                statistics = statistics.with_group(group, StatGroup::PerSlot { entries });
            }
            for (group, events) in self.events {
                statistics = statistics.with_group(group, StatGroup::Events { events });
            }
            statistics
        });

        MatchRecord::new(self.match_id, MatchRoster::new(self.participants), statistics)
    }
}
