use std::collections::BTreeMap;

use serde::Serialize;

use crate::roster::SlotIndex;

use super::models::{MatchStatistics, SlotStatistics, StatFields, StatGroup, StatNode};

/// One slot's statistics plus the leaves that had to be dropped on the way out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotExtraction {
    pub statistics: SlotStatistics,
    /// Dotted paths (`group.field.subfield`) of `Unavailable` leaves.
    pub unavailable_leaves: Vec<String>,
}

/// Pulls the sub-tree belonging to `slot` out of one match's statistics.
///
/// Slot-indexed groups are keyed by the literal `slot_index` of each entry,
/// not by position, and event groups keep every event of the slot in order.
/// A missing slot or missing statistics yields an empty extraction so the
/// match simply contributes nothing.
pub fn extract_slot_statistics(
    statistics: Option<&MatchStatistics>,
    slot: Option<SlotIndex>,
) -> SlotExtraction {
    let (Some(statistics), Some(slot)) = (statistics, slot) else {
        return SlotExtraction::default();
    };

    let mut extraction = SlotExtraction::default();

    for (group_name, group) in &statistics.groups {
        match group {
            StatGroup::PerSlot { entries } => {
                // Last entry wins if a slot is listed twice.
                let Some(record) = entries.iter().rev().find(|entry| entry.slot_index == slot)
                else {
                    continue;
                };
                let fields = prune_unavailable(
                    &record.fields,
                    group_name,
                    &mut extraction.unavailable_leaves,
                );
                extraction
                    .statistics
                    .counters
                    .insert(group_name.clone(), fields);
            }
            StatGroup::Events { events } => {
                let owned: Vec<_> = events
                    .iter()
                    .filter(|event| event.slot_index == slot)
                    .cloned()
                    .collect();
                if !owned.is_empty() {
                    extraction
                        .statistics
                        .events
                        .insert(group_name.clone(), owned);
                }
            }
        }
    }

    extraction
}

/// Splits one match into per-slot sub-records, keyed by every slot that
/// appears in any group.
pub fn group_by_slot(statistics: &MatchStatistics) -> BTreeMap<SlotIndex, SlotStatistics> {
    let mut slots: Vec<SlotIndex> = statistics
        .groups
        .values()
        .flat_map(|group| -> Vec<SlotIndex> {
            match group {
                StatGroup::PerSlot { entries } => entries.iter().map(|e| e.slot_index).collect(),
                StatGroup::Events { events } => events.iter().map(|e| e.slot_index).collect(),
            }
        })
        .collect();
    slots.sort_unstable();
    slots.dedup();

    slots
        .into_iter()
        .map(|slot| {
            let extraction = extract_slot_statistics(Some(statistics), Some(slot));
            (slot, extraction.statistics)
        })
        .collect()
}

fn prune_unavailable(fields: &StatFields, path: &str, dropped: &mut Vec<String>) -> StatFields {
    let mut kept = StatFields::new();
    for (name, node) in fields {
        let node_path = format!("{path}.{name}");
        match node {
            StatNode::Unavailable => dropped.push(node_path),
            StatNode::Group { fields } => {
                let fields = prune_unavailable(fields, &node_path, dropped);
                kept.insert(name.clone(), StatNode::Group { fields });
            }
            leaf => {
                kept.insert(name.clone(), leaf.clone());
            }
        }
    }
    kept
}
