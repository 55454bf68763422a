use std::collections::BTreeMap;

use super::models::{
    zeroed_fields, AggregateStatistics, SlotEvent, SlotStatistics, StatFields, StatNode,
};
use super::StatsError;

/// Sums per-slot statistics from any number of matches.
///
/// Counts are added, ratios have their numerators and denominators added
/// and the ratio recomputed, and groups are merged field by field over the
/// union of their keys. Event lists are appended in the order matches are
/// added.
///
/// Leaves are `f64`. Whole-number counts sum exactly in any order; fractional
/// ones (damage) may differ in the last bits when matches are reordered.
#[derive(Debug, Default)]
pub struct Aggregator {
    counters: BTreeMap<String, StatFields>,
    events: BTreeMap<String, Vec<SlotEvent>>,
    matches: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `template` with every leaf zeroed, so groups the template
    /// knows about show up even when no match contributes to them.
    pub fn seeded(template: &SlotStatistics) -> Self {
        Self {
            counters: template
                .counters
                .iter()
                .map(|(group, fields)| (group.clone(), zeroed_fields(fields)))
                .collect(),
            events: template
                .events
                .keys()
                .map(|group| (group.clone(), Vec::new()))
                .collect(),
            matches: 0,
        }
    }

    pub fn add(&mut self, slot: &SlotStatistics) -> Result<(), StatsError> {
        for (group, fields) in &slot.counters {
            let target = self.counters.entry(group.clone()).or_default();
            merge_fields(target, fields, group)?;
        }
        for (group, events) in &slot.events {
            self.events
                .entry(group.clone())
                .or_default()
                .extend(events.iter().cloned());
        }
        self.matches += 1;
        Ok(())
    }

    pub fn finish(self) -> AggregateStatistics {
        AggregateStatistics {
            matches: self.matches,
            counters: self.counters,
            events: self.events,
        }
    }
}

/// Aggregates a batch of per-slot statistics, one entry per match.
pub fn aggregate(slots: &[SlotStatistics]) -> Result<AggregateStatistics, StatsError> {
    let mut aggregator = Aggregator::new();
    for slot in slots {
        aggregator.add(slot)?;
    }
    Ok(aggregator.finish())
}

fn merge_fields(target: &mut StatFields, source: &StatFields, path: &str) -> Result<(), StatsError> {
    for (name, node) in source {
        let node_path = format!("{path}.{name}");
        match target.get_mut(name) {
            Some(existing) => merge_node(existing, node, &node_path)?,
            None => {
                if let Some(seed) = fresh_node(node) {
                    target.insert(name.clone(), seed);
                }
            }
        }
    }
    Ok(())
}

fn merge_node(target: &mut StatNode, source: &StatNode, path: &str) -> Result<(), StatsError> {
    match (target, source) {
        (_, StatNode::Unavailable) => Ok(()),
        (target @ StatNode::Unavailable, source) => {
            if let Some(seed) = fresh_node(source) {
                *target = seed;
            }
            Ok(())
        }
        (StatNode::Count { value }, StatNode::Count { value: other }) => {
            *value += other;
            Ok(())
        }
        (StatNode::Ratio(ratio), StatNode::Ratio(other)) => {
            ratio.accumulate(other);
            Ok(())
        }
        (StatNode::Group { fields }, StatNode::Group { fields: other }) => {
            merge_fields(fields, other, path)
        }
        (target, source) => Err(StatsError::SchemaMismatch {
            path: path.to_string(),
            expected: target.kind(),
            found: source.kind(),
        }),
    }
}

/// First contribution to a path: copied with ratios recomputed and
/// unavailable leaves left out.
fn fresh_node(source: &StatNode) -> Option<StatNode> {
    match source {
        StatNode::Unavailable => None,
        StatNode::Ratio(ratio) => Some(StatNode::ratio(ratio.count, ratio.total)),
        StatNode::Group { fields } => {
            let mut seeded = StatFields::new();
            for (name, node) in fields {
                if let Some(node) = fresh_node(node) {
                    seeded.insert(name.clone(), node);
                }
            }
            Some(StatNode::Group { fields: seeded })
        }
        count @ StatNode::Count { .. } => Some(count.clone()),
    }
}
