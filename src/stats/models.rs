use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};

use crate::roster::{MatchRoster, SlotIndex};

/// Named children of a `Group` node, and the top level of every counter group.
pub type StatFields = BTreeMap<String, StatNode>;

/// Numerator/denominator pair whose `ratio` is always derived from the two sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub count: f64,
    pub total: f64,
    pub ratio: Option<f64>,
}

impl Ratio {
    pub fn new(count: f64, total: f64) -> Self {
        Self {
            count,
            total,
            ratio: (total > 0.0).then(|| count / total),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Sums numerator and denominator, then recomputes the ratio.
    pub fn accumulate(&mut self, other: &Ratio) {
        *self = Self::new(self.count + other.count, self.total + other.total);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Count,
    Ratio,
    Group,
    Unavailable,
}

/// One node of a statistics tree.
///
/// Ratios are their own variant so a group that merely has fields named
/// `count` and `total` is never mistaken for one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatNode {
    Count { value: f64 },
    Ratio(Ratio),
    Group { fields: StatFields },
    /// A leaf present in the input whose data could not be read.
    Unavailable,
}

impl StatNode {
    pub fn count(value: f64) -> Self {
        StatNode::Count { value }
    }

    pub fn ratio(count: f64, total: f64) -> Self {
        StatNode::Ratio(Ratio::new(count, total))
    }

    pub fn group<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, StatNode)>,
    {
        StatNode::Group {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            StatNode::Count { .. } => NodeKind::Count,
            StatNode::Ratio(_) => NodeKind::Ratio,
            StatNode::Group { .. } => NodeKind::Group,
            StatNode::Unavailable => NodeKind::Unavailable,
        }
    }

    pub fn as_count(&self) -> Option<f64> {
        match self {
            StatNode::Count { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_ratio(&self) -> Option<&Ratio> {
        match self {
            StatNode::Ratio(ratio) => Some(ratio),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&StatNode> {
        match self {
            StatNode::Group { fields } => fields.get(name),
            _ => None,
        }
    }

    /// Same shape with every count at zero and every ratio at `{0, 0, null}`.
    pub fn zeroed(&self) -> Self {
        match self {
            StatNode::Count { .. } => StatNode::count(0.0),
            StatNode::Ratio(_) => StatNode::Ratio(Ratio::zero()),
            StatNode::Group { fields } => StatNode::Group {
                fields: zeroed_fields(fields),
            },
            StatNode::Unavailable => StatNode::Unavailable,
        }
    }
}

pub(crate) fn zeroed_fields(fields: &StatFields) -> StatFields {
    fields
        .iter()
        .filter(|(_, node)| !matches!(node, StatNode::Unavailable))
        .map(|(name, node)| (name.clone(), node.zeroed()))
        .collect()
}

/// Wire form of `StatNode`. A ratio may arrive without one of its halves;
/// such a leaf is kept as `Unavailable` instead of failing the whole record.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawStatNode {
    Count {
        value: f64,
    },
    Ratio {
        #[serde(default)]
        count: Option<f64>,
        #[serde(default)]
        total: Option<f64>,
    },
    Group {
        #[serde(default)]
        fields: StatFields,
    },
    Unavailable,
}

impl From<RawStatNode> for StatNode {
    fn from(raw: RawStatNode) -> Self {
        match raw {
            RawStatNode::Count { value } => StatNode::Count { value },
            RawStatNode::Ratio {
                count: Some(count),
                total: Some(total),
            } => StatNode::ratio(count, total),
            RawStatNode::Ratio { .. } => StatNode::Unavailable,
            RawStatNode::Group { fields } => StatNode::Group { fields },
            RawStatNode::Unavailable => StatNode::Unavailable,
        }
    }
}

impl<'de> Deserialize<'de> for StatNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawStatNode::deserialize(deserializer).map(StatNode::from)
    }
}

/// One slot's counters inside a slot-indexed group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub slot_index: SlotIndex,
    #[serde(default)]
    pub fields: StatFields,
}

/// A single event (stock loss, combo, conversion) owned by one slot.
/// The payload is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEvent {
    pub slot_index: SlotIndex,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatGroup {
    /// At most one record per slot, e.g. `overall` or `action_counts`.
    PerSlot { entries: Vec<SlotRecord> },
    /// Any number of events per slot, e.g. `stocks` or `combos`.
    Events { events: Vec<SlotEvent> },
}

/// Statistics computed for one match, keyed by group name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchStatistics {
    pub groups: BTreeMap<String, StatGroup>,
}

impl MatchStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: impl Into<String>, group: StatGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }
}

/// The statistics belonging to a single slot of a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotStatistics {
    #[serde(default)]
    pub counters: BTreeMap<String, StatFields>,
    #[serde(default)]
    pub events: BTreeMap<String, Vec<SlotEvent>>,
}

impl SlotStatistics {
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.events.is_empty()
    }

    pub fn counter(&self, group: &str, field: &str) -> Option<&StatNode> {
        self.counters.get(group)?.get(field)
    }

    pub fn with_counters<K, I>(mut self, group: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, StatNode)>,
    {
        self.counters.insert(
            group.into(),
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        );
        self
    }

    pub fn with_events(mut self, group: impl Into<String>, events: Vec<SlotEvent>) -> Self {
        self.events.insert(group.into(), events);
        self
    }
}

/// The tracked player's statistics summed over every contributing match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    pub matches: usize,
    pub counters: BTreeMap<String, StatFields>,
    pub events: BTreeMap<String, Vec<SlotEvent>>,
}

impl AggregateStatistics {
    pub fn counter(&self, group: &str, field: &str) -> Option<&StatNode> {
        self.counters.get(group)?.get(field)
    }
}

/// Everything the match-record provider hands over for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub roster: MatchRoster,
    /// `None` when statistics could not be computed for the match.
    #[serde(default)]
    pub statistics: Option<MatchStatistics>,
}

impl MatchRecord {
    pub fn new(
        match_id: impl Into<String>,
        roster: MatchRoster,
        statistics: Option<MatchStatistics>,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            roster,
            statistics,
        }
    }
}
