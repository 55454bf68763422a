pub mod models;
pub mod resolver;

pub use models::{MatchRoster, Participant, ParticipantType, SlotIndex, TrackedIdentity};
pub use resolver::{resolve_slot_index, resolve_slot_indices};
