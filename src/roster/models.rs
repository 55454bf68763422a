use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Slot a participant occupies in one match. Only stable within that match.
pub type SlotIndex = u8;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantType {
    #[default]
    Human,
    Computer,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub slot_index: SlotIndex,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub connect_code: Option<String>,
    #[serde(default)]
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub character_id: Option<u16>,
}

impl Participant {
    pub fn new(slot_index: SlotIndex, display_name: impl Into<String>) -> Self {
        Self {
            slot_index,
            display_name: display_name.into(),
            connect_code: None,
            participant_type: ParticipantType::Human,
            character_id: None,
        }
    }

    pub fn with_connect_code(mut self, connect_code: impl Into<String>) -> Self {
        self.connect_code = Some(connect_code.into());
        self
    }

    pub fn with_type(mut self, participant_type: ParticipantType) -> Self {
        self.participant_type = participant_type;
        self
    }

    pub fn with_character(mut self, character_id: u16) -> Self {
        self.character_id = Some(character_id);
        self
    }
}

/// Participants of one match, in the order the source match lists them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRoster {
    pub participants: Vec<Participant>,
}

impl MatchRoster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant(&self, slot_index: SlotIndex) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.slot_index == slot_index)
    }
}

/// The key used to recognize the tracked player across matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIdentity {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub connect_code: String,
}

impl TrackedIdentity {
    pub fn new(display_name: impl Into<String>, connect_code: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            connect_code: connect_code.into(),
        }
    }

    pub fn by_connect_code(connect_code: impl Into<String>) -> Self {
        Self::new(String::new(), connect_code)
    }

    pub fn by_display_name(display_name: impl Into<String>) -> Self {
        Self::new(display_name, String::new())
    }
}
