use serde::{Deserialize, Serialize};

use crate::roster::{Participant, ParticipantType};

/// Header information for the tracked player over the aggregated matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Display name, else connect code, else a generic label.
    pub label: String,
    pub connect_code: Option<String>,
    /// Character used in each contributing match, in match order.
    pub characters: Vec<Option<u16>>,
}

impl PlayerSummary {
    /// Built from the tracked player's roster entry in each contributing
    /// match. The label and code come from the first match.
    pub fn from_participants<'a, I>(participants: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Participant>,
    {
        let mut participants = participants.into_iter().peekable();
        let first = participants.peek().copied()?;

        let connect_code = first
            .connect_code
            .clone()
            .filter(|code| !code.is_empty());
        let label = if !first.display_name.is_empty() {
            first.display_name.clone()
        } else if let Some(code) = &connect_code {
            code.clone()
        } else {
            fallback_label(first.participant_type).to_string()
        };

        Some(Self {
            label,
            connect_code,
            characters: participants.map(|p| p.character_id).collect(),
        })
    }
}

fn fallback_label(participant_type: ParticipantType) -> &'static str {
    match participant_type {
        ParticipantType::Computer => "CPU",
        ParticipantType::Human | ParticipantType::Demo => "Player",
    }
}
