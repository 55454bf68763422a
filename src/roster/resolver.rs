use super::models::{MatchRoster, Participant, SlotIndex, TrackedIdentity};

type IdentityPredicate = fn(&Participant, &TrackedIdentity) -> bool;

/// Checked in this order against each participant; any hit claims the participant.
const IDENTITY_PREDICATES: [IdentityPredicate; 2] = [display_name_matches, connect_code_matches];

fn display_name_matches(participant: &Participant, identity: &TrackedIdentity) -> bool {
    !identity.display_name.is_empty() && participant.display_name == identity.display_name
}

fn connect_code_matches(participant: &Participant, identity: &TrackedIdentity) -> bool {
    !identity.connect_code.is_empty()
        && participant.connect_code.as_deref() == Some(identity.connect_code.as_str())
}

fn is_tracked(participant: &Participant, identity: &TrackedIdentity) -> bool {
    IDENTITY_PREDICATES
        .iter()
        .any(|predicate| predicate(participant, identity))
}

/// Finds the slot the tracked player occupies in one match.
///
/// Participants are checked in roster order and the first one matching
/// either the display name or the connect code wins. Returns `None` when
/// no identity is supplied or nobody in the roster matches.
pub fn resolve_slot_index(
    roster: &MatchRoster,
    identity: Option<&TrackedIdentity>,
) -> Option<SlotIndex> {
    let identity = identity?;
    roster
        .participants
        .iter()
        .find(|participant| is_tracked(participant, identity))
        .map(|participant| participant.slot_index)
}

/// Resolves every roster independently. The output lines up with `rosters`;
/// unresolved matches stay in place as `None`.
pub fn resolve_slot_indices<'a, I>(
    rosters: I,
    identity: Option<&TrackedIdentity>,
) -> Vec<Option<SlotIndex>>
where
    I: IntoIterator<Item = &'a MatchRoster>,
{
    rosters
        .into_iter()
        .map(|roster| resolve_slot_index(roster, identity))
        .collect()
}
