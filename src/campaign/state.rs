//! Campaign progression
//!
//! A campaign is a fixed sequence of battles and interludes. The transition
//! functions here are pure and total: they accept any state, never panic and
//! return the next state. Phase checks belong to the game layer.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::campaign::npc::Npc;
use crate::core::types::NpcId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CampaignPhase {
    #[default]
    Prologue,
    Battle,
    PostBattleCamp,
    Interlude,
    PreBattleCamp,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CampaignEntry {
    Battle {
        #[serde(rename = "battleId")]
        battle_id: String,
    },
    Interlude { from: String, to: String },
}

impl CampaignEntry {
    pub fn battle(id: &str) -> Self {
        CampaignEntry::Battle {
            battle_id: id.to_string(),
        }
    }

    pub fn interlude(from: &str, to: &str) -> Self {
        CampaignEntry::Interlude {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn battle_id(&self) -> Option<&str> {
        match self {
            CampaignEntry::Battle { battle_id } => Some(battle_id),
            CampaignEntry::Interlude { .. } => None,
        }
    }
}

/// Key of the interlude between two battles
pub fn interlude_key(from: &str, to: &str) -> String {
    format!("{}-{}", from, to)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterludeDef {
    pub key: String,
    pub title: String,
    pub narrative: Vec<String>,
    /// Days of marching the interlude covers
    pub days: u32,
}

/// Static definition of a campaign
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub id: String,
    pub name: String,
    pub sequence: Vec<CampaignEntry>,
    pub interludes: AHashMap<String, InterludeDef>,
    /// NPCs the player starts with
    pub roster: Vec<Npc>,
    /// Replacements, drawn in order by role
    pub replacement_pool: Vec<Npc>,
}

impl CampaignConfig {
    pub fn battle_ids(&self) -> impl Iterator<Item = &str> {
        self.sequence.iter().filter_map(CampaignEntry::battle_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignState {
    pub campaign_id: String,
    /// Index into the campaign sequence
    pub sequence_index: usize,
    pub phase: CampaignPhase,
    pub battles_completed: u32,
    pub current_battle: String,
    pub next_battle: Option<String>,
    pub days_in_campaign: u32,
    /// Every roster NPC who has died, across the campaign
    pub npc_deaths: Vec<NpcId>,
    /// Every pool NPC already drawn as a replacement
    pub replacements_used: Vec<NpcId>,
}

fn battle_at_or_after(config: &CampaignConfig, index: usize) -> Option<(usize, &str)> {
    config
        .sequence
        .iter()
        .enumerate()
        .skip(index)
        .find_map(|(i, entry)| entry.battle_id().map(|id| (i, id)))
}

/// Point `current_battle`/`next_battle` at the battle at or after `index`
fn settle_on_battle(state: &mut CampaignState, config: &CampaignConfig, index: usize) {
    match battle_at_or_after(config, index) {
        Some((i, id)) => {
            state.sequence_index = i;
            state.current_battle = id.to_string();
            state.next_battle = battle_at_or_after(config, i + 1).map(|(_, id)| id.to_string());
        }
        None => {
            state.sequence_index = config.sequence.len();
            state.next_battle = None;
            state.phase = CampaignPhase::Complete;
        }
    }
}

pub fn create_campaign_state(config: &CampaignConfig) -> CampaignState {
    let mut state = CampaignState {
        campaign_id: config.id.clone(),
        phase: CampaignPhase::Prologue,
        ..Default::default()
    };
    settle_on_battle(&mut state, config, 0);
    state
}

/// Enter the current battle
pub fn begin_battle(state: &CampaignState, config: &CampaignConfig) -> CampaignState {
    let mut next = state.clone();
    settle_on_battle(&mut next, config, state.sequence_index);
    if next.phase != CampaignPhase::Complete {
        next.phase = CampaignPhase::Battle;
    }
    next
}

/// Leave the battle for the camp afterwards, or finish the campaign
pub fn advance_to_post_battle(state: &CampaignState, config: &CampaignConfig) -> CampaignState {
    let mut next = state.clone();
    next.battles_completed += 1;
    next.days_in_campaign += 1;
    next.phase = if is_last_battle(state, config) {
        CampaignPhase::Complete
    } else {
        CampaignPhase::PostBattleCamp
    };
    next
}

/// Step past the finished battle into the interlude, if there is one
pub fn advance_to_interlude(state: &CampaignState, config: &CampaignConfig) -> CampaignState {
    let mut next = state.clone();
    let index = state.sequence_index.saturating_add(1);
    match config.sequence.get(index) {
        Some(CampaignEntry::Interlude { .. }) => {
            next.sequence_index = index;
            next.phase = CampaignPhase::Interlude;
            if let Some(interlude) = get_current_interlude(&next, config) {
                next.days_in_campaign += interlude.days;
            }
        }
        Some(CampaignEntry::Battle { battle_id }) => {
            // no interlude between the two battles: an empty one, zero days
            next.next_battle = Some(battle_id.clone());
            next.phase = CampaignPhase::Interlude;
        }
        None => {
            next.sequence_index = config.sequence.len();
            next.next_battle = None;
            next.phase = CampaignPhase::Complete;
        }
    }
    next
}

/// Step past the interlude to the camp before the next battle
pub fn advance_to_pre_battle_camp(state: &CampaignState, config: &CampaignConfig) -> CampaignState {
    let mut next = state.clone();
    let index = match config.sequence.get(state.sequence_index) {
        Some(CampaignEntry::Interlude { .. }) => state.sequence_index + 1,
        _ => state.sequence_index.saturating_add(1),
    };
    settle_on_battle(&mut next, config, index);
    if next.phase != CampaignPhase::Complete {
        next.phase = CampaignPhase::PreBattleCamp;
    }
    next
}

/// Whether no battle follows the current sequence position
pub fn is_last_battle(state: &CampaignState, config: &CampaignConfig) -> bool {
    battle_at_or_after(config, state.sequence_index.saturating_add(1)).is_none()
}

/// The next battle entry after the current sequence position
pub fn get_next_battle_entry<'c>(state: &CampaignState, config: &'c CampaignConfig) -> Option<&'c CampaignEntry> {
    config
        .sequence
        .iter()
        .skip(state.sequence_index.saturating_add(1))
        .find(|entry| entry.battle_id().is_some())
}

/// The interlude at the current sequence position
pub fn get_current_interlude<'c>(state: &CampaignState, config: &'c CampaignConfig) -> Option<&'c InterludeDef> {
    match config.sequence.get(state.sequence_index)? {
        CampaignEntry::Interlude { from, to } => config.interludes.get(&interlude_key(from, to)),
        CampaignEntry::Battle { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentRegistry;

    #[test]
    fn test_create_points_at_first_battle() {
        let registry = ContentRegistry::standard();
        let config = registry.campaign("italy").unwrap();
        let state = create_campaign_state(config);
        assert_eq!(state.campaign_id, "italy");
        assert_eq!(state.phase, CampaignPhase::Prologue);
        assert_eq!(state.current_battle, "rivoli");
        assert_eq!(state.next_battle.as_deref(), Some("favorita"));
        assert_eq!(state.sequence_index, 0);
    }

    #[test]
    fn test_full_sequence() {
        let registry = ContentRegistry::standard();
        let config = registry.campaign("italy").unwrap();
        let state = create_campaign_state(config);

        let state = begin_battle(&state, config);
        assert_eq!(state.phase, CampaignPhase::Battle);
        assert!(!is_last_battle(&state, config));

        let state = advance_to_post_battle(&state, config);
        assert_eq!(state.phase, CampaignPhase::PostBattleCamp);
        assert_eq!(state.battles_completed, 1);

        let state = advance_to_interlude(&state, config);
        assert_eq!(state.phase, CampaignPhase::Interlude);
        let interlude = get_current_interlude(&state, config).unwrap();
        assert_eq!(interlude.key, "rivoli-favorita");

        let state = advance_to_pre_battle_camp(&state, config);
        assert_eq!(state.phase, CampaignPhase::PreBattleCamp);
        assert_eq!(state.current_battle, "favorita");
        assert_eq!(state.next_battle, None);
        assert!(is_last_battle(&state, config));
        assert!(get_next_battle_entry(&state, config).is_none());

        let state = begin_battle(&state, config);
        let state = advance_to_post_battle(&state, config);
        assert_eq!(state.phase, CampaignPhase::Complete);
        assert_eq!(state.battles_completed, 2);
    }

    #[test]
    fn test_transitions_are_total_past_the_end() {
        let registry = ContentRegistry::standard();
        let config = registry.campaign("italy").unwrap();
        let mut state = create_campaign_state(config);
        state.sequence_index = 99;

        let after = advance_to_interlude(&state, config);
        assert_eq!(after.phase, CampaignPhase::Complete);
        let after = advance_to_pre_battle_camp(&after, config);
        assert_eq!(after.phase, CampaignPhase::Complete);
        assert!(get_current_interlude(&after, config).is_none());
        assert!(is_last_battle(&after, config));
    }

    fn back_to_back() -> CampaignConfig {
        let mut config = ContentRegistry::standard().campaign("italy").unwrap().clone();
        config.sequence = vec![CampaignEntry::battle("rivoli"), CampaignEntry::battle("favorita")];
        config
    }

    #[test]
    fn test_back_to_back_battles_pass_through_interlude() {
        let config = back_to_back();
        let state = begin_battle(&create_campaign_state(&config), &config);
        let state = advance_to_post_battle(&state, &config);
        assert_eq!(state.phase, CampaignPhase::PostBattleCamp);

        let days = state.days_in_campaign;
        let state = advance_to_interlude(&state, &config);
        assert_eq!(state.phase, CampaignPhase::Interlude);
        assert_eq!(state.next_battle.as_deref(), Some("favorita"));
        assert_eq!(state.days_in_campaign, days);
        assert!(get_current_interlude(&state, &config).is_none());

        let state = advance_to_pre_battle_camp(&state, &config);
        assert_eq!(state.phase, CampaignPhase::PreBattleCamp);
        assert_eq!(state.current_battle, "favorita");
    }

    #[test]
    fn test_interlude_step_is_interlude_or_complete() {
        let registry = ContentRegistry::standard();
        let configs = [registry.campaign("italy").unwrap().clone(), back_to_back()];
        for config in &configs {
            for index in 0..config.sequence.len() + 2 {
                let mut state = create_campaign_state(config);
                state.sequence_index = index;
                let after = advance_to_interlude(&state, config);
                match after.phase {
                    CampaignPhase::Interlude => assert!(after.next_battle.is_some()),
                    CampaignPhase::Complete => {}
                    other => panic!("index {} left the campaign in {:?}", index, other),
                }
            }
        }
    }

    #[test]
    fn test_campaign_state_reads_sparse_json() {
        let state: CampaignState = serde_json::from_str(r#"{"campaignId":"italy"}"#).unwrap();
        assert_eq!(state.phase, CampaignPhase::Prologue);
        assert!(state.npc_deaths.is_empty());
    }
}
