//! Campaign layer: the character, the roster, camps and the battle sequence

pub mod camp;
pub mod character;
pub mod game;
pub mod npc;
pub mod state;

pub use camp::{create_camp_state, perform_activity, resolve_camp_event, CampActivity, CampEventId, CampKind, CampState};
pub use character::{create_character, spend_glory_on_stat, BaseStats, PlayerCharacter, Stat};
pub use game::{conclude_battle, create_new_game, end_interlude, leave_camp, start_battle, BattleSummary, GameState};
pub use npc::{replace_dead_npcs, Npc, NpcRole};
pub use state::{
    advance_to_interlude, advance_to_post_battle, advance_to_pre_battle_camp, create_campaign_state,
    get_current_interlude, get_next_battle_entry, is_last_battle, CampaignConfig, CampaignEntry, CampaignPhase,
    CampaignState,
};
