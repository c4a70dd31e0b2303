//! Battle system - scripted line volleys, story beats and the melee hand-off
//!
//! A battle is a sequence of parts. Each part is a table of volleys; a volley
//! may be followed by the next one, a story beat or a melee. Beats decide
//! where the battle goes next.

pub mod config;
pub mod execution;
pub mod gorge;
pub mod state;
pub mod story;
pub mod volley;

// Re-exports for convenient access
pub use config::{BattleConfig, BattleKind, BattlePart, FollowUp, GorgeVolley, PartKind, ScriptedVolley};
pub use execution::{advance, apply_grace_or_death, auto_command, create_battle_state, BattleCommand, StepReport};
pub use gorge::{resolve_auto_gorge_volley, GorgeTarget};
pub use state::{
    BattleExt, BattleOutcome, BattlePhase, BattlePlayer, BattleState, DrillStep, EnemyQuality, EnemyState,
    FavoritaExt, LineMember, LinePost, LineState, RivoliExt, StoryBeatId,
};
pub use story::{available_choices, beat_narrative, resolve_story_beat, Choice, ChoiceId, StoryBeatDef};
pub use volley::{resolve_scripted_volley, VolleyResult};
