//! Melee: stances, hit resolution, opponent AI and wave-driven encounters

pub mod ai;
pub mod hit;
pub mod resolution;
pub mod stance;
pub mod state;
pub mod waves;

pub use resolution::{
    available_actions, resolve_melee_exchange, resolve_melee_rout, ExchangeReport, PlayerMeleeInput,
};
pub use stance::{BodyPart, MeleeAction, Stance};
pub use state::{MeleeCombatant, MeleeOutcome, MeleeState, RoundEntry};
pub use waves::{build_melee_state, MeleeEncounter, WaveEvent};
