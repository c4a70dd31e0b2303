//! Stat tiers and dice checks shared by every engine

pub mod rolls;
pub mod thresholds;

pub use rolls::{
    roll_stat, roll_target, roll_valor, valor_difficulty, Difficulty, RngRolls, RollGrade,
    RollResult, RollSource, ScriptedRolls,
};
pub use thresholds::{
    get_fatigue_tier, get_fatigue_tier_fill, get_health_state, get_morale_threshold,
    get_stamina_tier, health_pool_size, stamina_pool_size, FatigueTier, HealthState,
    MoraleThreshold,
};
