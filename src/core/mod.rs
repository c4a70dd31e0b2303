pub mod config;
pub mod error;
pub mod types;

pub use config::EngineTuning;
pub use error::{BattleError, CampaignError, ConfigError, GameError, Result};
