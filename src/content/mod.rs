//! Battle and campaign definitions
//!
//! Registries are built explicitly and handed to the engines; nothing here is
//! global.

pub mod favorita;
pub mod italy;
pub mod rivoli;
pub mod validate;

use ahash::AHashMap;

use crate::battle::config::BattleConfig;
use crate::campaign::state::CampaignConfig;
use crate::core::error::ConfigError;
use crate::core::types::NpcId;

pub use validate::{validate_battle_config, validate_campaign};

#[derive(Debug, Default)]
pub struct ContentRegistry {
    battles: AHashMap<String, BattleConfig>,
    campaigns: AHashMap<String, CampaignConfig>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rivoli, La Favorita and the Italian campaign
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register_battle(rivoli::rivoli());
        registry.register_battle(favorita::favorita());
        registry.register_campaign(italy::italy());
        registry
    }

    pub fn register_battle(&mut self, config: BattleConfig) {
        self.battles.insert(config.id.clone(), config);
    }

    pub fn register_campaign(&mut self, config: CampaignConfig) {
        self.campaigns.insert(config.id.clone(), config);
    }

    pub fn battle(&self, id: &str) -> Result<&BattleConfig, ConfigError> {
        self.battles
            .get(id)
            .ok_or_else(|| ConfigError::UnknownBattle(id.to_string()))
    }

    pub fn campaign(&self, id: &str) -> Result<&CampaignConfig, ConfigError> {
        self.campaigns
            .get(id)
            .ok_or_else(|| ConfigError::UnknownCampaign(id.to_string()))
    }

    pub fn battle_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.battles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Every roster and replacement id across registered campaigns
    pub fn known_npcs(&self) -> Vec<NpcId> {
        self.campaigns
            .values()
            .flat_map(|c| c.roster.iter().chain(&c.replacement_pool))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Validate every registered battle and campaign
    pub fn validate(&self) -> Vec<String> {
        let known_npcs = self.known_npcs();
        let battle_ids = self.battle_ids();
        let mut errors: Vec<String> = Vec::new();
        for id in &battle_ids {
            if let Some(config) = self.battles.get(*id) {
                errors.extend(validate_battle_config(config, &known_npcs));
            }
        }
        for config in self.campaigns.values() {
            errors.extend(validate_campaign(config, &battle_ids));
        }
        for message in &errors {
            tracing::warn!(%message, "Content validation");
        }
        errors
    }
}
