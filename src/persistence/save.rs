//! Versioned game saves
//!
//! A save is an envelope `{version, gameState, timestamp}` under
//! `the_little_soldier_save`, suffixed `_p1`..`_p3` when a profile is
//! selected. Failures never reach the caller: they are logged and the
//! operation reports nothing saved or nothing loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::campaign::game::GameState;
use crate::persistence::storage::Storage;

pub const SAVE_VERSION: &str = "0.4.0";
pub const COMPATIBLE_VERSIONS: [&str; 2] = ["0.3.0", "0.4.0"];

pub const SAVE_KEY: &str = "the_little_soldier_save";

/// Profiles are numbered 1..=MAX_PROFILES
pub const MAX_PROFILES: u8 = 3;

/// Campaign every pre-0.4.0 save belongs to
pub const LEGACY_CAMPAIGN_ID: &str = "italy";

/// Storage key for `base`, namespaced by profile
pub fn namespaced_key(base: &str, profile: Option<u8>) -> String {
    match profile {
        Some(id) => format!("{}_p{}", base, id),
        None => base.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEnvelope {
    pub version: String,
    pub game_state: Value,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Bring a 0.3.0 `gameState` up to 0.4.0 in place
///
/// 0.3.0 had a single hard-coded campaign and tracked progress with
/// `battleIndex`. Running the migration on an already migrated state
/// changes nothing.
pub fn migrate_v030_to_v040(game_state: &mut Value) {
    let Some(root) = game_state.as_object_mut() else {
        return;
    };
    let campaign = root
        .entry("campaign")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(campaign) = campaign.as_object_mut() else {
        return;
    };

    campaign
        .entry("campaignId")
        .or_insert_with(|| Value::from(LEGACY_CAMPAIGN_ID));

    if let Some(battle_index) = campaign.remove("battleIndex") {
        // Battle 1 of the old campaign is sequence entry 2 (after the interlude)
        let index = if battle_index.as_u64().unwrap_or(0) > 0 { 2 } else { 0 };
        campaign.insert("sequenceIndex".into(), Value::from(index));
    } else {
        campaign
            .entry("sequenceIndex")
            .or_insert_with(|| Value::from(0));
    }

    campaign.entry("phase").or_insert_with(|| Value::from("Battle"));
    campaign
        .entry("npcDeaths")
        .or_insert_with(|| Value::Array(Vec::new()));
    campaign
        .entry("replacementsUsed")
        .or_insert_with(|| Value::Array(Vec::new()));

    if let Some(Value::String(current)) = campaign.get_mut("currentBattle") {
        *current = current.to_lowercase();
    }
}

/// Save session; carries the selected profile
#[derive(Debug)]
pub struct SaveService<S> {
    storage: S,
    profile: Option<u8>,
}

impl<S: Storage> SaveService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, profile: None }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn profile(&self) -> Option<u8> {
        self.profile
    }

    /// Select a profile; ids outside 1..=MAX_PROFILES select none
    pub fn set_profile(&mut self, profile: Option<u8>) {
        self.profile = profile.filter(|id| (1..=MAX_PROFILES).contains(id));
        if profile.is_some() && self.profile.is_none() {
            tracing::warn!(?profile, "Ignoring invalid profile id");
        }
    }

    /// Run `f` with `profile` selected, then restore the previous one
    pub fn with_profile<T>(&mut self, profile: Option<u8>, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.profile;
        self.set_profile(profile);
        let result = f(self);
        self.profile = previous;
        result
    }

    pub(crate) fn key(&self, base: &str) -> String {
        namespaced_key(base, self.profile)
    }

    /// Save the game; a dead player's save is deleted instead
    ///
    /// Returns whether a save now exists for the game.
    pub fn save_game(&mut self, game: &GameState) -> bool {
        if player_is_dead(game) {
            tracing::info!(player = %game.player.name, "Player is dead, deleting save");
            self.delete_save();
            return false;
        }

        let game_state = match serde_json::to_value(game) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize game state");
                return false;
            }
        };
        let envelope = SaveEnvelope {
            version: SAVE_VERSION.to_string(),
            game_state,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize save envelope");
                return false;
            }
        };

        let key = self.key(SAVE_KEY);
        match self.storage.set(&key, &json) {
            Ok(()) => {
                tracing::debug!(%key, "Game saved");
                true
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to write save");
                false
            }
        }
    }

    /// Load the game, migrating an older save and writing it back
    pub fn load_game(&mut self) -> Option<GameState> {
        let key = self.key(SAVE_KEY);
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to read save");
                return None;
            }
        };

        let mut envelope: SaveEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Malformed save");
                return None;
            }
        };

        if !COMPATIBLE_VERSIONS.contains(&envelope.version.as_str()) {
            tracing::warn!(%key, version = %envelope.version, "Incompatible save version");
            return None;
        }

        let migrated = envelope.version != SAVE_VERSION;
        if migrated {
            migrate_v030_to_v040(&mut envelope.game_state);
            tracing::info!(%key, from = %envelope.version, to = SAVE_VERSION, "Save migrated");
        }

        let game: GameState = match serde_json::from_value(envelope.game_state) {
            Ok(game) => game,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Save does not match the game state");
                return None;
            }
        };

        if player_is_dead(&game) {
            tracing::info!(%key, "Save holds a dead player, deleting it");
            self.delete_save();
            return None;
        }
        if migrated {
            self.save_game(&game);
        }
        Some(game)
    }

    pub fn delete_save(&mut self) {
        let key = self.key(SAVE_KEY);
        if let Err(e) = self.storage.remove(&key) {
            tracing::warn!(%key, error = %e, "Failed to delete save");
        }
    }

    pub fn has_save(&self) -> bool {
        self.storage.contains(&self.key(SAVE_KEY))
    }
}

/// Dead on the campaign record or in the battle still being fought
fn player_is_dead(game: &GameState) -> bool {
    !game.player.alive || game.battle_state.as_ref().is_some_and(|b| !b.player.alive)
}
