//! The three save profiles and their Glory records

use serde::{Deserialize, Serialize};

use crate::persistence::save::MAX_PROFILES;
use crate::persistence::storage::Storage;

pub const PROFILES_KEY: &str = "the_little_soldier_profiles";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: u8,
    pub player_name: Option<String>,
    pub lifetime_glory: u32,
    pub current_glory: u32,
    /// Milliseconds since the Unix epoch
    pub last_played: Option<i64>,
}

impl ProfileRecord {
    pub fn empty(id: u8) -> Self {
        Self {
            id,
            player_name: None,
            lifetime_glory: 0,
            current_glory: 0,
            last_played: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.player_name.is_none() && self.lifetime_glory == 0
    }
}

fn default_profiles() -> Vec<ProfileRecord> {
    (1..=MAX_PROFILES).map(ProfileRecord::empty).collect()
}

/// Always returns one record per profile id, in order
pub fn load_profiles<S: Storage>(storage: &S) -> Vec<ProfileRecord> {
    let stored: Vec<ProfileRecord> = match storage.get(PROFILES_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Malformed profiles, starting fresh");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read profiles");
            Vec::new()
        }
    };

    default_profiles()
        .into_iter()
        .map(|empty| {
            stored
                .iter()
                .find(|p| p.id == empty.id)
                .cloned()
                .unwrap_or(empty)
        })
        .collect()
}

pub fn save_profiles<S: Storage>(storage: &mut S, profiles: &[ProfileRecord]) -> bool {
    let json = match serde_json::to_string(profiles) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize profiles");
            return false;
        }
    };
    match storage.set(PROFILES_KEY, &json) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to write profiles");
            false
        }
    }
}

/// Credit earned Glory to a profile and stamp it as played
///
/// Returns the updated record, or `None` when the profile id is unknown or the
/// profiles could not be written.
pub fn record_glory<S: Storage>(
    storage: &mut S,
    profile_id: u8,
    player_name: &str,
    earned: u32,
) -> Option<ProfileRecord> {
    let mut profiles = load_profiles(storage);
    let Some(record) = profiles.iter_mut().find(|p| p.id == profile_id) else {
        tracing::warn!(profile = profile_id, earned, "Unknown profile, Glory not recorded");
        return None;
    };
    record.player_name = Some(player_name.to_string());
    record.lifetime_glory = record.lifetime_glory.saturating_add(earned);
    record.current_glory = record.current_glory.saturating_add(earned);
    record.last_played = Some(chrono::Utc::now().timestamp_millis());
    let updated = record.clone();
    if !save_profiles(storage, &profiles) {
        tracing::warn!(profile = profile_id, earned, "Glory not recorded");
        return None;
    }
    tracing::debug!(profile = profile_id, earned, lifetime = updated.lifetime_glory, "Glory recorded");
    Some(updated)
}
