//! Saves, Glory and profiles over a pluggable key-value store

pub mod glory;
pub mod profiles;
pub mod save;
pub mod storage;

pub use glory::{normalize_glory, GLORY_KEY};
pub use profiles::{load_profiles, record_glory, save_profiles, ProfileRecord, PROFILES_KEY};
pub use save::{
    migrate_v030_to_v040, namespaced_key, SaveEnvelope, SaveService, COMPATIBLE_VERSIONS, LEGACY_CAMPAIGN_ID, MAX_PROFILES,
    SAVE_KEY, SAVE_VERSION,
};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
