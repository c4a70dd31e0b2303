//! Glory: the meta-currency that survives permadeath

use crate::persistence::save::SaveService;
use crate::persistence::storage::Storage;

pub const GLORY_KEY: &str = "the_little_soldier_glory";

/// Glory is stored as a whole, non-negative number
pub fn normalize_glory(value: f64) -> u32 {
    if value.is_finite() {
        value.round().clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    }
}

impl<S: Storage> SaveService<S> {
    /// Banked Glory for the selected profile; unreadable values count as 0
    pub fn load_glory(&self) -> u32 {
        let key = self.key(GLORY_KEY);
        match self.storage().get(&key) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(value) => normalize_glory(value),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Malformed glory value");
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to read glory");
                0
            }
        }
    }

    /// Store Glory, clamped non-negative and rounded; returns the stored value
    pub fn save_glory(&mut self, value: f64) -> u32 {
        let glory = normalize_glory(value);
        let key = self.key(GLORY_KEY);
        if let Err(e) = self.storage_mut().set(&key, &glory.to_string()) {
            tracing::warn!(%key, error = %e, "Failed to write glory");
        }
        glory
    }

    /// Add (or with a negative delta, spend) Glory; returns the new total
    pub fn add_glory(&mut self, delta: i64) -> u32 {
        let total = self.load_glory() as f64 + delta as f64;
        self.save_glory(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::storage::MemoryStorage;

    #[test]
    fn test_glory_clamped_and_rounded() {
        let mut service = SaveService::new(MemoryStorage::new());
        assert_eq!(service.load_glory(), 0);
        assert_eq!(service.save_glory(12.6), 13);
        assert_eq!(service.load_glory(), 13);
        assert_eq!(service.add_glory(-20), 0);
        assert_eq!(service.save_glory(f64::NAN), 0);
    }

    #[test]
    fn test_glory_is_per_profile() {
        let mut service = SaveService::new(MemoryStorage::new());
        service.with_profile(Some(3), |s| s.save_glory(7.0));
        assert_eq!(service.load_glory(), 0);
        assert_eq!(service.with_profile(Some(3), |s| s.load_glory()), 7);
        assert!(service.storage().contains("the_little_soldier_glory_p3"));
    }

    #[test]
    fn test_malformed_glory_reads_zero() {
        let mut service = SaveService::new(MemoryStorage::new());
        service.storage_mut().set(GLORY_KEY, "lots").unwrap();
        assert_eq!(service.load_glory(), 0);
        service.storage_mut().set(GLORY_KEY, "-4").unwrap();
        assert_eq!(service.load_glory(), 0);
    }
}
