//! Pool-to-tier mapping
//!
//! Pools (morale, health, stamina, fatigue) are plain numbers; the engines and
//! the UI branch on the qualitative tier derived from `value / max`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const THRESHOLD_HIGH: f64 = 0.8;
pub const THRESHOLD_MID: f64 = 0.5;
pub const THRESHOLD_LOW: f64 = 0.25;

pub const FATIGUE_WINDED: f64 = 0.25;
pub const FATIGUE_FATIGUED: f64 = 0.5;
pub const FATIGUE_EXHAUSTED: f64 = 0.75;

/// Base of every derived pool before the stat contribution
pub const POOL_BASE: f64 = 30.0;
pub const POOL_STAT_FACTOR: f64 = 1.5;

/// Morale tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoraleThreshold {
    Steady,
    Shaken,
    Wavering,
    Breaking,
}

/// Health tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthState {
    Unhurt,
    Wounded,
    BadlyWounded,
    Critical,
}

/// Fatigue tier (also used for spent stamina)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FatigueTier {
    Fresh,
    Winded,
    Fatigued,
    Exhausted,
}

impl fmt::Display for MoraleThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MoraleThreshold::Steady => "Steady",
            MoraleThreshold::Shaken => "Shaken",
            MoraleThreshold::Wavering => "Wavering",
            MoraleThreshold::Breaking => "Breaking",
        };
        f.write_str(label)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthState::Unhurt => "Unhurt",
            HealthState::Wounded => "Wounded",
            HealthState::BadlyWounded => "Badly Wounded",
            HealthState::Critical => "Critical",
        };
        f.write_str(label)
    }
}

impl fmt::Display for FatigueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FatigueTier::Fresh => "Fresh",
            FatigueTier::Winded => "Winded",
            FatigueTier::Fatigued => "Fatigued",
            FatigueTier::Exhausted => "Exhausted",
        };
        f.write_str(label)
    }
}

/// `value / max` clamped to [0, 1]; an empty pool reads as 0
pub fn pool_ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

pub fn get_morale_threshold(value: f64, max: f64) -> MoraleThreshold {
    let ratio = pool_ratio(value, max);
    if ratio >= THRESHOLD_HIGH {
        MoraleThreshold::Steady
    } else if ratio >= THRESHOLD_MID {
        MoraleThreshold::Shaken
    } else if ratio >= THRESHOLD_LOW {
        MoraleThreshold::Wavering
    } else {
        MoraleThreshold::Breaking
    }
}

pub fn get_health_state(value: f64, max: f64) -> HealthState {
    let ratio = pool_ratio(value, max);
    if ratio >= THRESHOLD_HIGH {
        HealthState::Unhurt
    } else if ratio >= THRESHOLD_MID {
        HealthState::Wounded
    } else if ratio >= THRESHOLD_LOW {
        HealthState::BadlyWounded
    } else {
        HealthState::Critical
    }
}

fn fatigue_tier_for_ratio(ratio: f64) -> FatigueTier {
    if ratio >= FATIGUE_EXHAUSTED {
        FatigueTier::Exhausted
    } else if ratio >= FATIGUE_FATIGUED {
        FatigueTier::Fatigued
    } else if ratio >= FATIGUE_WINDED {
        FatigueTier::Winded
    } else {
        FatigueTier::Fresh
    }
}

fn fatigue_band(tier: FatigueTier) -> (f64, f64) {
    match tier {
        FatigueTier::Fresh => (0.0, FATIGUE_WINDED),
        FatigueTier::Winded => (FATIGUE_WINDED, FATIGUE_FATIGUED),
        FatigueTier::Fatigued => (FATIGUE_FATIGUED, FATIGUE_EXHAUSTED),
        FatigueTier::Exhausted => (FATIGUE_EXHAUSTED, 1.0),
    }
}

/// Tier of accumulated fatigue (0 = fresh, max = spent)
pub fn get_fatigue_tier(fatigue: f64, max: f64) -> FatigueTier {
    fatigue_tier_for_ratio(pool_ratio(fatigue, max))
}

/// Fill of the current fatigue band, 0-100, restarting at every tier boundary
///
/// Drives the radial meters; `(ratio - band_start) / band_width * 100`, rounded.
pub fn get_fatigue_tier_fill(fatigue: f64, max: f64) -> u32 {
    let ratio = pool_ratio(fatigue, max);
    let (start, end) = fatigue_band(fatigue_tier_for_ratio(ratio));
    let fill = ((ratio - start) / (end - start) * 100.0).round();
    fill.clamp(0.0, 100.0) as u32
}

/// Tier of remaining stamina (full pool = fresh)
pub fn get_stamina_tier(stamina: f64, max: f64) -> FatigueTier {
    if max <= 0.0 {
        return FatigueTier::Exhausted;
    }
    fatigue_tier_for_ratio(1.0 - pool_ratio(stamina, max))
}

/// Battle stamina pool derived from endurance
pub fn stamina_pool_size(endurance: u32) -> f64 {
    POOL_BASE + (POOL_STAT_FACTOR * endurance as f64).round()
}

/// Battle health pool derived from constitution
pub fn health_pool_size(constitution: u32) -> f64 {
    POOL_BASE + (POOL_STAT_FACTOR * constitution as f64).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morale_threshold_boundaries() {
        assert_eq!(get_morale_threshold(100.0, 100.0), MoraleThreshold::Steady);
        assert_eq!(get_morale_threshold(80.0, 100.0), MoraleThreshold::Steady);
        assert_eq!(get_morale_threshold(79.0, 100.0), MoraleThreshold::Shaken);
        assert_eq!(get_morale_threshold(50.0, 100.0), MoraleThreshold::Shaken);
        assert_eq!(get_morale_threshold(49.0, 100.0), MoraleThreshold::Wavering);
        assert_eq!(get_morale_threshold(25.0, 100.0), MoraleThreshold::Wavering);
        assert_eq!(get_morale_threshold(24.0, 100.0), MoraleThreshold::Breaking);
        assert_eq!(get_morale_threshold(0.0, 100.0), MoraleThreshold::Breaking);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        assert_eq!(get_morale_threshold(-10.0, 100.0), MoraleThreshold::Breaking);
        assert_eq!(get_morale_threshold(150.0, 100.0), MoraleThreshold::Steady);
        assert_eq!(get_health_state(10.0, 0.0), HealthState::Critical);
    }

    #[test]
    fn test_health_state_mirrors_morale() {
        assert_eq!(get_health_state(75.0, 75.0), HealthState::Unhurt);
        assert_eq!(get_health_state(45.0, 75.0), HealthState::Wounded);
        assert_eq!(get_health_state(20.0, 75.0), HealthState::BadlyWounded);
        assert_eq!(get_health_state(5.0, 75.0), HealthState::Critical);
    }

    #[test]
    fn test_fatigue_tiers() {
        assert_eq!(get_fatigue_tier(0.0, 100.0), FatigueTier::Fresh);
        assert_eq!(get_fatigue_tier(24.0, 100.0), FatigueTier::Fresh);
        assert_eq!(get_fatigue_tier(25.0, 100.0), FatigueTier::Winded);
        assert_eq!(get_fatigue_tier(50.0, 100.0), FatigueTier::Fatigued);
        assert_eq!(get_fatigue_tier(75.0, 100.0), FatigueTier::Exhausted);
        assert_eq!(get_fatigue_tier(100.0, 100.0), FatigueTier::Exhausted);
    }

    #[test]
    fn test_fatigue_tier_fill_golden_values() {
        assert_eq!(get_fatigue_tier_fill(0.0, 100.0), 0);
        assert_eq!(get_fatigue_tier_fill(10.0, 100.0), 40);
        assert_eq!(get_fatigue_tier_fill(25.0, 100.0), 0);
        assert_eq!(get_fatigue_tier_fill(30.0, 100.0), 20);
        assert_eq!(get_fatigue_tier_fill(62.5, 100.0), 50);
        assert_eq!(get_fatigue_tier_fill(74.0, 100.0), 96);
        assert_eq!(get_fatigue_tier_fill(75.0, 100.0), 0);
        assert_eq!(get_fatigue_tier_fill(100.0, 100.0), 100);
        // 13 / 75 = 0.1733 -> 69.3% of the fresh band
        assert_eq!(get_fatigue_tier_fill(13.0, 75.0), 69);
    }

    #[test]
    fn test_stamina_tier_inverts_ratio() {
        assert_eq!(get_stamina_tier(100.0, 100.0), FatigueTier::Fresh);
        assert_eq!(get_stamina_tier(60.0, 100.0), FatigueTier::Winded);
        assert_eq!(get_stamina_tier(10.0, 100.0), FatigueTier::Exhausted);
        assert_eq!(get_stamina_tier(10.0, 0.0), FatigueTier::Exhausted);
    }

    #[test]
    fn test_pool_sizes() {
        assert_eq!(stamina_pool_size(30), 75.0);
        assert_eq!(health_pool_size(40), 90.0);
        // 1.5 * 35 = 52.5 rounds up
        assert_eq!(health_pool_size(35), 83.0);
        assert_eq!(stamina_pool_size(0), 30.0);
    }
}
