//! Stat and valor checks
//!
//! Percentile convention: a check succeeds when the d100 roll is at or under
//! the target. The target is the stat shifted by the difficulty.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::stats::thresholds::MoraleThreshold;

pub const MIN_TARGET: i32 = 5;
pub const MAX_TARGET: i32 = 95;

/// Margins at or beyond these bounds grade as great success / critical failure
pub const GREAT_SUCCESS_MARGIN: i32 = 30;
pub const CRITICAL_FAIL_MARGIN: i32 = -40;

/// Source of every random number the engines consume
pub trait RollSource {
    /// Percentile die, 1..=100
    fn d100(&mut self) -> u32;

    /// Uniform in [0, 1)
    fn chance(&mut self) -> f64;

    /// Uniform integer in [lo, hi]
    fn between(&mut self, lo: i32, hi: i32) -> i32;
}

/// Adapter from any `rand` generator
#[derive(Debug, Clone)]
pub struct RngRolls<R> {
    rng: R,
}

impl<R: Rng> RngRolls<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngRolls<ChaCha8Rng> {
    /// Deterministic rolls for replays and headless runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> RollSource for RngRolls<R> {
    fn d100(&mut self) -> u32 {
        self.rng.gen_range(1..=100)
    }

    fn chance(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn between(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }
}

/// Replays queued values; once a queue is empty it returns a quiet default
///
/// Defaults: d100 → 50, chance → 0.99 (no random event fires),
/// between → the low bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    d100s: VecDeque<u32>,
    chances: VecDeque<f64>,
    ranges: VecDeque<i32>,
}

impl ScriptedRolls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_d100s(mut self, rolls: &[u32]) -> Self {
        self.d100s.extend(rolls.iter().copied());
        self
    }

    pub fn with_chances(mut self, chances: &[f64]) -> Self {
        self.chances.extend(chances.iter().copied());
        self
    }

    pub fn with_ranges(mut self, values: &[i32]) -> Self {
        self.ranges.extend(values.iter().copied());
        self
    }

    pub fn push_d100(&mut self, roll: u32) {
        self.d100s.push_back(roll);
    }

    pub fn push_chance(&mut self, chance: f64) {
        self.chances.push_back(chance);
    }

    /// Values still queued (d100, chance, range)
    pub fn remaining(&self) -> (usize, usize, usize) {
        (self.d100s.len(), self.chances.len(), self.ranges.len())
    }
}

impl RollSource for ScriptedRolls {
    fn d100(&mut self) -> u32 {
        self.d100s.pop_front().unwrap_or(50).clamp(1, 100)
    }

    fn chance(&mut self) -> f64 {
        self.chances.pop_front().unwrap_or(0.99)
    }

    fn between(&mut self, lo: i32, hi: i32) -> i32 {
        match self.ranges.pop_front() {
            Some(value) if hi >= lo => value.clamp(lo, hi),
            _ => lo,
        }
    }
}

/// Named difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Standard,
    Hard,
    Desperate,
}

impl Difficulty {
    pub fn modifier(&self) -> i32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Standard => 0,
            Difficulty::Hard => -15,
            Difficulty::Desperate => -30,
        }
    }

    /// One step harder, saturating at Desperate
    pub fn harder(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Standard,
            Difficulty::Standard => Difficulty::Hard,
            Difficulty::Hard | Difficulty::Desperate => Difficulty::Desperate,
        }
    }
}

/// Outcome classification used for labels and finer narrative branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollGrade {
    GreatSuccess,
    Pass,
    Fail,
    CriticalFail,
}

impl RollGrade {
    pub fn from_margin(margin: i32) -> Self {
        if margin >= GREAT_SUCCESS_MARGIN {
            RollGrade::GreatSuccess
        } else if margin >= 0 {
            RollGrade::Pass
        } else if margin > CRITICAL_FAIL_MARGIN {
            RollGrade::Fail
        } else {
            RollGrade::CriticalFail
        }
    }
}

/// Result of a stat check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub success: bool,
    pub roll: u32,
    pub target: u32,
    pub margin: i32,
    pub grade: RollGrade,
}

impl RollResult {
    /// Build a result from an already-rolled value
    pub fn evaluate(roll: u32, target: u32) -> Self {
        let margin = target as i32 - roll as i32;
        Self {
            success: roll <= target,
            roll,
            target,
            margin,
            grade: RollGrade::from_margin(margin),
        }
    }
}

/// Target number for a stat at a difficulty, kept within [5, 95]
pub fn roll_target(value: u32, difficulty: Difficulty) -> u32 {
    (value as i32 + difficulty.modifier()).clamp(MIN_TARGET, MAX_TARGET) as u32
}

pub fn roll_stat(value: u32, difficulty: Difficulty, rolls: &mut dyn RollSource) -> RollResult {
    let target = roll_target(value, difficulty);
    RollResult::evaluate(rolls.d100(), target)
}

/// Morale check against valor
pub fn roll_valor(valor: u32, difficulty: Difficulty, rolls: &mut dyn RollSource) -> RollResult {
    roll_stat(valor, difficulty, rolls)
}

/// Difficulty of a valor check at a given morale tier
pub fn valor_difficulty(threshold: MoraleThreshold) -> Difficulty {
    match threshold {
        MoraleThreshold::Steady => Difficulty::Easy,
        MoraleThreshold::Shaken => Difficulty::Standard,
        MoraleThreshold::Wavering => Difficulty::Hard,
        MoraleThreshold::Breaking => Difficulty::Desperate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_roll_succeeds() {
        let mut rolls = ScriptedRolls::new().with_d100s(&[20]);
        let result = roll_stat(40, Difficulty::Standard, &mut rolls);

        assert!(result.success);
        assert_eq!(result.roll, 20);
        assert_eq!(result.target, 40);
        assert_eq!(result.margin, 20);
        assert_eq!(result.grade, RollGrade::Pass);
    }

    #[test]
    fn test_high_roll_fails() {
        let mut rolls = ScriptedRolls::new().with_d100s(&[80]);
        let result = roll_stat(50, Difficulty::Standard, &mut rolls);

        assert!(!result.success);
        assert_eq!(result.margin, -30);
        assert_eq!(result.grade, RollGrade::Fail);
    }

    #[test]
    fn test_roll_equal_to_target_succeeds() {
        let result = RollResult::evaluate(45, 45);
        assert!(result.success);
        assert_eq!(result.margin, 0);
    }

    #[test]
    fn test_grades_from_margin() {
        assert_eq!(RollGrade::from_margin(30), RollGrade::GreatSuccess);
        assert_eq!(RollGrade::from_margin(29), RollGrade::Pass);
        assert_eq!(RollGrade::from_margin(-1), RollGrade::Fail);
        assert_eq!(RollGrade::from_margin(-39), RollGrade::Fail);
        assert_eq!(RollGrade::from_margin(-40), RollGrade::CriticalFail);
    }

    #[test]
    fn test_target_clamped() {
        assert_eq!(roll_target(90, Difficulty::Easy), 95);
        assert_eq!(roll_target(10, Difficulty::Desperate), 5);
        assert_eq!(roll_target(50, Difficulty::Hard), 35);
    }

    #[test]
    fn test_difficulty_harder_saturates() {
        assert_eq!(Difficulty::Easy.harder(), Difficulty::Standard);
        assert_eq!(Difficulty::Desperate.harder(), Difficulty::Desperate);
    }

    #[test]
    fn test_valor_difficulty_tracks_morale() {
        assert_eq!(valor_difficulty(MoraleThreshold::Steady), Difficulty::Easy);
        assert_eq!(valor_difficulty(MoraleThreshold::Breaking), Difficulty::Desperate);
    }

    #[test]
    fn test_scripted_defaults_when_exhausted() {
        let mut rolls = ScriptedRolls::new().with_ranges(&[99]);
        assert_eq!(rolls.d100(), 50);
        assert_eq!(rolls.chance(), 0.99);
        assert_eq!(rolls.between(5, 10), 10);
        assert_eq!(rolls.between(5, 10), 5);
    }

    #[test]
    fn test_seeded_rolls_are_reproducible() {
        let mut a = RngRolls::seeded(42);
        let mut b = RngRolls::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.d100(), b.d100());
            assert_eq!(a.between(3, 9), b.between(3, 9));
        }
    }

    #[test]
    fn test_rng_rolls_stay_in_range() {
        let mut rolls = RngRolls::seeded(7);
        for _ in 0..200 {
            let d = rolls.d100();
            assert!((1..=100).contains(&d));
            let c = rolls.chance();
            assert!((0.0..1.0).contains(&c));
            let r = rolls.between(-2, 2);
            assert!((-2..=2).contains(&r));
        }
    }
}
