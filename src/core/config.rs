//! Engine tuning with documented constants
//!
//! Every coefficient used by the volley, melee and camp engines lives here.
//! The defaults are the tuned values; a TOML file can override any subset.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::ConfigError;

/// All tunable values, passed explicitly to the engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub volley: VolleyTuning,
    pub melee: MeleeTuning,
    pub camp: CampTuning,
}

/// Coefficients for scripted and gorge volleys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolleyTuning {
    // === FRENCH FIRE ===
    /// Extra enemy strength removed when the player's own shot lands
    pub player_shot_bonus: f64,

    /// Enemy line integrity lost per point of strength lost
    ///
    /// Above 1.0 the enemy formation frays faster than it bleeds.
    pub enemy_integrity_ratio: f64,

    // === AUSTRIAN RETURN FIRE ===
    /// Scales return-fire intensity into a per-neighbour hit chance
    pub neighbour_hit_factor: f64,

    /// Chance that a hit neighbour is killed rather than wounded
    pub neighbour_kill_chance: f64,

    /// Scales return-fire intensity into the officer's hit chance
    pub officer_hit_factor: f64,

    /// Anonymous line casualties at full intensity
    pub line_casualty_scale: f64,

    /// Health lost when the player is hit (inclusive range)
    pub player_damage_min: i32,
    pub player_damage_max: i32,

    /// A miss within this multiple of the hit chance counts as a near miss
    pub near_miss_factor: f64,

    // === MORALE ===
    /// Morale drained at point-blank range; falls off linearly to zero at
    /// `range_fear_reference` paces
    pub range_fear_max: f64,
    pub range_fear_reference: f64,

    /// Extra drain while enemy guns are in action
    pub artillery_fear: i32,

    /// Recovery from a sergeant in the line and from a standing officer
    pub nco_steadying: i32,
    pub officer_steadying: i32,

    pub valor_success_morale: i32,
    pub valor_failure_morale: i32,
    pub neighbour_killed_morale: i32,
    pub neighbour_wounded_morale: i32,
    pub officer_down_morale: i32,
    pub player_wounded_morale: i32,
    pub near_miss_morale: i32,

    // === LINE INTEGRITY ===
    /// Integrity lost per casualty in the player's company
    pub integrity_per_casualty: f64,

    /// Integrity lost at full return-fire intensity
    pub integrity_fire_loss: f64,

    /// Multiplier on integrity loss while a sergeant dresses the line
    pub nco_integrity_factor: f64,

    // === FATIGUE ===
    pub volley_stamina_cost: f64,
    pub volley_fatigue: f64,

    // === GORGE ===
    /// Damage a landed shot does to the ammunition wagon
    pub wagon_hit_damage: f64,

    /// Wagon damage at which the wagon detonates
    pub wagon_detonation_threshold: f64,

    /// One-time strength loss when the wagon goes up
    pub wagon_strength_penalty: f64,

    pub wagon_detonation_morale: i32,

    /// Enemy integrity lost when their officer is shot down
    pub officer_shot_integrity: f64,

    /// The column surrenders at or below this strength
    pub gorge_surrender_strength: f64,
}

impl Default for VolleyTuning {
    fn default() -> Self {
        Self {
            player_shot_bonus: 1.5,
            enemy_integrity_ratio: 1.2,

            neighbour_hit_factor: 0.35,
            neighbour_kill_chance: 0.4,
            officer_hit_factor: 0.1,
            line_casualty_scale: 3.0,
            player_damage_min: 8,
            player_damage_max: 20,
            near_miss_factor: 2.0,

            range_fear_max: 6.0,
            range_fear_reference: 150.0,
            artillery_fear: 2,
            nco_steadying: 2,
            officer_steadying: 1,
            valor_success_morale: 3,
            valor_failure_morale: -4,
            neighbour_killed_morale: -6,
            neighbour_wounded_morale: -3,
            officer_down_morale: -5,
            player_wounded_morale: -8,
            near_miss_morale: -2,

            integrity_per_casualty: 2.5,
            integrity_fire_loss: 3.0,
            nco_integrity_factor: 0.8,

            volley_stamina_cost: 4.0,
            volley_fatigue: 5.0,

            wagon_hit_damage: 35.0,
            wagon_detonation_threshold: 100.0,
            wagon_strength_penalty: 30.0,
            wagon_detonation_morale: 5,
            officer_shot_integrity: 10.0,
            gorge_surrender_strength: 10.0,
        }
    }
}

/// Per-attack coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTuning {
    pub base_hit: f64,
    pub stamina_cost: f64,
    pub damage_min: i32,
    pub damage_max: i32,
    /// Stun chance on a hit, added to the body part's own stun chance
    pub stun_chance: f64,
}

/// Per-body-part coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPartTuning {
    /// Added to the hit chance (negative = harder to hit)
    pub hit_modifier: f64,
    pub damage_multiplier: f64,
    pub stun_chance: f64,
    /// Chance a hit kills outright regardless of damage
    pub kill_chance: f64,
}

/// Coefficients for melee exchanges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTuning {
    // === ACTIONS ===
    pub thrust: AttackTuning,
    pub lunge: AttackTuning,
    pub butt_strike: AttackTuning,
    pub feint: AttackTuning,
    pub shoot: AttackTuning,

    pub guard_cost: f64,
    pub reload_cost: f64,
    pub respite_recovery: f64,

    /// Share of max fatigue removed by a successful second wind
    pub second_wind_ratio: f64,

    pub canteen_heal: f64,
    pub canteen_uses: u32,

    /// Stamina an opponent staggered by a feint loses
    pub feint_stamina_drain: f64,

    // === BODY PARTS ===
    pub head: BodyPartTuning,
    pub torso: BodyPartTuning,
    pub arms: BodyPartTuning,
    pub legs: BodyPartTuning,

    // === HIT CHANCE ===
    /// Skill at which the skill modifier is zero
    pub skill_pivot: f64,
    /// Skill points per +1.0 hit chance
    pub skill_divisor: f64,
    /// Hit multiplier at zero morale; rises linearly to 1.0 at full morale
    pub morale_floor: f64,
    /// Hit chance lost at full fatigue
    pub fatigue_penalty: f64,
    pub riposte_bonus: f64,
    pub min_hit: f64,
    pub max_hit: f64,

    // === STANCE ===
    pub aggressive_attack: f64,
    /// Added to the opponent's hit chance against an aggressive fighter
    pub aggressive_exposure: f64,
    pub defensive_attack: f64,
    /// Subtracted from the opponent's hit chance against a defensive fighter
    pub defensive_cover: f64,
    pub aggressive_cost_multiplier: f64,
    pub defensive_cost_multiplier: f64,

    // === DEFENCE & INJURY ===
    pub guard_bonus: f64,
    pub arm_injury_penalty: f64,
    pub leg_injury_cost_multiplier: f64,
    pub leg_injury_regen_multiplier: f64,
    /// Exchanges the player loses to a stun; further stuns add to the count
    pub stun_turns: u8,

    /// Fatigue gained per point of stamina spent
    pub fatigue_per_stamina: f64,

    /// Strength points per extra point of damage
    pub strength_damage_divisor: f64,

    // === AI ===
    /// Chance per ally that an opponent turns on the ally instead of the player
    pub ally_target_share: f64,
    /// Opponents rest when stamina falls below this ratio
    pub opponent_respite_ratio: f64,

    // === MORALE ===
    pub kill_morale: i32,
    pub hit_taken_morale: i32,
    pub ally_down_morale: i32,
}

impl Default for MeleeTuning {
    fn default() -> Self {
        Self {
            thrust: AttackTuning {
                base_hit: 0.60,
                stamina_cost: 8.0,
                damage_min: 15,
                damage_max: 25,
                stun_chance: 0.0,
            },
            lunge: AttackTuning {
                base_hit: 0.50,
                stamina_cost: 14.0,
                damage_min: 20,
                damage_max: 35,
                stun_chance: 0.0,
            },
            butt_strike: AttackTuning {
                base_hit: 0.65,
                stamina_cost: 6.0,
                damage_min: 8,
                damage_max: 14,
                stun_chance: 0.25,
            },
            feint: AttackTuning {
                base_hit: 0.70,
                stamina_cost: 4.0,
                damage_min: 0,
                damage_max: 0,
                stun_chance: 0.0,
            },
            shoot: AttackTuning {
                base_hit: 0.55,
                stamina_cost: 2.0,
                damage_min: 30,
                damage_max: 45,
                stun_chance: 0.0,
            },
            guard_cost: 3.0,
            reload_cost: 5.0,
            respite_recovery: 20.0,
            second_wind_ratio: 0.3,
            canteen_heal: 15.0,
            canteen_uses: 3,
            feint_stamina_drain: 15.0,

            head: BodyPartTuning {
                hit_modifier: -0.25,
                damage_multiplier: 1.5,
                stun_chance: 0.35,
                kill_chance: 0.10,
            },
            torso: BodyPartTuning {
                hit_modifier: 0.0,
                damage_multiplier: 1.0,
                stun_chance: 0.0,
                kill_chance: 0.0,
            },
            arms: BodyPartTuning {
                hit_modifier: -0.10,
                damage_multiplier: 0.6,
                stun_chance: 0.0,
                kill_chance: 0.0,
            },
            legs: BodyPartTuning {
                hit_modifier: -0.15,
                damage_multiplier: 0.7,
                stun_chance: 0.0,
                kill_chance: 0.0,
            },

            skill_pivot: 40.0,
            skill_divisor: 200.0,
            morale_floor: 0.7,
            fatigue_penalty: 0.2,
            riposte_bonus: 0.15,
            min_hit: 0.05,
            max_hit: 0.95,

            aggressive_attack: 0.10,
            aggressive_exposure: 0.10,
            defensive_attack: -0.10,
            defensive_cover: 0.15,
            aggressive_cost_multiplier: 1.2,
            defensive_cost_multiplier: 0.9,

            guard_bonus: 0.30,
            arm_injury_penalty: 0.15,
            leg_injury_cost_multiplier: 1.5,
            leg_injury_regen_multiplier: 0.5,
            stun_turns: 1,
            fatigue_per_stamina: 0.5,
            strength_damage_divisor: 10.0,

            ally_target_share: 0.3,
            opponent_respite_ratio: 0.2,

            kill_morale: 4,
            hit_taken_morale: -3,
            ally_down_morale: -6,
        }
    }
}

/// Coefficients for camp visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampTuning {
    pub actions_per_camp: u32,
    /// Chance per activity that a random event interrupts the camp
    pub random_event_chance: f64,
    /// Activities that must pass before bathing again
    pub bathe_cooldown: u32,
    pub socialize_gain: i32,
    pub maintain_gain: u32,
}

impl Default for CampTuning {
    fn default() -> Self {
        Self {
            actions_per_camp: 6,
            random_event_chance: 0.2,
            bathe_cooldown: 3,
            socialize_gain: 6,
            maintain_gain: 25,
        }
    }
}

impl EngineTuning {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let tuning: EngineTuning =
            toml::from_str(content).map_err(|e| ConfigError::InvalidTuning(e.to_string()))?;
        tuning.validate().map_err(ConfigError::InvalidTuning)?;
        Ok(tuning)
    }

    /// Load overrides from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidTuning(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate tuning for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        let m = &self.melee;
        if m.min_hit >= m.max_hit {
            return Err(format!(
                "melee.min_hit ({}) should be < melee.max_hit ({})",
                m.min_hit, m.max_hit
            ));
        }
        if !(0.0..=1.0).contains(&m.morale_floor) {
            return Err(format!("melee.morale_floor ({}) must be in [0, 1]", m.morale_floor));
        }
        if m.skill_divisor <= 0.0 || m.strength_damage_divisor <= 0.0 {
            return Err("Melee divisors must be positive".into());
        }
        for (name, attack) in [
            ("thrust", &m.thrust),
            ("lunge", &m.lunge),
            ("butt_strike", &m.butt_strike),
            ("feint", &m.feint),
            ("shoot", &m.shoot),
        ] {
            if attack.damage_min > attack.damage_max {
                return Err(format!("melee.{}: damage_min exceeds damage_max", name));
            }
        }

        let v = &self.volley;
        if v.player_damage_min > v.player_damage_max {
            return Err("volley.player_damage_min exceeds volley.player_damage_max".into());
        }
        if v.wagon_detonation_threshold <= 0.0 {
            return Err("volley.wagon_detonation_threshold must be positive".into());
        }
        if v.range_fear_reference <= 0.0 {
            return Err("volley.range_fear_reference must be positive".into());
        }

        if self.camp.actions_per_camp == 0 {
            return Err("camp.actions_per_camp must be at least 1".into());
        }

        Ok(())
    }
}
