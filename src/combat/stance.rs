//! Melee stances, actions and body-part targeting
//!
//! Every combatant fights in exactly one stance; the stance shifts both the
//! attacker's hit chance and how exposed they are to the opponent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::config::{AttackTuning, BodyPartTuning, MeleeTuning};

/// Melee stance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stance {
    /// Hits more often, is hit more often, tires faster
    Aggressive,
    #[default]
    Balanced,
    /// Hits less often, covered, tires slower
    Defensive,
}

impl Stance {
    /// Modifier to this fighter's own hit chance
    pub fn attack_modifier(&self, tuning: &MeleeTuning) -> f64 {
        match self {
            Stance::Aggressive => tuning.aggressive_attack,
            Stance::Balanced => 0.0,
            Stance::Defensive => tuning.defensive_attack,
        }
    }

    /// Modifier to the hit chance of anyone attacking this fighter
    pub fn exposure_modifier(&self, tuning: &MeleeTuning) -> f64 {
        match self {
            Stance::Aggressive => tuning.aggressive_exposure,
            Stance::Balanced => 0.0,
            Stance::Defensive => -tuning.defensive_cover,
        }
    }

    pub fn cost_multiplier(&self, tuning: &MeleeTuning) -> f64 {
        match self {
            Stance::Aggressive => tuning.aggressive_cost_multiplier,
            Stance::Balanced => 1.0,
            Stance::Defensive => tuning.defensive_cost_multiplier,
        }
    }

    pub fn parse(name: &str) -> Option<Stance> {
        match name.to_ascii_lowercase().as_str() {
            "aggressive" | "a" => Some(Stance::Aggressive),
            "balanced" | "b" => Some(Stance::Balanced),
            "defensive" | "d" => Some(Stance::Defensive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Head,
    Torso,
    Arms,
    Legs,
}

impl BodyPart {
    pub fn tuning<'a>(&self, tuning: &'a MeleeTuning) -> &'a BodyPartTuning {
        match self {
            BodyPart::Head => &tuning.head,
            BodyPart::Torso => &tuning.torso,
            BodyPart::Arms => &tuning.arms,
            BodyPart::Legs => &tuning.legs,
        }
    }

    pub fn parse(name: &str) -> Option<BodyPart> {
        match name.to_ascii_lowercase().as_str() {
            "head" => Some(BodyPart::Head),
            "torso" | "body" => Some(BodyPart::Torso),
            "arms" | "arm" => Some(BodyPart::Arms),
            "legs" | "leg" => Some(BodyPart::Legs),
            _ => None,
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BodyPart::Head => "head",
            BodyPart::Torso => "torso",
            BodyPart::Arms => "arm",
            BodyPart::Legs => "leg",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeleeAction {
    BayonetThrust,
    AggressiveLunge,
    ButtStrike,
    Feint,
    Guard,
    Respite,
    SecondWind,
    Reload,
    Shoot,
    UseCanteen,
}

impl MeleeAction {
    pub const ALL: [MeleeAction; 10] = [
        MeleeAction::BayonetThrust,
        MeleeAction::AggressiveLunge,
        MeleeAction::ButtStrike,
        MeleeAction::Feint,
        MeleeAction::Guard,
        MeleeAction::Respite,
        MeleeAction::SecondWind,
        MeleeAction::Reload,
        MeleeAction::Shoot,
        MeleeAction::UseCanteen,
    ];

    /// Actions that roll to hit an opponent
    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            MeleeAction::BayonetThrust
                | MeleeAction::AggressiveLunge
                | MeleeAction::ButtStrike
                | MeleeAction::Feint
                | MeleeAction::Shoot
        )
    }

    /// Per-attack coefficients; `None` for non-attacks
    pub fn attack_tuning<'a>(&self, tuning: &'a MeleeTuning) -> Option<&'a AttackTuning> {
        match self {
            MeleeAction::BayonetThrust => Some(&tuning.thrust),
            MeleeAction::AggressiveLunge => Some(&tuning.lunge),
            MeleeAction::ButtStrike => Some(&tuning.butt_strike),
            MeleeAction::Feint => Some(&tuning.feint),
            MeleeAction::Shoot => Some(&tuning.shoot),
            _ => None,
        }
    }

    /// Base stamina cost before stance and injury
    pub fn base_cost(&self, tuning: &MeleeTuning) -> f64 {
        match self {
            MeleeAction::Guard => tuning.guard_cost,
            MeleeAction::Reload => tuning.reload_cost,
            MeleeAction::Respite | MeleeAction::SecondWind | MeleeAction::UseCanteen => 0.0,
            _ => self.attack_tuning(tuning).map(|a| a.stamina_cost).unwrap_or(0.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeleeAction::BayonetThrust => "bayonet thrust",
            MeleeAction::AggressiveLunge => "lunge",
            MeleeAction::ButtStrike => "butt strike",
            MeleeAction::Feint => "feint",
            MeleeAction::Guard => "guard",
            MeleeAction::Respite => "respite",
            MeleeAction::SecondWind => "second wind",
            MeleeAction::Reload => "reload",
            MeleeAction::Shoot => "shoot",
            MeleeAction::UseCanteen => "canteen",
        }
    }

    pub fn parse(name: &str) -> Option<MeleeAction> {
        let lower = name.to_ascii_lowercase().replace(['_', '-'], " ");
        match lower.as_str() {
            "thrust" | "bayonet thrust" => Some(MeleeAction::BayonetThrust),
            "lunge" | "aggressive lunge" => Some(MeleeAction::AggressiveLunge),
            "butt" | "butt strike" => Some(MeleeAction::ButtStrike),
            "feint" => Some(MeleeAction::Feint),
            "guard" => Some(MeleeAction::Guard),
            "respite" | "rest" => Some(MeleeAction::Respite),
            "second wind" | "wind" => Some(MeleeAction::SecondWind),
            "reload" => Some(MeleeAction::Reload),
            "shoot" | "fire" => Some(MeleeAction::Shoot),
            "canteen" | "use canteen" | "drink" => Some(MeleeAction::UseCanteen),
            _ => None,
        }
    }
}

impl fmt::Display for MeleeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stamina an action costs a fighter in a given stance
pub fn stamina_cost(action: MeleeAction, stance: Stance, leg_injured: bool, tuning: &MeleeTuning) -> f64 {
    let mut cost = action.base_cost(tuning) * stance.cost_multiplier(tuning);
    if leg_injured {
        cost *= tuning.leg_injury_cost_multiplier;
    }
    cost
}

/// Stamina a Respite gives back; a wounded leg slows it
pub fn respite_recovery(leg_injured: bool, tuning: &MeleeTuning) -> f64 {
    if leg_injured {
        tuning.respite_recovery * tuning.leg_injury_regen_multiplier
    } else {
        tuning.respite_recovery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_modifiers_are_opposed() {
        let tuning = MeleeTuning::default();
        assert!(Stance::Aggressive.attack_modifier(&tuning) > 0.0);
        assert!(Stance::Aggressive.exposure_modifier(&tuning) > 0.0);
        assert!(Stance::Defensive.attack_modifier(&tuning) < 0.0);
        assert!(Stance::Defensive.exposure_modifier(&tuning) < 0.0);
        assert_eq!(Stance::Balanced.attack_modifier(&tuning), 0.0);
    }

    #[test]
    fn test_stamina_costs() {
        let tuning = MeleeTuning::default();
        let base = stamina_cost(MeleeAction::BayonetThrust, Stance::Balanced, false, &tuning);
        assert_eq!(base, 8.0);

        let aggressive = stamina_cost(MeleeAction::BayonetThrust, Stance::Aggressive, false, &tuning);
        assert!(aggressive > base);

        let lame = stamina_cost(MeleeAction::BayonetThrust, Stance::Balanced, true, &tuning);
        assert_eq!(lame, 12.0);

        assert_eq!(stamina_cost(MeleeAction::Respite, Stance::Aggressive, true, &tuning), 0.0);
    }

    #[test]
    fn test_leg_wound_slows_respite() {
        let tuning = MeleeTuning::default();
        assert_eq!(respite_recovery(false, &tuning), tuning.respite_recovery);
        assert!(respite_recovery(true, &tuning) < respite_recovery(false, &tuning));
    }

    #[test]
    fn test_attack_classification() {
        assert!(MeleeAction::Shoot.is_attack());
        assert!(MeleeAction::Feint.is_attack());
        assert!(!MeleeAction::Guard.is_attack());
        assert!(!MeleeAction::Reload.is_attack());
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(MeleeAction::parse("butt_strike"), Some(MeleeAction::ButtStrike));
        assert_eq!(MeleeAction::parse("second-wind"), Some(MeleeAction::SecondWind));
        assert_eq!(BodyPart::parse("HEAD"), Some(BodyPart::Head));
        assert_eq!(Stance::parse("d"), Some(Stance::Defensive));
    }
}
