//! Hit chance and damage
//!
//! All coefficients come from `MeleeTuning`; the functions here are pure.

use crate::combat::stance::{BodyPart, MeleeAction, Stance};
use crate::core::config::MeleeTuning;

/// Everything that bears on one attack roll
#[derive(Debug, Clone, Copy)]
pub struct HitContext {
    pub action: MeleeAction,
    pub body_part: BodyPart,
    /// Musketry for Shoot, élan otherwise
    pub skill: u32,
    pub morale: f64,
    pub max_morale: f64,
    pub fatigue: f64,
    pub max_fatigue: f64,
    pub stance: Stance,
    pub riposte: bool,
    pub arm_injured: bool,
    pub defender_stance: Stance,
    pub defender_guarding: bool,
}

fn ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// Probability that an attack lands, within `[min_hit, max_hit]`
///
/// Non-attacks never hit and return 0.
pub fn calc_hit_chance(ctx: &HitContext, tuning: &MeleeTuning) -> f64 {
    let Some(attack) = ctx.action.attack_tuning(tuning) else {
        return 0.0;
    };

    let mut chance = attack.base_hit;
    chance += (ctx.skill as f64 - tuning.skill_pivot) / tuning.skill_divisor;
    chance += ctx.stance.attack_modifier(tuning);
    chance += ctx.defender_stance.exposure_modifier(tuning);
    chance += ctx.body_part.tuning(tuning).hit_modifier;
    if ctx.riposte {
        chance += tuning.riposte_bonus;
    }
    if ctx.arm_injured {
        chance -= tuning.arm_injury_penalty;
    }
    if ctx.defender_guarding {
        chance -= tuning.guard_bonus;
    }
    chance -= tuning.fatigue_penalty * ratio(ctx.fatigue, ctx.max_fatigue);

    let morale_factor =
        tuning.morale_floor + (1.0 - tuning.morale_floor) * ratio(ctx.morale, ctx.max_morale);
    chance *= morale_factor;

    chance.clamp(tuning.min_hit, tuning.max_hit)
}

/// Damage of a landed blow before the kill check
pub fn calc_damage(
    action: MeleeAction,
    body_part: BodyPart,
    strength: u32,
    rolled: i32,
    tuning: &MeleeTuning,
) -> f64 {
    if action.attack_tuning(tuning).is_none() {
        return 0.0;
    }
    let strength_bonus = if action == MeleeAction::Shoot {
        0.0
    } else {
        (strength as f64 / tuning.strength_damage_divisor).floor()
    };
    ((rolled as f64 + strength_bonus) * body_part.tuning(tuning).damage_multiplier).round()
}

/// Combined stun chance of a landed blow
pub fn stun_chance(action: MeleeAction, body_part: BodyPart, tuning: &MeleeTuning) -> f64 {
    let attack = action.attack_tuning(tuning).map(|a| a.stun_chance).unwrap_or(0.0);
    (attack + body_part.tuning(tuning).stun_chance).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ctx() -> HitContext {
        HitContext {
            action: MeleeAction::BayonetThrust,
            body_part: BodyPart::Torso,
            skill: 40,
            morale: 100.0,
            max_morale: 100.0,
            fatigue: 0.0,
            max_fatigue: 75.0,
            stance: Stance::Balanced,
            riposte: false,
            arm_injured: false,
            defender_stance: Stance::Balanced,
            defender_guarding: false,
        }
    }

    #[test]
    fn test_baseline_is_base_hit() {
        let tuning = MeleeTuning::default();
        let chance = calc_hit_chance(&base_ctx(), &tuning);
        assert!((chance - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_head_is_harder_than_torso() {
        let tuning = MeleeTuning::default();
        let torso = calc_hit_chance(&base_ctx(), &tuning);
        let head = calc_hit_chance(
            &HitContext {
                body_part: BodyPart::Head,
                ..base_ctx()
            },
            &tuning,
        );
        assert!(head < torso);
    }

    #[test]
    fn test_modifiers_push_in_expected_directions() {
        let tuning = MeleeTuning::default();
        let base = calc_hit_chance(&base_ctx(), &tuning);

        let riposte = calc_hit_chance(&HitContext { riposte: true, ..base_ctx() }, &tuning);
        let tired = calc_hit_chance(&HitContext { fatigue: 75.0, ..base_ctx() }, &tuning);
        let shaken = calc_hit_chance(&HitContext { morale: 0.0, ..base_ctx() }, &tuning);
        let guarded = calc_hit_chance(&HitContext { defender_guarding: true, ..base_ctx() }, &tuning);
        let exposed = calc_hit_chance(
            &HitContext {
                defender_stance: Stance::Aggressive,
                ..base_ctx()
            },
            &tuning,
        );
        let hurt_arm = calc_hit_chance(&HitContext { arm_injured: true, ..base_ctx() }, &tuning);

        assert!(riposte > base);
        assert!(tired < base);
        assert!(shaken < base);
        assert!(guarded < base);
        assert!(exposed > base);
        assert!(hurt_arm < base);
    }

    #[test]
    fn test_chance_is_clamped() {
        let tuning = MeleeTuning::default();
        let hopeless = calc_hit_chance(
            &HitContext {
                skill: 0,
                body_part: BodyPart::Head,
                stance: Stance::Defensive,
                defender_stance: Stance::Defensive,
                defender_guarding: true,
                morale: 0.0,
                fatigue: 75.0,
                ..base_ctx()
            },
            &tuning,
        );
        assert_eq!(hopeless, tuning.min_hit);

        let certain = calc_hit_chance(
            &HitContext {
                skill: 100,
                action: MeleeAction::Feint,
                stance: Stance::Aggressive,
                defender_stance: Stance::Aggressive,
                riposte: true,
                ..base_ctx()
            },
            &tuning,
        );
        assert_eq!(certain, tuning.max_hit);
    }

    #[test]
    fn test_non_attack_never_hits() {
        let tuning = MeleeTuning::default();
        let ctx = HitContext {
            action: MeleeAction::Guard,
            ..base_ctx()
        };
        assert_eq!(calc_hit_chance(&ctx, &tuning), 0.0);
    }

    #[test]
    fn test_damage_scaling() {
        let tuning = MeleeTuning::default();
        // 20 rolled + 4 from strength 40
        assert_eq!(calc_damage(MeleeAction::BayonetThrust, BodyPart::Torso, 40, 20, &tuning), 24.0);
        assert_eq!(calc_damage(MeleeAction::BayonetThrust, BodyPart::Head, 40, 20, &tuning), 36.0);
        assert_eq!(calc_damage(MeleeAction::Shoot, BodyPart::Arms, 90, 30, &tuning), 18.0);
        assert_eq!(calc_damage(MeleeAction::Guard, BodyPart::Torso, 40, 20, &tuning), 0.0);
    }

    #[test]
    fn test_stun_chance_combines() {
        let tuning = MeleeTuning::default();
        assert!((stun_chance(MeleeAction::ButtStrike, BodyPart::Head, &tuning) - 0.60).abs() < 1e-9);
        assert_eq!(stun_chance(MeleeAction::BayonetThrust, BodyPart::Torso, &tuning), 0.0);
    }
}
