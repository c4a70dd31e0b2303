//! Opponent and ally decision making

use crate::combat::stance::{BodyPart, MeleeAction};
use crate::combat::state::{AllyPersonality, MeleeCombatant};
use crate::core::config::MeleeTuning;
use crate::stats::rolls::RollSource;

/// Who an opponent is going for this exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentTarget {
    Player,
    Ally(usize),
}

/// What a fighter intends to do this exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub action: MeleeAction,
    pub body_part: BodyPart,
    pub target: IntentTarget,
}

fn pick_body_part(rolls: &mut dyn RollSource) -> BodyPart {
    let roll = rolls.chance();
    if roll < 0.15 {
        BodyPart::Head
    } else if roll < 0.25 {
        BodyPart::Arms
    } else if roll < 0.35 {
        BodyPart::Legs
    } else {
        BodyPart::Torso
    }
}

fn affordable(fighter: &MeleeCombatant, action: MeleeAction, tuning: &MeleeTuning) -> bool {
    fighter.stamina >= action.base_cost(tuning)
}

/// Opponent intent; stunned opponents lose their turn and return `None`
pub fn choose_opponent_intent(
    opponent: &MeleeCombatant,
    living_allies: &[usize],
    tuning: &MeleeTuning,
    rolls: &mut dyn RollSource,
) -> Option<Intent> {
    if !opponent.alive || opponent.stunned {
        return None;
    }

    let target = if living_allies.is_empty() {
        IntentTarget::Player
    } else {
        let share = (tuning.ally_target_share * living_allies.len() as f64).min(0.75);
        if rolls.chance() < share {
            let pick = rolls.between(0, living_allies.len() as i32 - 1) as usize;
            IntentTarget::Ally(living_allies[pick.min(living_allies.len() - 1)])
        } else {
            IntentTarget::Player
        }
    };

    if opponent.stamina_ratio() < tuning.opponent_respite_ratio {
        return Some(Intent {
            action: MeleeAction::Respite,
            body_part: BodyPart::Torso,
            target,
        });
    }

    let roll = rolls.chance();
    let mut action = if roll < 0.45 {
        MeleeAction::BayonetThrust
    } else if roll < 0.70 {
        MeleeAction::ButtStrike
    } else if roll < 0.85 {
        MeleeAction::AggressiveLunge
    } else if roll < 0.93 {
        MeleeAction::Feint
    } else {
        MeleeAction::Guard
    };
    if !affordable(opponent, action, tuning) {
        action = MeleeAction::BayonetThrust;
    }
    if !affordable(opponent, action, tuning) {
        action = MeleeAction::Respite;
    }

    let body_part = if action.is_attack() {
        pick_body_part(rolls)
    } else {
        BodyPart::Torso
    };

    Some(Intent {
        action,
        body_part,
        target,
    })
}

/// Ally action by personality; allies always go for the torso
pub fn choose_ally_action(ally: &MeleeCombatant, tuning: &MeleeTuning) -> MeleeAction {
    if ally.stunned {
        return MeleeAction::Respite;
    }
    let preferred = match ally.personality {
        AllyPersonality::Aggressive => MeleeAction::AggressiveLunge,
        AllyPersonality::Steady => MeleeAction::BayonetThrust,
        AllyPersonality::Cautious if ally.health_ratio() < 0.4 => MeleeAction::Guard,
        AllyPersonality::Cautious => MeleeAction::BayonetThrust,
    };
    if affordable(ally, preferred, tuning) {
        return preferred;
    }
    if affordable(ally, MeleeAction::BayonetThrust, tuning) {
        MeleeAction::BayonetThrust
    } else {
        MeleeAction::Respite
    }
}
