//! Gorge volleys: firing down on a trapped column
//!
//! The player picks a target for each volley. The rest of the line fires
//! regardless; the choice decides what the player's own shot does.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::config::BattleConfig;
use crate::battle::state::{BattleState, DrillStep};
use crate::battle::volley::{
    apply_enemy_loss, close_volley, company_fire_loss, present, resolve_return_fire,
    return_fire_intensity, VolleyResult, VolleyScratch,
};
use crate::core::config::VolleyTuning;
use crate::core::error::BattleError;
use crate::core::types::{LogKind, MoraleSource};
use crate::stats::rolls::{roll_stat, Difficulty, RollSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GorgeTarget {
    Column,
    Officer,
    Wagon,
    /// Withhold fire
    Mercy,
}

impl GorgeTarget {
    pub const ALL: [GorgeTarget; 4] = [
        GorgeTarget::Column,
        GorgeTarget::Officer,
        GorgeTarget::Wagon,
        GorgeTarget::Mercy,
    ];

    pub fn parse(name: &str) -> Option<GorgeTarget> {
        match name.to_ascii_lowercase().as_str() {
            "column" => Some(GorgeTarget::Column),
            "officer" => Some(GorgeTarget::Officer),
            "wagon" => Some(GorgeTarget::Wagon),
            "mercy" => Some(GorgeTarget::Mercy),
            _ => None,
        }
    }
}

impl fmt::Display for GorgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GorgeTarget::Column => "column",
            GorgeTarget::Officer => "officer",
            GorgeTarget::Wagon => "wagon",
            GorgeTarget::Mercy => "mercy",
        };
        f.write_str(label)
    }
}

/// Whether the column has been shot down to surrender
pub fn column_surrendered(state: &BattleState, tuning: &VolleyTuning) -> bool {
    state.enemy.strength <= tuning.gorge_surrender_strength
}

/// Resolve one gorge volley with the player's chosen target
pub fn resolve_auto_gorge_volley(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &VolleyTuning,
    rolls: &mut dyn RollSource,
    target: GorgeTarget,
) -> Result<VolleyResult, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    let part = state.ext.battle_part();
    let volley = config.gorge_volley(part, state.volley_index)?;
    if state.ext.rivoli().is_none() {
        return Err(BattleError::NotGorgePart(part));
    }

    state.turn += 1;
    state.pending_morale_changes.clear();
    state.line.casualties_this_turn = 0;
    if let Some(ext) = state.ext.rivoli_mut() {
        ext.gorge_target = Some(target);
    }
    let mut scratch = VolleyScratch::new();

    present(state, &mut scratch, tuning, volley.range, false, &volley.narrative);

    state.drill_step = DrillStep::Fire;
    scratch.narrate(state, LogKind::Order, "\"Feu!\"");
    let mut loss = company_fire_loss(state, volley.enemy_loss);
    loss += fire_at_target(state, &mut scratch, tuning, rolls, target);
    apply_enemy_loss(state, &mut scratch, tuning, loss);

    state.drill_step = DrillStep::Endure;
    let intensity = return_fire_intensity(state, volley.return_fire);
    resolve_return_fire(state, &mut scratch, tuning, intensity, rolls);
    close_volley(state, &mut scratch, tuning, intensity, rolls);

    if column_surrendered(state, tuning) {
        scratch.narrate(
            state,
            LogKind::Result,
            "White rags go up along the floor of the gorge. The column surrenders.",
        );
    }

    tracing::debug!(
        battle = %state.battle_id,
        target = %target,
        enemy_strength = state.enemy.strength,
        "Gorge volley resolved"
    );
    Ok(scratch.result)
}

/// The player's own shot; returns extra enemy strength lost
fn fire_at_target(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    rolls: &mut dyn RollSource,
    target: GorgeTarget,
) -> f64 {
    if target == GorgeTarget::Mercy {
        if let Some(ext) = state.ext.rivoli_mut() {
            ext.gorge_mercy_count += 1;
        }
        scratch.narrate(
            state,
            LogKind::Action,
            "You raise your musket with the others, and fire high over their heads.",
        );
        return 0.0;
    }

    if !state.player.musket_loaded {
        scratch.narrate(state, LogKind::Action, "Your musket is empty. You can only watch.");
        return 0.0;
    }
    state.player.musket_loaded = false;

    match target {
        GorgeTarget::Column => {
            let shot = roll_stat(state.player.stats.musketry, Difficulty::Standard, rolls);
            if shot.success {
                scratch.narrate(state, LogKind::Action, "You fire into the packed column. You cannot miss.");
                tuning.player_shot_bonus
            } else {
                scratch.narrate(state, LogKind::Action, "Your ball strikes the rock wall.");
                0.0
            }
        }
        GorgeTarget::Officer => {
            let already = state.ext.rivoli().map(|e| e.officer_shot).unwrap_or(false);
            let shot = roll_stat(state.player.stats.musketry, Difficulty::Hard, rolls);
            if shot.success && !already {
                if let Some(ext) = state.ext.rivoli_mut() {
                    ext.officer_shot = true;
                }
                state.enemy.lose_integrity(tuning.officer_shot_integrity);
                scratch.narrate(
                    state,
                    LogKind::Action,
                    "The mounted officer rallying the column pitches from his saddle.",
                );
                state.player.change_napoleon_rep(2);
            } else if shot.success {
                scratch.narrate(state, LogKind::Action, "You hit a man in the press where the officer fell.");
            } else {
                scratch.narrate(state, LogKind::Action, "You aim for the officer. He rides on.");
            }
            0.0
        }
        GorgeTarget::Wagon => fire_at_wagon(state, scratch, tuning, rolls),
        GorgeTarget::Mercy => 0.0,
    }
}

fn fire_at_wagon(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    rolls: &mut dyn RollSource,
) -> f64 {
    let detonated = state.ext.rivoli().map(|e| e.wagon_detonated).unwrap_or(true);
    if detonated {
        scratch.narrate(state, LogKind::Action, "Only burning wreckage remains of the wagon.");
        return 0.0;
    }

    let shot = roll_stat(state.player.stats.musketry, Difficulty::Standard, rolls);
    if !shot.success {
        scratch.narrate(state, LogKind::Action, "Your ball skips off the wagon's iron tyre.");
        return 0.0;
    }

    let mut exploded = false;
    if let Some(ext) = state.ext.rivoli_mut() {
        ext.wagon_damage += tuning.wagon_hit_damage;
        if ext.wagon_damage >= tuning.wagon_detonation_threshold {
            ext.wagon_detonated = true;
            exploded = true;
        }
    }

    if exploded {
        scratch.narrate(
            state,
            LogKind::Event,
            "The ammunition wagon detonates. The gorge fills with fire and screaming.",
        );
        scratch.morale(state, tuning.wagon_detonation_morale, "The wagon goes up", MoraleSource::Event);
        tuning.wagon_strength_penalty
    } else {
        scratch.narrate(state, LogKind::Action, "Splinters fly from the ammunition wagon.");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::execution::create_battle_state;
    use crate::battle::state::BattlePhase;
    use crate::campaign::character::PlayerCharacter;
    use crate::content::ContentRegistry;
    use crate::core::config::EngineTuning;
    use crate::stats::rolls::ScriptedRolls;

    fn gorge_state(registry: &ContentRegistry) -> BattleState {
        let config = registry.battle("rivoli").unwrap();
        let npcs = registry.campaign("italy").unwrap().roster.clone();
        let mut state =
            create_battle_state(config, &PlayerCharacter::new("Jean"), &npcs, &EngineTuning::default());
        state.phase = BattlePhase::Line;
        state.ext.set_battle_part(3);
        state.enemy = config.part(3).unwrap().enemy.clone();
        state
    }

    #[test]
    fn test_wagon_detonates_once() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = gorge_state(&registry);
        let mut strengths = Vec::new();

        for index in 0..3 {
            state.volley_index = index;
            state.player.musket_loaded = true;
            let mut rolls = ScriptedRolls::new().with_d100s(&[5; 4]);
            resolve_auto_gorge_volley(&mut state, config, &tuning.volley, &mut rolls, GorgeTarget::Wagon)
                .unwrap();
            strengths.push(state.enemy.strength);
        }

        let ext = state.ext.rivoli().unwrap();
        assert!(ext.wagon_detonated);
        // 35 * 3 crosses the threshold on the third hit
        assert_eq!(ext.wagon_damage, 105.0);
        assert!(strengths.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_mercy_counts_and_withholds_fire() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = gorge_state(&registry);

        state.player.musket_loaded = true;
        let strength_before = state.enemy.strength;
        let wagon_before = state.ext.rivoli().unwrap().wagon_damage;
        let company_loss = company_fire_loss(&state, config.gorge_volley(3, 0).unwrap().enemy_loss);

        let mut rolls = ScriptedRolls::new();
        let result =
            resolve_auto_gorge_volley(&mut state, config, &tuning.volley, &mut rolls, GorgeTarget::Mercy)
                .unwrap();

        let ext = state.ext.rivoli().unwrap();
        assert_eq!(ext.gorge_mercy_count, 1);
        assert_eq!(ext.gorge_target, Some(GorgeTarget::Mercy));
        assert_eq!(ext.wagon_damage, wagon_before);
        // only the rest of the line's fire lands
        assert!((result.enemy_strength_loss - company_loss).abs() < 1e-9);
        assert!((strength_before - state.enemy.strength - company_loss).abs() < 1e-9);
    }

    #[test]
    fn test_scripted_part_rejects_gorge_fire() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = gorge_state(&registry);
        state.ext.set_battle_part(1);

        let mut rolls = ScriptedRolls::new();
        let err = resolve_auto_gorge_volley(&mut state, config, &tuning.volley, &mut rolls, GorgeTarget::Column)
            .unwrap_err();
        assert_eq!(err, BattleError::NotGorgePart(1));
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(GorgeTarget::parse("Wagon"), Some(GorgeTarget::Wagon));
        assert_eq!(GorgeTarget::parse("horse"), None);
    }
}
