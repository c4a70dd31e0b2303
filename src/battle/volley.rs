//! Scripted volley resolution
//!
//! One volley runs the full drill in a fixed order:
//! Present -> Fire -> Endure (return fire, hits) -> valor check on losses
//! -> line integrity -> stamina/fatigue -> Load.

use serde::{Deserialize, Serialize};

use crate::battle::config::{BattleConfig, ScriptedVolley};
use crate::battle::state::{BattleState, DrillStep};
use crate::core::config::VolleyTuning;
use crate::core::error::BattleError;
use crate::core::types::{LogKind, MoraleChange, MoraleSource};
use crate::stats::rolls::{
    roll_stat, roll_valor, valor_difficulty, Difficulty, RollResult, RollSource,
};
use crate::stats::thresholds::{FatigueTier, MoraleThreshold};

/// Outcome of one volley
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolleyResult {
    pub narratives: Vec<String>,
    pub valor_roll: Option<RollResult>,
    /// Always zero or negative
    pub line_integrity_change: f64,
    pub player_died: bool,
    pub morale_changes: Vec<MoraleChange>,
    pub enemy_strength_loss: f64,
    pub casualties: u32,
}

/// Working set shared by the scripted and gorge volleys
pub(crate) struct VolleyScratch {
    pub result: VolleyResult,
}

impl VolleyScratch {
    pub fn new() -> Self {
        Self {
            result: VolleyResult::default(),
        }
    }

    pub fn narrate(&mut self, state: &mut BattleState, kind: LogKind, text: impl Into<String>) {
        let text = text.into();
        state.log(kind, text.clone());
        self.result.narratives.push(text);
    }

    pub fn morale(&mut self, state: &mut BattleState, amount: i32, reason: &str, source: MoraleSource) {
        if amount == 0 {
            return;
        }
        let change = MoraleChange::new(amount, reason, source);
        state.apply_morale_change(change.clone());
        self.result.morale_changes.push(change);
    }
}

/// Resolve the volley at `state.volley_index` of the current scripted part
pub fn resolve_scripted_volley(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &VolleyTuning,
    rolls: &mut dyn RollSource,
) -> Result<VolleyResult, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    let part = state.ext.battle_part();
    let volley = config.scripted_volley(part, state.volley_index)?;

    state.turn += 1;
    state.pending_morale_changes.clear();
    state.line.casualties_this_turn = 0;
    let mut scratch = VolleyScratch::new();

    present(state, &mut scratch, tuning, volley.range, volley.artillery, &volley.present);
    fire(state, &mut scratch, tuning, volley, rolls);

    state.drill_step = DrillStep::Endure;
    scratch.narrate(state, LogKind::Narrative, volley.endure.clone());
    let intensity = return_fire_intensity(state, volley.return_fire);
    resolve_return_fire(state, &mut scratch, tuning, intensity, rolls);

    close_volley(state, &mut scratch, tuning, intensity, rolls);

    tracing::debug!(
        battle = %state.battle_id,
        part,
        volley = state.volley_index,
        casualties = scratch.result.casualties,
        enemy_strength = state.enemy.strength,
        "Volley resolved"
    );
    Ok(scratch.result)
}

/// Drill step Present: range closes and the waiting drains nerve
pub(crate) fn present(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    range: f64,
    artillery: bool,
    narrative: &str,
) {
    state.drill_step = DrillStep::Present;
    state.enemy.range = range;
    scratch.narrate(state, LogKind::Order, "\"Présentez armes!\"");
    scratch.narrate(state, LogKind::Narrative, narrative.to_string());

    let closeness = (1.0 - range / tuning.range_fear_reference).max(0.0);
    let fear = -(tuning.range_fear_max * closeness).round() as i32;
    scratch.morale(state, fear, "The enemy line is close", MoraleSource::Passive);

    if artillery || state.enemy.artillery {
        scratch.morale(state, -tuning.artillery_fear, "Roundshot tears the air", MoraleSource::Passive);
    }
    if state.line.nco_present {
        scratch.morale(state, tuning.nco_steadying, "The sergeant dresses the line", MoraleSource::Recovery);
    }
    if state.line.officer.as_ref().map(|o| o.in_line()).unwrap_or(false) {
        scratch.morale(state, tuning.officer_steadying, "The captain stands firm", MoraleSource::Recovery);
    }
}

fn fire(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    volley: &ScriptedVolley,
    rolls: &mut dyn RollSource,
) {
    state.drill_step = DrillStep::Fire;
    scratch.narrate(state, LogKind::Order, "\"Feu!\"");

    let mut loss = company_fire_loss(state, volley.enemy_loss);
    if state.player.musket_loaded {
        let shot = roll_stat(state.player.stats.musketry, Difficulty::Standard, rolls);
        state.player.musket_loaded = false;
        if shot.success {
            loss += tuning.player_shot_bonus;
            scratch.narrate(state, LogKind::Action, "Your ball finds its mark in the white-coated ranks.");
        } else {
            scratch.narrate(state, LogKind::Action, "Your shot vanishes into the smoke.");
        }
    } else {
        scratch.narrate(state, LogKind::Action, "Your musket is not loaded. You go through the motions.");
    }
    scratch.narrate(state, LogKind::Narrative, volley.fire.clone());
    apply_enemy_loss(state, scratch, tuning, loss);
}

/// Strength the company's volley removes before the player's own shot
pub(crate) fn company_fire_loss(state: &BattleState, base: f64) -> f64 {
    base * state.enemy.quality.fragility() * (state.line.line_integrity / 100.0)
}

pub(crate) fn apply_enemy_loss(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    loss: f64,
) {
    let lost = state.enemy.lose_strength(loss);
    state.enemy.lose_integrity(lost * tuning.enemy_integrity_ratio);
    state.enemy.change_morale(-lost);
    scratch.result.enemy_strength_loss += lost;
}

/// Return-fire intensity scaled by what is left of the enemy
pub(crate) fn return_fire_intensity(state: &BattleState, base: f64) -> f64 {
    (base * (state.enemy.strength / 100.0) * state.enemy.quality.accuracy()).clamp(0.0, 1.0)
}

/// Drill step Endure: resolve hits on the neighbours, the officer and the player
pub(crate) fn resolve_return_fire(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    intensity: f64,
    rolls: &mut dyn RollSource,
) {
    let neighbour_chance = intensity * tuning.neighbour_hit_factor;
    let mut casualties = 0;

    for slot in [0, 1] {
        let member = if slot == 0 {
            state.line.left.as_mut()
        } else {
            state.line.right.as_mut()
        };
        let Some(member) = member else { continue };
        if !member.in_line() || rolls.chance() >= neighbour_chance {
            continue;
        }
        casualties += 1;
        let killed = rolls.chance() < tuning.neighbour_kill_chance;
        let name = member.name.clone();
        if killed {
            member.alive = false;
            scratch.narrate(state, LogKind::Event, format!("{} is struck and falls without a sound.", name));
            scratch.morale(state, tuning.neighbour_killed_morale, &format!("{} killed", name), MoraleSource::Event);
        } else {
            member.wounded = true;
            scratch.narrate(state, LogKind::Event, format!("{} cries out and drops from the rank, wounded.", name));
            scratch.morale(state, tuning.neighbour_wounded_morale, &format!("{} wounded", name), MoraleSource::Event);
        }
    }

    let officer_chance = intensity * tuning.officer_hit_factor;
    if let Some(officer) = state.line.officer.as_mut() {
        if officer.in_line() && rolls.chance() < officer_chance {
            officer.wounded = true;
            let name = officer.name.clone();
            casualties += 1;
            scratch.narrate(state, LogKind::Event, format!("{} reels in the saddle and is carried to the rear.", name));
            scratch.morale(state, tuning.officer_down_morale, "The captain is down", MoraleSource::Event);
        }
    }

    let player_chance = intensity * tuning.neighbour_hit_factor;
    let roll = rolls.chance();
    if roll < player_chance {
        let damage = rolls.between(tuning.player_damage_min, tuning.player_damage_max);
        state.player.change_health(-(damage as f64));
        scratch.narrate(state, LogKind::Event, "A ball slams into you. The world tilts.");
        scratch.morale(state, tuning.player_wounded_morale, "You are hit", MoraleSource::Event);
        if state.player.is_down() {
            scratch.result.player_died = true;
        }
    } else if roll < player_chance * tuning.near_miss_factor {
        scratch.narrate(state, LogKind::Event, "A ball hums past your ear close enough to feel.");
        scratch.morale(state, tuning.near_miss_morale, "Near miss", MoraleSource::Event);
    }

    let anonymous = (intensity * tuning.line_casualty_scale).round() as u32;
    if anonymous > 0 {
        scratch.narrate(
            state,
            LogKind::Narrative,
            format!("Further down the line, {} men fall.", anonymous),
        );
    }
    casualties += anonymous;

    state.line.casualties_this_turn += casualties;
    scratch.result.casualties += casualties;
}

/// Valor check on losses, integrity, exertion and the Load step
pub(crate) fn close_volley(
    state: &mut BattleState,
    scratch: &mut VolleyScratch,
    tuning: &VolleyTuning,
    intensity: f64,
    rolls: &mut dyn RollSource,
) {
    let casualties = scratch.result.casualties;

    if casualties > 0 && !scratch.result.player_died {
        let difficulty = valor_difficulty(state.player.morale_threshold());
        let check = roll_valor(state.player.stats.valor, difficulty, rolls);
        if check.success {
            scratch.narrate(state, LogKind::Morale, "You close your ears to the screams and hold.");
            scratch.morale(state, tuning.valor_success_morale, "Held firm", MoraleSource::Action);
        } else {
            scratch.narrate(state, LogKind::Morale, "Your hands shake. Every fibre of you wants to run.");
            scratch.morale(state, tuning.valor_failure_morale, "Nerve failing", MoraleSource::Action);
        }
        scratch.result.valor_roll = Some(check);
    }

    let mut loss = casualties as f64 * tuning.integrity_per_casualty
        + intensity * tuning.integrity_fire_loss;
    if state.line.nco_present {
        loss *= tuning.nco_integrity_factor;
    }
    scratch.result.line_integrity_change = state.line.lose_integrity(loss);

    let total: i32 = scratch.result.morale_changes.iter().map(|c| c.amount).sum();
    state.line.change_line_morale(total as f64 / 2.0);
    for member in state.line.members_mut() {
        if member.in_line() {
            member.change_morale(total as f64 / 2.0);
        }
    }

    state.player.change_stamina(-tuning.volley_stamina_cost);
    state.player.change_fatigue(tuning.volley_fatigue);

    if !scratch.result.player_died {
        load(state, scratch, rolls);
    }
}

/// Drill step Load: harder when frightened or worn out
fn load(state: &mut BattleState, scratch: &mut VolleyScratch, rolls: &mut dyn RollSource) {
    state.drill_step = DrillStep::Load;
    scratch.narrate(state, LogKind::Order, "\"Chargez!\"");

    let mut difficulty = Difficulty::Standard;
    if state.player.morale_threshold() >= MoraleThreshold::Wavering {
        difficulty = difficulty.harder();
    }
    if state.player.fatigue_tier() >= FatigueTier::Fatigued {
        difficulty = difficulty.harder();
    }

    let check = roll_stat(state.player.stats.musketry, difficulty, rolls);
    state.player.musket_loaded = check.success;
    if check.success {
        scratch.narrate(state, LogKind::Action, "Bite, pour, ram. The musket is loaded.");
    } else {
        scratch.narrate(state, LogKind::Action, "Your fingers fumble the cartridge. The musket stays empty.");
    }
    state.last_load_result = Some(check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::execution::create_battle_state;
    use crate::campaign::character::PlayerCharacter;
    use crate::content::ContentRegistry;
    use crate::core::config::EngineTuning;
    use crate::stats::rolls::ScriptedRolls;

    fn line_state(registry: &ContentRegistry) -> BattleState {
        let config = registry.battle("rivoli").unwrap();
        let npcs = registry.campaign("italy").unwrap().roster.clone();
        let mut state = create_battle_state(config, &PlayerCharacter::new("Jean"), &npcs, &EngineTuning::default());
        state.phase = crate::battle::state::BattlePhase::Line;
        state
    }

    #[test]
    fn test_quiet_volley_keeps_everyone_standing() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = line_state(&registry);

        // every chance roll misses, every d100 passes
        let mut rolls = ScriptedRolls::new()
            .with_d100s(&[10, 10, 10])
            .with_chances(&[0.99; 8]);
        let result = resolve_scripted_volley(&mut state, config, &tuning.volley, &mut rolls).unwrap();

        assert!(!result.player_died);
        assert!(result.line_integrity_change <= 0.0);
        assert!(result.enemy_strength_loss > 0.0);
        assert!(state.player.musket_loaded);
        assert_eq!(state.drill_step, DrillStep::Load);
        assert!(state.line.left.as_ref().unwrap().alive);
        assert_eq!(state.turn, 1);
    }

    #[test]
    fn test_neighbour_killed_triggers_valor_check() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = line_state(&registry);
        state.volley_index = 2;

        // left neighbour hit and killed, right missed, officer missed, player missed
        let mut rolls = ScriptedRolls::new()
            .with_d100s(&[10, 10, 10])
            .with_chances(&[0.0, 0.0, 0.99, 0.99, 0.99]);
        let result = resolve_scripted_volley(&mut state, config, &tuning.volley, &mut rolls).unwrap();

        assert!(!state.line.left.as_ref().unwrap().alive);
        assert!(result.valor_roll.is_some());
        assert!(result.casualties >= 1);
        assert!(result
            .morale_changes
            .iter()
            .any(|c| c.amount == tuning.volley.neighbour_killed_morale));
        assert_eq!(state.pending_morale_changes, result.morale_changes);
    }

    #[test]
    fn test_player_hit_can_be_lethal() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = line_state(&registry);
        state.volley_index = 3;
        state.player.health = 5.0;

        let mut rolls = ScriptedRolls::new()
            .with_d100s(&[10])
            .with_chances(&[0.99, 0.99, 0.99, 0.0]);
        let result = resolve_scripted_volley(&mut state, config, &tuning.volley, &mut rolls).unwrap();

        assert!(result.player_died);
        assert_eq!(state.player.health, 0.0);
        // no load step for a fallen man
        assert!(state.last_load_result.is_none());
    }

    #[test]
    fn test_volley_out_of_range() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let tuning = EngineTuning::default();
        let mut state = line_state(&registry);
        state.volley_index = 99;

        let mut rolls = ScriptedRolls::new();
        let err = resolve_scripted_volley(&mut state, config, &tuning.volley, &mut rolls).unwrap_err();
        assert_eq!(err, BattleError::VolleyOutOfRange { part: 1, index: 99 });
    }
}
