//! Melee exchange resolution
//!
//! One exchange: opponent intents are fixed first, then the player acts,
//! then the allies, then the opponents still standing. Waves and backfill
//! run after the blows, then the termination check.

use serde::{Deserialize, Serialize};

use crate::battle::state::{BattlePhase, BattleOutcome, BattleState};
use crate::combat::ai::{choose_ally_action, choose_opponent_intent, Intent, IntentTarget};
use crate::combat::hit::{calc_damage, calc_hit_chance, stun_chance, HitContext};
use crate::combat::stance::{respite_recovery, stamina_cost, BodyPart, MeleeAction, Stance};
use crate::combat::state::{
    MeleeCombatant, MeleeOutcome, MeleeState, RoundEntry, RELOAD_EMPTY, RELOAD_HALF, RELOAD_LOADED,
};
use crate::combat::waves::process_waves;
use crate::core::config::MeleeTuning;
use crate::core::error::BattleError;
use crate::core::types::{LogKind, MoraleChange, MoraleSource};
use crate::stats::rolls::{roll_stat, Difficulty, RollSource};
use crate::stats::thresholds::MoraleThreshold;

/// Soldier reputation lost for running from a melee
pub const ROUT_SOLDIER_REP_PENALTY: i32 = 15;

/// The player's orders for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMeleeInput {
    pub stance: Stance,
    pub action: MeleeAction,
    /// Defaults to the torso for attacks
    pub body_part: Option<BodyPart>,
    /// Index into `MeleeState::opponents`; defaults to the current target
    pub target: Option<usize>,
}

impl PlayerMeleeInput {
    pub fn new(stance: Stance, action: MeleeAction) -> Self {
        Self {
            stance,
            action,
            body_part: None,
            target: None,
        }
    }

    pub fn at(mut self, body_part: BodyPart) -> Self {
        self.body_part = Some(body_part);
        self
    }

    pub fn targeting(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }
}

/// Result of one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeReport {
    pub entries: Vec<RoundEntry>,
    pub narratives: Vec<String>,
    pub morale_changes: Vec<MoraleChange>,
    pub outcome: MeleeOutcome,
}

/// Actions the player can take right now
pub fn available_actions(state: &BattleState, tuning: &MeleeTuning) -> Vec<MeleeAction> {
    let Some(melee) = state.melee_state.as_ref() else {
        return Vec::new();
    };
    MeleeAction::ALL
        .iter()
        .copied()
        .filter(|&action| action_available(state, melee, melee.player_stance, action, tuning).is_ok())
        .collect()
}

fn action_available(
    state: &BattleState,
    melee: &MeleeState,
    stance: Stance,
    action: MeleeAction,
    tuning: &MeleeTuning,
) -> Result<(), BattleError> {
    let player = &state.player;
    let cost = stamina_cost(action, stance, player.leg_injured, tuning);
    let reason = match action {
        MeleeAction::Shoot if !melee.is_loaded() => Some("the musket is not loaded"),
        MeleeAction::Reload if melee.is_loaded() => Some("the musket is already loaded"),
        MeleeAction::UseCanteen if player.canteen_uses == 0 => Some("the canteen is empty"),
        MeleeAction::UseCanteen if player.health >= player.max_health => Some("you are not hurt"),
        MeleeAction::SecondWind if player.fatigue <= 0.0 => Some("you are not fatigued"),
        MeleeAction::Respite | MeleeAction::SecondWind | MeleeAction::UseCanteen => None,
        _ if player.stamina < cost => Some("too exhausted"),
        _ => None,
    };
    match reason {
        Some(reason) => Err(BattleError::ActionUnavailable(format!("{}: {}", action, reason))),
        None => Ok(()),
    }
}

/// Working set for one exchange
struct Exchange<'a> {
    number: u32,
    tuning: &'a MeleeTuning,
    entries: Vec<RoundEntry>,
    narratives: Vec<String>,
    morale_changes: Vec<MoraleChange>,
    player_hit: bool,
}

impl<'a> Exchange<'a> {
    fn record(&mut self, state: &mut BattleState, melee: &mut MeleeState, entry: RoundEntry) {
        state.log(LogKind::Action, entry.text.clone());
        melee.round_log.push(entry.clone());
        self.entries.push(entry);
    }

    fn narrate(&mut self, state: &mut BattleState, kind: LogKind, text: String) {
        state.log(kind, text.clone());
        self.narratives.push(text);
    }

    fn morale(&mut self, state: &mut BattleState, amount: i32, reason: &str, source: MoraleSource) {
        let change = MoraleChange::new(amount, reason, source);
        state.apply_morale_change(change.clone());
        self.morale_changes.push(change);
    }

    fn entry(&self, actor: &str, action: MeleeAction, text: String) -> RoundEntry {
        RoundEntry {
            exchange: self.number,
            actor: actor.to_string(),
            target: None,
            action,
            body_part: None,
            hit: false,
            damage: 0.0,
            killed: false,
            text,
        }
    }
}

/// Outcome of one attack roll before it is applied
struct Strike {
    hit: bool,
    damage: f64,
    kill: bool,
    stun: bool,
}

fn roll_strike(ctx: &HitContext, strength: u32, tuning: &MeleeTuning, rolls: &mut dyn RollSource) -> Strike {
    let chance = calc_hit_chance(ctx, tuning);
    if rolls.chance() >= chance {
        return Strike {
            hit: false,
            damage: 0.0,
            kill: false,
            stun: false,
        };
    }

    let (damage_min, damage_max) = ctx
        .action
        .attack_tuning(tuning)
        .map(|a| (a.damage_min, a.damage_max))
        .unwrap_or((0, 0));
    let rolled = rolls.between(damage_min, damage_max);
    let damage = calc_damage(ctx.action, ctx.body_part, strength, rolled, tuning);

    let part = ctx.body_part.tuning(tuning);
    let kill = ctx.action != MeleeAction::Feint && part.kill_chance > 0.0 && rolls.chance() < part.kill_chance;
    let stun_odds = stun_chance(ctx.action, ctx.body_part, tuning);
    let stun = ctx.action != MeleeAction::Feint && stun_odds > 0.0 && rolls.chance() < stun_odds;

    Strike {
        hit: true,
        damage,
        kill,
        stun,
    }
}

/// Apply a landed strike to a combatant; returns true if it killed
fn strike_combatant(target: &mut MeleeCombatant, strike: &Strike, ctx: &HitContext, tuning: &MeleeTuning) -> bool {
    if ctx.action == MeleeAction::Feint {
        target.change_stamina(-tuning.feint_stamina_drain);
        return false;
    }
    target.change_health(-strike.damage);
    if strike.kill {
        target.kill();
    }
    if strike.stun {
        target.stunned = true;
    }
    match ctx.body_part {
        BodyPart::Arms => target.arm_injured = true,
        BodyPart::Legs => target.leg_injured = true,
        _ => {}
    }
    !target.alive
}

fn describe_strike(actor: &str, target: &str, ctx: &HitContext, strike: &Strike, killed: bool) -> String {
    if !strike.hit {
        return format!("{}'s {} misses {}.", actor, ctx.action, target);
    }
    if ctx.action == MeleeAction::Feint {
        return format!("{}'s feint draws {} off balance.", actor, target);
    }
    let mut text = format!(
        "{}'s {} strikes {} in the {} ({:.0}).",
        actor, ctx.action, target, ctx.body_part, strike.damage
    );
    if killed {
        text.push_str(&format!(" {} goes down and does not rise.", target));
    } else if strike.stun {
        text.push_str(&format!(" {} is stunned.", target));
    }
    text
}

/// Resolve one melee exchange
pub fn resolve_melee_exchange(
    state: &mut BattleState,
    tuning: &MeleeTuning,
    rolls: &mut dyn RollSource,
    input: PlayerMeleeInput,
) -> Result<ExchangeReport, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    if state.phase != BattlePhase::Melee {
        return Err(BattleError::WrongPhase {
            expected: BattlePhase::Melee,
            actual: state.phase,
        });
    }
    {
        let melee = state.melee_state.as_ref().ok_or(BattleError::NoMeleeState)?;
        action_available(state, melee, input.stance, input.action, tuning)?;
        if let Some(target) = input.target {
            if !melee.living_active().any(|i| i == target) {
                return Err(BattleError::ActionUnavailable(format!("no opponent {} engaged", target)));
            }
        }
    }
    let mut melee = state.melee_state.take().ok_or(BattleError::NoMeleeState)?;

    state.pending_morale_changes.clear();
    let mut ex = Exchange {
        number: melee.exchange_count + 1,
        tuning,
        entries: Vec::new(),
        narratives: Vec::new(),
        morale_changes: Vec::new(),
        player_hit: false,
    };

    // intents are fixed before anyone moves
    let living_allies: Vec<usize> = melee.living_allies().collect();
    let engaged: Vec<usize> = melee.living_active().collect();
    let intents: Vec<(usize, Option<Intent>)> = engaged
        .iter()
        .map(|&i| (i, choose_opponent_intent(&melee.opponents[i], &living_allies, tuning, rolls)))
        .collect();

    melee.player_guarding = false;
    for &i in &engaged {
        melee.opponents[i].guarding = false;
    }
    for ally in melee.allies.iter_mut() {
        ally.guarding = false;
    }
    melee.player_stance = input.stance;
    if let Some(target) = input.target {
        melee.current_target = target;
    }
    melee.retarget();

    if melee.player_stunned > 0 {
        melee.player_stunned -= 1;
        let entry = ex.entry(&state.player.name, MeleeAction::Respite, "You are still reeling and cannot act.".into());
        ex.record(state, &mut melee, entry);
    } else {
        player_acts(state, &mut melee, &mut ex, rolls, input);
    }

    allies_act(state, &mut melee, &mut ex, rolls);
    opponents_act(state, &mut melee, &mut ex, rolls, intents);

    if ex.player_hit && input.action == MeleeAction::Reload && melee.reload_progress == RELOAD_HALF {
        melee.reload_progress = RELOAD_EMPTY;
        ex.narrate(state, LogKind::Event, "The blow knocks the half-rammed cartridge from your hands.".into());
    }

    melee.exchange_count = ex.number;
    for text in process_waves(&mut melee, &state.line) {
        ex.narrate(state, LogKind::Event, text);
    }
    for name in melee.backfill() {
        ex.narrate(state, LogKind::Event, format!("{} pushes forward to take the fallen man's place.", name));
    }

    let outcome = if state.player.is_down() {
        MeleeOutcome::Defeat
    } else if melee.all_enemies_down() {
        MeleeOutcome::Victory
    } else if melee.exchange_count >= melee.max_exchanges {
        MeleeOutcome::Survived
    } else {
        MeleeOutcome::Ongoing
    };

    if outcome != MeleeOutcome::Ongoing {
        tracing::info!(
            encounter = %melee.encounter_key,
            outcome = ?outcome,
            exchanges = melee.exchange_count,
            kills = melee.kill_count,
            "Melee resolved"
        );
    }
    state.melee_state = Some(melee);

    Ok(ExchangeReport {
        entries: ex.entries,
        narratives: ex.narratives,
        morale_changes: ex.morale_changes,
        outcome,
    })
}

fn player_acts(
    state: &mut BattleState,
    melee: &mut MeleeState,
    ex: &mut Exchange<'_>,
    rolls: &mut dyn RollSource,
    input: PlayerMeleeInput,
) {
    let tuning = ex.tuning;
    let action = input.action;
    let name = state.player.name.clone();
    let cost = stamina_cost(action, melee.player_stance, state.player.leg_injured, tuning);
    state.player.change_stamina(-cost);
    state.player.change_fatigue(cost * tuning.fatigue_per_stamina);

    match action {
        MeleeAction::Guard => {
            melee.player_guarding = true;
            let entry = ex.entry(&name, action, "You bring your musket across your body and wait.".into());
            ex.record(state, melee, entry);
        }
        MeleeAction::Respite => {
            state.player.change_stamina(respite_recovery(state.player.leg_injured, tuning));
            let entry = ex.entry(&name, action, "You give ground and snatch a breath.".into());
            ex.record(state, melee, entry);
        }
        MeleeAction::SecondWind => {
            let check = roll_stat(state.player.stats.endurance, Difficulty::Standard, rolls);
            let text = if check.success {
                state.player.change_fatigue(-tuning.second_wind_ratio * state.player.max_fatigue);
                "Something deep inside you answers. The weariness lifts."
            } else {
                "You reach for a second wind and find nothing there."
            };
            let entry = ex.entry(&name, action, text.into());
            ex.record(state, melee, entry);
        }
        MeleeAction::Reload => {
            melee.reload_progress = (melee.reload_progress + 1).min(RELOAD_LOADED);
            let text = if melee.reload_progress >= RELOAD_LOADED {
                state.player.musket_loaded = true;
                "You ram the ball home. The musket is loaded."
            } else {
                "You tear the cartridge with your teeth and pour."
            };
            let entry = ex.entry(&name, action, text.into());
            ex.record(state, melee, entry);
        }
        MeleeAction::UseCanteen => {
            state.player.change_health(tuning.canteen_heal);
            state.player.canteen_uses = state.player.canteen_uses.saturating_sub(1);
            let entry = ex.entry(&name, action, "You gulp water from the canteen.".into());
            ex.record(state, melee, entry);
        }
        _ => player_attacks(state, melee, ex, rolls, input),
    }
}

fn player_attacks(
    state: &mut BattleState,
    melee: &mut MeleeState,
    ex: &mut Exchange<'_>,
    rolls: &mut dyn RollSource,
    input: PlayerMeleeInput,
) {
    let tuning = ex.tuning;
    let action = input.action;
    let target_idx = melee.current_target;
    let name = state.player.name.clone();

    let Some(target) = melee.opponents.get(target_idx).filter(|o| o.alive) else {
        let entry = ex.entry(&name, action, "There is no one in front of you.".into());
        ex.record(state, melee, entry);
        return;
    };
    let target_name = target.name.clone();

    let ctx = HitContext {
        action,
        body_part: input.body_part.unwrap_or(BodyPart::Torso),
        skill: if action == MeleeAction::Shoot {
            state.player.stats.musketry
        } else {
            state.player.stats.elan
        },
        morale: state.player.morale,
        max_morale: state.player.max_morale,
        fatigue: state.player.fatigue,
        max_fatigue: state.player.max_fatigue,
        stance: melee.player_stance,
        riposte: melee.player_riposte,
        arm_injured: state.player.arm_injured,
        defender_stance: target.stance,
        defender_guarding: target.guarding,
    };
    melee.player_riposte = false;

    if action == MeleeAction::Shoot {
        melee.reload_progress = RELOAD_EMPTY;
        state.player.musket_loaded = false;
    }

    let strike = roll_strike(&ctx, state.player.stats.strength, tuning, rolls);
    let mut killed = false;
    if strike.hit {
        killed = strike_combatant(&mut melee.opponents[target_idx], &strike, &ctx, tuning);
        if action == MeleeAction::Feint {
            melee.player_riposte = true;
        }
    }

    let text = describe_strike(&name, &target_name, &ctx, &strike, killed);
    let mut entry = ex.entry(&name, action, text);
    entry.target = Some(target_name.clone());
    entry.body_part = Some(ctx.body_part);
    entry.hit = strike.hit;
    entry.damage = strike.damage;
    entry.killed = killed;
    ex.record(state, melee, entry);

    if killed {
        melee.kill_count += 1;
        state.kills += 1;
        ex.morale(state, tuning.kill_morale, &format!("Killed {}", target_name), MoraleSource::Action);
        melee.retarget();
    }
}

fn allies_act(state: &mut BattleState, melee: &mut MeleeState, ex: &mut Exchange<'_>, rolls: &mut dyn RollSource) {
    let tuning = ex.tuning;
    let allies: Vec<usize> = melee.living_allies().collect();

    for ally_idx in allies {
        if melee.allies[ally_idx].stunned {
            melee.allies[ally_idx].stunned = false;
            let name = melee.allies[ally_idx].name.clone();
            let entry = ex.entry(&name, MeleeAction::Respite, format!("{} shakes off the blow.", name));
            ex.record(state, melee, entry);
            continue;
        }

        let action = choose_ally_action(&melee.allies[ally_idx], tuning);
        let ally = &mut melee.allies[ally_idx];
        let name = ally.name.clone();
        let cost = stamina_cost(action, ally.stance, ally.leg_injured, tuning);
        ally.change_stamina(-cost);
        ally.change_fatigue(cost * tuning.fatigue_per_stamina);

        if !action.is_attack() {
            let text = if action == MeleeAction::Guard {
                ally.guarding = true;
                format!("{} keeps his guard up.", name)
            } else {
                ally.change_stamina(respite_recovery(ally.leg_injured, tuning));
                format!("{} steps back to catch his breath.", name)
            };
            let entry = ex.entry(&name, action, text);
            ex.record(state, melee, entry);
            continue;
        }

        let target_idx = melee.current_target;
        let Some(target) = melee.opponents.get(target_idx).filter(|o| o.alive) else {
            continue;
        };
        let ally = &melee.allies[ally_idx];
        let ctx = HitContext {
            action,
            body_part: BodyPart::Torso,
            skill: ally.skill,
            morale: ally.health,
            max_morale: ally.max_health,
            fatigue: ally.fatigue,
            max_fatigue: ally.max_fatigue,
            stance: ally.stance,
            riposte: false,
            arm_injured: ally.arm_injured,
            defender_stance: target.stance,
            defender_guarding: target.guarding,
        };
        let target_name = target.name.clone();
        let strength = ally.strength;

        let strike = roll_strike(&ctx, strength, tuning, rolls);
        let killed = strike.hit && strike_combatant(&mut melee.opponents[target_idx], &strike, &ctx, tuning);

        let text = describe_strike(&name, &target_name, &ctx, &strike, killed);
        let mut entry = ex.entry(&name, action, text);
        entry.target = Some(target_name);
        entry.body_part = Some(ctx.body_part);
        entry.hit = strike.hit;
        entry.damage = strike.damage;
        entry.killed = killed;
        ex.record(state, melee, entry);

        if killed {
            melee.retarget();
        }
    }
}

fn opponents_act(
    state: &mut BattleState,
    melee: &mut MeleeState,
    ex: &mut Exchange<'_>,
    rolls: &mut dyn RollSource,
    intents: Vec<(usize, Option<Intent>)>,
) {
    let tuning = ex.tuning;

    for (opp_idx, intent) in intents {
        if state.player.is_down() {
            break;
        }
        if !melee.opponents[opp_idx].alive {
            continue;
        }
        let name = melee.opponents[opp_idx].name.clone();
        if melee.opponents[opp_idx].stunned {
            melee.opponents[opp_idx].stunned = false;
            let entry = ex.entry(&name, MeleeAction::Respite, format!("{} staggers, dazed.", name));
            ex.record(state, melee, entry);
            continue;
        }
        let Some(intent) = intent else { continue };

        let opponent = &mut melee.opponents[opp_idx];
        let cost = stamina_cost(intent.action, opponent.stance, opponent.leg_injured, tuning);
        opponent.change_stamina(-cost);
        opponent.change_fatigue(cost * tuning.fatigue_per_stamina);

        if !intent.action.is_attack() {
            let text = if intent.action == MeleeAction::Guard {
                opponent.guarding = true;
                format!("{} hangs back behind his bayonet.", name)
            } else {
                opponent.change_stamina(respite_recovery(opponent.leg_injured, tuning));
                format!("{} backs off, chest heaving.", name)
            };
            let entry = ex.entry(&name, intent.action, text);
            ex.record(state, melee, entry);
            continue;
        }

        // a dead ally's attacker turns on the player
        let target = match intent.target {
            IntentTarget::Ally(i) if melee.allies.get(i).map(|a| a.alive).unwrap_or(false) => IntentTarget::Ally(i),
            _ => IntentTarget::Player,
        };

        match target {
            IntentTarget::Player => opponent_strikes_player(state, melee, ex, rolls, opp_idx, intent),
            IntentTarget::Ally(ally_idx) => opponent_strikes_ally(state, melee, ex, rolls, opp_idx, ally_idx, intent),
        }
    }
}

fn opponent_ctx(opponent: &MeleeCombatant, intent: &Intent, defender_stance: Stance, defender_guarding: bool) -> HitContext {
    HitContext {
        action: intent.action,
        body_part: intent.body_part,
        skill: opponent.skill,
        // a bleeding man loses heart
        morale: opponent.health,
        max_morale: opponent.max_health,
        fatigue: opponent.fatigue,
        max_fatigue: opponent.max_fatigue,
        stance: opponent.stance,
        riposte: false,
        arm_injured: opponent.arm_injured,
        defender_stance,
        defender_guarding,
    }
}

fn opponent_strikes_player(
    state: &mut BattleState,
    melee: &mut MeleeState,
    ex: &mut Exchange<'_>,
    rolls: &mut dyn RollSource,
    opp_idx: usize,
    intent: Intent,
) {
    let tuning = ex.tuning;
    let opponent = &melee.opponents[opp_idx];
    let name = opponent.name.clone();
    let ctx = opponent_ctx(opponent, &intent, melee.player_stance, melee.player_guarding);
    let strike = roll_strike(&ctx, opponent.strength, tuning, rolls);

    let mut text = describe_strike(&name, "you", &ctx, &strike, false);
    if strike.hit {
        if intent.action == MeleeAction::Feint {
            state.player.change_stamina(-tuning.feint_stamina_drain);
        } else {
            ex.player_hit = true;
            state.player.change_health(-strike.damage);
            if strike.kill {
                state.player.change_health(-state.player.max_health);
            }
            if strike.stun {
                melee.player_stunned = melee.player_stunned.saturating_add(tuning.stun_turns);
            }
            match intent.body_part {
                BodyPart::Arms => state.player.arm_injured = true,
                BodyPart::Legs => state.player.leg_injured = true,
                _ => {}
            }
            if state.player.is_down() {
                text.push_str(" You fall.");
            }
        }
    } else if melee.player_guarding {
        melee.player_riposte = true;
        text.push_str(" You turn the blow aside and see an opening.");
    }

    let mut entry = ex.entry(&name, intent.action, text);
    entry.target = Some(state.player.name.clone());
    entry.body_part = Some(intent.body_part);
    entry.hit = strike.hit;
    entry.damage = strike.damage;
    entry.killed = state.player.is_down();
    ex.record(state, melee, entry);

    if strike.hit && intent.action != MeleeAction::Feint {
        ex.morale(state, tuning.hit_taken_morale, "Wounded in the melee", MoraleSource::Event);
    }
}

fn opponent_strikes_ally(
    state: &mut BattleState,
    melee: &mut MeleeState,
    ex: &mut Exchange<'_>,
    rolls: &mut dyn RollSource,
    opp_idx: usize,
    ally_idx: usize,
    intent: Intent,
) {
    let tuning = ex.tuning;
    let opponent = &melee.opponents[opp_idx];
    let ally = &melee.allies[ally_idx];
    let name = opponent.name.clone();
    let ally_name = ally.name.clone();
    let ctx = opponent_ctx(opponent, &intent, ally.stance, ally.guarding);
    let strike = roll_strike(&ctx, opponent.strength, tuning, rolls);

    let killed = strike.hit && strike_combatant(&mut melee.allies[ally_idx], &strike, &ctx, tuning);
    let text = describe_strike(&name, &ally_name, &ctx, &strike, killed);
    let mut entry = ex.entry(&name, intent.action, text);
    entry.target = Some(ally_name.clone());
    entry.body_part = Some(intent.body_part);
    entry.hit = strike.hit;
    entry.damage = strike.damage;
    entry.killed = killed;
    ex.record(state, melee, entry);

    if killed {
        if let Some(id) = melee.allies[ally_idx].npc_id.clone() {
            if let Some(member) = state.line.member_mut(&id) {
                member.alive = false;
            }
        }
        ex.morale(state, tuning.ally_down_morale, &format!("{} killed", ally_name), MoraleSource::Event);
    }
}

/// Flee the melee; only possible once the player's nerve has broken
pub fn resolve_melee_rout(state: &mut BattleState) -> Result<Vec<String>, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    if state.phase != BattlePhase::Melee {
        return Err(BattleError::WrongPhase {
            expected: BattlePhase::Melee,
            actual: state.phase,
        });
    }
    if state.player.morale_threshold() != MoraleThreshold::Breaking {
        return Err(BattleError::ActionUnavailable(
            "flee: your nerve has not broken".into(),
        ));
    }

    let narratives = vec![
        "You throw down your musket and run.".to_string(),
        "Behind you, men you knew call your name. You do not turn.".to_string(),
    ];
    for text in &narratives {
        state.log(LogKind::Result, text.clone());
    }
    state.player.change_soldier_rep(-ROUT_SOLDIER_REP_PENALTY);
    state.finish_battle(BattleOutcome::Rout);
    Ok(narratives)
}
