//! Battle state machine
//!
//! Intro -> Line -> {StoryBeat <-> Line} -> Melee -> StoryBeat -> Complete.
//! Each command is applied synchronously to an exclusively borrowed
//! `BattleState`; a rejected command leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::battle::config::{BattleConfig, FollowUp};
use crate::battle::gorge::{column_surrendered, resolve_auto_gorge_volley, GorgeTarget};
use crate::battle::state::{
    BattleOutcome, BattlePhase, BattlePlayer, BattleState, DrillStep, EnemyQuality, EnemyState, LineState,
    StoryBeatId,
};
use crate::battle::story::{available_choices, resolve_story_beat, BeatOutcome, BeatTransition, ChoiceId};
use crate::battle::volley::{resolve_scripted_volley, VolleyResult};
use crate::campaign::character::PlayerCharacter;
use crate::campaign::npc::Npc;
use crate::combat::resolution::{
    available_actions, resolve_melee_exchange, resolve_melee_rout, ExchangeReport, PlayerMeleeInput,
};
use crate::combat::stance::{BodyPart, MeleeAction, Stance};
use crate::combat::state::MeleeOutcome;
use crate::combat::waves::build_melee_state;
use crate::core::config::EngineTuning;
use crate::core::error::BattleError;
use crate::core::types::LogKind;
use crate::stats::rolls::RollSource;
use crate::stats::thresholds::MoraleThreshold;

/// A player command forwarded by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleCommand {
    /// Leave the intro, or fire the next volley (at the column in the gorge)
    Advance,
    Choose(ChoiceId),
    Melee(PlayerMeleeInput),
    Flee,
    GorgeFire(GorgeTarget),
}

impl BattleCommand {
    fn expected_phase(&self) -> BattlePhase {
        match self {
            BattleCommand::Advance | BattleCommand::GorgeFire(_) => BattlePhase::Line,
            BattleCommand::Choose(_) => BattlePhase::StoryBeat,
            BattleCommand::Melee(_) | BattleCommand::Flee => BattlePhase::Melee,
        }
    }
}

/// What one command did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Log lines appended by this command
    pub narratives: Vec<String>,
    pub volley: Option<VolleyResult>,
    pub exchange: Option<ExchangeReport>,
    pub beat: Option<BeatOutcome>,
    pub phase: BattlePhase,
    pub battle_over: bool,
    pub outcome: BattleOutcome,
}

/// Build the opening state of a battle from the campaign's character and roster
pub fn create_battle_state(
    config: &BattleConfig,
    character: &PlayerCharacter,
    npcs: &[Npc],
    tuning: &EngineTuning,
) -> BattleState {
    let enemy = config
        .parts
        .first()
        .map(|p| p.enemy.clone())
        .unwrap_or_else(|| EnemyState::new(150.0, EnemyQuality::Line));

    let mut state = BattleState {
        battle_id: config.id.clone(),
        phase: BattlePhase::Intro,
        turn: 0,
        drill_step: DrillStep::Present,
        volley_index: 0,
        player: BattlePlayer::from_character(character, tuning.melee.canteen_uses),
        line: LineState::from_roster(npcs),
        enemy,
        log: Vec::new(),
        pending_morale_changes: Vec::new(),
        melee_state: None,
        ext: config.kind.initial_ext(),
        charge_encounter: None,
        last_load_result: None,
        kills: 0,
        battle_over: false,
        outcome: BattleOutcome::Pending,
    };
    for text in &config.intro {
        state.log(LogKind::Narrative, text.clone());
    }

    tracing::info!(battle = %config.id, player = %character.name, "Battle created");
    state
}

/// Apply one command
pub fn advance(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &EngineTuning,
    rolls: &mut dyn RollSource,
    command: BattleCommand,
) -> Result<StepReport, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    let log_start = state.log.len();
    let mut volley = None;
    let mut exchange = None;
    let mut beat = None;

    match (state.phase, command) {
        (BattlePhase::Intro, BattleCommand::Advance) => {
            let part = state.ext.battle_part();
            begin_part(state, config, part)?;
        }
        (BattlePhase::Line, BattleCommand::Advance) => {
            let part = config.part(state.ext.battle_part())?;
            let result = if part.is_gorge() {
                resolve_auto_gorge_volley(state, config, &tuning.volley, rolls, GorgeTarget::Column)?
            } else {
                resolve_scripted_volley(state, config, &tuning.volley, rolls)?
            };
            after_volley(state, config, tuning, &result)?;
            volley = Some(result);
        }
        (BattlePhase::Line, BattleCommand::GorgeFire(target)) => {
            let result = resolve_auto_gorge_volley(state, config, &tuning.volley, rolls, target)?;
            after_volley(state, config, tuning, &result)?;
            volley = Some(result);
        }
        (BattlePhase::StoryBeat, BattleCommand::Choose(choice)) => {
            beat = Some(resolve_story_beat(state, config, tuning, rolls, &choice)?);
        }
        (BattlePhase::Melee, BattleCommand::Melee(input)) => {
            let report = resolve_melee_exchange(state, &tuning.melee, rolls, input)?;
            after_exchange(state, config, tuning, report.outcome)?;
            exchange = Some(report);
        }
        (BattlePhase::Melee, BattleCommand::Flee) => {
            resolve_melee_rout(state)?;
        }
        (actual, command) => {
            return Err(BattleError::WrongPhase {
                expected: command.expected_phase(),
                actual,
            });
        }
    }

    Ok(StepReport {
        narratives: state.log[log_start..].iter().map(|e| e.text.clone()).collect(),
        volley,
        exchange,
        beat,
        phase: state.phase,
        battle_over: state.battle_over,
        outcome: state.outcome,
    })
}

/// Spend a Grace on a lethal outcome, or die; returns true if the player lives
pub fn apply_grace_or_death(state: &mut BattleState) -> bool {
    if !state.player.is_down() {
        return true;
    }
    if state.player.grace > 0 {
        state.player.grace -= 1;
        state.player.restore_to_half();
        state.log(
            LogKind::Event,
            "The darkness takes you, and then lets you go. You wake in the smoke, somehow alive.",
        );
        tracing::info!(battle = %state.battle_id, grace_left = state.player.grace, "Grace spent");
        return true;
    }

    state.player.alive = false;
    state.log(LogKind::Result, "You fall, and the battle goes on without you.");
    state.finish_battle(BattleOutcome::Defeat);
    false
}

fn after_volley(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &EngineTuning,
    result: &VolleyResult,
) -> Result<(), BattleError> {
    if (result.player_died || state.player.is_down()) && !apply_grace_or_death(state) {
        return Ok(());
    }

    let part = config.part(state.ext.battle_part())?;
    let index = state.volley_index;
    state.volley_index += 1;

    if state.line.line_integrity <= 0.0 {
        state.log(LogKind::Result, "The line dissolves. Men throw down their muskets and run, and you run with them.");
        state.finish_battle(BattleOutcome::Rout);
        return Ok(());
    }

    if part.is_gorge() && column_surrendered(state, &tuning.volley) {
        return apply_transition(state, config, tuning, &BeatTransition::Beat(StoryBeatId::Aftermath));
    }

    match part.follow_up(index).cloned().unwrap_or(FollowUp::NextVolley) {
        FollowUp::NextVolley => {
            state.drill_step = DrillStep::Present;
            Ok(())
        }
        FollowUp::StoryBeat(id) => apply_transition(state, config, tuning, &BeatTransition::Beat(id)),
        FollowUp::Melee { encounter, stage } => {
            apply_transition(state, config, tuning, &BeatTransition::Melee { encounter, stage })
        }
    }
}

fn after_exchange(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &EngineTuning,
    outcome: MeleeOutcome,
) -> Result<(), BattleError> {
    match outcome {
        MeleeOutcome::Ongoing => return Ok(()),
        MeleeOutcome::Rout => {
            state.finish_battle(BattleOutcome::Rout);
            return Ok(());
        }
        MeleeOutcome::Defeat => {
            if !apply_grace_or_death(state) {
                return Ok(());
            }
        }
        MeleeOutcome::Victory => {
            state.log(LogKind::Result, "The last of them goes down. The ground is yours.");
        }
        MeleeOutcome::Survived => {
            state.log(LogKind::Result, "The press breaks apart. You are still standing.");
        }
    }

    let melee = state.melee_state.take().ok_or(BattleError::NoMeleeState)?;
    state.player.musket_loaded = melee.is_loaded();
    let next = config.encounter(&melee.encounter_key)?.next_beat;
    tracing::info!(
        battle = %state.battle_id,
        encounter = %melee.encounter_key,
        kills = melee.kill_count,
        "Melee ended"
    );
    apply_transition(state, config, tuning, &BeatTransition::Beat(next))
}

/// Move the battle to the state a beat or volley follow-up names
pub(crate) fn apply_transition(
    state: &mut BattleState,
    config: &BattleConfig,
    _tuning: &EngineTuning,
    transition: &BeatTransition,
) -> Result<(), BattleError> {
    match transition {
        BeatTransition::ResumeLine => {
            state.drill_step = DrillStep::Present;
            state.set_phase(BattlePhase::Line);
        }
        BeatTransition::Beat(id) => {
            let def = config.story_beat(*id)?;
            state.charge_encounter = Some(*id);
            state.set_phase(BattlePhase::StoryBeat);
            let narrative = (def.narrative)(state);
            state.log(LogKind::Narrative, narrative);
        }
        BeatTransition::Melee { encounter, stage } => enter_melee(state, config, encounter, *stage)?,
        BeatTransition::BeginPart(part) => begin_part(state, config, *part)?,
        BeatTransition::EndBattle(outcome) => state.finish_battle(*outcome),
    }
    Ok(())
}

/// Start a battle part: fresh volley table, fresh enemy, back in the line
pub(crate) fn begin_part(state: &mut BattleState, config: &BattleConfig, number: u8) -> Result<(), BattleError> {
    let part = config.part(number)?;
    state.ext.set_battle_part(number);
    state.volley_index = 0;
    state.enemy = part.enemy.clone();
    state.drill_step = DrillStep::Present;
    state.charge_encounter = None;
    state.log(LogKind::Narrative, part.title.clone());
    state.log(LogKind::Narrative, part.intro.clone());
    state.set_phase(BattlePhase::Line);
    tracing::debug!(battle = %state.battle_id, part = number, "Part begun");
    Ok(())
}

/// Build the melee for an encounter and switch to the Melee phase
pub(crate) fn enter_melee(
    state: &mut BattleState,
    config: &BattleConfig,
    key: &str,
    stage: u8,
) -> Result<(), BattleError> {
    let encounter = config.encounter(key)?;
    let melee = build_melee_state(encounter, stage, &state.line, state.player.musket_loaded);
    state.ext.set_melee_stage(stage);
    state.enemy.range = 0.0;
    state.charge_encounter = None;
    state.log(LogKind::Narrative, encounter.intro.clone());
    tracing::info!(
        battle = %state.battle_id,
        encounter = key,
        stage,
        engaged = melee.active_enemies.len(),
        "Melee begun"
    );
    state.melee_state = Some(melee);
    state.set_phase(BattlePhase::Melee);
    Ok(())
}

/// A reasonable command for the current state, for auto-play
///
/// Takes the first available choice, fires at the column, shoots when
/// loaded and thrusts at the torso otherwise, and flees only once broken.
pub fn auto_command(state: &BattleState, config: &BattleConfig, tuning: &EngineTuning) -> Option<BattleCommand> {
    if state.battle_over {
        return None;
    }
    match state.phase {
        BattlePhase::Intro | BattlePhase::Line => Some(BattleCommand::Advance),
        BattlePhase::StoryBeat => available_choices(state, config)
            .ok()?
            .into_iter()
            .find(|c| c.available)
            .map(|c| BattleCommand::Choose(c.id)),
        BattlePhase::Melee => {
            if state.player.morale_threshold() == MoraleThreshold::Breaking {
                return Some(BattleCommand::Flee);
            }
            let actions = available_actions(state, &tuning.melee);
            let action = [MeleeAction::Shoot, MeleeAction::BayonetThrust, MeleeAction::ButtStrike]
                .into_iter()
                .find(|a| actions.contains(a))
                .unwrap_or(MeleeAction::Respite);
            Some(BattleCommand::Melee(
                PlayerMeleeInput::new(Stance::Balanced, action).at(BodyPart::Torso),
            ))
        }
        BattlePhase::Complete => None,
    }
}
