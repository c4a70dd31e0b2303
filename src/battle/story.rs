//! Story beats: branching choices between volleys
//!
//! A beat is static content. Its `resolve` function mutates battle flags and
//! reputation directly and returns a `BeatOutcome`; pool deltas, log lines and
//! the follow-on transition are applied here so every beat clamps and logs
//! the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::battle::config::BattleConfig;
use crate::battle::execution::{apply_grace_or_death, apply_transition};
use crate::battle::state::{BattleOutcome, BattlePhase, BattleState, StoryBeatId};
use crate::core::config::EngineTuning;
use crate::core::error::BattleError;
use crate::core::types::{LogKind, MoraleChange};
use crate::stats::rolls::RollSource;

/// Identifier of a choice within a beat
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(pub String);

impl ChoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChoiceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub label: String,
    pub description: String,
    pub available: bool,
}

impl Choice {
    pub fn new(id: &str, label: &str, description: &str) -> Self {
        Self {
            id: ChoiceId::from(id),
            label: label.to_string(),
            description: description.to_string(),
            available: true,
        }
    }

    pub fn available_if(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Where the battle goes once a beat is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BeatTransition {
    /// Back to the volley table where it left off
    ResumeLine,
    Beat(StoryBeatId),
    Melee { encounter: String, stage: u8 },
    BeginPart(u8),
    EndBattle(BattleOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatOutcome {
    pub log: Vec<String>,
    pub morale_changes: Vec<MoraleChange>,
    pub health_delta: f64,
    pub stamina_delta: f64,
    pub transition: BeatTransition,
}

impl BeatOutcome {
    pub fn new(transition: BeatTransition) -> Self {
        Self {
            log: Vec::new(),
            morale_changes: Vec::new(),
            health_delta: 0.0,
            stamina_delta: 0.0,
            transition,
        }
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.log.push(text.into());
        self
    }

    pub fn morale(mut self, change: MoraleChange) -> Self {
        self.morale_changes.push(change);
        self
    }

    pub fn health(mut self, delta: f64) -> Self {
        self.health_delta += delta;
        self
    }

    pub fn stamina(mut self, delta: f64) -> Self {
        self.stamina_delta += delta;
        self
    }
}

/// What a beat resolver may consult besides the state
pub struct BeatContext<'a> {
    pub config: &'a BattleConfig,
    pub tuning: &'a EngineTuning,
    pub rolls: &'a mut dyn RollSource,
}

pub type NarrativeFn = fn(&BattleState) -> String;
pub type ChoicesFn = fn(&BattleState) -> Vec<Choice>;
pub type ResolveFn = fn(&mut BattleState, &mut BeatContext<'_>, &ChoiceId) -> Result<BeatOutcome, BattleError>;

#[derive(Clone)]
pub struct StoryBeatDef {
    pub id: StoryBeatId,
    pub title: &'static str,
    pub narrative: NarrativeFn,
    pub choices: ChoicesFn,
    pub resolve: ResolveFn,
    /// Beats this one can lead to, for validation
    pub next_beats: &'static [StoryBeatId],
    /// Encounter keys this one can enter, for validation
    pub encounters: &'static [&'static str],
}

impl fmt::Debug for StoryBeatDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryBeatDef")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("next_beats", &self.next_beats)
            .field("encounters", &self.encounters)
            .finish()
    }
}

fn pending_beat<'c>(state: &BattleState, config: &'c BattleConfig) -> Result<&'c StoryBeatDef, BattleError> {
    if state.battle_over {
        return Err(BattleError::BattleOver);
    }
    if state.phase != BattlePhase::StoryBeat {
        return Err(BattleError::WrongPhase {
            expected: BattlePhase::StoryBeat,
            actual: state.phase,
        });
    }
    let id = state.charge_encounter.ok_or(BattleError::NoPendingBeat)?;
    Ok(config.story_beat(id)?)
}

/// Narrative text of the pending beat
pub fn beat_narrative(state: &BattleState, config: &BattleConfig) -> Result<String, BattleError> {
    let def = pending_beat(state, config)?;
    Ok((def.narrative)(state))
}

/// Choices of the pending beat, unavailable ones included
pub fn available_choices(state: &BattleState, config: &BattleConfig) -> Result<Vec<Choice>, BattleError> {
    let def = pending_beat(state, config)?;
    Ok((def.choices)(state))
}

/// Resolve the pending beat with the given choice
pub fn resolve_story_beat(
    state: &mut BattleState,
    config: &BattleConfig,
    tuning: &EngineTuning,
    rolls: &mut dyn RollSource,
    choice: &ChoiceId,
) -> Result<BeatOutcome, BattleError> {
    let def = pending_beat(state, config)?;
    let offered = (def.choices)(state);
    let picked = offered
        .iter()
        .find(|c| &c.id == choice)
        .ok_or_else(|| BattleError::UnknownChoice(choice.to_string()))?;
    if !picked.available {
        return Err(BattleError::ChoiceUnavailable(choice.to_string()));
    }

    let beat = def.id;
    state.charge_encounter = None;
    let mut ctx = BeatContext { config, tuning, rolls };
    let outcome = match (def.resolve)(state, &mut ctx, choice) {
        Ok(outcome) => outcome,
        Err(e) => {
            state.charge_encounter = Some(beat);
            return Err(e);
        }
    };

    tracing::debug!(battle = %state.battle_id, beat = ?beat, choice = %choice, "Story beat resolved");

    for text in &outcome.log {
        state.log(LogKind::Narrative, text.clone());
    }
    for change in &outcome.morale_changes {
        state.apply_morale_change(change.clone());
    }
    state.player.change_health(outcome.health_delta);
    state.player.change_stamina(outcome.stamina_delta);

    if state.player.is_down() && !apply_grace_or_death(state) {
        return Ok(outcome);
    }

    apply_transition(state, config, tuning, &outcome.transition)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::execution::create_battle_state;
    use crate::campaign::character::PlayerCharacter;
    use crate::content::ContentRegistry;

    fn at_beat(registry: &ContentRegistry, beat: StoryBeatId) -> BattleState {
        let config = registry.battle("rivoli").unwrap();
        let npcs = registry.campaign("italy").unwrap().roster.clone();
        let mut state = create_battle_state(config, &PlayerCharacter::new("Jean"), &npcs, &EngineTuning::default());
        state.phase = BattlePhase::StoryBeat;
        state.charge_encounter = Some(beat);
        state
    }

    #[test]
    fn test_unknown_choice_rejected() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let mut state = at_beat(&registry, StoryBeatId::Battery);
        let mut rolls = crate::stats::rolls::ScriptedRolls::new();

        let err = resolve_story_beat(
            &mut state,
            config,
            &EngineTuning::default(),
            &mut rolls,
            &ChoiceId::from("surrender"),
        )
        .unwrap_err();
        assert!(matches!(err, BattleError::UnknownChoice(_)));
        assert_eq!(state.charge_encounter, Some(StoryBeatId::Battery));
    }

    #[test]
    fn test_no_pending_beat() {
        let registry = ContentRegistry::standard();
        let config = registry.battle("rivoli").unwrap();
        let mut state = at_beat(&registry, StoryBeatId::Battery);
        state.charge_encounter = None;
        assert_eq!(available_choices(&state, config).unwrap_err(), BattleError::NoPendingBeat);
    }

    #[test]
    fn test_every_beat_offers_a_choice() {
        let registry = ContentRegistry::standard();
        for battle in ["rivoli", "favorita"] {
            let config = registry.battle(battle).unwrap();
            for def in config.story_beats.values() {
                let npcs = registry.campaign("italy").unwrap().roster.clone();
                let mut state =
                    create_battle_state(config, &PlayerCharacter::new("Jean"), &npcs, &EngineTuning::default());
                state.phase = BattlePhase::StoryBeat;
                state.charge_encounter = Some(def.id);
                assert!(!(def.choices)(&state).is_empty(), "{:?} has no choices", def.id);
                assert!(!beat_narrative(&state, config).unwrap().is_empty());
            }
        }
    }
}
