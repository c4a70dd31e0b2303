//! Melee encounters and reinforcement waves
//!
//! An encounter starts with its opponents queued in the pool; up to
//! `max_active_enemies` of them engage at once and the rest step in as the
//! front rank falls. Waves fire once when the exchange count reaches
//! `at_round`, optionally gated on a roster NPC or neighbour post still
//! standing.

use serde::{Deserialize, Serialize};

use crate::battle::state::{LineMember, LinePost, LineState, StoryBeatId};
use crate::combat::stance::Stance;
use crate::combat::state::{AllyPersonality, MeleeCombatant, MeleeState, RELOAD_EMPTY, RELOAD_LOADED};
use crate::core::types::NpcId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentTemplate {
    pub name: String,
    pub health: f64,
    pub stamina: f64,
    pub skill: u32,
    pub strength: u32,
    pub stance: Stance,
}

impl OpponentTemplate {
    pub fn new(name: &str, health: f64, stamina: f64, skill: u32, strength: u32) -> Self {
        Self {
            name: name.to_string(),
            health,
            stamina,
            skill,
            strength,
            stance: Stance::Balanced,
        }
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    pub fn spawn(&self) -> MeleeCombatant {
        let mut combatant =
            MeleeCombatant::new(self.name.clone(), self.health, self.stamina, self.skill, self.strength);
        combatant.stance = self.stance;
        combatant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllyTemplate {
    /// When set, the ally only fights if this NPC is standing in the line
    pub npc_id: Option<NpcId>,
    /// When set, the ally is whoever holds this post in the line
    #[serde(default)]
    pub post: Option<LinePost>,
    pub name: String,
    pub health: f64,
    pub stamina: f64,
    pub skill: u32,
    pub strength: u32,
    pub personality: AllyPersonality,
}

impl AllyTemplate {
    pub fn anonymous(name: &str, skill: u32, personality: AllyPersonality) -> Self {
        Self {
            npc_id: None,
            post: None,
            name: name.to_string(),
            health: 70.0,
            stamina: 70.0,
            skill,
            strength: 40,
            personality,
        }
    }

    pub fn from_roster(npc_id: &str, skill: u32, personality: AllyPersonality) -> Self {
        Self {
            npc_id: Some(NpcId::from(npc_id)),
            name: npc_id.to_string(),
            ..Self::anonymous(npc_id, skill, personality)
        }
    }

    /// The neighbour at `post`, whoever the roster has put there
    pub fn from_post(post: LinePost, skill: u32, personality: AllyPersonality) -> Self {
        Self {
            post: Some(post),
            ..Self::anonymous("neighbour", skill, personality)
        }
    }

    fn line_member<'a>(&self, line: &'a LineState) -> Option<Option<&'a LineMember>> {
        match (&self.npc_id, self.post) {
            (Some(id), _) => Some(line.member(id)),
            (None, Some(post)) => Some(line.at_post(post)),
            (None, None) => None,
        }
    }

    /// Spawn the ally, taking the line member's name; `None` if that member
    /// is dead, wounded or missing from the line
    pub fn spawn(&self, line: &LineState) -> Option<MeleeCombatant> {
        let (name, npc_id) = match self.line_member(line) {
            Some(member) => {
                let member = member.filter(|m| m.in_line())?;
                (member.name.clone(), Some(member.npc_id.clone()))
            }
            None => (self.name.clone(), None),
        };
        let mut combatant = MeleeCombatant::new(name, self.health, self.stamina, self.skill, self.strength);
        combatant.npc_id = npc_id;
        combatant.personality = self.personality;
        Some(combatant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaveKind {
    EnemiesArrive(Vec<OpponentTemplate>),
    AllyJoins(AllyTemplate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaveCondition {
    NpcAlive(NpcId),
    /// Whoever holds the post is still alive
    PostAlive(LinePost),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveEvent {
    pub at_round: u32,
    pub kind: WaveKind,
    pub condition: Option<WaveCondition>,
    pub narrative: String,
}

/// Static definition of a melee
#[derive(Debug, Clone)]
pub struct MeleeEncounter {
    pub key: String,
    pub intro: String,
    pub opponents: Vec<OpponentTemplate>,
    pub allies: Vec<AllyTemplate>,
    pub max_active_enemies: usize,
    pub max_exchanges: u32,
    pub waves: Vec<WaveEvent>,
    /// Story beat that follows a victory or survival
    pub next_beat: StoryBeatId,
}

/// Build the melee state for an encounter
pub fn build_melee_state(
    encounter: &MeleeEncounter,
    stage: u8,
    line: &LineState,
    musket_loaded: bool,
) -> MeleeState {
    let mut melee = MeleeState {
        opponents: Vec::new(),
        active_enemies: Vec::new(),
        enemy_pool: encounter.opponents.iter().map(OpponentTemplate::spawn).collect(),
        max_active_enemies: encounter.max_active_enemies.max(1),
        allies: encounter.allies.iter().filter_map(|a| a.spawn(line)).collect(),
        current_target: 0,
        player_stance: Stance::Balanced,
        player_stunned: 0,
        player_riposte: false,
        player_guarding: false,
        exchange_count: 0,
        max_exchanges: encounter.max_exchanges,
        round_log: Vec::new(),
        reload_progress: if musket_loaded { RELOAD_LOADED } else { RELOAD_EMPTY },
        kill_count: 0,
        wave_events: encounter.waves.clone(),
        processed_waves: Vec::new(),
        encounter_key: encounter.key.clone(),
        stage,
    };
    melee.backfill();
    melee
}

fn condition_met(condition: &Option<WaveCondition>, line: &LineState, melee: &MeleeState) -> bool {
    let member = match condition {
        None => return true,
        Some(WaveCondition::NpcAlive(id)) => line.member(id),
        Some(WaveCondition::PostAlive(post)) => line.at_post(*post),
    };
    let Some(member) = member else {
        return false;
    };
    let fighting = melee
        .allies
        .iter()
        .any(|a| a.npc_id.as_ref() == Some(&member.npc_id) && a.alive);
    member.alive || fighting
}

/// Fire every due wave once; returns the narratives of the waves that fired
pub fn process_waves(melee: &mut MeleeState, line: &LineState) -> Vec<String> {
    let mut narratives = Vec::new();

    for index in 0..melee.wave_events.len() {
        if melee.processed_waves.contains(&index) {
            continue;
        }
        if melee.exchange_count < melee.wave_events[index].at_round {
            continue;
        }
        melee.processed_waves.push(index);

        let wave = melee.wave_events[index].clone();
        if !condition_met(&wave.condition, line, melee) {
            tracing::debug!(encounter = %melee.encounter_key, wave = index, "Wave condition not met");
            continue;
        }

        match &wave.kind {
            WaveKind::EnemiesArrive(templates) => {
                melee.enemy_pool.extend(templates.iter().map(OpponentTemplate::spawn));
            }
            WaveKind::AllyJoins(template) => match template.spawn(line) {
                Some(ally) => melee.allies.push(ally),
                None => continue,
            },
        }
        tracing::debug!(encounter = %melee.encounter_key, wave = index, "Wave fired");
        narratives.push(wave.narrative.clone());
    }

    narratives
}
