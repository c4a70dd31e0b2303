//! Melee state: combatants, the active/pool split and the round log

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::combat::stance::{BodyPart, MeleeAction, Stance};
use crate::combat::waves::WaveEvent;
use crate::core::types::NpcId;

/// Reload progress values
pub const RELOAD_EMPTY: u8 = 0;
pub const RELOAD_HALF: u8 = 1;
pub const RELOAD_LOADED: u8 = 2;

/// Personality of an allied fighter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AllyPersonality {
    Aggressive,
    #[default]
    Steady,
    Cautious,
}

/// An opponent or ally in the melee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeleeCombatant {
    pub name: String,
    /// Roster link for allies drawn from the player's line
    pub npc_id: Option<NpcId>,
    pub health: f64,
    pub max_health: f64,
    pub stamina: f64,
    pub max_stamina: f64,
    pub fatigue: f64,
    pub max_fatigue: f64,
    /// Weapon skill, on the stat scale
    pub skill: u32,
    pub strength: u32,
    pub stance: Stance,
    pub stunned: bool,
    pub guarding: bool,
    pub arm_injured: bool,
    pub leg_injured: bool,
    pub alive: bool,
    pub personality: AllyPersonality,
}

impl MeleeCombatant {
    pub fn new(name: impl Into<String>, health: f64, stamina: f64, skill: u32, strength: u32) -> Self {
        Self {
            name: name.into(),
            npc_id: None,
            health,
            max_health: health,
            stamina,
            max_stamina: stamina,
            fatigue: 0.0,
            max_fatigue: stamina,
            skill,
            strength,
            stance: Stance::Balanced,
            stunned: false,
            guarding: false,
            arm_injured: false,
            leg_injured: false,
            alive: true,
            personality: AllyPersonality::Steady,
        }
    }

    pub fn change_health(&mut self, delta: f64) {
        self.health = (self.health + delta).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.alive = false;
        }
    }

    pub fn change_stamina(&mut self, delta: f64) {
        self.stamina = (self.stamina + delta).clamp(0.0, self.max_stamina);
    }

    pub fn change_fatigue(&mut self, delta: f64) {
        self.fatigue = (self.fatigue + delta).clamp(0.0, self.max_fatigue);
    }

    pub fn kill(&mut self) {
        self.health = 0.0;
        self.alive = false;
    }

    pub fn stamina_ratio(&self) -> f64 {
        if self.max_stamina <= 0.0 {
            return 0.0;
        }
        self.stamina / self.max_stamina
    }

    pub fn health_ratio(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }
}

/// One line of the ordered round log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntry {
    pub exchange: u32,
    pub actor: String,
    pub target: Option<String>,
    pub action: MeleeAction,
    pub body_part: Option<BodyPart>,
    pub hit: bool,
    pub damage: f64,
    pub killed: bool,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeleeOutcome {
    Ongoing,
    /// Every enemy is down
    Victory,
    /// The exchange cap was reached with the player still standing
    Survived,
    /// The player collapsed
    Defeat,
    /// The player fled
    Rout,
}

/// Complete melee state, present only in the Melee phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeleeState {
    /// Every opponent that has entered the fight, dead or alive
    pub opponents: Vec<MeleeCombatant>,
    /// Indices into `opponents` currently engaged
    pub active_enemies: Vec<usize>,
    /// Opponents waiting to enter
    pub enemy_pool: VecDeque<MeleeCombatant>,
    pub max_active_enemies: usize,
    pub allies: Vec<MeleeCombatant>,
    /// Index into `opponents`
    pub current_target: usize,
    pub player_stance: Stance,
    /// Exchanges the player still has to sit out
    pub player_stunned: u8,
    pub player_riposte: bool,
    pub player_guarding: bool,
    pub exchange_count: u32,
    pub max_exchanges: u32,
    pub round_log: Vec<RoundEntry>,
    pub reload_progress: u8,
    pub kill_count: u32,
    pub wave_events: Vec<WaveEvent>,
    /// Indices into `wave_events` already fired
    pub processed_waves: Vec<usize>,
    pub encounter_key: String,
    pub stage: u8,
}

impl MeleeState {
    /// Engaged opponents still standing
    pub fn living_active(&self) -> impl Iterator<Item = usize> + '_ {
        self.active_enemies
            .iter()
            .copied()
            .filter(move |&i| self.opponents.get(i).map(|o| o.alive).unwrap_or(false))
    }

    pub fn living_active_count(&self) -> usize {
        self.living_active().count()
    }

    pub fn all_enemies_down(&self) -> bool {
        self.living_active_count() == 0 && self.enemy_pool.is_empty()
    }

    pub fn living_allies(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.allies.len()).filter(move |&i| self.allies[i].alive)
    }

    /// Keep `current_target` on a living engaged opponent
    pub fn retarget(&mut self) {
        let current_ok = self.active_enemies.contains(&self.current_target)
            && self
                .opponents
                .get(self.current_target)
                .map(|o| o.alive)
                .unwrap_or(false);
        if !current_ok {
            let next = self.living_active().next();
            if let Some(next) = next {
                self.current_target = next;
            }
        }
    }

    /// Drop dead opponents from the engaged list and backfill from the pool
    pub fn backfill(&mut self) -> Vec<String> {
        let opponents = &self.opponents;
        self.active_enemies
            .retain(|&i| opponents.get(i).map(|o| o.alive).unwrap_or(false));

        let mut entered = Vec::new();
        while self.active_enemies.len() < self.max_active_enemies {
            let Some(next) = self.enemy_pool.pop_front() else {
                break;
            };
            entered.push(next.name.clone());
            self.opponents.push(next);
            self.active_enemies.push(self.opponents.len() - 1);
        }
        self.retarget();
        entered
    }

    pub fn is_loaded(&self) -> bool {
        self.reload_progress >= RELOAD_LOADED
    }
}
