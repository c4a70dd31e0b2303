//! Battle content definitions
//!
//! A `BattleConfig` is static content: scripted volley tables per part,
//! melee encounters and story beats. Built by the content registry and
//! passed to the engines.

use ahash::AHashMap;

use crate::battle::state::{BattleExt, EnemyState, FavoritaExt, RivoliExt, StoryBeatId};
use crate::battle::story::StoryBeatDef;
use crate::combat::waves::MeleeEncounter;
use crate::core::error::{BattleError, ConfigError};

/// What happens after a volley is resolved
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUp {
    NextVolley,
    StoryBeat(StoryBeatId),
    Melee { encounter: String, stage: u8 },
}

/// One scripted line volley
#[derive(Debug, Clone)]
pub struct ScriptedVolley {
    /// Range in paces at which the volley is exchanged
    pub range: f64,
    pub present: String,
    pub fire: String,
    pub endure: String,
    /// Enemy strength removed by the company's volley before modifiers
    pub enemy_loss: f64,
    /// Austrian return fire, 0.0-1.0 at full enemy strength
    pub return_fire: f64,
    pub artillery: bool,
    pub follow_up: FollowUp,
}

/// One volley fired down into the gorge
#[derive(Debug, Clone)]
pub struct GorgeVolley {
    pub range: f64,
    pub narrative: String,
    pub enemy_loss: f64,
    pub return_fire: f64,
    pub follow_up: FollowUp,
}

#[derive(Debug, Clone)]
pub enum PartKind {
    Scripted(Vec<ScriptedVolley>),
    Gorge(Vec<GorgeVolley>),
}

#[derive(Debug, Clone)]
pub struct BattlePart {
    pub number: u8,
    pub title: String,
    pub intro: String,
    /// Enemy facing the line when the part begins
    pub enemy: EnemyState,
    pub kind: PartKind,
}

impl BattlePart {
    pub fn volley_count(&self) -> usize {
        match &self.kind {
            PartKind::Scripted(volleys) => volleys.len(),
            PartKind::Gorge(volleys) => volleys.len(),
        }
    }

    pub fn is_gorge(&self) -> bool {
        matches!(self.kind, PartKind::Gorge(_))
    }

    pub fn follow_up(&self, index: usize) -> Option<&FollowUp> {
        match &self.kind {
            PartKind::Scripted(volleys) => volleys.get(index).map(|v| &v.follow_up),
            PartKind::Gorge(volleys) => volleys.get(index).map(|v| &v.follow_up),
        }
    }
}

/// Which extension record a battle carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleKind {
    Rivoli,
    Favorita,
}

impl BattleKind {
    pub fn initial_ext(&self) -> BattleExt {
        match self {
            BattleKind::Rivoli => BattleExt::Rivoli(RivoliExt {
                battle_part: 1,
                ..Default::default()
            }),
            BattleKind::Favorita => BattleExt::Favorita(FavoritaExt::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BattleConfig {
    pub id: String,
    pub name: String,
    pub kind: BattleKind,
    pub intro: Vec<String>,
    pub parts: Vec<BattlePart>,
    pub encounters: AHashMap<String, MeleeEncounter>,
    pub story_beats: AHashMap<StoryBeatId, StoryBeatDef>,
}

impl BattleConfig {
    pub fn part(&self, number: u8) -> Result<&BattlePart, ConfigError> {
        self.parts
            .iter()
            .find(|p| p.number == number)
            .ok_or_else(|| ConfigError::UnknownBattlePart {
                battle: self.id.clone(),
                part: number,
            })
    }

    pub fn encounter(&self, key: &str) -> Result<&MeleeEncounter, ConfigError> {
        self.encounters
            .get(key)
            .ok_or_else(|| ConfigError::UnknownEncounter(key.to_string()))
    }

    pub fn story_beat(&self, id: StoryBeatId) -> Result<&StoryBeatDef, ConfigError> {
        self.story_beats
            .get(&id)
            .ok_or(ConfigError::UnknownStoryBeat(id))
    }

    pub fn scripted_volley(&self, part: u8, index: usize) -> Result<&ScriptedVolley, BattleError> {
        match &self.part(part)?.kind {
            PartKind::Scripted(volleys) => volleys
                .get(index)
                .ok_or(BattleError::VolleyOutOfRange { part, index }),
            PartKind::Gorge(_) => Err(BattleError::NotScriptedPart(part)),
        }
    }

    pub fn gorge_volley(&self, part: u8, index: usize) -> Result<&GorgeVolley, BattleError> {
        match &self.part(part)?.kind {
            PartKind::Gorge(volleys) => volleys
                .get(index)
                .ok_or(BattleError::VolleyOutOfRange { part, index }),
            PartKind::Scripted(_) => Err(BattleError::NotGorgePart(part)),
        }
    }
}
