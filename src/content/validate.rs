//! Startup validation of battle and campaign content
//!
//! Each check returns human-readable messages; an empty list means the
//! content is consistent.

use crate::battle::config::{BattleConfig, BattleKind, FollowUp, PartKind};
use crate::campaign::npc::NpcRole;
use crate::campaign::state::{interlude_key, CampaignConfig, CampaignEntry};
use crate::combat::waves::{WaveCondition, WaveKind};
use crate::core::types::NpcId;

fn check_follow_up(config: &BattleConfig, where_: &str, follow_up: &FollowUp, errors: &mut Vec<String>) {
    match follow_up {
        FollowUp::NextVolley => {}
        FollowUp::StoryBeat(id) => {
            if !config.story_beats.contains_key(id) {
                errors.push(format!("{}: story beat {:?} is not defined", where_, id));
            }
        }
        FollowUp::Melee { encounter, .. } => {
            if !config.encounters.contains_key(encounter) {
                errors.push(format!("{}: encounter '{}' is not defined", where_, encounter));
            }
        }
    }
}

/// Check a battle's internal references; `known_npcs` are the roster and
/// pool ids encounters may name
pub fn validate_battle_config(config: &BattleConfig, known_npcs: &[NpcId]) -> Vec<String> {
    let mut errors = Vec::new();
    let battle = &config.id;

    if config.parts.is_empty() {
        errors.push(format!("{}: no parts", battle));
    }
    for (i, part) in config.parts.iter().enumerate() {
        let where_ = format!("{} part {}", battle, part.number);
        if part.number as usize != i + 1 {
            errors.push(format!("{}: parts must be numbered from 1 in order", where_));
        }
        if part.volley_count() == 0 {
            errors.push(format!("{}: no volleys", where_));
            continue;
        }
        if part.is_gorge() && config.kind != BattleKind::Rivoli {
            errors.push(format!("{}: gorge volleys need the Rivoli extension", where_));
        }

        let follow_ups: Vec<&FollowUp> = match &part.kind {
            PartKind::Scripted(volleys) => volleys.iter().map(|v| &v.follow_up).collect(),
            PartKind::Gorge(volleys) => volleys.iter().map(|v| &v.follow_up).collect(),
        };
        for (index, follow_up) in follow_ups.iter().enumerate() {
            check_follow_up(config, &format!("{} volley {}", where_, index), follow_up, &mut errors);
        }
        if let Some(FollowUp::NextVolley) = follow_ups.last() {
            errors.push(format!("{}: last volley must lead somewhere", where_));
        }
    }

    for (id, beat) in &config.story_beats {
        if beat.id != *id {
            errors.push(format!("{}: beat registered as {:?} claims id {:?}", battle, id, beat.id));
        }
        for next in beat.next_beats {
            if !config.story_beats.contains_key(next) {
                errors.push(format!("{}: beat {:?} leads to undefined beat {:?}", battle, id, next));
            }
        }
        for key in beat.encounters {
            if !config.encounters.contains_key(*key) {
                errors.push(format!("{}: beat {:?} enters undefined encounter '{}'", battle, id, key));
            }
        }
    }

    for (key, encounter) in &config.encounters {
        let where_ = format!("{} encounter '{}'", battle, key);
        if encounter.opponents.is_empty() {
            errors.push(format!("{}: no opponents", where_));
        }
        if encounter.max_active_enemies == 0 {
            errors.push(format!("{}: max_active_enemies must be at least 1", where_));
        }
        if encounter.max_exchanges == 0 {
            errors.push(format!("{}: max_exchanges must be at least 1", where_));
        }
        if !config.story_beats.contains_key(&encounter.next_beat) {
            errors.push(format!("{}: next beat {:?} is not defined", where_, encounter.next_beat));
        }

        let mut npc_refs: Vec<&NpcId> = encounter.allies.iter().filter_map(|a| a.npc_id.as_ref()).collect();
        for wave in &encounter.waves {
            if let Some(WaveCondition::NpcAlive(id)) = &wave.condition {
                npc_refs.push(id);
            }
            if let WaveKind::AllyJoins(ally) = &wave.kind {
                npc_refs.extend(ally.npc_id.as_ref());
            }
        }
        for id in npc_refs {
            if !known_npcs.contains(id) {
                errors.push(format!("{}: unknown NPC '{}'", where_, id));
            }
        }
    }

    errors
}

/// Check a campaign against the registered battle ids
pub fn validate_campaign(config: &CampaignConfig, known_battles: &[&str]) -> Vec<String> {
    let mut errors = Vec::new();
    let campaign = &config.id;

    if config.battle_ids().next().is_none() {
        errors.push(format!("{}: no battles", campaign));
    }

    for (i, entry) in config.sequence.iter().enumerate() {
        match entry {
            CampaignEntry::Battle { battle_id } => {
                if !known_battles.contains(&battle_id.as_str()) {
                    errors.push(format!("{}: unknown battle '{}'", campaign, battle_id));
                }
            }
            CampaignEntry::Interlude { from, to } => {
                let key = interlude_key(from, to);
                if !config.interludes.contains_key(&key) {
                    errors.push(format!("{}: interlude '{}' is not defined", campaign, key));
                }
                let before = i.checked_sub(1).and_then(|j| config.sequence.get(j)).and_then(|e| e.battle_id());
                let after = config.sequence.get(i + 1).and_then(|e| e.battle_id());
                if before != Some(from.as_str()) || after != Some(to.as_str()) {
                    errors.push(format!("{}: interlude '{}' is not between those battles", campaign, key));
                }
            }
        }
    }

    for role in [NpcRole::Neighbour, NpcRole::Nco, NpcRole::Officer] {
        if !config.roster.iter().any(|n| n.role == role) {
            errors.push(format!("{}: roster has no {}", campaign, role));
        }
    }
    let neighbours = config.roster.iter().filter(|n| n.role == NpcRole::Neighbour).count();
    if neighbours > 2 {
        errors.push(format!("{}: roster has {} neighbours, the line holds two", campaign, neighbours));
    }

    let mut seen: Vec<&NpcId> = Vec::new();
    for npc in config.roster.iter().chain(&config.replacement_pool) {
        if seen.contains(&&npc.id) {
            errors.push(format!("{}: NPC id '{}' is used twice", campaign, npc.id));
        }
        seen.push(&npc.id);
    }

    errors
}
