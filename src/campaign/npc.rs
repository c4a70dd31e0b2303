//! Roster NPCs and dead-NPC replacement

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::NpcId;

pub const RELATIONSHIP_MIN: i32 = -100;
pub const RELATIONSHIP_MAX: i32 = 100;

/// Position an NPC fills in the player's company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcRole {
    /// Stands beside the player in the firing line
    Neighbour,
    /// Sergeant or corporal
    Nco,
    Officer,
}

impl fmt::Display for NpcRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NpcRole::Neighbour => "Neighbour",
            NpcRole::Nco => "NCO",
            NpcRole::Officer => "Officer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub role: NpcRole,
    pub rank: String,
    /// Attitude towards the player, -100..=100
    pub relationship: i32,
    pub alive: bool,
    pub wounded: bool,
    pub morale: f64,
    pub max_morale: f64,
    pub valor: u32,
}

impl Npc {
    pub fn new(id: &str, name: &str, role: NpcRole, rank: &str, valor: u32) -> Self {
        Self {
            id: NpcId::from(id),
            name: name.to_string(),
            role,
            rank: rank.to_string(),
            relationship: 0,
            alive: true,
            wounded: false,
            morale: 100.0,
            max_morale: 100.0,
            valor,
        }
    }

    pub fn with_relationship(mut self, relationship: i32) -> Self {
        self.relationship = relationship.clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        self
    }

    pub fn adjust_relationship(&mut self, delta: i32) {
        self.relationship = (self.relationship + delta).clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
    }
}

/// First living NPC with a role, in roster order
pub fn find_by_role(npcs: &[Npc], role: NpcRole) -> Option<&Npc> {
    npcs.iter().find(|n| n.alive && n.role == role)
}

/// Replace dead NPCs from the replacement pool
///
/// Deaths are handled in the order they were recorded. Each dead NPC is
/// swapped, in place, for the first pool entry with the same role that has
/// not been used yet (neither in `already_used` nor earlier in this call).
/// When no such entry exists the dead NPC is removed from the roster. Returns
/// the new roster and the ids of the replacements drawn in this call.
pub fn replace_dead_npcs(
    npcs: &[Npc],
    death_ids: &[NpcId],
    pool: &[Npc],
    already_used: &[NpcId],
) -> (Vec<Npc>, Vec<NpcId>) {
    let mut slots: Vec<Option<Npc>> = npcs.iter().cloned().map(Some).collect();
    let mut new_replacements: Vec<NpcId> = Vec::new();

    for dead_id in death_ids {
        let Some(index) = npcs.iter().position(|n| &n.id == dead_id) else {
            continue;
        };
        if slots[index].as_ref().map_or(true, |n| &n.id != dead_id) {
            // already handled
            continue;
        }
        let npc = &npcs[index];

        let replacement = pool.iter().find(|candidate| {
            candidate.role == npc.role
                && !already_used.contains(&candidate.id)
                && !new_replacements.contains(&candidate.id)
        });

        match replacement {
            Some(candidate) => {
                tracing::info!(dead = %npc.id, replacement = %candidate.id, role = %npc.role, "NPC replaced");
                new_replacements.push(candidate.id.clone());
                slots[index] = Some(candidate.clone());
            }
            None => {
                tracing::info!(dead = %npc.id, role = %npc.role, "No replacement available, NPC removed");
                slots[index] = None;
            }
        }
    }

    (slots.into_iter().flatten().collect(), new_replacements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbour(id: &str) -> Npc {
        Npc::new(id, id, NpcRole::Neighbour, "Fusilier", 40)
    }

    #[test]
    fn test_replacement_keeps_roster_position() {
        let npcs = vec![neighbour("pierre"), neighbour("jb")];
        let pool = vec![
            neighbour("rep1"),
            neighbour("rep2"),
            Npc::new("rep3", "rep3", NpcRole::Nco, "Sergent", 50),
        ];

        let (roster, used) = replace_dead_npcs(&npcs, &[NpcId::from("pierre")], &pool, &[]);

        assert_eq!(roster[0].id, NpcId::from("rep1"));
        assert_eq!(roster[1].id, NpcId::from("jb"));
        assert_eq!(used, vec![NpcId::from("rep1")]);
    }

    #[test]
    fn test_used_replacements_skipped() {
        let npcs = vec![neighbour("pierre"), neighbour("jb")];
        let pool = vec![neighbour("rep1"), neighbour("rep2")];

        let (roster, used) = replace_dead_npcs(
            &npcs,
            &[NpcId::from("pierre"), NpcId::from("jb")],
            &pool,
            &[NpcId::from("rep1")],
        );

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, NpcId::from("rep2"));
        assert_eq!(used, vec![NpcId::from("rep2")]);
    }

    #[test]
    fn test_replacements_follow_death_order() {
        let npcs = vec![neighbour("a"), neighbour("b")];
        let pool = vec![neighbour("rep1"), neighbour("rep2")];

        let (roster, used) = replace_dead_npcs(&npcs, &[NpcId::from("b"), NpcId::from("a")], &pool, &[]);

        let ids: Vec<&str> = roster.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["rep2", "rep1"]);
        assert_eq!(used, vec![NpcId::from("rep1"), NpcId::from("rep2")]);
    }

    #[test]
    fn test_repeated_death_replaced_once() {
        let npcs = vec![neighbour("a"), neighbour("b")];
        let pool = vec![neighbour("rep1"), neighbour("rep2")];

        let (roster, used) = replace_dead_npcs(&npcs, &[NpcId::from("a"), NpcId::from("a")], &pool, &[]);

        assert_eq!(roster.len(), 2);
        assert_eq!(used, vec![NpcId::from("rep1")]);
    }

    #[test]
    fn test_officer_without_replacement_removed() {
        let npcs = vec![
            neighbour("pierre"),
            Npc::new("captain", "Captain", NpcRole::Officer, "Capitaine", 60),
        ];
        let pool = vec![neighbour("rep1")];

        let (roster, used) = replace_dead_npcs(&npcs, &[NpcId::from("captain")], &pool, &[]);

        assert_eq!(roster.len(), 1);
        assert!(used.is_empty());
    }

    #[test]
    fn test_relationship_clamped() {
        let mut npc = neighbour("pierre").with_relationship(95);
        npc.adjust_relationship(20);
        assert_eq!(npc.relationship, RELATIONSHIP_MAX);
    }
}
