//! Player character: base stats, reputation, Grace and equipment
//!
//! Created once per run with a point-buy allocation, then improved between
//! battles by camp activities and Glory spending.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::CampaignError;

/// Every base stat starts here before allocation
pub const BASE_STAT_VALUE: u32 = 30;

/// Points to distribute at character creation
pub const ALLOCATION_POINTS: u32 = 20;

/// At most this many creation points may go into one stat
pub const MAX_ALLOCATION_PER_STAT: u32 = 10;

pub const STAT_CAP: u32 = 100;

pub const REPUTATION_START: i32 = 50;
pub const REPUTATION_MIN: i32 = 0;
pub const REPUTATION_MAX: i32 = 100;

/// Grace is a rare resource; a character can bank at most two
pub const MAX_GRACE: u32 = 2;

/// The nine base stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Valor,
    Musketry,
    Elan,
    Strength,
    Endurance,
    Constitution,
    Charisma,
    Intelligence,
    Awareness,
}

impl Stat {
    pub const ALL: [Stat; 9] = [
        Stat::Valor,
        Stat::Musketry,
        Stat::Elan,
        Stat::Strength,
        Stat::Endurance,
        Stat::Constitution,
        Stat::Charisma,
        Stat::Intelligence,
        Stat::Awareness,
    ];

    /// Position in `Stat::ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Valor => "valor",
            Stat::Musketry => "musketry",
            Stat::Elan => "elan",
            Stat::Strength => "strength",
            Stat::Endurance => "endurance",
            Stat::Constitution => "constitution",
            Stat::Charisma => "charisma",
            Stat::Intelligence => "intelligence",
            Stat::Awareness => "awareness",
        }
    }

    pub fn parse(name: &str) -> Option<Stat> {
        let lower = name.to_ascii_lowercase();
        Stat::ALL.iter().copied().find(|s| s.name() == lower)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub valor: u32,
    pub musketry: u32,
    pub elan: u32,
    pub strength: u32,
    pub endurance: u32,
    pub constitution: u32,
    pub charisma: u32,
    pub intelligence: u32,
    pub awareness: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self::uniform(BASE_STAT_VALUE)
    }
}

impl BaseStats {
    pub fn uniform(value: u32) -> Self {
        Self {
            valor: value,
            musketry: value,
            elan: value,
            strength: value,
            endurance: value,
            constitution: value,
            charisma: value,
            intelligence: value,
            awareness: value,
        }
    }

    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Valor => self.valor,
            Stat::Musketry => self.musketry,
            Stat::Elan => self.elan,
            Stat::Strength => self.strength,
            Stat::Endurance => self.endurance,
            Stat::Constitution => self.constitution,
            Stat::Charisma => self.charisma,
            Stat::Intelligence => self.intelligence,
            Stat::Awareness => self.awareness,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Valor => &mut self.valor,
            Stat::Musketry => &mut self.musketry,
            Stat::Elan => &mut self.elan,
            Stat::Strength => &mut self.strength,
            Stat::Endurance => &mut self.endurance,
            Stat::Constitution => &mut self.constitution,
            Stat::Charisma => &mut self.charisma,
            Stat::Intelligence => &mut self.intelligence,
            Stat::Awareness => &mut self.awareness,
        }
    }

    /// Raise a stat, capped at `STAT_CAP`; returns the new value
    pub fn raise(&mut self, stat: Stat, amount: u32) -> u32 {
        let slot = self.slot(stat);
        *slot = (*slot + amount).min(STAT_CAP);
        *slot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    /// 0-100; a neglected musket misfires more often
    pub musket_condition: u32,
    pub uniform_condition: u32,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            musket_condition: 70,
            uniform_condition: 70,
        }
    }
}

/// Campaign-scoped player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCharacter {
    pub name: String,
    pub rank: String,
    pub stats: BaseStats,
    pub soldier_rep: i32,
    pub officer_rep: i32,
    pub napoleon_rep: i32,
    pub grace: u32,
    pub equipment: Equipment,
    pub alive: bool,
}

impl PlayerCharacter {
    /// A fresh fusilier with unallocated stats
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: "Fusilier".to_string(),
            stats: BaseStats::default(),
            soldier_rep: REPUTATION_START,
            officer_rep: REPUTATION_START,
            napoleon_rep: REPUTATION_START,
            grace: 0,
            equipment: Equipment::default(),
            alive: true,
        }
    }

    pub fn gain_grace(&mut self) -> bool {
        if self.grace >= MAX_GRACE {
            return false;
        }
        self.grace += 1;
        true
    }
}

/// Clamp a reputation value into its range
pub fn clamp_reputation(value: i32) -> i32 {
    value.clamp(REPUTATION_MIN, REPUTATION_MAX)
}

/// Create a character from a point-buy allocation
///
/// Each stat starts at `BASE_STAT_VALUE`; the allocation may spend up to
/// `ALLOCATION_POINTS`, at most `MAX_ALLOCATION_PER_STAT` per stat. Repeated
/// entries for the same stat are summed.
pub fn create_character(
    name: &str,
    allocation: &[(Stat, u32)],
) -> Result<PlayerCharacter, CampaignError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CampaignError::InvalidAllocation("name must not be empty".into()));
    }

    let mut spent_per_stat = [0u32; 9];
    for (stat, points) in allocation {
        spent_per_stat[stat.index()] += points;
    }

    let total: u32 = spent_per_stat.iter().sum();
    if total > ALLOCATION_POINTS {
        return Err(CampaignError::InvalidAllocation(format!(
            "{} points allocated, budget is {}",
            total, ALLOCATION_POINTS
        )));
    }

    let mut player = PlayerCharacter::new(name);
    for (stat, points) in Stat::ALL.iter().zip(spent_per_stat) {
        if points > MAX_ALLOCATION_PER_STAT {
            return Err(CampaignError::InvalidAllocation(format!(
                "{} points in {}, at most {} per stat",
                points, stat, MAX_ALLOCATION_PER_STAT
            )));
        }
        player.stats.raise(*stat, points);
    }

    Ok(player)
}

/// Glory needed to raise a stat by one point from its current value
///
/// One Glory below 40, then one more for every ten points.
pub fn glory_cost(current: u32) -> u32 {
    1 + current.saturating_sub(BASE_STAT_VALUE) / 10
}

/// Spend Glory on one stat point; returns the Glory spent
pub fn spend_glory_on_stat(
    player: &mut PlayerCharacter,
    stat: Stat,
    available_glory: u32,
) -> Result<u32, CampaignError> {
    let current = player.stats.get(stat);
    if current >= STAT_CAP {
        return Err(CampaignError::InvalidAllocation(format!(
            "{} is already at {}",
            stat, STAT_CAP
        )));
    }

    let cost = glory_cost(current);
    if cost > available_glory {
        return Err(CampaignError::NotEnoughGlory {
            needed: cost,
            available: available_glory,
        });
    }

    player.stats.raise(stat, 1);
    tracing::debug!(stat = %stat, value = current + 1, cost, "Glory spent");
    Ok(cost)
}
