//! Core type definitions shared by the battle, camp and campaign engines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Turn counter inside a battle or camp
pub type Turn = u32;

/// Identifier of a roster NPC (stable across saves, e.g. `"pierre"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub String);

impl NpcId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NpcId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a narrative log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Narrative,
    Order,
    Action,
    Event,
    Morale,
    Result,
}

/// One entry of the append-only narrative log
///
/// Serialised as `{turn, type, text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: Turn,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn new(turn: Turn, kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            turn,
            kind,
            text: text.into(),
        }
    }
}

/// Where a morale delta came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoraleSource {
    Action,
    Event,
    Passive,
    Recovery,
    Contagion,
}

/// A single morale delta, kept for display until the next volley
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleChange {
    pub amount: i32,
    pub reason: String,
    pub source: MoraleSource,
}

impl MoraleChange {
    pub fn new(amount: i32, reason: impl Into<String>, source: MoraleSource) -> Self {
        Self {
            amount,
            reason: reason.into(),
            source,
        }
    }
}

/// Sum of a set of morale deltas
pub fn total_morale_delta(changes: &[MoraleChange]) -> i32 {
    changes.iter().map(|c| c.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npc_id_equality() {
        let a = NpcId::from("pierre");
        let b = NpcId::new("pierre");
        let c = NpcId::from("jean_baptiste");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_npc_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NpcId::from("pierre")).unwrap();
        assert_eq!(json, "\"pierre\"");
    }

    #[test]
    fn test_log_entry_uses_type_key() {
        let entry = LogEntry::new(3, LogKind::Narrative, "The drums beat.");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["turn"], 3);
        assert_eq!(value["type"], "narrative");
        assert_eq!(value["text"], "The drums beat.");
    }

    #[test]
    fn test_total_morale_delta() {
        let changes = vec![
            MoraleChange::new(5, "charge", MoraleSource::Action),
            MoraleChange::new(-3, "losses", MoraleSource::Event),
        ];
        assert_eq!(total_morale_delta(&changes), 2);
        assert_eq!(total_morale_delta(&[]), 0);
    }
}
