//! The Little Soldier - a line infantryman's war, from Rivoli to La Favorita

pub mod battle;
pub mod campaign;
pub mod combat;
pub mod content;
pub mod core;
pub mod persistence;
pub mod stats;
