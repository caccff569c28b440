//! Closed tier and level sets for the economy
//!
//! Bee tiers and alveole levels are fixed, known sets. They are modeled as
//! enums rather than open string maps so an unknown id is unrepresentable
//! past the validation boundary. Serde encodes them as the wire strings
//! ("baby".."queen", "1".."6"), which also makes them usable as BSON map
//! keys.

use serde::{Deserialize, Serialize};

/// The five bee ownership tiers
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BeeTier {
    Baby,
    Worker,
    Elite,
    Royal,
    Queen,
}

impl BeeTier {
    /// All tiers in ascending cost order
    pub const ALL: [BeeTier; 5] = [
        BeeTier::Baby,
        BeeTier::Worker,
        BeeTier::Elite,
        BeeTier::Royal,
        BeeTier::Queen,
    ];

    /// Parse a wire tier id ("baby", "worker", ...)
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "baby" => Some(BeeTier::Baby),
            "worker" => Some(BeeTier::Worker),
            "elite" => Some(BeeTier::Elite),
            "royal" => Some(BeeTier::Royal),
            "queen" => Some(BeeTier::Queen),
            _ => None,
        }
    }

    /// Wire id for this tier
    pub fn id(&self) -> &'static str {
        match self {
            BeeTier::Baby => "baby",
            BeeTier::Worker => "worker",
            BeeTier::Elite => "elite",
            BeeTier::Royal => "royal",
            BeeTier::Queen => "queen",
        }
    }
}

/// Alveole storage tiers, levels 1 through 6
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlveoleLevel {
    #[serde(rename = "1")]
    L1,
    #[serde(rename = "2")]
    L2,
    #[serde(rename = "3")]
    L3,
    #[serde(rename = "4")]
    L4,
    #[serde(rename = "5")]
    L5,
    #[serde(rename = "6")]
    L6,
}

impl AlveoleLevel {
    /// All levels in ascending order
    pub const ALL: [AlveoleLevel; 6] = [
        AlveoleLevel::L1,
        AlveoleLevel::L2,
        AlveoleLevel::L3,
        AlveoleLevel::L4,
        AlveoleLevel::L5,
        AlveoleLevel::L6,
    ];

    /// Parse a 1-based level number
    pub fn from_number(level: i64) -> Option<Self> {
        match level {
            1 => Some(AlveoleLevel::L1),
            2 => Some(AlveoleLevel::L2),
            3 => Some(AlveoleLevel::L3),
            4 => Some(AlveoleLevel::L4),
            5 => Some(AlveoleLevel::L5),
            6 => Some(AlveoleLevel::L6),
            _ => None,
        }
    }

    /// 1-based level number
    pub fn number(&self) -> i64 {
        match self {
            AlveoleLevel::L1 => 1,
            AlveoleLevel::L2 => 2,
            AlveoleLevel::L3 => 3,
            AlveoleLevel::L4 => 4,
            AlveoleLevel::L5 => 5,
            AlveoleLevel::L6 => 6,
        }
    }
}
