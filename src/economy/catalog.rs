//! Fixed economy tables
//!
//! Costs, rewards, and the roulette prize table are compile-time constants.
//! The prize table's declaration order is the selection-walk order, so
//! reordering entries changes which prize a given roll lands on.

use serde::Serialize;

use crate::economy::state::{AlveoleLevel, BeeTier};

/// Minimum honey accepted by a single sale
pub const MIN_HONEY_SALE: i64 = 300;

/// Honey per conversion unit: every 300 honey yields 1 diamond, 1 flower,
/// 2 secondary coin
pub const HONEY_PER_UNIT: i64 = 300;

/// Flower cost of one bee
pub fn bee_cost(tier: BeeTier) -> i64 {
    match tier {
        BeeTier::Baby => 2_000,
        BeeTier::Worker => 10_000,
        BeeTier::Elite => 50_000,
        BeeTier::Royal => 250_000,
        BeeTier::Queen => 1_200_000,
    }
}

/// One alveole storage tier
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AlveoleTier {
    /// Honey capacity ceiling granted by this tier
    pub capacity: i64,
    /// Flower cost to unlock; level 1 is free
    pub cost: i64,
}

/// Capacity and cost for an alveole level
pub fn alveole_tier(level: AlveoleLevel) -> AlveoleTier {
    match level {
        AlveoleLevel::L1 => AlveoleTier { capacity: 1_000_000, cost: 0 },
        AlveoleLevel::L2 => AlveoleTier { capacity: 3_000_000, cost: 200_000 },
        AlveoleLevel::L3 => AlveoleTier { capacity: 6_000_000, cost: 500_000 },
        AlveoleLevel::L4 => AlveoleTier { capacity: 14_000_000, cost: 1_250_000 },
        AlveoleLevel::L5 => AlveoleTier { capacity: 30_000_000, cost: 3_500_000 },
        AlveoleLevel::L6 => AlveoleTier { capacity: 48_000_000, cost: 8_000_000 },
    }
}

/// One referral mission
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: u32,
    /// Invited friends required to claim
    pub friends_required: i64,
    pub flowers_reward: i64,
    pub tickets_reward: i64,
}

/// The seven referral missions
pub const MISSIONS: [Mission; 7] = [
    Mission { id: 1, friends_required: 1, flowers_reward: 500, tickets_reward: 0 },
    Mission { id: 2, friends_required: 3, flowers_reward: 1_500, tickets_reward: 0 },
    Mission { id: 3, friends_required: 10, flowers_reward: 4_000, tickets_reward: 0 },
    Mission { id: 4, friends_required: 50, flowers_reward: 12_000, tickets_reward: 1 },
    Mission { id: 5, friends_required: 100, flowers_reward: 30_000, tickets_reward: 2 },
    Mission { id: 6, friends_required: 300, flowers_reward: 70_000, tickets_reward: 3 },
    Mission { id: 7, friends_required: 500, flowers_reward: 160_000, tickets_reward: 5 },
];

/// Look up a mission by id
pub fn mission(id: u32) -> Option<&'static Mission> {
    MISSIONS.iter().find(|m| m.id == id)
}

/// What a roulette prize grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrizeReward {
    /// Flower grant
    Flowers { amount: i64 },
    /// Bee grant
    Bee { tier: BeeTier, count: i64 },
}

/// One roulette wheel slot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Prize {
    pub label: &'static str,
    pub reward: PrizeReward,
    /// Relative selection weight; positive
    pub weight: u32,
}

/// The 16 roulette slots, in wheel order
pub const PRIZE_TABLE: [Prize; 16] = [
    Prize { label: "100 flowers", reward: PrizeReward::Flowers { amount: 100 }, weight: 210 },
    Prize { label: "250 flowers", reward: PrizeReward::Flowers { amount: 250 }, weight: 150 },
    Prize { label: "500 flowers", reward: PrizeReward::Flowers { amount: 500 }, weight: 120 },
    Prize { label: "1000 flowers", reward: PrizeReward::Flowers { amount: 1_000 }, weight: 90 },
    Prize { label: "2500 flowers", reward: PrizeReward::Flowers { amount: 2_500 }, weight: 70 },
    Prize { label: "5000 flowers", reward: PrizeReward::Flowers { amount: 5_000 }, weight: 50 },
    Prize { label: "10000 flowers", reward: PrizeReward::Flowers { amount: 10_000 }, weight: 30 },
    Prize { label: "25000 flowers", reward: PrizeReward::Flowers { amount: 25_000 }, weight: 15 },
    Prize { label: "1 baby bee", reward: PrizeReward::Bee { tier: BeeTier::Baby, count: 1 }, weight: 100 },
    Prize { label: "2 baby bees", reward: PrizeReward::Bee { tier: BeeTier::Baby, count: 2 }, weight: 60 },
    Prize { label: "1 worker bee", reward: PrizeReward::Bee { tier: BeeTier::Worker, count: 1 }, weight: 45 },
    Prize { label: "2 worker bees", reward: PrizeReward::Bee { tier: BeeTier::Worker, count: 2 }, weight: 25 },
    Prize { label: "1 elite bee", reward: PrizeReward::Bee { tier: BeeTier::Elite, count: 1 }, weight: 20 },
    Prize { label: "2 elite bees", reward: PrizeReward::Bee { tier: BeeTier::Elite, count: 2 }, weight: 10 },
    Prize { label: "1 royal bee", reward: PrizeReward::Bee { tier: BeeTier::Royal, count: 1 }, weight: 4 },
    Prize { label: "1 queen bee", reward: PrizeReward::Bee { tier: BeeTier::Queen, count: 1 }, weight: 1 },
];

/// Sum of all prize weights
pub fn total_weight() -> u32 {
    PRIZE_TABLE.iter().map(|p| p.weight).sum()
}

/// Select a prize for a roll drawn uniformly from `[0, total_weight())`.
///
/// Walks the table in declaration order subtracting each weight; the first
/// slot at which the remainder drops to <= 0 wins. The last slot is the
/// deterministic fallback if floating-point drift exhausts the walk.
pub fn select_prize(mut roll: f64) -> (usize, &'static Prize) {
    for (index, prize) in PRIZE_TABLE.iter().enumerate() {
        roll -= prize.weight as f64;
        if roll <= 0.0 {
            return (index, prize);
        }
    }
    (PRIZE_TABLE.len() - 1, &PRIZE_TABLE[PRIZE_TABLE.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bee_costs_match_catalog() {
        assert_eq!(bee_cost(BeeTier::Baby), 2_000);
        assert_eq!(bee_cost(BeeTier::Worker), 10_000);
        assert_eq!(bee_cost(BeeTier::Elite), 50_000);
        assert_eq!(bee_cost(BeeTier::Royal), 250_000);
        assert_eq!(bee_cost(BeeTier::Queen), 1_200_000);
    }

    #[test]
    fn test_alveole_table() {
        assert_eq!(alveole_tier(AlveoleLevel::L1).cost, 0);
        assert_eq!(alveole_tier(AlveoleLevel::L1).capacity, 1_000_000);
        assert_eq!(alveole_tier(AlveoleLevel::L4).cost, 1_250_000);
        assert_eq!(alveole_tier(AlveoleLevel::L6).capacity, 48_000_000);
    }

    #[test]
    fn test_mission_lookup() {
        assert_eq!(mission(1).unwrap().flowers_reward, 500);
        assert_eq!(mission(7).unwrap().tickets_reward, 5);
        assert!(mission(0).is_none());
        assert!(mission(8).is_none());
    }

    #[test]
    fn test_prize_weights_positive_and_total() {
        for prize in &PRIZE_TABLE {
            assert!(prize.weight > 0, "zero weight on {}", prize.label);
        }
        assert_eq!(total_weight(), 1000);
    }

    #[test]
    fn test_select_prize_boundaries() {
        // Roll 0 lands on the first slot
        assert_eq!(select_prize(0.0).0, 0);

        // A roll exactly at a cumulative boundary still selects the slot
        // whose weight absorbed it
        let first = PRIZE_TABLE[0].weight as f64;
        assert_eq!(select_prize(first).0, 0);
        assert_eq!(select_prize(first + 0.001).0, 1);

        // Last representable roll below the total lands on the last slot
        let total = total_weight() as f64;
        assert_eq!(select_prize(total - 0.5).0, PRIZE_TABLE.len() - 1);
    }

    #[test]
    fn test_select_prize_drift_fallback() {
        // A roll past the total (unreachable from a correct draw, but
        // possible under float drift) falls back to the last slot
        let total = total_weight() as f64;
        assert_eq!(select_prize(total + 1.0).0, PRIZE_TABLE.len() - 1);
    }

    #[test]
    fn test_select_prize_covers_every_slot() {
        // Walking rolls at each cumulative midpoint selects each slot once
        let mut cumulative = 0.0;
        for (i, prize) in PRIZE_TABLE.iter().enumerate() {
            let midpoint = cumulative + prize.weight as f64 / 2.0;
            assert_eq!(select_prize(midpoint).0, i);
            cumulative += prize.weight as f64;
        }
    }
}
