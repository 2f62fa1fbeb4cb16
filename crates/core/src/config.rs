use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UpgradeKind {
    MaxHp,
    InventorySlots,
    StartingShield,
}

impl UpgradeKind {
    pub const ALL: [Self; 3] = [Self::MaxHp, Self::InventorySlots, Self::StartingShield];
}

/// Every tunable of the simulation core in one serializable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub base_target: u32,
    pub player_max_hp: i64,
    pub player_inventory_slots: usize,
    pub enemy_inventory_slots: usize,
    pub enemy_hp_per_level: i64,

    /// Greedy hits while its true score is below this.
    pub greedy_hit_below: u32,
    /// Defensive hits while its true score is below this.
    pub defensive_hit_below: u32,
    /// Random hits unconditionally below `target - margin`, then coin-flips.
    pub random_hit_margin: u32,

    pub fallback_bust_damage: i64,

    pub history_limit: usize,
    pub action_log_limit: usize,

    pub reward_pool_size: usize,
    pub reward_pick_limit: usize,
    /// Level-indexed gold cost per upgrade kind.
    pub upgrade_costs: HashMap<UpgradeKind, Vec<i64>>,
    pub max_hp_per_upgrade: i64,
    pub slots_per_upgrade: usize,
    pub shield_per_upgrade: i64,

    pub max_effect_depth: u8,
    pub random_item_attempts: u32,

    pub ai_think_ticks: u64,
    pub deal_delay_ticks: u32,
    pub reveal_delay_ticks: u32,

    pub initial_cards: u32,
    pub max_environment_cards: usize,
    pub run_start_items: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut upgrade_costs = HashMap::new();
        upgrade_costs.insert(UpgradeKind::MaxHp, vec![20, 40, 80, 160]);
        upgrade_costs.insert(UpgradeKind::InventorySlots, vec![30, 60, 120]);
        upgrade_costs.insert(UpgradeKind::StartingShield, vec![25, 50, 100]);
        Self {
            base_target: 21,
            player_max_hp: 100,
            player_inventory_slots: 6,
            enemy_inventory_slots: 3,
            enemy_hp_per_level: 12,
            greedy_hit_below: 18,
            defensive_hit_below: 16,
            random_hit_margin: 6,
            fallback_bust_damage: 10,
            history_limit: 256,
            action_log_limit: 128,
            reward_pool_size: 3,
            reward_pick_limit: 1,
            upgrade_costs,
            max_hp_per_upgrade: 10,
            slots_per_upgrade: 1,
            shield_per_upgrade: 5,
            max_effect_depth: 4,
            random_item_attempts: 10,
            ai_think_ticks: 3,
            deal_delay_ticks: 1,
            reveal_delay_ticks: 1,
            initial_cards: 2,
            max_environment_cards: 3,
            run_start_items: 1,
        }
    }
}

impl GameConfig {
    /// Cost of the next level of an upgrade, `None` once maxed out.
    pub fn upgrade_cost(&self, kind: UpgradeKind, current_level: usize) -> Option<i64> {
        self.upgrade_costs
            .get(&kind)
            .and_then(|costs| costs.get(current_level))
            .copied()
    }
}
