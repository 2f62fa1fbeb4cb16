use crate::{
    Card, Enemy, Entity, EnvironmentRuntime, ItemInstance, PenaltyRuntime, PerSide, Side,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Battle,
    Victory,
    Reward,
    GameOver,
}

/// Per-round damage adjustments, immunities and the pending loser bonus.
/// Reset at every round boundary; the temporary target-score override is
/// expressed through `GameState::target_score` and reverts with them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundModifiers {
    pub damage_adjustments: PerSide<i64>,
    pub immunity: PerSide<bool>,
    pub loser_bonus: i64,
}

/// Re-entrancy guards. Part of every snapshot, but not semantic for undo.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeFlags {
    pub is_dealing: bool,
    pub is_processing_ai: bool,
    pub is_resolving_round: bool,
    pub is_battle_exiting: bool,
}

/// The full battle/run snapshot. Owned exclusively by the store; every
/// mutation produces a new value and a clone is a full deep copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub phase: Phase,
    pub turn: Side,
    pub stood: PerSide<bool>,
    pub target_score: u32,
    pub base_target_score: u32,
    pub round: u32,
    pub level: u32,
    pub environment: EnvironmentRuntime,
    pub environment_card_ids: Vec<String>,
    pub penalty_card_id: Option<String>,
    pub penalty_runtime: PenaltyRuntime,
    pub player: Entity,
    pub enemy: Enemy,
    pub deck: Vec<Card>,
    pub discard: Vec<Card>,
    /// Cards removed from the round deck by environment deck-shrink rules.
    pub disabled_cards: Vec<Card>,
    pub round_modifiers: RoundModifiers,
    pub message: Option<String>,
    pub reward_pool: Vec<ItemInstance>,
    pub picked_reward_indices: Vec<usize>,
    pub gold_earned_this_level: i64,
}

impl GameState {
    pub fn new(base_target: u32, player: Entity, enemy: Enemy) -> Self {
        Self {
            phase: Phase::Menu,
            turn: Side::Player,
            stood: PerSide::default(),
            target_score: base_target,
            base_target_score: base_target,
            round: 0,
            level: 0,
            environment: EnvironmentRuntime::neutral(base_target),
            environment_card_ids: Vec::new(),
            penalty_card_id: None,
            penalty_runtime: PenaltyRuntime::default(),
            player,
            enemy,
            deck: Vec::new(),
            discard: Vec::new(),
            disabled_cards: Vec::new(),
            round_modifiers: RoundModifiers::default(),
            message: None,
            reward_pool: Vec::new(),
            picked_reward_indices: Vec::new(),
            gold_earned_this_level: 0,
        }
    }

    pub fn entity(&self, side: Side) -> &Entity {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy.entity,
        }
    }

    pub fn entity_mut(&mut self, side: Side) -> &mut Entity {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy.entity,
        }
    }

    /// Round boundary reset: adjustments zeroed, immunities cleared, the
    /// temporary target override reverts to the base target.
    pub fn clear_round_modifiers(&mut self) {
        self.round_modifiers = RoundModifiers::default();
        self.target_score = self.base_target_score;
    }
}

/// An immutable, independently owned copy of `{state, flags}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub state: GameState,
    pub flags: RuntimeFlags,
}
