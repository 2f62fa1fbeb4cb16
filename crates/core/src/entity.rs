use crate::{Card, ItemInstance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// One value per battle side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerSide<T> {
    pub player: T,
    pub enemy: T,
}

impl<T> PerSide<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AiProfile {
    Greedy,
    Defensive,
    Random,
}

/// Common battler shape for both sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub hp: i64,
    pub max_hp: i64,
    pub hand: Vec<Card>,
    /// Derived; recomputed on every draw/reveal.
    pub score: u32,
    pub shield: i64,
    pub inventory: Vec<ItemInstance>,
    pub max_inventory: usize,
}

impl Entity {
    pub fn new(max_hp: i64, max_inventory: usize) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            hand: Vec::new(),
            score: 0,
            shield: 0,
            inventory: Vec::new(),
            max_inventory,
        }
    }

    pub fn free_inventory_slots(&self) -> usize {
        self.max_inventory.saturating_sub(self.inventory.len())
    }

    pub fn last_card(&self) -> Option<&Card> {
        self.hand.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enemy {
    pub entity: Entity,
    pub template_id: String,
    pub difficulty: u32,
    pub profile: AiProfile,
}
