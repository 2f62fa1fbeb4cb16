use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Consumable,
    Passive,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EffectScope {
    #[default]
    SelfSide,
    Opponent,
    Both,
}

/// Closed set of effect kinds the registry dispatches on. Adding a kind is
/// an exhaustiveness check in the builtin handler, not a string lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Heal,
    Shield,
    Draw,
    ForceDraw,
    ResolutionDamageBuffer,
    ResolutionDamageBoost,
    ResolutionDamageImmunity,
    DrawOptimal,
    DrawValue,
    SwapLastCard,
    UndoLastDraw,
    ReplaceLastCard,
    GainRandomItems,
    SelfDamage,
    SetTempTargetScore,
    RandomItemEffect,
    PendingLoserDamage,
    LifeDrain,
    HealPerInventory,
    Gold,
}

impl EffectKind {
    pub const ALL: [Self; 20] = [
        Self::Heal,
        Self::Shield,
        Self::Draw,
        Self::ForceDraw,
        Self::ResolutionDamageBuffer,
        Self::ResolutionDamageBoost,
        Self::ResolutionDamageImmunity,
        Self::DrawOptimal,
        Self::DrawValue,
        Self::SwapLastCard,
        Self::UndoLastDraw,
        Self::ReplaceLastCard,
        Self::GainRandomItems,
        Self::SelfDamage,
        Self::SetTempTargetScore,
        Self::RandomItemEffect,
        Self::PendingLoserDamage,
        Self::LifeDrain,
        Self::HealPerInventory,
        Self::Gold,
    ];
}

/// One declarative game-state mutation. The meta bag is free-form numeric
/// data; handlers read the keys they know and ignore the rest, so a
/// malformed entry degrades to a default instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectConfig {
    pub kind: EffectKind,
    #[serde(default)]
    pub scope: EffectScope,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub meta: HashMap<String, f64>,
}

impl EffectConfig {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            scope: EffectScope::default(),
            amount: 0,
            count: 0,
            meta: HashMap::new(),
        }
    }

    pub fn with_amount(kind: EffectKind, amount: i64) -> Self {
        Self {
            amount,
            ..Self::new(kind)
        }
    }

    pub fn meta_value(&self, key: &str) -> Option<f64> {
        self.meta.get(key).copied()
    }

    pub fn meta_flag(&self, key: &str) -> bool {
        self.meta_value(key).unwrap_or(0.0) != 0.0
    }
}

/// Item template. Instantiated per draw; two copies of the same template
/// are distinct instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ItemKind,
    pub effects: Vec<EffectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemInstance {
    pub instance_id: u64,
    pub item: Item,
}
