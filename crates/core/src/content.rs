use crate::{
    fallback_outcome, AceMode, AiProfile, EffectConfig, EffectKind, EffectScope, EnvironmentCard,
    EnvironmentRule, Item, ItemKind, PenaltyCard, PenaltyContext, PenaltyError, PenaltyOutcome,
    RngState, Side,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    pub base_hp: i64,
    pub difficulty: u32,
    pub profile: AiProfile,
}

/// Content registry: templates for items, enemies, environments and
/// penalties. Definitions are data; only their schema and evaluation
/// contract live in this crate.
#[derive(Debug, Clone, Default)]
pub struct Content {
    pub items: Vec<Item>,
    pub enemies: Vec<EnemyTemplate>,
    pub environments: Vec<EnvironmentCard>,
    pub penalties: Vec<PenaltyCard>,
}

impl Content {
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyTemplate> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    pub fn penalty(&self, id: &str) -> Option<&PenaltyCard> {
        self.penalties.iter().find(|card| card.id == id)
    }

    pub fn pick_item(&self, rng: &mut RngState) -> Option<&Item> {
        if self.items.is_empty() {
            return None;
        }
        let idx = rng.index(self.items.len());
        self.items.get(idx)
    }

    pub fn pick_enemy(&self, rng: &mut RngState) -> Option<&EnemyTemplate> {
        if self.enemies.is_empty() {
            return None;
        }
        let idx = rng.index(self.enemies.len());
        self.enemies.get(idx)
    }

    pub fn pick_penalty(&self, rng: &mut RngState) -> Option<&PenaltyCard> {
        if self.penalties.is_empty() {
            return None;
        }
        let idx = rng.index(self.penalties.len());
        self.penalties.get(idx)
    }

    /// A small built-in set so a run is playable headless. Real content
    /// tables live outside the core and replace this wholesale.
    pub fn builtin() -> Self {
        Self {
            items: builtin_items(),
            enemies: builtin_enemies(),
            environments: builtin_environments(),
            penalties: builtin_penalties(),
        }
    }
}

fn consumable(id: &str, name: &str, description: &str, effects: Vec<EffectConfig>) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        kind: ItemKind::Consumable,
        effects,
    }
}

fn builtin_items() -> Vec<Item> {
    let mut leech = EffectConfig::with_amount(EffectKind::LifeDrain, 6);
    leech.scope = EffectScope::Opponent;
    let mut press = EffectConfig::new(EffectKind::ForceDraw);
    press.scope = EffectScope::Opponent;
    press.count = 1;
    let mut salve = EffectConfig::new(EffectKind::HealPerInventory);
    salve.meta.insert("per_item".to_string(), 2.0);
    let mut purse = EffectConfig::with_amount(EffectKind::Gold, 10);
    purse.meta.insert("per_level_offset".to_string(), 1.0);
    let mut grab = EffectConfig::with_amount(EffectKind::GainRandomItems, 2);
    grab.scope = EffectScope::SelfSide;
    let mut bounty = EffectConfig::with_amount(EffectKind::PendingLoserDamage, 5);
    bounty.meta.insert("require_under_target".to_string(), 1.0);
    let mut wild = EffectConfig::new(EffectKind::DrawValue);
    wild.meta.insert("value".to_string(), 10.0);
    vec![
        consumable(
            "tonic",
            "Tonic",
            "Restore 8 hp.",
            vec![EffectConfig::with_amount(EffectKind::Heal, 8)],
        ),
        consumable(
            "buckler",
            "Buckler",
            "Gain 6 shield.",
            vec![EffectConfig::with_amount(EffectKind::Shield, 6)],
        ),
        consumable(
            "lucky_draw",
            "Lucky Draw",
            "Draw the card that lands you closest to the target.",
            vec![EffectConfig::new(EffectKind::DrawOptimal)],
        ),
        consumable(
            "tap_out",
            "Tap Out",
            "Return your last drawn card to the deck.",
            vec![EffectConfig::new(EffectKind::UndoLastDraw)],
        ),
        consumable(
            "mirror_swap",
            "Mirror Swap",
            "Exchange the last drawn card of each side.",
            vec![EffectConfig::new(EffectKind::SwapLastCard)],
        ),
        consumable(
            "second_chance",
            "Second Chance",
            "Discard your last card and draw a fresh one.",
            vec![EffectConfig::new(EffectKind::ReplaceLastCard)],
        ),
        consumable(
            "smoke_bomb",
            "Smoke Bomb",
            "Take 3 less damage this round.",
            vec![EffectConfig::with_amount(
                EffectKind::ResolutionDamageBuffer,
                3,
            )],
        ),
        consumable(
            "war_horn",
            "War Horn",
            "The opponent takes 3 more damage this round.",
            vec![{
                let mut boost =
                    EffectConfig::with_amount(EffectKind::ResolutionDamageBoost, 3);
                boost.scope = EffectScope::Opponent;
                boost
            }],
        ),
        consumable(
            "iron_will",
            "Iron Will",
            "Ignore round damage this round.",
            vec![EffectConfig::new(EffectKind::ResolutionDamageImmunity)],
        ),
        consumable("leech", "Leech", "Drain 6 hp from the opponent.", vec![leech]),
        consumable(
            "press_gang",
            "Press Gang",
            "Force the opponent to draw a card.",
            vec![press],
        ),
        consumable(
            "hoarder_salve",
            "Hoarder's Salve",
            "Heal 2 per item you carry.",
            vec![salve],
        ),
        consumable("coin_purse", "Coin Purse", "Gold, scaling with depth.", vec![purse]),
        consumable("grab_bag", "Grab Bag", "Gain up to 2 random items.", vec![grab]),
        consumable(
            "bounty_mark",
            "Bounty Mark",
            "This round's loser takes 5 extra damage.",
            vec![bounty],
        ),
        consumable(
            "wild_card",
            "Wild Card",
            "Draw a ten from the deck if one remains.",
            vec![wild],
        ),
        consumable(
            "lowball",
            "Lowball",
            "Target score becomes 17 for this round.",
            vec![EffectConfig::with_amount(EffectKind::SetTempTargetScore, 17)],
        ),
        consumable(
            "blood_price",
            "Blood Price",
            "Pay 5 hp for 10 shield.",
            vec![
                EffectConfig::with_amount(EffectKind::SelfDamage, 5),
                EffectConfig::with_amount(EffectKind::Shield, 10),
            ],
        ),
        consumable(
            "gamblers_die",
            "Gambler's Die",
            "Borrow a random effect from another item.",
            vec![EffectConfig::new(EffectKind::RandomItemEffect)],
        ),
    ]
}

fn builtin_enemies() -> Vec<EnemyTemplate> {
    vec![
        EnemyTemplate {
            id: "gambler".to_string(),
            name: "Gambler".to_string(),
            base_hp: 40,
            difficulty: 1,
            profile: AiProfile::Greedy,
        },
        EnemyTemplate {
            id: "bouncer".to_string(),
            name: "Bouncer".to_string(),
            base_hp: 55,
            difficulty: 2,
            profile: AiProfile::Defensive,
        },
        EnemyTemplate {
            id: "jester".to_string(),
            name: "Jester".to_string(),
            base_hp: 45,
            difficulty: 2,
            profile: AiProfile::Random,
        },
    ]
}

fn builtin_environments() -> Vec<EnvironmentCard> {
    vec![
        EnvironmentCard {
            id: "rusty_table".to_string(),
            name: "Rusty Table".to_string(),
            rules: vec![EnvironmentRule::DamageModifier {
                flat: 2,
                multiplier: 1.0,
            }],
        },
        EnvironmentCard {
            id: "high_stakes".to_string(),
            name: "High Stakes".to_string(),
            rules: vec![
                EnvironmentRule::RandomizeTarget { min: 17, max: 24 },
                EnvironmentRule::PerfectRewardItem,
            ],
        },
        EnvironmentCard {
            id: "cursed_felt".to_string(),
            name: "Cursed Felt".to_string(),
            rules: vec![
                EnvironmentRule::SpecialBustValues { values: vec![13] },
                EnvironmentRule::SuddenDeath { hp_threshold: 5 },
            ],
        },
        EnvironmentCard {
            id: "thin_deck".to_string(),
            name: "Thin Deck".to_string(),
            rules: vec![EnvironmentRule::DeckShrink { values: vec![10] }],
        },
        EnvironmentCard {
            id: "gilded_cage".to_string(),
            name: "Gilded Cage".to_string(),
            rules: vec![
                EnvironmentRule::ItemLock,
                EnvironmentRule::DamageModifier {
                    flat: 0,
                    multiplier: 1.5,
                },
            ],
        },
        EnvironmentCard {
            id: "low_ceiling".to_string(),
            name: "Low Ceiling".to_string(),
            rules: vec![
                EnvironmentRule::AceMode {
                    mode: AceMode::AlwaysOne,
                },
                EnvironmentRule::AutoDraw {
                    player: 1,
                    enemy: 1,
                },
            ],
        },
    ]
}

fn standard_toll(ctx: &PenaltyContext) -> Result<PenaltyOutcome, PenaltyError> {
    Ok(fallback_outcome(ctx))
}

fn escalating_toll(ctx: &PenaltyContext) -> Result<PenaltyOutcome, PenaltyError> {
    let mut outcome = fallback_outcome(ctx);
    if let Some(winner) = ctx.winner {
        let bonus = 2 * i64::from(ctx.runtime.streak(winner));
        match winner {
            Side::Player => outcome.enemy_damage += bonus,
            Side::Enemy => outcome.player_damage += bonus,
        }
        outcome.message = Some(format!("The toll grows: +{bonus}"));
    }
    Ok(outcome)
}

fn vampire_dealer(ctx: &PenaltyContext) -> Result<PenaltyOutcome, PenaltyError> {
    let mut outcome = fallback_outcome(ctx);
    match ctx.winner {
        Some(Side::Player) => outcome.heals.player = ctx.fallback_damage / 2,
        Some(Side::Enemy) => outcome.heals.enemy = ctx.fallback_damage / 2,
        None => {}
    }
    Ok(outcome)
}

fn builtin_penalties() -> Vec<PenaltyCard> {
    vec![
        PenaltyCard {
            id: "standard_toll".to_string(),
            name: "Standard Toll".to_string(),
            damage_fn: standard_toll,
        },
        PenaltyCard {
            id: "escalating_toll".to_string(),
            name: "Escalating Toll".to_string(),
            damage_fn: escalating_toll,
        },
        PenaltyCard {
            id: "vampire_dealer".to_string(),
            name: "Vampire Dealer".to_string(),
            damage_fn: vampire_dealer,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_resolve_by_id() {
        let content = Content::builtin();
        assert_eq!(
            content.item("tonic").map(|item| item.name.as_str()),
            Some("Tonic")
        );
        assert_eq!(content.enemy("bouncer").map(|enemy| enemy.base_hp), Some(55));
        assert!(content.penalty("standard_toll").is_some());
        assert!(content.item("missing").is_none());
        assert!(content.enemy("missing").is_none());
    }
}
