use crate::{AceMode, PerSide, RngState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One rule carried by an environment card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EnvironmentRule {
    /// Replace the battle target with a uniform pick in `[min, max]`,
    /// fixed at compile time.
    RandomizeTarget { min: u32, max: u32 },
    /// Flat and multiplicative scaling applied to every damage hit.
    DamageModifier { flat: i64, multiplier: f64 },
    /// Entities at or below this hp are zeroed at round resolution.
    SuddenDeath { hp_threshold: i64 },
    /// Remove every card of these values from each fresh round deck.
    DeckShrink { values: Vec<u32> },
    /// Hitting the target exactly grants a random item.
    PerfectRewardItem,
    /// Extra cards dealt to each side at round start.
    AutoDraw { player: u32, enemy: u32 },
    AceMode { mode: AceMode },
    /// Items cannot be used for the battle.
    ItemLock,
    /// Scores that bust even though they are at or under the target.
    SpecialBustValues { values: Vec<u32> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentCard {
    pub id: String,
    pub name: String,
    pub rules: Vec<EnvironmentRule>,
}

/// Compiled effect of all active environment cards. Built once per battle
/// start, immutable for the battle's duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentRuntime {
    pub target_score: u32,
    pub damage_flat: i64,
    pub damage_multiplier: f64,
    pub sudden_death_hp: Option<i64>,
    pub deck_shrink_values: BTreeSet<u32>,
    pub perfect_reward_item: bool,
    pub auto_draw: PerSide<u32>,
    pub ace_mode: AceMode,
    pub items_locked: bool,
    pub special_bust_values: BTreeSet<u32>,
}

impl EnvironmentRuntime {
    pub fn neutral(base_target: u32) -> Self {
        Self {
            target_score: base_target,
            damage_flat: 0,
            damage_multiplier: 1.0,
            sudden_death_hp: None,
            deck_shrink_values: BTreeSet::new(),
            perfect_reward_item: false,
            auto_draw: PerSide::default(),
            ace_mode: AceMode::default(),
            items_locked: false,
            special_bust_values: BTreeSet::new(),
        }
    }

    /// Pure fold of every card's rules into one runtime struct. Numeric
    /// modifiers accumulate, flags OR, randomized picks happen exactly once
    /// here and stay fixed for the battle. A rule with unusable data is a
    /// no-op for that rule only.
    pub fn compile(cards: &[EnvironmentCard], base_target: u32, rng: &mut RngState) -> Self {
        let mut runtime = Self::neutral(base_target);
        for card in cards {
            for rule in &card.rules {
                runtime.fold_rule(rule, rng);
            }
        }
        runtime
    }

    fn fold_rule(&mut self, rule: &EnvironmentRule, rng: &mut RngState) {
        match rule {
            EnvironmentRule::RandomizeTarget { min, max } => {
                if min > max {
                    return;
                }
                self.target_score = rng.range_i64(*min as i64, *max as i64) as u32;
            }
            EnvironmentRule::DamageModifier { flat, multiplier } => {
                self.damage_flat += flat;
                if multiplier.is_finite() && *multiplier > 0.0 {
                    self.damage_multiplier *= multiplier;
                }
            }
            EnvironmentRule::SuddenDeath { hp_threshold } => {
                if *hp_threshold <= 0 {
                    return;
                }
                let current = self.sudden_death_hp.unwrap_or(0);
                self.sudden_death_hp = Some(current.max(*hp_threshold));
            }
            EnvironmentRule::DeckShrink { values } => {
                self.deck_shrink_values.extend(values.iter().copied());
            }
            EnvironmentRule::PerfectRewardItem => self.perfect_reward_item = true,
            EnvironmentRule::AutoDraw { player, enemy } => {
                self.auto_draw.player += player;
                self.auto_draw.enemy += enemy;
            }
            EnvironmentRule::AceMode { mode } => self.ace_mode = *mode,
            EnvironmentRule::ItemLock => self.items_locked = true,
            EnvironmentRule::SpecialBustValues { values } => {
                self.special_bust_values.extend(values.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, rules: Vec<EnvironmentRule>) -> EnvironmentCard {
        EnvironmentCard {
            id: id.to_string(),
            name: id.to_string(),
            rules,
        }
    }

    #[test]
    fn modifiers_accumulate_across_cards() {
        let cards = vec![
            card(
                "a",
                vec![EnvironmentRule::DamageModifier {
                    flat: 2,
                    multiplier: 2.0,
                }],
            ),
            card(
                "b",
                vec![
                    EnvironmentRule::DamageModifier {
                        flat: 1,
                        multiplier: 1.5,
                    },
                    EnvironmentRule::ItemLock,
                ],
            ),
        ];
        let mut rng = RngState::from_seed(1);
        let runtime = EnvironmentRuntime::compile(&cards, 21, &mut rng);
        assert_eq!(runtime.damage_flat, 3);
        assert!((runtime.damage_multiplier - 3.0).abs() < 1e-9);
        assert!(runtime.items_locked);
    }

    #[test]
    fn randomized_target_is_fixed_and_in_range() {
        let cards = vec![card(
            "a",
            vec![EnvironmentRule::RandomizeTarget { min: 17, max: 24 }],
        )];
        let mut rng = RngState::from_seed(7);
        let runtime = EnvironmentRuntime::compile(&cards, 21, &mut rng);
        assert!((17..=24).contains(&runtime.target_score));
    }

    #[test]
    fn inverted_randomize_range_is_a_noop() {
        let cards = vec![card(
            "a",
            vec![EnvironmentRule::RandomizeTarget { min: 30, max: 10 }],
        )];
        let mut rng = RngState::from_seed(7);
        let runtime = EnvironmentRuntime::compile(&cards, 21, &mut rng);
        assert_eq!(runtime.target_score, 21);
    }

    #[test]
    fn special_bust_values_dedupe_sorted() {
        let cards = vec![
            card(
                "a",
                vec![EnvironmentRule::SpecialBustValues {
                    values: vec![15, 13],
                }],
            ),
            card(
                "b",
                vec![EnvironmentRule::SpecialBustValues {
                    values: vec![13, 17],
                }],
            ),
        ];
        let mut rng = RngState::from_seed(1);
        let runtime = EnvironmentRuntime::compile(&cards, 21, &mut rng);
        let values: Vec<u32> = runtime.special_bust_values.iter().copied().collect();
        assert_eq!(values, vec![13, 15, 17]);
    }
}
