use crate::Card;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How aces are valued for the current battle. Set by environment rules,
/// `Flexible` everywhere else.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AceMode {
    #[default]
    Flexible,
    AlwaysOne,
    AlwaysEleven,
}

/// Recompute a hand's score in place. Aces are re-valued on every call:
/// under `Flexible` they start at 11 and are demoted to 1 one at a time
/// while the total exceeds the target.
pub fn recompute_score(hand: &mut [Card], target: u32, mode: AceMode) -> u32 {
    for card in hand.iter_mut() {
        if card.is_ace {
            card.value = match mode {
                AceMode::Flexible | AceMode::AlwaysEleven => 11,
                AceMode::AlwaysOne => 1,
            };
        }
    }
    let mut total: u32 = hand.iter().map(|card| card.value).sum();
    if mode == AceMode::Flexible {
        while total > target {
            let Some(high_ace) = hand.iter_mut().find(|card| card.is_ace && card.value == 11)
            else {
                break;
            };
            high_ace.value = 1;
            total -= 10;
        }
    }
    total
}

/// A hand busts above the target, or on any configured special bust value.
pub fn is_bust(score: u32, target: u32, special_bust_values: &BTreeSet<u32>) -> bool {
    score > target || special_bust_values.contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Vec<Card> {
        ranks
            .iter()
            .map(|rank| Card::standard(Suit::Spades, *rank))
            .collect()
    }

    #[test]
    fn ace_and_ten_is_twenty_one() {
        let mut cards = hand(&[Rank::Ace, Rank::Ten]);
        assert_eq!(recompute_score(&mut cards, 21, AceMode::Flexible), 21);
    }

    #[test]
    fn double_ace_demotes_one_at_a_time() {
        let mut cards = hand(&[Rank::Ace, Rank::Ace, Rank::Nine]);
        assert_eq!(recompute_score(&mut cards, 21, AceMode::Flexible), 21);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut cards = hand(&[Rank::Ace, Rank::Ace, Rank::Nine]);
        let first = recompute_score(&mut cards, 21, AceMode::Flexible);
        let second = recompute_score(&mut cards, 21, AceMode::Flexible);
        assert_eq!(first, second);
    }

    #[test]
    fn all_aces_low_still_over_target_terminates() {
        let mut cards = hand(&[Rank::Ace, Rank::King, Rank::King, Rank::King]);
        assert_eq!(recompute_score(&mut cards, 21, AceMode::Flexible), 31);
    }

    #[test]
    fn fixed_ace_modes_skip_demotion() {
        let mut cards = hand(&[Rank::Ace, Rank::Ace]);
        assert_eq!(recompute_score(&mut cards, 21, AceMode::AlwaysOne), 2);
        assert_eq!(recompute_score(&mut cards, 21, AceMode::AlwaysEleven), 22);
    }

    #[test]
    fn special_values_bust_below_target() {
        let special: BTreeSet<u32> = [13].into_iter().collect();
        assert!(is_bust(13, 21, &special));
        assert!(!is_bust(14, 21, &special));
        assert!(is_bust(22, 21, &special));
    }
}
