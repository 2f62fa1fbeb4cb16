use crate::session::damage::{apply_round_damage, enforce_sudden_death};
use crate::{
    advance_streaks, compute_clash_result, evaluate_penalty, is_bust, recompute_score, Card,
    FrameMeta, GameEvent, GameSession, GameState, HandGesture, PenaltyContext, Phase, Rank, Side,
    Suit, VisualCue,
};

/// How a single card draw behaves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DrawOpts {
    pub face_up: bool,
    /// Pass the turn to the opponent unless they already stood.
    pub shift_turn: bool,
    /// Keep the target's stand state instead of un-standing them.
    pub preserve_stand: bool,
    pub label: &'static str,
}

/// Recompute one side's score from its hand against the current target
/// and ace rules.
pub(crate) fn refresh_side_score(state: &mut GameState, side: Side) {
    let target = state.target_score;
    let mode = state.environment.ace_mode;
    let entity = state.entity_mut(side);
    entity.score = recompute_score(&mut entity.hand, target, mode);
}

impl GameSession {
    /// Deal one card from the top of the deck. Returns false when the deck
    /// is exhausted.
    pub(crate) fn draw_card_for(&mut self, side: Side, opts: DrawOpts) -> bool {
        let state = self.store.state();
        if state.deck.is_empty() {
            log::debug!("deck empty, {side:?} cannot draw");
            return false;
        }
        let mut next = state.clone();
        let Some(mut card) = next.deck.pop() else {
            return false;
        };
        card.face_up = opts.face_up;
        next.entity_mut(side).hand.push(card);
        if !opts.preserve_stand {
            *next.stood.get_mut(side) = false;
        }
        refresh_side_score(&mut next, side);
        if opts.shift_turn {
            let other = side.opponent();
            if !next.stood.get(other) {
                next.turn = other;
            }
        }
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardDrawn {
                card,
                face_up: opts.face_up,
            },
            delay_hint: self.config.deal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label(opts.label), move |state, _| *state = next);
        true
    }

    /// Turn a specific hand card face up.
    pub fn reveal_card(&mut self, side: Side, index: usize) {
        let state = self.store.state();
        let Some(card) = state.entity(side).hand.get(index) else {
            return;
        };
        if card.face_up {
            return;
        }
        let mut next = state.clone();
        next.entity_mut(side).hand[index].face_up = true;
        refresh_side_score(&mut next, side);
        let revealed = next.entity(side).hand[index];
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardRevealed { card: revealed },
            delay_hint: self.config.reveal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label("reveal"), move |state, _| *state = next);
    }

    /// Fresh shuffled deck for the round, minus environment-shrunk values.
    fn build_round_deck(&mut self) -> (Vec<Card>, Vec<Card>) {
        let mut deck = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                let mut card = Card::standard(suit, rank);
                card.id = self.alloc_card_id();
                deck.push(card);
            }
        }
        self.rng.shuffle(&mut deck);
        let shrink = self.store.state().environment.deck_shrink_values.clone();
        let (disabled, deck): (Vec<Card>, Vec<Card>) = deck
            .into_iter()
            .partition(|card| shrink.contains(&card.rank.base_value()));
        (deck, disabled)
    }

    /// Begin the next round of the active battle: rebuild the deck, clear
    /// hands and round modifiers, deal the opening cards and run any
    /// environment auto-draws.
    pub(crate) fn start_round(&mut self) {
        let (deck, disabled) = self.build_round_deck();
        let first_round = self.store.state().round == 0;
        self.store
            .update(FrameMeta::label("round-start"), move |state, flags| {
                flags.is_dealing = true;
                state.round += 1;
                state.clear_round_modifiers();
                state.stood = Default::default();
                state.turn = Side::Player;
                state.message = None;
                for side in [Side::Player, Side::Enemy] {
                    let entity = state.entity_mut(side);
                    let mut hand = std::mem::take(&mut entity.hand);
                    for card in hand.iter_mut() {
                        card.face_up = true;
                    }
                    entity.score = 0;
                    state.discard.extend(hand);
                }
                state.deck = deck;
                state.disabled_cards = disabled;
            });
        if first_round {
            self.announce_battle_cards();
        }
        self.deal_opening_hands();
        let auto = self.store.state().environment.auto_draw;
        for side in [Side::Player, Side::Enemy] {
            for _ in 0..*auto.get(side) {
                self.draw_card_for(
                    side,
                    DrawOpts {
                        face_up: true,
                        shift_turn: false,
                        preserve_stand: false,
                        label: "auto-draw",
                    },
                );
            }
        }
        if first_round && self.store.state().level == 1 {
            let bonus = self.config.run_start_items;
            let mut next = self.store.state().clone();
            if self.grant_random_items_state(&mut next, Side::Player, bonus) > 0 {
                self.store
                    .update(FrameMeta::label("run-start-items"), move |state, _| {
                        *state = next
                    });
            }
        }
        self.store
            .update(FrameMeta::transient("deal-finished"), |_, flags| {
                flags.is_dealing = false;
            });
        self.evaluate_flow();
    }

    /// First-round presentation of the battle's environment and penalty
    /// cards.
    fn announce_battle_cards(&mut self) {
        let state = self.store.state();
        for card_id in state.environment_card_ids.clone() {
            self.events
                .push(GameEvent::EnvironmentAnimation { card_id });
        }
        if let Some(card_id) = state.penalty_card_id.clone() {
            self.events.push(GameEvent::PenaltyAnimation {
                card_id: card_id.clone(),
            });
            if let Some(card) = self.content.penalty(&card_id) {
                let name = card.name.clone();
                self.events
                    .push(GameEvent::PenaltyCardRevealed { card_id, name });
            }
        }
    }

    /// Alternating opening deal. The enemy's first card stays face down
    /// until resolution.
    fn deal_opening_hands(&mut self) {
        for i in 0..self.config.initial_cards {
            self.draw_card_for(
                Side::Player,
                DrawOpts {
                    face_up: true,
                    shift_turn: false,
                    preserve_stand: false,
                    label: "deal",
                },
            );
            self.draw_card_for(
                Side::Enemy,
                DrawOpts {
                    face_up: i != 0,
                    shift_turn: false,
                    preserve_stand: false,
                    label: "deal",
                },
            );
        }
    }

    /// Resolve the round once both sides stand: reveal everything, judge
    /// the clash, run the penalty card, apply damage and either continue
    /// the battle or end it.
    pub(crate) fn resolve_round(&mut self) {
        if self.store.flags().is_resolving_round {
            return;
        }
        self.cancel_ai();
        self.store
            .update(FrameMeta::transient("resolve-begin"), |_, flags| {
                flags.is_resolving_round = true;
            });

        let mut next = self.store.state().clone();
        for side in [Side::Player, Side::Enemy] {
            let entity = next.entity_mut(side);
            let hidden: Vec<Card> = entity
                .hand
                .iter()
                .filter(|card| !card.face_up)
                .copied()
                .collect();
            for card in entity.hand.iter_mut() {
                card.face_up = true;
            }
            refresh_side_score(&mut next, side);
            for mut card in hidden {
                card.face_up = true;
                self.events.push(GameEvent::VisualEffect {
                    side,
                    cue: VisualCue::CardRevealed { card },
                    delay_hint: self.config.reveal_delay_ticks,
                });
            }
        }

        let target = next.target_score;
        let specials = next.environment.special_bust_values.clone();
        let player_score = next.player.score;
        let enemy_score = next.enemy.entity.score;
        let player_bust = is_bust(player_score, target, &specials);
        let enemy_bust = is_bust(enemy_score, target, &specials);
        let clash = compute_clash_result(player_score, enemy_score, player_bust, enemy_bust);
        self.events.push(GameEvent::ClashState {
            result: clash.result,
            player_score,
            enemy_score,
            player_bust,
            enemy_bust,
            message: clash.message.clone(),
        });

        let ctx = PenaltyContext {
            clash: clash.result,
            winner: clash.winner,
            loser: clash.loser,
            player_score,
            enemy_score,
            player_bust,
            enemy_bust,
            target,
            round: next.round,
            runtime: next.penalty_runtime.clone(),
            fallback_damage: self.config.fallback_bust_damage,
        };
        let card = next
            .penalty_card_id
            .as_deref()
            .and_then(|id| self.content.penalty(id));
        let outcome = evaluate_penalty(card, &ctx);

        apply_round_damage(&mut next, &mut self.events, &outcome);
        enforce_sudden_death(&mut next, &mut self.events);

        if self.store.state().environment.perfect_reward_item {
            for side in [Side::Player, Side::Enemy] {
                let score = next.entity(side).score;
                if score == target && !is_bust(score, target, &specials) {
                    self.grant_random_items_state(&mut next, side, 1);
                }
            }
        }

        let mut runtime = advance_streaks(&next.penalty_runtime, clash.result);
        if let Some(patch) = outcome.runtime_patch.clone() {
            runtime = patch;
        }
        if runtime != next.penalty_runtime {
            next.penalty_runtime = runtime;
        }
        next.message = outcome.message.clone().or(Some(clash.message));
        next.clear_round_modifiers();
        self.store
            .update(FrameMeta::label("resolve-round"), move |state, _| {
                *state = next
            });

        let state = self.store.state();
        if state.enemy.entity.hp <= 0 {
            self.end_battle(Phase::Victory);
        } else if state.player.hp <= 0 {
            self.end_battle(Phase::GameOver);
        } else {
            self.store
                .update(FrameMeta::transient("resolve-end"), |_, flags| {
                    flags.is_resolving_round = false;
                });
            self.start_round();
        }
    }

    fn end_battle(&mut self, phase: Phase) {
        self.cancel_ai();
        self.store
            .update(FrameMeta::label("battle-end"), move |state, flags| {
                flags.is_resolving_round = false;
                flags.is_battle_exiting = true;
                state.phase = phase;
                state.message = Some(match phase {
                    Phase::Victory => "Victory".to_string(),
                    _ => "Defeat".to_string(),
                });
            });
        if phase == Phase::Victory {
            self.events.push(GameEvent::HandAction {
                side: Side::Player,
                gesture: HandGesture::Stand,
            });
        }
    }
}
