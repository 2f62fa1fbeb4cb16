use crate::session::round::DrawOpts;
use crate::{
    is_bust, AiProfile, FrameMeta, GameEvent, GameSession, HandGesture, Phase, RngState,
    ScheduledAction, Side,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    Hit,
    Stand,
}

/// Per-profile thresholds the decision uses.
#[derive(Debug, Clone, Copy)]
pub struct AiTuning {
    pub greedy_hit_below: u32,
    pub defensive_hit_below: u32,
    pub random_hit_margin: u32,
}

/// Pure enemy decision. Standing is forced whenever the current score
/// already busts; no profile ever hits into a guaranteed loss it can see.
pub fn ai_decision(
    profile: AiProfile,
    score: u32,
    target: u32,
    special_bust_values: &BTreeSet<u32>,
    tuning: AiTuning,
    rng: &mut RngState,
) -> AiAction {
    if is_bust(score, target, special_bust_values) || score >= target {
        return AiAction::Stand;
    }
    match profile {
        AiProfile::Greedy => {
            if score < tuning.greedy_hit_below.min(target) {
                AiAction::Hit
            } else {
                AiAction::Stand
            }
        }
        AiProfile::Defensive => {
            if score < tuning.defensive_hit_below.min(target) {
                AiAction::Hit
            } else {
                AiAction::Stand
            }
        }
        AiProfile::Random => {
            if score < target.saturating_sub(tuning.random_hit_margin) {
                AiAction::Hit
            } else if rng.coin_flip() {
                AiAction::Hit
            } else {
                AiAction::Stand
            }
        }
    }
}

impl GameSession {
    /// Arm the enemy think timer if it is not already pending.
    pub(crate) fn queue_enemy_turn(&mut self) {
        if let Some(id) = self.ai_timer {
            if self.scheduler.is_pending(id) {
                return;
            }
        }
        let id = self
            .scheduler
            .schedule(self.config.ai_think_ticks, ScheduledAction::EnemyThink);
        self.ai_timer = Some(id);
        self.store
            .update(FrameMeta::transient("ai-think"), |_, flags| {
                flags.is_processing_ai = true;
            });
        self.events.push(GameEvent::HandAction {
            side: Side::Enemy,
            gesture: HandGesture::Think,
        });
    }

    /// Cancel a pending think. Called whenever the game state the think
    /// was queued against may no longer hold.
    pub(crate) fn cancel_ai(&mut self) {
        if let Some(id) = self.ai_timer.take() {
            self.scheduler.cancel(id);
        }
        if self.store.flags().is_processing_ai {
            self.store
                .update(FrameMeta::transient("ai-cancel"), |_, flags| {
                    flags.is_processing_ai = false;
                });
        }
    }

    /// The fired think timer: re-validate that the enemy still owns the
    /// turn, then decide and act.
    pub(crate) fn ai_think(&mut self) {
        self.ai_timer = None;
        let state = self.store.state();
        let flags = self.store.flags();
        let stale = state.phase != Phase::Battle
            || state.turn != Side::Enemy
            || *state.stood.get(Side::Enemy)
            || flags.is_dealing
            || flags.is_resolving_round
            || flags.is_battle_exiting;
        if stale {
            log::debug!("stale ai think dropped");
            self.store
                .update(FrameMeta::transient("ai-stale"), |_, flags| {
                    flags.is_processing_ai = false;
                });
            return;
        }
        let tuning = AiTuning {
            greedy_hit_below: self.config.greedy_hit_below,
            defensive_hit_below: self.config.defensive_hit_below,
            random_hit_margin: self.config.random_hit_margin,
        };
        let action = if state.deck.is_empty() {
            AiAction::Stand
        } else {
            ai_decision(
                state.enemy.profile,
                state.enemy.entity.score,
                state.target_score,
                &state.environment.special_bust_values,
                tuning,
                &mut self.rng,
            )
        };
        self.store
            .update(FrameMeta::transient("ai-act"), |_, flags| {
                flags.is_processing_ai = false;
            });
        match action {
            AiAction::Hit => {
                self.events.push(GameEvent::HandAction {
                    side: Side::Enemy,
                    gesture: HandGesture::Hit,
                });
                self.draw_card_for(
                    Side::Enemy,
                    DrawOpts {
                        face_up: true,
                        shift_turn: true,
                        preserve_stand: false,
                        label: "enemy-hit",
                    },
                );
            }
            AiAction::Stand => {
                self.events.push(GameEvent::HandAction {
                    side: Side::Enemy,
                    gesture: HandGesture::Stand,
                });
                self.store
                    .update(FrameMeta::label("enemy-stand"), |state, _| {
                        *state.stood.get_mut(Side::Enemy) = true;
                        if !*state.stood.get(Side::Player) {
                            state.turn = Side::Player;
                        }
                    });
            }
        }
        self.evaluate_flow();
    }
}
