use crate::session::round::{refresh_side_score, DrawOpts};
use crate::{
    is_bust, recompute_score, DamageOpts, EffectConfig, EffectKind, EffectScope, FrameMeta,
    GameEvent, GameSession, Side, VisualCue,
};
use std::collections::HashMap;

/// Where an effect execution came from. Borrowed executions are relabeled
/// so a borrowed `RandomItemEffect` still counts against the same chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSource {
    Item,
    Borrowed,
    System,
}

/// The item an effect chain originated from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginItem {
    pub template_id: String,
    pub instance_id: u64,
}

/// Immutable context for one effect execution.
#[derive(Debug, Clone)]
pub struct EffectCtx {
    pub actor: Side,
    pub source: EffectSource,
    pub config: EffectConfig,
    pub origin: Option<OriginItem>,
    pub effect_index: usize,
    pub depth: u8,
}

impl EffectCtx {
    fn targets(&self) -> Vec<Side> {
        match self.config.scope {
            EffectScope::SelfSide => vec![self.actor],
            EffectScope::Opponent => vec![self.actor.opponent()],
            EffectScope::Both => vec![self.actor, self.actor.opponent()],
        }
    }
}

/// A pluggable effect implementation. Handlers receive the whole session
/// and mutate through the store like any other service.
pub trait EffectHandler {
    fn execute(&mut self, session: &mut GameSession, ctx: &EffectCtx);
}

/// Kind-keyed handler table. Dispatch temporarily removes the kind's
/// handler list so a handler may re-enter the session freely; a nested
/// execution of the same kind while it runs is a no-op.
pub struct EffectRegistry {
    handlers: HashMap<EffectKind, Vec<Box<dyn EffectHandler>>>,
}

impl EffectRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the builtin handler wired for every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in EffectKind::ALL {
            registry.handlers.insert(kind, vec![Box::new(BuiltinEffects)]);
        }
        registry
    }

    /// Add a handler for a kind. With `replace` the existing list is
    /// dropped, otherwise the handler runs after the ones already there.
    pub fn register(&mut self, kind: EffectKind, handler: Box<dyn EffectHandler>, replace: bool) {
        let entry = self.handlers.entry(kind).or_default();
        if replace {
            entry.clear();
        }
        entry.push(handler);
    }

    fn take_handlers(&mut self, kind: EffectKind) -> Option<Vec<Box<dyn EffectHandler>>> {
        self.handlers.remove(&kind)
    }

    fn restore_handlers(&mut self, kind: EffectKind, mut handlers: Vec<Box<dyn EffectHandler>>) {
        // Handlers registered during dispatch run after the restored list.
        if let Some(added) = self.handlers.remove(&kind) {
            handlers.extend(added);
        }
        self.handlers.insert(kind, handlers);
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("kinds", &self.handlers.len())
            .finish()
    }
}

/// The default implementation of every effect kind.
struct BuiltinEffects;

impl EffectHandler for BuiltinEffects {
    fn execute(&mut self, session: &mut GameSession, ctx: &EffectCtx) {
        session.builtin_effect(ctx);
    }
}

impl GameSession {
    /// Run an item's effect list in declaration order.
    pub fn execute_effects(
        &mut self,
        effects: &[EffectConfig],
        actor: Side,
        source: EffectSource,
        origin: Option<OriginItem>,
    ) {
        for (index, config) in effects.iter().enumerate() {
            let ctx = EffectCtx {
                actor,
                source,
                config: config.clone(),
                origin: origin.clone(),
                effect_index: index,
                depth: 0,
            };
            self.execute_effect(&ctx);
        }
    }

    pub fn execute_effect(&mut self, ctx: &EffectCtx) {
        let Some(mut handlers) = self.effects.take_handlers(ctx.config.kind) else {
            log::debug!("no handler for {:?}", ctx.config.kind);
            return;
        };
        for handler in handlers.iter_mut() {
            handler.execute(self, ctx);
        }
        self.effects.restore_handlers(ctx.config.kind, handlers);
    }

    fn builtin_effect(&mut self, ctx: &EffectCtx) {
        let config = &ctx.config;
        match config.kind {
            EffectKind::Heal => {
                for side in ctx.targets() {
                    self.apply_healing(side, config.amount);
                }
            }
            EffectKind::Shield => {
                if config.amount <= 0 {
                    return;
                }
                let mut next = self.store.state().clone();
                for side in ctx.targets() {
                    next.entity_mut(side).shield += config.amount;
                    self.events.push(GameEvent::VisualEffect {
                        side,
                        cue: VisualCue::ShieldGained {
                            amount: config.amount,
                        },
                        delay_hint: 0,
                    });
                }
                self.store
                    .update(FrameMeta::label("shield"), move |state, _| *state = next);
            }
            EffectKind::Draw | EffectKind::ForceDraw => {
                let preserve_stand = config.kind == EffectKind::ForceDraw;
                let count = config.count.max(1);
                for side in ctx.targets() {
                    for _ in 0..count {
                        let drawn = self.draw_card_for(
                            side,
                            DrawOpts {
                                face_up: true,
                                shift_turn: false,
                                preserve_stand,
                                label: "effect-draw",
                            },
                        );
                        if !drawn {
                            break;
                        }
                    }
                }
            }
            EffectKind::ResolutionDamageBuffer => {
                let mut next = self.store.state().clone();
                for side in ctx.targets() {
                    *next.round_modifiers.damage_adjustments.get_mut(side) -= config.amount;
                }
                self.store
                    .update(FrameMeta::label("damage-buffer"), move |state, _| {
                        *state = next
                    });
            }
            EffectKind::ResolutionDamageBoost => {
                let mut next = self.store.state().clone();
                for side in ctx.targets() {
                    *next.round_modifiers.damage_adjustments.get_mut(side) += config.amount;
                }
                self.store
                    .update(FrameMeta::label("damage-boost"), move |state, _| {
                        *state = next
                    });
            }
            EffectKind::ResolutionDamageImmunity => {
                let mut next = self.store.state().clone();
                for side in ctx.targets() {
                    *next.round_modifiers.immunity.get_mut(side) = true;
                }
                self.store
                    .update(FrameMeta::label("damage-immunity"), move |state, _| {
                        *state = next
                    });
            }
            EffectKind::DrawOptimal => {
                for side in ctx.targets() {
                    self.draw_optimal(side);
                }
            }
            EffectKind::DrawValue => {
                let wanted = config
                    .meta_value("value")
                    .map(|value| value as i64)
                    .unwrap_or(config.amount);
                for side in ctx.targets() {
                    self.draw_specific_value(side, wanted);
                }
            }
            EffectKind::SwapLastCard => {
                let state = self.store.state();
                if state.player.hand.is_empty() || state.enemy.entity.hand.is_empty() {
                    log::debug!("swap skipped, a hand is empty");
                    return;
                }
                let mut next = state.clone();
                let from_player = next.player.hand.pop();
                let from_enemy = next.enemy.entity.hand.pop();
                if let (Some(player_card), Some(enemy_card)) = (from_player, from_enemy) {
                    next.player.hand.push(enemy_card);
                    next.enemy.entity.hand.push(player_card);
                }
                refresh_side_score(&mut next, Side::Player);
                refresh_side_score(&mut next, Side::Enemy);
                for side in [Side::Player, Side::Enemy] {
                    self.events.push(GameEvent::VisualEffect {
                        side,
                        cue: VisualCue::CardSwapped,
                        delay_hint: self.config.reveal_delay_ticks,
                    });
                }
                self.store
                    .update(FrameMeta::label("swap-last"), move |state, _| *state = next);
            }
            EffectKind::UndoLastDraw => {
                for side in ctx.targets() {
                    self.undo_last_draw(side);
                }
            }
            EffectKind::ReplaceLastCard => {
                for side in ctx.targets() {
                    self.replace_last_card(side);
                }
            }
            EffectKind::GainRandomItems => {
                let count = config.amount.max(0) as u32;
                let mut next = self.store.state().clone();
                let mut granted = 0;
                for side in ctx.targets() {
                    granted += self.grant_random_items_state(&mut next, side, count);
                }
                if granted > 0 {
                    self.store
                        .update(FrameMeta::label("gain-items"), move |state, _| {
                            *state = next
                        });
                }
            }
            EffectKind::SelfDamage => {
                let pierce = config.meta_flag("pierce");
                for side in ctx.targets() {
                    if pierce {
                        let mut next = self.store.state().clone();
                        let entity = next.entity_mut(side);
                        entity.hp = (entity.hp - config.amount.max(0)).max(0);
                        self.events.push(GameEvent::DamageNumber {
                            side,
                            amount: config.amount.max(0),
                            heal: false,
                        });
                        self.store
                            .update(FrameMeta::label("self-damage"), move |state, _| {
                                *state = next
                            });
                    } else {
                        self.apply_damage(side, config.amount, DamageOpts::default());
                    }
                }
            }
            EffectKind::SetTempTargetScore => {
                if config.amount <= 0 {
                    return;
                }
                let mut next = self.store.state().clone();
                next.target_score = config.amount as u32;
                refresh_side_score(&mut next, Side::Player);
                refresh_side_score(&mut next, Side::Enemy);
                self.store
                    .update(FrameMeta::label("temp-target"), move |state, _| {
                        *state = next
                    });
            }
            EffectKind::RandomItemEffect => self.borrow_random_effect(ctx),
            EffectKind::PendingLoserDamage => {
                if config.meta_flag("require_under_target") {
                    let state = self.store.state();
                    if state.entity(ctx.actor).score > state.target_score {
                        log::debug!("loser bonus requires the actor at or under target");
                        return;
                    }
                }
                let mut next = self.store.state().clone();
                next.round_modifiers.loser_bonus += config.amount;
                self.store
                    .update(FrameMeta::label("loser-bonus"), move |state, _| {
                        *state = next
                    });
            }
            EffectKind::LifeDrain => {
                let drained =
                    self.apply_damage(ctx.actor.opponent(), config.amount, DamageOpts::default());
                if drained > 0 {
                    self.apply_healing(ctx.actor, drained);
                }
            }
            EffectKind::HealPerInventory => {
                let per_item = config.meta_value("per_item").unwrap_or(1.0);
                for side in ctx.targets() {
                    let held = self.store.state().entity(side).inventory.len();
                    let total = (held as f64 * per_item + config.amount as f64).floor() as i64;
                    if total > 0 {
                        self.apply_healing(side, total);
                    } else if total < 0 {
                        self.apply_damage(side, -total, DamageOpts::default());
                    }
                }
            }
            EffectKind::Gold => {
                let level = i64::from(self.store.state().level);
                let total = match config.meta_value("per_level_offset") {
                    Some(offset) => config.amount * (level - offset as i64).max(0),
                    None => config.amount,
                };
                if total == 0 {
                    return;
                }
                self.meta.gold += total;
                self.store
                    .update(FrameMeta::label("gold"), move |state, _| {
                        state.gold_earned_this_level += total;
                    });
            }
        }
    }

    /// Pull the deck card landing the hand closest to the target. A
    /// non-busting candidate always beats a busting one; ties keep the
    /// lowest deck index.
    fn draw_optimal(&mut self, side: Side) {
        let state = self.store.state();
        if state.deck.is_empty() {
            return;
        }
        let target = state.target_score;
        let mode = state.environment.ace_mode;
        let specials = state.environment.special_bust_values.clone();
        let hand = state.entity(side).hand.clone();
        let mut best: Option<(usize, bool, u32)> = None;
        for (index, card) in state.deck.iter().enumerate() {
            let mut trial = hand.clone();
            trial.push(*card);
            let score = recompute_score(&mut trial, target, mode);
            let bust = is_bust(score, target, &specials);
            let diff = target.abs_diff(score);
            let better = match best {
                None => true,
                Some((_, best_bust, best_diff)) => (bust, diff) < (best_bust, best_diff),
            };
            if better {
                best = Some((index, bust, diff));
            }
        }
        let Some((index, _, _)) = best else { return };
        let mut next = state.clone();
        let mut card = next.deck.remove(index);
        card.face_up = true;
        next.entity_mut(side).hand.push(card);
        refresh_side_score(&mut next, side);
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardDrawn {
                card,
                face_up: true,
            },
            delay_hint: self.config.reveal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label("draw-optimal"), move |state, _| {
                *state = next
            });
    }

    /// Pull the first remaining deck card with exactly the wanted value.
    fn draw_specific_value(&mut self, side: Side, wanted: i64) {
        let state = self.store.state();
        let Some(index) = state
            .deck
            .iter()
            .position(|card| i64::from(card.value) == wanted)
        else {
            log::debug!("no card of value {wanted} left in the deck");
            return;
        };
        let mut next = state.clone();
        let mut card = next.deck.remove(index);
        card.face_up = true;
        next.entity_mut(side).hand.push(card);
        refresh_side_score(&mut next, side);
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardDrawn {
                card,
                face_up: true,
            },
            delay_hint: self.config.reveal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label("draw-value"), move |state, _| {
                *state = next
            });
    }

    /// Return the side's last drawn card to a random deck position,
    /// face down.
    fn undo_last_draw(&mut self, side: Side) {
        let state = self.store.state();
        if state.entity(side).last_card().is_none() {
            return;
        }
        let mut next = state.clone();
        let Some(mut card) = next.entity_mut(side).hand.pop() else {
            return;
        };
        card.face_up = false;
        let slot = if next.deck.is_empty() {
            0
        } else {
            self.rng.index(next.deck.len() + 1)
        };
        next.deck.insert(slot, card);
        refresh_side_score(&mut next, side);
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardReturned,
            delay_hint: self.config.reveal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label("undo-last-draw"), move |state, _| {
                *state = next
            });
    }

    /// Discard the side's last card face up and draw a replacement from
    /// the top of the deck.
    fn replace_last_card(&mut self, side: Side) {
        let state = self.store.state();
        if state.entity(side).last_card().is_none() || state.deck.is_empty() {
            return;
        }
        let mut next = state.clone();
        let Some(mut discarded) = next.entity_mut(side).hand.pop() else {
            return;
        };
        discarded.face_up = true;
        next.discard.push(discarded);
        let Some(mut drawn) = next.deck.pop() else {
            return;
        };
        drawn.face_up = true;
        next.entity_mut(side).hand.push(drawn);
        refresh_side_score(&mut next, side);
        self.events.push(GameEvent::VisualEffect {
            side,
            cue: VisualCue::CardReplaced { discarded, drawn },
            delay_hint: self.config.reveal_delay_ticks,
        });
        self.store
            .update(FrameMeta::label("replace-last"), move |state, _| {
                *state = next
            });
    }

    /// Execute one random effect borrowed from another item template. The
    /// depth guard bounds recursion when the borrowed effect is itself a
    /// borrow.
    fn borrow_random_effect(&mut self, ctx: &EffectCtx) {
        if ctx.depth >= self.config.max_effect_depth {
            log::debug!("effect recursion depth {} reached", ctx.depth);
            return;
        }
        for _ in 0..self.config.random_item_attempts {
            let Some(item) = self.content.pick_item(&mut self.rng) else {
                return;
            };
            let origin_id = ctx.origin.as_ref().map(|origin| origin.template_id.as_str());
            if Some(item.id.as_str()) == origin_id || item.effects.is_empty() {
                continue;
            }
            let effects = item.effects.clone();
            let index = self.rng.index(effects.len());
            let nested = EffectCtx {
                actor: ctx.actor,
                source: EffectSource::Borrowed,
                config: effects[index].clone(),
                origin: ctx.origin.clone(),
                effect_index: index,
                depth: ctx.depth + 1,
            };
            self.execute_effect(&nested);
            return;
        }
        log::debug!("no borrowable effect found");
    }
}
