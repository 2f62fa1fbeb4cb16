use crate::session::round::DrawOpts;
use crate::session::{BattleContext, EffectSource, OriginItem};
use crate::{
    EnvironmentRuntime, FrameMeta, GameEvent, GameSession, HandGesture, ItemKind, PenaltyRuntime,
    Phase, Side, UpgradeKind,
};

impl GameSession {
    /// Enter a battle: compile the environment once, install the enemy and
    /// penalty card, then deal round one.
    pub fn start_battle(&mut self, ctx: BattleContext) {
        let environment = EnvironmentRuntime::compile(
            &ctx.environment_cards,
            self.config.base_target,
            &mut self.rng,
        );
        let target = environment.target_score;
        let card_ids: Vec<String> = ctx
            .environment_cards
            .iter()
            .map(|card| card.id.clone())
            .collect();
        let shield = self.config.shield_per_upgrade
            * i64::from(self.meta.upgrade_level(UpgradeKind::StartingShield));
        self.store
            .update(FrameMeta::label("battle-start"), move |state, flags| {
                *flags = Default::default();
                state.phase = Phase::Battle;
                state.turn = Side::Player;
                state.stood = Default::default();
                state.environment = environment;
                state.environment_card_ids = card_ids;
                state.penalty_card_id = ctx.penalty_card_id;
                state.penalty_runtime = PenaltyRuntime::default();
                state.enemy = ctx.enemy;
                state.base_target_score = target;
                state.target_score = target;
                state.round = 0;
                state.player.shield = shield;
                state.player.hand.clear();
                state.player.score = 0;
                state.deck.clear();
                state.discard.clear();
                state.disabled_cards.clear();
                state.round_modifiers = Default::default();
                state.message = None;
                state.reward_pool.clear();
                state.picked_reward_indices.clear();
            });
        self.start_round();
    }

    fn battle_input_blocked(&self) -> bool {
        let flags = self.store.flags();
        self.store.replay_active()
            || self.store.state().phase != Phase::Battle
            || flags.is_dealing
            || flags.is_resolving_round
            || flags.is_battle_exiting
    }

    /// Draw one card for `side`, if it currently may act.
    pub fn hit(&mut self, side: Side) {
        if self.battle_input_blocked() {
            log::debug!("hit ignored, input blocked");
            return;
        }
        let state = self.store.state();
        if state.turn != side || *state.stood.get(side) {
            log::debug!("hit ignored, not {side:?}'s turn");
            return;
        }
        self.events.push(GameEvent::HandAction {
            side,
            gesture: HandGesture::Hit,
        });
        self.draw_card_for(
            side,
            DrawOpts {
                face_up: true,
                shift_turn: true,
                preserve_stand: false,
                label: "hit",
            },
        );
        self.evaluate_flow();
    }

    /// Lock in the side's hand for the round.
    pub fn stand(&mut self, side: Side) {
        if self.battle_input_blocked() {
            log::debug!("stand ignored, input blocked");
            return;
        }
        let state = self.store.state();
        if state.turn != side || *state.stood.get(side) {
            log::debug!("stand ignored, not {side:?}'s turn");
            return;
        }
        self.events.push(GameEvent::HandAction {
            side,
            gesture: HandGesture::Stand,
        });
        self.store.update(FrameMeta::label("stand"), move |state, _| {
            *state.stood.get_mut(side) = true;
            let other = side.opponent();
            if !*state.stood.get(other) {
                state.turn = other;
            }
        });
        self.evaluate_flow();
    }

    /// Consume the inventory item at `index`. Usable off-turn; an item
    /// lock environment or a non-consumable silently refuses.
    pub fn use_item(&mut self, side: Side, index: usize) {
        if self.battle_input_blocked() {
            log::debug!("item ignored, input blocked");
            return;
        }
        let state = self.store.state();
        if state.environment.items_locked {
            log::debug!("items are locked this battle");
            return;
        }
        let Some(instance) = state.entity(side).inventory.get(index).cloned() else {
            log::debug!("no item at slot {index}");
            return;
        };
        if instance.item.kind != ItemKind::Consumable {
            log::debug!("item {} is not consumable", instance.item.id);
            return;
        }
        self.store
            .update(FrameMeta::label("use-item"), move |state, _| {
                state.entity_mut(side).inventory.remove(index);
            });
        self.events.push(GameEvent::ItemAnimation {
            side,
            item_id: instance.item.id.clone(),
            instance_id: instance.instance_id,
        });
        let origin = OriginItem {
            template_id: instance.item.id.clone(),
            instance_id: instance.instance_id,
        };
        self.execute_effects(&instance.item.effects, side, EffectSource::Item, Some(origin));
        self.evaluate_flow();
    }

    /// Re-derive what should happen next from the current state: resolve
    /// when both sides stand, queue the enemy brain when it owns the turn,
    /// cancel a stale think otherwise.
    pub(crate) fn evaluate_flow(&mut self) {
        let state = self.store.state();
        let flags = self.store.flags();
        if state.phase != Phase::Battle || flags.is_battle_exiting {
            self.cancel_ai();
            return;
        }
        if *state.stood.get(Side::Player) && *state.stood.get(Side::Enemy) {
            if !flags.is_resolving_round {
                self.resolve_round();
            }
            return;
        }
        let enemy_turn = state.turn == Side::Enemy
            && !*state.stood.get(Side::Enemy)
            && !flags.is_dealing
            && !flags.is_resolving_round;
        if enemy_turn {
            self.queue_enemy_turn();
        } else {
            self.cancel_ai();
        }
    }
}
