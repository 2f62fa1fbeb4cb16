use crate::{
    scale_by_environment, DamageOpts, EventBus, FrameMeta, GameEvent, GameSession, GameState,
    HandGesture, PenaltyOutcome, Side, VisualCue,
};

/// Shield-then-hp damage application against a state value. Returns hp
/// actually lost, after shield absorption.
pub(crate) fn damage_entity(
    state: &mut GameState,
    events: &mut EventBus,
    side: Side,
    amount: i64,
    opts: DamageOpts,
) -> i64 {
    if amount <= 0 {
        return 0;
    }
    let scaled = if opts.bypass_environment {
        amount
    } else {
        scale_by_environment(amount, &state.environment)
    };
    if scaled <= 0 {
        return 0;
    }
    let entity = state.entity_mut(side);
    let absorbed = entity.shield.min(scaled);
    entity.shield -= absorbed;
    let remainder = scaled - absorbed;
    let lost = entity.hp.min(remainder);
    entity.hp -= lost;
    events.push(GameEvent::DamageNumber {
        side,
        amount: scaled,
        heal: false,
    });
    if !opts.suppress_gesture {
        events.push(GameEvent::HandAction {
            side,
            gesture: HandGesture::Hurt,
        });
        if side == Side::Player {
            events.push(GameEvent::VisualEffect {
                side,
                cue: VisualCue::ScreenShake,
                delay_hint: 0,
            });
        }
    }
    lost
}

/// Healing clamped to max hp. Returns hp actually restored.
pub(crate) fn heal_entity(
    state: &mut GameState,
    events: &mut EventBus,
    side: Side,
    amount: i64,
) -> i64 {
    if amount <= 0 {
        return 0;
    }
    let entity = state.entity_mut(side);
    let restored = (entity.max_hp - entity.hp).min(amount).max(0);
    entity.hp += restored;
    if restored > 0 {
        events.push(GameEvent::DamageNumber {
            side,
            amount: restored,
            heal: true,
        });
    }
    restored
}

/// Round-resolution damage: loser bonus folded in when exactly one side is
/// due damage, per-side adjustments applied, immunity zeroes everything,
/// then the standard pipeline. Heals from the penalty outcome land last.
pub(crate) fn apply_round_damage(
    state: &mut GameState,
    events: &mut EventBus,
    outcome: &PenaltyOutcome,
) {
    let mut due = crate::PerSide {
        player: outcome.player_damage,
        enemy: outcome.enemy_damage,
    };
    let bonus = state.round_modifiers.loser_bonus;
    if bonus != 0 {
        match (due.player > 0, due.enemy > 0) {
            (true, false) => due.player += bonus,
            (false, true) => due.enemy += bonus,
            _ => {}
        }
    }
    for side in [Side::Player, Side::Enemy] {
        let base = *due.get(side);
        if base <= 0 {
            continue;
        }
        if *state.round_modifiers.immunity.get(side) {
            log::debug!("{side:?} is immune to round damage");
            continue;
        }
        let adjusted = (base + state.round_modifiers.damage_adjustments.get(side)).max(0);
        damage_entity(state, events, side, adjusted, DamageOpts::default());
    }
    for side in [Side::Player, Side::Enemy] {
        let heal = *outcome.heals.get(side);
        heal_entity(state, events, side, heal);
    }
}

/// Sudden-death floor: any side left alive at or below the threshold drops
/// to zero hp outright.
pub(crate) fn enforce_sudden_death(state: &mut GameState, events: &mut EventBus) {
    let Some(threshold) = state.environment.sudden_death_hp else {
        return;
    };
    for side in [Side::Player, Side::Enemy] {
        let entity = state.entity_mut(side);
        if entity.hp > 0 && entity.hp <= threshold {
            entity.hp = 0;
            events.push(GameEvent::VisualEffect {
                side,
                cue: VisualCue::SuddenDeath,
                delay_hint: 0,
            });
        }
    }
}

impl GameSession {
    /// Standalone damage application publishing its own frame. Flow code
    /// that already holds a cloned state uses `damage_entity` directly.
    /// An application that changes nothing publishes nothing.
    pub fn apply_damage(&mut self, side: Side, amount: i64, opts: DamageOpts) -> i64 {
        if amount <= 0 {
            return 0;
        }
        let mut next = self.store.state().clone();
        let lost = damage_entity(&mut next, &mut self.events, side, amount, opts);
        if next == *self.store.state() {
            return lost;
        }
        self.store
            .update(FrameMeta::label("damage"), move |state, _| *state = next);
        lost
    }

    pub fn apply_healing(&mut self, side: Side, amount: i64) -> i64 {
        if amount <= 0 {
            return 0;
        }
        let mut next = self.store.state().clone();
        let restored = heal_entity(&mut next, &mut self.events, side, amount);
        if restored == 0 {
            return 0;
        }
        self.store
            .update(FrameMeta::label("heal"), move |state, _| *state = next);
        restored
    }
}
