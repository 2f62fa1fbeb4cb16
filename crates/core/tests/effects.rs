use rujack_core::{
    Card, Content, DamageOpts, EffectConfig, EffectCtx, EffectHandler, EffectKind, EffectScope,
    EffectSource, FrameMeta, GameConfig, GameSession, Phase, Rank, RoundModifiers, Side, Suit,
};

fn session() -> GameSession {
    GameSession::new(GameConfig::default(), Content::builtin(), 21)
}

fn card(rank: Rank) -> Card {
    let mut card = Card::standard(Suit::Spades, rank);
    card.face_up = true;
    card
}

fn run(session: &mut GameSession, config: EffectConfig, actor: Side) {
    session.execute_effects(&[config], actor, EffectSource::System, None);
}

#[test]
fn damage_spills_from_shield_into_hp() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 10;
        state.player.shield = 4;
    });
    let lost = session.apply_damage(Side::Player, 10, DamageOpts::default());
    assert_eq!(lost, 6);
    let player = &session.store.state().player;
    assert_eq!(player.shield, 0);
    assert_eq!(player.hp, 4);
}

#[test]
fn zero_amount_heal_leaves_no_trace() {
    let mut session = session();
    let history = session.store.history_len();
    let before = session.store.snapshot();
    assert_eq!(session.apply_healing(Side::Player, 0), 0);
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::Heal, 0),
        Side::Player,
    );
    assert_eq!(session.store.history_len(), history);
    assert_eq!(session.store.snapshot(), before);
    assert!(session.events.is_empty());
}

#[test]
fn heal_at_full_hp_records_no_frame() {
    let mut session = session();
    let history = session.store.history_len();
    assert_eq!(session.apply_healing(Side::Player, 10), 0);
    assert_eq!(session.store.history_len(), history);
    assert!(session.events.is_empty());
}

#[test]
fn fully_absorbed_damage_still_records_the_shield_loss() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.shield = 20;
    });
    let history = session.store.history_len();
    let lost = session.apply_damage(Side::Player, 5, DamageOpts::default());
    assert_eq!(lost, 0);
    assert_eq!(session.store.state().player.shield, 15);
    assert_eq!(session.store.history_len(), history + 1);
    assert_eq!(session.events.len(), 3);
}

#[test]
fn heal_clamps_to_max_hp() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 95;
    });
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::Heal, 20),
        Side::Player,
    );
    assert_eq!(session.store.state().player.hp, 100);
}

#[test]
fn shield_effect_accumulates() {
    let mut session = session();
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::Shield, 6),
        Side::Player,
    );
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::Shield, 4),
        Side::Player,
    );
    assert_eq!(session.store.state().player.shield, 10);
}

#[test]
fn buffer_and_boost_adjust_in_opposite_directions() {
    let mut session = session();
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::ResolutionDamageBuffer, 3),
        Side::Player,
    );
    let mut boost = EffectConfig::with_amount(EffectKind::ResolutionDamageBoost, 2);
    boost.scope = EffectScope::Opponent;
    run(&mut session, boost, Side::Player);
    let modifiers = &session.store.state().round_modifiers;
    assert_eq!(modifiers.damage_adjustments.player, -3);
    assert_eq!(modifiers.damage_adjustments.enemy, 2);
}

#[test]
fn immunity_marks_the_target() {
    let mut session = session();
    run(
        &mut session,
        EffectConfig::new(EffectKind::ResolutionDamageImmunity),
        Side::Player,
    );
    assert!(session.store.state().round_modifiers.immunity.player);
    assert!(!session.store.state().round_modifiers.immunity.enemy);
}

#[test]
fn temp_target_rescores_aces() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Ace), card(Rank::Five)];
        state.player.score = 16;
    });
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::SetTempTargetScore, 12),
        Side::Player,
    );
    let state = session.store.state();
    assert_eq!(state.target_score, 12);
    assert_eq!(state.player.score, 6);
}

#[test]
fn draw_value_pulls_the_exact_card() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.deck = vec![card(Rank::Two), card(Rank::Seven), card(Rank::King)];
    });
    let mut config = EffectConfig::new(EffectKind::DrawValue);
    config.meta.insert("value".to_string(), 7.0);
    run(&mut session, config, Side::Player);
    let state = session.store.state();
    assert_eq!(state.player.hand.len(), 1);
    assert_eq!(state.player.hand[0].rank, Rank::Seven);
    assert_eq!(state.deck.len(), 2);
}

#[test]
fn draw_optimal_avoids_the_bust() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Ten), card(Rank::Six)];
        state.player.score = 16;
        state.deck = vec![card(Rank::Nine), card(Rank::Five)];
    });
    run(
        &mut session,
        EffectConfig::new(EffectKind::DrawOptimal),
        Side::Player,
    );
    let state = session.store.state();
    assert_eq!(state.player.score, 21);
    assert_eq!(state.deck.len(), 1);
    assert_eq!(state.deck[0].rank, Rank::Nine);
}

#[test]
fn swap_exchanges_the_last_cards() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Two)];
        state.enemy.entity.hand = vec![card(Rank::King)];
    });
    run(
        &mut session,
        EffectConfig::new(EffectKind::SwapLastCard),
        Side::Player,
    );
    let state = session.store.state();
    assert_eq!(state.player.hand[0].rank, Rank::King);
    assert_eq!(state.enemy.entity.hand[0].rank, Rank::Two);
    assert_eq!(state.player.score, 10);
    assert_eq!(state.enemy.entity.score, 2);
}

#[test]
fn swap_with_an_empty_hand_is_a_noop() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Two)];
    });
    let before = session.store.snapshot();
    run(
        &mut session,
        EffectConfig::new(EffectKind::SwapLastCard),
        Side::Player,
    );
    assert_eq!(session.store.snapshot(), before);
}

#[test]
fn undo_last_draw_returns_the_card_face_down() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Two), card(Rank::Nine)];
        state.player.score = 11;
        state.deck = vec![card(Rank::King)];
    });
    run(
        &mut session,
        EffectConfig::new(EffectKind::UndoLastDraw),
        Side::Player,
    );
    let state = session.store.state();
    assert_eq!(state.player.hand.len(), 1);
    assert_eq!(state.player.score, 2);
    assert_eq!(state.deck.len(), 2);
    assert!(state
        .deck
        .iter()
        .any(|card| card.rank == Rank::Nine && !card.face_up));
}

#[test]
fn replace_last_card_discards_and_redraws() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hand = vec![card(Rank::Nine)];
        state.deck = vec![card(Rank::Three)];
    });
    run(
        &mut session,
        EffectConfig::new(EffectKind::ReplaceLastCard),
        Side::Player,
    );
    let state = session.store.state();
    assert_eq!(state.player.hand[0].rank, Rank::Three);
    assert_eq!(state.discard.len(), 1);
    assert_eq!(state.discard[0].rank, Rank::Nine);
    assert!(state.deck.is_empty());
}

#[test]
fn gain_random_items_respects_capacity() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.max_inventory = 2;
    });
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::GainRandomItems, 5),
        Side::Player,
    );
    assert_eq!(session.store.state().player.inventory.len(), 2);
}

#[test]
fn loser_bonus_accumulates() {
    let mut session = session();
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::PendingLoserDamage, 5),
        Side::Player,
    );
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::PendingLoserDamage, 3),
        Side::Player,
    );
    assert_eq!(session.store.state().round_modifiers.loser_bonus, 8);
}

#[test]
fn gold_scales_with_level_past_the_offset() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.level = 3;
    });
    let mut config = EffectConfig::with_amount(EffectKind::Gold, 10);
    config.meta.insert("per_level_offset".to_string(), 1.0);
    run(&mut session, config, Side::Player);
    assert_eq!(session.meta.gold, 20);
    assert_eq!(session.store.state().gold_earned_this_level, 20);
}

#[test]
fn life_drain_heals_what_it_took() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 50;
        state.enemy.entity.hp = 4;
        state.enemy.entity.max_hp = 40;
    });
    let mut config = EffectConfig::with_amount(EffectKind::LifeDrain, 6);
    config.scope = EffectScope::Opponent;
    run(&mut session, config, Side::Player);
    let state = session.store.state();
    assert_eq!(state.enemy.entity.hp, 0);
    assert_eq!(state.player.hp, 54);
}

#[test]
fn heal_per_inventory_counts_held_items() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 50;
    });
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::GainRandomItems, 3),
        Side::Player,
    );
    let mut config = EffectConfig::new(EffectKind::HealPerInventory);
    config.meta.insert("per_item".to_string(), 2.0);
    run(&mut session, config, Side::Player);
    assert_eq!(session.store.state().player.hp, 56);
}

#[test]
fn recursion_depth_guard_stops_borrowing() {
    let mut session = session();
    let depth = session.config.max_effect_depth;
    let before = session.store.snapshot();
    let gold_before = session.meta.gold;
    session.execute_effect(&EffectCtx {
        actor: Side::Player,
        source: EffectSource::Borrowed,
        config: EffectConfig::new(EffectKind::RandomItemEffect),
        origin: None,
        effect_index: 0,
        depth,
    });
    assert_eq!(session.store.snapshot(), before);
    assert_eq!(session.meta.gold, gold_before);
}

#[test]
fn borrowed_effect_executes_another_items_effect() {
    let mut content = Content::builtin();
    content.items.retain(|item| item.id == "tonic");
    let mut session = GameSession::new(GameConfig::default(), content, 21);
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 50;
    });
    run(
        &mut session,
        EffectConfig::new(EffectKind::RandomItemEffect),
        Side::Player,
    );
    assert_eq!(session.store.state().player.hp, 58);
}

struct ShieldInsteadOfHeal;

impl EffectHandler for ShieldInsteadOfHeal {
    fn execute(&mut self, session: &mut GameSession, ctx: &EffectCtx) {
        let amount = ctx.config.amount;
        let side = ctx.actor;
        session
            .store
            .update(FrameMeta::label("custom-heal"), move |state, _| {
                state.entity_mut(side).shield += amount;
            });
    }
}

#[test]
fn replacing_a_handler_overrides_the_builtin() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 50;
    });
    session
        .effects_mut()
        .register(EffectKind::Heal, Box::new(ShieldInsteadOfHeal), true);
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::Heal, 8),
        Side::Player,
    );
    let player = &session.store.state().player;
    assert_eq!(player.hp, 50);
    assert_eq!(player.shield, 8);
}

struct BonusHeal;

impl EffectHandler for BonusHeal {
    fn execute(&mut self, session: &mut GameSession, ctx: &EffectCtx) {
        session.apply_healing(ctx.actor, 2);
    }
}

struct RecruitingHeal;

impl EffectHandler for RecruitingHeal {
    fn execute(&mut self, session: &mut GameSession, ctx: &EffectCtx) {
        session.apply_healing(ctx.actor, 1);
        session
            .effects_mut()
            .register(EffectKind::Heal, Box::new(BonusHeal), false);
    }
}

#[test]
fn a_handler_registered_during_dispatch_joins_the_list() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.player.hp = 50;
    });
    session
        .effects_mut()
        .register(EffectKind::Heal, Box::new(RecruitingHeal), true);
    run(&mut session, EffectConfig::new(EffectKind::Heal), Side::Player);
    assert_eq!(session.store.state().player.hp, 51);
    run(&mut session, EffectConfig::new(EffectKind::Heal), Side::Player);
    assert_eq!(session.store.state().player.hp, 54);
}

#[test]
fn round_resolution_clears_every_modifier() {
    let mut session = session();
    session.store.update(FrameMeta::label("setup"), |state, _| {
        state.phase = Phase::Battle;
        state.player.hand = vec![card(Rank::Ten)];
        state.player.score = 10;
        state.enemy.entity.hand = vec![card(Rank::Nine)];
        state.enemy.entity.score = 9;
        state.enemy.entity.hp = 50;
        state.enemy.entity.max_hp = 50;
        *state.stood.get_mut(Side::Enemy) = true;
    });
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::ResolutionDamageBuffer, 3),
        Side::Player,
    );
    run(
        &mut session,
        EffectConfig::new(EffectKind::ResolutionDamageImmunity),
        Side::Player,
    );
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::PendingLoserDamage, 5),
        Side::Player,
    );
    run(
        &mut session,
        EffectConfig::with_amount(EffectKind::SetTempTargetScore, 17),
        Side::Player,
    );
    {
        let state = session.store.state();
        assert_eq!(state.round_modifiers.damage_adjustments.player, -3);
        assert!(state.round_modifiers.immunity.player);
        assert_eq!(state.round_modifiers.loser_bonus, 5);
        assert_eq!(state.target_score, 17);
    }

    // Both sides stood: the round resolves and the next one is dealt.
    session.stand(Side::Player);
    let state = session.store.state();
    assert_eq!(state.round_modifiers, RoundModifiers::default());
    assert_eq!(state.target_score, state.base_target_score);
    // The loser bonus landed on the losing side before the reset.
    assert_eq!(state.enemy.entity.hp, 35);
}
