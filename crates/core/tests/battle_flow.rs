use rujack_core::{
    ai_decision, AiAction, AiProfile, AiTuning, Content, GameConfig, GameSession, Phase, RngState,
    Side,
};
use std::collections::BTreeSet;

fn tuning() -> AiTuning {
    let config = GameConfig::default();
    AiTuning {
        greedy_hit_below: config.greedy_hit_below,
        defensive_hit_below: config.defensive_hit_below,
        random_hit_margin: config.random_hit_margin,
    }
}

/// Drive one full battle with a hit-below-17 player policy. Returns the
/// session at battle end.
fn play_battle(seed: u64) -> GameSession {
    let mut session = GameSession::new(GameConfig::default(), Content::builtin(), seed);
    session.start_run().expect("builtin content has enemies");
    for _ in 0..20_000 {
        let state = session.store.state();
        if state.phase != Phase::Battle {
            break;
        }
        let flags = session.store.flags();
        let my_turn = state.turn == Side::Player
            && !state.stood.player
            && !flags.is_dealing
            && !flags.is_resolving_round
            && !flags.is_processing_ai;
        let score = state.player.score;
        if my_turn {
            if score < 17 {
                session.hit(Side::Player);
            } else {
                session.stand(Side::Player);
            }
        }
        session.tick();
        session.events.drain().count();
    }
    session
}

#[test]
fn a_battle_runs_to_completion() {
    let session = play_battle(42);
    let state = session.store.state();
    assert!(matches!(state.phase, Phase::Victory | Phase::GameOver));
    assert!(state.round >= 1);
    assert!(state.player.hp >= 0);
    assert!(state.enemy.entity.hp >= 0);
    assert!(state.player.hp <= 0 || state.enemy.entity.hp <= 0);
    assert!(state.message.is_some());
}

#[test]
fn same_seed_same_outcome() {
    let a = play_battle(1234);
    let b = play_battle(1234);
    assert_eq!(a.store.state(), b.store.state());
    assert_eq!(a.meta, b.meta);
}

#[test]
fn different_seeds_usually_diverge() {
    let outcomes: Vec<_> = (0..8)
        .map(|seed| play_battle(seed).store.state().clone())
        .collect();
    let first = &outcomes[0];
    assert!(
        outcomes.iter().any(|state| state != first),
        "eight seeds all played identical battles"
    );
}

#[test]
fn commands_out_of_phase_are_silent_noops() {
    let mut session = GameSession::new(GameConfig::default(), Content::builtin(), 9);
    let before = session.store.snapshot();
    session.hit(Side::Player);
    session.stand(Side::Player);
    session.use_item(Side::Player, 0);
    session.proceed_to_rewards();
    session.pick_reward(0);
    assert_eq!(session.store.snapshot(), before);
}

#[test]
fn hit_out_of_turn_changes_nothing() {
    let mut session = GameSession::new(GameConfig::default(), Content::builtin(), 11);
    session.start_run().unwrap();
    session.events.drain().count();
    let state = session.store.state();
    assert_eq!(state.phase, Phase::Battle);
    assert_eq!(state.turn, Side::Player);
    let enemy_hand = state.enemy.entity.hand.len();
    session.hit(Side::Enemy);
    assert_eq!(session.store.state().enemy.entity.hand.len(), enemy_hand);
}

#[test]
fn opening_deal_hides_the_enemy_hole_card() {
    let mut session = GameSession::new(GameConfig::default(), Content::builtin(), 5);
    session.start_run().unwrap();
    let state = session.store.state();
    assert_eq!(state.player.hand.len(), 2);
    assert_eq!(state.enemy.entity.hand.len(), 2);
    assert!(state.player.hand.iter().all(|card| card.face_up));
    assert!(!state.enemy.entity.hand[0].face_up);
    assert!(state.enemy.entity.hand[1].face_up);
}

#[test]
fn run_start_bonus_item_lands_in_the_player_inventory() {
    let mut session = GameSession::new(GameConfig::default(), Content::builtin(), 5);
    session.start_run().unwrap();
    assert_eq!(session.store.state().player.inventory.len(), 1);
}

#[test]
fn ai_never_hits_when_already_at_or_over_target() {
    let mut rng = RngState::from_seed(3);
    let specials = BTreeSet::new();
    for profile in [AiProfile::Greedy, AiProfile::Defensive, AiProfile::Random] {
        for score in 21..30 {
            assert_eq!(
                ai_decision(profile, score, 21, &specials, tuning(), &mut rng),
                AiAction::Stand
            );
        }
    }
}

#[test]
fn ai_stands_on_a_special_bust_score() {
    let mut rng = RngState::from_seed(3);
    let specials: BTreeSet<u32> = [13].into_iter().collect();
    for profile in [AiProfile::Greedy, AiProfile::Defensive, AiProfile::Random] {
        assert_eq!(
            ai_decision(profile, 13, 21, &specials, tuning(), &mut rng),
            AiAction::Stand
        );
    }
}

#[test]
fn greedy_and_defensive_follow_their_thresholds() {
    let mut rng = RngState::from_seed(3);
    let specials = BTreeSet::new();
    assert_eq!(
        ai_decision(AiProfile::Greedy, 17, 21, &specials, tuning(), &mut rng),
        AiAction::Hit
    );
    assert_eq!(
        ai_decision(AiProfile::Greedy, 18, 21, &specials, tuning(), &mut rng),
        AiAction::Stand
    );
    assert_eq!(
        ai_decision(AiProfile::Defensive, 15, 21, &specials, tuning(), &mut rng),
        AiAction::Hit
    );
    assert_eq!(
        ai_decision(AiProfile::Defensive, 16, 21, &specials, tuning(), &mut rng),
        AiAction::Stand
    );
}

#[test]
fn random_profile_always_hits_far_from_target() {
    let mut rng = RngState::from_seed(3);
    let specials = BTreeSet::new();
    for _ in 0..32 {
        assert_eq!(
            ai_decision(AiProfile::Random, 10, 21, &specials, tuning(), &mut rng),
            AiAction::Hit
        );
    }
}
