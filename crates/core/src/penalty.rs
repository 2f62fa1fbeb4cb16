use crate::{ClashResult, PerSide, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PenaltyError {
    #[error("penalty rule failed: {0}")]
    RuleFailed(String),
}

/// Streak state fed back into every penalty evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenaltyRuntime {
    pub last_winner: Option<Side>,
    pub player_streak: u32,
    pub enemy_streak: u32,
}

impl PenaltyRuntime {
    pub fn streak(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_streak,
            Side::Enemy => self.enemy_streak,
        }
    }
}

/// Everything a penalty damage function may look at. Plain data so the
/// function stays pure.
#[derive(Debug, Clone)]
pub struct PenaltyContext {
    pub clash: ClashResult,
    pub winner: Option<Side>,
    pub loser: Option<Side>,
    pub player_score: u32,
    pub enemy_score: u32,
    pub player_bust: bool,
    pub enemy_bust: bool,
    pub target: u32,
    pub round: u32,
    pub runtime: PenaltyRuntime,
    pub fallback_damage: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PenaltyOutcome {
    pub player_damage: i64,
    pub enemy_damage: i64,
    pub heals: PerSide<i64>,
    pub runtime_patch: Option<PenaltyRuntime>,
    pub message: Option<String>,
}

pub type PenaltyFn = fn(&PenaltyContext) -> Result<PenaltyOutcome, PenaltyError>;

/// Round-loss consequence for the active battle. The damage function is
/// pluggable content; an `Err` from it is swallowed by the engine and the
/// deterministic fallback applies instead.
#[derive(Clone)]
pub struct PenaltyCard {
    pub id: String,
    pub name: String,
    pub damage_fn: PenaltyFn,
}

impl std::fmt::Debug for PenaltyCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PenaltyCard")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Fixed bust-aware rule used when no card is active or the card's
/// function fails: a bust side always takes the fixed bust damage,
/// otherwise the loser takes the same amount, and a clean draw is free.
pub fn fallback_outcome(ctx: &PenaltyContext) -> PenaltyOutcome {
    let mut outcome = PenaltyOutcome::default();
    if ctx.player_bust || ctx.enemy_bust {
        if ctx.player_bust {
            outcome.player_damage = ctx.fallback_damage;
        }
        if ctx.enemy_bust {
            outcome.enemy_damage = ctx.fallback_damage;
        }
        return outcome;
    }
    match ctx.loser {
        Some(Side::Player) => outcome.player_damage = ctx.fallback_damage,
        Some(Side::Enemy) => outcome.enemy_damage = ctx.fallback_damage,
        None => {}
    }
    outcome
}

/// Evaluate the active penalty, falling back on a missing card or a rule
/// fault so one bad content entry cannot freeze a run.
pub fn evaluate_penalty(card: Option<&PenaltyCard>, ctx: &PenaltyContext) -> PenaltyOutcome {
    let Some(card) = card else {
        return fallback_outcome(ctx);
    };
    match (card.damage_fn)(ctx) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::warn!("penalty card {} fell back: {err}", card.id);
            fallback_outcome(ctx)
        }
    }
}

/// Winner streak bookkeeping applied once per resolved round.
pub fn advance_streaks(runtime: &PenaltyRuntime, clash: ClashResult) -> PenaltyRuntime {
    let mut next = runtime.clone();
    match clash {
        ClashResult::PlayerWin => {
            next.player_streak = next.player_streak.saturating_add(1);
            next.enemy_streak = 0;
            next.last_winner = Some(Side::Player);
        }
        ClashResult::EnemyWin => {
            next.enemy_streak = next.enemy_streak.saturating_add(1);
            next.player_streak = 0;
            next.last_winner = Some(Side::Enemy);
        }
        ClashResult::Draw => {}
    }
    next
}
