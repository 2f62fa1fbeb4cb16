use crate::{EnvironmentRuntime, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClashResult {
    PlayerWin,
    EnemyWin,
    Draw,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClashOutcome {
    pub result: ClashResult,
    pub winner: Option<Side>,
    pub loser: Option<Side>,
    pub message: String,
}

/// Pure clash tie-break: both bust is a draw, one bust loses outright,
/// otherwise the higher score wins and equal scores draw.
pub fn compute_clash_result(
    player_score: u32,
    enemy_score: u32,
    player_bust: bool,
    enemy_bust: bool,
) -> ClashOutcome {
    let result = match (player_bust, enemy_bust) {
        (true, true) => ClashResult::Draw,
        (true, false) => ClashResult::EnemyWin,
        (false, true) => ClashResult::PlayerWin,
        (false, false) => {
            if player_score > enemy_score {
                ClashResult::PlayerWin
            } else if enemy_score > player_score {
                ClashResult::EnemyWin
            } else {
                ClashResult::Draw
            }
        }
    };
    let (winner, loser, message) = match result {
        ClashResult::PlayerWin => (
            Some(Side::Player),
            Some(Side::Enemy),
            format!("Round won {player_score} to {enemy_score}"),
        ),
        ClashResult::EnemyWin => (
            Some(Side::Enemy),
            Some(Side::Player),
            format!("Round lost {player_score} to {enemy_score}"),
        ),
        ClashResult::Draw => (None, None, "Round drawn".to_string()),
    };
    ClashOutcome {
        result,
        winner,
        loser,
        message,
    }
}

/// Options for a single damage application.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageOpts {
    /// Skip the hurt-gesture / screen-shake presentation cues.
    pub suppress_gesture: bool,
    /// Skip environment flat/multiplier scaling.
    pub bypass_environment: bool,
}

/// Scale a raw amount by the environment's flat modifier and multiplier,
/// ceiling-rounded, floored at zero.
pub fn scale_by_environment(amount: i64, env: &EnvironmentRuntime) -> i64 {
    let flat = (amount + env.damage_flat).max(0);
    ((flat as f64) * env.damage_multiplier).ceil().max(0.0) as i64
}
