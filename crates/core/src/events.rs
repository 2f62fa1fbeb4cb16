use crate::{Card, ClashResult, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandGesture {
    Hit,
    Stand,
    Hurt,
    Think,
}

/// Presentation cue payloads. Consumers render these; nothing is ever
/// replayed back into game logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VisualCue {
    CardDrawn { card: Card, face_up: bool },
    CardRevealed { card: Card },
    CardSwapped,
    CardReturned,
    CardReplaced { discarded: Card, drawn: Card },
    ShieldGained { amount: i64 },
    ScreenShake,
    SuddenDeath,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameEvent {
    HandAction {
        side: Side,
        gesture: HandGesture,
    },
    VisualEffect {
        side: Side,
        cue: VisualCue,
        /// Logical pacing hint in ticks; duration is a presentation concern.
        delay_hint: u32,
    },
    DamageNumber {
        side: Side,
        amount: i64,
        heal: bool,
    },
    ItemAnimation {
        side: Side,
        item_id: String,
        instance_id: u64,
    },
    EnvironmentAnimation {
        card_id: String,
    },
    PenaltyAnimation {
        card_id: String,
    },
    PenaltyCardRevealed {
        card_id: String,
        name: String,
    },
    ClashState {
        result: ClashResult,
        player_score: u32,
        enemy_score: u32,
        player_bust: bool,
        enemy_bust: bool,
        message: String,
    },
}

/// Fire-and-forget queue for presentation-facing events. No state beyond
/// the queue itself.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<GameEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: GameEvent) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
