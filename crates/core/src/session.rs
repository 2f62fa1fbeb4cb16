use crate::{
    Content, Enemy, Entity, EnvironmentCard, EventBus, GameConfig, GameState, GameStore, Item,
    ItemInstance, RngState, ScheduledAction, Scheduler, Side, TimerId, UpgradeKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

mod ai;
mod battle;
mod damage;
mod effects;
mod round;
mod run;

pub use ai::{ai_decision, AiAction, AiTuning};
pub use effects::{EffectCtx, EffectHandler, EffectRegistry, EffectSource, OriginItem};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("content has no enemy templates")]
    NoEnemies,
    #[error("unknown enemy template {0}")]
    UnknownEnemy(String),
}

/// The only state expected to survive outside a single run. Round-trips
/// through serde as a plain record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaProgress {
    pub gold: i64,
    pub upgrade_levels: HashMap<UpgradeKind, u32>,
}

impl MetaProgress {
    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.upgrade_levels.get(&kind).copied().unwrap_or(0)
    }
}

/// Everything needed to seed one battle.
#[derive(Debug, Clone)]
pub struct BattleContext {
    pub enemy: Enemy,
    pub environment_cards: Vec<EnvironmentCard>,
    pub penalty_card_id: Option<String>,
}

/// One run session: owns the canonical store and every collaborating
/// service. Services are `impl` blocks split across the `session/` files;
/// nothing here is a singleton.
#[derive(Debug)]
pub struct GameSession {
    pub config: GameConfig,
    pub content: Content,
    pub store: GameStore,
    pub events: EventBus,
    pub meta: MetaProgress,
    pub(crate) rng: RngState,
    pub(crate) scheduler: Scheduler,
    pub(crate) effects: EffectRegistry,
    pub(crate) ai_timer: Option<TimerId>,
    pub(crate) next_card_id: u32,
    pub(crate) next_instance_id: u64,
}

impl GameSession {
    pub fn new(config: GameConfig, content: Content, seed: u64) -> Self {
        let player = Entity::new(config.player_max_hp, config.player_inventory_slots);
        let enemy = Enemy {
            entity: Entity::new(1, 0),
            template_id: String::new(),
            difficulty: 0,
            profile: crate::AiProfile::Greedy,
        };
        let initial = GameState::new(config.base_target, player, enemy);
        let store = GameStore::new(initial, config.history_limit, config.action_log_limit);
        Self {
            config,
            content,
            store,
            events: EventBus::default(),
            meta: MetaProgress::default(),
            rng: RngState::from_seed(seed),
            scheduler: Scheduler::default(),
            effects: EffectRegistry::with_defaults(),
            ai_timer: None,
            next_card_id: 1,
            next_instance_id: 1,
        }
    }

    pub fn with_meta(mut self, meta: MetaProgress) -> Self {
        self.meta = meta;
        self
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    /// Advance the logical clock one tick and run whatever came due.
    pub fn tick(&mut self) {
        for action in self.scheduler.advance() {
            match action {
                ScheduledAction::EnemyThink => self.ai_think(),
            }
        }
    }

    /// Drive the clock until no timers remain. The cap only guards against
    /// a scheduling bug creating a livelock.
    pub fn tick_until_idle(&mut self) {
        let mut guard = 0u32;
        while !self.scheduler.is_idle() {
            self.tick();
            guard += 1;
            if guard > 10_000 {
                log::error!("scheduler failed to go idle, aborting tick loop");
                break;
            }
        }
    }

    pub(crate) fn alloc_card_id(&mut self) -> u32 {
        let id = self.next_card_id;
        self.next_card_id = self.next_card_id.saturating_add(1);
        id
    }

    pub(crate) fn instantiate_item(&mut self, item: &Item) -> ItemInstance {
        let instance_id = self.next_instance_id;
        self.next_instance_id = self.next_instance_id.saturating_add(1);
        ItemInstance {
            instance_id,
            item: item.clone(),
        }
    }

    /// Grant up to `count` random item instances into `state`, capped by
    /// the target's remaining inventory capacity.
    pub(crate) fn grant_random_items_state(
        &mut self,
        state: &mut GameState,
        side: Side,
        count: u32,
    ) -> u32 {
        let mut granted = 0;
        for _ in 0..count {
            if state.entity(side).free_inventory_slots() == 0 {
                break;
            }
            let Some(item) = self.content.pick_item(&mut self.rng).cloned() else {
                break;
            };
            let instance = self.instantiate_item(&item);
            state.entity_mut(side).inventory.push(instance);
            granted += 1;
        }
        granted
    }
}
