use crate::session::{BattleContext, SessionError};
use crate::{Enemy, Entity, FrameMeta, GameSession, GameState, Phase, UpgradeKind};

impl GameSession {
    /// Start a fresh run: rebuild the player from config plus permanent
    /// upgrades, reset to level 1 and enter the first battle.
    pub fn start_run(&mut self) -> Result<(), SessionError> {
        let max_hp = self.config.player_max_hp
            + self.config.max_hp_per_upgrade
                * i64::from(self.meta.upgrade_level(UpgradeKind::MaxHp));
        let slots = self.config.player_inventory_slots
            + self.config.slots_per_upgrade
                * self.meta.upgrade_level(UpgradeKind::InventorySlots) as usize;
        let player = Entity::new(max_hp, slots);
        let ctx = self.build_battle_context(1)?;
        let base_target = self.config.base_target;
        let enemy = ctx.enemy.clone();
        self.store
            .update(FrameMeta::label("run-start"), move |state, flags| {
                *flags = Default::default();
                *state = GameState::new(base_target, player, enemy);
                state.level = 1;
            });
        log::info!("run started with seed {}", self.rng.seed());
        self.start_battle(ctx);
        Ok(())
    }

    /// Advance to the next level, keeping the player's hp, shield and
    /// inventory as they stand.
    pub fn next_level(&mut self) -> Result<(), SessionError> {
        let phase = self.store.state().phase;
        if phase != Phase::Victory && phase != Phase::Reward {
            log::debug!("next level ignored in {phase:?}");
            return Ok(());
        }
        let level = self.store.state().level + 1;
        let ctx = self.build_battle_context(level)?;
        self.store
            .update(FrameMeta::label("next-level"), move |state, _| {
                state.level = level;
                state.gold_earned_this_level = 0;
            });
        self.start_battle(ctx);
        Ok(())
    }

    /// Roll the opposition for a level: a template-derived enemy with
    /// level-scaled hp and a random inventory, a random penalty card, and
    /// 0 to `max_environment_cards` environment cards whose possible count
    /// grows with depth.
    pub fn build_battle_context(&mut self, level: u32) -> Result<BattleContext, SessionError> {
        let template = self
            .content
            .pick_enemy(&mut self.rng)
            .cloned()
            .ok_or(SessionError::NoEnemies)?;
        let hp = template.base_hp + self.config.enemy_hp_per_level * i64::from(level - 1);
        let mut entity = Entity::new(hp, self.config.enemy_inventory_slots);
        let item_count = template
            .difficulty
            .min(self.config.enemy_inventory_slots as u32);
        for _ in 0..item_count {
            let Some(item) = self.content.pick_item(&mut self.rng).cloned() else {
                break;
            };
            let instance = self.instantiate_item(&item);
            entity.inventory.push(instance);
        }
        let enemy = Enemy {
            entity,
            template_id: template.id.clone(),
            difficulty: template.difficulty,
            profile: template.profile,
        };

        let cap = self
            .config
            .max_environment_cards
            .min(level.saturating_sub(1) as usize);
        let mut environment_cards = Vec::new();
        if cap > 0 && !self.content.environments.is_empty() {
            let count = self.rng.index(cap + 1);
            let mut pool: Vec<usize> = (0..self.content.environments.len()).collect();
            self.rng.shuffle(&mut pool);
            for idx in pool.into_iter().take(count) {
                environment_cards.push(self.content.environments[idx].clone());
            }
        }

        let penalty_card_id = self
            .content
            .pick_penalty(&mut self.rng)
            .map(|card| card.id.clone());
        Ok(BattleContext {
            enemy,
            environment_cards,
            penalty_card_id,
        })
    }

    /// Move from the victory screen to reward picking, rolling a fresh
    /// pool of item instances.
    pub fn proceed_to_rewards(&mut self) {
        if self.store.state().phase != Phase::Victory {
            log::debug!("rewards ignored outside victory");
            return;
        }
        let mut pool = Vec::with_capacity(self.config.reward_pool_size);
        for _ in 0..self.config.reward_pool_size {
            let Some(item) = self.content.pick_item(&mut self.rng).cloned() else {
                break;
            };
            pool.push(self.instantiate_item(&item));
        }
        self.store
            .update(FrameMeta::label("rewards"), move |state, flags| {
                flags.is_battle_exiting = false;
                state.phase = Phase::Reward;
                state.reward_pool = pool;
                state.picked_reward_indices.clear();
            });
    }

    /// Claim one reward from the pool. Exceeding the pick limit, a full
    /// inventory, a bad index or a double pick all silently refuse.
    pub fn pick_reward(&mut self, index: usize) {
        let state = self.store.state();
        if state.phase != Phase::Reward {
            log::debug!("reward pick ignored outside reward phase");
            return;
        }
        if state.picked_reward_indices.len() >= self.config.reward_pick_limit {
            log::debug!("reward pick limit reached");
            return;
        }
        if state.picked_reward_indices.contains(&index) {
            log::debug!("reward {index} already picked");
            return;
        }
        let Some(instance) = state.reward_pool.get(index).cloned() else {
            log::debug!("no reward at {index}");
            return;
        };
        if state.player.free_inventory_slots() == 0 {
            log::debug!("inventory full, reward {index} refused");
            return;
        }
        self.store
            .update(FrameMeta::label("pick-reward"), move |state, _| {
                state.picked_reward_indices.push(index);
                state.player.inventory.push(instance);
            });
    }

    /// Spend meta gold on a permanent upgrade. Refuses when maxed out or
    /// unaffordable.
    pub fn buy_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let level = self.meta.upgrade_level(kind) as usize;
        let Some(cost) = self.config.upgrade_cost(kind, level) else {
            log::debug!("{kind:?} is already at max level");
            return false;
        };
        if self.meta.gold < cost {
            log::debug!("{kind:?} costs {cost}, have {}", self.meta.gold);
            return false;
        }
        self.meta.gold -= cost;
        *self.meta.upgrade_levels.entry(kind).or_insert(0) += 1;
        log::info!("bought {kind:?} level {}", level + 1);
        true
    }

    /// End the run from any phase, returning to the menu. Meta progress
    /// persists on the session.
    pub fn abandon_run(&mut self) {
        self.cancel_ai();
        self.store
            .update(FrameMeta::label("abandon-run"), |state, flags| {
                *flags = Default::default();
                state.phase = Phase::Menu;
                state.message = None;
            });
    }
}
