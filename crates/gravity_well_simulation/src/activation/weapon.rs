//! GravityWellWeapon: один спуск = выстрел / активация / деактивация
//!
//! Weapon держит две weak ссылки:
//! - pending: выпущенный projectile, ещё летит
//! - active: projectile с включённым black hole
//!
//! Stale ссылки (projectile уже despawned) считаются отсутствующими.

use bevy::prelude::*;

/// Что weapon хочет сделать по нажатию спуска
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Выключить black hole активного projectile
    Deactivate(Entity),
    /// Включить black hole у летящего projectile
    Activate(Entity),
    /// Выпустить новый projectile
    Fire,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GravityWellWeapon {
    pending: Option<Entity>,
    active: Option<Entity>,
}

impl GravityWellWeapon {
    pub fn pending(&self) -> Option<Entity> {
        self.pending
    }

    pub fn active(&self) -> Option<Entity> {
        self.active
    }

    /// Нажатие спуска
    ///
    /// `projectile_state(e)`: `None`: projectile исчез, иначе `Some(is_active)`.
    pub fn pull_trigger(&mut self, projectile_state: impl Fn(Entity) -> Option<bool>) -> TriggerAction {
        if self.pending.is_some_and(|p| projectile_state(p).is_none()) {
            self.pending = None;
        }
        if self.active.is_some_and(|p| projectile_state(p).is_none()) {
            self.active = None;
        }

        self.promote_if_activated(&projectile_state);

        if let Some(active) = self.active {
            return TriggerAction::Deactivate(active);
        }

        if let Some(pending) = self.pending.take() {
            self.active = Some(pending);
            return TriggerAction::Activate(pending);
        }

        TriggerAction::Fire
    }

    fn promote_if_activated(&mut self, projectile_state: &impl Fn(Entity) -> Option<bool>) {
        if self.active.is_some() {
            return;
        }
        if let Some(pending) = self.pending {
            if projectile_state(pending) == Some(true) {
                self.active = Some(pending);
                self.pending = None;
            }
        }
    }

    /// Host выпустил новый projectile
    pub fn on_fired(&mut self, projectile: Entity) {
        self.pending = Some(projectile);
        self.active = None;
    }

    /// Black hole включился (impact или запрос)
    pub fn on_activated(&mut self, projectile: Entity) {
        if self.pending == Some(projectile) {
            self.active = Some(projectile);
            self.pending = None;
        }
    }

    /// Black hole выключился / projectile уничтожен
    pub fn forget(&mut self, projectile: Entity) {
        if self.pending == Some(projectile) {
            self.pending = None;
        }
        if self.active == Some(projectile) {
            self.active = None;
        }
    }
}
