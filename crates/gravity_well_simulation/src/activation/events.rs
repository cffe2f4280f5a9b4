//! Activation events (projectile ↔ weapon ↔ host)

use bevy::prelude::*;

/// Event: projectile во что-то врезался (host physics → ECS)
#[derive(Event, Debug, Clone, Copy)]
pub struct ProjectileImpact {
    pub projectile: Entity,
    /// Точка контакта (world space)
    pub point: Vec3,
}

/// Event: запрос включить/выключить black hole у projectile
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetProjectileActive {
    pub projectile: Entity,
    pub active: bool,
}

/// Event: black hole включён (поле заспавнено)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackHoleActivated {
    pub projectile: Entity,
    pub well: Entity,
}

/// Event: black hole выключен (один раз на активацию)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackHoleDeactivated {
    pub projectile: Entity,
}

/// Event: projectile уничтожен
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileDestroyed {
    pub projectile: Entity,
}

/// Event: игрок/AI нажал спуск
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPulled {
    pub weapon: Entity,
}

/// Event: weapon хочет выпустить новый projectile (ECS → host)
///
/// Host спавнит projectile и отвечает `ProjectileFired`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireProjectileIntent {
    pub weapon: Entity,
}

/// Event: host заспавнил projectile для weapon
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileFired {
    pub weapon: Entity,
    pub projectile: Entity,
}
