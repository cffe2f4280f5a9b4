//! Activation toggle: projectile → black hole, weapon управляет циклом
//!
//! ECS ответственность:
//! - GravityWellProjectile: active flag, weak ссылка на поле, spawn/despawn поля
//! - GravityWellWeapon: pending/active projectile handoff
//!
//! Host ответственность:
//! - физика полёта projectile, детект столкновений → ProjectileImpact
//! - FireProjectileIntent → spawn projectile → ProjectileFired
//!
//! Broadcasts (BlackHoleActivated/Deactivated, ProjectileDestroyed):
//! Bevy events, один раз на переход состояния.

use bevy::prelude::*;

pub mod events;
pub mod projectile;
pub mod systems;
pub mod weapon;

pub use events::{
    BlackHoleActivated, BlackHoleDeactivated, FireProjectileIntent, ProjectileDestroyed,
    ProjectileFired, ProjectileImpact, SetProjectileActive, TriggerPulled,
};
pub use projectile::{spawn_projectile, GravityWellProjectile};
pub use weapon::{GravityWellWeapon, TriggerAction};

use crate::config::GravityWellConfig;
use crate::field::GravityWellSet;

/// Activation Plugin
///
/// Порядок (FixedUpdate, до тиков полей):
/// 1. handle_trigger_pulled: спуск → запросы
/// 2. handle_projectile_requests: activate/deactivate
/// 3. handle_projectile_impacts: impact → activate
/// 4. handle_well_destroyed: внешнее уничтожение поля
/// 5. track_weapon_projectiles: pending/active ссылки weapon
pub struct ActivationPlugin;

impl Plugin for ActivationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GravityWellConfig>();

        app.add_event::<ProjectileImpact>()
            .add_event::<SetProjectileActive>()
            .add_event::<BlackHoleActivated>()
            .add_event::<BlackHoleDeactivated>()
            .add_event::<ProjectileDestroyed>()
            .add_event::<TriggerPulled>()
            .add_event::<FireProjectileIntent>()
            .add_event::<ProjectileFired>();

        app.add_observer(systems::on_projectile_removed);

        app.add_systems(
            FixedUpdate,
            (
                systems::handle_trigger_pulled,
                systems::handle_projectile_requests,
                systems::handle_projectile_impacts,
                systems::handle_well_destroyed,
                systems::track_weapon_projectiles,
            )
                .chain()
                .before(GravityWellSet),
        );
    }
}
