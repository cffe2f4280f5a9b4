//! Gravity Well Simulation Core
//!
//! ECS-симуляция гравитационных полей на Bevy 0.16 + bevy_rapier3d
//!
//! Архитектура:
//! - field: FieldController (pure) + ECS adapters (queries → collaborator traits)
//! - locomotion: character movement, который поле переопределяет
//! - activation: projectile/weapon, включающие и выключающие поле
//! - config: TOML конфиг, logger: глобальный pluggable logger

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod activation;
pub mod config;
pub mod error;
pub mod field;
pub mod locomotion;
pub mod logger;

// Re-export основных типов
pub use activation::{ActivationPlugin, GravityWellProjectile, GravityWellWeapon};
pub use config::{GravityWellConfig, GravityWellConfigPath};
pub use error::{SimError, SimResult};
pub use field::{
    spawn_gravity_well, FieldController, FieldParameters, GravityWellPlugin, GravityWellSet,
    Polarity,
};
pub use locomotion::{spawn_character, CharacterMovement, LocomotionPlugin, MovementMode};
pub use logger::{init_logger, log, log_error, log_info, log_warning};

/// Частота fixed step (Hz)
pub const FIXED_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GravityWellConfigPath>()
            .init_resource::<GravityWellConfig>()
            .add_systems(Startup, config::load_gravity_well_config)
            .add_plugins((GravityWellPlugin, LocomotionPlugin, ActivationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время идёт ровно на один fixed step за `app.update()`.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / FIXED_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
