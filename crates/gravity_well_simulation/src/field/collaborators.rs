//! Контракты с host engine
//!
//! Контроллер поля не знает про ECS queries: он работает через эти traits.
//! ECS реализации: в `field::systems`, fake реализации: в тестах.

use bevy::prelude::*;
use serde::Deserialize;

use super::visualization::VisualizationParams;
use crate::locomotion::MovementMode;

/// Категория физического примитива для overlap query
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Deserialize)]
#[reflect(Component)]
pub enum BodyCategory {
    Pawn,
    PhysicsBody,
    WorldDynamic,
    WorldStatic,
}

impl BodyCategory {
    const fn bit(self) -> u8 {
        match self {
            BodyCategory::Pawn => 1 << 0,
            BodyCategory::PhysicsBody => 1 << 1,
            BodyCategory::WorldDynamic => 1 << 2,
            BodyCategory::WorldStatic => 1 << 3,
        }
    }
}

/// Набор категорий, которые видит overlap query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryFilter(u8);

impl CategoryFilter {
    pub const NONE: Self = Self(0);

    /// Pawns + physics bodies + static/dynamic world geometry
    pub const GRAVITY_WELL: Self = Self(
        BodyCategory::Pawn.bit()
            | BodyCategory::PhysicsBody.bit()
            | BodyCategory::WorldDynamic.bit()
            | BodyCategory::WorldStatic.bit(),
    );

    pub const fn with(self, category: BodyCategory) -> Self {
        Self(self.0 | category.bit())
    }

    pub const fn contains(self, category: BodyCategory) -> bool {
        self.0 & category.bit() != 0
    }
}

/// Результат overlap query: один физический примитив
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    /// Entity с коллайдером
    pub primitive: Entity,
    /// Владелец примитива (parent или сам примитив)
    pub owner: Entity,
    /// World position примитива
    pub position: Vec3,
}

/// Spatial overlap query (синхронный)
pub trait OverlapQuery {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: CategoryFilter) -> Vec<OverlapHit>;
}

/// Physics sink для rigid bodies
pub trait PhysicsSink {
    /// Симулирует ли примитив физику (dynamic body)
    fn is_simulating(&self, primitive: Entity) -> bool;
    fn wake(&mut self, primitive: Entity);
    fn mass(&self, primitive: Entity) -> f32;
    fn apply_force(&mut self, primitive: Entity, force: Vec3);
}

/// Character locomotion sink
///
/// Getters возвращают `None`, если персонаж исчез или у него нет movement.
pub trait CharacterLocomotion {
    /// Является ли actor персонажем (cast к character)
    fn is_character(&self, actor: Entity) -> bool;
    /// Проверка weak reference перед использованием
    fn is_alive(&self, character: Entity) -> bool;
    fn gravity_scale(&self, character: Entity) -> Option<f32>;
    fn set_gravity_scale(&mut self, character: Entity, scale: f32);
    fn movement_mode(&self, character: Entity) -> Option<MovementMode>;
    fn set_movement_mode(&mut self, character: Entity, mode: MovementMode);
    fn velocity(&self, character: Entity) -> Option<Vec3>;
    fn add_velocity(&mut self, character: Entity, delta: Vec3);
    fn notify_velocity_changed(&mut self, character: Entity);
}

/// Косметический канал: параметры визуализации раз в тик
pub trait VisualizationSink {
    fn publish(&mut self, field: Entity, params: VisualizationParams);
    /// Поле выключено: визуализацию снять
    fn clear(&mut self, field: Entity);
}
