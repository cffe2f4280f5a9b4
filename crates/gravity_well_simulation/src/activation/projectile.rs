//! GravityWellProjectile: projectile, который разворачивается в black hole
//!
//! Жизненный цикл:
//! - полёт (inactive) → impact/activation request → active (поле заспавнено)
//! - active → deactivation → inactive (поле уничтожено, projectile обычно тоже)
//! - поле уничтожено кем-то другим → inactive, broadcast один раз
//!
//! Методы здесь чистые: возвращают что надо сделать, ECS часть в systems.rs.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::field::{BodyCategory, FieldParameters, Polarity};

#[derive(Component, Debug, Clone)]
pub struct GravityWellProjectile {
    /// None → полярность из GravityWellConfig (`white_hole`)
    pub polarity: Option<Polarity>,
    /// None → параметры из GravityWellConfig
    pub params: Option<FieldParameters>,
    /// Смещение поля относительно projectile
    pub spawn_offset: Vec3,
    /// Уничтожать projectile вместе с полем
    pub destroy_with_well: bool,
    active: bool,
    well: Option<Entity>,
}

impl Default for GravityWellProjectile {
    fn default() -> Self {
        Self::new()
    }
}

/// Что сделать при деактивации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deactivation {
    pub broadcast: bool,
    pub destroy_well: Option<Entity>,
    pub destroy_projectile: bool,
}

/// Что сделать при уничтожении projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    pub broadcast: bool,
    pub destroy_well: Option<Entity>,
}

impl GravityWellProjectile {
    pub fn new() -> Self {
        Self {
            polarity: None,
            params: None,
            spawn_offset: Vec3::ZERO,
            destroy_with_well: true,
            active: false,
            well: None,
        }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }

    pub fn with_params(mut self, params: FieldParameters) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_spawn_offset(mut self, offset: Vec3) -> Self {
        self.spawn_offset = offset;
        self
    }

    pub fn with_destroy_with_well(mut self, destroy: bool) -> Self {
        self.destroy_with_well = destroy;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Поле, которое держит projectile (weak reference)
    pub fn well(&self) -> Option<Entity> {
        self.well
    }

    /// Impact в активном состоянии игнорируется
    pub fn reacts_to_impact(&self) -> bool {
        !self.active
    }

    /// Inactive → Active. `false`, если уже активен (повторный вызов no-op)
    pub fn begin_activation(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    pub fn attach_well(&mut self, well: Entity) {
        self.well = Some(well);
    }

    /// Active → Inactive
    ///
    /// Неактивный projectile просто уничтожается. Ссылка на поле
    /// сбрасывается до уничтожения поля: FieldDestroyed от него уже не
    /// вызовет второй broadcast.
    pub fn deactivate(&mut self) -> Deactivation {
        if !self.active {
            return Deactivation {
                broadcast: false,
                destroy_well: None,
                destroy_projectile: true,
            };
        }

        self.active = false;
        Deactivation {
            broadcast: true,
            destroy_well: self.well.take(),
            destroy_projectile: self.destroy_with_well,
        }
    }

    /// Поле уничтожено извне. `true` → нужен broadcast deactivated
    pub fn handle_well_destroyed(&mut self, well: Entity) -> bool {
        if self.well != Some(well) {
            return false;
        }
        self.well = None;

        if self.active {
            self.active = false;
            return true;
        }
        false
    }

    /// Projectile уничтожается
    pub fn teardown(&mut self) -> Teardown {
        let broadcast = self.active;
        self.active = false;
        Teardown {
            broadcast,
            destroy_well: self.well.take(),
        }
    }
}

/// Spawn helper для projectile (kinematic, летит с заданной скоростью)
pub fn spawn_projectile(
    commands: &mut Commands,
    position: Vec3,
    velocity: Vec3,
    projectile: GravityWellProjectile,
) -> Entity {
    commands
        .spawn((
            Name::new("GravityWellProjectile"),
            Transform::from_translation(position),
            projectile,
            RigidBody::KinematicVelocityBased,
            Collider::ball(10.0),
            Velocity::linear(velocity),
            BodyCategory::WorldDynamic,
        ))
        .id()
}
