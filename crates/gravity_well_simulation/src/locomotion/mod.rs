//! Character locomotion (host side)
//!
//! Архитектура:
//! - Custom velocity integration (не используем Rapier forces для персонажей)
//! - Gravity только в Falling, ground check по высоте пола
//! - Flying = unconstrained режим: ни гравитации, ни ground check
//!
//! Поле гравитации переключает персонажа в Flying и обнуляет gravity_scale,
//! после выхода из поля возвращает сохранённые значения.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use serde::Deserialize;

/// Режим движения персонажа (коды совпадают с engine movement modes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    None,
    #[default]
    Walking,
    NavWalking,
    Falling,
    Swimming,
    Flying,
    Custom,
}

impl MovementMode {
    pub fn as_code(self) -> u8 {
        match self {
            MovementMode::None => 0,
            MovementMode::Walking => 1,
            MovementMode::NavWalking => 2,
            MovementMode::Falling => 3,
            MovementMode::Swimming => 4,
            MovementMode::Flying => 5,
            MovementMode::Custom => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MovementMode::None),
            1 => Some(MovementMode::Walking),
            2 => Some(MovementMode::NavWalking),
            3 => Some(MovementMode::Falling),
            4 => Some(MovementMode::Swimming),
            5 => Some(MovementMode::Flying),
            6 => Some(MovementMode::Custom),
            _ => None,
        }
    }

    /// Стоит ли персонаж на земле в этом режиме
    pub fn is_grounded(self) -> bool {
        matches!(self, MovementMode::Walking | MovementMode::NavWalking)
    }
}

/// Movement компонент персонажа
///
/// Наличие этого компонента = entity является персонажем для полей.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CharacterMovement {
    /// Множитель мировой гравитации (поле ставит 0)
    pub gravity_scale: f32,
    pub movement_mode: MovementMode,
    /// Текущая скорость (units/s)
    pub velocity: Vec3,
    /// Мировая гравитация по Y (units/s²)
    pub gravity: f32,
    /// Высота пола для ground check
    pub ground_height: f32,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            gravity_scale: 1.0,
            movement_mode: MovementMode::Walking,
            velocity: Vec3::ZERO,
            gravity: -980.0, // engine units: сантиметры
            ground_height: 0.0,
        }
    }
}

impl CharacterMovement {
    /// Допуск ground check (numerical errors)
    pub const GROUND_TOLERANCE: f32 = 0.5;

    pub fn apply_gravity(&mut self, delta: f32) {
        if self.movement_mode == MovementMode::Falling {
            self.velocity.y += self.gravity * self.gravity_scale * delta;
        }
    }

    /// Переходы Falling ↔ Walking по высоте `y`
    ///
    /// Возвращает скорректированную высоту (snap к полу при приземлении).
    pub fn update_ground_state(&mut self, y: f32) -> f32 {
        match self.movement_mode {
            MovementMode::Falling if y <= self.ground_height + Self::GROUND_TOLERANCE && self.velocity.y <= 0.0 => {
                self.movement_mode = MovementMode::Walking;
                self.velocity.y = 0.0;
                self.ground_height
            }
            MovementMode::Walking | MovementMode::NavWalking
                if y > self.ground_height + Self::GROUND_TOLERANCE =>
            {
                self.movement_mode = MovementMode::Falling;
                y
            }
            _ => y,
        }
    }
}

/// Система применения gravity к velocity
pub fn apply_character_gravity(
    mut query: Query<&mut CharacterMovement>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for mut movement in query.iter_mut() {
        movement.apply_gravity(delta);
    }
}

/// Система интеграции velocity → Transform
pub fn integrate_character_velocity(
    mut query: Query<(&CharacterMovement, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (movement, mut transform) in query.iter_mut() {
        if movement.movement_mode == MovementMode::None {
            continue;
        }
        transform.translation += movement.velocity * delta;
    }
}

/// Система ground detection через простую Y-проверку
pub fn character_ground_detection(mut query: Query<(&mut CharacterMovement, &mut Transform)>) {
    for (mut movement, mut transform) in query.iter_mut() {
        let y = movement.update_ground_state(transform.translation.y);
        if y != transform.translation.y {
            transform.translation.y = y;
        }
    }
}

/// Синхронизация CharacterMovement.velocity → Rapier Velocity
pub fn sync_character_velocity_to_rapier(
    mut query: Query<(&CharacterMovement, &mut Velocity)>,
) {
    for (movement, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = movement.velocity;
    }
}

/// Plugin для character locomotion
///
/// Системы в FixedUpdate, после тиков полей (поле меняет velocity/mode первым).
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                apply_character_gravity,
                integrate_character_velocity,
                character_ground_detection,
                sync_character_velocity_to_rapier,
            )
                .chain()
                .after(crate::field::GravityWellSet),
        );
    }
}

/// Spawn helper для персонажа
///
/// Capsule collider + Pawn категория для overlap query полей.
pub fn spawn_character(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            CharacterMovement::default(),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(44.0, 34.0),
            Velocity::default(),
            crate::field::BodyCategory::Pawn,
        ))
        .id()
}
