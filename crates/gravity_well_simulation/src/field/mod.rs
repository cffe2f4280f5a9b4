//! Gravity well field (black hole / white hole)
//!
//! Поле: entity с `FieldController` + `Transform`. Пока активно, с периодом
//! `tick_interval` притягивает (или отталкивает) всё в сфере влияния:
//! - dynamic rigid bodies получают force = acceleration × mass
//! - персонажи переводятся в Flying с нулевой гравитацией и получают
//!   velocity += acceleration × dt; при выходе locomotion восстанавливается
//!
//! Архитектура:
//! - controller.rs: pure state machine (traits вместо ECS queries)
//! - systems.rs: ECS adapters (FieldWorld), системы, observers
//! - acceleration.rs: strategy: InverseSquare / Repulsive

use bevy::prelude::*;

pub mod acceleration;
pub mod collaborators;
pub mod controller;
pub mod events;
pub mod overrides;
pub mod params;
pub mod systems;
pub mod visualization;

#[cfg(test)]
mod controller_tests;

pub use acceleration::{AccelerationModel, InverseSquare, Polarity, Repulsive};
pub use collaborators::{BodyCategory, CategoryFilter, OverlapHit};
pub use controller::{FieldController, FieldState, RestoreOutcome, TickReport};
pub use events::{
    CharacterEnteredField, CharacterLeftField, FieldDestroyed, FieldVisualsCleared,
    FieldVisualsUpdated, SetFieldActive,
};
pub use overrides::{AffectedCharacterState, CharacterGravityOverrideTable, SavedLocomotion};
pub use params::FieldParameters;
pub use systems::{FieldForce, FieldVisuals, FieldWorld, WellOwner};
pub use visualization::{VisualizationParams, VisualizationSettings};

/// Системы полей в FixedUpdate (locomotion идёт после)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GravityWellSet;

/// Gravity Well Plugin
///
/// Порядок: attach → clear → on/off команды → тики → sync в Rapier.
pub struct GravityWellPlugin;

impl Plugin for GravityWellPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FieldForce>()
            .register_type::<BodyCategory>();

        app.add_event::<SetFieldActive>()
            .add_event::<CharacterEnteredField>()
            .add_event::<CharacterLeftField>()
            .add_event::<FieldVisualsUpdated>()
            .add_event::<FieldVisualsCleared>()
            .add_event::<FieldDestroyed>();

        app.add_observer(systems::on_field_added)
            .add_observer(systems::on_field_removed);

        // Силы полей готовы до rapier physics step
        app.configure_sets(
            FixedUpdate,
            GravityWellSet.before(bevy_rapier3d::plugin::PhysicsSet::SyncBackend),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::attach_field_force,
                systems::clear_field_forces,
                systems::handle_set_field_active,
                systems::tick_gravity_wells,
                systems::sync_field_forces_to_rapier,
            )
                .chain()
                .in_set(GravityWellSet),
        );
    }
}

/// Spawn helper для поля
///
/// Поле активируется сразу (observer на добавление контроллера).
pub fn spawn_gravity_well(commands: &mut Commands, position: Vec3, controller: FieldController) -> Entity {
    commands
        .spawn((Name::new("GravityWell"), Transform::from_translation(position), controller))
        .id()
}
