//! ECS adapters + systems для гравитационных полей
//!
//! `FieldWorld`: SystemParam, реализующий collaborator traits поверх
//! Bevy queries и bevy_rapier3d компонентов. Контроллер поля работает
//! только через traits, сюда не заглядывает.
//!
//! Порядок в FixedUpdate (GravityWellSet, chain):
//! 1. attach_field_force: dynamic bodies получают FieldForce
//! 2. clear_field_forces: обнуление сил прошлого шага
//! 3. handle_set_field_active: внешние команды on/off
//! 4. tick_gravity_wells: таймеры + тики полей
//! 5. sync_field_forces_to_rapier: FieldForce → ExternalForce

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::collaborators::{
    BodyCategory, CategoryFilter, CharacterLocomotion, OverlapHit, OverlapQuery, PhysicsSink,
    VisualizationSink,
};
use super::controller::{FieldController, TickReport};
use super::events::{
    CharacterEnteredField, CharacterLeftField, FieldDestroyed, FieldVisualsCleared,
    FieldVisualsUpdated, SetFieldActive,
};
use super::visualization::VisualizationParams;
use crate::locomotion::{CharacterMovement, MovementMode};
use crate::logger;

/// Суммарная сила от всех полей за текущий fixed step
///
/// Действует один physics step (как per-frame force в движке).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
#[require(ExternalForce)]
pub struct FieldForce(pub Vec3);

/// Поле заспавнено projectile'ом (weak back reference)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellOwner(pub Entity);

/// Категория коллайдера: явный компонент, иначе по типу rigid body
pub fn infer_category(explicit: Option<&BodyCategory>, body: Option<&RigidBody>) -> BodyCategory {
    if let Some(category) = explicit {
        return *category;
    }
    match body {
        Some(RigidBody::Dynamic) => BodyCategory::PhysicsBody,
        Some(RigidBody::Fixed) => BodyCategory::WorldStatic,
        _ => BodyCategory::WorldDynamic,
    }
}

/// Масса: computed (rapier) → authored (collider) → 0
pub fn body_mass(
    computed: Option<&ReadMassProperties>,
    authored: Option<&ColliderMassProperties>,
) -> f32 {
    if let Some(computed) = computed {
        let mass = computed.get().mass;
        if mass > 0.0 {
            return mass;
        }
    }
    match authored {
        Some(ColliderMassProperties::Mass(mass)) => *mass,
        Some(ColliderMassProperties::MassProperties(props)) => props.mass,
        _ => 0.0,
    }
}

/// Host engine для FieldController (overlap + physics + characters)
#[derive(SystemParam)]
pub struct FieldWorld<'w, 's> {
    colliders: Query<
        'w,
        's,
        (
            Entity,
            &'static Transform,
            &'static Collider,
            Option<&'static ChildOf>,
            Option<&'static BodyCategory>,
            Option<&'static RigidBody>,
        ),
    >,
    transforms: Query<'w, 's, &'static Transform>,
    bodies: Query<
        'w,
        's,
        (
            &'static RigidBody,
            Option<&'static mut Sleeping>,
            Option<&'static ReadMassProperties>,
            Option<&'static ColliderMassProperties>,
            Option<&'static mut FieldForce>,
        ),
    >,
    characters: Query<'w, 's, (&'static mut CharacterMovement, Option<&'static mut Velocity>)>,
}

impl OverlapQuery for FieldWorld<'_, '_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: CategoryFilter) -> Vec<OverlapHit> {
        let mut hits = Vec::new();

        for (entity, transform, collider, child_of, category, body) in self.colliders.iter() {
            if !filter.contains(infer_category(category, body)) {
                continue;
            }

            // Child collider: позиция в мире = parent transform ∘ local
            let (owner, position) = match child_of {
                Some(child_of) => {
                    let parent = child_of.parent();
                    let position = self
                        .transforms
                        .get(parent)
                        .map(|parent_transform| parent_transform.transform_point(transform.translation))
                        .unwrap_or(transform.translation);
                    (parent, position)
                }
                None => (entity, transform.translation),
            };

            let bounds = collider.raw.compute_local_bounding_sphere().radius();
            if position.distance(center) <= radius + bounds {
                hits.push(OverlapHit {
                    primitive: entity,
                    owner,
                    position,
                });
            }
        }

        hits
    }
}

impl PhysicsSink for FieldWorld<'_, '_> {
    fn is_simulating(&self, primitive: Entity) -> bool {
        matches!(self.bodies.get(primitive), Ok((RigidBody::Dynamic, ..)))
    }

    fn wake(&mut self, primitive: Entity) {
        if let Ok((_, Some(mut sleeping), ..)) = self.bodies.get_mut(primitive) {
            if sleeping.sleeping {
                sleeping.sleeping = false;
            }
        }
    }

    fn mass(&self, primitive: Entity) -> f32 {
        self.bodies
            .get(primitive)
            .map(|(_, _, computed, authored, _)| body_mass(computed, authored))
            .unwrap_or(0.0)
    }

    fn apply_force(&mut self, primitive: Entity, force: Vec3) {
        match self.bodies.get_mut(primitive) {
            Ok((_, _, _, _, Some(mut field_force))) => field_force.0 += force,
            // FieldForce ещё не прикреплён (body заспавнен в этом шаге)
            _ => logger::log(&format!("GravityWell: {:?} has no FieldForce yet", primitive)),
        }
    }
}

impl CharacterLocomotion for FieldWorld<'_, '_> {
    fn is_character(&self, actor: Entity) -> bool {
        self.characters.contains(actor)
    }

    fn is_alive(&self, character: Entity) -> bool {
        self.characters.contains(character)
    }

    fn gravity_scale(&self, character: Entity) -> Option<f32> {
        self.characters
            .get(character)
            .ok()
            .map(|(movement, _)| movement.gravity_scale)
    }

    fn set_gravity_scale(&mut self, character: Entity, scale: f32) {
        if let Ok((mut movement, _)) = self.characters.get_mut(character) {
            movement.gravity_scale = scale;
        }
    }

    fn movement_mode(&self, character: Entity) -> Option<MovementMode> {
        self.characters
            .get(character)
            .ok()
            .map(|(movement, _)| movement.movement_mode)
    }

    fn set_movement_mode(&mut self, character: Entity, mode: MovementMode) {
        if let Ok((mut movement, _)) = self.characters.get_mut(character) {
            movement.movement_mode = mode;
        }
    }

    fn velocity(&self, character: Entity) -> Option<Vec3> {
        self.characters
            .get(character)
            .ok()
            .map(|(movement, _)| movement.velocity)
    }

    fn add_velocity(&mut self, character: Entity, delta: Vec3) {
        if let Ok((mut movement, _)) = self.characters.get_mut(character) {
            movement.velocity += delta;
        }
    }

    fn notify_velocity_changed(&mut self, character: Entity) {
        if let Ok((movement, Some(mut rapier_velocity))) = self.characters.get_mut(character) {
            rapier_velocity.linvel = movement.velocity;
        }
    }
}

/// Косметический канал поля: Bevy events для host VFX
#[derive(SystemParam)]
pub struct FieldVisuals<'w> {
    updated: EventWriter<'w, FieldVisualsUpdated>,
    cleared: EventWriter<'w, FieldVisualsCleared>,
}

impl VisualizationSink for FieldVisuals<'_> {
    fn publish(&mut self, field: Entity, params: VisualizationParams) {
        self.updated.write(FieldVisualsUpdated { field, params });
    }

    fn clear(&mut self, field: Entity) {
        self.cleared.write(FieldVisualsCleared { field });
    }
}

fn publish_report(
    field: Entity,
    report: TickReport,
    entered: &mut EventWriter<CharacterEnteredField>,
    left: &mut EventWriter<CharacterLeftField>,
    visuals: &mut FieldVisuals<'_>,
) {
    for character in report.entered {
        entered.write(CharacterEnteredField { field, character });
    }
    for character in report.released {
        left.write(CharacterLeftField { field, character });
    }
    if let Some(params) = report.visuals {
        visuals.publish(field, params);
    }
}

/// System: dynamic bodies без FieldForce получают его
pub fn attach_field_force(
    mut commands: Commands,
    query: Query<(Entity, &RigidBody), Without<FieldForce>>,
) {
    for (entity, body) in query.iter() {
        if *body == RigidBody::Dynamic {
            commands.entity(entity).insert(FieldForce::default());
        }
    }
}

/// System: обнуление сил полей в начале fixed step
pub fn clear_field_forces(mut query: Query<&mut FieldForce>) {
    for mut force in query.iter_mut() {
        if force.0 != Vec3::ZERO {
            force.0 = Vec3::ZERO;
        }
    }
}

/// System: FieldForce → Rapier ExternalForce
pub fn sync_field_forces_to_rapier(mut query: Query<(&FieldForce, &mut ExternalForce)>) {
    for (field_force, mut external) in query.iter_mut() {
        if external.force != field_force.0 {
            external.force = field_force.0;
        }
    }
}

/// System: тики всех активных полей
///
/// Если за шаг прошло несколько периодов таймера: тик выполняется
/// столько раз, последовательно.
pub fn tick_gravity_wells(
    time: Res<Time<Fixed>>,
    mut fields: Query<(Entity, &mut FieldController, &Transform)>,
    mut world: FieldWorld,
    mut entered: EventWriter<CharacterEnteredField>,
    mut left: EventWriter<CharacterLeftField>,
    mut visuals: FieldVisuals,
) {
    let delta = time.delta();

    for (field, mut controller, transform) in fields.iter_mut() {
        let ticks = controller.advance_timer(delta);
        for _ in 0..ticks {
            let report = controller.tick(field, transform, &mut world);
            publish_report(field, report, &mut entered, &mut left, &mut visuals);
        }
    }
}

/// System: обработка SetFieldActive
pub fn handle_set_field_active(
    mut events: EventReader<SetFieldActive>,
    mut fields: Query<&mut FieldController>,
    mut world: FieldWorld,
    mut left: EventWriter<CharacterLeftField>,
    mut visuals: FieldVisuals,
) {
    for event in events.read() {
        let Ok(mut controller) = fields.get_mut(event.field) else {
            logger::log_warning(&format!(
                "{} ({:?})",
                crate::error::SimError::EntityNotFound {
                    context: "SetFieldActive"
                },
                event.field
            ));
            continue;
        };

        if event.active {
            if controller.is_active() {
                continue;
            }
            if let Some(params) = controller.activate() {
                visuals.publish(event.field, params);
            }
        } else {
            for character in controller.deactivate(event.field, &mut world, &mut visuals) {
                left.write(CharacterLeftField {
                    field: event.field,
                    character,
                });
            }
        }
    }
}

/// Observer: поле добавлено → активация
pub fn on_field_added(
    trigger: Trigger<OnAdd, FieldController>,
    mut fields: Query<&mut FieldController>,
    mut visuals: FieldVisuals,
) {
    let field = trigger.target();
    let Ok(mut controller) = fields.get_mut(field) else {
        return;
    };

    if let Some(params) = controller.activate() {
        visuals.publish(field, params);
    }
}

/// Observer: поле удаляется (remove / despawn) → восстановление всех персонажей
///
/// Срабатывает до удаления компонента: к моменту исчезновения поля
/// ни один персонаж не остаётся с override'ом.
pub fn on_field_removed(
    trigger: Trigger<OnRemove, FieldController>,
    mut fields: Query<(&mut FieldController, Option<&WellOwner>)>,
    mut world: FieldWorld,
    mut visuals: FieldVisuals,
    mut left: EventWriter<CharacterLeftField>,
    mut destroyed: EventWriter<FieldDestroyed>,
) {
    let field = trigger.target();
    let Ok((mut controller, owner)) = fields.get_mut(field) else {
        return;
    };

    for character in controller.deactivate(field, &mut world, &mut visuals) {
        left.write(CharacterLeftField { field, character });
    }

    destroyed.write(FieldDestroyed {
        field,
        owner: owner.map(|owner| owner.0),
    });
}
