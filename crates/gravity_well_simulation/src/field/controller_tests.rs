//! Tests for FieldController (in-memory collaborators, без ECS).

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use bevy::prelude::*;

    use crate::field::acceleration::{AccelerationModel, Polarity};
    use crate::field::collaborators::{
        BodyCategory, CategoryFilter, CharacterLocomotion, OverlapHit, OverlapQuery, PhysicsSink,
        VisualizationSink,
    };
    use crate::field::controller::{FieldController, RestoreOutcome};
    use crate::field::params::{FieldParameters, DEFAULT_TICK_INTERVAL};
    use crate::field::visualization::{VisualizationParams, VisualizationSettings};
    use crate::locomotion::MovementMode;

    struct FakeBody {
        primitive: Entity,
        owner: Entity,
        position: Vec3,
        category: BodyCategory,
        simulating: bool,
        mass: f32,
        awake: bool,
        force: Vec3,
    }

    struct FakeCharacter {
        gravity_scale: f32,
        /// None = нет movement компонента
        mode: Option<MovementMode>,
        velocity: Vec3,
        alive: bool,
        mode_writes: usize,
    }

    #[derive(Default)]
    struct FakeWorld {
        bodies: Vec<FakeBody>,
        characters: HashMap<Entity, FakeCharacter>,
        duplicate_hits: bool,
        velocity_notifications: usize,
    }

    impl FakeWorld {
        fn add_body(&mut self, id: u32, position: Vec3, mass: f32) -> Entity {
            let entity = Entity::from_raw(id);
            self.bodies.push(FakeBody {
                primitive: entity,
                owner: entity,
                position,
                category: BodyCategory::PhysicsBody,
                simulating: true,
                mass,
                awake: false,
                force: Vec3::ZERO,
            });
            entity
        }

        fn add_character(&mut self, id: u32, position: Vec3) -> Entity {
            let entity = Entity::from_raw(id);
            self.bodies.push(FakeBody {
                primitive: entity,
                owner: entity,
                position,
                category: BodyCategory::Pawn,
                simulating: false,
                mass: 80.0,
                awake: false,
                force: Vec3::ZERO,
            });
            self.characters.insert(
                entity,
                FakeCharacter {
                    gravity_scale: 1.0,
                    mode: Some(MovementMode::Walking),
                    velocity: Vec3::ZERO,
                    alive: true,
                    mode_writes: 0,
                },
            );
            entity
        }

        fn body(&self, entity: Entity) -> &FakeBody {
            self.bodies
                .iter()
                .find(|body| body.primitive == entity)
                .unwrap()
        }

        fn character(&self, entity: Entity) -> &FakeCharacter {
            self.characters.get(&entity).unwrap()
        }

        fn move_to(&mut self, entity: Entity, position: Vec3) {
            for body in self.bodies.iter_mut().filter(|body| body.owner == entity) {
                body.position = position;
            }
        }

        fn destroy(&mut self, entity: Entity) {
            self.bodies.retain(|body| body.owner != entity);
            if let Some(character) = self.characters.get_mut(&entity) {
                character.alive = false;
            }
        }

        fn live_character(&mut self, entity: Entity) -> Option<&mut FakeCharacter> {
            self.characters
                .get_mut(&entity)
                .filter(|character| character.alive)
        }
    }

    impl OverlapQuery for FakeWorld {
        fn overlap_sphere(&self, center: Vec3, radius: f32, filter: CategoryFilter) -> Vec<OverlapHit> {
            let mut hits = Vec::new();
            for body in &self.bodies {
                if filter.contains(body.category) && body.position.distance(center) <= radius {
                    let hit = OverlapHit {
                        primitive: body.primitive,
                        owner: body.owner,
                        position: body.position,
                    };
                    hits.push(hit);
                    if self.duplicate_hits {
                        hits.push(hit);
                    }
                }
            }
            hits
        }
    }

    impl PhysicsSink for FakeWorld {
        fn is_simulating(&self, primitive: Entity) -> bool {
            self.bodies
                .iter()
                .any(|body| body.primitive == primitive && body.simulating)
        }

        fn wake(&mut self, primitive: Entity) {
            for body in self.bodies.iter_mut().filter(|body| body.primitive == primitive) {
                body.awake = true;
            }
        }

        fn mass(&self, primitive: Entity) -> f32 {
            self.bodies
                .iter()
                .find(|body| body.primitive == primitive)
                .map(|body| body.mass)
                .unwrap_or(0.0)
        }

        fn apply_force(&mut self, primitive: Entity, force: Vec3) {
            for body in self.bodies.iter_mut().filter(|body| body.primitive == primitive) {
                body.force += force;
            }
        }
    }

    impl CharacterLocomotion for FakeWorld {
        fn is_character(&self, actor: Entity) -> bool {
            self.characters
                .get(&actor)
                .is_some_and(|character| character.alive)
        }

        fn is_alive(&self, character: Entity) -> bool {
            self.is_character(character)
        }

        fn gravity_scale(&self, character: Entity) -> Option<f32> {
            let character = self.characters.get(&character).filter(|c| c.alive)?;
            character.mode.map(|_| character.gravity_scale)
        }

        fn set_gravity_scale(&mut self, character: Entity, scale: f32) {
            if let Some(character) = self.live_character(character) {
                character.gravity_scale = scale;
            }
        }

        fn movement_mode(&self, character: Entity) -> Option<MovementMode> {
            self.characters
                .get(&character)
                .filter(|c| c.alive)
                .and_then(|c| c.mode)
        }

        fn set_movement_mode(&mut self, character: Entity, mode: MovementMode) {
            if let Some(character) = self.live_character(character) {
                character.mode = Some(mode);
                character.mode_writes += 1;
            }
        }

        fn velocity(&self, character: Entity) -> Option<Vec3> {
            self.characters
                .get(&character)
                .filter(|c| c.alive)
                .map(|c| c.velocity)
        }

        fn add_velocity(&mut self, character: Entity, delta: Vec3) {
            if let Some(character) = self.live_character(character) {
                character.velocity += delta;
            }
        }

        fn notify_velocity_changed(&mut self, _character: Entity) {
            self.velocity_notifications += 1;
        }
    }

    #[derive(Default)]
    struct FakeVisuals {
        published: Vec<(Entity, VisualizationParams)>,
        cleared: Vec<Entity>,
    }

    impl VisualizationSink for FakeVisuals {
        fn publish(&mut self, field: Entity, params: VisualizationParams) {
            self.published.push((field, params));
        }

        fn clear(&mut self, field: Entity) {
            self.cleared.push(field);
        }
    }

    /// Ускорение не зависит от расстояния (внутри сферы)
    struct Uniform(Vec3);

    impl AccelerationModel for Uniform {
        fn acceleration(&self, _center: Vec3, _target: Vec3, _params: &FieldParameters) -> Vec3 {
            self.0
        }

        fn name(&self) -> &'static str {
            "uniform"
        }
    }

    fn field_entity() -> Entity {
        Entity::from_raw(1)
    }

    fn active_field(params: FieldParameters) -> FieldController {
        let mut field = FieldController::new(params);
        field.activate();
        field
    }

    fn tick(field: &mut FieldController, world: &mut FakeWorld) -> crate::field::TickReport {
        field.tick(field_entity(), &Transform::IDENTITY, world)
    }

    #[test]
    fn test_inactive_field_does_nothing() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let mut field = FieldController::new(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.overlapping, 0);
        assert_eq!(world.body(body).force, Vec3::ZERO);
        assert_eq!(field.advance_timer(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_first_tick_fires_immediately_after_activation() {
        let mut field = active_field(FieldParameters::default());

        assert_eq!(field.advance_timer(Duration::from_millis(10)), 1);
        assert_eq!(field.advance_timer(Duration::from_millis(10)), 0);
        assert_eq!(field.advance_timer(Duration::from_millis(20)), 1);
    }

    #[test]
    fn test_activation_corrects_short_tick_interval() {
        let mut field = FieldController::new(FieldParameters {
            tick_interval: 0.0001,
            ..default()
        });
        let visuals = field.activate();

        assert_eq!(field.params().tick_interval, DEFAULT_TICK_INTERVAL);
        assert!(field.is_active());
        assert!(visuals.is_some());
    }

    #[test]
    fn test_activation_corrects_unbounded_tick_interval() {
        for tick_interval in [f32::INFINITY, 1.0e30] {
            let mut field = FieldController::new(FieldParameters {
                tick_interval,
                ..default()
            });
            field.activate();

            assert!(field.is_active());
            assert_eq!(field.timer_rate(), Some(DEFAULT_TICK_INTERVAL));
            assert_eq!(field.advance_timer(Duration::from_millis(10)), 1);
        }
    }

    #[test]
    fn test_rigid_body_receives_mass_scaled_force() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.pushed_bodies, 1);
        assert!(world.body(body).awake);
        let force = world.body(body).force;
        assert!((force - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-3, "force = {:?}", force);
    }

    #[test]
    fn test_massless_body_is_woken_but_not_pushed() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-500.0, 0.0, 0.0), 0.0);
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.pushed_bodies, 0);
        assert!(world.body(body).awake);
        assert_eq!(world.body(body).force, Vec3::ZERO);
    }

    #[test]
    fn test_duplicate_overlaps_are_processed_once() {
        let mut world = FakeWorld {
            duplicate_hits: true,
            ..default()
        };
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.overlapping, 1);
        assert!((world.body(body).force.x - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_field_skips_its_own_primitives() {
        let mut world = FakeWorld::default();
        world.bodies.push(FakeBody {
            primitive: Entity::from_raw(50),
            owner: field_entity(),
            position: Vec3::new(200.0, 0.0, 0.0),
            category: BodyCategory::WorldDynamic,
            simulating: true,
            mass: 5.0,
            awake: false,
            force: Vec3::ZERO,
        });
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.overlapping, 1);
        assert_eq!(report.pushed_bodies, 0);
        assert_eq!(world.bodies[0].force, Vec3::ZERO);
    }

    #[test]
    fn test_repulsive_field_pushes_outward() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let mut field = FieldController::new(FieldParameters::default()).with_polarity(Polarity::Repel);
        field.activate();

        tick(&mut field, &mut world);

        assert!((world.body(body).force - Vec3::new(-6.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_custom_model_drives_forces_and_velocity() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let character = world.add_character(11, Vec3::new(500.0, 0.0, 0.0));
        let mut field =
            FieldController::new(FieldParameters::default()).with_model(Uniform(Vec3::Y * 10.0));
        field.activate();

        tick(&mut field, &mut world);

        assert_eq!(field.model_name(), "uniform");
        assert_eq!(field.acceleration_at(Vec3::ZERO, Vec3::X), Vec3::Y * 10.0);
        assert!((world.body(body).force - Vec3::Y * 20.0).length() < 1e-4);
        let velocity = world.character(character).velocity;
        assert!((velocity - Vec3::Y * 0.3).length() < 1e-4, "velocity = {:?}", velocity);
    }

    #[test]
    fn test_overlap_filter_limits_what_the_field_sees() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let character = world.add_character(11, Vec3::new(300.0, 0.0, 0.0));
        let mut field = FieldController::new(FieldParameters::default())
            .with_overlap_filter(CategoryFilter::NONE.with(BodyCategory::Pawn));
        field.activate();

        let report = tick(&mut field, &mut world);

        assert_eq!(report.overlapping, 1);
        assert_eq!(world.body(body).force, Vec3::ZERO);
        assert_eq!(report.entered, vec![character]);
    }

    #[test]
    fn test_deactivation_clears_visuals_only_when_published() {
        let mut world = FakeWorld::default();
        let mut visuals = FakeVisuals::default();

        let mut shown = active_field(FieldParameters::default());
        shown.deactivate(field_entity(), &mut world, &mut visuals);

        let mut hidden = FieldController::new(FieldParameters::default()).with_visualization(
            VisualizationSettings {
                enabled: false,
                ..default()
            },
        );
        assert!(hidden.activate().is_none());
        hidden.deactivate(Entity::from_raw(2), &mut world, &mut visuals);

        // Повторная деактивация: уже выключено
        shown.deactivate(field_entity(), &mut world, &mut visuals);

        assert_eq!(visuals.cleared, vec![field_entity()]);
        assert!(visuals.published.is_empty());
    }

    #[test]
    fn test_disabled_categories_are_ignored() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let character = world.add_character(11, Vec3::new(300.0, 0.0, 0.0));
        let mut field = active_field(FieldParameters {
            affect_rigid_bodies: false,
            affect_characters: false,
            ..default()
        });

        let report = tick(&mut field, &mut world);

        assert_eq!(report.overlapping, 2);
        assert_eq!(world.body(body).force, Vec3::ZERO);
        assert!(field.overrides().is_empty());
        assert_eq!(world.character(character).velocity, Vec3::ZERO);
        assert_eq!(world.character(character).mode, Some(MovementMode::Walking));
    }

    #[test]
    fn test_character_entry_overrides_locomotion_and_adds_velocity() {
        let mut world = FakeWorld::default();
        let character = world.add_character(11, Vec3::new(500.0, 0.0, 0.0));
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);

        assert_eq!(report.entered, vec![character]);
        assert_eq!(world.character(character).gravity_scale, 0.0);
        assert_eq!(world.character(character).mode, Some(MovementMode::Flying));
        assert_eq!(world.velocity_notifications, 1);

        // 3e6 / 500² = 12 units/s² к центру, dt = 0.03
        let velocity = world.character(character).velocity;
        assert!((velocity.x + 0.36).abs() < 1e-3, "velocity = {:?}", velocity);
    }

    #[test]
    fn test_scenario_character_enters_stays_and_exits() {
        let mut world = FakeWorld::default();
        let character = world.add_character(11, Vec3::new(500.0, 0.0, 0.0));
        let mut field = active_field(FieldParameters::default());

        for step in 1..=5 {
            let report = tick(&mut field, &mut world);
            assert_eq!(report.entered.is_empty(), step != 1);
            assert!(field.overrides().contains(character));
            assert_eq!(world.character(character).mode, Some(MovementMode::Flying));
        }

        let saved = field.overrides().get(character).unwrap().saved.unwrap();
        assert_eq!(saved.gravity_scale, 1.0);
        assert_eq!(saved.movement_mode, MovementMode::Walking);

        world.move_to(character, Vec3::new(5000.0, 0.0, 0.0));
        let report = tick(&mut field, &mut world);

        assert_eq!(report.released, vec![character]);
        assert!(!field.overrides().contains(character));
        assert_eq!(world.character(character).gravity_scale, 1.0);
        assert_eq!(world.character(character).mode, Some(MovementMode::Walking));
    }

    #[test]
    fn test_scenario_destroyed_field_restores_everyone_once() {
        let mut world = FakeWorld::default();
        let a = world.add_character(11, Vec3::new(400.0, 0.0, 0.0));
        let b = world.add_character(12, Vec3::new(0.0, 600.0, 0.0));
        let mut field = active_field(FieldParameters::default());

        tick(&mut field, &mut world);
        assert_eq!(field.overrides().len(), 2);

        let mut visuals = FakeVisuals::default();
        let released = field.deactivate(field_entity(), &mut world, &mut visuals);
        assert_eq!(released, vec![a, b]);
        assert!(field.overrides().is_empty());
        assert!(!field.is_active());

        for character in [a, b] {
            assert_eq!(world.character(character).gravity_scale, 1.0);
            assert_eq!(world.character(character).mode, Some(MovementMode::Walking));
            // вход + восстановление
            assert_eq!(world.character(character).mode_writes, 2);
        }

        assert!(field
            .deactivate(field_entity(), &mut world, &mut visuals)
            .is_empty());
        assert_eq!(world.character(a).mode_writes, 2);
        assert_eq!(visuals.cleared, vec![field_entity()]);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut world = FakeWorld::default();
        let character = world.add_character(11, Vec3::new(400.0, 0.0, 0.0));
        let mut field = active_field(FieldParameters::default());
        tick(&mut field, &mut world);

        assert_eq!(field.restore_character(character, &mut world), RestoreOutcome::Restored);

        world.set_gravity_scale(character, 0.25);
        assert_eq!(field.restore_character(character, &mut world), RestoreOutcome::NotTracked);
        assert_eq!(world.character(character).gravity_scale, 0.25);
    }

    #[test]
    fn test_destroyed_character_is_dropped_without_restore() {
        let mut world = FakeWorld::default();
        let character = world.add_character(11, Vec3::new(400.0, 0.0, 0.0));
        let mut field = active_field(FieldParameters::default());
        tick(&mut field, &mut world);

        world.destroy(character);
        let report = tick(&mut field, &mut world);

        assert_eq!(report.released, vec![character]);
        assert!(field.overrides().is_empty());
        assert_eq!(world.character(character).mode_writes, 1);
    }

    #[test]
    fn test_missing_saved_state_restores_defaults() {
        let mut world = FakeWorld::default();
        let character = world.add_character(11, Vec3::new(400.0, 0.0, 0.0));
        world.characters.get_mut(&character).unwrap().mode = None;
        let mut field = active_field(FieldParameters::default());

        tick(&mut field, &mut world);
        assert!(field.overrides().get(character).unwrap().saved.is_none());
        assert_eq!(world.character(character).mode_writes, 0);

        {
            let state = world.characters.get_mut(&character).unwrap();
            state.mode = Some(MovementMode::Falling);
            state.gravity_scale = 0.3;
        }

        assert_eq!(field.restore_character(character, &mut world), RestoreOutcome::Defaulted);
        assert_eq!(world.character(character).gravity_scale, 1.0);
        assert_eq!(world.character(character).mode, Some(MovementMode::Walking));
    }

    #[test]
    fn test_override_table_tracks_exactly_the_characters_inside() {
        let mut world = FakeWorld::default();
        let inside = Vec3::new(300.0, 0.0, 0.0);
        let outside = Vec3::new(3000.0, 0.0, 0.0);
        let a = world.add_character(11, inside);
        let b = world.add_character(12, outside);
        let c = world.add_character(13, inside);
        let mut field = active_field(FieldParameters::default());

        let layouts = [
            [inside, outside, inside],
            [inside, inside, outside],
            [outside, inside, outside],
            [outside, outside, outside],
            [inside, inside, inside],
        ];

        for layout in layouts {
            for (character, position) in [a, b, c].into_iter().zip(layout) {
                world.move_to(character, position);
            }
            tick(&mut field, &mut world);

            for (character, position) in [a, b, c].into_iter().zip(layout) {
                let is_inside = position == inside;
                assert_eq!(field.overrides().contains(character), is_inside);
                let expected_mode = if is_inside {
                    MovementMode::Flying
                } else {
                    MovementMode::Walking
                };
                assert_eq!(world.character(character).mode, Some(expected_mode));
            }
        }
    }

    #[test]
    fn test_report_carries_visuals() {
        let mut world = FakeWorld::default();
        let mut field = active_field(FieldParameters::default());

        let report = tick(&mut field, &mut world);
        let visuals = report.visuals.unwrap();

        assert_eq!(visuals.radius, field.params().max_radius);
        assert!(visuals.pulse >= 0.0 && visuals.pulse < 1.0);
    }

    #[test]
    fn test_scaled_field_shrinks_influence_sphere() {
        let mut world = FakeWorld::default();
        let body = world.add_body(10, Vec3::new(-1000.0, 0.0, 0.0), 2.0);
        let mut field = active_field(FieldParameters::default());

        let report = field.tick(
            field_entity(),
            &Transform::from_scale(Vec3::splat(0.5)),
            &mut world,
        );

        assert_eq!(report.overlapping, 0);
        assert_eq!(world.body(body).force, Vec3::ZERO);
    }
}
