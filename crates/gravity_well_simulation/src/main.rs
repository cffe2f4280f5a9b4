//! Headless симуляция гравитационных полей
//!
//! Black hole + white hole, случайный debris (seeded) и персонаж.
//! Rapier не подключён: debris интегрируется здесь напрямую из ExternalForce.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

use gravity_well_simulation::field::{spawn_gravity_well, CharacterEnteredField, CharacterLeftField};
use gravity_well_simulation::{
    create_headless_app, log_info, spawn_character, CharacterMovement, DeterministicRng,
    FieldController, FieldParameters, GravityWellConfig, Polarity, SimulationPlugin,
};

const SEED: u64 = 42;
const TICKS: usize = 1000;
const DEBRIS_COUNT: usize = 32;

/// Маркер debris для headless интеграции
#[derive(Component, Debug)]
struct Debris;

fn setup_scene(
    mut commands: Commands,
    mut rng: ResMut<DeterministicRng>,
    config: Res<GravityWellConfig>,
) {
    let black_hole = FieldController::new(config.field)
        .with_polarity(Polarity::Attract)
        .with_visualization(config.visualization);
    spawn_gravity_well(&mut commands, Vec3::ZERO, black_hole);

    let white_hole = FieldController::new(FieldParameters {
        strength: config.field.strength * 0.5,
        ..config.field
    })
    .with_polarity(Polarity::Repel)
    .with_visualization(config.visualization);
    // Сферы влияния не пересекаются: персонаж всегда под одним полем
    spawn_gravity_well(&mut commands, Vec3::new(4000.0, 0.0, 0.0), white_hole);

    for _ in 0..DEBRIS_COUNT {
        let position = Vec3::new(
            rng.rng.gen_range(-1500.0..5500.0),
            rng.rng.gen_range(0.0..600.0),
            rng.rng.gen_range(-1500.0..1500.0),
        );
        let mass = rng.rng.gen_range(1.0..20.0);
        commands.spawn((
            Debris,
            Transform::from_translation(position),
            RigidBody::Dynamic,
            Collider::ball(15.0),
            ColliderMassProperties::Mass(mass),
            Velocity::zero(),
        ));
    }

    spawn_character(&mut commands, Vec3::new(-900.0, 0.0, 0.0));
}

/// Headless stand-in для rapier step: a = F/m, Euler
fn integrate_debris(
    mut query: Query<(&ExternalForce, &ColliderMassProperties, &mut Velocity, &mut Transform), With<Debris>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (force, mass, mut velocity, mut transform) in query.iter_mut() {
        let ColliderMassProperties::Mass(mass) = *mass else {
            continue;
        };
        if mass <= 0.0 {
            continue;
        }
        velocity.linvel += force.force / mass * delta;
        transform.translation += velocity.linvel * delta;
    }
}

fn report_character_transitions(
    mut entered: EventReader<CharacterEnteredField>,
    mut left: EventReader<CharacterLeftField>,
) {
    for event in entered.read() {
        log_info(&format!("{:?} captured by well {:?}", event.character, event.field));
    }
    for event in left.read() {
        log_info(&format!("{:?} released by well {:?}", event.character, event.field));
    }
}

fn main() {
    println!("Starting gravity well headless simulation (seed: {})", SEED);

    let mut app = create_headless_app(SEED);
    app.add_plugins(SimulationPlugin)
        .add_systems(Startup, setup_scene.after(gravity_well_simulation::config::load_gravity_well_config))
        .add_systems(
            FixedUpdate,
            (integrate_debris, report_character_transitions)
                .after(gravity_well_simulation::GravityWellSet),
        );

    for tick in 0..TICKS {
        app.update();

        if tick % 100 == 0 {
            let world = app.world_mut();
            let mut characters = world.query::<(&CharacterMovement, &Transform)>();
            for (movement, transform) in characters.iter(world) {
                println!(
                    "Tick {}: character at {:?}, mode {:?}, gravity scale {:.2}",
                    tick, transform.translation, movement.movement_mode, movement.gravity_scale
                );
            }
        }
    }

    println!("Simulation complete!");
}
