//! Activation systems (projectile/weapon state → ECS commands + events)

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::events::*;
use super::projectile::GravityWellProjectile;
use super::weapon::{GravityWellWeapon, TriggerAction};
use crate::config::GravityWellConfig;
use crate::field::{FieldController, FieldDestroyed, WellOwner};
use crate::logger;

/// Despawn, если entity ещё существует (despawn race)
fn despawn_if_exists(commands: &mut Commands, entity: Entity) {
    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.try_despawn();
    }
}

/// Включение black hole: стоп движения, spawn поля, broadcast
fn activate_projectile(
    commands: &mut Commands,
    entity: Entity,
    projectile: &mut GravityWellProjectile,
    transform: &Transform,
    velocity: Option<Mut<Velocity>>,
    config: &GravityWellConfig,
    activated: &mut EventWriter<BlackHoleActivated>,
) {
    if !projectile.begin_activation() {
        return;
    }

    if let Some(mut velocity) = velocity {
        *velocity = Velocity::zero();
    }
    // Без коллизий после активации
    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.remove::<Collider>();
    }

    let params = projectile.params.unwrap_or(config.field);
    let polarity = projectile.polarity.unwrap_or(config.default_polarity());
    let controller = FieldController::new(params)
        .with_polarity(polarity)
        .with_visualization(config.visualization);
    // Поле не child projectile'а: живёт в world space, связь через WellOwner
    let well = commands
        .spawn((
            Name::new("GravityWell"),
            Transform::from_translation(transform.translation + projectile.spawn_offset),
            controller,
            WellOwner(entity),
        ))
        .id();
    projectile.attach_well(well);

    logger::log_info(&format!(
        "Projectile {:?} activated black hole {:?} at {:?}",
        entity, well, transform.translation
    ));
    activated.write(BlackHoleActivated {
        projectile: entity,
        well,
    });
}

/// System: impact → snap к точке + активация (активный projectile игнорирует)
pub fn handle_projectile_impacts(
    mut commands: Commands,
    mut impacts: EventReader<ProjectileImpact>,
    mut projectiles: Query<(&mut GravityWellProjectile, &mut Transform, Option<&mut Velocity>)>,
    config: Res<GravityWellConfig>,
    mut activated: EventWriter<BlackHoleActivated>,
) {
    for impact in impacts.read() {
        let Ok((mut projectile, mut transform, velocity)) = projectiles.get_mut(impact.projectile) else {
            continue;
        };
        if !projectile.reacts_to_impact() {
            continue;
        }

        transform.translation = impact.point;
        activate_projectile(
            &mut commands,
            impact.projectile,
            &mut projectile,
            &transform,
            velocity,
            &config,
            &mut activated,
        );
    }
}

/// System: SetProjectileActive (запросы от weapon или host)
pub fn handle_projectile_requests(
    mut commands: Commands,
    mut requests: EventReader<SetProjectileActive>,
    mut projectiles: Query<(&mut GravityWellProjectile, &Transform, Option<&mut Velocity>)>,
    config: Res<GravityWellConfig>,
    mut activated: EventWriter<BlackHoleActivated>,
    mut deactivated: EventWriter<BlackHoleDeactivated>,
) {
    for request in requests.read() {
        let Ok((mut projectile, transform, velocity)) = projectiles.get_mut(request.projectile) else {
            continue;
        };

        if request.active {
            activate_projectile(
                &mut commands,
                request.projectile,
                &mut projectile,
                transform,
                velocity,
                &config,
                &mut activated,
            );
            continue;
        }

        let plan = projectile.deactivate();
        if plan.broadcast {
            logger::log_info(&format!("Projectile {:?} deactivated black hole", request.projectile));
            deactivated.write(BlackHoleDeactivated {
                projectile: request.projectile,
            });
        }
        if let Some(well) = plan.destroy_well {
            despawn_if_exists(&mut commands, well);
        }
        if plan.destroy_projectile {
            despawn_if_exists(&mut commands, request.projectile);
        }
    }
}

/// System: поле уничтожено кем-то другим → projectile деактивируется
pub fn handle_well_destroyed(
    mut destroyed: EventReader<FieldDestroyed>,
    mut projectiles: Query<&mut GravityWellProjectile>,
    mut deactivated: EventWriter<BlackHoleDeactivated>,
) {
    for event in destroyed.read() {
        let Some(owner) = event.owner else {
            continue;
        };
        let Ok(mut projectile) = projectiles.get_mut(owner) else {
            continue;
        };

        if projectile.handle_well_destroyed(event.field) {
            logger::log_info(&format!(
                "Black hole {:?} of projectile {:?} destroyed externally",
                event.field, owner
            ));
            deactivated.write(BlackHoleDeactivated { projectile: owner });
        }
    }
}

/// Observer: projectile уничтожается → его поле тоже
pub fn on_projectile_removed(
    trigger: Trigger<OnRemove, GravityWellProjectile>,
    mut commands: Commands,
    mut projectiles: Query<&mut GravityWellProjectile>,
    mut deactivated: EventWriter<BlackHoleDeactivated>,
    mut destroyed: EventWriter<ProjectileDestroyed>,
) {
    let entity = trigger.target();
    let Ok(mut projectile) = projectiles.get_mut(entity) else {
        return;
    };

    let teardown = projectile.teardown();
    if teardown.broadcast {
        deactivated.write(BlackHoleDeactivated { projectile: entity });
    }
    if let Some(well) = teardown.destroy_well {
        despawn_if_exists(&mut commands, well);
    }
    destroyed.write(ProjectileDestroyed { projectile: entity });
}

/// System: нажатие спуска → fire / activate / deactivate
pub fn handle_trigger_pulled(
    mut pulls: EventReader<TriggerPulled>,
    mut weapons: Query<&mut GravityWellWeapon>,
    projectiles: Query<&GravityWellProjectile>,
    mut requests: EventWriter<SetProjectileActive>,
    mut fire: EventWriter<FireProjectileIntent>,
) {
    for pull in pulls.read() {
        let Ok(mut weapon) = weapons.get_mut(pull.weapon) else {
            continue;
        };

        let action = weapon.pull_trigger(|entity| {
            projectiles
                .get(entity)
                .ok()
                .map(|projectile| projectile.is_active())
        });

        match action {
            TriggerAction::Deactivate(projectile) => {
                requests.write(SetProjectileActive {
                    projectile,
                    active: false,
                });
            }
            TriggerAction::Activate(projectile) => {
                requests.write(SetProjectileActive {
                    projectile,
                    active: true,
                });
            }
            TriggerAction::Fire => {
                fire.write(FireProjectileIntent { weapon: pull.weapon });
            }
        }
    }
}

/// System: weapon следит за своими projectiles
pub fn track_weapon_projectiles(
    mut fired: EventReader<ProjectileFired>,
    mut activated: EventReader<BlackHoleActivated>,
    mut deactivated: EventReader<BlackHoleDeactivated>,
    mut destroyed: EventReader<ProjectileDestroyed>,
    mut weapons: Query<&mut GravityWellWeapon>,
) {
    for event in fired.read() {
        if let Ok(mut weapon) = weapons.get_mut(event.weapon) {
            weapon.on_fired(event.projectile);
        }
    }

    for event in activated.read() {
        for mut weapon in weapons.iter_mut() {
            weapon.on_activated(event.projectile);
        }
    }

    let released = deactivated
        .read()
        .map(|event| event.projectile)
        .chain(destroyed.read().map(|event| event.projectile));
    for projectile in released {
        for mut weapon in weapons.iter_mut() {
            weapon.forget(projectile);
        }
    }
}
