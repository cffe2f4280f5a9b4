//! FieldController: ядро гравитационного поля
//!
//! Состояния:
//! - Inactive: таймера нет, персонажей нет, tick = no-op
//! - Active: repeating timer на `tick_interval`, 0+ персонажей в таблице
//!
//! Порядок внутри одного тика фиксирован:
//! 1. overlap query (сфера влияния, дедупликация примитивов)
//! 2. force (rigid bodies) / velocity (персонажи)
//! 3. обслуживание таблицы override'ов (выход из поля = нет в overlap)
//!
//! Тики одного поля никогда не пересекаются: host зовёт `tick()` столько раз,
//! сколько вернул `advance_timer()`, последовательно.

use std::time::Duration;

use bevy::prelude::*;

use super::acceleration::{is_negligible, AccelerationModel, InverseSquare, Polarity};
use super::collaborators::{
    CategoryFilter, CharacterLocomotion, OverlapHit, OverlapQuery, PhysicsSink, VisualizationSink,
};
use super::overrides::{CharacterGravityOverrideTable, SavedLocomotion};
use super::params::{FieldParameters, SMALL_NUMBER};
use super::visualization::{PulseAccumulator, VisualizationParams, VisualizationSettings};
use crate::error::SimError;
use crate::locomotion::MovementMode;
use crate::logger::{log, log_error, log_info, log_warning};

#[derive(Debug, Default)]
pub enum FieldState {
    #[default]
    Inactive,
    Active {
        timer: Timer,
    },
}

/// Что произошло за один тик (для событий и тестов)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Уникальных примитивов в сфере
    pub overlapping: usize,
    /// Rigid bodies, получивших force
    pub pushed_bodies: usize,
    /// Персонажи, вошедшие в поле на этом тике
    pub entered: Vec<Entity>,
    /// Персонажи, отпущенные на этом тике (вышли или исчезли)
    pub released: Vec<Entity>,
    pub visuals: Option<VisualizationParams>,
}

/// Итог восстановления одного персонажа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Возвращены сохранённые gravity scale + movement mode
    Restored,
    /// Сохранённого state не было: поставлены safe defaults
    Defaulted,
    /// Персонаж уничтожен извне: запись просто удалена
    Stale,
    /// Персонаж не отслеживается: ничего не сделано
    NotTracked,
}

/// Гравитационное поле (black hole / white hole)
#[derive(Component)]
pub struct FieldController {
    params: FieldParameters,
    model: Box<dyn AccelerationModel>,
    visualization: VisualizationSettings,
    overlap_filter: CategoryFilter,
    state: FieldState,
    overrides: CharacterGravityOverrideTable,
    pulse: PulseAccumulator,
    /// Визуализация опубликована при активации и ещё не снята
    visuals_attached: bool,
    influence_radius: f32,
}

impl std::fmt::Debug for FieldController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldController")
            .field("params", &self.params)
            .field("model", &self.model.name())
            .field("state", &self.state)
            .field("tracked_characters", &self.overrides.len())
            .finish()
    }
}

impl FieldController {
    /// Притягивающее поле
    pub fn new(params: FieldParameters) -> Self {
        Self {
            params,
            model: Box::new(InverseSquare),
            visualization: VisualizationSettings::default(),
            overlap_filter: CategoryFilter::GRAVITY_WELL,
            state: FieldState::Inactive,
            overrides: CharacterGravityOverrideTable::new(),
            pulse: PulseAccumulator::default(),
            visuals_attached: false,
            influence_radius: params.influence_radius(),
        }
    }

    pub fn with_model(mut self, model: impl AccelerationModel) -> Self {
        self.model = Box::new(model);
        self
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.model = polarity.model();
        self
    }

    pub fn with_visualization(mut self, settings: VisualizationSettings) -> Self {
        self.visualization = settings;
        self
    }

    pub fn with_overlap_filter(mut self, filter: CategoryFilter) -> Self {
        self.overlap_filter = filter;
        self
    }

    pub fn params(&self) -> &FieldParameters {
        &self.params
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, FieldState::Active { .. })
    }

    pub fn overrides(&self) -> &CharacterGravityOverrideTable {
        &self.overrides
    }

    /// Радиус сферы влияния с учётом scale поля
    pub fn scaled_radius(&self, scale: Vec3) -> f32 {
        self.influence_radius * scale.abs().min_element()
    }

    pub fn acceleration_at(&self, center: Vec3, target: Vec3) -> Vec3 {
        self.model.acceleration(center, target, &self.params)
    }

    /// Текущий период таймера (секунды), если поле активно
    pub fn timer_rate(&self) -> Option<f32> {
        match &self.state {
            FieldState::Active { timer } => Some(timer.duration().as_secs_f32()),
            FieldState::Inactive => None,
        }
    }

    /// dt для Euler-интеграции персонажей, не меньше SMALL_NUMBER
    pub fn tick_delta_seconds(&self) -> f32 {
        self.timer_rate()
            .unwrap_or_else(|| self.params.effective_tick_interval())
            .max(SMALL_NUMBER)
    }

    /// Inactive → Active (повторный вызов перезапускает таймер)
    ///
    /// Невалидные параметры исправляются и логируются. Первый тик
    /// срабатывает на первом же `advance_timer()`.
    pub fn activate(&mut self) -> Option<VisualizationParams> {
        let (params, corrections) = self.params.sanitized();
        for correction in &corrections {
            log_warning(&format!("GravityWell: {}; corrected", correction));
        }
        self.params = params;
        self.influence_radius = params.influence_radius();
        self.pulse.reset();

        let mut timer = Timer::from_seconds(params.tick_interval, TimerMode::Repeating);
        let period = timer.duration();
        timer.set_elapsed(period);
        self.state = FieldState::Active { timer };

        log_info(&format!(
            "GravityWell ({}) activated: radius {:.1}, strength {:.1}, tick {:.3}s",
            self.model.name(),
            self.influence_radius,
            params.strength,
            params.tick_interval
        ));

        let visuals = self.pulse.sample(0.0, &self.visualization, &self.params);
        self.visuals_attached = visuals.is_some();
        visuals
    }

    /// Active → Inactive: таймер останавливается, все персонажи
    /// восстанавливаются, визуализация снимается
    ///
    /// Возвращает отпущенных персонажей. На неактивном поле: no-op.
    pub fn deactivate<L, V>(&mut self, field: Entity, locomotion: &mut L, visuals: &mut V) -> Vec<Entity>
    where
        L: CharacterLocomotion + ?Sized,
        V: VisualizationSink + ?Sized,
    {
        if !self.is_active() && self.overrides.is_empty() {
            return Vec::new();
        }

        self.state = FieldState::Inactive;
        if std::mem::take(&mut self.visuals_attached) {
            visuals.clear(field);
        }
        let released = self.restore_all_characters(locomotion);
        log_info(&format!(
            "GravityWell ({}) deactivated, released {} characters",
            self.model.name(),
            released.len()
        ));
        released
    }

    /// Сколько тиков должно сработать за `delta`
    pub fn advance_timer(&mut self, delta: Duration) -> u32 {
        match &mut self.state {
            FieldState::Active { timer } => {
                timer.tick(delta);
                timer.times_finished_this_tick()
            }
            FieldState::Inactive => 0,
        }
    }

    /// Один шаг поля
    pub fn tick<W>(&mut self, field: Entity, transform: &Transform, world: &mut W) -> TickReport
    where
        W: OverlapQuery + PhysicsSink + CharacterLocomotion,
    {
        let mut report = TickReport::default();
        if !self.is_active() {
            return report;
        }

        let center = transform.translation;
        let delta_seconds = self.tick_delta_seconds();
        report.visuals = self
            .pulse
            .sample(delta_seconds, &self.visualization, &self.params);

        let radius = self.scaled_radius(transform.scale);
        let mut primitives: Vec<OverlapHit> = Vec::new();
        for hit in world.overlap_sphere(center, radius, self.overlap_filter) {
            if !primitives.iter().any(|seen| seen.primitive == hit.primitive) {
                primitives.push(hit);
            }
        }
        report.overlapping = primitives.len();

        log(&format!(
            "GravityWell {:?} ticking with {} overlapping components",
            field,
            primitives.len()
        ));

        let mut overlapping_characters: Vec<Entity> = Vec::new();

        for hit in &primitives {
            // Собственная геометрия поля (визуализация) не притягивается
            if hit.owner == field || hit.primitive == field {
                continue;
            }

            let accel = self.model.acceleration(center, hit.position, &self.params);
            if is_negligible(accel) {
                continue;
            }

            if self.params.affect_rigid_bodies && world.is_simulating(hit.primitive) {
                world.wake(hit.primitive);
                let mass = world.mass(hit.primitive);
                if mass > SMALL_NUMBER {
                    world.apply_force(hit.primitive, accel * mass);
                    report.pushed_bodies += 1;
                    log(&format!(
                        "GravityWell: applied accel {:?} to {:?} (mass {:.2})",
                        accel, hit.primitive, mass
                    ));
                }
            }

            if self.params.affect_characters && world.is_character(hit.owner) {
                let character = hit.owner;
                if !overlapping_characters.contains(&character) {
                    overlapping_characters.push(character);
                }

                if !self.overrides.contains(character) {
                    self.enter_character(character, world);
                    report.entered.push(character);
                }

                world.add_velocity(character, accel * delta_seconds);
                world.notify_velocity_changed(character);
            }
        }

        // Выход из поля: отслеживается, но не в overlap (или уничтожен)
        let departed: Vec<Entity> = self
            .overrides
            .characters()
            .filter(|character| {
                !world.is_alive(*character) || !overlapping_characters.contains(character)
            })
            .collect();

        for character in departed {
            self.restore_character(character, world);
            report.released.push(character);
        }

        report
    }

    fn enter_character<L>(&mut self, character: Entity, locomotion: &mut L)
    where
        L: CharacterLocomotion + ?Sized,
    {
        let saved = match (
            locomotion.gravity_scale(character),
            locomotion.movement_mode(character),
        ) {
            (Some(gravity_scale), Some(movement_mode)) => Some(SavedLocomotion {
                gravity_scale,
                movement_mode,
            }),
            _ => None,
        };

        self.overrides.capture(character, saved);

        if let Some(saved) = saved {
            locomotion.set_gravity_scale(character, 0.0);
            locomotion.set_movement_mode(character, MovementMode::Flying);
            log_info(&format!(
                "{:?} entering gravity well; stored gravity {:.2} mode {}",
                character,
                saved.gravity_scale,
                saved.movement_mode.as_code()
            ));
        }
    }

    /// Восстанавливает одного персонажа и удаляет его запись
    ///
    /// Идемпотентно: повторный вызов вернёт `NotTracked` и ничего не тронет.
    pub fn restore_character<L>(&mut self, character: Entity, locomotion: &mut L) -> RestoreOutcome
    where
        L: CharacterLocomotion + ?Sized,
    {
        let Some(entry) = self.overrides.remove(character) else {
            return RestoreOutcome::NotTracked;
        };

        if !locomotion.is_alive(character) {
            log(&format!(
                "{:?} destroyed while inside gravity well; dropping override",
                character
            ));
            return RestoreOutcome::Stale;
        }

        match entry.saved {
            Some(saved) => {
                locomotion.set_gravity_scale(character, saved.gravity_scale);
                locomotion.set_movement_mode(character, saved.movement_mode);
                log_info(&format!(
                    "{:?} exiting gravity well; restored gravity {:.2} mode {}",
                    character,
                    saved.gravity_scale,
                    saved.movement_mode.as_code()
                ));
                RestoreOutcome::Restored
            }
            None => {
                log_error(&format!(
                    "GravityWell: {}; applying default restore",
                    SimError::MissingOverrideEntry { character }
                ));
                if locomotion.gravity_scale(character).is_some() {
                    locomotion.set_gravity_scale(character, 1.0);
                    locomotion.set_movement_mode(character, MovementMode::Walking);
                }
                RestoreOutcome::Defaulted
            }
        }
    }

    /// Восстанавливает всех отслеживаемых персонажей, таблица пустеет
    pub fn restore_all_characters<L>(&mut self, locomotion: &mut L) -> Vec<Entity>
    where
        L: CharacterLocomotion + ?Sized,
    {
        let tracked: Vec<Entity> = self.overrides.characters().collect();
        for character in &tracked {
            self.restore_character(*character, locomotion);
        }
        self.overrides.clear();
        tracked
    }
}
