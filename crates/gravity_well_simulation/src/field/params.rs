//! Параметры поля (задаются один раз на инстанс, editor-time)
//!
//! Невалидные значения не отвергаются, а исправляются на safe значения:
//! поле должно стартовать, пусть и с пониженной точностью.

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::SimError;

/// Минимальный интервал тика поля (секунды)
pub const MIN_TICK_INTERVAL: f32 = 0.005;

/// Максимальный интервал тика: больше не влезает в таймер без риска
pub const MAX_TICK_INTERVAL: f32 = 3600.0;

/// Fallback интервал, если задан вне диапазона
pub const DEFAULT_TICK_INTERVAL: f32 = 0.03;

/// Порог "почти ноль" для расстояний, масс, dt и ускорений
pub const SMALL_NUMBER: f32 = 1.0e-4;

/// Минимальный внутренний радиус (защита от сингулярности в центре)
pub const MIN_INNER_RADIUS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Deserialize)]
#[serde(default)]
pub struct FieldParameters {
    /// Числитель закона обратных квадратов
    pub strength: f32,
    /// Внешний радиус: дальше ускорение нулевое
    pub max_radius: f32,
    /// Внутренний радиус: расстояние не считается меньше этого
    pub min_radius: f32,
    /// Ограничение длины вектора ускорения
    pub max_accel: f32,
    /// Секунды между шагами поля
    pub tick_interval: f32,
    pub affect_rigid_bodies: bool,
    pub affect_characters: bool,
}

impl Default for FieldParameters {
    fn default() -> Self {
        Self {
            strength: 3_000_000.0,
            max_radius: 1500.0,
            min_radius: 150.0,
            max_accel: 6000.0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            affect_rigid_bodies: true,
            affect_characters: true,
        }
    }
}

impl FieldParameters {
    /// Радиус сферы влияния (до учёта scale)
    pub fn influence_radius(&self) -> f32 {
        self.max_radius.max(0.0)
    }

    /// Интервал тика с fallback на default (NaN, inf и вне диапазона)
    pub fn effective_tick_interval(&self) -> f32 {
        if (MIN_TICK_INTERVAL..=MAX_TICK_INTERVAL).contains(&self.tick_interval) {
            self.tick_interval
        } else {
            DEFAULT_TICK_INTERVAL
        }
    }

    /// Возвращает исправленную копию и список исправлений (для логов)
    ///
    /// NaN трактуется как нарушение нижней границы.
    pub fn sanitized(&self) -> (Self, Vec<SimError>) {
        let mut fixed = *self;
        let mut corrections = Vec::new();

        clamp_min(&mut fixed.strength, 0.0, "strength", ">= 0", &mut corrections);
        clamp_min(&mut fixed.max_radius, 0.0, "max_radius", ">= 0", &mut corrections);
        clamp_min(
            &mut fixed.min_radius,
            MIN_INNER_RADIUS,
            "min_radius",
            ">= 1",
            &mut corrections,
        );
        clamp_min(&mut fixed.max_accel, 0.0, "max_accel", ">= 0", &mut corrections);

        let tick_interval = fixed.effective_tick_interval();
        if tick_interval != fixed.tick_interval {
            corrections.push(SimError::InvalidParameter {
                name: "tick_interval",
                value: fixed.tick_interval,
                expected: "in [0.005, 3600]",
            });
            fixed.tick_interval = tick_interval;
        }

        (fixed, corrections)
    }
}

fn clamp_min(
    value: &mut f32,
    min: f32,
    name: &'static str,
    expected: &'static str,
    corrections: &mut Vec<SimError>,
) {
    if !(*value >= min) {
        corrections.push(SimError::InvalidParameter {
            name,
            value: *value,
            expected,
        });
        *value = min;
    }
}
