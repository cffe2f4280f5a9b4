//! Модель ускорения поля (strategy)
//!
//! Поле не знает, притягивает оно или отталкивает: контроллер держит
//! `Box<dyn AccelerationModel>` и зовёт его для каждого тела.
//! Новые "flavors" поля = новая реализация trait, tick-логика та же.

use bevy::prelude::*;
use serde::Deserialize;

use super::params::{FieldParameters, SMALL_NUMBER};

/// Ускорение тела в точке `target` от поля с центром `center`
///
/// Чистая функция: без состояния, без side effects.
pub trait AccelerationModel: Send + Sync + 'static {
    fn acceleration(&self, center: Vec3, target: Vec3, params: &FieldParameters) -> Vec3;

    /// Имя для логов
    fn name(&self) -> &'static str;
}

/// Притягивающее поле (black hole): закон обратных квадратов с clamp'ами
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseSquare;

impl AccelerationModel for InverseSquare {
    fn acceleration(&self, center: Vec3, target: Vec3, params: &FieldParameters) -> Vec3 {
        inverse_square_acceleration(center, target, params)
    }

    fn name(&self) -> &'static str {
        "inverse_square"
    }
}

/// Отталкивающее поле (white hole): инвертирует знак внутренней модели
#[derive(Debug, Clone, Copy, Default)]
pub struct Repulsive<M: AccelerationModel = InverseSquare>(pub M);

impl<M: AccelerationModel> AccelerationModel for Repulsive<M> {
    fn acceleration(&self, center: Vec3, target: Vec3, params: &FieldParameters) -> Vec3 {
        -self.0.acceleration(center, target, params)
    }

    fn name(&self) -> &'static str {
        "repulsive"
    }
}

/// Знак поля (для конфига и spawn helpers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Attract,
    Repel,
}

impl Polarity {
    pub fn model(self) -> Box<dyn AccelerationModel> {
        match self {
            Polarity::Attract => Box::new(InverseSquare),
            Polarity::Repel => Box::new(Repulsive(InverseSquare)),
        }
    }
}

/// Базовый расчёт (вынесен из trait для unit-тестов)
///
/// - дальше `max_radius` → ноль
/// - совпадающие точки → ноль (направление не определено)
/// - расстояние не меньше `min_radius`, знаменатель не меньше 1
/// - длина результата ≤ `max_accel`
pub fn inverse_square_acceleration(center: Vec3, target: Vec3, params: &FieldParameters) -> Vec3 {
    let delta = center - target;
    let distance = delta.length();

    if distance > params.max_radius {
        return Vec3::ZERO;
    }

    if distance <= SMALL_NUMBER {
        return Vec3::ZERO;
    }

    let clamped_distance = distance.max(params.min_radius);
    let Some(direction) = delta.try_normalize() else {
        return Vec3::ZERO;
    };

    let magnitude = params.strength / (clamped_distance * clamped_distance).max(1.0);
    (direction * magnitude).clamp_length_max(params.max_accel.max(0.0))
}

/// `IsNearlyZero` для ускорения: все компоненты в пределах порога
pub fn is_negligible(acceleration: Vec3) -> bool {
    acceleration.abs().max_element() <= SMALL_NUMBER
}
