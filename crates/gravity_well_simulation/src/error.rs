//! Ошибки симуляции
//!
//! Tick-путь ничего не пробрасывает наружу: ошибки логируются, а шаг
//! деградирует до "нет эффекта". `SimResult` используется валидацией
//! параметров и загрузкой конфига.

use bevy::prelude::Entity;
use std::fmt;

#[derive(Debug)]
pub enum SimError {
    /// Параметр поля вне допустимого диапазона (исправляется на safe значение)
    InvalidParameter {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    /// Персонаж в tracked-наборе, но сохранённого locomotion state нет
    MissingOverrideEntry { character: Entity },

    /// Entity не найдена (despawn race между системами)
    EntityNotFound { context: &'static str },

    /// Файл конфига не читается
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    /// Файл конфига прочитан, но TOML невалиден
    ConfigParse {
        path: String,
        source: toml::de::Error,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidParameter {
                name,
                value,
                expected,
            } => write!(
                f,
                "field parameter '{}' = {} is invalid (expected {})",
                name, value, expected
            ),
            SimError::MissingOverrideEntry { character } => write!(
                f,
                "character {:?} is tracked without a saved locomotion state",
                character
            ),
            SimError::EntityNotFound { context } => {
                write!(f, "entity not found during '{}'", context)
            }
            SimError::ConfigRead { path, source } => {
                write!(f, "failed to read config {}: {}", path, source)
            }
            SimError::ConfigParse { path, source } => {
                write!(f, "failed to parse config {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::ConfigRead { source, .. } => Some(source),
            SimError::ConfigParse { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = SimError::InvalidParameter {
            name: "tick_interval",
            value: 0.001,
            expected: ">= 0.005",
        };
        let text = err.to_string();
        assert!(text.contains("tick_interval"));
        assert!(text.contains(">= 0.005"));
    }

    #[test]
    fn test_config_read_has_source() {
        let err = SimError::ConfigRead {
            path: "assets/missing.toml".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
