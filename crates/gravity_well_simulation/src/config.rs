//! Runtime конфиг гравитационных полей (TOML)
//!
//! Файл: `assets/gravity_well.toml`. Все поля опциональны: отсутствующие
//! берутся из compiled defaults. Нет файла → defaults (info), битый файл →
//! defaults (warning).

use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::field::{FieldParameters, Polarity, VisualizationSettings};
use crate::logger::{self, LogLevel};

pub const DEFAULT_CONFIG_PATH: &str = "assets/gravity_well.toml";

#[derive(Resource, Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GravityWellConfig {
    /// Параметры полей, которые спавнят projectiles без своих параметров
    pub field: FieldParameters,
    /// true → projectiles по умолчанию спавнят white hole (отталкивание)
    pub white_hole: bool,
    pub visualization: VisualizationSettings,
    pub log_level: LogLevel,
}

impl Default for GravityWellConfig {
    fn default() -> Self {
        Self {
            field: FieldParameters::default(),
            white_hole: false,
            visualization: VisualizationSettings::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl GravityWellConfig {
    pub fn from_toml_str(source: &str, path: &str) -> SimResult<Self> {
        toml::from_str(source).map_err(|source| SimError::ConfigParse {
            path: path.to_string(),
            source,
        })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source, &path.display().to_string())
    }

    /// Полярность для projectile-spawned полей
    pub fn default_polarity(&self) -> Polarity {
        if self.white_hole {
            Polarity::Repel
        } else {
            Polarity::Attract
        }
    }
}

/// Путь к файлу конфига (resource, чтобы тесты/host могли подменить)
#[derive(Resource, Debug, Clone)]
pub struct GravityWellConfigPath(pub String);

impl Default for GravityWellConfigPath {
    fn default() -> Self {
        Self(DEFAULT_CONFIG_PATH.to_string())
    }
}

/// Startup system: загрузка конфига + применение log level
pub fn load_gravity_well_config(mut commands: Commands, path: Res<GravityWellConfigPath>) {
    let config = match GravityWellConfig::load_from_path(&path.0) {
        Ok(config) => {
            logger::log_info(&format!("Loaded gravity well config from {}", path.0));
            config
        }
        Err(SimError::ConfigRead { path, .. }) => {
            logger::log_info(&format!("No gravity well config at {}, using defaults", path));
            GravityWellConfig::default()
        }
        Err(err) => {
            logger::log_warning(&format!("{}; using defaults", err));
            GravityWellConfig::default()
        }
    };

    logger::set_log_level(config.log_level);
    commands.insert_resource(config);
}
