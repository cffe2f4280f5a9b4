//! Визуализация поля (косметика, в физику не возвращается)
//!
//! Поле раз в тик отдаёт `(radius, strength, pulse)` наружу; host
//! прокидывает их в материал/VFX. Pulse = фаза аккумулятора × intensity.

use bevy::prelude::*;
use serde::Deserialize;

use super::params::{FieldParameters, SMALL_NUMBER};

/// Аккумулятор сбрасывается по модулю 1, когда перерастает этот порог
const PULSE_WRAP_THRESHOLD: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Deserialize)]
#[serde(default)]
pub struct VisualizationSettings {
    pub enabled: bool,
    /// Циклов пульсации в секунду
    pub pulse_speed: f32,
    pub pulse_intensity: f32,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            pulse_speed: 0.5,
            pulse_intensity: 1.0,
        }
    }
}

/// Скалярные параметры для visualization sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationParams {
    pub radius: f32,
    pub strength: f32,
    pub pulse: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PulseAccumulator {
    accumulated: f32,
}

impl PulseAccumulator {
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    /// Продвигает фазу и возвращает значение pulse параметра
    pub fn advance(&mut self, delta_seconds: f32, settings: &VisualizationSettings) -> f32 {
        let speed = settings.pulse_speed.max(0.0);
        self.accumulated += delta_seconds * speed;
        if self.accumulated > PULSE_WRAP_THRESHOLD {
            self.accumulated = self.accumulated.rem_euclid(1.0);
        }

        let phase = if speed <= SMALL_NUMBER {
            0.0
        } else {
            self.accumulated.rem_euclid(1.0)
        };
        phase * settings.pulse_intensity
    }

    /// Параметры для sink'а; `None`, если визуализация выключена
    pub fn sample(
        &mut self,
        delta_seconds: f32,
        settings: &VisualizationSettings,
        params: &FieldParameters,
    ) -> Option<VisualizationParams> {
        if !settings.enabled {
            return None;
        }

        let pulse = self.advance(delta_seconds, settings);
        Some(VisualizationParams {
            radius: params.max_radius,
            strength: params.strength,
            pulse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_phase_wraps_to_unit_interval() {
        let settings = VisualizationSettings {
            pulse_speed: 1.0,
            pulse_intensity: 2.0,
            ..default()
        };
        let mut pulse = PulseAccumulator::default();

        let first = pulse.advance(0.25, &settings);
        assert!((first - 0.5).abs() < 1e-5);

        let wrapped = pulse.advance(1.0, &settings);
        assert!((wrapped - 0.5).abs() < 1e-5, "1.25 → фаза 0.25 × 2");
    }

    #[test]
    fn test_zero_speed_gives_zero_pulse() {
        let settings = VisualizationSettings {
            pulse_speed: 0.0,
            ..default()
        };
        let mut pulse = PulseAccumulator::default();
        assert_eq!(pulse.advance(10.0, &settings), 0.0);
    }

    #[test]
    fn test_accumulator_stays_bounded() {
        let settings = VisualizationSettings {
            pulse_speed: 100.0,
            ..default()
        };
        let mut pulse = PulseAccumulator::default();
        for _ in 0..50 {
            pulse.advance(1.0, &settings);
        }
        assert!(pulse.accumulated() <= PULSE_WRAP_THRESHOLD + 100.0);
    }

    #[test]
    fn test_disabled_visualization_samples_nothing() {
        let settings = VisualizationSettings {
            enabled: false,
            ..default()
        };
        let mut pulse = PulseAccumulator::default();
        assert!(pulse
            .sample(0.03, &settings, &FieldParameters::default())
            .is_none());
    }

    #[test]
    fn test_sample_carries_field_parameters() {
        let params = FieldParameters::default();
        let mut pulse = PulseAccumulator::default();
        let sample = pulse
            .sample(0.0, &VisualizationSettings::default(), &params)
            .unwrap();
        assert_eq!(sample.radius, params.max_radius);
        assert_eq!(sample.strength, params.strength);
        assert_eq!(sample.pulse, 0.0);
    }
}
