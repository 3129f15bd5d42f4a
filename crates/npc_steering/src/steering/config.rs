//! Параметры steering агента (скорости, радиусы, таймеры).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::SteeringError;

/// Верхняя граница slerp фактора за тик: поворот никогда не мгновенный
pub const MAX_TURN_FRACTION: f32 = 0.5;

/// Верхняя граница wander_extent (метры)
pub const MAX_WANDER_EXTENT: f32 = f32::MAX / 4.0;

/// Параметры агента
///
/// Default повторяет тюнинг пешехода: walk 3 m/s, jog 5 m/s,
/// смена состояния каждые 5-10 секунд.
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Скорость ходьбы (m/s), также для перебора обходных направлений
    pub walk_speed: f32,
    /// Скорость jog/flee (m/s)
    pub run_speed: f32,
    /// Длина forward луча для обнаружения препятствий (метры)
    pub detection_radius: f32,
    /// Радиус threat sensor'а вокруг агента (метры)
    pub avoidance_radius: f32,
    /// Дистанция "цель достигнута" (метры)
    pub stopping_distance: f32,
    /// Скорость поворота (slerp фактор в секунду)
    pub turn_rate: f32,
    /// Половина стороны квадрата, в котором сэмплируются wander точки
    pub wander_extent: f32,
    /// min_distance для bounds теста кандидатов в цели
    pub target_clearance: f32,
    /// Минимальная длительность состояния (секунды)
    pub state_duration_min: f32,
    /// Максимальная длительность состояния (секунды)
    pub state_duration_max: f32,
    /// Сколько случайных направлений пробуем, если шаг вне bounds
    pub heading_retries: u32,
    /// Разброс yaw для обходных направлений (±градусы)
    pub heading_jitter_degrees: f32,
    /// Сколько кандидатов в цели сэмплируем за один тик
    pub max_target_attempts: u32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            run_speed: 5.0,
            detection_radius: 2.0,
            avoidance_radius: 2.0,
            stopping_distance: 0.5,
            turn_rate: 5.0,
            wander_extent: 10.0,
            target_clearance: 10.0,
            state_duration_min: 5.0,
            state_duration_max: 10.0,
            heading_retries: 10,
            heading_jitter_degrees: 90.0,
            max_target_attempts: 32,
        }
    }
}

impl SteeringConfig {
    /// Парсит JSON (отсутствующие поля берутся из Default) и валидирует.
    pub fn from_json(json: &str) -> Result<Self, SteeringError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверяет что все параметры в допустимом диапазоне.
    pub fn validate(&self) -> Result<(), SteeringError> {
        positive("walk_speed", self.walk_speed)?;
        positive("run_speed", self.run_speed)?;
        positive("stopping_distance", self.stopping_distance)?;
        positive("turn_rate", self.turn_rate)?;
        positive("wander_extent", self.wander_extent)?;
        non_negative("detection_radius", self.detection_radius)?;
        non_negative("avoidance_radius", self.avoidance_radius)?;
        non_negative("target_clearance", self.target_clearance)?;
        non_negative("state_duration_min", self.state_duration_min)?;
        non_negative("heading_jitter_degrees", self.heading_jitter_degrees)?;

        // Ширина [-extent, extent] должна оставаться конечной для сэмплинга
        at_most("wander_extent", self.wander_extent, MAX_WANDER_EXTENT)?;
        at_most("heading_jitter_degrees", self.heading_jitter_degrees, 180.0)?;

        if !self.state_duration_max.is_finite() || self.state_duration_max < self.state_duration_min {
            return Err(SteeringError::invalid(
                "state_duration_max",
                format!(
                    "must be >= state_duration_min ({}), got {}",
                    self.state_duration_min, self.state_duration_max
                ),
            ));
        }

        if self.max_target_attempts == 0 {
            return Err(SteeringError::invalid("max_target_attempts", "must be at least 1"));
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SteeringError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SteeringError::invalid(field, format!("must be > 0, got {}", value)))
    }
}

fn at_most(field: &'static str, value: f32, limit: f32) -> Result<(), SteeringError> {
    if value <= limit {
        Ok(())
    } else {
        Err(SteeringError::invalid(field, format!("must be <= {}, got {}", limit, value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SteeringError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SteeringError::invalid(field, format!("must be >= 0, got {}", value)))
    }
}
