//! Ошибки steering слоя.
//!
//! Gameplay ошибки (нет валидной цели, движение заблокировано) сюда НЕ попадают —
//! они деградируют в "агент ничего полезного не сделал в этом тике".
//! Здесь только setup ошибки, которые отключают конкретного агента.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SteeringError {
    /// Параметр SteeringConfig вне допустимого диапазона
    #[error("invalid steering config: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// SteeringConfig не распарсился из JSON
    #[error("failed to parse steering config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Rapier context отсутствует (RapierPhysicsPlugin не подключен)
    #[error("rapier physics context is missing, world queries are unavailable")]
    MissingPhysicsContext,
}

impl SteeringError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
