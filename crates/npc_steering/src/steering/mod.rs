//! Steering core — engine-free конечный автомат NPC
//!
//! Wander (случайные точки + обход препятствий) и Flee (от угрозы).
//! Bevy здесь используется только как источник math/reflect типов;
//! ECS интеграция живёт в `crate::ai`, физика — в `crate::physics`.

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod world_query;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod agent_tests;

pub use agent::{Agent, AgentState, CalmMode, Gait, Lifecycle, Locomotion, SteeringOutput};
pub use clock::{RngClock, SteeringClock};
pub use config::{SteeringConfig, MAX_TURN_FRACTION, MAX_WANDER_EXTENT};
pub use error::SteeringError;
pub use world_query::{HitInfo, WorldQuery};
