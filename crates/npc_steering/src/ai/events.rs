//! AI Events — входящие threat сигналы и исходящие animation hints
//!
//! Host trigger (Rapier sensor, Godot Area3D, ...) → ThreatEvent → Agent FSM transitions
//! Agent FSM → LocomotionChanged → анимационная система хоста

use bevy::prelude::*;

use crate::steering::Locomotion;

/// Threat события (edge-triggered)
///
/// Хост отправляет когда:
/// - Entered: угроза вошла в радиус агента
/// - Exited: угроза вышла из радиуса (или despawned)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum ThreatEvent {
    /// Угроза обнаружена
    Entered {
        /// Entity агента (у кого sensor)
        agent: Entity,
        /// Позиция угрозы в момент входа (flee-origin)
        threat_position: Vec3,
    },

    /// Угроза ушла
    Exited {
        /// Entity агента
        agent: Entity,
    },
}

/// Locomotion тег сменился (idle/walk/jog/flee)
///
/// Пишется только при смене, не каждый тик.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocomotionChanged {
    pub entity: Entity,
    pub from: Locomotion,
    pub to: Locomotion,
}
