//! Steering AI components (agent, locomotion hint).

use bevy::prelude::*;

use crate::steering::{Agent, Locomotion, SteeringConfig};

/// Component: steering агент
///
/// Transform — authoritative позиция: перед каждым тиком поза агента
/// синхронизируется из Transform, после тика результат пишется обратно.
#[derive(Component, Debug, Clone, Reflect, Deref, DerefMut)]
#[reflect(Component)]
#[require(Transform, LocomotionHint)]
pub struct SteeringAgent(pub Agent);

impl SteeringAgent {
    pub fn new(position: Vec3, config: SteeringConfig) -> Self {
        Self(Agent::new(position, config))
    }
}

impl Default for SteeringAgent {
    fn default() -> Self {
        Self::new(Vec3::ZERO, SteeringConfig::default())
    }
}

/// Component: последний locomotion тег (для анимации хоста)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct LocomotionHint(pub Locomotion);
