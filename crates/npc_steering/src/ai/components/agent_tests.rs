//! Tests for steering AI components.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::super::agent::{LocomotionHint, SteeringAgent};
    use crate::steering::{AgentState, Lifecycle, Locomotion, SteeringConfig};

    #[test]
    fn test_steering_agent_default() {
        let agent = SteeringAgent::default();
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.lifecycle(), Lifecycle::Spawned);
        assert_eq!(agent.position(), Vec3::ZERO);
        assert_eq!(agent.config(), &SteeringConfig::default());
    }

    #[test]
    fn test_locomotion_hint_default() {
        assert_eq!(LocomotionHint::default().0, Locomotion::Idle);
    }

    #[test]
    fn test_required_components_are_inserted() {
        let mut world = World::new();
        let entity = world
            .spawn(SteeringAgent::new(Vec3::new(1.0, 0.0, 1.0), SteeringConfig::default()))
            .id();

        assert!(world.get::<Transform>(entity).is_some());
        assert_eq!(world.get::<LocomotionHint>(entity), Some(&LocomotionHint(Locomotion::Idle)));
    }
}
