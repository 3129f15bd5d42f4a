//! Steering tick systems.

use bevy::prelude::*;

use crate::ai::{LocomotionChanged, LocomotionHint, SteeringAgent};
use crate::steering::{Agent, RngClock, SteeringClock, WorldQuery};
use crate::DeterministicRng;

/// Система: один steering тик для всех агентов с WorldQuery из ресурса
///
/// Используется headless симуляцией (`ArenaWorld`) и тестами.
/// Rapier вариант — `physics::steer_agents_rapier`.
pub fn steer_agents<W: WorldQuery + Resource>(
    world_query: Res<W>,
    mut agents: Query<(Entity, &mut SteeringAgent, &mut Transform, &mut LocomotionHint)>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut locomotion_events: EventWriter<LocomotionChanged>,
) {
    let dt = time.delta_secs();
    let now = time.elapsed_secs();

    for (entity, mut steering, mut transform, mut hint) in agents.iter_mut() {
        let mut clock = RngClock::new(now, &mut rng.rng);
        drive_agent(
            entity,
            &mut steering.0,
            &mut transform,
            &mut hint,
            dt,
            &*world_query,
            &mut clock,
            &mut locomotion_events,
        );
    }
}

/// Transform → Agent → advance → Transform + LocomotionHint
pub(crate) fn drive_agent<W, C>(
    entity: Entity,
    agent: &mut Agent,
    transform: &mut Transform,
    hint: &mut LocomotionHint,
    dt: f32,
    world: &W,
    clock: &mut C,
    locomotion_events: &mut EventWriter<LocomotionChanged>,
) where
    W: WorldQuery + ?Sized,
    C: SteeringClock + ?Sized,
{
    if agent.is_disabled() {
        return;
    }

    agent.set_pose(transform.translation, transform.rotation);
    let output = agent.advance(dt, world, clock);

    transform.translation = output.position;
    transform.rotation = output.orientation;

    if hint.0 != output.locomotion {
        crate::log(&format!(
            "Steering: {:?} {} → {}",
            entity, hint.0, output.locomotion
        ));
        locomotion_events.write(LocomotionChanged {
            entity,
            from: hint.0,
            to: output.locomotion,
        });
        hint.0 = output.locomotion;
    }
}
