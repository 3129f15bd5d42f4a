//! RapierWorldQuery — WorldQuery поверх Rapier query pipeline
//!
//! - Bounds test: ball probe (WALKABLE_PROBE_RADIUS) пересекает коллайдер с `Walkable`
//! - Obstacle ray: `cast_ray_and_get_normal`, исключая себя, сенсоры и Walkable землю
//!
//! КРИТИЧНО: нужен RapierPhysicsPlugin (DefaultRapierContext). Без него
//! steer_agents_rapier один раз логирует MissingPhysicsContext и пропускает тики.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::ai::{systems::drive_agent, LocomotionChanged, LocomotionHint, SteeringAgent};
use crate::physics::Walkable;
use crate::steering::{HitInfo, RngClock, SteeringError, WorldQuery};
use crate::DeterministicRng;

/// Радиус probe сферы для bounds теста (метры)
pub const WALKABLE_PROBE_RADIUS: f32 = 0.1;

/// WorldQuery для одного агента (self-exclusion по его Entity)
pub struct RapierWorldQuery<'a> {
    context: &'a RapierContext<'a>,
    probe: &'a Collider,
    is_walkable: &'a dyn Fn(Entity) -> bool,
    agent: Entity,
}

impl<'a> RapierWorldQuery<'a> {
    pub fn new(
        context: &'a RapierContext<'a>,
        probe: &'a Collider,
        is_walkable: &'a dyn Fn(Entity) -> bool,
        agent: Entity,
    ) -> Self {
        Self {
            context,
            probe,
            is_walkable,
            agent,
        }
    }
}

impl WorldQuery for RapierWorldQuery<'_> {
    /// min_distance не используется: probe фиксированного радиуса, как у overlap sphere
    fn is_within_bounds(&self, position: Vec3, _min_distance: f32) -> bool {
        let mut walkable = false;

        self.context.intersect_shape(
            position,
            Quat::IDENTITY,
            &*self.probe.raw,
            QueryFilter::default()
                .exclude_collider(self.agent)
                .exclude_sensors(),
            |entity| {
                if (self.is_walkable)(entity) {
                    walkable = true;
                    false // нашли землю — останавливаем перебор
                } else {
                    true
                }
            },
        );

        walkable
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<HitInfo> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let is_obstacle = |entity: Entity| !(self.is_walkable)(entity);
        let filter = QueryFilter::default()
            .exclude_collider(self.agent)
            .exclude_sensors()
            .predicate(&is_obstacle);

        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
            .map(|(_, intersection)| HitInfo {
                normal: intersection.normal,
            })
    }
}

/// Система: steering тик с Rapier WorldQuery
pub fn steer_agents_rapier(
    rapier_context: ReadRapierContext,
    walkable: Query<(), With<Walkable>>,
    mut agents: Query<(Entity, &mut SteeringAgent, &mut Transform, &mut LocomotionHint)>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut locomotion_events: EventWriter<LocomotionChanged>,
    mut missing_context_logged: Local<bool>,
) {
    let Ok(context) = rapier_context.single() else {
        if !*missing_context_logged {
            crate::log_error(&format!("Steering: {}", SteeringError::MissingPhysicsContext));
            *missing_context_logged = true;
        }
        return;
    };

    let dt = time.delta_secs();
    let now = time.elapsed_secs();
    let probe = Collider::ball(WALKABLE_PROBE_RADIUS);
    let is_walkable = |entity: Entity| walkable.contains(entity);

    for (entity, mut steering, mut transform, mut hint) in agents.iter_mut() {
        let world = RapierWorldQuery::new(&context, &probe, &is_walkable, entity);
        let mut clock = RngClock::new(now, &mut rng.rng);

        drive_agent(
            entity,
            &mut steering.0,
            &mut transform,
            &mut hint,
            dt,
            &world,
            &mut clock,
            &mut locomotion_events,
        );
    }
}
