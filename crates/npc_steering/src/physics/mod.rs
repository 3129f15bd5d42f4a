//! Physics backends для steering
//!
//! - `ArenaWorld` — headless арена без физического движка
//! - Rapier: kinematic capsule агента + sensor сфера угроз,
//!   WorldQuery через query pipeline, CollisionEvent → ThreatEvent

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub mod arena;
pub mod rapier_query;
pub mod triggers;

// Re-export основных типов
pub use arena::{ArenaWorld, SphereObstacle};
pub use rapier_query::{steer_agents_rapier, RapierWorldQuery, WALKABLE_PROBE_RADIUS};
pub use triggers::bridge_threat_triggers;

use crate::ai::{SteeringAgent, SteeringSet};
use crate::steering::SteeringConfig;

/// Проходимая поверхность (земля, навмеш-заменитель)
///
/// Bounds test агента проходит только если probe касается коллайдера с этим маркером.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Walkable;

/// Источник угрозы (игрок, хищник). Нужен коллайдер.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Threat;

/// Sensor сфера агента (child entity), указывает на владельца
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ThreatSensor {
    pub agent: Entity,
}

/// Rapier backend plugin
///
/// Требует `RapierPhysicsPlugin` (добавляется хостом, чтобы он сам выбрал schedule).
/// Sense: CollisionEvent → ThreatEvent. Steer: тик агентов через RapierWorldQuery.
pub struct RapierSteeringPlugin;

impl Plugin for RapierSteeringPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Walkable>()
            .register_type::<Threat>()
            .register_type::<ThreatSensor>()
            .add_event::<CollisionEvent>()
            .add_systems(
                FixedUpdate,
                (
                    bridge_threat_triggers.in_set(SteeringSet::Sense),
                    steer_agents_rapier.in_set(SteeringSet::Steer),
                ),
            );
    }
}

/// Spawn helper для steering персонажа
///
/// Создает entity с полным набором компонентов:
/// - SteeringAgent (+ Transform, LocomotionHint через require)
/// - Rapier: KinematicPositionBased + capsule
/// - Child: sensor сфера радиусом `avoidance_radius` (ThreatSensor)
///
/// `position` — pivot на уровне земли (bounds probe проверяется на этой высоте).
pub fn spawn_steering_character(
    commands: &mut Commands,
    position: Vec3,
    config: SteeringConfig,
) -> Entity {
    let sensor_radius = config.avoidance_radius.max(0.0);

    let agent = commands
        .spawn((
            SteeringAgent::new(position, config),
            Transform::from_translation(position),
            // Rapier physics
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.4), // Высота 1.0m (0.5 + 0.5), радиус 0.4m
        ))
        .id();

    commands.entity(agent).with_child((
        ThreatSensor { agent },
        Transform::default(),
        Collider::ball(sensor_radius),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        ActiveCollisionTypes::all(), // kinematic/fixed угрозы тоже детектим
    ));

    agent
}

/// Плоская проходимая земля (cuboid толщиной 0.2m, верх на y = 0)
pub fn spawn_walkable_ground(commands: &mut Commands, half_extent: f32) -> Entity {
    commands
        .spawn((
            Walkable,
            Transform::from_xyz(0.0, -0.1, 0.0),
            RigidBody::Fixed,
            Collider::cuboid(half_extent, 0.1, half_extent),
        ))
        .id()
}

/// Угроза: kinematic сфера, двигается хостом через Transform
pub fn spawn_threat(commands: &mut Commands, position: Vec3, radius: f32) -> Entity {
    commands
        .spawn((
            Threat,
            Transform::from_translation(position),
            RigidBody::KinematicPositionBased,
            Collider::ball(radius),
        ))
        .id()
}
