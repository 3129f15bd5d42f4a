//! Rapier sensor → ThreatEvent bridge.

use bevy::ecs::entity::Entities;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::ai::ThreatEvent;
use crate::physics::{Threat, ThreatSensor};

/// Система: CollisionEvent (sensor агента × Threat) → ThreatEvent
///
/// Started → Entered с позицией угрозы (GlobalTransform).
/// Stopped → Exited, если второй участник Threat или уже despawned (REMOVED).
/// Остальные пары (земля, другие агенты) игнорируются.
pub fn bridge_threat_triggers(
    mut collision_events: EventReader<CollisionEvent>,
    sensors: Query<&ThreatSensor>,
    threats: Query<&GlobalTransform, With<Threat>>,
    entities: &Entities,
    mut threat_events: EventWriter<ThreatEvent>,
) {
    for event in collision_events.read() {
        match *event {
            CollisionEvent::Started(a, b, _) => {
                let Some((sensor, other)) = sensor_pair(&sensors, a, b) else {
                    continue;
                };
                let Ok(threat_transform) = threats.get(other) else {
                    continue;
                };

                threat_events.write(ThreatEvent::Entered {
                    agent: sensor.agent,
                    threat_position: threat_transform.translation(),
                });
            }
            CollisionEvent::Stopped(a, b, flags) => {
                let Some((sensor, other)) = sensor_pair(&sensors, a, b) else {
                    continue;
                };

                let threat_gone =
                    flags.contains(CollisionEventFlags::REMOVED) && !entities.contains(other);
                if threats.contains(other) || threat_gone {
                    threat_events.write(ThreatEvent::Exited { agent: sensor.agent });
                }
            }
        }
    }
}

/// (sensor, второй участник) в любом порядке
fn sensor_pair<'a>(
    sensors: &'a Query<&ThreatSensor>,
    a: Entity,
    b: Entity,
) -> Option<(&'a ThreatSensor, Entity)> {
    if let Ok(sensor) = sensors.get(a) {
        return Some((sensor, b));
    }
    sensors.get(b).ok().map(|sensor| (sensor, a))
}
