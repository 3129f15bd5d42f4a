//! Threat routing + activation systems.

use bevy::prelude::*;

use crate::ai::{SteeringAgent, ThreatEvent};
use crate::steering::RngClock;
use crate::DeterministicRng;

/// Система: ThreatEvent → Agent FSM (any → Fleeing → previous mode)
///
/// Enter+Exit в одном тике взаимно гасятся (FSM идемпотентна по парам).
/// События для despawned/чужих entity пропускаются.
pub fn route_threat_events(
    mut threat_events: EventReader<ThreatEvent>,
    mut agents: Query<&mut SteeringAgent>,
) {
    for event in threat_events.read() {
        match *event {
            ThreatEvent::Entered { agent, threat_position } => {
                let Ok(mut steering) = agents.get_mut(agent) else {
                    continue;
                };

                let was_fleeing = steering.state().is_fleeing();
                steering.on_threat_enter(threat_position);

                if !was_fleeing && steering.state().is_fleeing() {
                    crate::log(&format!(
                        "🚗 {:?} threat entered at {:?} → Fleeing",
                        agent, threat_position
                    ));
                }
            }
            ThreatEvent::Exited { agent } => {
                let Ok(mut steering) = agents.get_mut(agent) else {
                    continue;
                };

                if steering.state().is_fleeing() {
                    steering.on_threat_exit();
                    crate::log(&format!(
                        "✅ {:?} threat exited → {:?}",
                        agent,
                        steering.state()
                    ));
                }
            }
        }
    }
}

/// Система: активация только что заспавненных агентов
///
/// Проверяет SteeringConfig и делает стартовый выбор режима.
/// Невалидный config → агент Disabled (fatal только для этого агента), ошибка в лог.
pub fn activate_spawned_agents(
    mut agents: Query<(Entity, &mut SteeringAgent), Added<SteeringAgent>>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
) {
    let now = time.elapsed_secs();

    for (entity, mut steering) in agents.iter_mut() {
        let mut clock = RngClock::new(now, &mut rng.rng);

        match steering.activate(&mut clock) {
            Ok(()) => crate::log(&format!(
                "Steering: {:?} activated in {:?}",
                entity,
                steering.state()
            )),
            Err(err) => crate::log_error(&format!("Steering: {:?} disabled: {}", entity, err)),
        }
    }
}
