//! AI decision-making module
//!
//! ECS обвязка над `steering::Agent`: компоненты, threat события, FixedUpdate системы.

use std::marker::PhantomData;

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::{LocomotionHint, SteeringAgent};
pub use events::{LocomotionChanged, ThreatEvent};

use crate::steering::{SteeringConfig, WorldQuery};

/// Порядок steering систем внутри FixedUpdate
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SteeringSet {
    /// Host triggers → ThreatEvent (Rapier bridge)
    Sense,
    /// ThreatEvent → FSM, активация новых агентов
    Decide,
    /// Agent::advance + запись Transform
    Steer,
}

/// AI Plugin
///
/// Регистрирует события и системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. SteeringSet::Sense — мосты от физики (добавляются backend плагином)
/// 2. route_threat_events — Fleeing enter/exit
/// 3. activate_spawned_agents — проверка config + стартовый выбор режима
/// 4. SteeringSet::Steer — тик агентов (добавляется backend плагином)
///
/// Сам по себе агентов не двигает: нужен backend с WorldQuery —
/// `SteeringWorldPlugin::<W>` (ресурс) или `physics::RapierSteeringPlugin`.
pub struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SteeringAgent>()
            .register_type::<LocomotionHint>()
            .register_type::<SteeringConfig>()
            .add_event::<ThreatEvent>()
            .add_event::<LocomotionChanged>()
            .configure_sets(
                FixedUpdate,
                (SteeringSet::Sense, SteeringSet::Decide, SteeringSet::Steer).chain(),
            )
            .add_systems(
                FixedUpdate,
                (systems::route_threat_events, systems::activate_spawned_agents)
                    .chain() // Последовательное выполнение для детерминизма
                    .in_set(SteeringSet::Decide),
            );
    }
}

/// Backend plugin: WorldQuery берётся из ресурса `W`
///
/// ```ignore
/// app.insert_resource(ArenaWorld::square(50.0))
///     .add_plugins((SteeringPlugin, SteeringWorldPlugin::<ArenaWorld>::default()));
/// ```
pub struct SteeringWorldPlugin<W> {
    _world: PhantomData<fn() -> W>,
}

impl<W> Default for SteeringWorldPlugin<W> {
    fn default() -> Self {
        Self { _world: PhantomData }
    }
}

impl<W: WorldQuery + Resource> Plugin for SteeringWorldPlugin<W> {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            systems::steer_agents::<W>.in_set(SteeringSet::Steer),
        );
    }
}
