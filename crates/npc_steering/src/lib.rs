//! NPC Steering
//!
//! Автономное поведение персонажа на Bevy 0.16:
//! Idle / Wandering (walk, jog) / Fleeing FSM + seek, obstacle avoidance, flee.
//!
//! Слои:
//! - `steering` — чистая логика агента (Agent, SteeringConfig, WorldQuery, SteeringClock)
//! - `ai` — ECS обвязка (компоненты, ThreatEvent, FixedUpdate системы)
//! - `physics` — backends: headless ArenaWorld и Rapier (query pipeline + sensors)
//! - `logger` — глобальный logger с уровнями

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod logger;
pub mod physics;
pub mod steering;

// Re-export базовых типов для удобства
pub use ai::{
    LocomotionChanged, LocomotionHint, SteeringAgent, SteeringPlugin, SteeringSet,
    SteeringWorldPlugin, ThreatEvent,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_level, log_warning, log_with_level, set_log_level,
    set_logger, set_logger_if_needed, ConsoleLogger, LogLevel, LogPrinter,
};
pub use physics::{ArenaWorld, RapierSteeringPlugin};
pub use steering::{
    Agent, AgentState, CalmMode, Gait, Lifecycle, Locomotion, SteeringConfig, SteeringError,
    SteeringOutput, WorldQuery,
};

/// Главный plugin симуляции
///
/// Fixed timestep + seeded RNG + SteeringPlugin.
/// Backend (`SteeringWorldPlugin::<W>` или `RapierSteeringPlugin`) добавляется отдельно.
pub struct SteeringSimulationPlugin;

impl Plugin for SteeringSimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для steering tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .add_plugins(SteeringPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Единственный источник случайности для выбора режимов, таймеров и целей.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// SteeringSimulationPlugin уже подключён (seed переопределён), backend — на вызывающей стороне.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, SteeringSimulationPlugin))
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Один FixedUpdate тик без wall-clock
///
/// `app.update()` зависит от реального времени (сколько fixed шагов накопилось),
/// для детерминированных тестов двигаем `Time<Fixed>` вручную.
/// Steering события свапаются перед тиком (как в First), поэтому
/// `iter_current_update_events` после вызова видит только события этого тика.
pub fn run_fixed_tick(app: &mut App) {
    let world = app.world_mut();
    update_events::<ThreatEvent>(world);
    update_events::<LocomotionChanged>(world);

    let timestep = world.resource::<Time<Fixed>>().timestep();
    world.resource_mut::<Time<Fixed>>().advance_by(timestep);
    world.run_schedule(FixedUpdate);
}

fn update_events<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}

/// Spawn headless агента (без коллайдеров)
pub fn spawn_steering_agent(commands: &mut Commands, position: Vec3, config: SteeringConfig) -> Entity {
    commands
        .spawn((
            SteeringAgent::new(position, config),
            Transform::from_translation(position),
        ))
        .id()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
