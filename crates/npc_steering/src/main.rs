//! Headless steering симуляция
//!
//! Запускает Bevy App без рендера: арена, несколько агентов, один threat эпизод.
//!
//! Usage: `npc_steering [config.json]` — SteeringConfig из файла (иначе defaults)

use bevy::prelude::*;
use npc_steering::{
    create_headless_app, log, log_error, run_fixed_tick, spawn_steering_agent, ArenaWorld,
    SteeringAgent, SteeringConfig, SteeringWorldPlugin, ThreatEvent,
};

const SEED: u64 = 42;
const AGENT_COUNT: usize = 5;
const TICK_COUNT: usize = 600;
const THREAT_ENTER_TICK: usize = 200;
const THREAT_EXIT_TICK: usize = 400;

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("Config: {}", err));
            std::process::exit(1);
        }
    };

    println!("Starting NPC steering headless simulation (seed: {})", SEED);

    let mut app = create_headless_app(SEED);
    app.insert_resource(
        ArenaWorld::square(25.0)
            .with_obstacle(Vec3::new(5.0, 0.0, 5.0), 2.0)
            .with_obstacle(Vec3::new(-8.0, 0.0, 3.0), 1.5),
    )
    .add_plugins(SteeringWorldPlugin::<ArenaWorld>::default());

    let world = app.world_mut();
    let agents: Vec<Entity> = {
        let mut commands = world.commands();
        (0..AGENT_COUNT)
            .map(|i| {
                let position = Vec3::new(i as f32 * 3.0 - 6.0, 0.0, -5.0);
                spawn_steering_agent(&mut commands, position, config.clone())
            })
            .collect()
    };
    world.flush();

    let threat_position = Vec3::new(-6.0, 0.0, -7.0);

    for tick in 0..TICK_COUNT {
        if tick == THREAT_ENTER_TICK {
            log(&format!("Tick {}: threat appears at {:?}", tick, threat_position));
            app.world_mut().send_event(ThreatEvent::Entered {
                agent: agents[0],
                threat_position,
            });
        }
        if tick == THREAT_EXIT_TICK {
            log(&format!("Tick {}: threat leaves", tick));
            app.world_mut().send_event(ThreatEvent::Exited { agent: agents[0] });
        }

        run_fixed_tick(&mut app);

        if tick % 100 == 0 {
            print_agents(&mut app, tick);
        }
    }

    println!("Simulation complete!");
}

fn load_config() -> Result<SteeringConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(SteeringConfig::from_json(&json)?)
        }
        None => Ok(SteeringConfig::default()),
    }
}

fn print_agents(app: &mut App, tick: usize) {
    let world = app.world_mut();
    let mut query = world.query::<(Entity, &SteeringAgent)>();

    println!("Tick {}:", tick);
    for (entity, agent) in query.iter(world) {
        let position = agent.position();
        println!(
            "  {:?}: {:>5} at ({:.2}, {:.2})",
            entity,
            agent.locomotion().as_str(),
            position.x,
            position.z
        );
    }
}
