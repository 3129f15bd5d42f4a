//! Tests for the steering state machine (wander, avoid, flee).

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use approx::assert_relative_eq;
    use bevy::prelude::*;
    use rstest::rstest;

    use super::super::agent::{Agent, AgentState, CalmMode, Gait, Lifecycle, Locomotion};
    use super::super::clock::SteeringClock;
    use super::super::config::SteeringConfig;
    use super::super::world_query::{HitInfo, WorldQuery};

    const DT: f32 = 0.1;

    /// Clock со скриптованными значениями.
    ///
    /// `uniform` берёт дробь из очереди (по умолчанию 0.5) и мапит в [min, max],
    /// `choose` берёт индекс из очереди (по умолчанию 0 → Idle).
    struct ScriptedClock {
        now: f32,
        fractions: VecDeque<f32>,
        picks: VecDeque<usize>,
    }

    impl ScriptedClock {
        fn new() -> Self {
            Self {
                now: 0.0,
                fractions: VecDeque::new(),
                picks: VecDeque::new(),
            }
        }

        fn fractions(mut self, values: &[f32]) -> Self {
            self.fractions.extend(values.iter().copied());
            self
        }

        fn picks(mut self, values: &[usize]) -> Self {
            self.picks.extend(values.iter().copied());
            self
        }

        fn push_fractions(&mut self, values: &[f32]) {
            self.fractions.extend(values.iter().copied());
        }
    }

    impl SteeringClock for ScriptedClock {
        fn now(&self) -> f32 {
            self.now
        }

        fn uniform(&mut self, min: f32, max: f32) -> f32 {
            let fraction = self.fractions.pop_front().unwrap_or(0.5);
            if min >= max {
                return min;
            }
            min + (max - min) * fraction
        }

        fn choose(&mut self, count: usize) -> usize {
            self.picks.pop_front().unwrap_or(0).min(count.saturating_sub(1))
        }
    }

    /// Мир на замыканиях + журнал bounds запросов
    struct StubWorld<F: Fn(Vec3, f32) -> bool> {
        bounds: F,
        hit: Option<HitInfo>,
        queries: RefCell<Vec<(Vec3, f32)>>,
    }

    impl<F: Fn(Vec3, f32) -> bool> StubWorld<F> {
        fn new(bounds: F) -> Self {
            Self {
                bounds,
                hit: None,
                queries: RefCell::new(Vec::new()),
            }
        }

        fn with_hit(mut self, normal: Vec3) -> Self {
            self.hit = Some(HitInfo { normal });
            self
        }

        /// Запросы с min_distance > 0 (кандидаты в цели)
        fn target_queries(&self) -> Vec<(Vec3, f32)> {
            self.queries
                .borrow()
                .iter()
                .copied()
                .filter(|(_, min_distance)| *min_distance > 0.0)
                .collect()
        }
    }

    impl<F: Fn(Vec3, f32) -> bool> WorldQuery for StubWorld<F> {
        fn is_within_bounds(&self, position: Vec3, min_distance: f32) -> bool {
            self.queries.borrow_mut().push((position, min_distance));
            (self.bounds)(position, min_distance)
        }

        fn raycast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<HitInfo> {
            self.hit
        }
    }

    fn open_world() -> StubWorld<impl Fn(Vec3, f32) -> bool> {
        StubWorld::new(|_, _| true)
    }

    fn pick_index(mode: CalmMode) -> usize {
        match mode {
            CalmMode::Idle => 0,
            CalmMode::Wander(Gait::Walk) => 1,
            CalmMode::Wander(Gait::Jog) => 2,
        }
    }

    /// Активированный агент в origin в заданном режиме (таймер = 7.5)
    fn active_agent(mode: CalmMode) -> Agent {
        let mut agent = Agent::new(Vec3::ZERO, SteeringConfig::default());
        let mut clock = ScriptedClock::new().picks(&[pick_index(mode)]);
        agent.activate(&mut clock).expect("default config is valid");
        agent
    }

    #[test]
    fn test_new_agent_is_idle_and_spawned() {
        let agent = Agent::new(Vec3::new(1.0, 0.0, 2.0), SteeringConfig::default());
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.lifecycle(), Lifecycle::Spawned);
        assert_eq!(agent.target(), None);
        assert_eq!(agent.locomotion(), Locomotion::Idle);
    }

    #[test]
    fn test_activation_schedules_state_change() {
        let mut agent = Agent::new(Vec3::ZERO, SteeringConfig::default());
        let mut clock = ScriptedClock::new().fractions(&[0.2]).picks(&[2]);
        clock.now = 3.0;

        agent.activate(&mut clock).expect("valid config");

        assert_eq!(agent.lifecycle(), Lifecycle::Active);
        assert_eq!(agent.state(), AgentState::Wandering { gait: Gait::Jog });
        // 3.0 + (5 + 5 * 0.2)
        assert_relative_eq!(agent.next_state_change(), 9.0);
    }

    #[test]
    fn test_idle_never_moves() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = open_world();
        let mut clock = ScriptedClock::new();

        for tick in 0..70 {
            clock.now = tick as f32 * DT; // < 7.5
            let output = agent.advance(DT, &world, &mut clock);
            assert_eq!(output.position, Vec3::ZERO);
            assert_eq!(output.state, AgentState::Idle);
            assert_eq!(output.locomotion, Locomotion::Idle);
            assert_eq!(agent.target(), None);
        }
    }

    #[test]
    fn test_idle_timer_expiry_picks_new_mode() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = open_world();
        let mut clock = ScriptedClock::new().fractions(&[0.5, 1.0, 0.5]).picks(&[1]);
        clock.now = 8.0;

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.state, AgentState::Wandering { gait: Gait::Walk });
        assert_relative_eq!(agent.next_state_change(), 15.5);
        assert_eq!(agent.target(), Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_open_world_accepts_first_target_and_moves() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = open_world();
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]);

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(world.target_queries().len(), 1);
        assert_eq!(agent.target(), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(output.position.x, 0.3, epsilon = 1e-5); // walk 3 m/s * 0.1
        assert_relative_eq!(output.position.z, 0.0, epsilon = 1e-5);
        assert_eq!(output.locomotion, Locomotion::Walk);
    }

    #[test]
    fn test_jog_uses_run_speed() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Jog));
        let world = open_world();
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]);

        let output = agent.advance(DT, &world, &mut clock);

        assert_relative_eq!(output.position.x, 0.5, epsilon = 1e-5); // run 5 m/s * 0.1
        assert_eq!(output.locomotion, Locomotion::Jog);
    }

    #[test]
    fn test_target_accepted_only_after_bounds_pass() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = StubWorld::new(|p: Vec3, min_distance: f32| min_distance == 0.0 || p.x > 5.0);
        // Кандидат 1: x = -5 (reject), кандидат 2: x = 10 (accept)
        let mut clock = ScriptedClock::new().fractions(&[0.25, 0.5, 1.0, 0.5]);

        agent.advance(DT, &world, &mut clock);

        let queries = world.target_queries();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|(_, min_distance)| *min_distance == 10.0));

        let target = agent.target().expect("second candidate accepted");
        assert!(target.x > 5.0);
        assert_eq!(target, queries[1].0);
    }

    #[test]
    fn test_target_sampling_is_bounded_per_tick() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = StubWorld::new(|_, _| false);
        let mut clock = ScriptedClock::new();

        for tick in 1..=3 {
            let output = agent.advance(DT, &world, &mut clock);
            assert_eq!(output.position, Vec3::ZERO);
            assert_eq!(agent.target(), None);
            assert_eq!(world.target_queries().len(), 32 * tick);
        }

        // Деградация, а не смена режима
        assert_eq!(agent.state(), AgentState::Wandering { gait: Gait::Walk });
    }

    #[test]
    fn test_reaching_target_reevaluates() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = open_world();
        // Цель x ≈ 0.2, шаг 0.3 → в пределах stopping_distance; re-pick: Idle
        let mut clock = ScriptedClock::new().fractions(&[0.51, 0.5]).picks(&[0]);
        clock.now = 1.0;

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.state, AgentState::Idle);
        assert_eq!(agent.target(), None);
        assert_relative_eq!(agent.next_state_change(), 8.5);
    }

    #[test]
    fn test_wander_keeps_walking_until_arrival() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = open_world();
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]).picks(&[0]);

        let mut arrived_at = None;
        for tick in 0..100 {
            clock.now = tick as f32 * DT;
            agent.advance(DT, &world, &mut clock);
            if agent.target().is_none() {
                arrived_at = Some(tick);
                break;
            }
        }

        // 10м при 0.3м/тик → ~33 тика
        let tick = arrived_at.expect("agent must reach its target");
        assert!((30..=35).contains(&tick), "arrived at tick {}", tick);
        assert!(agent.position().distance(Vec3::new(10.0, 0.0, 0.0)) < 0.5);
    }

    #[test]
    fn test_obstacle_hit_steers_along_surface() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        // Стена впереди (forward = -Z), нормаль смотрит на агента
        let world = open_world().with_hit(Vec3::Z);
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]);

        let output = agent.advance(DT, &world, &mut clock);

        // cross(+Z, +Y) = -X
        assert_relative_eq!(output.position.x, -0.3, epsilon = 1e-5);
        assert_relative_eq!(output.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_floor_hit_keeps_seek_direction() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = open_world().with_hit(Vec3::Y);
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]);

        let output = agent.advance(DT, &world, &mut clock);

        assert_relative_eq!(output.position.x, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_blocked_step_tries_perturbed_heading() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = StubWorld::new(|p: Vec3, min_distance: f32| min_distance > 0.0 || p.z > 0.01);
        // target (10,0,0); retry 1: yaw 0 (reject), retry 2: yaw -90° → +Z (accept)
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5, 0.5, 0.0]);

        let output = agent.advance(DT, &world, &mut clock);

        assert_relative_eq!(output.position.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(output.position.z, 0.3, epsilon = 1e-4);
        assert_eq!(agent.target(), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(output.state, AgentState::Wandering { gait: Gait::Walk });
    }

    #[test]
    fn test_fully_blocked_drops_target_and_repicks_next_tick() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let allow_steps = Cell::new(false);
        let world = StubWorld::new(|_, min_distance: f32| min_distance > 0.0 || allow_steps.get());
        let mut clock = ScriptedClock::new().fractions(&[1.0, 0.5]);
        clock.now = 2.0;

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.position, Vec3::ZERO);
        assert_eq!(output.state, AgentState::Idle);
        assert_eq!(agent.target(), None);
        assert_eq!(agent.next_state_change(), 2.0);

        // Следующий тик: немедленный выбор режима
        allow_steps.set(true);
        clock.now = 2.1;
        clock.push_fractions(&[0.5, 1.0, 0.5]);
        clock.picks.push_back(1);

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.state, AgentState::Wandering { gait: Gait::Walk });
        assert_relative_eq!(output.position.x, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_flee_runs_directly_away_from_threat() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = open_world();
        let mut clock = ScriptedClock::new();

        agent.on_threat_enter(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(agent.flee_direction(), Some(Vec3::NEG_X));

        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.locomotion, Locomotion::Flee);
        assert_relative_eq!(output.position.x, -0.5, epsilon = 1e-5); // run 5 m/s
        assert_relative_eq!(output.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_flee_direction_is_recomputed_every_tick() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = open_world();
        let mut clock = ScriptedClock::new();
        let threat = Vec3::new(1.0, 0.0, 0.0);

        agent.on_threat_enter(threat);
        agent.advance(DT, &world, &mut clock);

        // Хост (физика) сдвинул агента
        agent.set_pose(Vec3::new(1.0, 0.0, 4.0), agent.orientation());
        let expected = Vec3::new(1.0, 0.0, 4.0) - threat;
        assert_eq!(agent.flee_direction(), Some(expected.normalize()));

        let output = agent.advance(DT, &world, &mut clock);

        assert_relative_eq!(output.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(output.position.z, 4.5, epsilon = 1e-5);
    }

    #[test]
    fn test_flee_step_respects_bounds() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = StubWorld::new(|p: Vec3, _| p.x >= 0.0);
        let mut clock = ScriptedClock::new();

        agent.on_threat_enter(Vec3::new(1.0, 0.0, 0.0));
        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(output.position, Vec3::ZERO);
        assert!(output.state.is_fleeing());
    }

    #[test]
    fn test_threat_exit_always_ends_fleeing() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Jog));
        let world = open_world();
        let mut clock = ScriptedClock::new();

        agent.on_threat_enter(Vec3::new(0.0, 0.0, 3.0));
        for tick in 0..500 {
            clock.now = tick as f32 * DT;
            agent.advance(DT, &world, &mut clock);
            assert!(agent.state().is_fleeing());
        }

        agent.on_threat_exit();

        assert!(!agent.state().is_fleeing());
        assert_eq!(agent.state(), AgentState::Wandering { gait: Gait::Jog });
    }

    #[test]
    fn test_repeated_enter_refreshes_origin_and_keeps_resume_mode() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));

        agent.on_threat_enter(Vec3::new(5.0, 0.0, 0.0));
        agent.on_threat_enter(Vec3::new(0.0, 0.0, 5.0));

        assert_eq!(
            agent.state(),
            AgentState::Fleeing {
                flee_origin: Vec3::new(0.0, 0.0, 5.0),
                resume: CalmMode::Wander(Gait::Walk),
            }
        );
        assert_eq!(agent.flee_direction(), Some(Vec3::NEG_Z));

        agent.on_threat_exit();
        assert_eq!(agent.state(), AgentState::Wandering { gait: Gait::Walk });
    }

    #[test]
    fn test_exit_without_enter_is_noop() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Jog));
        agent.on_threat_exit();
        assert_eq!(agent.state(), AgentState::Wandering { gait: Gait::Jog });
    }

    #[rstest]
    #[case::idle(CalmMode::Idle)]
    #[case::walk(CalmMode::Wander(Gait::Walk))]
    #[case::jog(CalmMode::Wander(Gait::Jog))]
    fn test_enter_exit_pair_is_idempotent(#[case] mode: CalmMode) {
        let world = open_world();
        let mut baseline = active_agent(mode);
        let mut flickered = baseline.clone();
        let mut baseline_clock = ScriptedClock::new().fractions(&[0.9, 0.3]);
        let mut flickered_clock = ScriptedClock::new().fractions(&[0.9, 0.3]);

        flickered.on_threat_enter(Vec3::new(2.0, 0.0, 2.0));
        flickered.on_threat_exit();

        for tick in 0..5 {
            baseline_clock.now = tick as f32 * DT;
            flickered_clock.now = tick as f32 * DT;
            let expected = baseline.advance(DT, &world, &mut baseline_clock);
            let actual = flickered.advance(DT, &world, &mut flickered_clock);
            assert_eq!(expected, actual);
            assert_eq!(baseline.target(), flickered.target());
        }
    }

    #[test]
    fn test_threat_before_first_tick_flees_on_activation() {
        let mut agent = Agent::new(Vec3::ZERO, SteeringConfig::default());
        let world = open_world();
        let mut clock = ScriptedClock::new();
        clock.now = 4.0;

        agent.on_threat_enter(Vec3::new(0.0, 0.0, 1.0));
        let output = agent.advance(DT, &world, &mut clock);

        assert_eq!(agent.lifecycle(), Lifecycle::Active);
        assert!(output.state.is_fleeing());
        assert_relative_eq!(output.position.z, -0.5, epsilon = 1e-5);

        agent.on_threat_exit();
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.next_state_change(), 4.0); // выбор режима сразу после бегства
    }

    #[test]
    fn test_orientation_turns_smoothly() {
        let mut agent = active_agent(CalmMode::Idle);
        let world = open_world();
        let mut clock = ScriptedClock::new();
        let look = Transform::IDENTITY.looking_to(Vec3::X, Vec3::Y).rotation;

        // Угроза слева → бежим в +X, стартуем лицом в -Z (90°)
        agent.on_threat_enter(Vec3::new(-1.0, 0.0, 0.0));
        let start_angle = agent.orientation().angle_between(look);

        let output = agent.advance(1.0, &world, &mut clock); // огромный dt: t упирается в MAX_TURN_FRACTION
        let after_one = output.orientation.angle_between(look);
        assert!(after_one > 1e-3, "rotation must not snap");
        assert!(after_one < start_angle);

        for _ in 0..60 {
            agent.advance(DT, &world, &mut clock);
        }
        assert!(agent.forward().dot(Vec3::X) > 0.99);
    }

    #[test]
    fn test_invalid_config_disables_agent() {
        let config = SteeringConfig {
            walk_speed: 0.0,
            ..SteeringConfig::default()
        };
        let mut agent = Agent::new(Vec3::new(2.0, 0.0, 2.0), config);
        let world = open_world();
        let mut clock = ScriptedClock::new();

        let output = agent.advance(DT, &world, &mut clock);
        assert_eq!(agent.lifecycle(), Lifecycle::Disabled);
        assert_eq!(output.position, Vec3::new(2.0, 0.0, 2.0));

        agent.on_threat_enter(Vec3::ZERO);
        let output = agent.advance(DT, &world, &mut clock);
        assert_eq!(output.state, AgentState::Idle);
        assert_eq!(output.position, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_huge_wander_extent_is_rejected_not_sampled() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        use super::super::clock::RngClock;

        let config = SteeringConfig {
            wander_extent: 3.0e38,
            ..SteeringConfig::default()
        };
        let mut agent = Agent::new(Vec3::ZERO, config);
        let world = open_world();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for tick in 0..100 {
            let mut clock = RngClock::new(tick as f32 * 0.5, &mut rng);
            let output = agent.advance(0.5, &world, &mut clock);
            assert_eq!(output.position, Vec3::ZERO);
        }
        assert_eq!(agent.lifecycle(), Lifecycle::Disabled);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut agent = active_agent(CalmMode::Wander(Gait::Walk));
        let world = open_world();
        let mut clock = ScriptedClock::new();

        let output = agent.advance(f32::NAN, &world, &mut clock);
        assert_eq!(output.position, Vec3::ZERO);
        assert_eq!(agent.target(), None);
    }

    #[test]
    fn test_locomotion_tags() {
        assert_eq!(Locomotion::Idle.as_str(), "idle");
        assert_eq!(Locomotion::Walk.as_str(), "walk");
        assert_eq!(Locomotion::Jog.to_string(), "jog");
        assert_eq!(Locomotion::Flee.to_string(), "flee");
    }
}
