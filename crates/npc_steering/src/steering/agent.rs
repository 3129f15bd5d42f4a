//! Agent — конечный автомат steering'а NPC
//!
//! Idle ⇄ Wandering(Walk | Jog), любое состояние → Fleeing → предыдущий режим.
//!
//! Архитектура:
//! - `advance(dt)` вызывается хостом раз в тик (FixedUpdate в ECS слое)
//! - Мир (bounds test, raycast) приходит через WorldQuery
//! - Время и случайность приходят через SteeringClock
//! - Threat события приходят edge-triggered: `on_threat_enter` / `on_threat_exit`
//!
//! Gait (walk/jog) хранится явно в состоянии, а не выводится из анимации.

use std::fmt;

use bevy::prelude::*;

use super::clock::SteeringClock;
use super::config::{SteeringConfig, MAX_TURN_FRACTION};
use super::error::SteeringError;
use super::world_query::WorldQuery;

/// Походка при wander
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Gait {
    #[default]
    Walk,
    Jog,
}

/// "Спокойный" режим — куда возвращаемся после Fleeing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum CalmMode {
    #[default]
    Idle,
    Wander(Gait),
}

/// Состояние автомата
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AgentState {
    /// Стоим на месте до истечения таймера
    Idle,

    /// Идём/бежим к случайной точке
    Wandering { gait: Gait },

    /// Убегаем от угрозы
    Fleeing {
        /// Позиция угрозы на момент начала бегства
        flee_origin: Vec3,
        /// Режим до начала бегства
        resume: CalmMode,
    },
}

impl Default for AgentState {
    fn default() -> Self {
        Self::Idle
    }
}

impl From<CalmMode> for AgentState {
    fn from(mode: CalmMode) -> Self {
        match mode {
            CalmMode::Idle => Self::Idle,
            CalmMode::Wander(gait) => Self::Wandering { gait },
        }
    }
}

impl AgentState {
    pub fn is_fleeing(&self) -> bool {
        matches!(self, Self::Fleeing { .. })
    }

    /// Спокойный режим (для Fleeing — режим, в который вернёмся)
    pub fn calm_mode(&self) -> CalmMode {
        match *self {
            Self::Idle => CalmMode::Idle,
            Self::Wandering { gait } => CalmMode::Wander(gait),
            Self::Fleeing { resume, .. } => resume,
        }
    }

    pub fn locomotion(&self) -> Locomotion {
        match self {
            Self::Idle => Locomotion::Idle,
            Self::Wandering { gait: Gait::Walk } => Locomotion::Walk,
            Self::Wandering { gait: Gait::Jog } => Locomotion::Jog,
            Self::Fleeing { .. } => Locomotion::Flee,
        }
    }
}

/// Символьный тег для анимационной системы хоста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Locomotion {
    #[default]
    Idle,
    Walk,
    Jog,
    Flee,
}

impl Locomotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locomotion::Idle => "idle",
            Locomotion::Walk => "walk",
            Locomotion::Jog => "jog",
            Locomotion::Flee => "flee",
        }
    }
}

impl fmt::Display for Locomotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Жизненный цикл агента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Lifecycle {
    /// Создан, config ещё не проверен
    #[default]
    Spawned,
    /// Работает
    Active,
    /// Setup ошибка — агент больше не двигается
    Disabled,
}

/// Результат одного тика
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub position: Vec3,
    pub orientation: Quat,
    pub state: AgentState,
    pub locomotion: Locomotion,
}

/// NPC под steering контролем
#[derive(Debug, Clone, Reflect)]
pub struct Agent {
    position: Vec3,
    orientation: Quat,
    state: AgentState,
    target: Option<Vec3>,
    /// Время (clock.now) следующей смены Idle режима
    next_state_change: f32,
    config: SteeringConfig,
    lifecycle: Lifecycle,
}

impl Agent {
    pub fn new(position: Vec3, config: SteeringConfig) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            state: AgentState::Idle,
            target: None,
            next_state_change: 0.0,
            config,
            lifecycle: Lifecycle::Spawned,
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation.normalize();
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Forward вектор (Bevy convention: -Z)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    pub fn next_state_change(&self) -> f32 {
        self.next_state_change
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_disabled(&self) -> bool {
        self.lifecycle == Lifecycle::Disabled
    }

    pub fn locomotion(&self) -> Locomotion {
        self.state.locomotion()
    }

    /// Текущее направление бегства (None если не убегаем)
    pub fn flee_direction(&self) -> Option<Vec3> {
        match self.state {
            AgentState::Fleeing { flee_origin, .. } => {
                Some((self.position - flee_origin).normalize_or_zero())
            }
            _ => None,
        }
    }

    /// Синхронизация позы из хоста (Transform authoritative)
    pub fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation.normalize();
    }

    pub fn output(&self) -> SteeringOutput {
        SteeringOutput {
            position: self.position,
            orientation: self.orientation,
            state: self.state,
            locomotion: self.state.locomotion(),
        }
    }

    /// Проверяет config и делает стартовый выбор режима.
    ///
    /// При ошибке агент переходит в Disabled и больше не двигается.
    pub fn activate<C: SteeringClock + ?Sized>(&mut self, clock: &mut C) -> Result<(), SteeringError> {
        if self.lifecycle == Lifecycle::Disabled {
            return Ok(());
        }

        if let Err(err) = self.config.validate() {
            self.disable();
            return Err(err);
        }

        self.lifecycle = Lifecycle::Active;

        if self.state.is_fleeing() {
            // Угроза пришла раньше первого тика: выбор режима сразу после бегства
            self.next_state_change = clock.now();
        } else {
            self.pick_calm_mode(clock);
        }

        Ok(())
    }

    /// Отключает агента (fatal-for-this-agent)
    pub fn disable(&mut self) {
        self.lifecycle = Lifecycle::Disabled;
        self.state = AgentState::Idle;
        self.target = None;
    }

    /// Угроза вошла в радиус: Fleeing от её позиции.
    ///
    /// Повторный enter во время бегства обновляет flee_origin, режим возврата сохраняется.
    pub fn on_threat_enter(&mut self, threat_position: Vec3) {
        if self.is_disabled() {
            return;
        }

        self.state = AgentState::Fleeing {
            flee_origin: threat_position,
            resume: self.state.calm_mode(),
        };
    }

    /// Угроза ушла: возвращаемся в режим до бегства
    pub fn on_threat_exit(&mut self) {
        if let AgentState::Fleeing { resume, .. } = self.state {
            self.state = resume.into();
        }
    }

    /// Один тик steering'а.
    ///
    /// Никогда не возвращает ошибку: все сбои деградируют в "ничего не сделали".
    pub fn advance<W, C>(&mut self, dt: f32, world: &W, clock: &mut C) -> SteeringOutput
    where
        W: WorldQuery + ?Sized,
        C: SteeringClock + ?Sized,
    {
        match self.lifecycle {
            Lifecycle::Disabled => return self.output(),
            Lifecycle::Spawned => {
                if let Err(err) = self.activate(clock) {
                    crate::log_error(&format!("Steering: agent disabled at activation: {}", err));
                    return self.output();
                }
            }
            Lifecycle::Active => {}
        }

        if !dt.is_finite() || dt < 0.0 {
            return self.output();
        }

        match self.state {
            AgentState::Fleeing { flee_origin, .. } => self.flee_from(flee_origin, dt, world),
            _ => self.wander(dt, world, clock),
        }

        self.output()
    }

    /// Случайный Idle/Walk/Jog + новый таймер
    fn pick_calm_mode<C: SteeringClock + ?Sized>(&mut self, clock: &mut C) {
        let duration = clock.uniform(self.config.state_duration_min, self.config.state_duration_max);
        self.next_state_change = clock.now() + duration;

        let mode = match clock.choose(3) {
            0 => CalmMode::Idle,
            1 => CalmMode::Wander(Gait::Walk),
            _ => CalmMode::Wander(Gait::Jog),
        };

        // Свежая цель сэмплируется в следующем wander тике
        self.target = None;
        self.state = mode.into();
    }

    fn wander<W, C>(&mut self, dt: f32, world: &W, clock: &mut C)
    where
        W: WorldQuery + ?Sized,
        C: SteeringClock + ?Sized,
    {
        if self.state == AgentState::Idle && clock.now() >= self.next_state_change {
            self.pick_calm_mode(clock);
        }

        let AgentState::Wandering { gait } = self.state else {
            return;
        };

        if self.target.is_none() {
            self.target = self.sample_target(world, clock);
        }

        let Some(target) = self.target else {
            return;
        };

        self.move_towards(target, gait, dt, world, clock);

        // target мог быть сброшен в change_heading
        if self.target.is_some() && self.position.distance(target) < self.config.stopping_distance {
            self.pick_calm_mode(clock);
        }
    }

    /// Сэмплирует точку в квадрате вокруг агента, пока bounds test не пройдёт.
    ///
    /// Не больше max_target_attempts попыток за тик, дальше — None (повтор в следующем тике).
    fn sample_target<W, C>(&self, world: &W, clock: &mut C) -> Option<Vec3>
    where
        W: WorldQuery + ?Sized,
        C: SteeringClock + ?Sized,
    {
        let extent = self.config.wander_extent;

        for _ in 0..self.config.max_target_attempts {
            let candidate = Vec3::new(
                self.position.x + clock.uniform(-extent, extent),
                self.position.y,
                self.position.z + clock.uniform(-extent, extent),
            );

            if world.is_within_bounds(candidate, self.config.target_clearance) {
                return Some(candidate);
            }
        }

        crate::log(&format!(
            "Steering: no walkable target around {:?} after {} attempts, retry next tick",
            self.position, self.config.max_target_attempts
        ));
        None
    }

    fn move_towards<W, C>(&mut self, target: Vec3, gait: Gait, dt: f32, world: &W, clock: &mut C)
    where
        W: WorldQuery + ?Sized,
        C: SteeringClock + ?Sized,
    {
        let speed = match gait {
            Gait::Walk => self.config.walk_speed,
            Gait::Jog => self.config.run_speed,
        };

        let seek = (target - self.position).normalize_or_zero();
        let direction = self.avoidance(world).unwrap_or(seek).normalize_or_zero();
        let proposed = self.position + direction * speed * dt;

        if world.is_within_bounds(proposed, 0.0) {
            self.position = proposed;
            self.face(direction, dt);
        } else {
            self.change_heading(seek, dt, world, clock);
        }
    }

    /// Forward луч длиной detection_radius: при попадании идём вдоль препятствия
    fn avoidance<W: WorldQuery + ?Sized>(&self, world: &W) -> Option<Vec3> {
        if self.config.detection_radius <= 0.0 {
            return None;
        }

        let hit = world.raycast(self.position, self.forward(), self.config.detection_radius)?;
        let avoid = hit.normal.cross(Vec3::Y) * self.config.walk_speed;

        // Нормаль параллельна up (пол/потолок) — обход не определён
        (avoid.length_squared() > f32::EPSILON).then_some(avoid)
    }

    /// Шаг вне bounds: пробуем случайно повернутые (±jitter yaw) направления на walk скорости.
    ///
    /// Если ничего не подошло — бросаем цель, новый выбор режима в следующем тике.
    fn change_heading<W, C>(&mut self, seek: Vec3, dt: f32, world: &W, clock: &mut C)
    where
        W: WorldQuery + ?Sized,
        C: SteeringClock + ?Sized,
    {
        let jitter = self.config.heading_jitter_degrees;

        for _ in 0..self.config.heading_retries {
            let yaw = clock.uniform(-jitter, jitter).to_radians();
            let heading = Quat::from_rotation_y(yaw) * seek;
            let proposed = self.position + heading * self.config.walk_speed * dt;

            if world.is_within_bounds(proposed, 0.0) {
                self.position = proposed;
                self.face(heading, dt);
                return;
            }
        }

        crate::log(&format!(
            "Steering: movement blocked at {:?} after {} headings, dropping target",
            self.position, self.config.heading_retries
        ));

        self.target = None;
        self.state = AgentState::Idle;
        self.next_state_change = clock.now();
    }

    fn flee_from<W: WorldQuery + ?Sized>(&mut self, flee_origin: Vec3, dt: f32, world: &W) {
        // Пересчитываем каждый тик от текущей позиции
        let direction = (self.position - flee_origin).normalize_or_zero();
        let proposed = self.position + direction * self.config.run_speed * dt;

        if world.is_within_bounds(proposed, 0.0) {
            self.position = proposed;
            self.face(direction, dt);
        }
    }

    /// Плавный поворот к направлению движения (slerp, никогда не мгновенно)
    fn face(&mut self, direction: Vec3, dt: f32) {
        if direction.length_squared() <= f32::EPSILON {
            return;
        }

        let look = Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation;
        let t = (dt * self.config.turn_rate).clamp(0.0, MAX_TURN_FRACTION);
        self.orientation = self.orientation.slerp(look, t).normalize();
    }
}
