//! SteeringClock — время + случайность для steering решений.
//!
//! Ядро не знает про Bevy Time и глобальный RNG: хост передаёт clock в `Agent::advance`.
//! Для детерминизма ECS слой оборачивает seeded ChaCha8Rng из DeterministicRng.

use rand::Rng;

/// Источник времени и случайности для агента
pub trait SteeringClock {
    /// Прошедшее время симуляции (секунды)
    fn now(&self) -> f32;

    /// Равномерное значение в [min, max] (включительно)
    fn uniform(&mut self, min: f32, max: f32) -> f32;

    /// Равномерный индекс в [0, count)
    fn choose(&mut self, count: usize) -> usize;
}

/// Clock поверх любого `rand::Rng`
pub struct RngClock<'a, R: Rng + ?Sized> {
    now: f32,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> RngClock<'a, R> {
    pub fn new(now: f32, rng: &'a mut R) -> Self {
        Self { now, rng }
    }
}

impl<R: Rng + ?Sized> SteeringClock for RngClock<'_, R> {
    fn now(&self) -> f32 {
        self.now
    }

    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        // Пустой, NaN или бесконечный по ширине диапазон: gen_range паникует
        if !(max - min).is_finite() || min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn choose(&mut self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        self.rng.gen_range(0..count)
    }
}
