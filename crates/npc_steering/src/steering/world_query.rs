//! WorldQuery — read-only доступ к террейну и препятствиям.
//!
//! Реализации:
//! - `physics::RapierWorldQuery` — Rapier overlap + raycast (игра)
//! - `physics::ArenaWorld` — прямоугольник + сферы (headless симуляция, тесты)

use bevy::prelude::*;

/// Результат raycast'а: нормаль поверхности в точке попадания
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    pub normal: Vec3,
}

/// Запросы к миру, которые делает steering ядро
///
/// Исключение "себя" из raycast'а — ответственность реализации
/// (ядро не знает про коллайдеры).
pub trait WorldQuery {
    /// Лежит ли позиция на проходимом террейне.
    ///
    /// `min_distance` — требуемый запас (clearance) вокруг точки.
    /// Ядро передаёт `target_clearance` для кандидатов в цели и 0 для шагов движения;
    /// реализация может использовать его как отступ от края (NavMesh) или игнорировать.
    fn is_within_bounds(&self, position: Vec3, min_distance: f32) -> bool;

    /// Ближайшее препятствие по лучу (direction нормализован) в пределах max_distance
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<HitInfo>;
}

impl<W: WorldQuery + ?Sized> WorldQuery for &W {
    fn is_within_bounds(&self, position: Vec3, min_distance: f32) -> bool {
        (**self).is_within_bounds(position, min_distance)
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<HitInfo> {
        (**self).raycast(origin, direction, max_distance)
    }
}
