//! ArenaWorld — WorldQuery без физического движка
//!
//! Прямоугольник проходимой земли (XZ) + сферические препятствия.
//! Используется headless симуляцией и тестами вместо Rapier.

use bevy::prelude::*;

use crate::steering::{HitInfo, WorldQuery};

/// Сферическое препятствие
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SphereObstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Арена: walkable прямоугольник [min, max] по XZ + препятствия
#[derive(Resource, Debug, Clone, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct ArenaWorld {
    pub min: Vec2,
    pub max: Vec2,
    pub obstacles: Vec<SphereObstacle>,
}

impl Default for ArenaWorld {
    fn default() -> Self {
        Self::square(50.0)
    }
}

impl ArenaWorld {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            obstacles: Vec::new(),
        }
    }

    /// Квадрат со стороной 2 * half_extent вокруг origin
    pub fn square(half_extent: f32) -> Self {
        let half = half_extent.abs();
        Self::new(Vec2::splat(-half), Vec2::splat(half))
    }

    pub fn with_obstacle(mut self, center: Vec3, radius: f32) -> Self {
        self.obstacles.push(SphereObstacle {
            center,
            radius: radius.abs(),
        });
        self
    }

    /// Точка внутри прямоугольника и не внутри препятствия
    pub fn contains(&self, position: Vec3) -> bool {
        let ground = Vec2::new(position.x, position.z);
        let on_ground = ground.cmpge(self.min).all() && ground.cmple(self.max).all();

        on_ground
            && self
                .obstacles
                .iter()
                .all(|obstacle| obstacle.center.distance_squared(position) > obstacle.radius * obstacle.radius)
    }
}

impl WorldQuery for ArenaWorld {
    /// min_distance не используется: арена не знает про отступ от края
    fn is_within_bounds(&self, position: Vec3, _min_distance: f32) -> bool {
        self.contains(position)
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<HitInfo> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        self.obstacles
            .iter()
            .filter_map(|obstacle| ray_sphere(origin, direction, obstacle).map(|t| (t, obstacle)))
            .filter(|(t, _)| *t <= max_distance)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(t, obstacle)| {
                let point = origin + direction * t;
                HitInfo {
                    normal: (point - obstacle.center).normalize_or_zero(),
                }
            })
    }
}

/// Дистанция до первого пересечения луча со сферой (direction нормализован)
fn ray_sphere(origin: Vec3, direction: Vec3, obstacle: &SphereObstacle) -> Option<f32> {
    let offset = origin - obstacle.center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - obstacle.radius * obstacle.radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }

    // Старт внутри сферы
    let far = -b + root;
    (far >= 0.0).then_some(far)
}
