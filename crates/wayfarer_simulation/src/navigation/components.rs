//! Navigation компоненты (ECS)

use bevy::prelude::*;

/// Агент, зарегистрированный в NavigationSystem
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct NavAgent;

/// Запрос пути до target (обрабатывается один раз, затем удаляется)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavPathRequest {
    pub target: Vec3,
}

/// Найденный путь (точки на поверхности, без стартовой позиции)
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavPath {
    pub waypoints: Vec<Vec3>,
    /// Индекс текущего waypoint
    pub next: usize,
}

impl NavPath {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self { waypoints, next: 0 }
    }

    pub fn current(&self) -> Option<Vec3> {
        self.waypoints.get(self.next).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.waypoints.len()
    }

    /// Перейти к следующему waypoint, если текущий достигнут (по XZ)
    ///
    /// Возвращает waypoint, к которому нужно двигаться дальше.
    pub fn advance(&mut self, position: Vec3, arrival_radius: f32) -> Option<Vec3> {
        while let Some(waypoint) = self.current() {
            let offset = Vec2::new(waypoint.x - position.x, waypoint.z - position.z);
            if offset.length() > arrival_radius {
                return Some(waypoint);
            }
            self.next += 1;
        }
        None
    }
}
