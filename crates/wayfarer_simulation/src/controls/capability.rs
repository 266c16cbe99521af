//! Capability контракт: что input source обязан отдавать арбитру
//!
//! Форма source (delta / absolute / position delta) фиксируется при привязке
//! через enum variant, а не проверяется каждый кадр.
//!
//! ```text
//! RotationCapability = Delta | Absolute
//! MovementCapability = Delta | AbsoluteVelocity | PositionDelta
//! ```

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::ViewRotation;

/// Rotation source с относительными delta (мышь, стик)
pub trait RotationDeltaControl: Send + Sync {
    fn is_rotation_active(&self) -> bool;

    /// (dx, dy) за tick, до sensitivity
    fn rotation_delta(&mut self, dt_millis: f32) -> Vec2;
}

/// Rotation source с абсолютной ориентацией (head tracking)
pub trait AbsoluteRotationControl: Send + Sync {
    fn is_rotation_active(&self) -> bool;

    /// Ориентация в радианах (тот же формат что `ViewRotation` агента)
    fn rotation(&self) -> ViewRotation;
}

/// Movement source с local-space delta (клавиатура, стик, touch)
pub trait VelocityDeltaControl: Send + Sync {
    fn is_velocity_active(&self) -> bool;

    /// |delta| > 1 — полный input, ≤ 1 — аналоговый
    fn velocity_delta(&mut self, dt_millis: f32) -> Vec3;
}

/// Movement source, который сам задаёт полный velocity vector
pub trait AbsoluteVelocityControl: Send + Sync {
    fn is_velocity_active(&self) -> bool;

    fn velocity(&self) -> Vec3;
}

/// Movement source, отдающий смещение позиции за tick (roomscale tracking)
pub trait PositionDeltaControl: Send + Sync {
    fn is_velocity_active(&self) -> bool;

    fn position_delta(&mut self, dt_millis: f32) -> Vec3;
}

/// Rotation форма, выбранная при привязке
pub enum RotationCapability {
    Delta(Box<dyn RotationDeltaControl>),
    Absolute(Box<dyn AbsoluteRotationControl>),
}

impl RotationCapability {
    pub fn delta(control: impl RotationDeltaControl + 'static) -> Self {
        Self::Delta(Box::new(control))
    }

    pub fn absolute(control: impl AbsoluteRotationControl + 'static) -> Self {
        Self::Absolute(Box::new(control))
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Delta(control) => control.is_rotation_active(),
            Self::Absolute(control) => control.is_rotation_active(),
        }
    }
}

/// Movement форма, выбранная при привязке
pub enum MovementCapability {
    Delta(Box<dyn VelocityDeltaControl>),
    AbsoluteVelocity(Box<dyn AbsoluteVelocityControl>),
    PositionDelta(Box<dyn PositionDeltaControl>),
}

impl MovementCapability {
    pub fn delta(control: impl VelocityDeltaControl + 'static) -> Self {
        Self::Delta(Box::new(control))
    }

    pub fn absolute_velocity(control: impl AbsoluteVelocityControl + 'static) -> Self {
        Self::AbsoluteVelocity(Box::new(control))
    }

    pub fn position_delta(control: impl PositionDeltaControl + 'static) -> Self {
        Self::PositionDelta(Box::new(control))
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Delta(control) => control.is_velocity_active(),
            Self::AbsoluteVelocity(control) => control.is_velocity_active(),
            Self::PositionDelta(control) => control.is_velocity_active(),
        }
    }
}

/// Привязки capability по id (per agent)
///
/// Один id может иметь обе оси (gamepad: стик движения + стик обзора),
/// тогда это два независимых source под одним именем.
#[derive(Default)]
pub struct ControlBindings {
    rotation: HashMap<String, RotationCapability>,
    movement: HashMap<String, MovementCapability>,
}

impl ControlBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotation(mut self, id: impl Into<String>, capability: RotationCapability) -> Self {
        self.bind_rotation(id, capability);
        self
    }

    pub fn with_movement(mut self, id: impl Into<String>, capability: MovementCapability) -> Self {
        self.bind_movement(id, capability);
        self
    }

    /// Привязать rotation source (заменяет предыдущий с тем же id)
    pub fn bind_rotation(&mut self, id: impl Into<String>, capability: RotationCapability) {
        self.rotation.insert(id.into(), capability);
    }

    /// Привязать movement source (заменяет предыдущий с тем же id)
    pub fn bind_movement(&mut self, id: impl Into<String>, capability: MovementCapability) {
        self.movement.insert(id.into(), capability);
    }

    /// Убрать обе оси для id
    pub fn unbind(&mut self, id: &str) {
        self.rotation.remove(id);
        self.movement.remove(id);
    }

    pub fn rotation(&self, id: &str) -> Option<&RotationCapability> {
        self.rotation.get(id)
    }

    pub fn rotation_mut(&mut self, id: &str) -> Option<&mut RotationCapability> {
        self.rotation.get_mut(id)
    }

    pub fn movement(&self, id: &str) -> Option<&MovementCapability> {
        self.movement.get(id)
    }

    pub fn movement_mut(&mut self, id: &str) -> Option<&mut MovementCapability> {
        self.movement.get_mut(id)
    }

    pub fn has_rotation(&self, id: &str) -> bool {
        self.rotation.contains_key(id)
    }

    pub fn has_movement(&self, id: &str) -> bool {
        self.movement.contains_key(id)
    }
}

impl std::fmt::Debug for ControlBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rotation: Vec<_> = self.rotation.keys().collect();
        let mut movement: Vec<_> = self.movement.keys().collect();
        rotation.sort();
        movement.sort();

        f.debug_struct("ControlBindings")
            .field("rotation", &rotation)
            .field("movement", &movement)
            .finish()
    }
}
