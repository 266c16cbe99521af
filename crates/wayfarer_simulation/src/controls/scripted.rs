//! Scripted input source — управляемый из кода (боты, headless demo, тесты)
//!
//! Клон `ScriptedInput` делит состояние с оригиналом: один экземпляр
//! привязывается к арбитру, второй остаётся у владельца для `set`/`set_active`.

use bevy::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard};

use super::capability::{
    AbsoluteRotationControl, AbsoluteVelocityControl, PositionDeltaControl, RotationDeltaControl,
    VelocityDeltaControl,
};
use crate::components::ViewRotation;

#[derive(Debug, Clone, Copy, Default)]
struct ScriptedState {
    active: bool,
    value: Vec3,
}

/// Source с фиксированным значением и флагом активности
///
/// Интерпретация `value` зависит от формы привязки:
/// - rotation delta: (x, y) = (dx, dy)
/// - absolute rotation: x = pitch, y = yaw (радианы)
/// - velocity delta / absolute velocity / position delta: value как есть
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedInput {
    /// Активный source с заданным значением
    pub fn new(value: Vec3) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState { active: true, value })),
        }
    }

    /// Неактивный source (value = 0)
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn set(&self, value: Vec3) {
        self.lock().value = value;
    }

    pub fn set_active(&self, active: bool) {
        self.lock().active = active;
    }

    pub fn value(&self) -> Vec3 {
        self.lock().value
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        // Poison не страшен: состояние — plain data без инвариантов
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RotationDeltaControl for ScriptedInput {
    fn is_rotation_active(&self) -> bool {
        self.is_active()
    }

    fn rotation_delta(&mut self, _dt_millis: f32) -> Vec2 {
        self.value().truncate()
    }
}

impl AbsoluteRotationControl for ScriptedInput {
    fn is_rotation_active(&self) -> bool {
        self.is_active()
    }

    fn rotation(&self) -> ViewRotation {
        let value = self.value();
        ViewRotation::new(value.x, value.y)
    }
}

impl VelocityDeltaControl for ScriptedInput {
    fn is_velocity_active(&self) -> bool {
        self.is_active()
    }

    fn velocity_delta(&mut self, _dt_millis: f32) -> Vec3 {
        self.value()
    }
}

impl AbsoluteVelocityControl for ScriptedInput {
    fn is_velocity_active(&self) -> bool {
        self.is_active()
    }

    fn velocity(&self) -> Vec3 {
        self.value()
    }
}

impl PositionDeltaControl for ScriptedInput {
    fn is_velocity_active(&self) -> bool {
        self.is_active()
    }

    fn position_delta(&mut self, _dt_millis: f32) -> Vec3 {
        self.value()
    }
}
