//! Компоненты агента: позиция (Transform), скорость, ориентация взгляда

use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

/// Предел pitch (радианы): взгляд не переворачивается через зенит/надир
pub const PITCH_LIMIT: f32 = FRAC_PI_2;

/// Агент от первого лица: marker, подтягивает всё состояние через Required Components
///
/// Владелец состояния: host. `ControlArbiter` мутирует компоненты in-place,
/// но никогда не заменяет их.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Transform, AgentVelocity, ViewRotation, EyeHeight)]
pub struct Agent;

/// Скорость агента (м/с, world space)
///
/// Без navmesh: committed velocity для внешнего интегратора (physics / headless).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AgentVelocity(pub Vec3);

/// Ориентация взгляда (радианы), roll всегда 0
///
/// Инвариант: pitch ∈ [-π/2, π/2] после любого rotation update.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ViewRotation {
    pub pitch: f32,
    pub yaw: f32,
}

impl ViewRotation {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    /// Из градусов (формат rotation атрибутов сцены)
    pub fn from_degrees(pitch: f32, yaw: f32) -> Self {
        Self::new(pitch.to_radians(), yaw.to_radians())
    }

    /// Копия с pitch, зажатым в [-π/2, π/2]
    pub fn clamped(self) -> Self {
        Self {
            pitch: self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            yaw: self.yaw,
        }
    }

    /// Heading для поворота local → world движения
    ///
    /// Порядок YXZ: сначала yaw вокруг Y, затем pitch вокруг X.
    /// `fly == false` → pitch игнорируется (агент прижат к земле).
    pub fn heading(&self, fly: bool) -> Quat {
        let pitch = if fly { self.pitch } else { 0.0 };
        Quat::from_euler(EulerRot::YXZ, self.yaw, pitch, 0.0)
    }

    /// Полная ориентация (для Transform.rotation)
    pub fn to_quat(&self) -> Quat {
        self.heading(true)
    }
}

/// Вертикальный offset между tracked точкой агента и точкой на поверхности
///
/// Для камеры это высота глаз (userHeight). Navmesh clamp работает с
/// `position - eye_height`, затем offset возвращается обратно.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct EyeHeight(pub f32);
