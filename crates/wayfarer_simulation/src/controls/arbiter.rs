//! ControlArbiter — per-agent арбитраж input sources + интеграция движения
//!
//! Каждый tick:
//! 1. Rotation: первый активный source из `rotation_priority` (delta или absolute)
//! 2. Velocity: первый активный source из `movement_priority`, затем общий
//!    pipeline (easing → acceleration → heading)
//! 3. Commit: velocity для внешнего интегратора ИЛИ позиция, зажатая navmesh
//!
//! Арбитраж эксклюзивный: source ниже по списку не влияет на агента,
//! даже если тоже активен (head tracking всегда перебивает мышь).

use bevy::prelude::*;

use super::capability::{ControlBindings, MovementCapability, RotationCapability};
use super::config::{ArbiterConfig, MAX_FRAME_DELTA_SECS, NAV_VELOCITY_EPSILON};
use super::error::ControlError;
use crate::components::ViewRotation;
use crate::navigation::NavigationSystem;

/// Borrowed view на состояние агента (владелец: host)
pub struct AgentState<'a> {
    pub position: &'a mut Vec3,
    pub velocity: &'a mut Vec3,
    pub rotation: &'a mut ViewRotation,
    /// Offset tracked точки над поверхностью (высота глаз камеры)
    pub eye_height: f32,
}

/// Результат одного tick (для логов и тестов)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// dt = 0 / None или арбитр выключен — состояние не тронуто
    Skipped,
    /// Navmesh выключен: velocity записана в агента
    VelocityCommitted(Vec3),
    /// Navmesh включен: позиция агента заменена зажатой
    Moved { from: Vec3, to: Vec3 },
    /// Navmesh включен, но |v|² < epsilon — позиция не тронута
    Stationary,
}

/// Арбитр управления агентом
///
/// Хранит собственную рабочую velocity: в navmesh режиме она authoritative
/// (в агента не пишется), без navmesh перечитывается из агента каждый tick.
#[derive(Component, Debug)]
pub struct ControlArbiter {
    config: ArbiterConfig,
    bindings: ControlBindings,
    velocity: Vec3,
}

impl ControlArbiter {
    /// Создать арбитр, проверив что priority списки совместимы с привязками
    pub fn new(config: ArbiterConfig, bindings: ControlBindings) -> Result<Self, ControlError> {
        validate(&config, &bindings)?;

        Ok(Self {
            config,
            bindings,
            velocity: Vec3::ZERO,
        })
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn bindings(&self) -> &ControlBindings {
        &self.bindings
    }

    /// Рабочая velocity арбитра (после последнего tick)
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Заменить конфиг между тиками. При ошибке остаётся предыдущий.
    pub fn set_config(&mut self, config: ArbiterConfig) -> Result<(), ControlError> {
        validate(&config, &self.bindings)?;
        self.config = config;
        Ok(())
    }

    /// Заменить привязки между тиками. При ошибке остаются предыдущие.
    pub fn set_bindings(&mut self, bindings: ControlBindings) -> Result<(), ControlError> {
        validate(&self.config, &bindings)?;
        self.bindings = bindings;
        Ok(())
    }

    /// Один кадр управления
    ///
    /// `dt_millis` = None или 0 → no-op. dt > 200ms (frame spike) →
    /// velocity сбрасывается в ноль вместо интеграции огромного шага.
    pub fn tick(
        &mut self,
        dt_millis: Option<f32>,
        agent: AgentState<'_>,
        nav: Option<&NavigationSystem>,
    ) -> TickOutcome {
        let Some(dt_millis) = dt_millis.filter(|dt| *dt > 0.0) else {
            return TickOutcome::Skipped;
        };

        if !self.config.enabled {
            return TickOutcome::Skipped;
        }

        if self.config.rotation_enabled {
            self.update_rotation(dt_millis, agent.rotation);
        }

        let velocity = if dt_millis / 1000.0 > MAX_FRAME_DELTA_SECS {
            crate::log(&format!(
                "ControlArbiter: frame spike {:.0}ms → velocity reset",
                dt_millis
            ));
            Vec3::ZERO
        } else {
            self.update_velocity(dt_millis, *agent.velocity, *agent.rotation)
        };

        // Вычисление завершено целиком, теперь можно коммитить
        self.velocity = velocity;
        self.commit(dt_millis, agent, nav)
    }

    fn update_rotation(&mut self, dt_millis: f32, rotation: &mut ViewRotation) {
        let sensitivity = self.config.rotation_sensitivity;
        let Some(capability) =
            first_active_rotation(&self.config.rotation_priority, &mut self.bindings)
        else {
            return;
        };

        *rotation = match capability {
            RotationCapability::Delta(control) => {
                // Delta стика/мыши инвертирована относительно view rotation
                let delta = control.rotation_delta(dt_millis) * sensitivity;
                ViewRotation::new(rotation.pitch - delta.y, rotation.yaw - delta.x).clamped()
            }
            RotationCapability::Absolute(control) => control.rotation().clamped(),
        };
    }

    /// Новая рабочая velocity (ещё не закоммиченная)
    fn update_velocity(&mut self, dt_millis: f32, agent_velocity: Vec3, rotation: ViewRotation) -> Vec3 {
        let dt = dt_millis / 1000.0;
        let mut delta = None;

        if self.config.movement_enabled {
            if let Some(capability) =
                first_active_movement(&self.config.movement_priority, &mut self.bindings)
            {
                match capability {
                    // Source сам задаёт полный вектор: без easing/acceleration/heading
                    MovementCapability::AbsoluteVelocity(control) => return control.velocity(),
                    MovementCapability::PositionDelta(control) => {
                        return control.position_delta(dt_millis) / dt;
                    }
                    MovementCapability::Delta(control) => {
                        delta = Some(control.velocity_delta(dt_millis));
                    }
                }
            }
        }

        // Без navmesh velocity могла измениться снаружи (physics, gravity)
        let mut velocity = if self.config.use_nav_mesh {
            self.velocity
        } else {
            agent_velocity
        };

        velocity.x -= velocity.x * self.config.easing_xz * dt;
        velocity.y -= velocity.y * self.config.easing_y * dt;
        velocity.z -= velocity.z * self.config.easing_xz * dt;

        if let Some(delta) = delta {
            let impulse = self.config.acceleration * dt;

            // |delta| > 1: полный input (фиксированный импульс),
            // ≤ 1: аналоговый (пропорционально отклонению)
            let scaled = if delta.length() > 1.0 {
                delta.normalize() * impulse
            } else {
                delta * impulse
            };

            velocity += rotation.heading(self.config.fly) * scaled;
        }

        velocity
    }

    fn commit(
        &self,
        dt_millis: f32,
        agent: AgentState<'_>,
        nav: Option<&NavigationSystem>,
    ) -> TickOutcome {
        if !self.config.use_nav_mesh {
            *agent.velocity = self.velocity;
            return TickOutcome::VelocityCommitted(self.velocity);
        }

        if self.velocity.length_squared() < NAV_VELOCITY_EPSILON {
            return TickOutcome::Stationary;
        }

        // Clamp работает с точкой на поверхности, не с глазами
        let offset = Vec3::Y * agent.eye_height;
        let start = *agent.position - offset;
        let end = start + self.velocity * (dt_millis / 1000.0);

        // Нет NavigationSystem: как "mesh не загружен": pass-through
        let clamped = nav.map_or(end, |nav| nav.clamp_to_segment(start, end));

        let from = *agent.position;
        *agent.position = clamped + offset;

        TickOutcome::Moved {
            from,
            to: *agent.position,
        }
    }
}

/// Id в priority списке, привязанный только на другую ось: ошибка конфигурации.
/// Непривязанные id допустимы (source ещё не подключён) и пропускаются.
fn validate(config: &ArbiterConfig, bindings: &ControlBindings) -> Result<(), ControlError> {
    if let Some(id) = config
        .rotation_priority
        .iter()
        .find(|id| !bindings.has_rotation(id) && bindings.has_movement(id))
    {
        return Err(ControlError::IncompatibleRotationControl(id.clone()));
    }

    if let Some(id) = config
        .movement_priority
        .iter()
        .find(|id| !bindings.has_movement(id) && bindings.has_rotation(id))
    {
        return Err(ControlError::IncompatibleMovementControl(id.clone()));
    }

    Ok(())
}

fn first_active_rotation<'a>(
    priority: &[String],
    bindings: &'a mut ControlBindings,
) -> Option<&'a mut RotationCapability> {
    let id = priority
        .iter()
        .find(|id| bindings.rotation(id).is_some_and(RotationCapability::is_active))?;
    bindings.rotation_mut(id)
}

fn first_active_movement<'a>(
    priority: &[String],
    bindings: &'a mut ControlBindings,
) -> Option<&'a mut MovementCapability> {
    let id = priority
        .iter()
        .find(|id| bindings.movement(id).is_some_and(MovementCapability::is_active))?;
    bindings.movement_mut(id)
}
