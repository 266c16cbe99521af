//! Конфигурация ControlArbiter
//!
//! Immutable в пределах tick, заменяется между тиками через `set_config`.

use serde::{Deserialize, Serialize};

use super::error::ControlError;

/// Порог frame spike (секунды): dt выше → velocity сбрасывается вместо интеграции
///
/// Срабатывает при suspend вкладки/окна, долгой загрузке и т.п.
pub const MAX_FRAME_DELTA_SECS: f32 = 0.2;

/// Ниже этого |v|² navmesh clamp не запускается (агент стоит)
pub const NAV_VELOCITY_EPSILON: f32 = 1e-5;

/// Настройки арбитража и интеграции движения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Master switch: false → tick ничего не делает
    pub enabled: bool,
    pub movement_enabled: bool,
    pub rotation_enabled: bool,
    /// Movement source ids, в порядке приоритета (первый активный побеждает)
    pub movement_priority: Vec<String>,
    /// Rotation source ids, в порядке приоритета
    pub rotation_priority: Vec<String>,
    /// Линейное затухание X/Z velocity (1/s)
    pub easing_xz: f32,
    /// Линейное затухание Y velocity (1/s). 0 → вертикаль не гасится
    pub easing_y: f32,
    /// Ускорение от полного input (м/с²)
    pub acceleration: f32,
    /// Множитель rotation delta
    pub rotation_sensitivity: f32,
    /// true → movement поворачивается и по pitch (climb/dive)
    pub fly: bool,
    /// true → позиция клампится к navmesh, velocity не коммитится
    pub use_nav_mesh: bool,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            movement_enabled: true,
            rotation_enabled: true,
            movement_priority: ids(&["gamepad", "keyboard", "touch", "hmd"]),
            rotation_priority: ids(&["hmd", "gamepad", "mouse"]),
            easing_xz: 15.0,
            easing_y: 0.0,
            acceleration: 80.0,
            rotation_sensitivity: 0.05,
            fly: false,
            use_nav_mesh: false,
        }
    }
}

impl ArbiterConfig {
    /// Распарсить из JSON (отсутствующие поля берутся из Default)
    pub fn from_json(json: &str) -> Result<Self, ControlError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_movement_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.movement_priority = priority.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rotation_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rotation_priority = priority.into_iter().map(Into::into).collect();
        self
    }
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
