//! Ошибки конфигурации ControlArbiter

use thiserror::Error;

/// Ошибка привязки capability / конфигурации арбитра
///
/// Проверяется при конфигурации (`ControlArbiter::new`, `set_config`,
/// `set_bindings`), поэтому tick никогда не падает посреди кадра.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Id в `rotation_priority` привязан только как movement source
    #[error("Incompatible rotation controls: {0}")]
    IncompatibleRotationControl(String),

    /// Id в `movement_priority` привязан только как rotation source
    #[error("Incompatible movement controls: {0}")]
    IncompatibleMovementControl(String),

    #[error("Invalid arbiter config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
