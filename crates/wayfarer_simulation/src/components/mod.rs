//! ECS Components для агентов
//!
//! - agent: marker + состояние агента (AgentVelocity, ViewRotation, EyeHeight)
//!
//! Компоненты арбитра и навигации живут в своих доменах (controls, navigation).

pub mod agent;

// Re-exports для удобного импорта
pub use agent::*;
