//! Controls domain — арбитраж input sources и интеграция движения агента
//!
//! # Архитектура
//!
//! ```text
//! Capability providers (gamepad/keyboard/mouse/hmd — внешние)
//!     ↓  ControlBindings (форма фиксируется при привязке)
//! ControlArbiter::tick(dt) - arbiter.rs
//!     ↓  (optional) NavigationSystem::clamp_to_segment
//! AgentVelocity / Transform.translation / ViewRotation
//! ```
//!
//! # Компоненты модуля
//!
//! - `capability` - контракт input sources + привязки по id
//! - `config` - ArbiterConfig (serde)
//! - `arbiter` - ControlArbiter (core логика, без ECS)
//! - `scripted` - ScriptedInput (боты, demo, тесты)
//! - `systems` - ECS системы

use bevy::prelude::*;

pub mod arbiter;
pub mod capability;
pub mod config;
pub mod error;
pub mod scripted;
pub mod systems;


pub use arbiter::{AgentState, ControlArbiter, TickOutcome};
pub use capability::{
    AbsoluteRotationControl, AbsoluteVelocityControl, ControlBindings, MovementCapability,
    PositionDeltaControl, RotationCapability, RotationDeltaControl, VelocityDeltaControl,
};
pub use config::{ArbiterConfig, MAX_FRAME_DELTA_SECS, NAV_VELOCITY_EPSILON};
pub use error::ControlError;
pub use scripted::ScriptedInput;
pub use systems::*;

use crate::AgentSet;

/// Controls Plugin
///
/// Порядок выполнения (Update):
/// 1. tick_control_arbiters — арбитраж + интеграция + navmesh clamp
/// 2. sync_view_rotation_to_transform — ориентация в Transform
pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_agent_sets(app);

        app.add_systems(
            Update,
            (tick_control_arbiters, sync_view_rotation_to_transform)
                .chain()
                .in_set(AgentSet::Control),
        );
    }
}
