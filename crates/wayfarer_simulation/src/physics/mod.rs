//! Physics bridge
//!
//! Арбитр без navmesh только коммитит velocity, интегрирует её этот модуль:
//! headless — напрямую в Transform, с Rapier — через Velocity.linvel.

pub mod movement;

// Re-export основных типов
pub use movement::{
    integrate_agent_velocity,
    sync_velocity_to_rapier,
    KinematicIntegrationPlugin,
    RapierVelocityBridgePlugin,
};
