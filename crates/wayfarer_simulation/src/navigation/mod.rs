//! Navigation domain — navmesh, clamp движения и поиск пути
//!
//! # Архитектура
//!
//! ```text
//! SurfaceMesh (host) ─ SetNavMesh event
//!     ↓
//! NavMesh::build - mesh.rs (merge → nodes → groups → spatial grid)
//!     ↓
//! NavigationSystem (Resource)
//!     ├─ clamp_to_segment ← ControlArbiter (use_nav_mesh)
//!     └─ find_path (A* + funnel) ← NavPathRequest
//! ```

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod mesh;
pub mod path;
pub mod system;
pub mod systems;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod system_tests;

pub use components::{NavAgent, NavPath, NavPathRequest};
pub use events::SetNavMesh;
pub use mesh::{GroupId, NavMesh, NavMeshError, NavMeshStats, NavNode, NodeId, SurfaceMesh};
pub use system::NavigationSystem;
pub use systems::*;

use crate::AgentSet;

/// Navigation Plugin
///
/// Порядок выполнения (Update, до арбитров):
/// 1. apply_nav_mesh_requests — замена navmesh
/// 2. register_nav_agents / unregister_nav_agents — учёт агентов
/// 3. resolve_path_requests — NavPathRequest → NavPath
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_agent_sets(app);

        app.init_resource::<NavigationSystem>()
            .add_event::<SetNavMesh>()
            .add_systems(
                Update,
                (
                    apply_nav_mesh_requests,
                    register_nav_agents,
                    unregister_nav_agents,
                    resolve_path_requests,
                )
                    .chain()
                    .in_set(AgentSet::Navigation),
            );
    }
}
