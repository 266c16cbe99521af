//! Navigation события
//!
//! Host (загрузчик уровня, editor tooling) присылает готовую поверхность,
//! NavigationPlugin строит из неё navmesh.

use bevy::prelude::*;

use super::mesh::SurfaceMesh;

/// Заменить активный navmesh
///
/// Ошибка построения логируется, предыдущий mesh остаётся.
#[derive(Event, Debug, Clone)]
pub struct SetNavMesh {
    pub surface: SurfaceMesh,
}
