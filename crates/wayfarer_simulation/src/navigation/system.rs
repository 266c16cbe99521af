//! NavigationSystem — navmesh queries для агентов
//!
//! Resource: один активный navmesh + учёт зарегистрированных агентов.
//! Запросы read-only и не падают: без mesh/узла деградируют к pass-through.

use bevy::prelude::*;
use std::collections::HashSet;

use super::geometry;
use super::mesh::{GroupId, NavMesh, NavMeshError, NavMeshStats, NodeId, SurfaceMesh};
use super::path;
use crate::log_info;

#[derive(Resource, Debug, Default)]
pub struct NavigationSystem {
    mesh: Option<NavMesh>,
    agents: HashSet<Entity>,
}

impl NavigationSystem {
    /// Построить navmesh из поверхности и заменить текущий
    ///
    /// При ошибке текущий mesh остаётся.
    pub fn set_nav_mesh(&mut self, surface: &SurfaceMesh) -> Result<NavMeshStats, NavMeshError> {
        let mesh = NavMesh::build(surface)?;
        let stats = mesh.stats();

        log_info(&format!(
            "NavMesh loaded: {} nodes, {} vertices, {} groups ({} degenerate dropped)",
            stats.nodes, stats.vertices, stats.groups, stats.dropped_triangles
        ));

        self.mesh = Some(mesh);
        Ok(stats)
    }

    pub fn clear_nav_mesh(&mut self) {
        self.mesh = None;
    }

    pub fn nav_mesh(&self) -> Option<&NavMesh> {
        self.mesh.as_ref()
    }

    pub fn has_nav_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn closest_node(&self, position: Vec3, group: Option<GroupId>) -> Option<NodeId> {
        self.mesh.as_ref()?.closest_node(position, group)
    }

    pub fn group_of(&self, position: Vec3) -> Option<GroupId> {
        self.mesh.as_ref()?.group_of(position)
    }

    /// Путь from → target (waypoints без `from`, последний == target)
    ///
    /// None: нет mesh, `from` вне mesh, или target не в группе `from`.
    pub fn find_path(&self, from: Vec3, target: Vec3) -> Option<Vec<Vec3>> {
        let mesh = self.mesh.as_ref()?;
        let start = mesh.closest_node(from, None)?;
        let group = mesh.node(start)?.group;
        let goal = mesh.closest_node(target, Some(group))?;

        if start == goal {
            return Some(vec![target]);
        }

        let corridor = path::find_corridor(mesh, start, goal)?;
        let portals = path::corridor_portals(mesh, &corridor, from, target);
        // Первая точка funnel = сам `from`
        let mut points: Vec<Vec3> = path::string_pull(&portals).into_iter().skip(1).collect();
        match points.last_mut() {
            Some(last) => *last = target,
            None => points.push(target),
        }

        Some(points)
    }

    /// Зажать перемещение start → end в пределах группы start
    ///
    /// - нет mesh или start вне mesh → `end` (pass-through)
    /// - end вне группы start → скольжение по треугольнику start
    /// - тот же узел → `end`
    /// - другой узел → `end` с высотой по плоскости его треугольника
    pub fn clamp_to_segment(&self, start: Vec3, end: Vec3) -> Vec3 {
        let Some(mesh) = self.mesh.as_ref() else {
            return end;
        };
        let Some(start_node) = mesh.closest_node(start, None) else {
            return end;
        };
        let group = mesh.nodes()[start_node].group;

        match mesh.closest_node(end, Some(group)) {
            None => match mesh.triangle(start_node) {
                Some(triangle) => geometry::project_onto_triangle(&triangle, end),
                None => end,
            },
            Some(end_node) if end_node == start_node => end,
            Some(end_node) => {
                let y = mesh
                    .triangle(end_node)
                    .and_then(|triangle| geometry::plane_height(&triangle, end.x, end.z))
                    .unwrap_or(end.y);
                Vec3::new(end.x, y, end.z)
            }
        }
    }

    /// Учёт агентов (без влияния на queries)
    pub fn register_agent(&mut self, entity: Entity) -> bool {
        self.agents.insert(entity)
    }

    pub fn unregister_agent(&mut self, entity: Entity) -> bool {
        self.agents.remove(&entity)
    }

    pub fn is_registered(&self, entity: Entity) -> bool {
        self.agents.contains(&entity)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}
