//! NavMesh: граф walkable треугольников, разбитый на связные группы
//!
//! Построение из SurfaceMesh:
//! 1. Слияние совпадающих вершин (точность 1e-4)
//! 2. Отбрасывание вырожденных треугольников
//! 3. Узел = треугольник; соседи = треугольники с общим ребром (portal)
//! 4. Группы = компоненты связности (path/clamp не пересекают границу группы)
//! 5. Spatial grid для nearest-node запросов

use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;

use super::geometry;
use super::grid::SpatialGrid;

pub type NodeId = usize;
pub type GroupId = usize;

/// Точность слияния вершин (метры)
const MERGE_PRECISION: f32 = 1e-4;

/// Минимальная удвоенная площадь треугольника (м²)
const DEGENERATE_AREA: f32 = 1e-8;

/// Входная триангулированная поверхность (формат и загрузка на стороне host)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<Vec3>,
    /// Тройки индексов в `vertices`
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Плоская сетка columns × rows клеток, по 2 треугольника на клетку
    ///
    /// Покрывает [origin.x, origin.x + columns*cell] × [origin.z, origin.z + rows*cell].
    pub fn flat_grid(origin: Vec3, columns: u32, rows: u32, cell_size: f32) -> Self {
        let mut vertices = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
        for row in 0..=rows {
            for column in 0..=columns {
                vertices.push(origin + Vec3::new(column as f32 * cell_size, 0.0, row as f32 * cell_size));
            }
        }

        let stride = columns + 1;
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let a = row * stride + column;
                let b = a + 1;
                let c = a + stride + 1;
                let d = a + stride;
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Объединить поверхности (индексы второй сдвигаются)
    pub fn merged(mut self, other: &SurfaceMesh) -> Self {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|index| index + offset));
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NavMeshError {
    #[error("Index count {0} is not a multiple of 3")]
    MalformedIndices(usize),

    #[error("Vertex index {index} out of bounds ({vertex_count} vertices)")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

/// Узел navmesh — один walkable треугольник
#[derive(Debug, Clone)]
pub struct NavNode {
    pub id: NodeId,
    pub group: GroupId,
    pub vertex_ids: [usize; 3],
    pub centroid: Vec3,
    /// Соседи по общему ребру (отсортированы по id)
    pub neighbours: Vec<NodeId>,
    /// Общее ребро с соседом, индекс совпадает с `neighbours`
    pub portals: Vec<[usize; 2]>,
}

/// Сводка построения (для логов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavMeshStats {
    pub vertices: usize,
    pub nodes: usize,
    pub groups: usize,
    pub dropped_triangles: usize,
}

#[derive(Debug, Clone)]
pub struct NavMesh {
    vertices: Vec<Vec3>,
    nodes: Vec<NavNode>,
    groups: Vec<Vec<NodeId>>,
    grid: SpatialGrid,
    dropped_triangles: usize,
}

impl NavMesh {
    pub fn build(surface: &SurfaceMesh) -> Result<Self, NavMeshError> {
        if surface.indices.len() % 3 != 0 {
            return Err(NavMeshError::MalformedIndices(surface.indices.len()));
        }
        if let Some(&index) = surface
            .indices
            .iter()
            .find(|&&index| index as usize >= surface.vertices.len())
        {
            return Err(NavMeshError::IndexOutOfBounds {
                index,
                vertex_count: surface.vertices.len(),
            });
        }

        let (vertices, remap) = merge_vertices(&surface.vertices);

        let mut nodes = Vec::new();
        let mut dropped_triangles = 0;
        for triangle in surface.indices.chunks_exact(3) {
            let vertex_ids = [
                remap[triangle[0] as usize],
                remap[triangle[1] as usize],
                remap[triangle[2] as usize],
            ];
            let [a, b, c] = vertex_ids.map(|id| vertices[id]);

            let collapsed = vertex_ids[0] == vertex_ids[1]
                || vertex_ids[1] == vertex_ids[2]
                || vertex_ids[0] == vertex_ids[2];
            if collapsed || (b - a).cross(c - a).length_squared() < DEGENERATE_AREA * DEGENERATE_AREA {
                dropped_triangles += 1;
                continue;
            }

            nodes.push(NavNode {
                id: nodes.len(),
                group: 0,
                vertex_ids,
                centroid: (a + b + c) / 3.0,
                neighbours: Vec::new(),
                portals: Vec::new(),
            });
        }

        link_neighbours(&mut nodes);
        let groups = assign_groups(&mut nodes);

        let triangles: Vec<[Vec3; 3]> = nodes
            .iter()
            .map(|node| node.vertex_ids.map(|id| vertices[id]))
            .collect();
        let grid = SpatialGrid::build(&triangles);

        Ok(Self {
            vertices,
            nodes,
            groups,
            grid,
            dropped_triangles,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&NavNode> {
        self.nodes.get(id)
    }

    pub fn groups(&self) -> &[Vec<NodeId>] {
        &self.groups
    }

    pub fn stats(&self) -> NavMeshStats {
        NavMeshStats {
            vertices: self.vertices.len(),
            nodes: self.nodes.len(),
            groups: self.groups.len(),
            dropped_triangles: self.dropped_triangles,
        }
    }

    /// Вершины узла (мировые координаты)
    pub fn triangle(&self, id: NodeId) -> Option<[Vec3; 3]> {
        let node = self.nodes.get(id)?;
        Some(node.vertex_ids.map(|vertex| self.vertices[vertex]))
    }

    /// Ближайший узел, содержащий точку (XZ + допуск по высоте)
    ///
    /// `group` ограничивает поиск одной компонентой связности.
    /// Кандидаты берутся из spatial grid, среди них побеждает ближайший centroid.
    pub fn closest_node(&self, position: Vec3, group: Option<GroupId>) -> Option<NodeId> {
        self.grid
            .candidates(position)
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| group.is_none_or(|group| node.group == group))
            .filter(|node| {
                let triangle = node.vertex_ids.map(|vertex| self.vertices[vertex]);
                geometry::contains_xz(&triangle, position) && geometry::within_height(&triangle, position)
            })
            .min_by(|lhs, rhs| {
                lhs.centroid
                    .distance_squared(position)
                    .total_cmp(&rhs.centroid.distance_squared(position))
            })
            .map(|node| node.id)
    }

    /// Группа ближайшего узла (в любой группе)
    pub fn group_of(&self, position: Vec3) -> Option<GroupId> {
        let node = self.closest_node(position, None)?;
        Some(self.nodes[node].group)
    }

    /// Общее ребро from → to (вершины в мировых координатах)
    pub fn portal(&self, from: NodeId, to: NodeId) -> Option<[Vec3; 2]> {
        let node = self.nodes.get(from)?;
        let slot = node.neighbours.iter().position(|&neighbour| neighbour == to)?;
        Some(node.portals[slot].map(|vertex| self.vertices[vertex]))
    }
}

/// Слить вершины ближе MERGE_PRECISION. Возвращает (уникальные вершины, remap старый → новый)
fn merge_vertices(source: &[Vec3]) -> (Vec<Vec3>, Vec<usize>) {
    let mut unique = Vec::new();
    let mut lookup: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut remap = Vec::with_capacity(source.len());

    for vertex in source {
        let key = (
            (vertex.x / MERGE_PRECISION).round() as i64,
            (vertex.y / MERGE_PRECISION).round() as i64,
            (vertex.z / MERGE_PRECISION).round() as i64,
        );
        let id = *lookup.entry(key).or_insert_with(|| {
            unique.push(*vertex);
            unique.len() - 1
        });
        remap.push(id);
    }

    (unique, remap)
}

/// Соседство по общим рёбрам (BTreeMap: детерминированный порядок соседей)
fn link_neighbours(nodes: &mut [NavNode]) {
    let mut edges: BTreeMap<(usize, usize), Vec<NodeId>> = BTreeMap::new();
    for node in nodes.iter() {
        let [a, b, c] = node.vertex_ids;
        for (u, v) in [(a, b), (b, c), (c, a)] {
            edges.entry((u.min(v), u.max(v))).or_default().push(node.id);
        }
    }

    for ((u, v), shared) in edges {
        // Non-manifold ребро (>2 треугольников) связывает всех попарно
        for (i, &lhs) in shared.iter().enumerate() {
            for &rhs in &shared[i + 1..] {
                nodes[lhs].neighbours.push(rhs);
                nodes[lhs].portals.push([u, v]);
                nodes[rhs].neighbours.push(lhs);
                nodes[rhs].portals.push([u, v]);
            }
        }
    }

    for node in nodes.iter_mut() {
        let mut links: Vec<(NodeId, [usize; 2])> = node
            .neighbours
            .iter()
            .copied()
            .zip(node.portals.iter().copied())
            .collect();
        links.sort_by_key(|(neighbour, _)| *neighbour);
        links.dedup_by_key(|(neighbour, _)| *neighbour);
        let (neighbours, portals): (Vec<NodeId>, Vec<[usize; 2]>) = links.into_iter().unzip();
        node.neighbours = neighbours;
        node.portals = portals;
    }
}

/// BFS по соседям: каждая компонента связности становится группой
fn assign_groups(nodes: &mut [NavNode]) -> Vec<Vec<NodeId>> {
    let mut visited = vec![false; nodes.len()];
    let mut groups = Vec::new();

    for seed in 0..nodes.len() {
        if visited[seed] {
            continue;
        }

        let group = groups.len();
        let mut members = Vec::new();
        let mut queue = VecDeque::from([seed]);
        visited[seed] = true;

        while let Some(id) = queue.pop_front() {
            nodes[id].group = group;
            members.push(id);

            for &neighbour in &nodes[id].neighbours {
                if !visited[neighbour] {
                    visited[neighbour] = true;
                    queue.push_back(neighbour);
                }
            }
        }

        groups.push(members);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_grid_builds_single_group() {
        let mesh = NavMesh::build(&SurfaceMesh::flat_grid(Vec3::ZERO, 3, 2, 1.0)).unwrap();
        let stats = mesh.stats();

        assert_eq!(stats.nodes, 12);
        assert_eq!(stats.vertices, 12);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.dropped_triangles, 0);
    }

    #[test]
    fn test_duplicate_vertices_are_merged() {
        // Два треугольника с продублированными вершинами общего ребра
        let surface = SurfaceMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.00001, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![0, 1, 2, 3, 4, 5],
        );
        let mesh = NavMesh::build(&surface).unwrap();

        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.groups().len(), 1);
        assert_eq!(mesh.node(0).unwrap().neighbours, vec![1]);
        assert!(mesh.portal(0, 1).is_some());
    }

    #[test]
    fn test_disconnected_islands_form_groups() {
        let island = SurfaceMesh::flat_grid(Vec3::ZERO, 1, 1, 1.0);
        let other = SurfaceMesh::flat_grid(Vec3::new(10.0, 0.0, 0.0), 1, 1, 1.0);
        let mesh = NavMesh::build(&island.merged(&other)).unwrap();

        assert_eq!(mesh.groups().len(), 2);
        assert_eq!(mesh.group_of(Vec3::new(0.5, 0.0, 0.5)), Some(0));
        assert_eq!(mesh.group_of(Vec3::new(10.5, 0.0, 0.5)), Some(1));
        assert_eq!(mesh.group_of(Vec3::new(5.0, 0.0, 0.5)), None);
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let surface = SurfaceMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
            ],
            // collinear + collapsed + нормальный
            vec![0, 1, 2, 0, 0, 3, 0, 1, 3],
        );
        let mesh = NavMesh::build(&surface).unwrap();

        assert_eq!(mesh.stats().nodes, 1);
        assert_eq!(mesh.stats().dropped_triangles, 2);
    }

    #[test]
    fn test_invalid_indices_rejected() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Z];

        assert_eq!(
            NavMesh::build(&SurfaceMesh::new(vertices.clone(), vec![0, 1])).unwrap_err(),
            NavMeshError::MalformedIndices(2)
        );
        assert_eq!(
            NavMesh::build(&SurfaceMesh::new(vertices, vec![0, 1, 7])).unwrap_err(),
            NavMeshError::IndexOutOfBounds { index: 7, vertex_count: 3 }
        );
    }

    #[test]
    fn test_closest_node_respects_height() {
        let lower = SurfaceMesh::flat_grid(Vec3::ZERO, 1, 1, 1.0);
        let upper = SurfaceMesh::flat_grid(Vec3::new(0.0, 3.0, 0.0), 1, 1, 1.0);
        let mesh = NavMesh::build(&lower.merged(&upper)).unwrap();

        let low = mesh.closest_node(Vec3::new(0.7, 0.1, 0.2), None).unwrap();
        let high = mesh.closest_node(Vec3::new(0.7, 3.1, 0.2), None).unwrap();

        assert_ne!(mesh.node(low).unwrap().group, mesh.node(high).unwrap().group);
        assert!(mesh.closest_node(Vec3::new(0.7, 1.5, 0.2), None).is_none());
    }

    #[test]
    fn test_large_floor_among_small_detail() {
        let detail = SurfaceMesh::flat_grid(Vec3::ZERO, 20, 20, 0.2);
        let floor = SurfaceMesh::new(
            vec![
                Vec3::new(-200.0, -5.0, -200.0),
                Vec3::new(200.0, -5.0, -200.0),
                Vec3::new(200.0, -5.0, 200.0),
            ],
            vec![0, 1, 2],
        );
        let surface = detail.merged(&floor);
        let mesh = NavMesh::build(&surface).unwrap();

        assert_eq!(mesh.stats().nodes, surface.triangle_count());
        let floor_node = surface.triangle_count() - 1;
        assert_eq!(mesh.closest_node(Vec3::new(150.0, -5.0, -100.0), None), Some(floor_node));
        let detail_node = mesh.closest_node(Vec3::new(1.05, 0.0, 1.03), None).unwrap();
        assert_ne!(detail_node, floor_node);
    }
}
