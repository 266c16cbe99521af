//! Spatial index для nearest-node запросов
//!
//! Uniform grid по XZ (как chunk grid мира): каждая ячейка хранит узлы,
//! чей AABB её пересекает. Запрос смотрит одну ячейку вместо полного перебора.
//!
//! Треугольники крупнее `MAX_CELLS_PER_TRIANGLE` ячеек (пол уровня среди
//! мелкой детализации) в ячейки не кладутся: они в общем списке `oversized`,
//! который проверяется при каждом запросе. Память = O(число треугольников).

use bevy::prelude::*;
use std::collections::HashMap;

use super::mesh::NodeId;

/// Границы размера ячейки (метры). Верхняя = размер chunk.
const MIN_CELL_SIZE: f32 = 0.5;
const MAX_CELL_SIZE: f32 = 32.0;

/// Сколько ячеек может занять один треугольник
const MAX_CELLS_PER_TRIANGLE: i64 = 64;

#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<IVec2, Vec<NodeId>>,
    oversized: Vec<NodeId>,
}

impl SpatialGrid {
    /// Построить grid по треугольникам (по одному на узел, индекс = NodeId)
    ///
    /// Размер ячейки ≈ удвоенный медианный размер треугольника: единичные
    /// огромные треугольники не раздувают ячейки для остальных.
    pub fn build(triangles: &[[Vec3; 3]]) -> Self {
        if triangles.is_empty() {
            return Self {
                cell_size: MAX_CELL_SIZE,
                cells: HashMap::new(),
                oversized: Vec::new(),
            };
        }

        let bounds: Vec<(Vec2, Vec2)> = triangles.iter().map(xz_bounds).collect();
        let mut extents: Vec<f32> = bounds
            .iter()
            .map(|(min, max)| (*max - *min).max_element())
            .collect();
        extents.sort_by(f32::total_cmp);
        let median_extent = extents[extents.len() / 2];
        let cell_size = (median_extent * 2.0).clamp(MIN_CELL_SIZE, MAX_CELL_SIZE);

        let mut grid = Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        };

        for (node, (min, max)) in bounds.into_iter().enumerate() {
            let min_cell = grid.cell_of(min.x, min.y);
            let max_cell = grid.cell_of(max.x, max.y);

            let covered = (i64::from(max_cell.x) - i64::from(min_cell.x) + 1)
                * (i64::from(max_cell.y) - i64::from(min_cell.y) + 1);
            if covered > MAX_CELLS_PER_TRIANGLE {
                grid.oversized.push(node);
                continue;
            }

            for x in min_cell.x..=max_cell.x {
                for z in min_cell.y..=max_cell.y {
                    grid.cells.entry(IVec2::new(x, z)).or_default().push(node);
                }
            }
        }

        grid
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Всего записей (ячейки + oversized)
    pub fn entry_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum::<usize>() + self.oversized.len()
    }

    /// Узлы-кандидаты для точки: ячейка по XZ + все oversized
    pub fn candidates(&self, position: Vec3) -> impl Iterator<Item = NodeId> + '_ {
        self.cells
            .get(&self.cell_of(position.x, position.z))
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .chain(&self.oversized)
            .copied()
    }

    fn cell_of(&self, x: f32, z: f32) -> IVec2 {
        IVec2::new(
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }
}

fn xz_bounds(triangle: &[Vec3; 3]) -> (Vec2, Vec2) {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for vertex in triangle {
        let point = Vec2::new(vertex.x, vertex.z);
        min = min.min(point);
        max = max.max(point);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_only_from_cell() {
        let near = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];
        let far = near.map(|v| v + Vec3::new(100.0, 0.0, 100.0));
        let grid = SpatialGrid::build(&[near, far]);

        let candidates = |position| grid.candidates(position).collect::<Vec<_>>();
        assert_eq!(candidates(Vec3::new(0.5, 0.0, 0.2)), vec![0]);
        assert_eq!(candidates(Vec3::new(100.5, 0.0, 100.2)), vec![1]);
        assert!(candidates(Vec3::new(50.0, 0.0, 50.0)).is_empty());
    }

    #[test]
    fn test_cell_size_clamped() {
        let tiny = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.01, 0.0, 0.0),
            Vec3::new(0.01, 0.0, 0.01),
        ];
        assert_eq!(SpatialGrid::build(&[tiny]).cell_size(), MIN_CELL_SIZE);
        assert_eq!(SpatialGrid::build(&[]).cell_size(), MAX_CELL_SIZE);
    }

    #[test]
    fn test_huge_triangle_does_not_flood_cells() {
        // 2000 мелких треугольников (0.2 м) + один пол 400 м
        let mut triangles: Vec<[Vec3; 3]> = (0..2000)
            .map(|i| {
                let origin = Vec3::new((i % 50) as f32 * 0.2, 0.0, (i / 50) as f32 * 0.2);
                [
                    origin,
                    origin + Vec3::new(0.2, 0.0, 0.0),
                    origin + Vec3::new(0.2, 0.0, 0.2),
                ]
            })
            .collect();
        triangles.push([
            Vec3::new(-200.0, -1.0, -200.0),
            Vec3::new(200.0, -1.0, -200.0),
            Vec3::new(200.0, -1.0, 200.0),
        ]);
        let floor = triangles.len() - 1;

        let grid = SpatialGrid::build(&triangles);

        assert_eq!(grid.cell_size(), MIN_CELL_SIZE);
        assert!(
            grid.entry_count() <= triangles.len() * 4,
            "{} entries for {} triangles",
            grid.entry_count(),
            triangles.len()
        );
        // Пол виден из любой точки, в том числе вдали от мелких треугольников
        assert!(grid.candidates(Vec3::new(150.0, -1.0, -100.0)).any(|node| node == floor));
        assert!(grid.candidates(Vec3::new(0.1, 0.0, 0.05)).any(|node| node == 0));
    }
}
