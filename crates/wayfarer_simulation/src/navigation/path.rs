//! Поиск пути по navmesh
//!
//! Две стадии:
//! 1. A* по графу узлов (cost/heuristic = расстояние между centroid) → corridor
//! 2. Funnel (string pulling) по порталам corridor → waypoints
//!
//! Waypoints лежат на рёбрах порталов, поэтому высота берётся из mesh.

use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::geometry::triarea2;
use super::mesh::{NavMesh, NodeId};

/// Точки ближе этого считаются совпадающими (м²)
const SAME_POINT_EPSILON: f32 = 1e-10;

/// Запись open set (min-heap по f = g + h)
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    estimate: f32,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, при равенстве меньший id (детерминизм)
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// A*: последовательность узлов start → goal включительно
///
/// None если goal недостижим (другая группа).
pub fn find_corridor(mesh: &NavMesh, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    let goal_centroid = mesh.node(goal)?.centroid;
    let start_node = mesh.node(start)?;
    if start_node.group != mesh.node(goal)?.group {
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut cost: HashMap<NodeId, f32> = HashMap::new();

    cost.insert(start, 0.0);
    open.push(OpenEntry {
        estimate: start_node.centroid.distance(goal_centroid),
        node: start,
    });

    while let Some(OpenEntry { node, .. }) = open.pop() {
        if node == goal {
            return Some(reconstruct(&came_from, start, goal));
        }

        let current = &mesh.nodes()[node];
        let current_cost = cost.get(&node).copied().unwrap_or(f32::INFINITY);

        for &neighbour in &current.neighbours {
            let next = &mesh.nodes()[neighbour];
            let tentative = current_cost + current.centroid.distance(next.centroid);

            if tentative < cost.get(&neighbour).copied().unwrap_or(f32::INFINITY) {
                cost.insert(neighbour, tentative);
                came_from.insert(neighbour, node);
                open.push(OpenEntry {
                    estimate: tentative + next.centroid.distance(goal_centroid),
                    node: neighbour,
                });
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<NodeId, NodeId>, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut corridor = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                corridor.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    corridor.reverse();
    corridor
}

/// Порталы corridor в виде (left, right) для funnel
///
/// Первый портал вырожден в `from`, последний — в `target`.
pub fn corridor_portals(mesh: &NavMesh, corridor: &[NodeId], from: Vec3, target: Vec3) -> Vec<(Vec3, Vec3)> {
    let mut portals = Vec::with_capacity(corridor.len() + 1);
    portals.push((from, from));

    for pair in corridor.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let Some([p, q]) = mesh.portal(current, next) else {
            continue;
        };

        // Ориентация относительно центра текущего узла (направление движения)
        let centroid = mesh.nodes()[current].centroid;
        if triarea2(centroid, p, q) < 0.0 {
            portals.push((q, p));
        } else {
            portals.push((p, q));
        }
    }

    portals.push((target, target));
    portals
}

/// Funnel algorithm: кратчайшая ломаная через порталы
///
/// Возвращает точки начиная с первого портала (start) и заканчивая последним (goal).
pub fn string_pull(portals: &[(Vec3, Vec3)]) -> Vec<Vec3> {
    let Some(&(start, _)) = portals.first() else {
        return Vec::new();
    };

    let mut points = vec![start];
    let mut apex = start;
    let (mut left, mut right) = portals[0];
    let (mut left_index, mut right_index) = (0, 0);

    let mut i = 1;
    while i < portals.len() {
        let (next_left, next_right) = portals[i];

        // Правая сторона воронки
        if triarea2(apex, right, next_right) <= 0.0 {
            if same_point(apex, right) || triarea2(apex, left, next_right) > 0.0 {
                right = next_right;
                right_index = i;
            } else {
                // Правая перешла через левую: левая становится новым apex
                push_point(&mut points, left);
                let apex_index = left_index;
                apex = left;
                right = apex;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        // Левая сторона воронки
        if triarea2(apex, left, next_left) >= 0.0 {
            if same_point(apex, left) || triarea2(apex, right, next_left) < 0.0 {
                left = next_left;
                left_index = i;
            } else {
                push_point(&mut points, right);
                let apex_index = right_index;
                apex = right;
                left = apex;
                left_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if let Some(&(goal, _)) = portals.last() {
        push_point(&mut points, goal);
    }

    points
}

fn same_point(a: Vec3, b: Vec3) -> bool {
    a.distance_squared(b) < SAME_POINT_EPSILON
}

fn push_point(points: &mut Vec<Vec3>, point: Vec3) {
    if points.last().is_none_or(|last| !same_point(*last, point)) {
        points.push(point);
    }
}
