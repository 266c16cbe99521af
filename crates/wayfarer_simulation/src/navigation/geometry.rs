//! Геометрия треугольников navmesh (XZ плоскость + высота по плоскости)

use bevy::prelude::*;

/// Допуск по высоте: точка "на" треугольнике, если её y в [min_y - 0.5, max_y + 0.5]
pub const NODE_HEIGHT_TOLERANCE: f32 = 0.5;

const AREA_EPSILON: f32 = 1e-6;

/// Удвоенная знаковая площадь треугольника abc в XZ
///
/// Знак задаёт сторону c относительно луча a→b; funnel опирается на этот знак.
pub fn triarea2(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let ax = b.x - a.x;
    let az = b.z - a.z;
    let bx = c.x - a.x;
    let bz = c.z - a.z;
    bx * az - ax * bz
}

/// Точка внутри треугольника в XZ (рёбра включительно)
pub fn contains_xz(triangle: &[Vec3; 3], point: Vec3) -> bool {
    let [a, b, c] = *triangle;
    let d1 = triarea2(a, b, point);
    let d2 = triarea2(b, c, point);
    let d3 = triarea2(c, a, point);

    let has_negative = d1 < -AREA_EPSILON || d2 < -AREA_EPSILON || d3 < -AREA_EPSILON;
    let has_positive = d1 > AREA_EPSILON || d2 > AREA_EPSILON || d3 > AREA_EPSILON;

    !(has_negative && has_positive)
}

/// Точка в пределах допуска по высоте
pub fn within_height(triangle: &[Vec3; 3], point: Vec3) -> bool {
    let min_y = triangle.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
    let max_y = triangle.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);

    point.y > min_y - NODE_HEIGHT_TOLERANCE && point.y < max_y + NODE_HEIGHT_TOLERANCE
}

/// Высота плоскости треугольника в (x, z)
///
/// None для вертикального треугольника (высота не определена).
pub fn plane_height(triangle: &[Vec3; 3], x: f32, z: f32) -> Option<f32> {
    let [a, b, c] = *triangle;
    let normal = (b - a).cross(c - a);
    if normal.y.abs() < AREA_EPSILON {
        return None;
    }

    Some(a.y - (normal.x * (x - a.x) + normal.z * (z - a.z)) / normal.y)
}

/// Ближайшая к `point` точка треугольника в XZ (x, z)
pub fn closest_point_xz(triangle: &[Vec3; 3], point: Vec3) -> Vec2 {
    if contains_xz(triangle, point) {
        return xz(point);
    }

    let p = xz(point);
    let [a, b, c] = triangle.map(xz);

    [(a, b), (b, c), (c, a)]
        .into_iter()
        .map(|(start, end)| closest_point_on_segment(start, end, p))
        .min_by(|lhs, rhs| lhs.distance_squared(p).total_cmp(&rhs.distance_squared(p)))
        .unwrap_or(p)
}

/// Проекция точки на треугольник: XZ зажимается в треугольник, y берётся с плоскости
pub fn project_onto_triangle(triangle: &[Vec3; 3], point: Vec3) -> Vec3 {
    let xz = closest_point_xz(triangle, point);
    let y = plane_height(triangle, xz.x, xz.y).unwrap_or(point.y);
    Vec3::new(xz.x, y, xz.y)
}

fn xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

fn closest_point_on_segment(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return start;
    }

    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    start + segment * t
}
