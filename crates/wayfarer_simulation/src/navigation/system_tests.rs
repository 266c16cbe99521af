//! Tests for NavigationSystem queries (clamp, path, mesh replacement).

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use proptest::prelude::*;

    use crate::navigation::{NavMeshError, NavigationSystem, SurfaceMesh};

    fn grid_system(columns: u32, rows: u32) -> NavigationSystem {
        let mut nav = NavigationSystem::default();
        nav.set_nav_mesh(&SurfaceMesh::flat_grid(Vec3::ZERO, columns, rows, 1.0))
            .unwrap();
        nav
    }

    /// 3×3 сетка без центральной клетки (x, z ∈ [1, 2])
    fn ring_system() -> NavigationSystem {
        let mut surface = SurfaceMesh::flat_grid(Vec3::ZERO, 3, 3, 1.0);
        // Клетка (row 1, column 1): индексы 24..30
        surface.indices.drain(24..30);

        let mut nav = NavigationSystem::default();
        nav.set_nav_mesh(&surface).unwrap();
        nav
    }

    fn assert_vec_near(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_without_mesh_everything_passes_through() {
        let nav = NavigationSystem::default();
        let end = Vec3::new(5.0, 1.0, -3.0);

        assert!(!nav.has_nav_mesh());
        assert_eq!(nav.clamp_to_segment(Vec3::ZERO, end), end);
        assert!(nav.find_path(Vec3::ZERO, end).is_none());
        assert!(nav.closest_node(Vec3::ZERO, None).is_none());
    }

    #[test]
    fn test_start_off_mesh_passes_through() {
        let nav = grid_system(2, 2);
        let end = Vec3::new(-4.0, 0.0, -4.0);

        assert_eq!(nav.clamp_to_segment(Vec3::new(-3.0, 0.0, -3.0), end), end);
    }

    #[test]
    fn test_same_node_returns_end() {
        let nav = grid_system(2, 2);
        let end = Vec3::new(0.8, 0.0, 0.25);

        assert_eq!(nav.clamp_to_segment(Vec3::new(0.7, 0.0, 0.2), end), end);
    }

    #[test]
    fn test_off_mesh_end_slides_along_start_node() {
        let nav = grid_system(2, 2);
        let end = Vec3::new(0.5, 0.0, -0.5);

        let clamped = nav.clamp_to_segment(Vec3::new(0.5, 0.0, 0.05), end);

        assert_ne!(clamped, end);
        assert_vec_near(clamped, Vec3::new(0.5, 0.0, 0.0));
        assert!(nav.closest_node(clamped, None).is_some());
    }

    #[test]
    fn test_different_node_reprojects_height() {
        // Плоская клетка + пандус вверх до y = 0.4
        let surface = SurfaceMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(2.0, 0.4, 0.0),
                Vec3::new(2.0, 0.4, 1.0),
            ],
            vec![0, 1, 2, 0, 2, 3, 1, 4, 5, 1, 5, 2],
        );
        let mut nav = NavigationSystem::default();
        nav.set_nav_mesh(&surface).unwrap();

        let clamped = nav.clamp_to_segment(Vec3::new(0.8, 0.0, 0.5), Vec3::new(1.5, 0.0, 0.5));

        assert_vec_near(clamped, Vec3::new(1.5, 0.2, 0.5));
    }

    #[test]
    fn test_clamp_zero_length_segment_is_identity() {
        let nav = grid_system(2, 2);

        for point in [
            Vec3::new(0.3, 0.0, 0.9),
            Vec3::new(1.5, 0.2, 1.5),
            Vec3::new(-7.0, 3.0, 2.0),
        ] {
            assert_eq!(nav.clamp_to_segment(point, point), point);
        }
    }

    #[test]
    fn test_clamp_does_not_cross_into_other_island() {
        let island = SurfaceMesh::flat_grid(Vec3::ZERO, 1, 1, 1.0);
        let other = SurfaceMesh::flat_grid(Vec3::new(1.0, 0.0, 0.0), 1, 1, 1.0);
        // Острова касаются по x = 1, но вершины не общие: разные y
        let other = SurfaceMesh::new(
            other.vertices.iter().map(|v| *v + Vec3::Y * 0.3).collect(),
            other.indices,
        );
        let mut nav = NavigationSystem::default();
        let stats = nav.set_nav_mesh(&island.merged(&other)).unwrap();
        assert_eq!(stats.groups, 2);

        let end = Vec3::new(1.5, 0.3, 0.2);
        let clamped = nav.clamp_to_segment(Vec3::new(0.8, 0.0, 0.2), end);

        assert_vec_near(clamped, Vec3::new(1.0, 0.0, 0.2));
        assert!(nav.find_path(Vec3::new(0.8, 0.0, 0.2), end).is_none());
    }

    #[test]
    fn test_find_path_same_node_is_target() {
        let nav = grid_system(2, 2);
        let target = Vec3::new(0.8, 0.0, 0.25);

        assert_eq!(nav.find_path(Vec3::new(0.7, 0.0, 0.2), target), Some(vec![target]));
    }

    #[test]
    fn test_find_path_straight_strip_is_single_waypoint() {
        let nav = grid_system(4, 1);
        let target = Vec3::new(3.8, 0.0, 0.5);

        let path = nav.find_path(Vec3::new(0.2, 0.0, 0.5), target).unwrap();

        assert_eq!(path, vec![target]);
    }

    #[test]
    fn test_find_path_goes_around_hole() {
        let nav = ring_system();
        let from = Vec3::new(0.2, 0.0, 1.5);
        let target = Vec3::new(2.8, 0.0, 1.5);

        let path = nav.find_path(from, target).unwrap();

        assert!(path.len() >= 2, "path must bend around hole: {:?}", path);
        assert_eq!(path.last(), Some(&target));

        let mut previous = from;
        for waypoint in &path {
            assert!(nav.closest_node(*waypoint, None).is_some(), "{:?} off mesh", waypoint);
            let middle = (previous + *waypoint) * 0.5;
            assert!(nav.closest_node(middle, None).is_some(), "segment through hole at {:?}", middle);
            previous = *waypoint;
        }
    }

    #[test]
    fn test_find_path_off_mesh_target_is_none() {
        let nav = grid_system(2, 2);

        assert!(nav.find_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(10.0, 0.0, 10.0)).is_none());
        assert!(nav.find_path(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.5, 0.0, 0.5)).is_none());
    }

    #[test]
    fn test_invalid_mesh_keeps_previous() {
        let mut nav = grid_system(2, 2);
        let before = nav.nav_mesh().unwrap().stats();

        let result = nav.set_nav_mesh(&SurfaceMesh::new(vec![Vec3::ZERO], vec![0, 1, 2]));

        assert_eq!(
            result,
            Err(NavMeshError::IndexOutOfBounds { index: 1, vertex_count: 1 })
        );
        assert_eq!(nav.nav_mesh().unwrap().stats(), before);
    }

    #[test]
    fn test_clear_nav_mesh() {
        let mut nav = grid_system(1, 1);
        nav.clear_nav_mesh();

        assert!(!nav.has_nav_mesh());
        assert!(nav.group_of(Vec3::new(0.5, 0.0, 0.2)).is_none());
    }

    #[test]
    fn test_agent_registration() {
        let mut nav = NavigationSystem::default();
        let agent = Entity::from_raw(7);

        assert!(nav.register_agent(agent));
        assert!(!nav.register_agent(agent));
        assert!(nav.is_registered(agent));
        assert_eq!(nav.agent_count(), 1);

        assert!(nav.unregister_agent(agent));
        assert!(!nav.unregister_agent(agent));
        assert_eq!(nav.agent_count(), 0);
    }

    proptest! {
        #[test]
        fn clamp_without_mesh_is_pass_through(
            sx in -100.0f32..100.0, sy in -100.0f32..100.0, sz in -100.0f32..100.0,
            ex in -100.0f32..100.0, ey in -100.0f32..100.0, ez in -100.0f32..100.0,
        ) {
            let nav = NavigationSystem::default();
            let end = Vec3::new(ex, ey, ez);
            prop_assert_eq!(nav.clamp_to_segment(Vec3::new(sx, sy, sz), end), end);
        }

        #[test]
        fn clamp_from_mesh_stays_on_mesh(
            sx in 0.05f32..3.95, sz in 0.05f32..3.95,
            ex in -5.0f32..9.0, ez in -5.0f32..9.0,
        ) {
            let nav = grid_system(4, 4);
            let clamped = nav.clamp_to_segment(Vec3::new(sx, 0.0, sz), Vec3::new(ex, 0.0, ez));

            prop_assert!(nav.closest_node(clamped, None).is_some(), "{:?} off mesh", clamped);
        }
    }
}
