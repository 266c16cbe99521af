//! Navigation systems (ECS)

use bevy::prelude::*;

use super::components::{NavAgent, NavPath, NavPathRequest};
use super::events::SetNavMesh;
use super::system::NavigationSystem;
use crate::components::EyeHeight;
use crate::{log, log_error, log_warning};

/// Система: SetNavMesh → NavigationSystem::set_nav_mesh
pub fn apply_nav_mesh_requests(
    mut requests: EventReader<SetNavMesh>,
    mut nav: ResMut<NavigationSystem>,
) {
    for request in requests.read() {
        if let Err(error) = nav.set_nav_mesh(&request.surface) {
            log_error(&format!("SetNavMesh rejected, keeping previous mesh: {}", error));
        }
    }
}

/// Система: новые NavAgent → регистрация
pub fn register_nav_agents(
    added: Query<Entity, Added<NavAgent>>,
    mut nav: ResMut<NavigationSystem>,
) {
    for entity in added.iter() {
        if nav.register_agent(entity) {
            log(&format!("NavAgent registered: {:?}", entity));
        }
    }
}

/// Система: удалённые NavAgent (или despawn) → снятие регистрации
pub fn unregister_nav_agents(
    mut removed: RemovedComponents<NavAgent>,
    mut nav: ResMut<NavigationSystem>,
) {
    for entity in removed.read() {
        if nav.unregister_agent(entity) {
            log(&format!("NavAgent unregistered: {:?}", entity));
        }
    }
}

/// Система: NavPathRequest → NavPath
///
/// Путь строится от точки на поверхности (позиция минус EyeHeight).
/// Запрос удаляется всегда; недостижимый target: warning, NavPath не меняется.
pub fn resolve_path_requests(
    mut commands: Commands,
    nav: Res<NavigationSystem>,
    requests: Query<(Entity, &Transform, &NavPathRequest, Option<&EyeHeight>)>,
) {
    for (entity, transform, request, eye_height) in requests.iter() {
        let from = transform.translation - Vec3::Y * eye_height.map_or(0.0, |height| height.0);

        match nav.find_path(from, request.target) {
            Some(waypoints) => {
                log(&format!(
                    "Path for {:?}: {} waypoints → {:?}",
                    entity,
                    waypoints.len(),
                    request.target
                ));
                commands
                    .entity(entity)
                    .insert(NavPath::new(waypoints))
                    .remove::<NavPathRequest>();
            }
            None => {
                log_warning(&format!(
                    "No path for {:?}: {:?} → {:?}",
                    entity, from, request.target
                ));
                commands.entity(entity).remove::<NavPathRequest>();
            }
        }
    }
}
