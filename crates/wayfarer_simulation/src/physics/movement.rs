//! Интеграция committed velocity агента
//!
//! Архитектура:
//! - ControlArbiter (use_nav_mesh = false) пишет AgentVelocity
//! - Headless: integrate_agent_velocity → Transform.translation
//! - Rapier: sync_velocity_to_rapier → Velocity.linvel (KinematicVelocityBased),
//!   Rapier сам двигает тело и разрешает коллизии
//!
//! Агенты в navmesh режиме двигаются арбитром напрямую и здесь пропускаются.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::AgentVelocity;
use crate::controls::ControlArbiter;
use crate::AgentSet;

/// Система интеграции velocity → Transform (headless режим, без Rapier)
///
/// position += velocity * dt. Entity с Rapier Velocity пропускаются:
/// их двигает physics step.
pub fn integrate_agent_velocity(
    mut query: Query<(&AgentVelocity, &mut Transform, Option<&ControlArbiter>), Without<Velocity>>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (velocity, mut transform, arbiter) in query.iter_mut() {
        if arbiter.is_some_and(|arbiter| arbiter.config().use_nav_mesh) {
            continue;
        }

        transform.translation += velocity.0 * delta;
    }
}

/// Система: AgentVelocity → Rapier Velocity.linvel
pub fn sync_velocity_to_rapier(mut query: Query<(&AgentVelocity, &mut Velocity, Option<&ControlArbiter>)>) {
    for (velocity, mut rapier_velocity, arbiter) in query.iter_mut() {
        // Navmesh агент двигается арбитром, physics не должна добавлять смещение
        rapier_velocity.linvel = if arbiter.is_some_and(|arbiter| arbiter.config().use_nav_mesh) {
            Vec3::ZERO
        } else {
            velocity.0
        };
    }
}

/// Headless интеграция (после арбитров)
pub struct KinematicIntegrationPlugin;

impl Plugin for KinematicIntegrationPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_agent_sets(app);

        app.add_systems(Update, integrate_agent_velocity.in_set(AgentSet::Integration));
    }
}

/// Мост в Rapier (host подключает вместе с RapierPhysicsPlugin)
///
/// Наша система запускается ДО rapier physics step.
pub struct RapierVelocityBridgePlugin;

impl Plugin for RapierVelocityBridgePlugin {
    fn build(&self, app: &mut App) {
        use bevy_rapier3d::plugin::PhysicsSet;

        crate::configure_agent_sets(app);

        app.add_systems(
            Update,
            sync_velocity_to_rapier
                .in_set(AgentSet::Integration)
                .before(PhysicsSet::SyncBackend),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Agent;
    use crate::controls::{ArbiterConfig, ControlBindings};
    use bevy::ecs::system::RunSystemOnce;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
                Duration::from_millis(100),
            ))
            .add_plugins(KinematicIntegrationPlugin);
        app
    }

    #[test]
    fn test_headless_integration_moves_agent() {
        let mut app = app();
        let entity = app
            .world_mut()
            .spawn((Agent, AgentVelocity(Vec3::new(1.0, 0.0, -2.0))))
            .id();

        // Первый update с нулевым delta
        app.update();
        app.update();

        let position = app.world().get::<Transform>(entity).unwrap().translation;
        assert!((position - Vec3::new(0.1, 0.0, -0.2)).length() < 1e-4, "{:?}", position);
    }

    #[test]
    fn test_nav_mode_agent_not_integrated() {
        let mut app = app();
        let config = ArbiterConfig {
            use_nav_mesh: true,
            ..Default::default()
        };
        let arbiter = ControlArbiter::new(config, ControlBindings::new()).unwrap();
        let entity = app
            .world_mut()
            .spawn((Agent, AgentVelocity(Vec3::X), arbiter))
            .id();

        app.update();
        app.update();

        assert_eq!(app.world().get::<Transform>(entity).unwrap().translation, Vec3::ZERO);
    }

    #[test]
    fn test_rapier_velocity_mirrors_agent_velocity() {
        let mut world = World::new();
        let entity = world
            .spawn((AgentVelocity(Vec3::new(3.0, 0.0, 1.0)), Velocity::default()))
            .id();

        world.run_system_once(sync_velocity_to_rapier).unwrap();

        assert_eq!(world.get::<Velocity>(entity).unwrap().linvel, Vec3::new(3.0, 0.0, 1.0));
    }
}
