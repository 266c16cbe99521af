//! Controls systems (ECS)

use bevy::prelude::*;

use super::arbiter::{AgentState, ControlArbiter};
use crate::components::{AgentVelocity, EyeHeight, ViewRotation};
use crate::navigation::NavigationSystem;

/// Система: один tick арбитра для каждого агента
///
/// dt берётся из frame time (не Fixed): frame spike detection должен видеть
/// реальные провалы FPS.
/// NavigationSystem опционален — без него navmesh режим работает как pass-through.
pub fn tick_control_arbiters(
    time: Res<Time>,
    nav: Option<Res<NavigationSystem>>,
    mut agents: Query<(
        &mut ControlArbiter,
        &mut Transform,
        &mut AgentVelocity,
        &mut ViewRotation,
        Option<&EyeHeight>,
    )>,
) {
    let dt_millis = time.delta_secs() * 1000.0;
    let nav = nav.as_deref();

    for (mut arbiter, mut transform, mut velocity, mut rotation, eye_height) in agents.iter_mut() {
        // Tick работает с копиями: компоненты помечаются changed только при реальном изменении
        let mut position = transform.translation;
        let mut next_velocity = velocity.0;
        let mut next_rotation = *rotation;

        let agent = AgentState {
            position: &mut position,
            velocity: &mut next_velocity,
            rotation: &mut next_rotation,
            eye_height: eye_height.map_or(0.0, |height| height.0),
        };
        arbiter.tick(Some(dt_millis), agent, nav);

        if transform.translation != position {
            transform.translation = position;
        }
        velocity.set_if_neq(AgentVelocity(next_velocity));
        rotation.set_if_neq(next_rotation);
    }
}

/// Система: ViewRotation → Transform.rotation (для камеры/визуала)
pub fn sync_view_rotation_to_transform(
    mut query: Query<(&ViewRotation, &mut Transform), Changed<ViewRotation>>,
) {
    for (rotation, mut transform) in query.iter_mut() {
        transform.rotation = rotation.to_quat();
    }
}
