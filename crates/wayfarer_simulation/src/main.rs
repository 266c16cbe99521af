//! Headless симуляция Wayfarer
//!
//! Агент в navmesh режиме ходит по случайным точкам плоской арены:
//! NavPathRequest → NavPath → ScriptedInput → ControlArbiter → clamp по navmesh.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::Rng;
use std::time::Duration;

use wayfarer_simulation::{
    create_headless_app, log_error, log_info, set_log_level, Agent, AgentSet, ArbiterConfig, ControlArbiter,
    ControlBindings, DeterministicRng, EyeHeight, LogLevel, MovementCapability, NavAgent, NavPath,
    NavPathRequest, ScriptedInput, SetNavMesh, SimulationPlugin, SurfaceMesh,
};

/// Половина размера арены (м)
const ARENA_HALF_EXTENT: f32 = 8.0;
/// Радиус достижения waypoint (м)
const ARRIVAL_RADIUS: f32 = 0.3;

/// Scripted "клавиатура" агента (клон привязан к арбитру)
#[derive(Component)]
struct Steering(ScriptedInput);

fn main() {
    let seed = 42;
    set_log_level(LogLevel::Info);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        // 60 FPS без зависимости от wall clock
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_micros(16_667)))
        .add_systems(
            Update,
            (pick_next_target, steer_along_path)
                .chain()
                .before(AgentSet::Navigation),
        );

    log_info(&format!("Starting Wayfarer headless simulation (seed: {})", seed));

    app.world_mut().send_event(SetNavMesh {
        surface: SurfaceMesh::flat_grid(
            Vec3::new(-ARENA_HALF_EXTENT, 0.0, -ARENA_HALF_EXTENT),
            16,
            16,
            1.0,
        ),
    });

    let agent = match spawn_walker(app.world_mut()) {
        Ok(entity) => entity,
        Err(error) => {
            log_error(&format!("Failed to create walker: {}", error));
            return;
        }
    };

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            if let Some(transform) = app.world().get::<Transform>(agent) {
                log_info(&format!("Tick {}: walker at {:?}", tick, transform.translation));
            }
        }
    }

    log_info("Simulation complete!");
}

fn spawn_walker(world: &mut World) -> Result<Entity, wayfarer_simulation::ControlError> {
    let input = ScriptedInput::inactive();
    let bindings =
        ControlBindings::new().with_movement("keyboard", MovementCapability::delta(input.clone()));
    let config = ArbiterConfig {
        use_nav_mesh: true,
        ..Default::default()
    };
    let arbiter = ControlArbiter::new(config, bindings)?;

    Ok(world
        .spawn((
            Agent,
            Transform::from_xyz(0.0, 1.6, 0.0),
            EyeHeight(1.6),
            NavAgent,
            arbiter,
            Steering(input),
        ))
        .id())
}

/// Система: новый случайный target, когда путь пройден
fn pick_next_target(
    mut commands: Commands,
    mut rng: ResMut<DeterministicRng>,
    walkers: Query<(Entity, Option<&NavPath>), (With<Steering>, Without<NavPathRequest>)>,
) {
    for (entity, path) in walkers.iter() {
        if path.is_some_and(|path| !path.is_finished()) {
            continue;
        }

        let target = Vec3::new(
            rng.rng.gen_range(-ARENA_HALF_EXTENT + 0.5..ARENA_HALF_EXTENT - 0.5),
            0.0,
            rng.rng.gen_range(-ARENA_HALF_EXTENT + 0.5..ARENA_HALF_EXTENT - 0.5),
        );
        commands.entity(entity).insert(NavPathRequest { target });
    }
}

/// Система: направление на текущий waypoint → scripted input
///
/// yaw агента не меняется, поэтому local delta совпадает с world направлением.
fn steer_along_path(
    mut walkers: Query<(&Transform, &EyeHeight, &Steering, Option<&mut NavPath>)>,
) {
    for (transform, eye_height, steering, path) in walkers.iter_mut() {
        let feet = transform.translation - Vec3::Y * eye_height.0;

        let waypoint = path.and_then(|mut path| path.advance(feet, ARRIVAL_RADIUS));
        let Some(waypoint) = waypoint else {
            steering.0.set_active(false);
            continue;
        };

        let direction = Vec3::new(waypoint.x - feet.x, 0.0, waypoint.z - feet.z);
        // |delta| > 1 → полный input
        steering.0.set(direction.normalize_or_zero() * 2.0);
        steering.0.set_active(true);
    }
}
