//! Wayfarer Simulation Core
//!
//! ECS-симуляция агентов от первого лица на Bevy 0.16
//!
//! - controls: арбитраж input sources (ControlArbiter) + интеграция движения
//! - navigation: navmesh, clamp движения, поиск пути
//! - physics: интеграция committed velocity (headless / Rapier bridge)
//!
//! Host (движок, headless binary, тесты) владеет agent state и input providers.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod components;
pub mod controls;
pub mod logger;
pub mod navigation;
pub mod physics;

// Re-export базовых типов для удобства
pub use components::*;
pub use controls::{
    ArbiterConfig, ControlArbiter, ControlBindings, ControlError, ControlsPlugin, MovementCapability,
    RotationCapability, ScriptedInput,
};
pub use logger::*;
pub use navigation::{
    NavAgent, NavMeshError, NavPath, NavPathRequest, NavigationPlugin, NavigationSystem, SetNavMesh,
    SurfaceMesh,
};
pub use physics::{KinematicIntegrationPlugin, RapierVelocityBridgePlugin};

/// Порядок агентских систем внутри кадра (Update)
///
/// Navigation (mesh, пути) → Control (арбитры) → Integration (velocity → position)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentSet {
    Navigation,
    Control,
    Integration,
}

/// Порядок AgentSet (вызывается каждым plugin, повторный вызов безопасен)
pub fn configure_agent_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (AgentSet::Navigation, AgentSet::Control, AgentSet::Integration).chain(),
    );
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Детерминистичный RNG (seed по умолчанию, если host не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_plugins((NavigationPlugin, ControlsPlugin, KinematicIntegrationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Подсистемы не подключены: host добавляет SimulationPlugin (или отдельные plugins).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
