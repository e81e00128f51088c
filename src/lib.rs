//! # bevy_brawler_ai
//!
//! Spline paths, finite-state enemy AI, and projectile pooling for Bevy
//! games — the engine-side toolkit of a 2.5D platformer/brawler, split
//! out as a standalone library.
//!
//! ## Features
//!
//! - Looping Catmull-Rom splines with flatten/circle shaping tools
//! - Anchor-and-handle Bezier splines with cached forward vectors and
//!   distance-based queries
//! - Data-driven AI: authored states with per-tick actions and
//!   decision-guarded transitions, validated at load time
//! - Tag-indexed object pool with fixed pre-allocation and optional
//!   on-demand growth
//!
//! ## Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_brawler_ai::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(AiPlugin) // pulls in SplinePlugin and PoolPlugin
//!         .insert_resource(ObjectPool::new(vec![
//!             PoolItem::new("bullet", 16, spawn_projectile).expandable(),
//!         ]))
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands) {
//!     let graph = StateGraph::new(vec![
//!         State::new("patrol")
//!             .with_action(Action::Patrol { speed: 2.0 })
//!             .with_transition(Transition::new(
//!                 Decision::TargetWithin { radius: 5.0 },
//!                 StateId(1),
//!                 StateId::REMAIN,
//!             )),
//!         State::new("attack")
//!             .with_action(Action::Shoot { tag: "bullet".into(), cooldown: 2.0 })
//!             .with_transition(Transition::new(
//!                 Decision::TargetBeyond { radius: 8.0 },
//!                 StateId(0),
//!                 StateId::REMAIN,
//!             )),
//!     ])
//!     .expect("valid graph");
//!     commands.insert_resource(graph);
//!
//!     commands.spawn((
//!         Transform::from_xyz(4.0, 0.0, 0.0),
//!         StateMachine::new(StateId(0)).with_look_radius(5.0).with_waypoints(vec![
//!             Vec3::new(4.0, 0.0, 0.0),
//!             Vec3::new(-4.0, 0.0, 0.0),
//!         ]),
//!         Movement::default(),
//!     ));
//! }
//! ```
//!
//! ## Plugins
//!
//! - [`SplinePlugin`]: spline component registration and cache upkeep
//! - [`PoolPlugin`]: pool pre-allocation and projectile recycling
//! - [`AiPlugin`]: the AI dispatch loop (adds the other two if missing)
//!
//! All three subsystems are single-threaded and driven by the `Update`
//! schedule; nothing here suspends or spawns tasks.

pub mod ai;
pub mod pool;
pub mod spline;

pub use ai::AiPlugin;
pub use pool::PoolPlugin;
pub use spline::SplinePlugin;

/// Convenient re-exports of commonly used types.
pub mod prelude {
    pub use crate::ai::{
        Action, AiPlugin, Decision, GraphError, Movement, PathFollow, PerceptionTarget, State,
        StateChanged, StateGraph, StateId, StateMachine, Transition,
    };
    pub use crate::pool::{
        spawn_projectile, EntityTags, ObjectPool, PoolItem, PoolPlugin, Pooled, Projectile,
    };
    pub use crate::spline::{
        AnchorSpline, Axis, CatmullRomSpline, SplineAnchor, SplineError, SplinePlugin,
        SplineSample,
    };
}
