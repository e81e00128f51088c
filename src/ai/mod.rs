//! Finite-state AI dispatch.
//!
//! Behavior is authored as a [`StateGraph`]: each state holds a list of
//! [`Action`]s run every tick and a list of [`Transition`]s, each pairing a
//! pure [`Decision`] with true/false target states. Entities carry a
//! [`StateMachine`] pointing into the graph plus a [`Movement`] component
//! the actions drive.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_brawler_ai::prelude::*;
//!
//! fn setup(mut commands: Commands) {
//!     let patrol = StateId(0);
//!     let attack = StateId(1);
//!
//!     let graph = StateGraph::new(vec![
//!         State::new("patrol")
//!             .with_action(Action::Patrol { speed: 2.0 })
//!             .with_transition(Transition::new(
//!                 Decision::TargetWithin { radius: 5.0 },
//!                 attack,
//!                 StateId::REMAIN,
//!             )),
//!         State::new("attack")
//!             .with_action(Action::Chase { speed: 4.0 })
//!             .with_action(Action::Shoot { tag: "bullet".into(), cooldown: 2.0 })
//!             .with_transition(Transition::new(
//!                 Decision::TargetBeyond { radius: 8.0 },
//!                 patrol,
//!                 StateId::REMAIN,
//!             )),
//!     ])
//!     .expect("valid graph");
//!
//!     commands.insert_resource(graph);
//!     commands.spawn((
//!         Transform::default(),
//!         StateMachine::new(patrol).with_look_radius(5.0),
//!         Movement::default(),
//!     ));
//! }
//! ```

mod components;
mod graph;
mod systems;

pub use components::*;
pub use graph::*;
pub use systems::{integrate_movement, tick_state_machines};

use bevy::prelude::*;

use crate::pool::PoolPlugin;
use crate::spline::SplinePlugin;

/// Plugin driving the per-tick AI dispatch loop.
///
/// Within one tick, a state's actions all run before its transitions are
/// evaluated, and movement integration runs after every controller has
/// been dispatched.
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<SplinePlugin>() {
            app.add_plugins(SplinePlugin);
        }
        if !app.is_plugin_added::<PoolPlugin>() {
            app.add_plugins(PoolPlugin);
        }

        app.register_type::<StateId>()
            .register_type::<StateMachine>()
            .register_type::<Movement>()
            .register_type::<PerceptionTarget>()
            .register_type::<PathFollow>()
            .add_message::<StateChanged>()
            .add_systems(
                Update,
                (systems::tick_state_machines, systems::integrate_movement).chain(),
            );
    }
}
