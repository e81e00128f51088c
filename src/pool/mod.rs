//! Tag-indexed pooling of reusable entities (projectiles and the like).
//!
//! Configure the pool as a resource before startup, then request entities
//! by tag at runtime:
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_brawler_ai::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PoolPlugin)
//!         .insert_resource(ObjectPool::new(vec![
//!             PoolItem::new("bullet", 16, spawn_projectile).expandable(),
//!         ]))
//!         .run();
//! }
//!
//! fn fire(mut commands: Commands, mut pool: ResMut<ObjectPool>) {
//!     if let Some(bullet) = pool.get("bullet", &mut commands) {
//!         commands.entity(bullet).insert((
//!             Transform::from_xyz(0.0, 1.0, 0.0),
//!             Visibility::Inherited,
//!         ));
//!     }
//! }
//! ```

mod components;
mod systems;

pub use components::*;
pub use systems::{populate_pool, tick_projectiles};

use bevy::prelude::*;

/// Plugin that pre-allocates the [`ObjectPool`] at startup and runs
/// projectile lifetime recycling.
pub struct PoolPlugin;

impl Plugin for PoolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ObjectPool>()
            .register_type::<Pooled>()
            .register_type::<EntityTags>()
            .register_type::<Projectile>()
            .add_systems(Startup, systems::populate_pool)
            .add_systems(Update, systems::tick_projectiles);
    }
}
