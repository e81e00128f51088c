use bevy::prelude::*;

use super::components::{ObjectPool, Pooled, Projectile};

/// Pre-allocate pool capacity at startup.
pub fn populate_pool(mut commands: Commands, mut pool: ResMut<ObjectPool>) {
    pool.populate(&mut commands);
}

/// Advance active projectiles' lifetime clocks, recycling expired ones.
///
/// Recycling is driven by the projectile itself, not the pool: the clock
/// resets, the entity hides, and its pool entry frees up for reuse.
pub fn tick_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut pool: ResMut<ObjectPool>,
    mut projectiles: Query<(Entity, &mut Projectile, &Visibility), With<Pooled>>,
) {
    let dt = time.delta_secs();

    for (entity, mut projectile, visibility) in &mut projectiles {
        if *visibility == Visibility::Hidden {
            continue;
        }

        projectile.elapsed += dt;
        if projectile.elapsed >= projectile.lifetime {
            projectile.elapsed = 0.0;
            commands.entity(entity).insert(Visibility::Hidden);
            pool.recycle(entity);
        }
    }
}
