use bevy::prelude::*;

/// Spawns one deactivated instance of a pool item's prefab.
///
/// The pool adds its own bookkeeping components ([`Pooled`],
/// [`EntityTags`], hidden [`Visibility`]) after calling this.
pub type SpawnFn = fn(&mut Commands) -> Entity;

/// Configuration for one category of reusable entity.
#[derive(Debug, Clone)]
pub struct PoolItem {
    /// Tags this prefab answers to in [`ObjectPool::get`].
    pub tags: Vec<String>,
    /// Number of instances pre-allocated at startup.
    pub capacity: usize,
    /// Whether the pool may grow past `capacity` on demand.
    pub expandable: bool,
    /// Prefab spawner.
    pub spawn: SpawnFn,
}

impl PoolItem {
    pub fn new(tag: impl Into<String>, capacity: usize, spawn: SpawnFn) -> Self {
        Self {
            tags: vec![tag.into()],
            capacity,
            expandable: false,
            spawn,
        }
    }

    /// Allow the pool to grow this item past its capacity.
    pub fn expandable(mut self) -> Self {
        self.expandable = true;
        self
    }

    /// Add an extra tag the prefab answers to.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Bookkeeping for one live pooled entity.
#[derive(Debug, Clone, Copy)]
struct PoolEntry {
    entity: Entity,
    /// Index into [`ObjectPool`]'s item list.
    item: usize,
    active: bool,
}

/// Marker for entities owned by the [`ObjectPool`].
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Pooled;

/// String tags carried by an entity, used to match pool requests.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct EntityTags(pub Vec<String>);

impl EntityTags {
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

/// A tag-indexed pool of reusable entities.
///
/// Entities are never despawned during normal operation; they are
/// deactivated and handed out again. The live list only grows, and only
/// for items marked expandable.
///
/// All mutation happens from the main update thread via `ResMut`; growing
/// the pool from other threads would need synchronization this type does
/// not provide.
#[derive(Resource, Debug, Default)]
pub struct ObjectPool {
    items: Vec<PoolItem>,
    entries: Vec<PoolEntry>,
    populated: bool,
}

impl ObjectPool {
    pub fn new(items: Vec<PoolItem>) -> Self {
        Self {
            items,
            entries: Vec::new(),
            populated: false,
        }
    }

    /// Pre-allocate every item's capacity as deactivated entities.
    /// Called once at startup; later calls are no-ops.
    pub fn populate(&mut self, commands: &mut Commands) {
        if self.populated {
            return;
        }
        self.populated = true;

        for index in 0..self.items.len() {
            for _ in 0..self.items[index].capacity {
                self.spawn_entry(index, commands);
            }
        }
        info!("object pool pre-allocated {} entities", self.entries.len());
    }

    fn spawn_entry(&mut self, index: usize, commands: &mut Commands) -> Entity {
        let item = &self.items[index];
        let entity = (item.spawn)(commands);
        commands.entity(entity).insert((
            Pooled,
            EntityTags(item.tags.clone()),
            Visibility::Hidden,
        ));
        self.entries.push(PoolEntry {
            entity,
            item: index,
            active: false,
        });
        entity
    }

    /// Retrieve an inactive entity carrying `tag`, growing the pool if an
    /// expandable item matches. Returns `None` when the pool is exhausted
    /// and nothing can grow; callers skip gracefully.
    ///
    /// The returned entity is still hidden; the caller positions it and
    /// flips its [`Visibility`] on. A reissued entity may carry a stale
    /// [`Projectile`] clock from its last flight, so that is reset here.
    pub fn get(&mut self, tag: &str, commands: &mut Commands) -> Option<Entity> {
        for entry in &mut self.entries {
            if !entry.active && self.items[entry.item].tags.iter().any(|t| t == tag) {
                entry.active = true;
                commands
                    .entity(entry.entity)
                    .entry::<Projectile>()
                    .and_modify(|mut clock| clock.elapsed = 0.0);
                return Some(entry.entity);
            }
        }

        for index in 0..self.items.len() {
            let item = &self.items[index];
            if item.expandable && item.tags.iter().any(|t| t == tag) {
                let entity = self.spawn_entry(index, commands);
                info!("object pool grew for tag {tag:?}");
                if let Some(entry) = self.entries.last_mut() {
                    entry.active = true;
                }
                return Some(entity);
            }
        }

        None
    }

    /// Return an entity to the pool.
    ///
    /// Called by the entity's own lifetime logic (expiry or consumption on
    /// hit), not by the pool; the caller also hides the entity. Per-entity
    /// timers are reset when the entity is next handed out.
    pub fn recycle(&mut self, entity: Entity) {
        match self.entries.iter_mut().find(|e| e.entity == entity) {
            Some(entry) => entry.active = false,
            None => warn!("recycled {entity} which is not pool-owned"),
        }
    }

    /// Whether `entity` is currently handed out.
    pub fn is_active(&self, entity: Entity) -> bool {
        self.entries
            .iter()
            .any(|e| e.entity == entity && e.active)
    }

    /// Total number of live entities, active or not.
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

/// A pooled projectile's lifetime clock.
///
/// Once activated it flies until its lifetime expires or something
/// consumes it, then recycles itself back into the pool.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    /// Seconds the projectile stays live after activation.
    pub lifetime: f32,
    /// Seconds since activation.
    pub elapsed: f32,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            lifetime: 3.0,
            elapsed: 0.0,
        }
    }
}

impl Projectile {
    pub fn new(lifetime: f32) -> Self {
        Self {
            lifetime,
            elapsed: 0.0,
        }
    }
}

/// Default prefab spawner for projectile items.
pub fn spawn_projectile(commands: &mut Commands) -> Entity {
    commands
        .spawn((Transform::default(), Projectile::default()))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_bare(commands: &mut Commands) -> Entity {
        commands.spawn(Transform::default()).id()
    }

    fn populated(world: &mut World, items: Vec<PoolItem>) -> ObjectPool {
        let mut pool = ObjectPool::new(items);
        let mut commands = world.commands();
        pool.populate(&mut commands);
        drop(commands);
        world.flush();
        pool
    }

    fn get(world: &mut World, pool: &mut ObjectPool, tag: &str) -> Option<Entity> {
        let mut commands = world.commands();
        let entity = pool.get(tag, &mut commands);
        drop(commands);
        world.flush();
        entity
    }

    #[test]
    fn test_fixed_capacity_exhausts_to_none() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 2, spawn_bare)],
        );

        let first = get(&mut world, &mut pool, "bullet");
        let second = get(&mut world, &mut pool, "bullet");
        let third = get(&mut world, &mut pool, "bullet");

        assert!(first.is_some());
        assert!(second.is_some());
        assert_ne!(first, second);
        assert_eq!(third, None);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_expandable_grows_instead_of_none() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 1, spawn_bare).expandable()],
        );

        let first = get(&mut world, &mut pool, "bullet");
        let grown = get(&mut world, &mut pool, "bullet");

        assert!(first.is_some());
        assert!(grown.is_some());
        assert_ne!(first, grown);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_recycle_makes_entity_available_again() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 1, spawn_bare)],
        );

        let first = get(&mut world, &mut pool, "bullet").unwrap();
        assert!(pool.is_active(first));
        assert_eq!(get(&mut world, &mut pool, "bullet"), None);

        pool.recycle(first);
        assert!(!pool.is_active(first));
        assert_eq!(get(&mut world, &mut pool, "bullet"), Some(first));
    }

    #[test]
    fn test_reissued_projectile_starts_with_a_fresh_clock() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 1, spawn_projectile)],
        );

        // mid-flight, then consumed on hit and handed back
        let first = get(&mut world, &mut pool, "bullet").unwrap();
        world.get_mut::<Projectile>(first).unwrap().elapsed = 2.5;
        world.entity_mut(first).insert(Visibility::Hidden);
        pool.recycle(first);

        let again = get(&mut world, &mut pool, "bullet").unwrap();
        assert_eq!(again, first);
        assert_eq!(world.get::<Projectile>(again).unwrap().elapsed, 0.0);
    }

    #[test]
    fn test_unknown_tag_returns_none() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 2, spawn_bare)],
        );

        assert_eq!(get(&mut world, &mut pool, "rocket"), None);
    }

    #[test]
    fn test_secondary_tags_match() {
        let mut world = World::new();
        let mut pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 1, spawn_bare).with_tag("hazard")],
        );

        assert!(get(&mut world, &mut pool, "hazard").is_some());
    }

    #[test]
    fn test_pooled_entities_spawn_hidden_and_tagged() {
        let mut world = World::new();
        let pool = populated(
            &mut world,
            vec![PoolItem::new("bullet", 1, spawn_bare)],
        );
        assert_eq!(pool.live_count(), 1);

        let mut query = world.query::<(&EntityTags, &Visibility, &Pooled)>();
        let (tags, visibility, _) = query.single(&world).unwrap();
        assert!(tags.contains("bullet"));
        assert_eq!(*visibility, Visibility::Hidden);
    }
}
