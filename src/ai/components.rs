use bevy::prelude::*;

use super::graph::StateId;

/// The per-entity AI controller: which state it is in, how long it has
/// been there, and the mutable context actions and decisions work with.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct StateMachine {
    /// Current state in the shared [`StateGraph`](crate::ai::StateGraph).
    pub current: StateId,
    /// Seconds spent in the current state; advanced exactly once per tick,
    /// before actions or decisions run.
    pub elapsed: f32,
    /// Target acquired by the perception scan, if any.
    pub target: Option<Entity>,
    /// Radius of the perception scan.
    pub look_radius: f32,
    /// Waypoint ring for [`Action::Patrol`](crate::ai::Action::Patrol).
    pub waypoints: Vec<Vec3>,
    /// Index of the waypoint currently being walked to.
    pub next_waypoint: usize,
    /// Seconds since the last shot (or since spawn, before the first);
    /// starting at zero makes the first shot wait a full cooldown.
    pub shoot_timer: f32,
    /// Inactive controllers are skipped entirely.
    pub active: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            current: StateId(0),
            elapsed: 0.0,
            target: None,
            look_radius: 1.0,
            waypoints: Vec::new(),
            next_waypoint: 0,
            shoot_timer: 0.0,
            active: true,
        }
    }
}

impl StateMachine {
    /// Create a controller starting in the given state.
    pub fn new(initial: StateId) -> Self {
        Self {
            current: initial,
            ..default()
        }
    }

    /// Set the perception scan radius.
    pub fn with_look_radius(mut self, radius: f32) -> Self {
        self.look_radius = radius;
        self
    }

    /// Set the patrol waypoint ring.
    pub fn with_waypoints(mut self, waypoints: Vec<Vec3>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Request a transition.
    ///
    /// [`StateId::REMAIN`] is a no-op: the current state and its timer are
    /// untouched. Any other target replaces the current state and resets
    /// the timer, including re-entry into the same state.
    pub fn transition_to(&mut self, new_state: StateId) {
        if new_state == StateId::REMAIN {
            return;
        }
        self.current = new_state;
        self.elapsed = 0.0;
    }
}

/// Straight-line kinematic movement toward a destination.
///
/// The dispatcher's actions set the destination; the
/// [`integrate_movement`](crate::ai::integrate_movement) system steps the
/// entity's [`Transform`] toward it each tick, turning about Y only.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Movement {
    /// World units per second.
    pub speed: f32,
    /// Turn rate used when slerping toward the travel direction.
    pub turn_speed: f32,
    /// Arrival tolerance around the destination.
    pub epsilon: f32,
    /// Where to go; `None` means idle.
    pub destination: Option<Vec3>,
    /// A stopped entity keeps its destination but does not move.
    pub stopped: bool,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            speed: 1.0,
            turn_speed: 10.0,
            epsilon: 0.1,
            destination: None,
            stopped: false,
        }
    }
}

impl Movement {
    /// Head for `destination` at `speed`, resuming if stopped.
    pub fn go_to(&mut self, destination: Vec3, speed: f32) {
        self.destination = Some(destination);
        self.speed = speed;
        self.stopped = false;
    }

    /// Stop moving; the destination is kept.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether `position` is within the arrival tolerance of the
    /// destination. Idle movement counts as arrived.
    pub fn arrived(&self, position: Vec3) -> bool {
        match self.destination {
            Some(destination) => position.distance(destination) <= self.epsilon,
            None => true,
        }
    }
}

/// Marks an entity the perception scan may acquire as a target
/// (typically the player).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PerceptionTarget;

/// Progress along an [`AnchorSpline`](crate::spline::AnchorSpline) for
/// [`Action::FollowPath`](crate::ai::Action::FollowPath).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct PathFollow {
    /// Entity carrying the spline to follow.
    pub spline: Entity,
    /// Distance traveled from the start of the spline, in world units.
    pub distance: f32,
}

impl PathFollow {
    pub fn new(spline: Entity) -> Self {
        Self {
            spline,
            distance: 0.0,
        }
    }
}

/// Message written whenever a controller lands in a different state than
/// it started the tick in.
#[derive(Message, Debug, Clone)]
pub struct StateChanged {
    pub entity: Entity,
    pub from: StateId,
    pub to: StateId,
}
