use bevy::prelude::*;
use std::fmt;

/// Index of a state inside a [`StateGraph`].
///
/// [`StateId::REMAIN`] is a sentinel meaning "stay in the current state
/// without resetting its timer"; it is valid as a transition target but
/// never as a controller's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct StateId(pub usize);

impl StateId {
    /// Sentinel target: no transition, keep the current state and timer.
    pub const REMAIN: StateId = StateId(usize::MAX);
}

/// A pure predicate over the controller's tick context.
///
/// The closed set below covers the authored behaviors: proximity checks
/// against the perception scan, state-timer checks, and arrival checks.
/// Target acquisition is *not* a decision side effect; the dispatcher
/// assigns the scanned target explicitly before decisions run.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum Decision {
    /// A perceivable entity is within `radius` of the controller.
    TargetWithin { radius: f32 },
    /// The acquired target is missing or farther than `radius`.
    TargetBeyond { radius: f32 },
    /// The state has been active for at least `duration` seconds.
    Elapsed { duration: f32 },
    /// The controller's movement has reached its destination.
    Arrived,
}

/// Per-tick context the dispatcher hands to decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionCtx {
    /// Distance to the nearest perceivable entity, if any exist.
    pub nearest_distance: Option<f32>,
    /// Distance to the currently acquired target, if still alive.
    pub target_distance: Option<f32>,
    /// Seconds spent in the current state, advanced once this tick.
    pub elapsed: f32,
    /// Whether movement has reached its destination.
    pub arrived: bool,
}

impl Decision {
    /// Evaluate this decision against the tick context.
    pub fn evaluate(&self, ctx: &DecisionCtx) -> bool {
        match self {
            Self::TargetWithin { radius } => {
                ctx.nearest_distance.is_some_and(|d| d <= *radius)
            }
            Self::TargetBeyond { radius } => {
                ctx.target_distance.is_none_or(|d| d > *radius)
            }
            Self::Elapsed { duration } => ctx.elapsed >= *duration,
            Self::Arrived => ctx.arrived,
        }
    }
}

/// A per-tick side-effecting operation bound to a state.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum Action {
    /// Walk the controller's waypoint ring, advancing on arrival.
    Patrol { speed: f32 },
    /// Move toward the acquired target.
    Chase { speed: f32 },
    /// Stop moving.
    Halt,
    /// Fire a pooled projectile (by pool tag) at the acquired target,
    /// at most once per `cooldown` seconds. The first shot also waits a
    /// full cooldown.
    Shoot { tag: String, cooldown: f32 },
    /// Advance along the entity's [`PathFollow`](crate::ai::PathFollow)
    /// spline at `speed` units per second and steer toward it.
    FollowPath { speed: f32 },
}

/// A decision-guarded edge: evaluates to `true_state` or `false_state`,
/// either of which may be [`StateId::REMAIN`].
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Transition {
    pub decision: Decision,
    pub true_state: StateId,
    pub false_state: StateId,
}

impl Transition {
    pub fn new(decision: Decision, true_state: StateId, false_state: StateId) -> Self {
        Self {
            decision,
            true_state,
            false_state,
        }
    }
}

/// One authored state: actions run every tick, then transitions are
/// evaluated, both in list order. A state with no transitions out is
/// terminal, which is valid.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct State {
    pub name: String,
    pub actions: Vec<Action>,
    pub transitions: Vec<Transition>,
    /// Debug-draw color; cosmetic only.
    pub color: Color,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            transitions: Vec::new(),
            color: Color::srgb(0.5, 0.5, 0.5),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Errors found while validating a state graph at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains no states.
    EmptyGraph,
    /// A transition points at a state index that does not exist.
    BadTransitionTarget {
        state: usize,
        transition: usize,
        target: usize,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGraph => write!(f, "state graph has no states"),
            Self::BadTransitionTarget {
                state,
                transition,
                target,
            } => write!(
                f,
                "state {state}, transition {transition}: target {target} does not exist"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// The authored state machine shared by every AI controller.
///
/// States and transitions are static data; controllers only hold a
/// [`StateId`](crate::ai::StateMachine) into this graph. Construction
/// validates every transition target so that a misconfigured graph is a
/// load-time error, never a dispatch-time surprise.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StateGraph {
    states: Vec<State>,
}

impl StateGraph {
    /// Build a graph from the given states, validating transition targets.
    pub fn new(states: Vec<State>) -> Result<Self, GraphError> {
        if states.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        for (si, state) in states.iter().enumerate() {
            for (ti, transition) in state.transitions.iter().enumerate() {
                for target in [transition.true_state, transition.false_state] {
                    if target != StateId::REMAIN && target.0 >= states.len() {
                        return Err(GraphError::BadTransitionTarget {
                            state: si,
                            transition: ti,
                            target: target.0,
                        });
                    }
                }
            }
        }

        info!("loaded state graph with {} states", states.len());
        Ok(Self { states })
    }

    /// Look up a state by id; `None` for [`StateId::REMAIN`] or an id from
    /// another graph.
    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Find a state's id by name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(StateId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_rejected() {
        assert_eq!(StateGraph::new(Vec::new()), Err(GraphError::EmptyGraph));
    }

    #[test]
    fn test_bad_transition_target_rejected() {
        let states = vec![State::new("patrol").with_transition(Transition::new(
            Decision::Elapsed { duration: 1.0 },
            StateId(7),
            StateId::REMAIN,
        ))];

        assert_eq!(
            StateGraph::new(states),
            Err(GraphError::BadTransitionTarget {
                state: 0,
                transition: 0,
                target: 7,
            })
        );
    }

    #[test]
    fn test_remain_is_always_a_valid_target() {
        let states = vec![State::new("idle").with_transition(Transition::new(
            Decision::Arrived,
            StateId::REMAIN,
            StateId::REMAIN,
        ))];

        let graph = StateGraph::new(states).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.find("idle"), Some(StateId(0)));
        assert!(graph.get(StateId::REMAIN).is_none());
    }

    #[test]
    fn test_decisions_are_pure_predicates() {
        let ctx = DecisionCtx {
            nearest_distance: Some(3.0),
            target_distance: None,
            elapsed: 2.5,
            arrived: false,
        };

        assert!(Decision::TargetWithin { radius: 4.0 }.evaluate(&ctx));
        assert!(!Decision::TargetWithin { radius: 2.0 }.evaluate(&ctx));
        // no acquired target counts as "beyond"
        assert!(Decision::TargetBeyond { radius: 10.0 }.evaluate(&ctx));
        assert!(Decision::Elapsed { duration: 2.5 }.evaluate(&ctx));
        assert!(!Decision::Elapsed { duration: 3.0 }.evaluate(&ctx));
        assert!(!Decision::Arrived.evaluate(&ctx));
    }
}
