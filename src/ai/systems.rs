use bevy::prelude::*;

use crate::pool::ObjectPool;
use crate::spline::AnchorSpline;

use super::components::{Movement, PathFollow, PerceptionTarget, StateChanged, StateMachine};
use super::graph::{Action, DecisionCtx, State, StateGraph};

/// Per-entity state machine dispatch.
///
/// For each active controller, one tick is: advance the state timer once,
/// scan for a perceivable target and assign it explicitly, run the current
/// state's actions in list order, then evaluate its transitions in list
/// order. Later transitions overwrite the outcome of earlier ones within
/// the same tick; authored content relies on that ordering.
pub fn tick_state_machines(
    mut commands: Commands,
    time: Res<Time>,
    graph: Option<Res<StateGraph>>,
    mut pool: ResMut<ObjectPool>,
    mut changes: MessageWriter<StateChanged>,
    mut machines: Query<
        (
            Entity,
            &mut StateMachine,
            &mut Movement,
            Option<&mut PathFollow>,
            &Transform,
        ),
        Without<PerceptionTarget>,
    >,
    targets: Query<(Entity, &Transform), With<PerceptionTarget>>,
    splines: Query<&AnchorSpline>,
) {
    let Some(graph) = graph else {
        return;
    };
    let dt = time.delta_secs();

    for (entity, mut machine, mut movement, mut path, transform) in &mut machines {
        if !machine.active {
            continue;
        }

        let Some(state) = graph.get(machine.current) else {
            warn!("{entity} is in unknown state {:?}, skipping", machine.current);
            continue;
        };

        // the timers advance exactly once per tick; decisions only read them
        machine.elapsed += dt;
        machine.shoot_timer += dt;

        let origin = transform.translation;

        // perception scan: nearest perceivable entity, regardless of range
        let mut nearest: Option<(Entity, f32)> = None;
        for (candidate, candidate_transform) in &targets {
            let distance = candidate_transform.translation.distance(origin);
            if nearest.is_none_or(|(_, d)| distance < d) {
                nearest = Some((candidate, distance));
            }
        }

        // target acquisition is an explicit assignment here, not a decision
        // side effect
        if let Some((seen, distance)) = nearest {
            if distance <= machine.look_radius {
                machine.target = Some(seen);
            }
        }

        let target_position = machine
            .target
            .and_then(|target| targets.get(target).ok())
            .map(|(_, target_transform)| target_transform.translation);

        for action in &state.actions {
            match action {
                Action::Patrol { speed } => {
                    if machine.waypoints.is_empty() {
                        continue;
                    }
                    let index = machine.next_waypoint % machine.waypoints.len();
                    let waypoint = machine.waypoints[index];
                    movement.go_to(waypoint, *speed);
                    if origin.distance(waypoint) <= movement.epsilon {
                        machine.next_waypoint = (index + 1) % machine.waypoints.len();
                    }
                }
                Action::Chase { speed } => {
                    if let Some(position) = target_position {
                        movement.go_to(position, *speed);
                    }
                }
                Action::Halt => movement.stop(),
                Action::Shoot { tag, cooldown } => {
                    if machine.shoot_timer < *cooldown {
                        continue;
                    }
                    let Some(aim) = target_position else {
                        continue;
                    };
                    // pool exhaustion just skips the shot this tick
                    if let Some(projectile) = pool.get(tag, &mut commands) {
                        commands.entity(projectile).insert((
                            Transform::from_translation(origin).looking_at(aim, Vec3::Y),
                            Visibility::Inherited,
                        ));
                        machine.shoot_timer = 0.0;
                    }
                }
                Action::FollowPath { speed } => {
                    let Some(path) = path.as_deref_mut() else {
                        continue;
                    };
                    let Ok(spline) = splines.get(path.spline) else {
                        continue;
                    };
                    path.distance += speed * dt;
                    if let Ok(total) = spline.total_length() {
                        if path.distance > total {
                            if spline.looped {
                                path.distance -= total;
                            } else {
                                path.distance = total;
                            }
                        }
                    }
                    match spline.position_at_distance(path.distance) {
                        Ok(position) => movement.go_to(position, *speed),
                        Err(err) => warn!("path follow on {:?}: {err}", path.spline),
                    }
                }
            }
        }

        let ctx = DecisionCtx {
            nearest_distance: nearest.map(|(_, distance)| distance),
            target_distance: machine
                .target
                .and_then(|target| targets.get(target).ok())
                .map(|(_, target_transform)| target_transform.translation.distance(origin)),
            elapsed: machine.elapsed,
            arrived: movement.arrived(origin),
        };

        let before = machine.current;
        run_transitions(&mut machine, state, &ctx);
        if machine.current != before {
            changes.write(StateChanged {
                entity,
                from: before,
                to: machine.current,
            });
        }
    }
}

/// Evaluate a state's transitions in list order against the tick context.
///
/// Every transition issues its own request, so later entries silently
/// overwrite earlier ones' outcome for this tick (last write wins).
pub(crate) fn run_transitions(machine: &mut StateMachine, state: &State, ctx: &DecisionCtx) {
    for transition in &state.transitions {
        let outcome = if transition.decision.evaluate(ctx) {
            transition.true_state
        } else {
            transition.false_state
        };
        machine.transition_to(outcome);
    }
}

/// Step entities toward their movement destination, yaw-turning to face
/// the travel direction.
pub fn integrate_movement(time: Res<Time>, mut movers: Query<(&mut Transform, &Movement)>) {
    let dt = time.delta_secs();

    for (mut transform, movement) in &mut movers {
        if movement.stopped {
            continue;
        }
        let Some(destination) = movement.destination else {
            continue;
        };

        let delta = destination - transform.translation;
        let distance = delta.length();
        if distance <= movement.epsilon {
            continue;
        }

        let step = movement.speed * dt;
        if step >= distance {
            transform.translation = destination;
        } else {
            transform.translation += delta / distance * step;
        }

        // face travel direction, turning about Y only
        let flat = Vec3::new(delta.x, 0.0, delta.z);
        if flat.length_squared() > 1e-6 {
            let facing = Transform::from_translation(transform.translation)
                .looking_to(flat.normalize(), Vec3::Y)
                .rotation;
            transform.rotation = transform
                .rotation
                .slerp(facing, (movement.turn_speed * dt).min(1.0));
        }
    }
}
