mod anchor;
mod catmull_rom;

pub use anchor::*;
pub use catmull_rom::*;

use bevy::prelude::*;
use std::fmt;

/// A world axis, used for spline flattening operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Read this axis' component of a vector.
    pub fn component(&self, v: Vec3) -> f32 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }

    /// Overwrite this axis' component of a vector.
    pub fn set_component(&self, v: &mut Vec3, value: f32) {
        match self {
            Self::X => v.x = value,
            Self::Y => v.y = value,
            Self::Z => v.z = value,
        }
    }
}

/// Errors reported by spline queries and edits.
///
/// Evaluating a curve that is not in a valid state is an error rather than
/// an out-of-bounds read; callers decide whether to skip or surface it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplineError {
    /// A Catmull-Rom spline needs at least four points to evaluate.
    TooFewPoints { found: usize },
    /// An anchor spline needs at least two anchors to evaluate.
    TooFewAnchors { found: usize },
    /// The parameter falls outside the curve's valid range.
    ParameterOutOfRange { t: f32 },
    /// The operation only applies to looped splines.
    NotLooped,
    /// The forward-vector cache has not been rebuilt since the last edit.
    StaleCache,
}

impl fmt::Display for SplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints { found } => {
                write!(f, "spline needs at least 4 points, has {found}")
            }
            Self::TooFewAnchors { found } => {
                write!(f, "spline needs at least 2 anchors, has {found}")
            }
            Self::ParameterOutOfRange { t } => {
                write!(f, "parameter {t} is outside the spline's valid range")
            }
            Self::NotLooped => write!(f, "operation requires a looped spline"),
            Self::StaleCache => write!(f, "sample cache is stale; call rebuild() first"),
        }
    }
}

impl std::error::Error for SplineError {}

/// Plugin that registers spline components for reflection/serialization
/// and keeps anchor-spline sample caches fresh after edits.
pub struct SplinePlugin;

impl Plugin for SplinePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Axis>()
            .register_type::<CatmullRomSpline>()
            .register_type::<SplineAnchor>()
            .register_type::<AnchorSpline>()
            .add_systems(Update, rebuild_changed_splines);
    }
}
