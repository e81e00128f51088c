use bevy::prelude::*;
use std::f32::consts::TAU;

use super::{Axis, SplineError};

/// Minimum number of control points required for evaluation.
pub const MIN_POINTS: usize = 4;

/// Default step size for the chord-sum length estimate.
pub const LENGTH_STEP: f32 = 0.005;

/// A uniform Catmull-Rom spline through an ordered list of control points.
///
/// The curve parameter `t` is in point-index space: `floor(t)` selects the
/// segment and `fract(t)` is the position within it. Looped splines accept
/// any finite `t` (indices wrap); open splines are only defined for
/// `t` in `[0, n - 3]`, since each segment borrows a phantom neighbor on
/// either side.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct CatmullRomSpline {
    /// Control points; insertion order defines curve order.
    pub points: Vec<Vec3>,
    /// Whether the spline wraps around onto itself.
    pub looped: bool,
}

impl CatmullRomSpline {
    /// Create an open spline from the given points.
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            looped: false,
        }
    }

    /// Create a looped spline from the given points.
    pub fn looped(points: Vec<Vec3>) -> Self {
        Self {
            points,
            looped: true,
        }
    }

    /// Check if the spline has enough points to be evaluated.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= MIN_POINTS
    }

    /// Evaluate the spline position at `t` (point-index space).
    pub fn evaluate(&self, t: f32) -> Result<Vec3, SplineError> {
        let ([p0, p1, p2, p3], u) = self.segment(t)?;

        let u2 = u * u;
        let u3 = u2 * u;

        let q0 = -u3 + 2.0 * u2 - u;
        let q1 = 3.0 * u3 - 5.0 * u2 + 2.0;
        let q2 = -3.0 * u3 + 4.0 * u2 + u;
        let q3 = u3 - u2;

        Ok(0.5
            * (self.points[p0] * q0
                + self.points[p1] * q1
                + self.points[p2] * q2
                + self.points[p3] * q3))
    }

    /// Evaluate the spline's forward vector at `t`.
    ///
    /// This uses the same fixed alternate basis as the original curve
    /// tooling rather than the analytic derivative of [`Self::evaluate`];
    /// the two disagree, and downstream content was authored against this
    /// one, so it is reproduced as-is.
    pub fn forward(&self, t: f32) -> Result<Vec3, SplineError> {
        let ([p0, p1, p2, p3], u) = self.segment(t)?;

        let u2 = u * u;

        let q0 = -3.0 * u2 + 4.0 * u - 1.0;
        let q1 = 9.0 * u2 - 10.0 * u;
        let q2 = -9.0 * u2 + 8.0 * u + 1.0;
        let q3 = 3.0 * u2 - 2.0 * u;

        Ok(0.5
            * (self.points[p0] * q0
                + self.points[p1] * q1
                + self.points[p2] * q2
                + self.points[p3] * q3))
    }

    /// Resolve `t` into the four control point indices and the local
    /// parameter `u` within the segment.
    fn segment(&self, t: f32) -> Result<([usize; 4], f32), SplineError> {
        let n = self.points.len();
        if n < MIN_POINTS {
            return Err(SplineError::TooFewPoints { found: n });
        }
        if !t.is_finite() {
            return Err(SplineError::ParameterOutOfRange { t });
        }

        if self.looped {
            let i = (t.floor() as isize).rem_euclid(n as isize) as usize;
            let u = t - t.floor();
            let p1 = i;
            let p2 = (p1 + 1) % n;
            let p3 = (p2 + 1) % n;
            let p0 = if p1 >= 1 { p1 - 1 } else { n - 1 };
            Ok(([p0, p1, p2, p3], u))
        } else {
            let max = (n - 3) as f32;
            if !(0.0..=max).contains(&t) {
                return Err(SplineError::ParameterOutOfRange { t });
            }
            let mut i = t.floor() as usize;
            let mut u = t - t.floor();
            // `t == max` lands on the final segment at u = 1
            if i + 3 >= n {
                i = n - MIN_POINTS;
                u = 1.0;
            }
            Ok(([i, i + 1, i + 2, i + 3], u))
        }
    }

    /// Estimate the curve length by summing chords at the default step.
    pub fn length(&self) -> Result<f32, SplineError> {
        self.length_with_step(LENGTH_STEP)
    }

    /// Estimate the curve length by summing chords at the given `t` step.
    ///
    /// An approximation, not exact arc length; error grows with the step.
    /// The step must be positive and finite.
    pub fn length_with_step(&self, step: f32) -> Result<f32, SplineError> {
        let n = self.points.len();
        if n < MIN_POINTS {
            return Err(SplineError::TooFewPoints { found: n });
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(SplineError::ParameterOutOfRange { t: step });
        }

        let end = if self.looped {
            n as f32
        } else {
            (n - 3) as f32
        };

        let mut total = 0.0;
        let mut prev = self.evaluate(0.0)?;
        let mut t = step;
        while t < end {
            let point = self.evaluate(t)?;
            total += prev.distance(point);
            prev = point;
            t += step;
        }
        total += prev.distance(self.evaluate(end)?);

        Ok(total)
    }

    /// Flatten the spline along an axis: every point's coordinate on that
    /// axis becomes the minimum over all points.
    pub fn flatten(&mut self, axis: Axis) {
        let Some(&first) = self.points.first() else {
            return;
        };

        let mut lowest = axis.component(first);
        for point in &self.points {
            lowest = lowest.min(axis.component(*point));
        }

        for point in &mut self.points {
            axis.set_component(point, lowest);
        }
    }

    /// Reposition every point evenly around a circle of `radius` in the
    /// X-Z plane, preserving each point's Y. Looped splines only.
    pub fn circle(&mut self, radius: f32) -> Result<(), SplineError> {
        if !self.looped {
            return Err(SplineError::NotLooped);
        }
        let n = self.points.len();
        if n < MIN_POINTS {
            return Err(SplineError::TooFewPoints { found: n });
        }

        for (i, point) in self.points.iter_mut().enumerate() {
            let angle = TAU * i as f32 / n as f32;
            point.x = radius * angle.cos();
            point.z = radius * angle.sin();
        }

        Ok(())
    }

    /// Add a control point one unit along +X from the last, seeding four
    /// collinear points when the spline is empty.
    pub fn add_point(&mut self) {
        match self.points.last() {
            Some(&last) => self.points.push(last + Vec3::X),
            None => {
                self.points.extend([
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(2.0, 0.0, 0.0),
                    Vec3::new(3.0, 0.0, 0.0),
                    Vec3::new(4.0, 0.0, 0.0),
                ]);
            }
        }
    }

    /// Remove the last control point, refusing to drop below the minimum.
    pub fn remove_last_point(&mut self) -> Option<Vec3> {
        if self.points.len() <= MIN_POINTS {
            return None;
        }
        self.points.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.5, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.5, 1.0),
        ]
    }

    #[test]
    fn test_too_few_points() {
        let spline = CatmullRomSpline::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(
            spline.evaluate(0.5),
            Err(SplineError::TooFewPoints { found: 3 })
        );
    }

    #[test]
    fn test_open_out_of_range() {
        let spline = CatmullRomSpline::new(square());
        // 4 points leave a single segment: t in [0, 1]
        assert!(spline.evaluate(0.0).is_ok());
        assert!(spline.evaluate(1.0).is_ok());
        assert_eq!(
            spline.evaluate(1.5),
            Err(SplineError::ParameterOutOfRange { t: 1.5 })
        );
        assert_eq!(
            spline.evaluate(-0.1),
            Err(SplineError::ParameterOutOfRange { t: -0.1 })
        );
    }

    #[test]
    fn test_looped_periodicity() {
        let spline = CatmullRomSpline::looped(square());
        let n = spline.points.len() as f32;

        for i in 0..20 {
            let t = i as f32 * 0.17;
            let a = spline.evaluate(t).unwrap();
            let b = spline.evaluate(t + n).unwrap();
            assert!((a - b).length() < 1e-4, "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn test_open_passes_through_interior_points() {
        let spline = CatmullRomSpline::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 1.0, 0.0),
        ]);

        // At integer t the curve passes through points[t + 1]
        let at0 = spline.evaluate(0.0).unwrap();
        let at1 = spline.evaluate(1.0).unwrap();
        assert!((at0 - spline.points[1]).length() < 1e-5);
        assert!((at1 - spline.points[2]).length() < 1e-5);
    }

    #[test]
    fn test_forward_matches_fixed_basis() {
        let spline = CatmullRomSpline::new(square());

        // u = 0 reduces the basis to 0.5 * (p2 - p0)
        let start = spline.forward(0.0).unwrap();
        let p = &spline.points;
        assert!((start - 0.5 * (p[2] - p[0])).length() < 1e-5);
        assert!((start - Vec3::new(1.0, 0.5, 1.0)).length() < 1e-5);

        // u = 0.5: coefficients 0.25, -2.75, 2.75, -0.25, hand-expanded
        let mid = spline.forward(0.5).unwrap();
        assert!((mid - Vec3::new(0.0, 0.5, 2.5)).length() < 1e-5);

        // u = 1 reduces the basis to 0.5 * (p3 - p1)
        let end = spline.forward(1.0).unwrap();
        assert!((end - 0.5 * (p[3] - p[1])).length() < 1e-5);
        assert!((end - Vec3::new(-1.0, 0.5, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_length_rejects_non_positive_step() {
        let spline = CatmullRomSpline::new(square());
        assert_eq!(
            spline.length_with_step(0.0),
            Err(SplineError::ParameterOutOfRange { t: 0.0 })
        );
        assert_eq!(
            spline.length_with_step(-0.5),
            Err(SplineError::ParameterOutOfRange { t: -0.5 })
        );
    }

    #[test]
    fn test_flatten_uses_axis_minimum() {
        let mut spline = CatmullRomSpline::new(vec![
            Vec3::new(0.0, 3.0, 7.0),
            Vec3::new(1.0, -2.0, 5.0),
            Vec3::new(2.0, 4.0, -1.0),
            Vec3::new(3.0, 1.0, 0.0),
        ]);

        spline.flatten(Axis::Y);
        for point in &spline.points {
            assert_eq!(point.y, -2.0);
        }
        // other axes untouched
        assert_eq!(spline.points[0].z, 7.0);

        spline.flatten(Axis::Z);
        for point in &spline.points {
            assert_eq!(point.z, -1.0);
        }
    }

    #[test]
    fn test_circle_radius_and_preserved_y() {
        let mut spline = CatmullRomSpline::looped(vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(5.0, 2.0, 0.0),
            Vec3::new(5.0, 3.0, 5.0),
            Vec3::new(0.0, 4.0, 5.0),
        ]);

        spline.circle(3.0).unwrap();

        for (i, point) in spline.points.iter().enumerate() {
            let radius = (point.x * point.x + point.z * point.z).sqrt();
            assert!((radius - 3.0).abs() < 1e-5);
            assert_eq!(point.y, (i + 1) as f32);
        }
    }

    #[test]
    fn test_circle_requires_loop() {
        let mut spline = CatmullRomSpline::new(square());
        assert_eq!(spline.circle(2.0), Err(SplineError::NotLooped));
    }

    #[test]
    fn test_length_of_circle_approximates_circumference() {
        let mut spline = CatmullRomSpline::looped(vec![Vec3::ZERO; 16]);
        spline.circle(1.0).unwrap();

        let length = spline.length().unwrap();
        // 16 points on a unit circle should hug TAU closely
        assert!((length - TAU).abs() < 0.1, "length = {length}");
    }

    #[test]
    fn test_add_and_remove_points() {
        let mut spline = CatmullRomSpline::default();
        spline.add_point();
        assert_eq!(spline.points.len(), 4);

        spline.add_point();
        assert_eq!(spline.points.len(), 5);
        assert_eq!(spline.points[4], Vec3::new(5.0, 0.0, 0.0));

        assert!(spline.remove_last_point().is_some());
        // at the minimum, removal refuses
        assert!(spline.remove_last_point().is_none());
        assert_eq!(spline.points.len(), 4);
    }
}
