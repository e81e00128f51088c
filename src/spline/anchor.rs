use bevy::prelude::*;

use super::SplineError;

/// Sample density used when building the forward-vector cache, in samples
/// per unit of estimated curve length.
pub const SAMPLES_PER_UNIT: f32 = 2.0;

/// Default `t` step for distance-walk queries.
pub const DISTANCE_STEP: f32 = 0.01;

/// Offset applied to each handle and position when appending an anchor.
const ANCHOR_INCREMENT: Vec3 = Vec3::new(1.0, 1.0, 0.0);

/// Minimum number of anchors required for evaluation.
pub const MIN_ANCHORS: usize = 2;

/// A cubic Bezier anchor: an on-curve position plus two absolute handle
/// positions. `handle_b` shapes the outgoing segment, `handle_a` the
/// incoming one.
#[derive(Debug, Clone, Copy, Default, Reflect)]
pub struct SplineAnchor {
    pub position: Vec3,
    pub handle_a: Vec3,
    pub handle_b: Vec3,
}

impl SplineAnchor {
    /// Create an anchor with handles mirrored about the position.
    pub fn new(position: Vec3, handle_offset: Vec3) -> Self {
        Self {
            position,
            handle_a: position - handle_offset,
            handle_b: position + handle_offset,
        }
    }
}

/// A cached sample along the curve: global parameter, position, and the
/// normalized direction toward the next sample.
#[derive(Debug, Clone, Copy, Default, Reflect)]
pub struct SplineSample {
    pub t: f32,
    pub position: Vec3,
    pub forward: Vec3,
}

/// A piecewise cubic Bezier spline defined by anchors with handle pairs.
///
/// Positions are evaluated directly from the anchors; forward vectors come
/// from a resampled cache (see [`Self::rebuild`]) so per-tick queries avoid
/// re-evaluating the cubic. Any anchor edit marks the cache stale.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AnchorSpline {
    pub anchors: Vec<SplineAnchor>,
    pub looped: bool,
    #[reflect(ignore)]
    samples: Vec<SplineSample>,
    #[reflect(ignore)]
    length: f32,
}

impl AnchorSpline {
    /// Create a spline and build its sample cache if it is valid.
    pub fn new(anchors: Vec<SplineAnchor>, looped: bool) -> Self {
        let mut spline = Self {
            anchors,
            looped,
            samples: Vec::new(),
            length: 0.0,
        };
        if spline.is_valid() {
            // can only fail below the anchor minimum, checked above
            let _ = spline.rebuild();
        }
        spline
    }

    /// Check if the spline has enough anchors to be evaluated.
    pub fn is_valid(&self) -> bool {
        self.anchors.len() >= MIN_ANCHORS
    }

    /// Whether the sample cache needs a [`Self::rebuild`].
    pub fn is_stale(&self) -> bool {
        self.samples.is_empty()
    }

    /// The cached curve samples, empty while stale.
    pub fn samples(&self) -> &[SplineSample] {
        &self.samples
    }

    /// Number of cubic segments defined by the anchor chain.
    pub fn segment_count(&self) -> usize {
        if self.anchors.len() < MIN_ANCHORS {
            0
        } else if self.looped {
            self.anchors.len()
        } else {
            self.anchors.len() - 1
        }
    }

    /// Evaluate the position at global parameter `t` in `[0, 1]`.
    ///
    /// `t = 0` and `t = 1` return the exact endpoint anchor positions
    /// (for looped splines both are the first anchor). Values above 1
    /// clamp to the end; negative values are an error.
    pub fn position_at(&self, t: f32) -> Result<Vec3, SplineError> {
        let n = self.anchors.len();
        if n < MIN_ANCHORS {
            return Err(SplineError::TooFewAnchors { found: n });
        }
        if !t.is_finite() || t < 0.0 {
            return Err(SplineError::ParameterOutOfRange { t });
        }

        if t == 0.0 {
            return Ok(self.anchors[0].position);
        }
        if t >= 1.0 {
            // final segment at u = 1: the loop-closing segment ends at the
            // first anchor, an open spline at the last
            let end = if self.looped { 0 } else { n - 1 };
            return Ok(self.anchors[end].position);
        }

        let t_full = t * self.segment_count() as f32;
        let index = t_full.floor() as usize;
        let u = t_full - index as f32;

        let (a, b) = if index < n - 1 {
            (&self.anchors[index], &self.anchors[index + 1])
        } else {
            // loop-closing segment (index == n - 1 only occurs when looped)
            (&self.anchors[n - 1], &self.anchors[0])
        };

        Ok(cubic_lerp(a.position, a.handle_b, b.handle_a, b.position, u))
    }

    /// Evaluate the forward direction at global parameter `t`.
    ///
    /// Interpolates linearly between the two cached samples bracketing `t`;
    /// requires a fresh cache.
    pub fn forward_at(&self, t: f32) -> Result<Vec3, SplineError> {
        let n = self.anchors.len();
        if n < MIN_ANCHORS {
            return Err(SplineError::TooFewAnchors { found: n });
        }
        if self.is_stale() {
            return Err(SplineError::StaleCache);
        }
        if !t.is_finite() || t < 0.0 {
            return Err(SplineError::ParameterOutOfRange { t });
        }

        let t = t.min(1.0);
        let index = self.previous_sample(t);
        let a = self.samples[index];
        if index + 1 >= self.samples.len() {
            return Ok(a.forward);
        }
        let b = self.samples[index + 1];

        let span = (b.t - a.t).abs();
        if span < f32::EPSILON {
            return Ok(a.forward);
        }
        Ok(a.forward.lerp(b.forward, (t - a.t) / span))
    }

    /// Index of the last cached sample at or before `t`.
    fn previous_sample(&self, t: f32) -> usize {
        let mut prev = 0;
        for (i, sample) in self.samples.iter().enumerate().skip(1) {
            if t < sample.t {
                return prev;
            }
            prev = i;
        }
        prev
    }

    /// Total curve length estimated while the cache was built, or computed
    /// on the fly when the cache is stale.
    pub fn total_length(&self) -> Result<f32, SplineError> {
        if !self.is_stale() {
            return Ok(self.length);
        }
        self.estimate_length(DISTANCE_STEP)
    }

    /// Chord-walk length estimate at the given `t` step.
    fn estimate_length(&self, step: f32) -> Result<f32, SplineError> {
        let mut length = 0.0;
        let mut prev = self.position_at(0.0)?;

        let mut t = step;
        while t < 1.0 {
            let point = self.position_at(t)?;
            length += prev.distance(point);
            prev = point;
            t += step;
        }
        length += prev.distance(self.position_at(1.0)?);

        Ok(length)
    }

    /// Position at `distance` world units from the start of the curve.
    ///
    /// Walks the curve in fixed `t` steps accumulating chord length, then
    /// refines linearly within the last step. O(1/step) per call, intended
    /// for occasional use rather than hot per-frame paths at scale.
    /// Distances beyond the curve clamp to the endpoint.
    pub fn position_at_distance(&self, distance: f32) -> Result<Vec3, SplineError> {
        let step = DISTANCE_STEP;
        let mut walked = 0.0;
        let mut prev = self.position_at(0.0)?;

        if distance <= 0.0 {
            return Ok(prev);
        }

        let mut t = step;
        while t < 1.0 {
            let point = self.position_at(t)?;
            walked += prev.distance(point);
            prev = point;

            if walked >= distance {
                let before = self.position_at(t - step)?;
                let direction = (point - before).normalize_or_zero();
                // back up along the chord by the overshoot
                return Ok(point + direction * (distance - walked));
            }
            t += step;
        }

        self.position_at(1.0)
    }

    /// Forward direction at `distance` world units from the start.
    ///
    /// Same walk as [`Self::position_at_distance`]; requires a fresh cache.
    pub fn forward_at_distance(&self, distance: f32) -> Result<Vec3, SplineError> {
        if self.is_stale() {
            return Err(SplineError::StaleCache);
        }

        let step = DISTANCE_STEP;
        let mut walked = 0.0;
        let mut prev = self.position_at(0.0)?;

        if distance <= 0.0 {
            return self.forward_at(0.0);
        }

        let mut t = step;
        while t < 1.0 {
            let point = self.position_at(t)?;
            let chord = prev.distance(point);
            walked += chord;
            prev = point;

            if walked >= distance {
                if chord < f32::EPSILON {
                    return self.forward_at(t);
                }
                let overshoot = walked - distance;
                return self.forward_at(t - (overshoot / chord) * step);
            }
            t += step;
        }

        self.forward_at(1.0)
    }

    /// Rebuild the sample cache and cached length from the anchors.
    ///
    /// Must be called after any anchor edit before forward queries; the
    /// [`rebuild_changed_splines`] system does this automatically for
    /// splines living on entities.
    pub fn rebuild(&mut self) -> Result<(), SplineError> {
        self.samples.clear();
        self.length = self.estimate_length(DISTANCE_STEP)?;

        let count = (SAMPLES_PER_UNIT * self.length).max(1.0);
        let step = 1.0 / count;

        let mut t = 0.0;
        while t < 1.0 {
            self.samples.push(SplineSample {
                t,
                position: self.position_at(t)?,
                forward: Vec3::ZERO,
            });
            t += step;
        }
        self.samples.push(SplineSample {
            t: 1.0,
            position: self.position_at(1.0)?,
            forward: Vec3::ZERO,
        });

        // forward = normalized delta to the next sample; the final sample
        // inherits its predecessor's, or the first one's when looped
        let count = self.samples.len();
        for i in 0..count - 1 {
            let delta = self.samples[i + 1].position - self.samples[i].position;
            self.samples[i].forward = delta.normalize_or_zero();
        }
        self.samples[count - 1].forward = if self.looped {
            self.samples[0].forward
        } else {
            self.samples[count - 2].forward
        };

        Ok(())
    }

    /// Append an anchor offset from the last one, marking the cache stale.
    pub fn add_anchor(&mut self) {
        match self.anchors.last().copied() {
            Some(last) => self.anchors.push(SplineAnchor {
                position: last.position + ANCHOR_INCREMENT,
                handle_a: last.handle_a + ANCHOR_INCREMENT,
                handle_b: last.handle_b + ANCHOR_INCREMENT,
            }),
            None => self
                .anchors
                .push(SplineAnchor::new(Vec3::ZERO, ANCHOR_INCREMENT)),
        }
        self.samples.clear();
    }

    /// Remove the final anchor, refusing to drop below the minimum.
    /// Marks the cache stale.
    pub fn remove_last_anchor(&mut self) -> Option<SplineAnchor> {
        if self.anchors.len() <= MIN_ANCHORS {
            return None;
        }
        let removed = self.anchors.pop();
        self.samples.clear();
        removed
    }
}

/// De Casteljau quadratic step: lerp a→b and b→c, then lerp the results.
fn quadratic_lerp(a: Vec3, b: Vec3, c: Vec3, t: f32) -> Vec3 {
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    ab.lerp(bc, t)
}

/// De Casteljau cubic step over the control net (a, b, c, d).
fn cubic_lerp(a: Vec3, b: Vec3, c: Vec3, d: Vec3, t: f32) -> Vec3 {
    let abc = quadratic_lerp(a, b, c, t);
    let bcd = quadratic_lerp(b, c, d, t);
    abc.lerp(bcd, t)
}

/// Rebuild sample caches for anchor splines whose anchors changed.
pub fn rebuild_changed_splines(mut splines: Query<&mut AnchorSpline, Changed<AnchorSpline>>) {
    for mut spline in &mut splines {
        let spline = spline.bypass_change_detection();
        if spline.is_stale() && spline.is_valid() {
            if let Err(err) = spline.rebuild() {
                warn!("failed to rebuild spline cache: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc() -> AnchorSpline {
        AnchorSpline::new(
            vec![
                SplineAnchor::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(4.0, 2.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(8.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ],
            false,
        )
    }

    #[test]
    fn test_too_few_anchors() {
        let spline = AnchorSpline::new(
            vec![SplineAnchor::new(Vec3::ZERO, Vec3::X)],
            false,
        );
        assert_eq!(
            spline.position_at(0.5),
            Err(SplineError::TooFewAnchors { found: 1 })
        );
    }

    #[test]
    fn test_endpoints_are_exact() {
        let spline = arc();
        assert_eq!(spline.position_at(0.0).unwrap(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(spline.position_at(1.0).unwrap(), Vec3::new(8.0, 0.0, 0.0));
    }

    #[test]
    fn test_looped_closes_on_first_anchor() {
        let mut spline = arc();
        spline.looped = true;
        spline.rebuild().unwrap();
        assert_eq!(spline.position_at(1.0).unwrap(), spline.anchors[0].position);
    }

    #[test]
    fn test_midpoint_passes_through_interior_anchor() {
        // 2 segments: t = 0.5 is exactly the middle anchor
        let spline = arc();
        let mid = spline.position_at(0.5).unwrap();
        assert!((mid - Vec3::new(4.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_forward_along_straight_line() {
        let spline = AnchorSpline::new(
            vec![
                SplineAnchor::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ],
            false,
        );

        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let forward = spline.forward_at(t).unwrap();
            assert!((forward - Vec3::X).length() < 1e-3, "t={t}: {forward}");
        }
    }

    #[test]
    fn test_edit_marks_cache_stale() {
        let mut spline = arc();
        assert!(!spline.is_stale());

        spline.add_anchor();
        assert!(spline.is_stale());
        assert_eq!(spline.forward_at(0.5), Err(SplineError::StaleCache));

        spline.rebuild().unwrap();
        assert!(spline.forward_at(0.5).is_ok());
    }

    #[test]
    fn test_remove_refuses_below_minimum() {
        let mut spline = arc();
        assert!(spline.remove_last_anchor().is_some());
        assert!(spline.remove_last_anchor().is_none());
        assert_eq!(spline.anchors.len(), MIN_ANCHORS);
    }

    #[test]
    fn test_length_of_straight_line() {
        let spline = AnchorSpline::new(
            vec![
                SplineAnchor::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ],
            false,
        );
        let length = spline.total_length().unwrap();
        assert!((length - 10.0).abs() < 0.05, "length = {length}");
    }

    #[test]
    fn test_position_at_distance_walks_the_line() {
        let spline = AnchorSpline::new(
            vec![
                SplineAnchor::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ],
            false,
        );

        let at = spline.position_at_distance(4.0).unwrap();
        assert!((at - Vec3::new(4.0, 0.0, 0.0)).length() < 0.15, "{at}");

        // beyond the end clamps to the endpoint
        let end = spline.position_at_distance(50.0).unwrap();
        assert_eq!(end, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_forward_at_distance_on_straight_line() {
        let spline = AnchorSpline::new(
            vec![
                SplineAnchor::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
                SplineAnchor::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            ],
            false,
        );
        let forward = spline.forward_at_distance(5.0).unwrap();
        assert!((forward - Vec3::X).length() < 1e-3);
    }
}
