//! Bounded steering with adaptive step growth

use crate::common::{ConfigurationSpace, Point2D};

use super::config::SamplePlannerConfig;

/// Samples closer than this to their nearest node carry no new information
const MIN_EXTEND_D: f64 = 1e-9;

/// Result of one extension attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtendOutcome {
    /// A collision-free candidate was found at `step` from the origin
    Extended { point: Point2D, step: f64, retries: usize },
    /// Every attempt failed its collision check; the sample is dropped
    Rejected { retries: usize },
}

#[derive(Debug, Clone)]
pub struct Steering {
    sample_max_d: f64,
    step_ext_d: f64,
    max_retries: usize,
}

impl Steering {
    pub fn new(config: &SamplePlannerConfig) -> Self {
        Steering {
            sample_max_d: config.sample_max_d,
            step_ext_d: config.step_ext_d,
            max_retries: config.max_extend_retries,
        }
    }

    /// Point on `from -> toward` at distance `min(max_step, |toward - from|)`
    pub fn steer(from: &Point2D, toward: &Point2D, max_step: f64) -> Point2D {
        let dist = from.distance(toward);
        if dist <= max_step {
            *toward
        } else {
            from.step_toward(toward, max_step)
        }
    }

    /// Extend from `from` toward `toward`, growing the step by `step_ext_d`
    /// after each failed collision check
    pub fn extend<C: ConfigurationSpace + ?Sized>(&self, space: &C, from: Point2D, toward: Point2D) -> ExtendOutcome {
        let dist = from.distance(&toward);
        if dist < MIN_EXTEND_D {
            return ExtendOutcome::Rejected { retries: 0 };
        }

        let mut step = self.sample_max_d;
        let mut retries = 0;
        loop {
            let candidate = Self::steer(&from, &toward, step);
            if space.in_bounds(candidate) && space.is_free(candidate) && space.segment_free(from, candidate) {
                return ExtendOutcome::Extended {
                    point: candidate,
                    step: step.min(dist),
                    retries,
                };
            }
            // A longer step cannot move past the sample itself
            if step >= dist || retries >= self.max_retries || self.step_ext_d <= 0.0 {
                return ExtendOutcome::Rejected { retries };
            }
            step += self.step_ext_d;
            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Bounds;
    use approx::assert_relative_eq;

    /// Open field with a thin band at 1.0 <= x <= 1.1 and a coarse segment check
    struct ThinBand {
        blocked: bool,
    }

    impl ConfigurationSpace for ThinBand {
        fn bounds(&self) -> Bounds {
            Bounds::new(-10.0, -10.0, 10.0, 10.0)
        }

        fn is_free(&self, p: Point2D) -> bool {
            let in_band = p.x >= 1.0 && p.x <= 1.1;
            let in_wall = self.blocked && p.x >= 0.5 && p.x <= 3.0;
            self.in_bounds(p) && !in_band && !in_wall
        }

        fn cost(&self, _p: Point2D) -> f64 {
            0.0
        }

        fn check_resolution(&self) -> f64 {
            1.0
        }
    }

    fn steering(sample_max_d: f64, step_ext_d: f64, max_extend_retries: usize) -> Steering {
        Steering::new(&SamplePlannerConfig {
            sample_max_d,
            step_ext_d,
            max_extend_retries,
            ..Default::default()
        })
    }

    #[test]
    fn test_steer_bounds_step() {
        let from = Point2D::new(0.0, 0.0);
        let far = Steering::steer(&from, &Point2D::new(0.0, 10.0), 2.0);
        assert_relative_eq!(far.y, 2.0, epsilon = 1e-12);
        let near = Steering::steer(&from, &Point2D::new(0.5, 0.0), 2.0);
        assert_eq!(near, Point2D::new(0.5, 0.0));
    }

    #[test]
    fn test_extend_in_free_space() {
        let space = ThinBand { blocked: false };
        let s = steering(0.5, 0.5, 3);
        match s.extend(&space, Point2D::new(-5.0, 0.0), Point2D::new(-5.0, 5.0)) {
            ExtendOutcome::Extended { point, step, retries } => {
                assert_relative_eq!(point.y, 0.5, epsilon = 1e-12);
                assert_relative_eq!(step, 0.5);
                assert_eq!(retries, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    // Growth only helps when the segment check samples coarsely enough to
    // step over the band (check_resolution 1.0 here). A cell-exact check
    // such as CostGrid rejects every longer step through the same band.
    #[test]
    fn test_adaptive_step_pushes_past_thin_band() {
        let space = ThinBand { blocked: false };
        let s = steering(1.05, 0.5, 3);
        match s.extend(&space, Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0)) {
            ExtendOutcome::Extended { point, step, retries } => {
                assert_eq!(retries, 1);
                assert_relative_eq!(step, 1.55, epsilon = 1e-12);
                assert_relative_eq!(point.x, 1.55, epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_after_bounded_retries() {
        let space = ThinBand { blocked: true };
        let s = steering(1.0, 0.25, 2);
        assert_eq!(
            s.extend(&space, Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0)),
            ExtendOutcome::Rejected { retries: 2 }
        );
    }

    #[test]
    fn test_retries_stop_at_the_sample() {
        let space = ThinBand { blocked: false };
        let s = steering(1.0, 0.5, 5);
        assert_eq!(
            s.extend(&space, Point2D::new(0.0, 0.0), Point2D::new(1.05, 0.0)),
            ExtendOutcome::Rejected { retries: 1 }
        );
        assert_eq!(
            s.extend(&space, Point2D::new(0.0, 0.0), Point2D::new(0.0, 0.0)),
            ExtendOutcome::Rejected { retries: 0 }
        );
    }
}
