//! Seeded sampler with uniform and informed policies
//!
//! Informed draws combine two sources once a solution exists:
//!
//! - with probability `prior_sample_rate`, a uniform point inside a
//!   priority circle of radius `prior_set_r` centered on a node of the
//!   current best path;
//! - otherwise a heavy-tailed ellipse draw: both components are
//!   Student-t variates (`t_freedom` degrees of freedom) divided by
//!   [`T_SPREAD`], mapped through the informed-ellipse transform. Most
//!   mass lands inside the ellipse, the tails still reach outside it.
//!
//! Draws that leave the domain are redrawn up to [`MAX_REDRAWS`] times
//! and then replaced by a uniform draw.

use std::f64::consts::PI;

use nalgebra::{Rotation2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StudentT};

use crate::common::{Bounds, PlannerError, PlannerResult, Point2D};

use super::config::SamplePlannerConfig;

/// Scale dividing the Student-t variates before the ellipse transform
pub const T_SPREAD: f64 = 2.0;
/// Redraws allowed for a sample that falls outside the domain
pub const MAX_REDRAWS: usize = 16;

/// Ellipse whose foci are start and goal, sized by the best known cost
#[derive(Debug, Clone)]
pub struct InformedEllipse {
    start: Point2D,
    goal: Point2D,
    center: Point2D,
    rotation: Rotation2<f64>,
    c_min: f64,
    c_best: f64,
}

impl InformedEllipse {
    pub fn new(start: Point2D, goal: Point2D, c_best: f64) -> Self {
        let c_min = start.distance(&goal);
        InformedEllipse {
            start,
            goal,
            center: Point2D::new((start.x + goal.x) / 2.0, (start.y + goal.y) / 2.0),
            rotation: Rotation2::new(start.angle_to(&goal)),
            c_min,
            c_best: c_best.max(c_min),
        }
    }

    pub fn c_best(&self) -> f64 {
        self.c_best
    }

    /// (semi-major, semi-minor)
    pub fn semi_axes(&self) -> (f64, f64) {
        (
            self.c_best / 2.0,
            (self.c_best * self.c_best - self.c_min * self.c_min).max(0.0).sqrt() / 2.0,
        )
    }

    /// Map a point of the unit-ball frame into the world frame
    pub fn transform(&self, unit: Vector2<f64>) -> Point2D {
        let (r1, r2) = self.semi_axes();
        let scaled = Vector2::new(r1 * unit[0], r2 * unit[1]);
        let rotated = self.rotation * scaled;
        Point2D::from(rotated + self.center.to_vector())
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.distance(&self.start) + p.distance(&self.goal) <= self.c_best
    }
}

/// Region a single draw is taken from
#[derive(Debug, Clone)]
pub enum SamplingRegion {
    /// Whole domain, before any solution exists
    Uniform { bounds: Bounds, goal: Point2D },
    /// Informed ellipse plus priority circles around the best path
    Informed {
        bounds: Bounds,
        ellipse: InformedEllipse,
        priority_centers: Vec<Point2D>,
    },
}

pub struct Sampler {
    rng: StdRng,
    t_dist: StudentT<f64>,
    goal_sample_rate: f64,
    prior_sample_rate: f64,
    prior_set_r: f64,
}

impl Sampler {
    pub fn new(config: &SamplePlannerConfig) -> PlannerResult<Self> {
        let t_dist = StudentT::new(config.t_freedom).map_err(|e| {
            PlannerError::InvalidParameter(format!("t_freedom {}: {}", config.t_freedom, e))
        })?;
        Ok(Sampler {
            rng: StdRng::seed_from_u64(config.seed),
            t_dist,
            goal_sample_rate: config.goal_sample_rate,
            prior_sample_rate: config.prior_sample_rate,
            prior_set_r: config.prior_set_r,
        })
    }

    pub fn draw(&mut self, region: &SamplingRegion) -> Point2D {
        match region {
            SamplingRegion::Uniform { bounds, goal } => {
                if self.rng.gen::<f64>() < self.goal_sample_rate {
                    *goal
                } else {
                    self.sample_free_space(bounds)
                }
            }
            SamplingRegion::Informed { bounds, ellipse, priority_centers } => {
                let use_priority = !priority_centers.is_empty() && self.rng.gen::<f64>() < self.prior_sample_rate;
                for _ in 0..MAX_REDRAWS {
                    let p = if use_priority {
                        let center = priority_centers[self.rng.gen_range(0..priority_centers.len())];
                        self.sample_circle(center, self.prior_set_r)
                    } else {
                        self.sample_ellipse(ellipse)
                    };
                    if bounds.contains(&p) {
                        return p;
                    }
                }
                self.sample_free_space(bounds)
            }
        }
    }

    fn sample_free_space(&mut self, bounds: &Bounds) -> Point2D {
        Point2D::new(
            self.rng.gen_range(bounds.min_x..bounds.max_x),
            self.rng.gen_range(bounds.min_y..bounds.max_y),
        )
    }

    fn sample_circle(&mut self, center: Point2D, radius: f64) -> Point2D {
        let r = radius * self.rng.gen::<f64>().sqrt();
        let theta = 2.0 * PI * self.rng.gen::<f64>();
        Point2D::new(center.x + r * theta.cos(), center.y + r * theta.sin())
    }

    fn sample_ellipse(&mut self, ellipse: &InformedEllipse) -> Point2D {
        let x = self.t_dist.sample(&mut self.rng) / T_SPREAD;
        let y = self.t_dist.sample(&mut self.rng) / T_SPREAD;
        ellipse.transform(Vector2::new(x, y))
    }
}
