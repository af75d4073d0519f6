//! Common traits defining the seams around the sampling planner

use crate::common::error::PlannerError;
use crate::common::types::*;
use crate::path_planning::sample_planner::ExplorationSnapshot;

/// Trait for path planning algorithms
pub trait PathPlanner {
    /// Plan a path from start to goal, accepting any endpoint within `tolerance` of the goal
    fn plan(&self, start: Pose2D, goal: Pose2D, tolerance: f64) -> Result<Path2D, PlannerError>;
}

/// Occupancy/cost field the planner searches.
///
/// Implementations are read-only while a plan runs and are queried
/// concurrently by rewiring workers, hence the `Sync` bound.
pub trait ConfigurationSpace: Sync {
    /// Domain the sampler draws from
    fn bounds(&self) -> Bounds;

    /// Whether the point lies inside the domain
    fn in_bounds(&self, p: Point2D) -> bool {
        self.bounds().contains(&p)
    }

    /// Whether the point is inside the domain and not occupied
    fn is_free(&self, p: Point2D) -> bool;

    /// Traversal cost at the point, normalized to [0, 1]
    fn cost(&self, p: Point2D) -> f64;

    /// Interpolation step used by the default `segment_free`
    fn check_resolution(&self) -> f64 {
        0.05
    }

    /// Whether every point of the straight segment `a -> b` is free
    fn segment_free(&self, a: Point2D, b: Point2D) -> bool {
        let dist = a.distance(&b);
        let n_expand = (dist / self.check_resolution()).ceil().max(1.0) as usize;
        (0..=n_expand).all(|i| {
            let t = i as f64 / n_expand as f64;
            self.is_free(Point2D::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
        })
    }
}

/// Receives the explored node set once a plan terminates
pub trait ExplorationObserver {
    fn on_exploration(&self, snapshot: &ExplorationSnapshot);
}

/// Trait for visualizable planner artifacts
pub trait Visualizable {
    /// Draw current state to visualizer
    fn visualize(&self, vis: &mut crate::utils::Visualizer);
}
