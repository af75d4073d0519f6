//! sample_planner - sampling-based path planning in Rust
//!
//! This crate provides an RRT*-family planner with informed sampling and
//! parallel rewiring, a cost-grid configuration space, and gnuplot-based
//! visualization of the explored tree.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Bounds, Point2D, Pose2D, Path2D};
pub use common::{ConfigurationSpace, ExplorationObserver, PathPlanner};
pub use common::{PlannerError, PlannerResult};
pub use path_planning::sample_planner::{SamplePlanner, SamplePlannerConfig};
