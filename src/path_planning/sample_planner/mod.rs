//! Sampling-based Path Planner Module
//!
//! An RRT*-family planner that grows a tree of collision-free positions
//! from the start toward the goal inside a 2D configuration space, using
//! randomized sampling, nearest-neighbor search, bounded steering and
//! cost-optimal rewiring. Once a solution exists, sampling is focused on
//! the informed ellipse and on circles around the current best path.
//!
//! # Components
//!
//! - `config`: planner parameters and their validation
//! - `sampler`: seeded uniform / informed sampling
//! - `tree`: flat node store with a bucket-grid spatial index
//! - `steering`: bounded extension with adaptive step growth
//! - `rewire`: choose-parent and rewire, optionally on worker threads
//! - `planner`: the iteration state machine and the `PathPlanner` facade
//! - `path`: path extraction and the exploration export
//!
//! # Example
//!
//! ```no_run
//! use sample_planner::common::{Bounds, PathPlanner, Point2D, Pose2D};
//! use sample_planner::path_planning::sample_planner::{SamplePlanner, SamplePlannerConfig};
//! use sample_planner::utils::CostGrid;
//!
//! let mut grid = CostGrid::new(Bounds::new(0.0, 0.0, 20.0, 20.0), 0.1).unwrap();
//! grid.add_rectangle(Point2D::new(8.0, 0.0), Point2D::new(9.0, 14.0));
//!
//! let config = SamplePlannerConfig { factor: 0.3, ..Default::default() };
//! let planner = SamplePlanner::from_grid(grid, config).unwrap();
//! let path = planner.plan(Pose2D::new(2.0, 2.0, 0.0), Pose2D::new(18.0, 2.0, 0.0), 0.5);
//! ```
//!
//! # References
//!
//! - "Sampling-based Algorithms for Optimal Motion Planning" (Karaman, Frazzoli)
//! - "Informed RRT*" (Gammell, Srinivasa, Barfoot)

pub mod config;
pub mod path;
pub mod planner;
pub mod rewire;
pub mod sampler;
pub mod steering;
pub mod tree;

// Re-exports
pub use config::SamplePlannerConfig;
pub use path::{ExplorationSnapshot, ExploredNode, PathExtractor};
pub use planner::{PlanReport, PlannerLoop, PlannerState, SamplePlanner};
pub use rewire::{Connection, InsertOutcome, NeighborEdge, RewireEngine};
pub use sampler::{InformedEllipse, Sampler, SamplingRegion};
pub use steering::{ExtendOutcome, Steering};
pub use tree::{Node, NodeIndex, Tree};
