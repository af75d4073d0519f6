//! Utility modules for sample_planner

pub mod cost_grid;
pub mod visualization;

pub use cost_grid::*;
pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
