// Path Planning algorithms module

pub mod sample_planner;

pub use sample_planner::*;
