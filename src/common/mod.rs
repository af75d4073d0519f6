//! Common types, traits, and error definitions for sample_planner
//!
//! This module provides the foundational building blocks shared by
//! the planner core, the cost grid and the visualization helpers.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
