//! Error types for sample_planner

use std::fmt;

/// Main error type for the sampling planner
#[derive(Debug)]
pub enum PlannerError {
    /// Start pose is out of bounds or occupied
    InvalidStart(String),
    /// Goal pose is out of bounds or occupied
    InvalidGoal(String),
    /// Budget exhausted without any node inside the goal tolerance
    NoPathFound {
        iterations: usize,
        explored: usize,
    },
    /// Invalid parameter
    InvalidParameter(String),
    /// I/O error
    IoError(std::io::Error),
    /// Visualization error
    VisualizationError(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InvalidStart(msg) => write!(f, "Invalid start: {}", msg),
            PlannerError::InvalidGoal(msg) => write!(f, "Invalid goal: {}", msg),
            PlannerError::NoPathFound { iterations, explored } => write!(
                f,
                "No path found after {} iterations ({} nodes explored)",
                iterations, explored
            ),
            PlannerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
            PlannerError::VisualizationError(msg) => write!(f, "Visualization error: {}", msg),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

impl PlannerError {
    /// Whether this error rejected the request before any iteration ran
    pub fn is_rejection(&self) -> bool {
        matches!(self, PlannerError::InvalidStart(_) | PlannerError::InvalidGoal(_))
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
