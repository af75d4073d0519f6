//! Configuration for the sampling planner

use std::time::Duration;

use crate::common::{PlannerError, PlannerResult};

/// Configuration for the sampling planner
#[derive(Debug, Clone)]
pub struct SamplePlannerConfig {
    /// Maximum number of sample/extend/rewire iterations
    pub sample_points: usize,
    /// Base steering step length [m]
    pub sample_max_d: f64,
    /// Rewiring radius [m]
    pub opt_r: f64,
    /// Radius of the priority sampling circles [m]
    pub prior_set_r: f64,
    /// Number of rewiring worker threads (1 = evaluate on the planning thread)
    pub rewire_threads_n: usize,
    /// Step length increment applied on each adaptive steering retry [m]
    pub step_ext_d: f64,
    /// Degrees of freedom of the Student-t distribution used for informed sampling
    pub t_freedom: f64,
    /// Treat the map boundary as an obstacle
    pub is_outline: bool,
    /// Obstacle inflation distance applied to the cost grid before planning [m]
    pub factor: f64,
    /// Probability of sampling the goal directly
    pub goal_sample_rate: f64,
    /// Share of informed draws taken from the priority circles
    pub prior_sample_rate: f64,
    /// Adaptive steering retries before a sample is abandoned
    pub max_extend_retries: usize,
    /// Keep refining after the first solution until the budget is spent
    pub search_until_max_iter: bool,
    /// Optional wall-clock budget
    pub max_planning_time: Option<Duration>,
    /// Sampler seed
    pub seed: u64,
    /// Deliver the exploration snapshot to the registered observer
    pub is_expand: bool,
}

impl Default for SamplePlannerConfig {
    fn default() -> Self {
        Self {
            sample_points: 2000,
            sample_max_d: 1.0,
            opt_r: 2.0,
            prior_set_r: 1.0,
            rewire_threads_n: 1,
            step_ext_d: 0.5,
            t_freedom: 1.5,
            is_outline: false,
            factor: 0.0,
            goal_sample_rate: 0.05,
            prior_sample_rate: 0.2,
            max_extend_retries: 3,
            search_until_max_iter: true,
            max_planning_time: None,
            seed: 0,
            is_expand: false,
        }
    }
}

impl SamplePlannerConfig {
    /// Longest step the adaptive steering may reach
    pub fn max_step_d(&self) -> f64 {
        self.sample_max_d + self.max_extend_retries as f64 * self.step_ext_d
    }

    pub fn validate(&self) -> PlannerResult<()> {
        fn positive(name: &str, value: f64) -> PlannerResult<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(PlannerError::InvalidParameter(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )))
            }
        }
        fn probability(name: &str, value: f64) -> PlannerResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(PlannerError::InvalidParameter(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )))
            }
        }

        positive("sample_max_d", self.sample_max_d)?;
        positive("opt_r", self.opt_r)?;
        positive("prior_set_r", self.prior_set_r)?;
        positive("t_freedom", self.t_freedom)?;
        probability("goal_sample_rate", self.goal_sample_rate)?;
        probability("prior_sample_rate", self.prior_sample_rate)?;

        if self.rewire_threads_n == 0 {
            return Err(PlannerError::InvalidParameter(
                "rewire_threads_n must be at least 1".to_string(),
            ));
        }
        if !(self.step_ext_d >= 0.0 && self.step_ext_d.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "step_ext_d must be non-negative, got {}",
                self.step_ext_d
            )));
        }
        if !(self.factor >= 0.0 && self.factor.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "factor must be non-negative, got {}",
                self.factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = SamplePlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.max_step_d(), 2.5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bad = [
            SamplePlannerConfig { sample_max_d: 0.0, ..Default::default() },
            SamplePlannerConfig { opt_r: -1.0, ..Default::default() },
            SamplePlannerConfig { t_freedom: f64::NAN, ..Default::default() },
            SamplePlannerConfig { rewire_threads_n: 0, ..Default::default() },
            SamplePlannerConfig { goal_sample_rate: 1.5, ..Default::default() },
            SamplePlannerConfig { factor: -0.1, ..Default::default() },
        ];
        for config in bad.iter() {
            assert!(
                matches!(config.validate(), Err(PlannerError::InvalidParameter(_))),
                "expected rejection for {:?}",
                config
            );
        }
    }
}
