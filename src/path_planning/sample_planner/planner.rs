//! Planning loop and the planner facade
//!
//! `PlannerLoop` owns the tree for a single request and advances it one
//! sample/extend/insert/rewire iteration per `step`. `SamplePlanner`
//! holds the configuration space and parameters across requests and
//! implements `PathPlanner`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use ordered_float::OrderedFloat;

use crate::common::{
    ConfigurationSpace, ExplorationObserver, Path2D, PathPlanner, PlannerError, PlannerResult, Point2D, Pose2D,
};
use crate::utils::CostGrid;

use super::config::SamplePlannerConfig;
use super::path::{ExplorationSnapshot, PathExtractor};
use super::rewire::{Connection, RewireEngine};
use super::sampler::{InformedEllipse, Sampler, SamplingRegion};
use super::steering::{ExtendOutcome, Steering};
use super::tree::{NodeIndex, Tree};

/// Nodes closer than this to the goal are taken as the goal itself
const GOAL_MERGE_D: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Sampling,
    Extending,
    Discarded,
    Inserting,
    Rewiring,
    Solved,
    Exhausted,
}

impl PlannerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlannerState::Solved | PlannerState::Exhausted)
    }
}

/// Single planning request driven one iteration at a time
pub struct PlannerLoop<'a, C: ConfigurationSpace + ?Sized> {
    space: &'a C,
    config: SamplePlannerConfig,
    start: Pose2D,
    goal: Pose2D,
    tolerance: f64,
    tree: Tree,
    sampler: Sampler,
    steering: Steering,
    rewire: RewireEngine,
    state: PlannerState,
    iterations: usize,
    sample: Point2D,
    candidate: Option<(NodeIndex, Point2D)>,
    connection: Option<(NodeIndex, Connection)>,
    goal_region: Vec<NodeIndex>,
    goal_node: Option<NodeIndex>,
    best: Option<NodeIndex>,
    best_cost: f64,
}

impl<'a, C: ConfigurationSpace + ?Sized> PlannerLoop<'a, C> {
    /// Validate the request and plant the root at `start`
    pub fn new(
        space: &'a C,
        config: SamplePlannerConfig,
        start: Pose2D,
        goal: Pose2D,
        tolerance: f64,
    ) -> PlannerResult<Self> {
        config.validate()?;
        let bounds = space.bounds();
        let finite = [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || !(bounds.width() > 0.0) || !(bounds.height() > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "configuration space bounds {:?} enclose no area",
                bounds
            )));
        }
        if let Some(reason) = Self::blocked_reason(space, start.position()) {
            return Err(PlannerError::InvalidStart(format!("({:.3}, {:.3}) is {}", start.x, start.y, reason)));
        }
        if let Some(reason) = Self::blocked_reason(space, goal.position()) {
            return Err(PlannerError::InvalidGoal(format!("({:.3}, {:.3}) is {}", goal.x, goal.y, reason)));
        }

        let tolerance = if tolerance.is_finite() && tolerance > 0.0 { tolerance } else { 0.0 };
        let sampler = Sampler::new(&config)?;
        let mut planner_loop = PlannerLoop {
            space,
            tree: Tree::new(start.position(), config.opt_r),
            sampler,
            steering: Steering::new(&config),
            rewire: RewireEngine::new(&config),
            config,
            start,
            goal,
            tolerance,
            state: PlannerState::Sampling,
            iterations: 0,
            sample: start.position(),
            candidate: None,
            connection: None,
            goal_region: Vec::new(),
            goal_node: None,
            best: None,
            best_cost: f64::INFINITY,
        };

        planner_loop.on_inserted(Tree::ROOT);
        if planner_loop.config.sample_points == 0
            || (planner_loop.best.is_some() && !planner_loop.config.search_until_max_iter)
        {
            planner_loop.stop();
        }
        Ok(planner_loop)
    }

    fn blocked_reason(space: &C, p: Point2D) -> Option<&'static str> {
        if !space.in_bounds(p) {
            Some("outside the map")
        } else if !space.is_free(p) {
            Some("occupied")
        } else {
            None
        }
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Node ending the current best solution
    pub fn best_node(&self) -> Option<NodeIndex> {
        self.best
    }

    /// `cost(node) + dist(node, goal)` of the current best solution
    pub fn best_cost(&self) -> Option<f64> {
        self.best.map(|_| self.best_cost)
    }

    /// Node placed exactly on the goal, once the goal has been connected
    pub fn goal_node(&self) -> Option<NodeIndex> {
        self.goal_node
    }

    /// Run one full iteration and report the state it ends in
    pub fn step(&mut self) -> PlannerState {
        if self.state.is_terminal() {
            return self.state;
        }
        loop {
            let state = self.advance();
            if state == PlannerState::Sampling || state.is_terminal() {
                return state;
            }
        }
    }

    /// Iterate until a terminal state, the deadline, or cancellation
    pub fn run(&mut self, deadline: Option<Instant>, cancel: Option<&AtomicBool>) -> PlannerState {
        while !self.state.is_terminal() {
            if cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false) {
                debug!("[SamplePlanner] cancelled after {} iterations", self.iterations);
                return self.stop();
            }
            if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
                debug!("[SamplePlanner] time budget spent after {} iterations", self.iterations);
                return self.stop();
            }
            self.step();
        }
        self.state
    }

    /// Path through the committed tree to the best solution
    pub fn path(&self) -> PlannerResult<Path2D> {
        PathExtractor::extract(&self.tree, self.best, self.goal.yaw).map_err(|_| PlannerError::NoPathFound {
            iterations: self.iterations,
            explored: self.tree.len(),
        })
    }

    pub fn snapshot(&self) -> ExplorationSnapshot {
        ExplorationSnapshot::from_tree(&self.tree)
    }

    fn stop(&mut self) -> PlannerState {
        self.state = if self.best.is_some() {
            PlannerState::Solved
        } else {
            PlannerState::Exhausted
        };
        self.state
    }

    fn advance(&mut self) -> PlannerState {
        let next = match self.state {
            PlannerState::Sampling => {
                let region = self.sampling_region();
                self.sample = self.sampler.draw(&region);
                PlannerState::Extending
            }
            PlannerState::Extending => {
                let origin = self.tree.nearest(self.sample);
                match self.steering.extend(self.space, self.tree.position(origin), self.sample) {
                    ExtendOutcome::Extended { point, .. } => {
                        self.candidate = Some((origin, point));
                        PlannerState::Inserting
                    }
                    ExtendOutcome::Rejected { retries } => {
                        trace!(
                            "[SamplePlanner] iter {}: sample ({:.3}, {:.3}) rejected after {} retries",
                            self.iterations,
                            self.sample.x,
                            self.sample.y,
                            retries
                        );
                        PlannerState::Discarded
                    }
                }
            }
            PlannerState::Inserting => match self.candidate.take() {
                Some((origin, point)) => match self.rewire.connect(&self.tree, self.space, point, origin) {
                    Some(connection) => {
                        let node = self.tree.insert(point, connection.parent);
                        self.connection = Some((node, connection));
                        PlannerState::Rewiring
                    }
                    None => PlannerState::Discarded,
                },
                None => PlannerState::Discarded,
            },
            PlannerState::Rewiring => {
                if let Some((node, connection)) = self.connection.take() {
                    let rewired = RewireEngine::rewire(&mut self.tree, node, &connection);
                    trace!(
                        "[SamplePlanner] iter {}: node {} under {} ({} neighbors, {} rewired)",
                        self.iterations,
                        node,
                        connection.parent,
                        connection.edges.len(),
                        rewired
                    );
                    self.on_inserted(node);
                }
                self.finish_iteration()
            }
            PlannerState::Discarded => self.finish_iteration(),
            terminal => terminal,
        };
        self.state = next;
        next
    }

    fn finish_iteration(&mut self) -> PlannerState {
        self.iterations += 1;
        let solved = self.best.is_some();
        if solved && !self.config.search_until_max_iter {
            PlannerState::Solved
        } else if self.iterations >= self.config.sample_points {
            if solved {
                PlannerState::Solved
            } else {
                PlannerState::Exhausted
            }
        } else {
            PlannerState::Sampling
        }
    }

    fn sampling_region(&self) -> SamplingRegion {
        let bounds = self.space.bounds();
        let goal = self.goal.position();
        match self.best {
            None => SamplingRegion::Uniform { bounds, goal },
            Some(best) => SamplingRegion::Informed {
                bounds,
                ellipse: InformedEllipse::new(self.start.position(), goal, self.best_cost),
                priority_centers: self
                    .tree
                    .path_to_root(best)
                    .into_iter()
                    .map(|i| self.tree.position(i))
                    .collect(),
            },
        }
    }

    /// Track goal-region membership of a freshly committed node
    fn on_inserted(&mut self, node: NodeIndex) {
        let goal = self.goal.position();
        let position = self.tree.position(node);
        let dist = position.distance(&goal);

        if dist <= self.tolerance || dist < GOAL_MERGE_D {
            self.goal_region.push(node);
            if self.goal_node.is_none() {
                if dist < GOAL_MERGE_D {
                    self.goal_node = Some(node);
                } else if self.space.segment_free(position, goal) {
                    if let Some(outcome) = self.rewire.insert(&mut self.tree, self.space, goal, node) {
                        debug!(
                            "[SamplePlanner] goal connected as node {} after {} iterations",
                            outcome.node, self.iterations
                        );
                        self.goal_region.push(outcome.node);
                        self.goal_node = Some(outcome.node);
                    }
                }
            }
        }
        self.refresh_best();
    }

    fn refresh_best(&mut self) {
        let goal = self.goal.position();
        let tree = &self.tree;
        let best = self
            .goal_region
            .iter()
            .map(|&i| (OrderedFloat(tree.cost(i) + tree.position(i).distance(&goal)), i))
            .min();

        if let Some((OrderedFloat(cost), index)) = best {
            if self.best.is_none() {
                debug!(
                    "[SamplePlanner] first solution: cost {:.3} at iteration {} ({} nodes)",
                    cost,
                    self.iterations,
                    self.tree.len()
                );
            } else if cost < self.best_cost - 1e-9 {
                debug!("[SamplePlanner] improved solution: cost {:.3} at iteration {}", cost, self.iterations);
            }
            self.best = Some(index);
            self.best_cost = cost;
        }
    }
}

/// Outcome of one planning request
#[derive(Debug)]
pub struct PlanReport {
    pub result: PlannerResult<Path2D>,
    pub exploration: ExplorationSnapshot,
    pub iterations: usize,
    pub elapsed: Duration,
    pub best_cost: Option<f64>,
}

/// Sampling planner over a configuration space
pub struct SamplePlanner<C: ConfigurationSpace> {
    space: C,
    config: SamplePlannerConfig,
    observer: Option<Box<dyn ExplorationObserver>>,
    cancel: Arc<AtomicBool>,
}

impl<C: ConfigurationSpace> SamplePlanner<C> {
    pub fn new(space: C, config: SamplePlannerConfig) -> PlannerResult<Self> {
        config.validate()?;
        Ok(SamplePlanner {
            space,
            config,
            observer: None,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Receive the exploration snapshot after each request (when `is_expand` is set)
    pub fn with_observer(mut self, observer: Box<dyn ExplorationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn space(&self) -> &C {
        &self.space
    }

    pub fn config(&self) -> &SamplePlannerConfig {
        &self.config
    }

    /// Flag polled between iterations; while it is set, requests stop at the next check
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn plan_detailed(&self, start: Pose2D, goal: Pose2D, tolerance: f64) -> PlanReport {
        let started = Instant::now();
        debug!(
            "[SamplePlanner] planning from ({:.3}, {:.3}) to ({:.3}, {:.3}), tolerance {:.3}, {} threads",
            start.x, start.y, goal.x, goal.y, tolerance, self.config.rewire_threads_n
        );

        let mut planner_loop = match PlannerLoop::new(&self.space, self.config.clone(), start, goal, tolerance) {
            Ok(planner_loop) => planner_loop,
            Err(e) => {
                warn!("[SamplePlanner] request rejected: {}", e);
                return PlanReport {
                    result: Err(e),
                    exploration: ExplorationSnapshot::default(),
                    iterations: 0,
                    elapsed: started.elapsed(),
                    best_cost: None,
                };
            }
        };

        let deadline = self.config.max_planning_time.and_then(|d| started.checked_add(d));
        let state = planner_loop.run(deadline, Some(&self.cancel));

        let exploration = planner_loop.snapshot();
        if self.config.is_expand {
            if let Some(observer) = &self.observer {
                observer.on_exploration(&exploration);
            }
        }

        let result = planner_loop.path();
        debug!(
            "[SamplePlanner] {:?} after {} iterations, {} nodes, best cost {:?}",
            state,
            planner_loop.iterations(),
            exploration.len(),
            planner_loop.best_cost()
        );

        PlanReport {
            result,
            exploration,
            iterations: planner_loop.iterations(),
            elapsed: started.elapsed(),
            best_cost: planner_loop.best_cost(),
        }
    }
}

impl SamplePlanner<CostGrid> {
    /// Apply outline and inflation from `config` to `grid` before planning on it
    pub fn from_grid(grid: CostGrid, config: SamplePlannerConfig) -> PlannerResult<Self> {
        config.validate()?;
        let grid = grid.prepared(config.is_outline, config.factor);
        Self::new(grid, config)
    }
}

impl<C: ConfigurationSpace> PathPlanner for SamplePlanner<C> {
    fn plan(&self, start: Pose2D, goal: Pose2D, tolerance: f64) -> Result<Path2D, PlannerError> {
        self.plan_detailed(start, goal, tolerance).result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Bounds;
    use approx::assert_relative_eq;
    use std::sync::atomic::AtomicUsize;

    struct OpenField;

    impl ConfigurationSpace for OpenField {
        fn bounds(&self) -> Bounds {
            Bounds::new(-2.0, -6.0, 12.0, 6.0)
        }

        fn is_free(&self, p: Point2D) -> bool {
            self.in_bounds(p)
        }

        fn cost(&self, _p: Point2D) -> f64 {
            0.0
        }
    }

    struct CountingObserver(Arc<AtomicUsize>);

    impl ExplorationObserver for CountingObserver {
        fn on_exploration(&self, snapshot: &ExplorationSnapshot) {
            self.0.store(snapshot.len(), Ordering::SeqCst);
        }
    }

    /// 10 x 10 m grid with two walls leaving a gap at the top and bottom
    fn walled_grid() -> CostGrid {
        let mut grid = CostGrid::new(Bounds::new(0.0, 0.0, 10.0, 10.0), 0.1).unwrap();
        grid.add_rectangle(Point2D::new(3.0, 0.0), Point2D::new(3.5, 7.0));
        grid.add_rectangle(Point2D::new(6.5, 3.0), Point2D::new(7.0, 10.0));
        grid
    }

    fn config(sample_points: usize, seed: u64) -> SamplePlannerConfig {
        SamplePlannerConfig {
            sample_points,
            seed,
            ..Default::default()
        }
    }

    fn start() -> Pose2D {
        Pose2D::new(1.0, 1.0, 0.0)
    }

    fn goal() -> Pose2D {
        Pose2D::new(9.0, 9.0, 0.5)
    }

    #[test]
    fn test_invariants_hold_after_every_iteration() {
        let grid = walled_grid();
        let mut planner_loop = PlannerLoop::new(&grid, config(600, 4), start(), goal(), 0.5).unwrap();
        let mut previous: Vec<f64> = vec![0.0];
        let mut previous_best = f64::INFINITY;

        loop {
            let state = planner_loop.step();
            let tree = planner_loop.tree();
            assert!(tree.is_consistent(1e-6), "broken tree at iteration {}", planner_loop.iterations());
            for (i, old) in previous.iter().enumerate() {
                assert!(tree.cost(i) <= old + 1e-9, "cost of node {} increased", i);
            }
            previous = tree.nodes().iter().map(|n| n.cost).collect();
            if let Some(best) = planner_loop.best_cost() {
                assert!(best <= previous_best + 1e-9);
                previous_best = best;
                let node = planner_loop.best_node().unwrap();
                assert!(tree.position(node).distance(&goal().position()) <= planner_loop.tolerance());
            }
            if state.is_terminal() {
                break;
            }
        }
        assert_eq!(planner_loop.iterations(), 600);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let planner = SamplePlanner::new(walled_grid(), config(800, 17)).unwrap();
        let a = planner.plan_detailed(start(), goal(), 0.5);
        let b = planner.plan_detailed(start(), goal(), 0.5);
        assert_eq!(a.exploration.nodes, b.exploration.nodes);
        assert_eq!(a.best_cost, b.best_cost);
        match (a.result, b.result) {
            (Ok(pa), Ok(pb)) => assert_eq!(pa.poses, pb.poses),
            (Err(_), Err(_)) => {}
            _ => panic!("runs with the same seed disagree"),
        }
    }

    #[test]
    fn test_thread_count_does_not_change_solution() {
        let serial = SamplePlanner::new(walled_grid(), config(800, 8)).unwrap();
        let parallel = SamplePlanner::new(
            walled_grid(),
            SamplePlannerConfig {
                rewire_threads_n: 4,
                ..config(800, 8)
            },
        )
        .unwrap();
        let a = serial.plan_detailed(start(), goal(), 0.5);
        let b = parallel.plan_detailed(start(), goal(), 0.5);
        assert_eq!(a.best_cost, b.best_cost);
        assert_eq!(a.exploration.nodes, b.exploration.nodes);
    }

    #[test]
    fn test_parallel_rewiring_under_stress() {
        let grid = walled_grid();
        let cfg = SamplePlannerConfig {
            rewire_threads_n: 8,
            opt_r: 3.0,
            ..config(1500, 99)
        };
        let mut planner_loop = PlannerLoop::new(&grid, cfg, start(), goal(), 0.5).unwrap();
        while !planner_loop.step().is_terminal() {
            if planner_loop.iterations() % 100 == 0 {
                assert!(planner_loop.tree().is_consistent(1e-6));
            }
        }
        assert!(planner_loop.tree().is_consistent(1e-6));
    }

    #[test]
    fn test_path_segments_are_collision_free() {
        let planner = SamplePlanner::new(walled_grid(), config(2500, 3)).unwrap();
        let path = planner.plan(start(), goal(), 0.5).unwrap();
        assert_eq!(path.first().unwrap().position(), start().position());
        assert!(path.last().unwrap().position().distance(&goal().position()) <= 0.5);
        assert_relative_eq!(path.last().unwrap().yaw, 0.5);
        for w in path.poses.windows(2) {
            assert!(planner.space().segment_free(w[0].position(), w[1].position()));
        }
    }

    #[test]
    fn test_more_samples_approach_straight_line() {
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(10.0, 0.0, 0.0);
        let cfg = |n| SamplePlannerConfig {
            sample_max_d: 1.0,
            ..config(n, 5)
        };
        let short = SamplePlanner::new(OpenField, cfg(600)).unwrap().plan_detailed(start, goal, 0.5);
        let long = SamplePlanner::new(OpenField, cfg(4000)).unwrap().plan_detailed(start, goal, 0.5);

        let short_cost = short.best_cost.unwrap();
        let long_cost = long.best_cost.unwrap();
        assert!(long_cost <= short_cost + 1e-9);
        assert!(long_cost >= 10.0 - 1e-9);
        assert!(long_cost < 11.0, "cost {}", long_cost);
        assert!(long.result.unwrap().total_length() < 11.0);
    }

    #[test]
    fn test_goal_in_inflated_region_is_rejected() {
        let mut grid = CostGrid::new(Bounds::new(0.0, 0.0, 10.0, 10.0), 0.1).unwrap();
        grid.add_rectangle(Point2D::new(9.3, 9.0), Point2D::new(9.5, 9.9));
        assert!(grid.is_free(goal().position()));

        let planner = SamplePlanner::from_grid(
            grid,
            SamplePlannerConfig {
                factor: 0.5,
                ..config(500, 1)
            },
        )
        .unwrap();
        let report = planner.plan_detailed(start(), goal(), 0.5);
        assert!(matches!(report.result, Err(PlannerError::InvalidGoal(_))));
        assert_eq!(report.iterations, 0);
        assert!(report.exploration.is_empty());
    }

    #[test]
    fn test_invalid_start_is_rejected() {
        let planner = SamplePlanner::new(walled_grid(), config(100, 1)).unwrap();
        let result = planner.plan(Pose2D::new(3.2, 1.0, 0.0), goal(), 0.5);
        assert!(matches!(result, Err(PlannerError::InvalidStart(_))));
        let result = planner.plan(Pose2D::new(-1.0, 1.0, 0.0), goal(), 0.5);
        assert!(matches!(result, Err(PlannerError::InvalidStart(_))));
    }

    #[test]
    fn test_enclosed_goal_exhausts_budget() {
        let mut grid = CostGrid::new(Bounds::new(0.0, 0.0, 10.0, 10.0), 0.1).unwrap();
        grid.add_rectangle(Point2D::new(7.0, 7.0), Point2D::new(9.9, 7.3));
        grid.add_rectangle(Point2D::new(7.0, 7.0), Point2D::new(7.3, 9.9));
        grid.add_rectangle(Point2D::new(9.6, 7.0), Point2D::new(9.9, 9.9));
        grid.add_rectangle(Point2D::new(7.0, 9.6), Point2D::new(9.9, 9.9));
        let enclosed = Pose2D::new(8.5, 8.5, 0.0);

        let planner = SamplePlanner::new(grid, config(400, 2)).unwrap();
        let report = planner.plan_detailed(start(), enclosed, 0.5);
        match report.result {
            Err(PlannerError::NoPathFound { iterations, explored }) => {
                assert_eq!(iterations, 400);
                assert_eq!(explored, report.exploration.len());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(report.iterations, 400);
        assert!(report.exploration.len() > 1);
        assert!(report.best_cost.is_none());
    }

    #[test]
    fn test_first_solution_stops_without_refinement() {
        let cfg = SamplePlannerConfig {
            search_until_max_iter: false,
            ..config(5000, 6)
        };
        let report = SamplePlanner::new(OpenField, cfg).unwrap().plan_detailed(
            Pose2D::new(0.0, 0.0, 0.0),
            Pose2D::new(10.0, 0.0, 0.0),
            0.5,
        );
        assert!(report.result.is_ok());
        assert!(report.iterations < 5000);
    }

    #[test]
    fn test_start_inside_tolerance_is_solved_immediately() {
        let cfg = SamplePlannerConfig {
            search_until_max_iter: false,
            ..config(100, 0)
        };
        let planner = SamplePlanner::new(OpenField, cfg).unwrap();
        let report = planner.plan_detailed(Pose2D::new(1.0, 1.0, 0.0), Pose2D::new(1.2, 1.0, 0.0), 0.5);
        assert_eq!(report.iterations, 0);
        let path = report.result.unwrap();
        assert_eq!(path.first().unwrap().position(), Point2D::new(1.0, 1.0));
        assert!(path.last().unwrap().position().distance(&Point2D::new(1.2, 1.0)) <= 0.5);
        assert_eq!(report.exploration.len(), 2);
    }

    #[test]
    fn test_cancel_stops_before_iterating() {
        let planner = SamplePlanner::new(walled_grid(), config(1000, 0)).unwrap();
        planner.cancel_handle().store(true, Ordering::SeqCst);
        let report = planner.plan_detailed(start(), goal(), 0.5);
        assert!(matches!(report.result, Err(PlannerError::NoPathFound { iterations: 0, .. })));
        assert_eq!(report.exploration.len(), 1);
    }

    #[test]
    fn test_zero_time_budget() {
        let cfg = SamplePlannerConfig {
            max_planning_time: Some(Duration::ZERO),
            ..config(1000, 0)
        };
        let report = SamplePlanner::new(walled_grid(), cfg).unwrap().plan_detailed(start(), goal(), 0.5);
        assert_eq!(report.iterations, 0);
        assert!(report.result.is_err());
    }

    #[test]
    fn test_observer_receives_exploration() {
        let seen = Arc::new(AtomicUsize::new(0));
        let cfg = SamplePlannerConfig {
            is_expand: true,
            ..config(200, 0)
        };
        let planner = SamplePlanner::new(walled_grid(), cfg)
            .unwrap()
            .with_observer(Box::new(CountingObserver(Arc::clone(&seen))));
        let report = planner.plan_detailed(start(), goal(), 0.5);
        assert!(seen.load(Ordering::SeqCst) > 1);
        assert_eq!(seen.load(Ordering::SeqCst), report.exploration.len());
    }

    /// Space whose membership test ignores its (empty) bounds
    struct Degenerate;

    impl ConfigurationSpace for Degenerate {
        fn bounds(&self) -> Bounds {
            Bounds::new(0.0, 0.0, 0.0, f64::NAN)
        }

        fn in_bounds(&self, _p: Point2D) -> bool {
            true
        }

        fn is_free(&self, _p: Point2D) -> bool {
            true
        }

        fn cost(&self, _p: Point2D) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_rejects_space_without_area() {
        let result = PlannerLoop::new(&Degenerate, config(10, 0), start(), goal(), 0.5);
        assert!(matches!(result, Err(PlannerError::InvalidParameter(_))));

        let report = SamplePlanner::new(Degenerate, config(10, 0)).unwrap().plan_detailed(start(), goal(), 0.5);
        assert!(matches!(report.result, Err(PlannerError::InvalidParameter(_))));
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = SamplePlannerConfig {
            opt_r: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            SamplePlanner::new(OpenField, cfg),
            Err(PlannerError::InvalidParameter(_))
        ));
    }
}
