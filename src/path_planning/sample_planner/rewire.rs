//! Choose-parent and rewire steps with optional fork-join edge evaluation
//!
//! Each neighbor edge of a new candidate is collision checked exactly
//! once. With more than one worker the neighbor list is split into
//! chunks evaluated on scoped threads that only read the tree and the
//! configuration space; joining the scope is the barrier before the
//! single-threaded commit.

use std::thread;

use log::warn;
use ordered_float::OrderedFloat;

use crate::common::{ConfigurationSpace, Point2D};

use super::config::SamplePlannerConfig;
use super::tree::{NodeIndex, Tree};

/// Smallest share of neighbors worth handing to a separate worker
const MIN_NEIGHBORS_PER_WORKER: usize = 4;

/// Thread name prefix of rewiring workers
pub const WORKER_NAME_PREFIX: &str = "rewire-worker";

/// Collision and length of the edge between a neighbor and the candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborEdge {
    pub index: NodeIndex,
    pub free: bool,
    pub length: f64,
}

/// Chosen parent plus the evaluated neighbor edges it was chosen from
#[derive(Debug, Clone)]
pub struct Connection {
    pub parent: NodeIndex,
    pub edges: Vec<NeighborEdge>,
}

/// Result of committing one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertOutcome {
    pub node: NodeIndex,
    pub parent: NodeIndex,
    pub rewired: usize,
}

#[derive(Debug, Clone)]
pub struct RewireEngine {
    opt_r: f64,
    threads: usize,
}

impl RewireEngine {
    pub fn new(config: &SamplePlannerConfig) -> Self {
        RewireEngine {
            opt_r: config.opt_r,
            threads: config.rewire_threads_n.max(1),
        }
    }

    /// Nodes within `opt_r` of the candidate plus the steering origin, ascending
    pub fn neighbors(&self, tree: &Tree, candidate: Point2D, origin: NodeIndex) -> Vec<NodeIndex> {
        let mut near = tree.radius_query(candidate, self.opt_r);
        if let Err(pos) = near.binary_search(&origin) {
            near.insert(pos, origin);
        }
        near
    }

    fn worker_count(&self, neighbors: usize) -> usize {
        let useful = (neighbors + MIN_NEIGHBORS_PER_WORKER - 1) / MIN_NEIGHBORS_PER_WORKER;
        self.threads.min(useful).max(1)
    }

    /// Evaluate every neighbor edge, in the order of `neighbors`
    pub fn evaluate<C>(&self, tree: &Tree, space: &C, candidate: Point2D, neighbors: &[NodeIndex]) -> Vec<NeighborEdge>
    where
        C: ConfigurationSpace + ?Sized,
    {
        let workers = self.worker_count(neighbors.len());
        if workers <= 1 {
            return evaluate_chunk(tree, space, candidate, neighbors);
        }

        let chunk_size = (neighbors.len() + workers - 1) / workers;
        thread::scope(|scope| {
            let handles: Vec<_> = neighbors
                .chunks(chunk_size)
                .enumerate()
                .map(|(i, chunk)| {
                    let handle = thread::Builder::new()
                        .name(format!("{}-{}", WORKER_NAME_PREFIX, i))
                        .spawn_scoped(scope, move || evaluate_chunk(tree, space, candidate, chunk));
                    (i, chunk, handle)
                })
                .collect();

            let mut edges = Vec::with_capacity(neighbors.len());
            for (i, chunk, handle) in handles {
                let joined = match handle {
                    Ok(h) => h.join().map_err(|_| "panicked".to_string()),
                    Err(e) => Err(format!("could not be spawned: {}", e)),
                };
                match joined {
                    Ok(part) => edges.extend(part),
                    Err(reason) => {
                        warn!(
                            "[SamplePlanner] {}-{} {}; re-evaluating {} neighbors on the planning thread",
                            WORKER_NAME_PREFIX,
                            i,
                            reason,
                            chunk.len()
                        );
                        edges.extend(evaluate_chunk(tree, space, candidate, chunk));
                    }
                }
            }
            edges
        })
    }

    /// Free edge minimizing `cost(neighbor) + length`; ties go to the lowest index
    pub fn choose_parent(tree: &Tree, edges: &[NeighborEdge]) -> Option<NodeIndex> {
        edges
            .iter()
            .filter(|e| e.free)
            .min_by_key(|e| (OrderedFloat(tree.cost(e.index) + e.length), e.index))
            .map(|e| e.index)
    }

    /// Evaluate the neighborhood of `candidate` and pick its parent.
    ///
    /// Returns `None` when no neighbor reaches the candidate with a free edge.
    pub fn connect<C>(&self, tree: &Tree, space: &C, candidate: Point2D, origin: NodeIndex) -> Option<Connection>
    where
        C: ConfigurationSpace + ?Sized,
    {
        let neighbors = self.neighbors(tree, candidate, origin);
        let edges = self.evaluate(tree, space, candidate, &neighbors);
        let parent = Self::choose_parent(tree, &edges)?;
        Some(Connection { parent, edges })
    }

    /// Re-parent every neighbor of `node` whose cost strictly improves through it
    pub fn rewire(tree: &mut Tree, node: NodeIndex, connection: &Connection) -> usize {
        let mut rewired = 0;
        for edge in connection.edges.iter().filter(|e| e.free && e.index != connection.parent) {
            let m = edge.index;
            if m == Tree::ROOT || m == node || tree.is_ancestor(m, node) {
                continue;
            }
            if tree.cost(node) + edge.length < tree.cost(m) {
                tree.reparent(m, node);
                rewired += 1;
            }
        }
        rewired
    }

    /// Insert `candidate` under its cheapest free neighbor and rewire the rest
    pub fn insert<C>(&self, tree: &mut Tree, space: &C, candidate: Point2D, origin: NodeIndex) -> Option<InsertOutcome>
    where
        C: ConfigurationSpace + ?Sized,
    {
        let connection = self.connect(tree, space, candidate, origin)?;
        let node = tree.insert(candidate, connection.parent);
        let rewired = Self::rewire(tree, node, &connection);
        Some(InsertOutcome {
            node,
            parent: connection.parent,
            rewired,
        })
    }
}

fn evaluate_chunk<C>(tree: &Tree, space: &C, candidate: Point2D, chunk: &[NodeIndex]) -> Vec<NeighborEdge>
where
    C: ConfigurationSpace + ?Sized,
{
    chunk
        .iter()
        .map(|&index| {
            let position = tree.position(index);
            NeighborEdge {
                index,
                free: space.segment_free(position, candidate),
                length: Tree::edge_cost(&position, &candidate),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Bounds;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct OpenField;

    impl ConfigurationSpace for OpenField {
        fn bounds(&self) -> Bounds {
            Bounds::new(-20.0, -20.0, 20.0, 20.0)
        }

        fn is_free(&self, p: Point2D) -> bool {
            self.in_bounds(p)
        }

        fn cost(&self, _p: Point2D) -> f64 {
            0.0
        }
    }

    /// Open field whose segment check panics on rewiring workers
    struct FragileField;

    impl ConfigurationSpace for FragileField {
        fn bounds(&self) -> Bounds {
            OpenField.bounds()
        }

        fn is_free(&self, p: Point2D) -> bool {
            self.in_bounds(p)
        }

        fn cost(&self, _p: Point2D) -> f64 {
            0.0
        }

        fn segment_free(&self, a: Point2D, b: Point2D) -> bool {
            let on_worker = thread::current()
                .name()
                .map(|n| n.starts_with(WORKER_NAME_PREFIX))
                .unwrap_or(false);
            if on_worker {
                panic!("segment check failed on a worker");
            }
            OpenField.segment_free(a, b)
        }
    }

    fn engine(opt_r: f64, threads: usize) -> RewireEngine {
        RewireEngine::new(&SamplePlannerConfig {
            opt_r,
            rewire_threads_n: threads,
            ..Default::default()
        })
    }

    fn grow<C: ConfigurationSpace>(engine: &RewireEngine, space: &C, n: usize, seed: u64) -> Tree {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tree = Tree::new(Point2D::new(0.0, 0.0), engine.opt_r);
        for _ in 0..n {
            let p = Point2D::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let origin = tree.nearest(p);
            engine.insert(&mut tree, space, p, origin);
        }
        tree
    }

    #[test]
    fn test_choose_parent_prefers_cheaper_route() {
        let mut tree = Tree::new(Point2D::new(0.0, 0.0), 1.0);
        let detour = tree.insert(Point2D::new(0.0, 2.0), Tree::ROOT);
        let far = tree.insert(Point2D::new(2.0, 2.0), detour);
        let direct = tree.insert(Point2D::new(2.0, 0.0), Tree::ROOT);

        let e = engine(2.5, 1);
        let outcome = e.insert(&mut tree, &OpenField, Point2D::new(4.0, 1.0), far).unwrap();
        assert_eq!(outcome.parent, direct);
        assert_relative_eq!(tree.cost(outcome.node), 2.0 + 5.0_f64.sqrt(), epsilon = 1e-12);
        assert!(tree.is_consistent(1e-9));
    }

    #[test]
    fn test_choose_parent_ties_to_lowest_index() {
        let mut tree = Tree::new(Point2D::new(0.0, 0.0), 1.0);
        let a = tree.insert(Point2D::new(1.0, 1.0), Tree::ROOT);
        let b = tree.insert(Point2D::new(1.0, -1.0), Tree::ROOT);
        let edges = vec![
            NeighborEdge { index: b, free: true, length: 1.0 },
            NeighborEdge { index: a, free: true, length: 1.0 },
        ];
        assert_eq!(RewireEngine::choose_parent(&tree, &edges), Some(a));
        let blocked = vec![NeighborEdge { index: a, free: false, length: 1.0 }];
        assert_eq!(RewireEngine::choose_parent(&tree, &blocked), None);
    }

    #[test]
    fn test_rewire_shortens_neighbor_and_descendants() {
        let mut tree = Tree::new(Point2D::new(0.0, 0.0), 1.0);
        let up = tree.insert(Point2D::new(0.0, 1.5), Tree::ROOT);
        let m = tree.insert(Point2D::new(1.5, 1.5), up);
        let leaf = tree.insert(Point2D::new(3.0, 1.5), m);
        let before = tree.cost(leaf);

        let e = engine(2.0, 1);
        let outcome = e.insert(&mut tree, &OpenField, Point2D::new(1.0, 0.5), Tree::ROOT).unwrap();
        assert_eq!(outcome.parent, Tree::ROOT);
        assert_eq!(outcome.rewired, 1);
        assert_eq!(tree.parent(m), Some(outcome.node));
        assert!(tree.cost(leaf) < before);
        assert!(tree.is_consistent(1e-9));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let serial = grow(&engine(2.5, 1), &OpenField, 400, 21);
        let parallel = grow(&engine(2.5, 4), &OpenField, 400, 21);
        assert_eq!(serial.len(), parallel.len());
        for i in 0..serial.len() {
            assert_eq!(serial.parent(i), parallel.parent(i));
            assert_relative_eq!(serial.cost(i), parallel.cost(i), epsilon = 1e-12);
        }
        assert!(parallel.is_consistent(1e-9));
    }

    #[test]
    fn test_worker_panic_falls_back_to_planning_thread() {
        let reference = grow(&engine(3.0, 1), &OpenField, 120, 5);
        let recovered = grow(&engine(3.0, 3), &FragileField, 120, 5);
        assert_eq!(reference.len(), recovered.len());
        for i in 0..reference.len() {
            assert_eq!(reference.parent(i), recovered.parent(i));
        }
        assert!(recovered.is_consistent(1e-9));
    }

    #[test]
    fn test_neighbors_include_origin() {
        let mut tree = Tree::new(Point2D::new(0.0, 0.0), 1.0);
        let far = tree.insert(Point2D::new(5.0, 0.0), Tree::ROOT);
        let e = engine(1.0, 1);
        assert_eq!(e.neighbors(&tree, Point2D::new(5.5, 0.0), Tree::ROOT), vec![Tree::ROOT, far]);
        assert_eq!(e.neighbors(&tree, Point2D::new(5.5, 0.0), far), vec![far]);
    }
}
