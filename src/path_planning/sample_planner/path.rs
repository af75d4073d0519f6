//! Path extraction and the read-only exploration export

use std::io::Write;

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D, Visualizable};
use crate::utils::Visualizer;

use super::tree::{NodeIndex, Tree};

pub struct PathExtractor;

impl PathExtractor {
    /// Walk parent links from `goal_node` to the root and reverse them.
    ///
    /// Headings follow the next segment; the last pose keeps `goal_yaw`.
    pub fn extract(tree: &Tree, goal_node: Option<NodeIndex>, goal_yaw: f64) -> PlannerResult<Path2D> {
        let goal_node = match goal_node {
            Some(i) if i < tree.len() => i,
            _ => {
                return Err(PlannerError::NoPathFound {
                    iterations: 0,
                    explored: tree.len(),
                })
            }
        };

        let chain = tree.path_to_root(goal_node);
        if chain.last() != Some(&Tree::ROOT) {
            return Err(PlannerError::NoPathFound {
                iterations: 0,
                explored: tree.len(),
            });
        }

        let points: Vec<Point2D> = chain.iter().rev().map(|&i| tree.position(i)).collect();
        let mut path = Path2D::from_points(&points);
        if let Some(last) = path.poses.last_mut() {
            last.yaw = goal_yaw;
            last.normalize_yaw();
        }
        Ok(path)
    }
}

/// One explored node as handed to external renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExploredNode {
    pub position: Point2D,
    pub parent: Option<NodeIndex>,
    pub cost: f64,
}

/// Snapshot of the explored tree taken after planning terminates
#[derive(Debug, Clone, Default)]
pub struct ExplorationSnapshot {
    pub nodes: Vec<ExploredNode>,
}

impl ExplorationSnapshot {
    pub fn from_tree(tree: &Tree) -> Self {
        ExplorationSnapshot {
            nodes: tree
                .nodes()
                .iter()
                .map(|n| ExploredNode {
                    position: n.position,
                    parent: n.parent,
                    cost: n.cost,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// (parent, child) segments of the tree
    pub fn edges(&self) -> Vec<(Point2D, Point2D)> {
        self.nodes
            .iter()
            .filter_map(|n| n.parent.and_then(|p| self.nodes.get(p)).map(|p| (p.position, n.position)))
            .collect()
    }

    /// Write `index,x,y,parent,cost` rows; the root's parent column is empty
    pub fn write_csv<W: Write>(&self, mut writer: W) -> PlannerResult<()> {
        writeln!(writer, "index,x,y,parent,cost")?;
        for (i, n) in self.nodes.iter().enumerate() {
            let parent = n.parent.map(|p| p.to_string()).unwrap_or_default();
            writeln!(writer, "{},{},{},{},{}", i, n.position.x, n.position.y, parent, n.cost)?;
        }
        Ok(())
    }
}

impl Visualizable for ExplorationSnapshot {
    fn visualize(&self, vis: &mut Visualizer) {
        vis.plot_edges(&self.edges());
    }
}

impl Visualizable for Path2D {
    fn visualize(&self, vis: &mut Visualizer) {
        vis.plot_path(self, &Default::default());
    }
}
