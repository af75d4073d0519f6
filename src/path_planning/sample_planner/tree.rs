//! Exploration tree: a flat node store with integer parent links
//!
//! Nodes are never removed, so a `NodeIndex` stays valid for the whole
//! planning run. Re-parenting is a field update plus a cost
//! propagation through the affected subtree.

use std::collections::HashMap;

use crate::common::Point2D;

pub type NodeIndex = usize;

/// Trees with at most this many nodes answer `nearest` by a linear scan
const LINEAR_SCAN_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Point2D,
    pub parent: Option<NodeIndex>,
    pub cost: f64,
}

/// Uniform bucket grid over node positions
#[derive(Debug, Clone)]
struct BucketIndex {
    cell_size: f64,
    buckets: HashMap<(i64, i64), Vec<NodeIndex>>,
    min_cell: (i64, i64),
    max_cell: (i64, i64),
}

impl BucketIndex {
    fn new(cell_size: f64) -> Self {
        BucketIndex {
            cell_size,
            buckets: HashMap::new(),
            min_cell: (i64::MAX, i64::MAX),
            max_cell: (i64::MIN, i64::MIN),
        }
    }

    fn cell_of(&self, p: &Point2D) -> (i64, i64) {
        ((p.x / self.cell_size).floor() as i64, (p.y / self.cell_size).floor() as i64)
    }

    fn insert(&mut self, p: &Point2D, index: NodeIndex) {
        let cell = self.cell_of(p);
        self.min_cell = (self.min_cell.0.min(cell.0), self.min_cell.1.min(cell.1));
        self.max_cell = (self.max_cell.0.max(cell.0), self.max_cell.1.max(cell.1));
        self.buckets.entry(cell).or_default().push(index);
    }

    fn covers(&self, cell: (i64, i64)) -> bool {
        cell.0 >= self.min_cell.0 && cell.0 <= self.max_cell.0 && cell.1 >= self.min_cell.1 && cell.1 <= self.max_cell.1
    }

    fn bucket(&self, cell: (i64, i64)) -> &[NodeIndex] {
        self.buckets.get(&cell).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    children: Vec<Vec<NodeIndex>>,
    index: BucketIndex,
}

impl Tree {
    pub const ROOT: NodeIndex = 0;

    /// Create a tree holding only the root; `cell_size` sizes the spatial buckets
    pub fn new(root: Point2D, cell_size: f64) -> Self {
        let mut index = BucketIndex::new(cell_size.max(f64::EPSILON));
        index.insert(&root, Self::ROOT);
        Tree {
            nodes: vec![Node { position: root, parent: None, cost: 0.0 }],
            children: vec![Vec::new()],
            index,
        }
    }

    pub fn edge_cost(from: &Point2D, to: &Point2D) -> f64 {
        from.distance(to)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn position(&self, index: NodeIndex) -> Point2D {
        self.nodes[index].position
    }

    pub fn cost(&self, index: NodeIndex) -> f64 {
        self.nodes[index].cost
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes[index].parent
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.children[index]
    }

    /// Node closest to `p`; ties go to the lowest index
    pub fn nearest(&self, p: Point2D) -> NodeIndex {
        let center = self.index.cell_of(&p);
        if self.nodes.len() <= LINEAR_SCAN_LIMIT || !self.index.covers(center) {
            return self.nearest_linear(&p);
        }

        let max_ring = [
            center.0 - self.index.min_cell.0,
            self.index.max_cell.0 - center.0,
            center.1 - self.index.min_cell.1,
            self.index.max_cell.1 - center.1,
        ]
        .iter()
        .cloned()
        .max()
        .unwrap_or(0);

        let mut best: Option<(f64, NodeIndex)> = None;
        let visit = |cell: (i64, i64), best: &mut Option<(f64, NodeIndex)>| {
            for &i in self.index.bucket(cell) {
                let d = self.nodes[i].position.distance_squared(&p);
                let better = match *best {
                    None => true,
                    Some((bd, bi)) => d < bd || (d == bd && i < bi),
                };
                if better {
                    *best = Some((d, i));
                }
            }
        };

        for ring in 0..=max_ring {
            if ring == 0 {
                visit(center, &mut best);
            } else {
                for dx in -ring..=ring {
                    visit((center.0 + dx, center.1 - ring), &mut best);
                    visit((center.0 + dx, center.1 + ring), &mut best);
                }
                for dy in (-ring + 1)..ring {
                    visit((center.0 - ring, center.1 + dy), &mut best);
                    visit((center.0 + ring, center.1 + dy), &mut best);
                }
            }
            // Unvisited rings are at least `ring` cells away
            if let Some((d, _)) = best {
                let reach = ring as f64 * self.index.cell_size;
                if d < reach * reach {
                    break;
                }
            }
        }

        best.map(|(_, i)| i).unwrap_or(Self::ROOT)
    }

    fn nearest_linear(&self, p: &Point2D) -> NodeIndex {
        let mut min_dist = f64::INFINITY;
        let mut nearest_ind = Self::ROOT;

        for (i, node) in self.nodes.iter().enumerate() {
            let dist = node.position.distance_squared(p);
            if dist < min_dist {
                min_dist = dist;
                nearest_ind = i;
            }
        }

        nearest_ind
    }

    /// All nodes within `radius` of `p`, in ascending index order
    pub fn radius_query(&self, p: Point2D, radius: f64) -> Vec<NodeIndex> {
        let r2 = radius * radius;
        let lo = self.index.cell_of(&Point2D::new(p.x - radius, p.y - radius));
        let hi = self.index.cell_of(&Point2D::new(p.x + radius, p.y + radius));
        let lo = (lo.0.max(self.index.min_cell.0), lo.1.max(self.index.min_cell.1));
        let hi = (hi.0.min(self.index.max_cell.0), hi.1.min(self.index.max_cell.1));

        let mut found = Vec::new();
        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                found.extend(
                    self.index
                        .bucket((cx, cy))
                        .iter()
                        .filter(|&&i| self.nodes[i].position.distance_squared(&p) <= r2),
                );
            }
        }
        found.sort_unstable();
        found
    }

    /// Append a node under `parent`; its cost follows from the parent
    pub(crate) fn insert(&mut self, position: Point2D, parent: NodeIndex) -> NodeIndex {
        let cost = self.nodes[parent].cost + Self::edge_cost(&self.nodes[parent].position, &position);
        let index = self.nodes.len();
        self.nodes.push(Node { position, parent: Some(parent), cost });
        self.children.push(Vec::new());
        self.children[parent].push(index);
        self.index.insert(&position, index);
        index
    }

    /// Move `child` under `new_parent` and refresh the costs of its subtree.
    ///
    /// Returns the cost reduction of `child`.
    pub(crate) fn reparent(&mut self, child: NodeIndex, new_parent: NodeIndex) -> f64 {
        debug_assert!(child != Self::ROOT, "the root has no parent");
        debug_assert!(!self.is_ancestor(child, new_parent), "re-parenting would close a cycle");

        if let Some(old_parent) = self.nodes[child].parent {
            self.children[old_parent].retain(|&c| c != child);
        }
        self.children[new_parent].push(child);
        self.nodes[child].parent = Some(new_parent);

        let old_cost = self.nodes[child].cost;
        self.refresh_cost(child);
        let delta = old_cost - self.nodes[child].cost;
        self.propagate_cost_to_leaves(child);
        delta
    }

    fn refresh_cost(&mut self, index: NodeIndex) {
        if let Some(parent) = self.nodes[index].parent {
            let parent_node = &self.nodes[parent];
            self.nodes[index].cost = parent_node.cost + Self::edge_cost(&parent_node.position, &self.nodes[index].position);
        }
    }

    fn propagate_cost_to_leaves(&mut self, parent: NodeIndex) {
        let mut stack: Vec<NodeIndex> = self.children[parent].clone();
        while let Some(i) = stack.pop() {
            self.refresh_cost(i);
            stack.extend_from_slice(&self.children[i]);
        }
    }

    /// Whether `ancestor` lies on the parent chain of `node` (a node is its own ancestor)
    pub fn is_ancestor(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        let mut current = Some(node);
        let mut hops = 0;
        while let Some(i) = current {
            if i == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.nodes.len() {
                return false;
            }
            current = self.nodes[i].parent;
        }
        false
    }

    /// Indices from `index` up to the root, inclusive
    pub fn path_to_root(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            chain.push(i);
            if chain.len() > self.nodes.len() {
                break;
            }
            current = self.nodes[i].parent;
        }
        chain
    }

    /// Check the structural and cost invariants of the whole tree.
    ///
    /// Every non-root node must reach the root without revisiting a node,
    /// appear exactly once in its parent's child list, and carry
    /// `cost(parent) + edge_cost` within `eps`.
    pub fn is_consistent(&self, eps: f64) -> bool {
        if self.nodes.is_empty() || self.nodes[Self::ROOT].parent.is_some() || self.nodes[Self::ROOT].cost != 0.0 {
            return false;
        }
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            let parent = match node.parent {
                Some(p) if p < self.nodes.len() && p != i => p,
                _ => return false,
            };
            if self.children[parent].iter().filter(|&&c| c == i).count() != 1 {
                return false;
            }
            let expected = self.nodes[parent].cost + Self::edge_cost(&self.nodes[parent].position, &node.position);
            if (node.cost - expected).abs() > eps || node.cost < 0.0 {
                return false;
            }
            if !self.is_ancestor(Self::ROOT, i) {
                return false;
            }
        }
        let linked: usize = self.children.iter().map(|c| c.len()).sum();
        linked == self.nodes.len() - 1
    }
}
