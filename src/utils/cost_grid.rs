// Cost grid configuration space for the sampling planner
// Cost conventions follow the ROS costmap_2d layer values

use itertools::iproduct;
use nalgebra::DMatrix;

use crate::common::{Bounds, ConfigurationSpace, PlannerError, PlannerResult, Point2D};

pub const FREE_SPACE: u8 = 0;
pub const INSCRIBED_INFLATED_OBSTACLE: u8 = 253;
pub const LETHAL_OBSTACLE: u8 = 254;
pub const NO_INFORMATION: u8 = 255;

/// Crossing parameters closer than this are treated as a corner crossing
const CORNER_EPS: f64 = 1e-12;

/// Occupancy/cost grid indexed as `(ix, iy)`.
///
/// Cells with a cost of `INSCRIBED_INFLATED_OBSTACLE` or above are
/// occupied; anything lower is free with a traversal cost.
#[derive(Debug, Clone)]
pub struct CostGrid {
    pub resolution: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub x_width: usize,
    pub y_width: usize,
    costs: DMatrix<u8>,
}

impl CostGrid {
    /// Create an all-free grid covering `bounds`
    pub fn new(bounds: Bounds, resolution: f64) -> PlannerResult<Self> {
        if !(resolution > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "grid resolution must be positive, got {}",
                resolution
            )));
        }
        let x_width = (bounds.width() / resolution).round() as usize;
        let y_width = (bounds.height() / resolution).round() as usize;
        if x_width == 0 || y_width == 0 {
            return Err(PlannerError::InvalidParameter(format!(
                "grid bounds {:?} hold no cell at resolution {}",
                bounds, resolution
            )));
        }

        Ok(CostGrid {
            resolution,
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            max_x: bounds.min_x + x_width as f64 * resolution,
            max_y: bounds.min_y + y_width as f64 * resolution,
            x_width,
            y_width,
            costs: DMatrix::from_element(x_width, y_width, FREE_SPACE),
        })
    }

    /// Create a grid spanning the obstacle points; every cell within
    /// `robot_radius` of an obstacle point is lethal
    pub fn from_obstacles(ox: &[f64], oy: &[f64], resolution: f64, robot_radius: f64) -> PlannerResult<Self> {
        if ox.is_empty() || ox.len() != oy.len() {
            return Err(PlannerError::InvalidParameter(
                "obstacle coordinate lists must be non-empty and of equal length".to_string(),
            ));
        }
        let min_x = ox.iter().cloned().fold(f64::INFINITY, f64::min).round();
        let min_y = oy.iter().cloned().fold(f64::INFINITY, f64::min).round();
        let max_x = ox.iter().cloned().fold(f64::NEG_INFINITY, f64::max).round();
        let max_y = oy.iter().cloned().fold(f64::NEG_INFINITY, f64::max).round();

        let mut grid = Self::new(Bounds::new(min_x, min_y, max_x + resolution, max_y + resolution), resolution)?;
        for (&x, &y) in ox.iter().zip(oy.iter()) {
            grid.add_circle(Point2D::new(x, y), robot_radius.max(0.5 * resolution));
        }
        Ok(grid)
    }

    pub fn grid_bounds(&self) -> Bounds {
        Bounds::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn calc_x_index(&self, x: f64) -> i64 {
        ((x - self.min_x) / self.resolution).floor() as i64
    }

    pub fn calc_y_index(&self, y: f64) -> i64 {
        ((y - self.min_y) / self.resolution).floor() as i64
    }

    /// World x of the cell center
    pub fn calc_x_position(&self, ix: usize) -> f64 {
        self.min_x + (ix as f64 + 0.5) * self.resolution
    }

    /// World y of the cell center
    pub fn calc_y_position(&self, iy: usize) -> f64 {
        self.min_y + (iy as f64 + 0.5) * self.resolution
    }

    fn cell(&self, ix: i64, iy: i64) -> Option<(usize, usize)> {
        if ix < 0 || iy < 0 || ix >= self.x_width as i64 || iy >= self.y_width as i64 {
            None
        } else {
            Some((ix as usize, iy as usize))
        }
    }

    pub fn world_to_grid(&self, p: Point2D) -> Option<(usize, usize)> {
        if !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        self.cell(self.calc_x_index(p.x), self.calc_y_index(p.y))
    }

    pub fn grid_to_world(&self, ix: usize, iy: usize) -> Point2D {
        Point2D::new(self.calc_x_position(ix), self.calc_y_position(iy))
    }

    pub fn get_cost(&self, ix: usize, iy: usize) -> Option<u8> {
        if ix < self.x_width && iy < self.y_width {
            Some(self.costs[(ix, iy)])
        } else {
            None
        }
    }

    pub fn set_cost(&mut self, ix: usize, iy: usize, cost: u8) {
        if ix < self.x_width && iy < self.y_width {
            self.costs[(ix, iy)] = cost;
        }
    }

    /// Set the cost of the cell holding `p`; false when `p` is off the grid
    pub fn set_cost_at(&mut self, p: Point2D, cost: u8) -> bool {
        match self.world_to_grid(p) {
            Some((ix, iy)) => {
                self.set_cost(ix, iy, cost);
                true
            }
            None => false,
        }
    }

    fn is_cell_free(&self, ix: i64, iy: i64) -> bool {
        match self.cell(ix, iy) {
            Some(c) => self.costs[c] < INSCRIBED_INFLATED_OBSTACLE,
            None => false,
        }
    }

    /// Mark every cell whose center lies in the rectangle as lethal
    pub fn add_rectangle(&mut self, corner_a: Point2D, corner_b: Point2D) {
        let (lo_x, hi_x) = (corner_a.x.min(corner_b.x), corner_a.x.max(corner_b.x));
        let (lo_y, hi_y) = (corner_a.y.min(corner_b.y), corner_a.y.max(corner_b.y));
        for (ix, iy) in iproduct!(0..self.x_width, 0..self.y_width) {
            let c = self.grid_to_world(ix, iy);
            if c.x >= lo_x && c.x <= hi_x && c.y >= lo_y && c.y <= hi_y {
                self.costs[(ix, iy)] = LETHAL_OBSTACLE;
            }
        }
    }

    /// Mark every cell whose center lies within `radius` of `center` as lethal
    pub fn add_circle(&mut self, center: Point2D, radius: f64) {
        let r_cells = (radius / self.resolution).ceil() as i64 + 1;
        let cx = self.calc_x_index(center.x);
        let cy = self.calc_y_index(center.y);
        for (dx, dy) in iproduct!(-r_cells..=r_cells, -r_cells..=r_cells) {
            if let Some((ix, iy)) = self.cell(cx + dx, cy + dy) {
                if self.grid_to_world(ix, iy).distance(&center) <= radius {
                    self.costs[(ix, iy)] = LETHAL_OBSTACLE;
                }
            }
        }
    }

    /// Treat the grid border as an obstacle
    pub fn outline(&mut self) {
        for ix in 0..self.x_width {
            self.costs[(ix, 0)] = LETHAL_OBSTACLE;
            self.costs[(ix, self.y_width - 1)] = LETHAL_OBSTACLE;
        }
        for iy in 0..self.y_width {
            self.costs[(0, iy)] = LETHAL_OBSTACLE;
            self.costs[(self.x_width - 1, iy)] = LETHAL_OBSTACLE;
        }
    }

    /// Grow lethal cells by `radius` world units.
    ///
    /// Cells reached by the inflation become `INSCRIBED_INFLATED_OBSTACLE`;
    /// lethal and unknown cells keep their cost.
    pub fn inflate(&mut self, radius: f64) {
        if radius <= 0.0 {
            return;
        }
        let lethal: Vec<(usize, usize)> = iproduct!(0..self.x_width, 0..self.y_width)
            .filter(|&c| self.costs[c] == LETHAL_OBSTACLE)
            .collect();
        let r_cells = (radius / self.resolution).ceil() as i64;
        let offsets: Vec<(i64, i64)> = iproduct!(-r_cells..=r_cells, -r_cells..=r_cells)
            .filter(|&(dx, dy)| (((dx * dx + dy * dy) as f64).sqrt() * self.resolution) <= radius)
            .collect();

        for (ix, iy) in lethal {
            for &(dx, dy) in &offsets {
                if let Some(c) = self.cell(ix as i64 + dx, iy as i64 + dy) {
                    if self.costs[c] < INSCRIBED_INFLATED_OBSTACLE {
                        self.costs[c] = INSCRIBED_INFLATED_OBSTACLE;
                    }
                }
            }
        }
    }

    /// Apply the planner preprocessing: optional outline, then inflation by `factor`
    pub fn prepared(mut self, is_outline: bool, factor: f64) -> Self {
        if is_outline {
            self.outline();
        }
        self.inflate(factor);
        self
    }

    /// Centers of all occupied cells
    pub fn occupied_cells(&self) -> Vec<Point2D> {
        iproduct!(0..self.x_width, 0..self.y_width)
            .filter(|&c| self.costs[c] >= INSCRIBED_INFLATED_OBSTACLE)
            .map(|(ix, iy)| self.grid_to_world(ix, iy))
            .collect()
    }

    /// Visit every cell the segment `a -> b` passes through (supercover
    /// traversal after Amanatides and Woo). Where the segment crosses a
    /// cell corner exactly, both side cells must be free as well.
    fn line_of_sight(&self, a: Point2D, b: Point2D) -> bool {
        let mut ix = self.calc_x_index(a.x);
        let mut iy = self.calc_y_index(a.y);
        let end = (self.calc_x_index(b.x), self.calc_y_index(b.y));
        if !self.is_cell_free(ix, iy) || !self.is_cell_free(end.0, end.1) {
            return false;
        }

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let (step_x, mut t_max_x, t_delta_x) = self.axis_crossings(a.x, dx, ix, self.min_x);
        let (step_y, mut t_max_y, t_delta_y) = self.axis_crossings(a.y, dy, iy, self.min_y);

        loop {
            let t = t_max_x.min(t_max_y);
            if t >= 1.0 {
                break;
            }
            if (t_max_x - t_max_y).abs() <= CORNER_EPS {
                if !self.is_cell_free(ix + step_x, iy) || !self.is_cell_free(ix, iy + step_y) {
                    return false;
                }
                ix += step_x;
                iy += step_y;
                t_max_x += t_delta_x;
                t_max_y += t_delta_y;
            } else if t_max_x < t_max_y {
                ix += step_x;
                t_max_x += t_delta_x;
            } else {
                iy += step_y;
                t_max_y += t_delta_y;
            }
            if !self.is_cell_free(ix, iy) {
                return false;
            }
        }

        true
    }

    /// Step direction, parameter of the first cell-boundary crossing and
    /// parameter spacing between crossings along one axis
    fn axis_crossings(&self, start: f64, delta: f64, index: i64, origin: f64) -> (i64, f64, f64) {
        if delta > 0.0 {
            let boundary = origin + (index + 1) as f64 * self.resolution;
            (1, (boundary - start) / delta, self.resolution / delta)
        } else if delta < 0.0 {
            let boundary = origin + index as f64 * self.resolution;
            (-1, (boundary - start) / delta, self.resolution / -delta)
        } else {
            (0, f64::INFINITY, f64::INFINITY)
        }
    }
}

impl ConfigurationSpace for CostGrid {
    fn bounds(&self) -> Bounds {
        self.grid_bounds()
    }

    fn in_bounds(&self, p: Point2D) -> bool {
        self.world_to_grid(p).is_some()
    }

    fn is_free(&self, p: Point2D) -> bool {
        match self.world_to_grid(p) {
            Some(c) => self.costs[c] < INSCRIBED_INFLATED_OBSTACLE,
            None => false,
        }
    }

    fn cost(&self, p: Point2D) -> f64 {
        match self.world_to_grid(p) {
            Some(c) => (self.costs[c].min(LETHAL_OBSTACLE)) as f64 / LETHAL_OBSTACLE as f64,
            None => 1.0,
        }
    }

    fn check_resolution(&self) -> f64 {
        self.resolution
    }

    fn segment_free(&self, a: Point2D, b: Point2D) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }
        // Walk in a fixed direction so that a -> b and b -> a agree
        if (a.x, a.y) <= (b.x, b.y) {
            self.line_of_sight(a, b)
        } else {
            self.line_of_sight(b, a)
        }
    }
}
