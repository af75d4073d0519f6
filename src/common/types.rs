//! Common types used throughout sample_planner

use nalgebra::Vector2;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    /// Heading of the segment from `self` to `other`
    pub fn angle_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Point at `distance` from `self` along the direction of `toward`
    pub fn step_toward(&self, toward: &Point2D, distance: f64) -> Point2D {
        let theta = self.angle_to(toward);
        Point2D::new(self.x + distance * theta.cos(), self.y + distance * theta.sin())
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Normalize yaw to [-pi, pi]
    pub fn normalize_yaw(&mut self) {
        while self.yaw > std::f64::consts::PI {
            self.yaw -= 2.0 * std::f64::consts::PI;
        }
        while self.yaw < -std::f64::consts::PI {
            self.yaw += 2.0 * std::f64::consts::PI;
        }
    }
}

/// Axis-aligned rectangular domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Half-open containment: the max edges are outside
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min_x && p.x < self.max_x && p.y >= self.min_y && p.y < self.max_y
    }
}

/// Path represented as a sequence of 2D poses
#[derive(Debug, Clone)]
pub struct Path2D {
    pub poses: Vec<Pose2D>,
}

impl Path2D {
    /// Build from bare positions; each heading points along the next segment
    pub fn from_points(points: &[Point2D]) -> Self {
        let poses = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let yaw = match points.get(i + 1) {
                    Some(next) => p.angle_to(next),
                    None if i > 0 => points[i - 1].angle_to(p),
                    None => 0.0,
                };
                Pose2D::new(p.x, p.y, yaw)
            })
            .collect();
        Self { poses }
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn first(&self) -> Option<&Pose2D> {
        self.poses.first()
    }

    pub fn last(&self) -> Option<&Pose2D> {
        self.poses.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.y).collect()
    }

    pub fn total_length(&self) -> f64 {
        if self.poses.len() < 2 {
            return 0.0;
        }
        self.poses.windows(2)
            .map(|w| w[0].position().distance(&w[1].position()))
            .sum()
    }
}
