//! Visualization utilities for sample_planner
//!
//! Plots are collected as layers and drawn onto a single gnuplot axes
//! when the figure is shown or saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D};
use crate::utils::CostGrid;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";
    pub const LIGHT_BLUE: &str = "#9EC5E8";
    pub const ORANGE: &str = "#FFA500";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const TREE: &str = LIGHT_BLUE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::PATH.to_string(),
            line_width: 2.0,
            caption: "Path".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
    /// Unconnected segments drawn in one color
    Segments { segments: Vec<(Point2D, Point2D)>, color: String },
}

/// Main visualizer struct
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set X axis range
    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    /// Set Y axis range
    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Number of layers queued for drawing
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Plot a path
    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.layers.push(Layer::Lines {
            x: path.x_coords(),
            y: path.y_coords(),
            style: style.clone(),
        });
        self
    }

    /// Plot tree edges as (parent, child) segments
    pub fn plot_edges(&mut self, edges: &[(Point2D, Point2D)]) -> &mut Self {
        if !edges.is_empty() {
            self.layers.push(Layer::Segments {
                segments: edges.to_vec(),
                color: colors::TREE.to_string(),
            });
        }
        self
    }

    /// Plot the occupied cells of a cost grid
    pub fn plot_grid(&mut self, grid: &CostGrid) -> &mut Self {
        let cells = grid.occupied_cells();
        let style = PointStyle::new(colors::OBSTACLE, "Obstacles").with_symbol('S').with_size(0.3);
        self.plot_points(&cells, &style);
        self.set_x_range(grid.min_x, grid.max_x);
        self.set_y_range(grid.min_y, grid.max_y)
    }

    /// Plot a single point (start, goal, etc.)
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.plot_points(&[point], style)
    }

    /// Plot multiple points
    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.layers.push(Layer::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    /// Plot start position
    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    /// Plot goal position
    pub fn plot_goal(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> PlannerResult<()> {
        let mut figure = self.render();
        figure
            .show()
            .map(|_| ())
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        let mut figure = self.render();
        figure
            .save_to_png(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, style } => {
                    axes.lines(x, y, &[
                        Caption(style.caption.as_str()),
                        Color(style.color.as_str().into()),
                        LineWidth(style.line_width),
                    ]);
                }
                Layer::Points { x, y, style } => {
                    axes.points(x, y, &[
                        Caption(style.caption.as_str()),
                        Color(style.color.as_str().into()),
                        PointSymbol(style.symbol),
                        PointSize(style.size),
                    ]);
                }
                Layer::Segments { segments, color } => {
                    for (a, b) in segments {
                        axes.lines(&[a.x, b.x], &[a.y, b.y], &[Color(color.as_str().into())]);
                    }
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
