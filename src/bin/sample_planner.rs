// Sampling-based path planning demo
//
// Plans across a walled 30 x 30 m cost grid, writes the explored tree as
// CSV through an exploration observer and renders the result with gnuplot.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use log::{error, info, warn};

use sample_planner::common::{Bounds, ExplorationObserver, Point2D, Pose2D, Visualizable};
use sample_planner::path_planning::sample_planner::{ExplorationSnapshot, SamplePlanner, SamplePlannerConfig};
use sample_planner::utils::{CostGrid, Visualizer};
use sample_planner::PlannerResult;

const OUTPUT_DIR: &str = "img/path_planning";

/// Dumps every exploration snapshot to a CSV file
struct CsvExporter {
    path: PathBuf,
}

impl ExplorationObserver for CsvExporter {
    fn on_exploration(&self, snapshot: &ExplorationSnapshot) {
        let written = File::create(&self.path)
            .map_err(Into::into)
            .and_then(|f| snapshot.write_csv(BufWriter::new(f)));
        match written {
            Ok(()) => info!("Exploration tree ({} nodes) written to {}", snapshot.len(), self.path.display()),
            Err(e) => warn!("Could not write {}: {}", self.path.display(), e),
        }
    }
}

fn build_map() -> PlannerResult<CostGrid> {
    let mut grid = CostGrid::new(Bounds::new(0.0, 0.0, 30.0, 30.0), 0.1)?;
    grid.add_rectangle(Point2D::new(8.0, 0.0), Point2D::new(9.0, 20.0));
    grid.add_rectangle(Point2D::new(16.0, 10.0), Point2D::new(17.0, 30.0));
    grid.add_rectangle(Point2D::new(22.0, 0.0), Point2D::new(23.0, 18.0));
    grid.add_circle(Point2D::new(12.5, 24.0), 2.0);
    grid.add_circle(Point2D::new(19.5, 5.0), 1.5);
    Ok(grid)
}

fn run() -> PlannerResult<()> {
    fs::create_dir_all(OUTPUT_DIR)?;

    let config = SamplePlannerConfig {
        sample_points: 4000,
        sample_max_d: 1.0,
        opt_r: 2.5,
        rewire_threads_n: 4,
        is_outline: true,
        factor: 0.3,
        is_expand: true,
        ..Default::default()
    };
    let start = Pose2D::new(3.0, 3.0, 0.0);
    let goal = Pose2D::new(27.0, 27.0, std::f64::consts::FRAC_PI_2);

    let planner = SamplePlanner::from_grid(build_map()?, config)?.with_observer(Box::new(CsvExporter {
        path: PathBuf::from(OUTPUT_DIR).join("sample_planner_tree.csv"),
    }));

    info!("Sample planner start!!");
    let report = planner.plan_detailed(start, goal, 0.5);
    info!(
        "{} iterations in {:.3}s, {} nodes explored",
        report.iterations,
        report.elapsed.as_secs_f64(),
        report.exploration.len()
    );

    let mut vis = Visualizer::new();
    vis.set_title("Sample Planner (RRT* with informed sampling)");
    vis.plot_grid(planner.space());
    report.exploration.visualize(&mut vis);

    match &report.result {
        Ok(path) => {
            info!("Path found: {} poses, length {:.3} m", path.len(), path.total_length());
            path.visualize(&mut vis);
        }
        Err(e) => warn!("{}", e),
    }
    vis.plot_start(start.position()).plot_goal(goal.position());

    let output = format!("{}/sample_planner_result.png", OUTPUT_DIR);
    vis.save_png(&output, 800, 800)?;
    info!("Plot saved to: {}", output);

    report.result.map(|_| ())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
