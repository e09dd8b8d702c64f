use std::error::Error;
use std::path::Path;

use log::debug;
use plotters::prelude::*;
use thousands::Separable;

use crate::perf::AggregatedPoint;

const FONT: &str = "sans-serif";
const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 800;
const POINT_SIZE: u32 = 4;

pub const THREAD_AXIS_LABEL: &str = "Thread count";
pub const WORK_AXIS_LABEL: &str = "Work count";
pub const TIME_AXIS_LABEL: &str = "Time (nanoseconds)";

/// Fixed axis ranges of the scatter plot, each `(min, max)` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    pub threads: (f64, f64),
    pub work: (f64, f64),
    pub duration_ns: (f64, f64),
}

pub const PLOT_BOUNDS: PlotBounds = PlotBounds {
    threads: (1.0, 12.0),
    work: (1000.0, 2000.0),
    duration_ns: (0.0, 150_000_000.0),
};

fn within((min, max): (f64, f64), v: f64) -> bool {
    min <= v && v <= max
}

impl PlotBounds {
    pub fn contains(&self, point: &AggregatedPoint) -> bool {
        within(self.threads, f64::from(point.thread_count))
            && within(self.work, f64::from(point.work_count))
            && within(self.duration_ns, point.mean_duration_ns)
    }
}

fn mid((min, max): (f64, f64)) -> f64 {
    (min + max) / 2.0
}

/// Draws the points as a 3D scatter into an SVG at `path`. Thread and work count
/// span the floor, time is vertical. Points outside `bounds` are skipped.
/// Returns how many points were drawn.
pub fn write_plot(
    points: &[AggregatedPoint],
    bounds: &PlotBounds,
    caption: &str,
    path: &Path,
) -> Result<usize, Box<dyn Error>> {
    let resolution = (PLOT_WIDTH, PLOT_HEIGHT);
    let root = SVGBackend::new(path, resolution).into_drawing_area();

    root.fill(&WHITE)?;

    let (x_min, x_max) = bounds.threads;
    let (y_min, y_max) = bounds.duration_ns;
    let (z_min, z_max) = bounds.work;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(caption, (FONT, 20))
        .build_cartesian_3d(x_min..x_max, y_min..y_max, z_min..z_max)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.3;
        pb.scale = 0.8;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.15))
        .max_light_lines(3)
        .label_style((FONT, 12))
        .x_formatter(&|v: &f64| format!("{:.0}", v))
        .y_formatter(&|v: &f64| (*v as u64).separate_with_commas())
        .z_formatter(&|v: &f64| format!("{:.0}", v))
        .draw()?;

    let label_style = (FONT, 15);
    chart.draw_series([
        Text::new(THREAD_AXIS_LABEL, (mid(bounds.threads), y_min, z_min), label_style),
        Text::new(WORK_AXIS_LABEL, (x_max, y_min, mid(bounds.work)), label_style),
        Text::new(TIME_AXIS_LABEL, (x_min, y_max, z_min), label_style),
    ])?;

    let visible: Vec<&AggregatedPoint> = points.iter().filter(|p| bounds.contains(p)).collect();
    if visible.len() < points.len() {
        debug!(
            "{} of {} points fall outside the plot bounds",
            points.len() - visible.len(),
            points.len()
        );
    }

    chart.draw_series(visible.iter().enumerate().map(|(i, p)| {
        Circle::new(
            (
                f64::from(p.thread_count),
                p.mean_duration_ns,
                f64::from(p.work_count),
            ),
            POINT_SIZE,
            Palette99::pick(i).filled(),
        )
    }))?;

    root.present()?;

    Ok(visible.len())
}
