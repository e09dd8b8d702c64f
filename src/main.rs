use log::{error, info};
use perf_plot::PLOT_BOUNDS;
use perf_trials::TrialPolicy;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;
use thousands::Separable;

mod error;
mod perf;
mod perf_log;
mod perf_plot;
mod perf_summary;
mod perf_trials;

/// Plots benchmark timings against thread count and work count.
///
/// Each input line is `threads,work,duration_ns`; every three consecutive lines
/// are trials of one configuration and are averaged into a single point.
#[derive(Debug, StructOpt)]
#[structopt(name = "scaling-plot")]
struct Opt {
    /// Measurement log to read, or `-` for stdin
    #[structopt(parse(from_os_str), default_value = "./multithreading analysis/data.csv")]
    input: PathBuf,

    /// Where to write the SVG scatter plot
    #[structopt(short, long, parse(from_os_str), default_value = "graph.svg")]
    output: PathBuf,

    /// Also write the averaged points to this CSV file
    #[structopt(long, parse(from_os_str))]
    summary: Option<PathBuf>,

    /// Fail on a short trailing batch or a batch that mixes configurations
    #[structopt(long)]
    strict: bool,

    /// Chart caption
    #[structopt(long, default_value = "Execution time by thread and work count")]
    caption: String,

    /// Log debug output
    #[structopt(short, long)]
    verbose: bool,
}

fn run(opt: &Opt) -> Result<(), Box<dyn Error>> {
    let policy = if opt.strict {
        TrialPolicy::strict()
    } else {
        TrialPolicy::default()
    };

    let measurements = if opt.input.as_os_str() == "-" {
        perf_log::read_stdin()?
    } else {
        perf_log::read_measurements(&opt.input)?
    };
    info!(
        "parsed {} measurements from {}",
        measurements.len().separate_with_commas(),
        opt.input.display()
    );

    let aggregation = perf_trials::aggregate(&measurements, policy)?;
    info!(
        "{} points from batches of {} ({} trailing records dropped)",
        aggregation.points.len(),
        perf_trials::TRIALS_PER_BATCH,
        aggregation.dropped
    );

    perf_summary::print_summary(&aggregation.points);

    if let Some(summary) = &opt.summary {
        perf_summary::write_summary(summary, &aggregation.points)?;
        println!("summary written to {}", summary.display());
    }

    let drawn = perf_plot::write_plot(&aggregation.points, &PLOT_BOUNDS, &opt.caption, &opt.output)?;
    println!(
        "plot written to {} ({} of {} points visible)",
        opt.output.display(),
        drawn,
        aggregation.points.len()
    );

    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    let log_level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(&opt) {
        error!("{}", e);
        process::exit(1);
    }
}
