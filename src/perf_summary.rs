use std::path::Path;

use csv::Writer;
use thousands::Separable;

use crate::error::Error;
use crate::perf::AggregatedPoint;

pub fn print_summary(points: &[AggregatedPoint]) {
    println!("{:>8} {:>8} {:>16}", "threads", "work", "mean ns");
    for p in points {
        println!(
            "{:>8} {:>8} {:>16}",
            p.thread_count,
            p.work_count.separate_with_commas(),
            (p.mean_duration_ns.round() as u64).separate_with_commas()
        );
    }
}

/// Writes one CSV row per point, with a `thread_count,work_count,mean_duration_ns` header.
pub fn write_summary(path: &Path, points: &[AggregatedPoint]) -> Result<(), Error> {
    let summary_error = |source| Error::Summary {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = Writer::from_path(path).map_err(summary_error)?;
    for point in points {
        writer.serialize(point).map_err(summary_error)?;
    }
    writer
        .flush()
        .map_err(|e| summary_error(csv::Error::from(e)))?;

    Ok(())
}
