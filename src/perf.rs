use serde::Serialize;

/// One line of the benchmark log: a single timed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub thread_count: u32,
    pub work_count: u32,
    pub duration_ns: u64,
}

/// The mean of one batch of repeated trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub thread_count: u32,
    pub work_count: u32,
    pub mean_duration_ns: f64,
}

impl Measurement {
    pub fn new(thread_count: u32, work_count: u32, duration_ns: u64) -> Self {
        Self {
            thread_count,
            work_count,
            duration_ns,
        }
    }

    pub fn same_config(&self, other: &Measurement) -> bool {
        self.thread_count == other.thread_count && self.work_count == other.work_count
    }
}
