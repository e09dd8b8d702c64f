use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed record on line {line} ({reason}): {content:?}")]
    MalformedRecord {
        line: u64,
        content: String,
        reason: String,
    },

    #[error("{remaining} trailing record(s) do not fill a batch of {batch_size}")]
    IncompleteTrailingBatch { remaining: usize, batch_size: usize },

    #[error("batch {batch} mixes configurations: ({expected_threads}, {expected_work}) and ({found_threads}, {found_work})")]
    MixedBatch {
        batch: usize,
        expected_threads: u32,
        expected_work: u32,
        found_threads: u32,
        found_work: u32,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write summary {}: {source}", path.display())]
    Summary {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
