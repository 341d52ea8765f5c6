use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a task attempt. The caller decides whether to re-run it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("failed to read input {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open bucket file {} for writing: {source}", path.display())]
    CreateBucket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write bucket file {}: {source}", path.display())]
    WriteBucket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open bucket file {}: {source}", path.display())]
    OpenBucket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read bucket file {}: {source}", path.display())]
    ReadBucket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read reduce result {}: {source}", path.display())]
    ReadResult {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
