//! Per-task execution for map/reduce jobs.
//!
//! A map task turns one input file into records and spreads them over
//! `n_reduce` bucket files; a reduce task reads its bucket from every map task,
//! groups the values by key and writes one output file. The two sides never
//! communicate: they agree through [`partition`] and the file [`Layout`].

pub mod error;
pub mod merge;
pub mod naming;
pub mod partition;
pub mod record;
pub mod task;
pub mod worker;

pub use error::{Error, Result};
pub use naming::Layout;
pub use partition::{ihash, partition};
pub use record::{KeyValue, RecordReader, StreamEnd};
pub use task::{MapTask, ReduceTask, Task, TaskType};
pub use worker::{
    Grouped, MapFn, MapOutput, ReduceFn, ReduceOutput, SourceStats, TaskOutput, Worker,
};
