use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Map,
    Reduce,
}

/// One input partition to be mapped into `n_reduce` buckets.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct MapTask {
    pub job: String,
    pub index: usize,
    pub input: PathBuf,
    pub n_reduce: usize,
}

/// One bucket to be reduced from the output of `n_map` map tasks.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ReduceTask {
    pub job: String,
    pub index: usize,
    pub output: PathBuf,
    pub n_map: usize,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub enum Task {
    Map(MapTask),
    Reduce(ReduceTask),
}

impl MapTask {
    pub fn new(
        job: impl Into<String>,
        index: usize,
        input: impl Into<PathBuf>,
        n_reduce: usize,
    ) -> Self {
        MapTask {
            job: job.into(),
            index,
            input: input.into(),
            n_reduce,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_job(&self.job)?;
        if self.n_reduce == 0 {
            return Err(Error::InvalidTask(format!(
                "map task {} of job {} has no reduce buckets",
                self.index, self.job
            )));
        }
        Ok(())
    }
}

impl ReduceTask {
    pub fn new(
        job: impl Into<String>,
        index: usize,
        output: impl Into<PathBuf>,
        n_map: usize,
    ) -> Self {
        ReduceTask {
            job: job.into(),
            index,
            output: output.into(),
            n_map,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_job(&self.job)?;
        if self.n_map == 0 {
            return Err(Error::InvalidTask(format!(
                "reduce task {} of job {} has no map tasks to read from",
                self.index, self.job
            )));
        }
        Ok(())
    }
}

impl Task {
    pub fn task_type(&self) -> TaskType {
        match self {
            Task::Map(_) => TaskType::Map,
            Task::Reduce(_) => TaskType::Reduce,
        }
    }

    pub fn job(&self) -> &str {
        match self {
            Task::Map(task) => &task.job,
            Task::Reduce(task) => &task.job,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Task::Map(task) => task.index,
            Task::Reduce(task) => task.index,
        }
    }
}

fn validate_job(job: &str) -> Result<()> {
    if job.is_empty() {
        return Err(Error::InvalidTask("job name is empty".to_string()));
    }
    if job.contains(['/', '\\']) {
        return Err(Error::InvalidTask(format!(
            "job name {:?} contains a path separator",
            job
        )));
    }
    Ok(())
}
