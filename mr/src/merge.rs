//! Combines the outputs of every reduce task of a job into one file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::naming::Layout;
use crate::record::RecordReader;

/// Merges `Layout::result(job, r)` for `r` in `0..n_reduce` into
/// `Layout::merged(job)`, sorted by key. Returns the merged file's path.
pub fn merge(layout: &Layout, job: &str, n_reduce: usize) -> Result<PathBuf> {
    let inputs: Vec<PathBuf> = (0..n_reduce).map(|r| layout.result(job, r)).collect();
    let output = layout.merged(job);
    merge_files(&inputs, &output)?;
    Ok(output)
}

/// Writes every record of `inputs` to `output` as `key: value` lines sorted
/// by key. Returns the number of lines written. Every input must exist.
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    let mut merged = BTreeMap::new();

    for path in inputs {
        let file = File::open(path).map_err(|source| Error::ReadResult {
            path: path.clone(),
            source,
        })?;
        let mut reader = RecordReader::new(file);
        for record in reader.by_ref() {
            let record = record.map_err(|source| Error::ReadResult {
                path: path.clone(),
                source,
            })?;
            merged.insert(record.key, record.value);
        }
        if let Some(end) = reader.end().filter(|end| !end.is_clean()) {
            warn!(path = %path.display(), ?end, "reduce output ended early");
        }
    }

    let write_err = |source: io::Error| Error::WriteOutput {
        path: output.to_path_buf(),
        source,
    };
    let file = File::create(output).map_err(|source| Error::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for (key, value) in &merged {
        writeln!(writer, "{}: {}", key, value).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(
        output = %output.display(),
        inputs = inputs.len(),
        keys = merged.len(),
        "merged results"
    );
    Ok(merged.len())
}
