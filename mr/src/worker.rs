use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::naming::Layout;
use crate::partition::partition;
use crate::record::{write_record, KeyValue, RecordReader, StreamEnd};
use crate::task::{MapTask, ReduceTask, Task};

/// User map function: `(source name, content) -> records`.
pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;
/// User reduce function: `(key, values in arrival order) -> output value`.
pub type ReduceFn = fn(&str, &[String]) -> String;

// Worker runs single map or reduce tasks. It holds no per-task state, so one
// value can serve tasks on several threads at once.
pub struct Worker {
    layout: Layout,
    map_fn: MapFn,
    reduce_fn: ReduceFn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutput {
    /// Records returned by the map function, all of them written.
    pub records: usize,
    /// Bucket files this task wrote to, in bucket order.
    pub buckets: Vec<PathBuf>,
}

/// What one map task contributed to a reduce task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub map_task: usize,
    pub path: PathBuf,
    pub records: usize,
    /// `None` when the bucket file does not exist.
    pub end: Option<StreamEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceOutput {
    pub path: PathBuf,
    pub keys: usize,
    pub sources: Vec<SourceStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Map(MapOutput),
    Reduce(ReduceOutput),
}

/// Values of one reduce bucket grouped by key.
#[derive(Debug, Default)]
pub struct Grouped {
    /// Values per key, in map task order and then file order.
    pub table: HashMap<String, Vec<String>>,
    pub sources: Vec<SourceStats>,
}

impl std::fmt::Display for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Worker {{ dir: {} }}", self.layout.dir().display())
    }
}

impl Worker {
    pub fn new(map_fn: MapFn, reduce_fn: ReduceFn) -> Self {
        Worker::with_layout(Layout::default(), map_fn, reduce_fn)
    }

    pub fn with_layout(layout: Layout, map_fn: MapFn, reduce_fn: ReduceFn) -> Self {
        Worker {
            layout,
            map_fn,
            reduce_fn,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // 一次 map 任务
    pub fn do_map(&self, task: &MapTask) -> Result<MapOutput> {
        task.validate()?;
        info!(
            job = %task.job,
            task = task.index,
            input = %task.input.display(),
            "map task started"
        );

        let content = fs::read_to_string(&task.input).map_err(|source| Error::ReadInput {
            path: task.input.clone(),
            source,
        })?;
        let records = (self.map_fn)(&task.input.to_string_lossy(), &content);

        let mut writers = BucketWriters::new(&self.layout, &task.job, task.index);
        for record in &records {
            writers.write(partition(&record.key, task.n_reduce), record)?;
        }
        let buckets = writers.finish()?;

        info!(
            job = %task.job,
            task = task.index,
            records = records.len(),
            buckets = buckets.len(),
            "map task finished"
        );
        Ok(MapOutput {
            records: records.len(),
            buckets,
        })
    }

    /// Reads every bucket file addressed to `task.index` and groups the
    /// values by key. Missing bucket files contribute nothing.
    pub fn group_by_key(&self, task: &ReduceTask) -> Result<Grouped> {
        let mut grouped = Grouped::default();

        for map_task in 0..task.n_map {
            let path = self.layout.intermediate(&task.job, map_task, task.index);
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no bucket file, nothing to read");
                    grouped.sources.push(SourceStats {
                        map_task,
                        path,
                        records: 0,
                        end: None,
                    });
                    continue;
                }
                Err(source) => return Err(Error::OpenBucket { path, source }),
            };

            let mut reader = RecordReader::new(file);
            for record in reader.by_ref() {
                let record = record.map_err(|source| Error::ReadBucket {
                    path: path.clone(),
                    source,
                })?;
                grouped.table.entry(record.key).or_default().push(record.value);
            }

            let end = reader.end().cloned().unwrap_or(StreamEnd::Clean);
            if !end.is_clean() {
                warn!(
                    path = %path.display(),
                    ?end,
                    "bucket file ended early, rest of it ignored"
                );
            }
            grouped.sources.push(SourceStats {
                map_task,
                path,
                records: reader.records(),
                end: Some(end),
            });
        }

        Ok(grouped)
    }

    // 输入是此次 reduce 任务所需的所有中间文件（由 map 任务生成）
    pub fn do_reduce(&self, task: &ReduceTask) -> Result<ReduceOutput> {
        task.validate()?;
        info!(job = %task.job, task = task.index, n_map = task.n_map, "reduce task started");

        let Grouped { table, sources } = self.group_by_key(task)?;
        let groups = sorted_groups(table);

        create_parent(&task.output).map_err(|source| Error::CreateOutput {
            path: task.output.clone(),
            source,
        })?;
        let file = File::create(&task.output).map_err(|source| Error::CreateOutput {
            path: task.output.clone(),
            source,
        })?;

        let write_err = |source: io::Error| Error::WriteOutput {
            path: task.output.clone(),
            source,
        };
        let mut writer = BufWriter::new(file);
        for (key, values) in &groups {
            let value = (self.reduce_fn)(key, values);
            write_record(&mut writer, &KeyValue::new(key.as_str(), value))
                .map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;

        info!(
            job = %task.job,
            task = task.index,
            keys = groups.len(),
            output = %task.output.display(),
            "reduce task finished"
        );
        Ok(ReduceOutput {
            path: task.output.clone(),
            keys: groups.len(),
            sources,
        })
    }

    pub fn do_task(&self, task: &Task) -> Result<TaskOutput> {
        match task {
            Task::Map(task) => self.do_map(task).map(TaskOutput::Map),
            Task::Reduce(task) => self.do_reduce(task).map(TaskOutput::Reduce),
        }
    }
}

/// Key order of the table is arbitrary, so reduce output is emitted sorted by key.
fn sorted_groups(table: HashMap<String, Vec<String>>) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<_> = table.into_iter().collect();
    groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    groups
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Bucket files of one map task, opened on first use. Dropping it closes
/// every file, so an aborted task leaves no handle behind.
struct BucketWriters<'a> {
    layout: &'a Layout,
    job: &'a str,
    map_task: usize,
    open: BTreeMap<usize, (PathBuf, BufWriter<File>)>,
}

impl<'a> BucketWriters<'a> {
    fn new(layout: &'a Layout, job: &'a str, map_task: usize) -> Self {
        BucketWriters {
            layout,
            job,
            map_task,
            open: BTreeMap::new(),
        }
    }

    fn write(&mut self, bucket: usize, record: &KeyValue) -> Result<()> {
        let (path, writer) = match self.open.entry(bucket) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.layout.intermediate(self.job, self.map_task, bucket);
                let file = fs::create_dir_all(self.layout.dir())
                    .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
                    .map_err(|source| Error::CreateBucket {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), bucket, "opened bucket file");
                entry.insert((path, BufWriter::new(file)))
            }
        };

        write_record(writer, record).map_err(|source| Error::WriteBucket {
            path: path.clone(),
            source,
        })
    }

    /// Flushes and closes every bucket file, returning their paths.
    fn finish(self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.open.len());
        for (_, (path, writer)) in self.open {
            writer.into_inner().map_err(|e| Error::WriteBucket {
                path: path.clone(),
                source: e.into_error(),
            })?;
            paths.push(path);
        }
        Ok(paths)
    }
}
