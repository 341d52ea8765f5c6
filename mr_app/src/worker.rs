use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mr::merge::merge;
use mr::{KeyValue, Layout, MapTask, ReduceTask, Task, TaskOutput, Worker};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Runs one word-count map, reduce or merge step. Meant to be launched by an
/// external scheduler that owns task assignment and retries.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory for bucket files and reduce results
    #[arg(long, global = true, default_value = mr::naming::INTERMEDIATE_FOLDER)]
    dir: PathBuf,

    /// Increase log verbosity (-v, -vv). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map one input file into bucket files
    Map {
        #[arg(long)]
        job: String,
        #[arg(long)]
        task: usize,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        n_reduce: usize,
    },
    /// Reduce one bucket from the output of every map task
    Reduce {
        #[arg(long)]
        job: String,
        #[arg(long)]
        task: usize,
        #[arg(long)]
        n_map: usize,
        /// Output file, defaults to the job's result file in --dir
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge the results of every reduce task
    Merge {
        #[arg(long)]
        job: String,
        #[arg(long)]
        n_reduce: usize,
    },
}

fn map_function(_key: &str, value: &str) -> Vec<KeyValue> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| KeyValue::new(word, "1"))
        .collect()
}

fn reduce_function(key: &str, values: &[String]) -> String {
    let mut count: u64 = 0;
    for item in values {
        match item.parse::<u64>() {
            Ok(n) => count += n,
            Err(e) => warn!(key, value = %item, error = %e, "skipping non-numeric count"),
        }
    }
    count.to_string()
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "parsed arguments");

    let layout = Layout::new(&args.dir);
    let task = match args.command {
        Command::Map {
            job,
            task,
            input,
            n_reduce,
        } => Task::Map(MapTask::new(job, task, input, n_reduce)),
        Command::Reduce {
            job,
            task,
            n_map,
            output,
        } => {
            let output = output.unwrap_or_else(|| layout.result(&job, task));
            Task::Reduce(ReduceTask::new(job, task, output, n_map))
        }
        Command::Merge { job, n_reduce } => {
            let output = merge(&layout, &job, n_reduce)
                .with_context(|| format!("merging results of job {}", job))?;
            println!("{}", output.display());
            return Ok(());
        }
    };

    let worker = Worker::with_layout(layout, map_function, reduce_function);
    info!(
        "{} running {:?} task {} of job {}",
        worker,
        task.task_type(),
        task.index(),
        task.job()
    );
    let output = worker.do_task(&task).with_context(|| {
        format!(
            "{:?} task {} of job {} failed",
            task.task_type(),
            task.index(),
            task.job()
        )
    })?;

    match output {
        TaskOutput::Map(output) => {
            for bucket in output.buckets {
                println!("{}", bucket.display());
            }
        }
        TaskOutput::Reduce(output) => println!("{}", output.path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_function_splits_on_punctuation() {
        let records = map_function("in.txt", "Hello, world! hello");
        let words: Vec<&str> = records.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(words, vec!["Hello", "world", "hello"]);
        assert!(records.iter().all(|kv| kv.value == "1"));
    }

    #[test]
    fn test_reduce_function_sums() {
        let values = vec!["1".to_string(), "1".to_string(), "3".to_string()];
        assert_eq!(reduce_function("a", &values), "5");
        assert_eq!(reduce_function("a", &[]), "0");
    }

    #[test]
    fn test_reduce_function_skips_corrupt_counts() {
        let values = vec!["2".to_string(), "x".to_string(), "-1".to_string(), "3".to_string()];
        assert_eq!(reduce_function("a", &values), "5");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "worker", "--dir", "/tmp/mr", "-vv", "map", "--job", "wc", "--task", "1", "--input",
            "a.txt", "--n-reduce", "3",
        ])
        .unwrap();
        assert_eq!(args.dir, PathBuf::from("/tmp/mr"));
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Map { task: 1, n_reduce: 3, .. }));

        let args = Args::try_parse_from([
            "worker", "reduce", "--job", "wc", "--task", "0", "--n-map", "2",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Reduce { output: None, n_map: 2, .. }));
    }
}
