use std::path::{Path, PathBuf};

/// Default directory for intermediate and result files.
pub const INTERMEDIATE_FOLDER: &str = "./intermediate";

/// Where a job's files live. Map and reduce sides must use the same layout:
/// they never talk to each other and only meet through these paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    dir: PathBuf,
}

impl Layout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Layout { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bucket file written by map task `map_task` for reduce task `reduce_task`.
    pub fn intermediate(&self, job: &str, map_task: usize, reduce_task: usize) -> PathBuf {
        self.dir
            .join(format!("mrtmp.{}-{}-{}", job, map_task, reduce_task))
    }

    /// Default output of reduce task `reduce_task`.
    pub fn result(&self, job: &str, reduce_task: usize) -> PathBuf {
        self.dir.join(format!("mrtmp.{}-res-{}", job, reduce_task))
    }

    /// Merged output of the whole job.
    pub fn merged(&self, job: &str) -> PathBuf {
        self.dir.join(format!("mrtmp.{}", job))
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new(INTERMEDIATE_FOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_intermediate_name() {
        let layout = Layout::new("/tmp/mr");
        assert_eq!(
            layout.intermediate("wc", 3, 1),
            PathBuf::from("/tmp/mr/mrtmp.wc-3-1")
        );
        assert_eq!(layout.result("wc", 1), PathBuf::from("/tmp/mr/mrtmp.wc-res-1"));
        assert_eq!(layout.merged("wc"), PathBuf::from("/tmp/mr/mrtmp.wc"));
    }

    #[test]
    fn test_intermediate_names_are_unique() {
        let layout = Layout::default();
        let mut seen = HashSet::new();
        for map_task in 0..20 {
            for reduce_task in 0..20 {
                assert!(seen.insert(layout.intermediate("job", map_task, reduce_task)));
            }
        }
        for reduce_task in 0..20 {
            assert!(seen.insert(layout.result("job", reduce_task)));
        }
        assert!(seen.insert(layout.merged("job")));
    }
}
