//! Task storage behind a small trait.
//!
//! The controller only ever does whole-sheet load/save cycles, so a backend
//! needs nothing more than `load_all` and `save_all`. Both must be atomic
//! from the caller's point of view.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::task::Task;

pub trait TaskStore {
    /// All tasks in insertion order.
    fn load_all(&self) -> Result<Vec<Task>, StoreError>;

    /// Replace the stored sheet with `tasks`.
    fn save_all(&mut self, tasks: &[Task]) -> Result<(), StoreError>;
}

/// In-memory sheet. `failing_saves` makes every save error out, which lets
/// callers check that nothing is reported as committed on a failed write.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tasks: Vec<Task>,
    failing_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            failing_saves: false,
        }
    }

    pub fn set_failing_saves(&mut self, failing: bool) {
        self.failing_saves = failing;
    }
}

impl TaskStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.clone())
    }

    fn save_all(&mut self, tasks: &[Task]) -> Result<(), StoreError> {
        if self.failing_saves {
            return Err(StoreError::Io(std::io::Error::other("memory store rejects writes")));
        }
        self.tasks = tasks.to_vec();
        Ok(())
    }
}

/// One CSV file holding the whole sheet, one row per task.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStore for CsvStore {
    fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task sheet yet");
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut tasks = Vec::new();
        for row in rdr.deserialize() {
            let task: Task = row?;
            tasks.push(task);
        }

        let mut seen = std::collections::HashSet::new();
        for t in &tasks {
            if !seen.insert(t.id.as_str()) {
                return Err(StoreError::Corrupt(format!("duplicate task id {}", t.id)));
            }
        }

        debug!(path = %self.path.display(), count = tasks.len(), "loaded task sheet");
        Ok(tasks)
    }

    /// Writes to a uniquely named temp file next to the sheet, then renames
    /// it over the sheet. Concurrent processes never share a temp file, but
    /// the last rename wins: only a single `Tracker` serializes whole
    /// load/modify/save cycles.
    fn save_all(&mut self, tasks: &[Task]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent
            }
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
            for t in tasks {
                wtr.serialize(t)?;
            }
            wtr.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), count = tasks.len(), "saved task sheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample() -> Vec<Task> {
        let ws = NaiveDate::from_ymd_opt(2026, 10, 11).unwrap();
        let deadline = Utc.with_ymd_and_hms(2026, 10, 17, 18, 29, 0).unwrap();
        let mut done = Task::new("2026-10-11-002", ws, ws, "[BONUS] Clean garage", deadline).with_xp(75);
        done.status = TaskStatus::Completed;
        done.date_completed = Some(Utc.with_ymd_and_hms(2026, 10, 12, 9, 0, 0).unwrap());
        done.token_earned = 1;
        vec![
            Task::new("2026-10-11-001", ws, ws, "Write report, with commas", deadline)
                .with_priority(Priority::High)
                .with_xp(42),
            done,
        ]
    }

    #[test]
    fn missing_file_is_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("tasks.csv"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn csv_store_keeps_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let mut store = CsvStore::new(nested.join("tasks.csv"));
        let tasks = sample();
        store.save_all(&tasks).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, tasks);
        let names: Vec<_> = fs::read_dir(&nested)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("tasks.csv")]);
    }

    #[test]
    fn separate_handles_on_one_sheet_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.csv");
        let mut first = CsvStore::new(&path);
        let mut second = CsvStore::new(&path);
        let tasks = sample();

        first.save_all(&tasks).unwrap();
        second.save_all(&tasks[..1]).unwrap();
        first.save_all(&tasks[1..]).unwrap();

        assert_eq!(second.load_all().unwrap(), tasks[1..].to_vec());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn duplicate_ids_are_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("tasks.csv"));
        let mut tasks = sample();
        tasks[1].id = tasks[0].id.clone();
        store.save_all(&tasks).unwrap();
        assert!(matches!(store.load_all(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn memory_store_can_refuse_writes() {
        let mut store = MemoryStore::new();
        store.set_failing_saves(true);
        assert!(store.save_all(&sample()).is_err());
        assert!(store.load_all().unwrap().is_empty());
    }
}
