//! JSONL storage for tasks
//!
//! Tasks are stored in `.taskwerk/tasks.jsonl`. The first line is a header
//! carrying the ID high-water mark and store revision; every following line
//! is one task, in insertion order.
//!
//! ```text
//! {"format":1,"next_id":3,"revision":5}
//! {"id":"TASK-001","title":"Write spec","status":"done",...}
//! {"id":"TASK-002","title":"Review spec","status":"open",...}
//! ```
//!
//! Reads take a shared lock on the task file. A save holds an exclusive lock
//! on the current task file while it writes a temp file and renames it into
//! place, so a reader never sees a half-written file. Loads and saves from
//! different processes are not held together, so concurrent commands are
//! still last-writer-wins.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskStore};

const FORMAT_VERSION: u32 = 1;

/// First line of the task file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Header {
    format: u32,
    next_id: u64,
    revision: u64,
}

/// Task file in JSONL format
pub struct TaskFile {
    path: PathBuf,
}

impl TaskFile {
    /// Creates a task file handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default task file for a project data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("tasks.jsonl"))
    }

    /// Returns the path to the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store; a missing or empty file yields an empty store
    pub fn load(&self) -> Result<TaskStore> {
        if !self.path.exists() {
            return Ok(TaskStore::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task file: {}", self.path.display()))?;

        FileExt::lock_shared(&file).context("Failed to acquire read lock on task file")?;

        let reader = BufReader::new(&file);
        let mut header: Option<Header> = None;
        let mut tasks = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            if header.is_none() {
                let parsed: Header = serde_json::from_str(&line).with_context(|| {
                    format!("Failed to parse task file header at line {}", line_num + 1)
                })?;
                if parsed.format != FORMAT_VERSION {
                    anyhow::bail!(
                        "Unsupported task file format {} (expected {})",
                        parsed.format,
                        FORMAT_VERSION
                    );
                }
                header = Some(parsed);
                continue;
            }

            let task: Task = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;
            tasks.push(task);
        }

        let Some(header) = header else {
            return Ok(TaskStore::new());
        };

        TaskStore::from_parts(header.next_id, header.revision, tasks).map_err(|e| {
            anyhow::anyhow!("Task file {} is corrupted: {}", self.path.display(), e)
        })
    }

    /// Writes the whole store (full rewrite, atomic)
    pub fn save(&self, store: &TaskStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("jsonl.tmp");

        // Held until after the rename; readers of the current file wait for it
        let _target_lock = self.lock_existing()?;

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on temp file")?;

            let mut writer = BufWriter::new(&file);

            let header = Header {
                format: FORMAT_VERSION,
                next_id: store.next_id(),
                revision: store.revision(),
            };
            let line = serde_json::to_string(&header).context("Failed to serialize header")?;
            writeln!(writer, "{}", line).context("Failed to write header")?;

            for task in store.iter() {
                let line = serde_json::to_string(task).context("Failed to serialize task")?;
                writeln!(writer, "{}", line).context("Failed to write task")?;
            }

            writer.flush().context("Failed to flush task file")?;
            file.sync_all().context("Failed to sync task file")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Exclusively locks the current task file, if there is one
    ///
    /// The lock is released when the returned handle is dropped.
    fn lock_existing(&self) -> Result<Option<File>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task file: {}", self.path.display()))?;
        file.lock_exclusive()
            .context("Failed to acquire write lock on task file")?;

        Ok(Some(file))
    }
}
