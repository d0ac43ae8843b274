//! Map-only job runner.
//!
//! A generator's input is split into contiguous ranges, one tokio task per
//! non-empty range. Each task owns its RNG and, when the generator needs
//! one, its own source connection, and writes exactly one partition file.
//! There is no reduce phase and no state shared between tasks.
//!
//! Output layout under a table directory:
//! - `part-m-00000`, `part-m-00001`, ... in split order
//! - `_SUCCESS`, written once every task has finished

use async_trait::async_trait;
use chrono::NaiveDate;
use etl_core::{Error, Result, StorageLayout, Table, WarehouseRecord};
use mysql_store::{SourceConnection, SourceStore};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::JobConfig;

/// Marker written after a successful job.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Name of the partition file written by map task `index`.
pub fn partition_name(index: usize) -> String {
    format!("part-m-{:05}", index)
}

/// Files starting with `_` or `.` are markers or hidden and never data.
pub fn is_data_file(name: &str) -> bool {
    !(name.starts_with('_') || name.starts_with('.'))
}

/// Lists data files under a table directory in name order.
///
/// A missing directory yields an empty list.
pub async fn list_partitions(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if is_data_file(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// How a generator uses the source database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAccess {
    /// Fully synthetic, never connects.
    None,
    /// Reads its input once before the split.
    Input,
    /// Reads its input and queries again from every map task.
    InputAndTasks,
}

impl SourceAccess {
    fn for_input(self) -> bool {
        self != SourceAccess::None
    }

    fn for_tasks(self) -> bool {
        self == SourceAccess::InputAndTasks
    }
}

/// Per-task state handed to a generator.
pub struct MapContext {
    task_id: usize,
    today: NaiveDate,
    rng: SmallRng,
    source: Option<Box<dyn SourceConnection>>,
    seen: HashSet<String>,
}

impl MapContext {
    pub fn new(
        task_id: usize,
        today: NaiveDate,
        rng: SmallRng,
        source: Option<Box<dyn SourceConnection>>,
    ) -> Self {
        Self {
            task_id,
            today,
            rng,
            source,
            seen: HashSet::new(),
        }
    }

    /// A context with no source connection, seeded deterministically.
    pub fn synthetic(task_id: usize, today: NaiveDate, seed: u64) -> Self {
        Self::new(task_id, today, SmallRng::seed_from_u64(seed), None)
    }

    pub fn task_id(&self) -> usize {
        self.task_id
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// True the first time this task sees `key`. Used to log a warning
    /// once per distinct value.
    pub fn first_sighting(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    /// The task's source connection.
    pub fn source(&mut self) -> Result<&mut Box<dyn SourceConnection>> {
        let task_id = self.task_id;
        self.source
            .as_mut()
            .ok_or_else(|| Error::internal(format!("map task {} has no source connection", task_id)))
    }
}

/// A map-only transform producing the rows of one warehouse table.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    type Input: Send + 'static;
    type Record: WarehouseRecord + Send + 'static;

    /// Step name used in logs and run reports.
    fn name(&self) -> &'static str;

    fn source_access(&self) -> SourceAccess;

    /// Reads or synthesizes the full input before it is split.
    async fn read_input(&self, ctx: &mut MapContext) -> Result<Vec<Self::Input>>;

    /// Maps one input to zero or more records.
    async fn map(&self, input: Self::Input, ctx: &mut MapContext) -> Result<Vec<Self::Record>>;

    fn table(&self) -> Table {
        Self::Record::TABLE
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub table: Table,
    pub records: u64,
    pub partitions: usize,
    pub elapsed: Duration,
}

/// Splits `items` into at most `parts` contiguous, non-empty ranges,
/// preserving order. Earlier ranges take the remainder.
pub fn split_contiguous<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let parts = parts.max(1);
    let total = items.len();
    let base = total / parts;
    let extra = total % parts;

    let mut splits = Vec::with_capacity(parts.min(total));
    let mut iter = items.into_iter();
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        if size == 0 {
            break;
        }
        splits.push(iter.by_ref().take(size).collect());
    }
    splits
}

/// Runs generators as partitioned map-only jobs.
#[derive(Clone)]
pub struct JobRunner {
    config: JobConfig,
    layout: StorageLayout,
    source: Arc<dyn SourceStore>,
}

impl JobRunner {
    pub fn new(config: JobConfig, layout: StorageLayout, source: Arc<dyn SourceStore>) -> Self {
        Self {
            config,
            layout,
            source,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn rng_for(&self, task_id: usize) -> SmallRng {
        match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(task_id as u64)),
            None => SmallRng::from_rng(&mut rand::rng()),
        }
    }

    async fn prepare_output(&self, dir: &Path) -> Result<()> {
        if tokio::fs::try_exists(dir).await? {
            if !self.config.overwrite_output {
                return Err(Error::configuration(format!(
                    "output directory {} already exists",
                    dir.display()
                )));
            }
            tokio::fs::remove_dir_all(dir).await?;
        }
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    /// Runs one generator end to end.
    pub async fn run<G: Generator>(&self, generator: Arc<G>) -> Result<JobReport> {
        let start = Instant::now();
        let table = generator.table();
        let dir = self.layout.table_dir(table);
        let today = self.config.today();
        let access = generator.source_access();

        self.prepare_output(&dir).await?;

        let inputs = {
            let source = if access.for_input() {
                Some(self.source.connect().await?)
            } else {
                None
            };
            let mut ctx = MapContext::new(0, today, self.rng_for(0), source);
            generator.read_input(&mut ctx).await?
        };

        let input_count = inputs.len();
        let splits = split_contiguous(inputs, self.config.map_tasks);
        info!(
            table = %table,
            inputs = input_count,
            tasks = splits.len(),
            "Starting map job"
        );

        let mut handles: Vec<JoinHandle<Result<u64>>> = Vec::with_capacity(splits.len());
        for (task_id, split) in splits.into_iter().enumerate() {
            let generator = generator.clone();
            let source = access.for_tasks().then(|| self.source.clone());
            let rng = self.rng_for(task_id);
            let path = dir.join(partition_name(task_id));
            handles.push(tokio::spawn(async move {
                metrics().map_tasks_started.inc();
                metrics().active_map_tasks.inc();
                let result = run_task(generator, task_id, split, source, rng, today, &path).await;
                metrics().active_map_tasks.dec();
                result
            }));
        }

        let partitions = handles.len();
        let mut records = 0u64;
        let mut first_error = None;
        for (task_id, handle) in handles.into_iter().enumerate() {
            let outcome = handle
                .await
                .map_err(|e| Error::internal(format!("map task {} panicked: {}", task_id, e)))
                .and_then(|r| r);
            match outcome {
                Ok(count) => records += count,
                Err(e) => {
                    metrics().map_tasks_failed.inc();
                    error!(table = %table, task = task_id, error = %e, "Map task failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        tokio::fs::write(dir.join(SUCCESS_MARKER), b"").await?;

        let report = JobReport {
            table,
            records,
            partitions,
            elapsed: start.elapsed(),
        };
        info!(
            table = %table,
            records = report.records,
            partitions = report.partitions,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Map job complete"
        );
        Ok(report)
    }
}

async fn run_task<G: Generator>(
    generator: Arc<G>,
    task_id: usize,
    split: Vec<G::Input>,
    source: Option<Arc<dyn SourceStore>>,
    rng: SmallRng,
    today: NaiveDate,
    path: &Path,
) -> Result<u64> {
    let conn = match source {
        Some(store) => Some(store.connect().await?),
        None => None,
    };
    let mut ctx = MapContext::new(task_id, today, rng, conn);

    let mut contents = String::new();
    let mut count = 0u64;
    for input in split {
        for record in generator.map(input, &mut ctx).await? {
            contents.push_str(&record.encode());
            contents.push('\n');
            count += 1;
        }
    }

    tokio::fs::write(path, contents).await?;

    metrics().records_generated.inc_by(count);
    metrics().partitions_written.inc();
    debug!(
        path = %path.display(),
        task = task_id,
        records = count,
        "Wrote partition"
    );
    Ok(count)
}
