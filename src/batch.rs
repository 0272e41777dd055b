//! Row-by-row cross similarity of tabular documents
//!
//! Every row holds one text per column. Each pair of columns `i < j` is
//! scored under a single metric, producing one `Distance-<a>-<b>` value per
//! pair. Progress is reported after every row, and a job cancelled through
//! its progress sink tears its worker pool down.

use std::sync::{Arc, Mutex};

use crate::error::{BatchError, ValidationError};
use crate::metrics::Metric;
use crate::pool::WorkerPool;
use crate::tokenizer::TokenizerConfig;
use crate::utils::available_parallelism;

/// Minimum number of columns of a batch document
pub const MIN_COLUMNS: usize = 2;

/// Progress sink of a batch job
pub trait JobProgress: Send + Sync {
    fn set_size(&self, size: usize);
    fn set_start(&self);
    fn increment_progress(&self);
    fn set_finished(&self);
    fn set_error(&self, message: &str);

    /// Polled between rows; a cancelled job stops queueing work
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// State recorded by [`MemoryJobProgress`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub size: usize,
    pub progress: usize,
    pub started: bool,
    pub finished: bool,
    pub cancelled: bool,
    pub error: Option<String>,
}

/// In-process [`JobProgress`]
#[derive(Debug, Default)]
pub struct MemoryJobProgress {
    state: Mutex<ProgressSnapshot>,
}

impl MemoryJobProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Asks the running job to stop
    pub fn cancel(&self) {
        self.update(|state| state.cancelled = true);
    }

    fn update(&self, f: impl FnOnce(&mut ProgressSnapshot)) {
        match self.state.lock() {
            Ok(mut state) => f(&mut state),
            Err(_) => ::log::error!("Job progress lock poisoned"),
        }
    }
}

impl JobProgress for MemoryJobProgress {
    fn set_size(&self, size: usize) {
        self.update(|state| state.size = size);
    }

    fn set_start(&self) {
        self.update(|state| state.started = true);
    }

    fn increment_progress(&self) {
        self.update(|state| state.progress += 1);
    }

    fn set_finished(&self) {
        self.update(|state| state.finished = true);
    }

    fn set_error(&self, message: &str) {
        self.update(|state| state.error = Some(message.to_string()));
    }

    fn is_cancelled(&self) -> bool {
        self.snapshot().cancelled
    }
}

/// Output columns, one per column pair `i < j`
pub fn distance_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    let mut names = Vec::new();
    for (i, a) in columns.iter().enumerate() {
        for b in &columns[i + 1..] {
            names.push(format!("Distance-{}-{}", a.as_ref(), b.as_ref()));
        }
    }
    names
}

/// Scores of a batch, in input row order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// See [`distance_columns`]
    pub columns: Vec<String>,
    /// One score per distance column, or `None` when the row failed
    pub rows: Vec<Option<Vec<f64>>>,
}

/// Scores every row of a tabular document.
///
/// Rows are spread over a pool sized to the CPU count and scored on the
/// blocking pool. A row whose worker fails is left empty without stopping
/// the others. Cancellation is checked while rows are queued; a cancelled
/// job aborts the rows already submitted.
pub async fn cross_check_rows(
    columns: &[String],
    rows: Vec<Vec<String>>,
    metric: Metric,
    tokenizer: TokenizerConfig,
    progress: Arc<dyn JobProgress>,
) -> Result<BatchResult, BatchError> {
    if let Err(e) = validate(columns, &rows) {
        progress.set_error(&e.to_string());
        return Err(e.into());
    }

    let total = rows.len();
    progress.set_size(total);
    progress.set_start();
    ::log::info!("Batch cross check of {} rows with {}", total, metric);

    let mut pool = WorkerPool::new(available_parallelism());
    for (index, row) in rows.into_iter().enumerate() {
        if progress.is_cancelled() {
            ::log::warn!("Batch cancelled after queueing {} of {} rows", index, total);
            pool.shutdown().await;
            progress.set_error(&BatchError::Cancelled.to_string());
            return Err(BatchError::Cancelled);
        }

        let progress = Arc::clone(&progress);
        pool.submit(index.to_string(), async move {
            let task = tokio::task::spawn_blocking(move || row_distances(&row, metric, &tokenizer));
            let distances = match task.await {
                Ok(distances) => Some(distances),
                Err(e) => {
                    ::log::error!("Batch row {} failed: {}", index, e);
                    None
                }
            };
            progress.increment_progress();
            distances
        });
    }

    let mut scored = vec![None; total];
    for (label, distances) in pool.join().await {
        match label.parse::<usize>() {
            Ok(index) if index < total => scored[index] = distances.flatten(),
            _ => ::log::error!("Unknown batch row {}", label),
        }
    }

    let failed = scored.iter().filter(|row| row.is_none()).count();
    if failed > 0 {
        ::log::warn!("{} of {} batch rows failed", failed, total);
    }
    progress.set_finished();

    Ok(BatchResult {
        columns: distance_columns(columns),
        rows: scored,
    })
}

fn validate(columns: &[String], rows: &[Vec<String>]) -> Result<(), ValidationError> {
    if columns.len() < MIN_COLUMNS {
        return Err(ValidationError::TooFewColumns(MIN_COLUMNS));
    }
    for (row, cells) in rows.iter().enumerate() {
        if cells.len() != columns.len() {
            return Err(ValidationError::RowWidth {
                row,
                found: cells.len(),
                expected: columns.len(),
            });
        }
    }
    Ok(())
}

fn row_distances(row: &[String], metric: Metric, tokenizer: &TokenizerConfig) -> Vec<f64> {
    let tokens: Vec<Vec<String>> = row.iter().map(|cell| tokenizer.normalize(cell)).collect();
    let mut distances = Vec::new();
    for (i, a) in tokens.iter().enumerate() {
        for b in &tokens[i + 1..] {
            distances.push(metric.score(a, b));
        }
    }
    distances
}
