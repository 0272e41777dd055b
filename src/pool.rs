//! Bounded worker pool with an explicit lifecycle
//!
//! A pool is created for one stage of one request, receives its jobs through
//! [`WorkerPool::submit`], and is consumed by [`WorkerPool::join`] (or torn
//! down early with [`WorkerPool::shutdown`]). At most `size` jobs run at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

pub struct WorkerPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<T>,
    labels: HashMap<Id, String>,
    size: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool running at most `size` jobs concurrently (at least 1)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        ::log::debug!("Creating worker pool of size {}", size);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            labels: HashMap::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of jobs not yet joined
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Queues a job; it starts as soon as a worker slot is free.
    ///
    /// `label` identifies the job in [`WorkerPool::join`] results and logs.
    pub fn submit<F>(&mut self, label: impl Into<String>, job: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let handle = self.tasks.spawn(async move {
            // The semaphore is never closed, so acquiring only waits
            let _permit = semaphore.acquire_owned().await.ok();
            job.await
        });
        self.labels.insert(handle.id(), label.into());
    }

    /// Waits for every job and returns `(label, output)` pairs in completion
    /// order. A job that panicked or was aborted yields `None`.
    pub async fn join(mut self) -> Vec<(String, Option<T>)> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((id, output)) => {
                    let label = self.labels.remove(&id).unwrap_or_default();
                    results.push((label, Some(output)));
                }
                Err(e) => {
                    let label = self.labels.remove(&e.id()).unwrap_or_default();
                    ::log::error!("Worker for {} failed: {}", label, e);
                    results.push((label, None));
                }
            }
        }
        ::log::debug!("Worker pool joined {} jobs", results.len());
        results
    }

    /// Aborts every queued and running job
    pub async fn shutdown(mut self) {
        self.tasks.shutdown().await;
        ::log::debug!("Worker pool shut down");
    }
}
