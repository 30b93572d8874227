use std::{future::Future, sync::Arc};

use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::debug;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("all workers are busy and the backlog is full")]
pub struct PoolSaturated;

/// Bounded executor for comparison jobs.
///
/// At most `workers` jobs run at once and at most `backlog` more wait for a
/// worker. Anything beyond that is refused up front, so load never turns into
/// an unbounded pile of tasks.
#[derive(Debug, Clone)]
pub struct JobPool {
    slots: Arc<Semaphore>,
    workers: Arc<Semaphore>,
}

impl JobPool {
    pub fn new(workers: usize, backlog: usize) -> Self {
        let workers = workers.max(1);
        Self {
            slots: Arc::new(Semaphore::new(workers + backlog)),
            workers: Arc::new(Semaphore::new(workers)),
        }
    }

    pub fn submit<F>(&self, job: F) -> Result<JoinHandle<()>, PoolSaturated>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let slot = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| PoolSaturated)?;
        let workers = self.workers.clone();

        Ok(tokio::spawn(async move {
            let _slot = slot;
            let Ok(_worker) = workers.acquire_owned().await else {
                debug!("pool.closed");
                return;
            };
            job.await;
        }))
    }

    /// Submissions that would still be accepted right now.
    pub fn capacity(&self) -> usize {
        self.slots.available_permits()
    }
}
