//! Bounded-parallelism task runner.
//!
//! [`ConcurrencyLimiter`] is the only synchronization primitive in the sync
//! engine. It drives a queue of zero-argument async tasks with at most
//! `limit` in flight. Tasks start in input order and may finish in any
//! order. A failing task never cancels its siblings: every task that was
//! submitted runs to completion before results are returned.
//!
//! ```
//! # use bible_sync_core::limiter::ConcurrencyLimiter;
//! # futures::executor::block_on(async {
//! let limiter = ConcurrencyLimiter::new(2).unwrap();
//! let tasks = (1..=4).map(|n| move || async move { Ok::<_, ()>(n * 10) });
//! assert_eq!(limiter.try_run(tasks).await, Ok(vec![10, 20, 30, 40]));
//! # });
//! ```

use std::future::Future;
use std::num::NonZeroUsize;

use futures::stream::{self, StreamExt};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimiter {
    limit: NonZeroUsize,
}

impl ConcurrencyLimiter {
    /// Fails with [`SyncError::InvalidArgument`] when `limit` is zero.
    pub fn new(limit: usize) -> Result<Self> {
        NonZeroUsize::new(limit)
            .map(|limit| Self { limit })
            .ok_or_else(|| SyncError::InvalidArgument("concurrency limit must be >= 1".into()))
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Run every task and return their results in input order.
    pub async fn run<I, F, Fut, T, E>(&self, tasks: I) -> Vec<std::result::Result<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut results: Vec<(usize, std::result::Result<T, E>)> = stream::iter(
            tasks
                .into_iter()
                .enumerate()
                .map(|(idx, task)| async move { (idx, task().await) }),
        )
        .buffer_unordered(self.limit.get())
        .collect()
        .await;
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Run every task, then return the first failure in input order, if any.
    pub async fn try_run<I, F, Fut, T, E>(&self, tasks: I) -> std::result::Result<Vec<T>, E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.run(tasks).await.into_iter().collect()
    }
}
