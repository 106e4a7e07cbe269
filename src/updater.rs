//! Background recache worker.
//!
//! A [`CacheUpdater`] takes ownership of a [`Cache`] and walks its load plan
//! on a dedicated thread, one step at a time, checking its cancellation token
//! between steps. Because the cache moves into the worker, nothing else can
//! reach the source while the worker runs; [`CacheUpdater::stop`] joins the
//! thread and hands the cache back.

use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::Cache;
use crate::error::{CacheError, Result};

/// What a worker run accomplished.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Length of the load plan the worker walked.
    pub planned: usize,
    /// Steps that ran to completion.
    pub steps_completed: usize,
    /// The run ended because cancellation was observed.
    pub cancelled: bool,
    /// The error that ended the run early, if any.
    pub error: Option<CacheError>,
}

impl UpdateReport {
    /// Whether every planned step completed.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.steps_completed == self.planned
    }
}

/// Handle to a running background recache.
pub struct CacheUpdater<T> {
    token: CancellationToken,
    handle: Option<JoinHandle<(Cache<T>, UpdateReport)>>,
}

impl<T: Send + 'static> CacheUpdater<T> {
    /// Start recaching `cache` around its current position.
    pub fn start(cache: Cache<T>) -> Result<Self> {
        let token = CancellationToken::new();
        let worker_token = token.clone();

        let handle = thread::Builder::new()
            .name("cache-updater".into())
            .spawn(move || run(cache, worker_token))?;

        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    /// Request cancellation and wait for the worker to exit.
    pub fn stop(mut self) -> Result<(Cache<T>, UpdateReport)> {
        self.token.cancel();
        self.join()
    }

    /// Wait for the worker to finish its plan without cancelling it.
    pub fn wait(mut self) -> Result<(Cache<T>, UpdateReport)> {
        self.join()
    }

    /// Whether the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Token observed by the worker between steps.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl<T> CacheUpdater<T> {
    fn join(&mut self) -> Result<(Cache<T>, UpdateReport)> {
        let handle = self.handle.take().ok_or(CacheError::UpdaterPanicked)?;
        handle.join().map_err(|_| CacheError::UpdaterPanicked)
    }
}

impl<T> Drop for CacheUpdater<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.token.cancel();
            if handle.join().is_err() {
                error!("Cache updater panicked");
            }
        }
    }
}

fn run<T>(mut cache: Cache<T>, token: CancellationToken) -> (Cache<T>, UpdateReport) {
    let mut report = UpdateReport::default();

    let plan = match cache.load_plan() {
        Ok(plan) => plan,
        Err(e) => {
            error!(error = %e, "Cache updater could not compute load plan");
            report.error = Some(e);
            return (cache, report);
        }
    };
    report.planned = plan.len();
    info!(planned = plan.len(), position = ?cache.position(), "Cache updater started");

    for n in 0..plan.len() {
        if token.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if let Err(e) = cache.apply_step(&plan, n) {
            error!(step = n, error = %e, "Cache updater step failed");
            report.error = Some(e);
            break;
        }
        report.steps_completed += 1;
    }

    debug!(
        steps = report.steps_completed,
        planned = report.planned,
        cancelled = report.cancelled,
        "Cache updater finished"
    );
    (cache, report)
}
