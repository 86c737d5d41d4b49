/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    index::IndexError,
    monitor::{PeakConcurrencyMonitor, PeakCounter},
    pool::WorkerPool,
};

/// The outcome of a timed and monitored phase.
#[derive(Debug)]
pub struct Monitored<T> {
    /// Wall-clock time of the phase body only.
    pub elapsed: Duration,
    /// The peak number of busy workers observed while the body ran.
    pub peak_threads: usize,
    pub output: T,
}

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("could not start the concurrency monitor")]
    Monitor(#[source] std::io::Error),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("query {query} failed")]
    Query {
        query: usize,
        #[source]
        source: IndexError,
    },
}

/// Run `body` while monitoring the concurrency of `pool`.
///
/// A fresh [`PeakCounter`] is used for each call. The monitor is started strictly before
/// the clock and stopped strictly after it, on success and on error alike.
pub fn monitored<T, F>(pool: &WorkerPool, body: F) -> Result<Monitored<T>, PhaseError>
where
    F: FnOnce() -> Result<T, PhaseError>,
{
    let counter = Arc::new(PeakCounter::new());
    let monitor =
        PeakConcurrencyMonitor::start(pool.probe(), counter).map_err(PhaseError::Monitor)?;

    let (elapsed, output) = rangebench_runner::timed!(body());
    let peak_threads = monitor.stop();

    tracing::debug!(?elapsed, peak_threads, "monitored phase finished");
    Ok(Monitored {
        elapsed,
        peak_threads,
        output: output?,
    })
}

///////////
// Tests //
///////////
