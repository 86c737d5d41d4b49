/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::monitor::ConcurrencyProbe;

/// A bounded pool of worker threads that knows how many of its workers are busy.
///
/// Workers are counted as active from the moment they start until they park waiting for
/// work, and again from every unpark until the next park.
#[derive(Debug)]
pub struct WorkerPool {
    runtime: tokio::runtime::Runtime,
    activity: Arc<Activity>,
    threads: NonZeroUsize,
}

impl WorkerPool {
    /// Create a pool with exactly `threads` workers.
    pub fn new(threads: NonZeroUsize) -> std::io::Result<Self> {
        let activity = Arc::new(Activity::default());

        let on_start = activity.clone();
        let on_stop = activity.clone();
        let on_park = activity.clone();
        let on_unpark = activity.clone();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.get())
            .thread_name("rangebench-worker")
            .on_thread_start(move || on_start.enter())
            .on_thread_stop(move || on_stop.leave())
            .on_thread_park(move || on_park.leave())
            .on_thread_unpark(move || on_unpark.enter())
            .build()?;

        Ok(Self {
            runtime,
            activity,
            threads,
        })
    }

    /// A pool with a single worker.
    pub fn single() -> std::io::Result<Self> {
        Self::new(NonZeroUsize::MIN)
    }

    pub fn threads(&self) -> NonZeroUsize {
        self.threads
    }

    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }

    /// Run `future` to completion on the pool, blocking the calling thread.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// A handle for sampling the number of active workers.
    pub fn probe(&self) -> Arc<dyn ConcurrencyProbe> {
        self.activity.clone()
    }
}

#[derive(Debug, Default)]
struct Activity {
    active: AtomicUsize,
}

impl Activity {
    fn enter(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    // Saturates at zero.
    fn leave(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl ConcurrencyProbe for Activity {
    fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

///////////
// Tests //
///////////
