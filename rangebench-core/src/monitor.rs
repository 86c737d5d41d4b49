/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Peak concurrency tracking for timed phases.
//!
//! A [`PeakConcurrencyMonitor`] runs on a dedicated supervisory thread for the duration
//! of one phase, sampling a [`ConcurrencyProbe`] at a fixed interval and folding every
//! sample into a shared [`PeakCounter`]. The peak is only handed out by
//! [`PeakConcurrencyMonitor::stop`], after the supervisory thread has been joined.
//!
//! Sampling is periodic: a burst shorter than the interval can be missed, while a level of
//! concurrency sustained for longer than the interval is always observed.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

/// The default sampling interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A source of "how many workers are busy right now".
pub trait ConcurrencyProbe: Send + Sync {
    fn active(&self) -> usize;
}

/// A monotonic maximum, updated without locks.
#[derive(Debug)]
pub struct PeakCounter(AtomicUsize);

impl PeakCounter {
    /// The value a counter holds after construction or [`Self::reset`].
    pub const BASELINE: usize = 1;

    pub fn new() -> Self {
        Self(AtomicUsize::new(Self::BASELINE))
    }

    pub fn reset(&self) {
        self.0.store(Self::BASELINE, Ordering::Release);
    }

    /// Raise the counter to `sample` if `sample` is larger. Returns `true` if this call
    /// raised the counter.
    pub fn record(&self, sample: usize) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        while sample > current {
            match self.0.compare_exchange_weak(
                current,
                sample,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for PeakCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A running supervisory thread. See the module documentation.
///
/// Dropping a monitor without calling [`Self::stop`] still stops and joins the thread.
#[derive(Debug)]
pub struct PeakConcurrencyMonitor {
    counter: Arc<PeakCounter>,
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeakConcurrencyMonitor {
    /// Reset `counter` and start sampling `probe` every [`POLL_INTERVAL`].
    pub fn start(
        probe: Arc<dyn ConcurrencyProbe>,
        counter: Arc<PeakCounter>,
    ) -> std::io::Result<Self> {
        Self::with_interval(probe, counter, POLL_INTERVAL)
    }

    /// Reset `counter` and start sampling `probe` every `interval`.
    ///
    /// Returns an error if the supervisory thread could not be spawned.
    pub fn with_interval(
        probe: Arc<dyn ConcurrencyProbe>,
        counter: Arc<PeakCounter>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        counter.reset();
        let done = Arc::new(AtomicBool::new(false));

        let handle = {
            let counter = counter.clone();
            let done = done.clone();
            std::thread::Builder::new()
                .name("peak-monitor".into())
                .spawn(move || {
                    loop {
                        counter.record(probe.active());
                        if done.load(Ordering::Acquire) {
                            break;
                        }
                        std::thread::park_timeout(interval);
                    }
                })?
        };

        Ok(Self {
            counter,
            done,
            handle: Some(handle),
        })
    }

    /// Stop sampling, join the supervisory thread and return the observed peak.
    pub fn stop(mut self) -> usize {
        self.join();
        self.counter.get()
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.done.store(true, Ordering::Release);
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("peak concurrency monitor panicked");
            }
        }
    }
}

impl Drop for PeakConcurrencyMonitor {
    fn drop(&mut self) {
        self.join();
    }
}

///////////
// Tests //
///////////
