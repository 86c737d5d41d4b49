/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
#![cfg_attr(
    not(test),
    warn(clippy::panic, clippy::unwrap_used, clippy::expect_used)
)]

//! The measurement core of the range-filtered ANN benchmark: a timed, monitored build
//! phase, a sequential query sweep and the recall/throughput computations that follow.

pub mod build;
pub mod datafiles;
pub mod index;
pub mod monitor;
pub mod phase;
pub mod pipeline;
pub mod pool;
pub mod recall;
pub mod report;
pub mod search;

pub use index::{ConstructInput, IndexBuilder, IndexError, Neighbor, RangeIndex};
pub use pipeline::{Phase, Pipeline, PipelineError};
pub use pool::WorkerPool;
pub use report::BenchmarkReport;
