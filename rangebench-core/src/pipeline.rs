/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The benchmark state machine.
//!
//! ```text
//! Idle -> Loaded -> Building -> Built -> Querying(0) -> ... -> Querying(n-1) -> Reporting -> Done
//! ```
//!
//! Any error moves the pipeline to [`Phase::Failed`], from which there is no way out. On
//! failure the index and the loaded inputs are released and any sweep results gathered so
//! far are discarded. Calling an operation in the wrong phase is itself an error.

use std::{num::NonZeroUsize, sync::Arc};

use serde::Serialize;
use thiserror::Error;

use crate::{
    build::{self, BuildStats},
    datafiles::{FileKind, LoadError, Workload, WorkloadFiles},
    index::{ConstructInput, IndexBuilder, RangeIndex},
    phase::PhaseError,
    pool::WorkerPool,
    recall::{self, RecallError},
    report::{BenchmarkReport, SweepResult},
    search,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Loaded,
    Building,
    Built,
    /// Running the sweep entry at this position.
    Querying(usize),
    Reporting,
    Done,
    Failed,
}

/// Index construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildParams {
    /// Maximum out-degree (`M`).
    pub max_degree: NonZeroUsize,
    pub ef_construction: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot {operation} while the pipeline is in phase {phase:?}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("could not create a worker pool")]
    Pool(#[source] std::io::Error),

    #[error("index construction failed")]
    Build(#[source] PhaseError),

    #[error("query execution failed for ef_search {ef_search}")]
    Query {
        ef_search: usize,
        #[source]
        source: PhaseError,
    },

    #[error("cannot compute recall for ef_search {ef_search}")]
    Recall {
        ef_search: usize,
        #[source]
        source: RecallError,
    },

    #[error("the workload was loaded without queries")]
    NoQueries,
}

/// Drives one benchmark run. See the module documentation.
pub struct Pipeline<B>
where
    B: IndexBuilder,
{
    builder: B,
    phase: Phase,
    workload: Option<Workload>,
    index: Option<Arc<B::Index>>,
    build: Option<BuildStats>,
    sweep: Vec<SweepResult>,
}

impl<B> Pipeline<B>
where
    B: IndexBuilder,
{
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            phase: Phase::Idle,
            workload: None,
            index: None,
            build: None,
            sweep: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Results of the sweep so far, in sweep order.
    pub fn sweep_results(&self) -> &[SweepResult] {
        &self.sweep
    }

    /// `Idle -> Loaded`: load and cross-check every input. Nothing is timed.
    pub fn load(&mut self, files: &WorkloadFiles, dim: NonZeroUsize) -> Result<(), PipelineError> {
        self.require_phase("load", |phase| phase == Phase::Idle)?;
        match files.load(dim) {
            Ok(workload) => self.loaded(workload),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// `Idle -> Loaded` with inputs that are already in memory.
    pub fn load_workload(&mut self, workload: Workload) -> Result<(), PipelineError> {
        self.require_phase("load", |phase| phase == Phase::Idle)?;
        self.loaded(workload)
    }

    fn loaded(&mut self, workload: Workload) -> Result<(), PipelineError> {
        if workload.attributes.len() != workload.base.nrows() {
            return Err(self.fail(
                LoadError::CountMismatch {
                    kind: FileKind::Attributes,
                    expected: workload.base.nrows(),
                    found: workload.attributes.len(),
                }
                .into(),
            ));
        }
        self.workload = Some(workload);
        self.phase = Phase::Loaded;
        Ok(())
    }

    /// `Loaded -> Building -> Built`: construct the index on `threads` workers, timing and
    /// monitoring construction only.
    pub fn build(
        &mut self,
        params: BuildParams,
        threads: NonZeroUsize,
    ) -> Result<BuildStats, PipelineError> {
        self.require_phase("build", |phase| phase == Phase::Loaded)?;
        self.phase = Phase::Building;

        let pool = match WorkerPool::new(threads) {
            Ok(pool) => pool,
            Err(err) => return Err(self.fail(PipelineError::Pool(err))),
        };
        let input = self.construct_input(params)?;
        match build::build(&self.builder, &pool, input) {
            Ok((index, stats)) => {
                self.index = Some(Arc::new(index));
                self.build = Some(stats);
                self.phase = Phase::Built;
                Ok(stats)
            }
            Err(err) => Err(self.fail(PipelineError::Build(err))),
        }
    }

    /// `Loaded -> Building -> Built` on a single worker, without timing or monitoring.
    ///
    /// The report of a rebuilt pipeline carries no build statistics.
    pub fn rebuild(&mut self, params: BuildParams) -> Result<(), PipelineError> {
        self.require_phase("rebuild", |phase| phase == Phase::Loaded)?;
        self.phase = Phase::Building;

        let pool = match WorkerPool::single() {
            Ok(pool) => pool,
            Err(err) => return Err(self.fail(PipelineError::Pool(err))),
        };
        let input = self.construct_input(params)?;
        match build::build_untimed(&self.builder, &pool, input) {
            Ok(index) => {
                self.index = Some(Arc::new(index));
                self.phase = Phase::Built;
                Ok(())
            }
            Err(err) => Err(self.fail(PipelineError::Build(err.into()))),
        }
    }

    /// `Built -> Querying(0) -> ... -> Querying(n-1)`: run the full query set once per
    /// `ef_search` value, strictly in the given order, on a single worker.
    ///
    /// Each pass is timed and monitored on its own. Recall is computed after the timed
    /// section.
    pub fn sweep(
        &mut self,
        ef_search: &[NonZeroUsize],
        k: NonZeroUsize,
    ) -> Result<&[SweepResult], PipelineError> {
        self.require_phase("sweep", |phase| phase == Phase::Built)?;

        let queries = self.workload.as_ref().and_then(|w| w.queries.clone());
        let (Some(index), Some(queries)) = (self.index.clone(), queries) else {
            return Err(self.fail(PipelineError::NoQueries));
        };

        let pool = match WorkerPool::single() {
            Ok(pool) => pool,
            Err(err) => return Err(self.fail(PipelineError::Pool(err))),
        };

        for (i, &ef) in ef_search.iter().enumerate() {
            self.phase = Phase::Querying(i);
            tracing::info!(ef_search = ef.get(), nqueries = queries.len(), "running queries");

            let output = match search::search(&index, &queries, &pool, k, ef) {
                Ok(output) => output,
                Err(source) => {
                    drop(index);
                    return Err(self.fail(PipelineError::Query {
                        ef_search: ef.get(),
                        source,
                    }));
                }
            };

            let recall = match recall::recall(&output.ids, queries.groundtruth(), k) {
                Ok(recall) => recall,
                Err(source) => {
                    drop(index);
                    return Err(self.fail(PipelineError::Recall {
                        ef_search: ef.get(),
                        source,
                    }));
                }
            };

            let result = SweepResult {
                ef_search: ef.get(),
                nqueries: queries.len(),
                elapsed: output.elapsed,
                qps: recall::throughput(queries.len(), output.elapsed),
                recall,
                peak_threads: output.peak_threads,
            };
            tracing::info!(
                ef_search = result.ef_search,
                qps = result.qps,
                recall = result.recall,
                peak_threads = result.peak_threads,
                "query pass complete"
            );
            self.sweep.push(result);
        }

        Ok(&self.sweep)
    }

    /// `Built | Querying(_) -> Reporting -> Done`: release the index and inputs and
    /// assemble the report, including the process memory footprint.
    pub fn finish(&mut self) -> Result<BenchmarkReport, PipelineError> {
        self.require_phase("finish", |phase| {
            matches!(phase, Phase::Built | Phase::Querying(_))
        })?;
        self.phase = Phase::Reporting;

        let memory = match rangebench_platform::memory_footprint() {
            Ok(memory) => {
                tracing::info!(
                    peak_resident_bytes = memory.peak_resident_bytes(),
                    peak_virtual_bytes = memory.peak_virtual_bytes(),
                    "process memory footprint"
                );
                Some(memory)
            }
            Err(err) => {
                tracing::warn!("cannot read process memory information: {}", err);
                None
            }
        };

        self.release();
        let report = BenchmarkReport {
            build: self.build.take(),
            sweep: std::mem::take(&mut self.sweep),
            pid: std::process::id(),
            memory,
        };
        self.phase = Phase::Done;
        Ok(report)
    }

    fn construct_input(&mut self, params: BuildParams) -> Result<ConstructInput, PipelineError> {
        let Some(workload) = &self.workload else {
            let phase = self.phase;
            return Err(self.fail(PipelineError::InvalidPhase {
                operation: "build",
                phase,
            }));
        };
        Ok(ConstructInput::new(
            workload.base.clone(),
            workload.attributes.clone(),
            params.max_degree,
            params.ef_construction,
        ))
    }

    fn require_phase<F>(
        &mut self,
        operation: &'static str,
        allowed: F,
    ) -> Result<(), PipelineError>
    where
        F: FnOnce(Phase) -> bool,
    {
        if allowed(self.phase) {
            Ok(())
        } else {
            let phase = self.phase;
            Err(self.fail(PipelineError::InvalidPhase { operation, phase }))
        }
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        tracing::debug!(phase = ?self.phase, "pipeline failed: {}", err);
        self.phase = Phase::Failed;
        self.sweep.clear();
        self.build = None;
        self.release();
        err
    }

    fn release(&mut self) {
        if let Some(index) = self.index.take() {
            match Arc::try_unwrap(index) {
                Ok(index) => index.destroy(),
                Err(index) => {
                    tracing::warn!("index is still shared and will be released when dropped");
                    drop(index);
                }
            }
        }
        self.workload = None;
    }
}

///////////
// Tests //
///////////
