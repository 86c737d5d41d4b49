/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The final report and its textual layouts.
//!
//! The text layouts are parsed by downstream aggregation scripts and must keep their
//! exact wording.

use std::{io::Write, time::Duration};

use rangebench_platform::MemoryFootprint;
use rangebench_runner::Output;
use serde::Serialize;

use crate::{build::BuildStats, monitor::PeakCounter};

/// Measurements for one `ef_search` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub ef_search: usize,
    pub nqueries: usize,
    /// Wall-clock time of the query pass. Serialized in microseconds.
    #[serde(serialize_with = "rangebench_runner::utils::serialize_duration")]
    pub elapsed: Duration,
    pub qps: f64,
    pub recall: f64,
    pub peak_threads: usize,
}

/// Which text layout [`BenchmarkReport::write`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Build followed by a sweep over several `ef_search` values.
    Combined,
    BuildOnly,
    /// A single `ef_search` value against an untimed rebuild.
    QueryOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub build: Option<BuildStats>,
    /// In sweep order.
    pub sweep: Vec<SweepResult>,
    pub pid: u32,
    /// `None` if process memory could not be inspected.
    pub memory: Option<MemoryFootprint>,
}

impl BenchmarkReport {
    /// Peak concurrency of the last query phase, or the counter baseline if no query phase
    /// ran.
    pub fn query_peak_threads(&self) -> usize {
        self.sweep
            .last()
            .map_or(PeakCounter::BASELINE, |r| r.peak_threads)
    }

    /// Write the report in the given layout.
    pub fn write(&self, layout: Layout, output: &mut dyn Output) -> std::io::Result<()> {
        match layout {
            Layout::Combined => self.write_combined(output),
            Layout::BuildOnly => self.write_build_only(output),
            Layout::QueryOnly => self.write_query_only(output),
        }
    }

    fn write_combined(&self, mut output: &mut dyn Output) -> std::io::Result<()> {
        let build = self.build.ok_or_else(|| missing("build"))?;

        self.write_memory(output)?;
        writeln!(
            output,
            "Maximum number of threads during index construction: {}",
            build.peak_threads
        )?;
        writeln!(
            output,
            "Maximum number of threads during query execution: {}",
            self.query_peak_threads()
        )?;
        writeln!(
            output,
            "Index construction time: {:.3} s",
            build.elapsed.as_secs_f64()
        )?;
        for r in self.sweep.iter() {
            writeln!(
                output,
                "ef_search: {} QPS: {:.3} Recall: {:.5}",
                r.ef_search, r.qps, r.recall
            )?;
        }
        Ok(())
    }

    fn write_build_only(&self, mut output: &mut dyn Output) -> std::io::Result<()> {
        let build = self.build.ok_or_else(|| missing("build"))?;

        writeln!(output, "BUILD_TIME_SECONDS: {}", build.elapsed.as_secs_f64())?;
        writeln!(output, "PEAK_THREADS: {}", build.peak_threads)?;
        self.write_memory(output)
    }

    fn write_query_only(&self, mut output: &mut dyn Output) -> std::io::Result<()> {
        let r = self.sweep.last().ok_or_else(|| missing("query"))?;

        writeln!(output, "QUERY_TIME_SECONDS: {}", r.elapsed.as_secs_f64())?;
        writeln!(output, "QPS: {}", r.qps)?;
        writeln!(output, "RECALL: {}", r.recall)?;
        writeln!(output, "PEAK_THREADS: {}", r.peak_threads)?;
        self.write_memory(output)
    }

    fn write_memory(&self, mut output: &mut dyn Output) -> std::io::Result<()> {
        match &self.memory {
            Some(memory) => write!(output, "{}", memory),
            None => {
                writeln!(output, "PID: {}", self.pid)?;
                writeln!(output, "memory information open error!")
            }
        }
    }
}

fn missing(phase: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("report has no {} phase", phase),
    )
}

///////////
// Tests //
///////////
