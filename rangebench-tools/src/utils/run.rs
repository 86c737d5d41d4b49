/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Drivers for the three benchmark modes.
//!
//! Each driver prints its parameter banner, runs the pipeline with the given index builder
//! and writes the report to `output` in the layout of its mode. When an output file is
//! given, it is checked before anything runs and the report is saved there as JSON.

use std::{
    io::Write,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use rangebench_core::{
    BenchmarkReport, IndexBuilder, Pipeline,
    datafiles::{QueryFiles, WorkloadFiles},
    pipeline::BuildParams,
    report::Layout,
};
use rangebench_runner::Output;

/// Construction breadth used to rebuild the index for a query-only run.
pub fn rebuild_ef_construction(ef_search: NonZeroUsize) -> NonZeroUsize {
    const MIN: usize = 200;
    let doubled = ef_search.saturating_add(ef_search.get());
    match NonZeroUsize::new(MIN) {
        Some(min) => doubled.max(min),
        None => doubled,
    }
}

fn check_output_file(path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => rangebench_runner::check_output_path(path),
        None => Ok(()),
    }
}

fn save_report(path: Option<&Path>, report: &BenchmarkReport) -> anyhow::Result<()> {
    match path {
        Some(path) => rangebench_runner::save_json(path, report),
        None => Ok(()),
    }
}

/// Timed build followed by a sweep over several `ef_search` values.
#[derive(Debug, Clone)]
pub struct Combined {
    pub data: PathBuf,
    pub attributes: PathBuf,
    pub queries: QueryFiles,
    pub dim: NonZeroUsize,
    pub build: BuildParams,
    pub ef_search: Vec<NonZeroUsize>,
    pub threads: NonZeroUsize,
    /// Also save the report as JSON here.
    pub output_file: Option<PathBuf>,
}

impl Combined {
    pub fn run<B>(
        &self,
        builder: B,
        mut output: &mut dyn Output,
    ) -> anyhow::Result<BenchmarkReport>
    where
        B: IndexBuilder,
    {
        check_output_file(self.output_file.as_deref())?;
        write!(output, "{}", self)?;

        let files = WorkloadFiles {
            data: self.data.clone(),
            attributes: self.attributes.clone(),
            queries: Some(self.queries.clone()),
        };

        let mut pipeline = Pipeline::new(builder);
        pipeline.load(&files, self.dim)?;
        pipeline.build(self.build, self.threads)?;
        pipeline.sweep(&self.ef_search, self.queries.k)?;
        let report = pipeline.finish()?;

        save_report(self.output_file.as_deref(), &report)?;
        report.write(Layout::Combined, output)?;
        Ok(report)
    }
}

impl std::fmt::Display for Combined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Range-Filtered Index Construction and Query Execution ===")?;
        writeln!(f, "Data: {}", self.data.display())?;
        writeln!(f, "Attributes: {}", self.attributes.display())?;
        writeln!(f, "Queries: {}", self.queries.queries.display())?;
        writeln!(f, "Query ranges: {}", self.queries.ranges.display())?;
        writeln!(f, "Groundtruth: {}", self.queries.groundtruth.display())?;
        writeln!(
            f,
            "Parameters: dim={}, M={}, ef_construction={}, k={}",
            self.dim, self.build.max_degree, self.build.ef_construction, self.queries.k
        )?;
        write!(f, "ef_search values:")?;
        for ef in self.ef_search.iter() {
            write!(f, " {}", ef)?;
        }
        writeln!(f)?;
        writeln!(f, "Threads: {}", self.threads)?;
        writeln!(f)
    }
}

/// Timed build only.
#[derive(Debug, Clone)]
pub struct BuildOnly {
    pub data: PathBuf,
    pub attributes: PathBuf,
    pub dim: NonZeroUsize,
    pub build: BuildParams,
    pub threads: NonZeroUsize,
    /// Also save the report as JSON here.
    pub output_file: Option<PathBuf>,
}

impl BuildOnly {
    pub fn run<B>(
        &self,
        builder: B,
        mut output: &mut dyn Output,
    ) -> anyhow::Result<BenchmarkReport>
    where
        B: IndexBuilder,
    {
        check_output_file(self.output_file.as_deref())?;
        write!(output, "{}", self)?;

        let files = WorkloadFiles {
            data: self.data.clone(),
            attributes: self.attributes.clone(),
            queries: None,
        };

        let mut pipeline = Pipeline::new(builder);
        pipeline.load(&files, self.dim)?;
        pipeline.build(self.build, self.threads)?;
        let report = pipeline.finish()?;

        save_report(self.output_file.as_deref(), &report)?;
        report.write(Layout::BuildOnly, output)?;
        Ok(report)
    }
}

impl std::fmt::Display for BuildOnly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Range-Filtered Index Construction ===")?;
        writeln!(f, "Data: {}", self.data.display())?;
        writeln!(f, "Attributes: {}", self.attributes.display())?;
        writeln!(
            f,
            "Parameters: dim={}, M={}, ef_construction={}",
            self.dim, self.build.max_degree, self.build.ef_construction
        )?;
        writeln!(f, "Threads: {}", self.threads)?;
        writeln!(f)
    }
}

/// A single timed query pass against an index rebuilt without timing.
#[derive(Debug, Clone)]
pub struct QueryOnly {
    pub data: PathBuf,
    pub attributes: PathBuf,
    pub queries: QueryFiles,
    pub dim: NonZeroUsize,
    pub max_degree: NonZeroUsize,
    pub ef_search: NonZeroUsize,
    /// Also save the report as JSON here.
    pub output_file: Option<PathBuf>,
}

impl QueryOnly {
    pub fn run<B>(
        &self,
        builder: B,
        mut output: &mut dyn Output,
    ) -> anyhow::Result<BenchmarkReport>
    where
        B: IndexBuilder,
    {
        check_output_file(self.output_file.as_deref())?;
        write!(output, "{}", self)?;

        let files = WorkloadFiles {
            data: self.data.clone(),
            attributes: self.attributes.clone(),
            queries: Some(self.queries.clone()),
        };
        let params = BuildParams {
            max_degree: self.max_degree,
            ef_construction: rebuild_ef_construction(self.ef_search),
        };

        let mut pipeline = Pipeline::new(builder);
        pipeline.load(&files, self.dim)?;
        pipeline.rebuild(params)?;
        pipeline.sweep(&[self.ef_search], self.queries.k)?;
        let report = pipeline.finish()?;

        save_report(self.output_file.as_deref(), &report)?;
        report.write(Layout::QueryOnly, output)?;
        Ok(report)
    }
}

impl std::fmt::Display for QueryOnly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Range-Filtered Query Execution ===")?;
        writeln!(f, "Data: {}", self.data.display())?;
        writeln!(f, "Query: {}", self.queries.queries.display())?;
        writeln!(f, "Query ranges: {}", self.queries.ranges.display())?;
        writeln!(f, "Groundtruth: {}", self.queries.groundtruth.display())?;
        writeln!(f, "Attributes: {}", self.attributes.display())?;
        writeln!(
            f,
            "Parameters: dim={}, k={}, M={}, ef_search={}",
            self.dim, self.queries.k, self.max_degree, self.ef_search
        )?;
        writeln!(f)
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use std::fs::File;

    use rangebench_core::test::AttributeScan;
    use rangebench_runner::output::Memory;
    use rangebench_utils::io::write_vecs;

    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    struct Fixture {
        dir: tempfile::TempDir,
        data: PathBuf,
        attributes: PathBuf,
        queries: QueryFiles,
    }

    // 4 vectors of dimension 2 with attributes [0, 1, 0, 1] and one query over [0, 0]
    // whose groundtruth is [0, 2].
    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = |name: &str| dir.path().join(name);

            let data = path("base.fvecs");
            let rows: [&[f32]; 4] = [&[0.0, 0.0], &[1.0, 0.0], &[2.0, 0.0], &[3.0, 0.0]];
            write_vecs(rows, &mut File::create(&data).unwrap()).unwrap();

            let attributes = path("attrs.data");
            std::fs::write(&attributes, "0 0\n1 1\n2 0\n3 1\n").unwrap();

            let queries = path("query.fvecs");
            let rows: [&[f32]; 1] = [&[0.5, 0.0]];
            write_vecs(rows, &mut File::create(&queries).unwrap()).unwrap();

            let ranges = path("ranges.csv");
            std::fs::write(&ranges, "range\n0-0\n").unwrap();

            let groundtruth = path("gt.ivecs");
            let rows: [&[u32]; 1] = [&[0, 2]];
            write_vecs(rows, &mut File::create(&groundtruth).unwrap()).unwrap();

            Self {
                dir,
                data,
                attributes,
                queries: QueryFiles {
                    queries,
                    ranges,
                    groundtruth,
                    k: nz(2),
                },
            }
        }

        fn build_params(&self) -> BuildParams {
            BuildParams {
                max_degree: nz(16),
                ef_construction: nz(200),
            }
        }

        fn render(output: Memory) -> String {
            String::from_utf8(output.into_inner()).unwrap()
        }
    }

    #[test]
    fn test_rebuild_ef_construction() {
        assert_eq!(rebuild_ef_construction(nz(1)).get(), 200);
        assert_eq!(rebuild_ef_construction(nz(100)).get(), 200);
        assert_eq!(rebuild_ef_construction(nz(101)).get(), 202);
        assert_eq!(rebuild_ef_construction(nz(500)).get(), 1000);
    }

    #[test]
    fn combined() {
        let _guard = crate::utils::init_test_subscriber();
        let fixture = Fixture::new();
        let config = Combined {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            queries: fixture.queries.clone(),
            dim: nz(2),
            build: fixture.build_params(),
            ef_search: vec![nz(4), nz(8), nz(16)],
            threads: nz(2),
            output_file: None,
        };

        let mut output = Memory::new();
        let report = config.run(AttributeScan::new(), &mut output).unwrap();
        let text = Fixture::render(output);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "=== Range-Filtered Index Construction and Query Execution ==="
        );
        assert!(lines.contains(&"Parameters: dim=2, M=16, ef_construction=200, k=2"));
        assert!(lines.contains(&"ef_search values: 4 8 16"));
        assert!(lines.contains(&"Threads: 2"));

        let sweep: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.starts_with("ef_search: "))
            .collect();
        assert_eq!(sweep.len(), 3);
        assert!(sweep[0].starts_with("ef_search: 4 QPS: "));
        assert!(sweep[1].starts_with("ef_search: 8 QPS: "));
        assert!(sweep[2].starts_with("ef_search: 16 QPS: "));
        assert!(sweep.iter().all(|l| l.ends_with(" Recall: 1.00000")));

        assert!(report.build.is_some());
        assert_eq!(report.sweep.len(), 3);
    }

    #[test]
    fn build_only() {
        let fixture = Fixture::new();
        let config = BuildOnly {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            dim: nz(2),
            build: fixture.build_params(),
            threads: nz(1),
            output_file: None,
        };

        let mut output = Memory::new();
        let report = config.run(AttributeScan::new(), &mut output).unwrap();
        let text = Fixture::render(output);

        assert!(text.starts_with("=== Range-Filtered Index Construction ===\n"));
        assert!(text.contains("\nBUILD_TIME_SECONDS: "));
        assert!(text.contains("\nPEAK_THREADS: "));
        assert!(text.contains(&format!("\nPID: {}\n", std::process::id())));
        assert!(report.sweep.is_empty());
    }

    #[test]
    fn query_only() {
        let fixture = Fixture::new();
        let config = QueryOnly {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            queries: fixture.queries.clone(),
            dim: nz(2),
            max_degree: nz(16),
            ef_search: nz(10),
            output_file: None,
        };

        let mut output = Memory::new();
        let report = config.run(AttributeScan::new(), &mut output).unwrap();
        let text = Fixture::render(output);

        assert!(text.contains("Parameters: dim=2, k=2, M=16, ef_search=10\n"));
        assert!(text.contains("\nRECALL: 1\n"));
        assert!(text.contains("\nPEAK_THREADS: 1\n"));
        assert!(report.build.is_none());
        assert_eq!(report.sweep[0].ef_search, 10);
    }

    #[test]
    fn failures_propagate() {
        let fixture = Fixture::new();
        let config = QueryOnly {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            queries: fixture.queries.clone(),
            dim: nz(2),
            max_degree: nz(16),
            ef_search: nz(10),
            output_file: None,
        };

        let mut output = Memory::new();
        let err = config
            .run(AttributeScan::new().fail_at_query(0), &mut output)
            .unwrap_err();
        assert_eq!(format!("{}", err), "query execution failed for ef_search 10");

        // Only the banner made it out.
        let text = Fixture::render(output);
        assert!(!text.contains("QPS"));
    }

    #[test]
    fn existing_output_file_fails_before_running() {
        let fixture = Fixture::new();
        let path = fixture.dir.path().join("report.json");
        std::fs::write(&path, "{}").unwrap();

        let config = BuildOnly {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            dim: nz(2),
            build: fixture.build_params(),
            threads: nz(1),
            output_file: Some(path.clone()),
        };

        let mut output = Memory::new();
        let err = config.run(AttributeScan::new(), &mut output).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");

        // Nothing, not even the banner, is printed.
        assert!(Fixture::render(output).is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn report_is_saved_as_json() {
        let fixture = Fixture::new();
        let path = fixture.dir.path().join("report.json");
        let config = QueryOnly {
            data: fixture.data.clone(),
            attributes: fixture.attributes.clone(),
            queries: fixture.queries.clone(),
            dim: nz(2),
            max_degree: nz(16),
            ef_search: nz(10),
            output_file: Some(path.clone()),
        };

        let mut output = Memory::new();
        config.run(AttributeScan::new(), &mut output).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"ef_search\": 10"), "{saved}");
        assert!(saved.contains("\"recall\": 1.0"), "{saved}");
    }
}
