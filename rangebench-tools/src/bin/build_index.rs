/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use rangebench_core::{index::ExhaustiveRangeBuilder, pipeline::BuildParams};
use rangebench_tools::utils::{BuildOnly, init_subscriber, parse_args};

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let args = parse_args::<BuildIndexArgs>();
    let config = BuildOnly {
        data: args.data,
        attributes: args.attributes,
        dim: args.dim,
        build: BuildParams {
            max_degree: args.max_degree,
            ef_construction: args.ef_construction,
        },
        threads: args.threads,
        output_file: args.output_file,
    };

    let mut output = rangebench_runner::output::default();
    let result = config.run(ExhaustiveRangeBuilder, &mut output).map(|_| ());

    if let Err(err) = &result {
        tracing::error!("index build failed: {:#}", err);
    }
    result
}

/// Build a range-filtered index and report its construction time, peak concurrency and
/// memory footprint.
#[derive(Debug, Parser)]
struct BuildIndexArgs {
    /// Base vectors (`.fvecs`).
    data: PathBuf,

    /// Attribute file with one `<key> <value>` line per base vector.
    attributes: PathBuf,

    /// Dimension of the base vectors.
    dim: NonZeroUsize,

    /// Maximum out-degree of the graph.
    #[arg(value_name = "M")]
    max_degree: NonZeroUsize,

    /// Candidate list size used during construction.
    ef_construction: NonZeroUsize,

    /// Number of worker threads used for construction.
    threads: NonZeroUsize,

    /// Also save the report as JSON to this path. Existing files are not overwritten.
    #[arg(long = "output-file")]
    output_file: Option<PathBuf>,
}
