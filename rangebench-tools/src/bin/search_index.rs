/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use rangebench_core::{datafiles::QueryFiles, index::ExhaustiveRangeBuilder};
use rangebench_tools::utils::{QueryOnly, init_subscriber, parse_args};

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let args = parse_args::<SearchIndexArgs>();
    let config = QueryOnly {
        data: args.data_path,
        attributes: args.attributes_file,
        queries: QueryFiles {
            queries: args.query_path,
            ranges: args.query_ranges_file,
            groundtruth: args.groundtruth_file,
            k: args.k,
        },
        dim: args.dim,
        max_degree: args.max_degree,
        ef_search: args.ef_search,
        output_file: args.output_file,
    };

    let mut output = rangebench_runner::output::default();
    let result = config.run(ExhaustiveRangeBuilder, &mut output).map(|_| ());

    if let Err(err) = &result {
        tracing::error!("query execution failed: {:#}", err);
    }
    result
}

/// Rebuild a range-filtered index without timing it, then time a single pass over the
/// query set.
#[derive(Debug, Parser)]
struct SearchIndexArgs {
    /// Base vectors (`.fvecs`).
    #[arg(long = "data_path", required = true)]
    data_path: PathBuf,

    /// Query vectors (`.fvecs`).
    #[arg(long = "query_path", required = true)]
    query_path: PathBuf,

    /// Query ranges with one `<low>-<high>` line per query.
    #[arg(long = "query_ranges_file", required = true)]
    query_ranges_file: PathBuf,

    /// Groundtruth neighbor ids (`.ivecs`).
    #[arg(long = "groundtruth_file", required = true)]
    groundtruth_file: PathBuf,

    /// Attribute file with one `<key> <value>` line per base vector.
    #[arg(long = "attributes_file", required = true)]
    attributes_file: PathBuf,

    /// Dimension of the base and query vectors.
    #[arg(long = "dim", required = true)]
    dim: NonZeroUsize,

    /// Candidate list size used during search. The rebuild uses
    /// `max(200, 2 * ef_search)` as its construction candidate list size.
    #[arg(long = "ef_search", required = true)]
    ef_search: NonZeroUsize,

    /// Number of neighbors per query.
    #[arg(long = "k", required = true)]
    k: NonZeroUsize,

    /// Maximum out-degree of the graph.
    #[arg(long = "M", required = true)]
    max_degree: NonZeroUsize,

    /// Also save the report as JSON to this path. Existing files are not overwritten.
    #[arg(long = "output-file")]
    output_file: Option<PathBuf>,
}

///////////
// Tests //
///////////
