/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use rangebench_core::{
    datafiles::QueryFiles, index::ExhaustiveRangeBuilder, pipeline::BuildParams,
};
use rangebench_tools::utils::{Combined, EfSearchList, init_subscriber, parse_args};

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let args = parse_args::<BuildAndQueryArgs>();
    let config = Combined {
        data: args.data,
        attributes: args.attributes,
        queries: QueryFiles {
            queries: args.queries,
            ranges: args.ranges,
            groundtruth: args.groundtruth,
            k: args.k,
        },
        dim: args.dim,
        build: BuildParams {
            max_degree: args.max_degree,
            ef_construction: args.ef_construction,
        },
        ef_search: args.ef_search.into_inner(),
        threads: args.threads,
        output_file: args.output_file,
    };

    let mut output = rangebench_runner::output::default();
    let result = config.run(ExhaustiveRangeBuilder, &mut output).map(|_| ());

    if let Err(err) = &result {
        tracing::error!("benchmark failed: {:#}", err);
    }
    result
}

/// Build a range-filtered index with a timed, monitored construction phase, then run the
/// query set once for each `ef_search` value.
#[derive(Debug, Parser)]
struct BuildAndQueryArgs {
    /// Base vectors (`.fvecs`).
    data: PathBuf,

    /// Attribute file with one `<key> <value>` line per base vector.
    attributes: PathBuf,

    /// Query vectors (`.fvecs`).
    queries: PathBuf,

    /// Query ranges with one `<low>-<high>` line per query.
    ranges: PathBuf,

    /// Groundtruth neighbor ids (`.ivecs`).
    groundtruth: PathBuf,

    /// Dimension of the base and query vectors.
    dim: NonZeroUsize,

    /// Maximum out-degree of the graph.
    #[arg(value_name = "M")]
    max_degree: NonZeroUsize,

    /// Candidate list size used during construction.
    ef_construction: NonZeroUsize,

    /// Comma separated `ef_search` values, swept in the given order.
    #[arg(value_name = "EF_SEARCH_LIST")]
    ef_search: EfSearchList,

    /// Number of neighbors per query.
    k: NonZeroUsize,

    /// Number of worker threads used for construction.
    threads: NonZeroUsize,

    /// Also save the report as JSON to this path. Existing files are not overwritten.
    #[arg(long = "output-file")]
    output_file: Option<PathBuf>,
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use rangebench_tools::utils::exit_code;

    use super::*;

    fn parse(args: &[&str]) -> Result<BuildAndQueryArgs, clap::Error> {
        let argv = std::iter::once("build_and_query").chain(args.iter().copied());
        BuildAndQueryArgs::try_parse_from(argv)
    }

    const FILES: [&str; 5] = [
        "base.fvecs",
        "attrs.data",
        "query.fvecs",
        "ranges.txt",
        "gt.ivecs",
    ];

    #[test]
    fn parses() {
        let mut args = FILES.to_vec();
        args.extend(["128", "32", "200", "[16,64]", "10", "8"]);
        let args = parse(&args).unwrap();
        assert_eq!(args.dim.get(), 128);
        assert_eq!(args.ef_search.to_string(), "16 64");
        assert_eq!(args.threads.get(), 8);
    }

    #[test]
    fn zero_dimension_is_a_failure() {
        let mut args = FILES.to_vec();
        args.extend(["0", "32", "200", "16,64", "10", "8"]);
        assert_eq!(exit_code(&parse(&args).unwrap_err()), 1);
    }

    #[test]
    fn too_few_arguments_is_a_failure() {
        assert_eq!(exit_code(&parse(&FILES).unwrap_err()), 1);
    }

    #[test]
    fn help_is_a_success() {
        assert_eq!(exit_code(&parse(&["--help"]).unwrap_err()), 0);
    }
}
