/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::path::PathBuf;

use clap::Parser;
use rangebench_tools::utils::{csv_to_attributes, init_subscriber, parse_args};

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let args = parse_args::<CsvToAttributesArgs>();
    match csv_to_attributes(&args.input, &args.output) {
        Ok(count) => {
            println!("Wrote {} attributes to {}", count, args.output.display());
            Ok(())
        }
        Err(err) => {
            tracing::error!("conversion failed: {:#}", err);
            Err(err)
        }
    }
}

/// Convert a single-column CSV of integer attributes (with a header line) into the
/// `<key> <value>` attribute format.
#[derive(Debug, Parser)]
struct CsvToAttributesArgs {
    /// Input CSV file.
    input: PathBuf,

    /// Output attribute file.
    output: PathBuf,
}
