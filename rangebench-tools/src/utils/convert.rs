/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context;
use rangebench_utils::text;

/// Convert a single-column CSV of integer attributes into the `"<key> <value>"` attribute
/// format, keyed by 0-based row position.
///
/// The first line is a header and is skipped, as are empty lines. Returns the number of
/// attributes written.
pub fn csv_to_attributes(input: &Path, output: &Path) -> anyhow::Result<usize> {
    let file = File::open(input)
        .with_context(|| format!("cannot open input file {}", input.display()))?;
    let values = text::parse_csv_column(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", input.display()))?;

    let file = File::create(output)
        .with_context(|| format!("cannot create output file {}", output.display()))?;
    text::write_attributes(&values, BufWriter::new(file))
        .with_context(|| format!("cannot write {}", output.display()))?;

    tracing::info!(
        count = values.len(),
        "converted {} to {}",
        input.display(),
        output.display()
    );
    Ok(values.len())
}

///////////
// Tests //
///////////
