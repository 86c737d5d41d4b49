/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{collections::HashSet, num::NonZeroUsize, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecallError {
    #[error("results have {0} rows but ground truth has {1}")]
    RowsMismatch(usize, usize),
    #[error("recall is undefined for an empty query set")]
    NoQueries,
}

/// Compute recall@k of `results` against `groundtruth`.
///
/// For each query, the true positives are the distinct ids among the first `k` entries of
/// the groundtruth row that also appear anywhere in the result row. Both rows are treated
/// as sets, so duplicates are not counted twice.
///
/// The aggregate is `sum(true positives) / (nqueries * k)`. The denominator is `k` per
/// query even when a groundtruth row has fewer than `k` entries, so such a query can never
/// reach a recall of 1.
pub fn recall(
    results: &[Vec<u32>],
    groundtruth: &[Vec<u32>],
    k: NonZeroUsize,
) -> Result<f64, RecallError> {
    if results.len() != groundtruth.len() {
        return Err(RecallError::RowsMismatch(results.len(), groundtruth.len()));
    }
    if results.is_empty() {
        return Err(RecallError::NoQueries);
    }

    let mut this_groundtruth: HashSet<u32> = HashSet::new();
    let mut this_results: HashSet<u32> = HashSet::new();
    let mut total = 0usize;
    for (result, gt) in std::iter::zip(results, groundtruth) {
        this_groundtruth.clear();
        this_groundtruth.extend(gt.iter().take(k.get()));

        this_results.clear();
        this_results.extend(result.iter());

        total += this_groundtruth
            .iter()
            .filter(|id| this_results.contains(*id))
            .count();
    }

    let div = results.len() * k.get();
    Ok((total as f64) / (div as f64))
}

/// Queries per second for `nqueries` completed in `elapsed`.
pub fn throughput(nqueries: usize, elapsed: Duration) -> f64 {
    (nqueries as f64) / elapsed.as_secs_f64()
}

///////////
// Tests //
///////////
