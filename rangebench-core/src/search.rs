/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, sync::Arc, time::Duration};


use crate::{
    datafiles::QuerySet,
    index::{IndexError, RangeIndex},
    phase::{self, PhaseError},
    pool::WorkerPool,
};

/// Raw output of one pass over a query set.
#[derive(Debug)]
pub struct SearchOutput {
    /// The ids returned for each query, in query order. At most `k` per query.
    pub ids: Vec<Vec<u32>>,
    /// Wall-clock time for the whole query set.
    pub elapsed: Duration,
    pub peak_threads: usize,
}

/// Run every query of `queries` against `index`, in order, as a single task on `pool`.
///
/// Only the queries are timed and monitored. Results beyond the first `k` returned for a
/// query are dropped.
pub fn search<I>(
    index: &Arc<I>,
    queries: &Arc<QuerySet>,
    pool: &WorkerPool,
    k: NonZeroUsize,
    ef_search: NonZeroUsize,
) -> Result<SearchOutput, PhaseError>
where
    I: RangeIndex,
{
    let result = phase::monitored(pool, || {
        let index = index.clone();
        let queries = queries.clone();
        pool.block_on(async move {
            let task = tokio::spawn(async move { run_queries(&*index, &queries, k, ef_search) });
            task.await
                .map_err(|err| PhaseError::Index(IndexError::Query(err.to_string())))?
        })
    })?;

    Ok(SearchOutput {
        ids: result.output,
        elapsed: result.elapsed,
        peak_threads: result.peak_threads,
    })
}

fn run_queries<I>(
    index: &I,
    queries: &QuerySet,
    k: NonZeroUsize,
    ef_search: NonZeroUsize,
) -> Result<Vec<Vec<u32>>, PhaseError>
where
    I: RangeIndex + ?Sized,
{
    let mut ids = Vec::with_capacity(queries.len());
    for (i, (query, range)) in std::iter::zip(queries.vectors().row_iter(), queries.ranges())
        .enumerate()
    {
        let neighbors = index
            .query(query, *range, k, ef_search)
            .map_err(|source| PhaseError::Query { query: i, source })?;
        ids.push(neighbors.into_iter().take(k.get()).map(|n| n.id).collect());
    }
    Ok(ids)
}

///////////
// Tests //
///////////
