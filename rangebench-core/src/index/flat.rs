/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! An exact range-filtered index.
//!
//! Items are stored sorted by attribute value so that the items matching a range form one
//! contiguous run, located with two binary searches. Every item in the run is then scored
//! against the query. Answers are exact, so `max_degree`, `ef_construction` and
//! `ef_search` do not change them.

use std::{cmp::Ordering, collections::BinaryHeap, num::NonZeroUsize, sync::Arc};

use rangebench_utils::{Matrix, PartitionIter, text::QueryRange};

use super::{ConstructInput, IndexBuilder, IndexError, Neighbor, RangeIndex};
use crate::pool::WorkerPool;

/// Builds an [`ExhaustiveRangeIndex`], gathering rows in parallel across the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveRangeBuilder;

#[derive(Debug)]
pub struct ExhaustiveRangeIndex {
    /// Attribute values in ascending order.
    values: Box<[i32]>,
    /// `ids[i]` is the original id of the item with value `values[i]`.
    ids: Box<[u32]>,
    /// Row `i` is the vector of item `ids[i]`.
    vectors: Matrix<f32>,
    max_degree: NonZeroUsize,
    ef_construction: NonZeroUsize,
}

impl ExhaustiveRangeIndex {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn max_degree(&self) -> NonZeroUsize {
        self.max_degree
    }

    pub fn ef_construction(&self) -> NonZeroUsize {
        self.ef_construction
    }

    /// Return the positions in sorted order whose value lies in `range`.
    fn span(&self, range: QueryRange) -> std::ops::Range<usize> {
        if range.low > range.high {
            return 0..0;
        }
        let start = self.values.partition_point(|v| *v < range.low);
        let stop = self.values.partition_point(|v| *v <= range.high);
        start..stop
    }
}

impl IndexBuilder for ExhaustiveRangeBuilder {
    type Index = ExhaustiveRangeIndex;

    fn construct(
        &self,
        pool: &WorkerPool,
        input: ConstructInput,
    ) -> Result<Self::Index, IndexError> {
        input.validate()?;

        let values = input.attributes.values();
        let mut order: Vec<u32> = (0..input.count as u32).collect();
        order.sort_unstable_by_key(|&id| (values[id as usize], id));
        let order: Arc<[u32]> = order.into();

        let dim = input.dim;
        let parts = PartitionIter::new(order.len(), pool.threads());
        let gathered = pool.block_on(async {
            let handles: Vec<_> = parts
                .map(|range| {
                    let order = order.clone();
                    let vectors = input.vectors.clone();
                    tokio::spawn(async move {
                        let mut rows = Vec::with_capacity(range.len() * dim);
                        for &id in &order[range] {
                            rows.extend_from_slice(vectors.row(id as usize));
                        }
                        rows
                    })
                })
                .collect();

            let mut data = Vec::with_capacity(order.len() * dim);
            for handle in handles {
                let rows = handle
                    .await
                    .map_err(|err| IndexError::Construction(err.to_string()))?;
                data.extend_from_slice(&rows);
            }
            Ok::<_, IndexError>(data)
        })?;

        let vectors = Matrix::try_from(gathered.into_boxed_slice(), order.len(), dim)
            .map_err(|err| IndexError::Construction(err.to_string()))?;

        Ok(ExhaustiveRangeIndex {
            values: order.iter().map(|&id| values[id as usize]).collect(),
            ids: order.iter().copied().collect(),
            vectors,
            max_degree: input.max_degree,
            ef_construction: input.ef_construction,
        })
    }
}

impl RangeIndex for ExhaustiveRangeIndex {
    fn query(
        &self,
        query: &[f32],
        range: QueryRange,
        k: NonZeroUsize,
        _ef_search: NonZeroUsize,
    ) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dim() {
            return Err(IndexError::Query(format!(
                "query has dimension {} but the index has dimension {}",
                query.len(),
                self.dim()
            )));
        }

        let mut heap = BinaryHeap::with_capacity(k.get() + 1);
        for position in self.span(range) {
            let candidate = Candidate(Neighbor::new(
                self.ids[position],
                squared_l2(query, self.vectors.row(position)),
            ));
            if heap.len() < k.get() {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek()
                && candidate < *worst
            {
                heap.pop();
                heap.push(candidate);
            }
        }

        Ok(heap.into_sorted_vec().into_iter().map(|c| c.0).collect())
    }
}

fn squared_l2(x: &[f32], y: &[f32]) -> f32 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}

// Orders by distance, then by id.
#[derive(Debug, Clone, Copy)]
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then(self.0.id.cmp(&other.0.id))
    }
}

///////////
// Tests //
///////////
