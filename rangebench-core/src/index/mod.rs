/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The index capability under benchmark.
//!
//! An index is built once from a dataset and its per-item attributes by an
//! [`IndexBuilder`], queried any number of times through [`RangeIndex::query`] and then
//! released with [`RangeIndex::destroy`].

use std::{num::NonZeroUsize, sync::Arc};

use rangebench_utils::{Matrix, text::AttributeMap, text::QueryRange};
use thiserror::Error;

use crate::pool::WorkerPool;

pub mod flat;

pub use flat::{ExhaustiveRangeBuilder, ExhaustiveRangeIndex};

/// One entry of a query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: u32,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: u32, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Everything an index needs to be constructed.
#[derive(Debug, Clone)]
pub struct ConstructInput {
    pub dim: usize,
    pub count: usize,
    /// The maximum number of items the index should be able to hold.
    pub capacity: usize,
    pub vectors: Arc<Matrix<f32>>,
    pub attributes: Arc<AttributeMap>,
    /// Maximum out-degree for graph indexes (`M`).
    pub max_degree: NonZeroUsize,
    pub ef_construction: NonZeroUsize,
}

impl ConstructInput {
    /// Assemble the input for indexing all of `vectors`.
    pub fn new(
        vectors: Arc<Matrix<f32>>,
        attributes: Arc<AttributeMap>,
        max_degree: NonZeroUsize,
        ef_construction: NonZeroUsize,
    ) -> Self {
        let count = vectors.nrows();
        Self {
            dim: vectors.ncols(),
            count,
            capacity: count,
            vectors,
            attributes,
            max_degree,
            ef_construction,
        }
    }

    /// Check that the declared sizes agree with the payload.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.vectors.ncols() != self.dim {
            return Err(IndexError::InvalidInput(format!(
                "vectors have dimension {} but the declared dimension is {}",
                self.vectors.ncols(),
                self.dim
            )));
        }
        if self.vectors.nrows() != self.count {
            return Err(IndexError::InvalidInput(format!(
                "{} vectors were provided but the declared count is {}",
                self.vectors.nrows(),
                self.count
            )));
        }
        if self.attributes.len() != self.count {
            return Err(IndexError::InvalidInput(format!(
                "{} attributes were provided for {} vectors",
                self.attributes.len(),
                self.count
            )));
        }
        if self.capacity < self.count {
            return Err(IndexError::InvalidInput(format!(
                "capacity {} is smaller than the item count {}",
                self.capacity, self.count
            )));
        }
        if u32::try_from(self.count).is_err() {
            return Err(IndexError::InvalidInput(format!(
                "item count {} exceeds the id space",
                self.count
            )));
        }
        Ok(())
    }
}

/// Builds an index. Construction may use every worker of `pool`.
pub trait IndexBuilder {
    type Index: RangeIndex;

    fn construct(&self, pool: &WorkerPool, input: ConstructInput)
    -> Result<Self::Index, IndexError>;
}

/// A built index answering range-filtered k-nearest-neighbor queries.
pub trait RangeIndex: Send + Sync + 'static {
    /// Return at most `k` neighbors of `query` whose attribute lies in `range`, in
    /// ascending order of distance.
    fn query(
        &self,
        query: &[f32],
        range: QueryRange,
        k: NonZeroUsize,
        ef_search: NonZeroUsize,
    ) -> Result<Vec<Neighbor>, IndexError>;

    /// Release the index and everything it holds.
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid index input: {0}")]
    InvalidInput(String),

    #[error("index construction failed: {0}")]
    Construction(String),

    #[error("query failed: {0}")]
    Query(String),
}
