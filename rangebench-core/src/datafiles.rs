/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Loading and cross-checking the on-disk inputs of a benchmark run.

use std::{
    fs::File,
    io::BufReader,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use rangebench_utils::{
    Matrix,
    io::{ReadVecsError, read_vecs, read_vecs_ragged},
    text::{self, AttributeMap, ParseError, QueryRange},
};
use thiserror::Error;

/// Which input a [`LoadError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Data,
    Attributes,
    Queries,
    Ranges,
    Groundtruth,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Data => "data",
            Self::Attributes => "attribute",
            Self::Queries => "query",
            Self::Ranges => "query range",
            Self::Groundtruth => "groundtruth",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {kind} file {}", path.display())]
    Open {
        kind: FileKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {kind} file {}", path.display())]
    Vectors {
        kind: FileKind,
        path: PathBuf,
        #[source]
        source: ReadVecsError,
    },

    #[error("cannot parse {kind} file {}", path.display())]
    Parse {
        kind: FileKind,
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{kind} file has {found} entries but {expected} were expected")]
    CountMismatch {
        kind: FileKind,
        expected: usize,
        found: usize,
    },

    #[error("the query file contains no queries")]
    NoQueries,
}

/// Paths of the query-side inputs.
#[derive(Debug, Clone)]
pub struct QueryFiles {
    pub queries: PathBuf,
    pub ranges: PathBuf,
    pub groundtruth: PathBuf,
    /// Groundtruth rows are truncated to their first `k` entries.
    pub k: NonZeroUsize,
}

/// Paths of every input of a run. `queries` is absent for build-only runs.
#[derive(Debug, Clone)]
pub struct WorkloadFiles {
    pub data: PathBuf,
    pub attributes: PathBuf,
    pub queries: Option<QueryFiles>,
}

/// Query vectors with their ranges and groundtruth, index-aligned.
#[derive(Debug)]
pub struct QuerySet {
    vectors: Matrix<f32>,
    ranges: Vec<QueryRange>,
    groundtruth: Vec<Vec<u32>>,
}

impl QuerySet {
    /// Assemble a query set, checking that every component has one entry per query.
    pub fn new(
        vectors: Matrix<f32>,
        ranges: Vec<QueryRange>,
        groundtruth: Vec<Vec<u32>>,
    ) -> Result<Self, LoadError> {
        let expected = vectors.nrows();
        if expected == 0 {
            return Err(LoadError::NoQueries);
        }
        check_count(FileKind::Ranges, expected, ranges.len())?;
        check_count(FileKind::Groundtruth, expected, groundtruth.len())?;
        Ok(Self {
            vectors,
            ranges,
            groundtruth,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vectors(&self) -> &Matrix<f32> {
        &self.vectors
    }

    pub fn ranges(&self) -> &[QueryRange] {
        &self.ranges
    }

    pub fn groundtruth(&self) -> &[Vec<u32>] {
        &self.groundtruth
    }
}

/// The loaded inputs. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Workload {
    pub base: Arc<Matrix<f32>>,
    pub attributes: Arc<AttributeMap>,
    pub queries: Option<Arc<QuerySet>>,
}

impl WorkloadFiles {
    /// Load and cross-check every input. The base data and queries must have dimension
    /// `dim`.
    pub fn load(&self, dim: NonZeroUsize) -> Result<Workload, LoadError> {
        let base = load_vectors(FileKind::Data, &self.data, dim)?;
        tracing::info!(
            count = base.nrows(),
            dim = dim.get(),
            "loaded database vectors"
        );

        let attributes = load_attributes(&self.attributes)?;
        check_count(FileKind::Attributes, base.nrows(), attributes.len())?;
        tracing::info!(count = attributes.len(), "loaded attribute pairs");
        warn_misplaced_keys(&attributes);

        let queries = match &self.queries {
            Some(files) => Some(Arc::new(files.load(dim)?)),
            None => None,
        };

        Ok(Workload {
            base: Arc::new(base),
            attributes: Arc::new(attributes),
            queries,
        })
    }
}

impl QueryFiles {
    pub fn load(&self, dim: NonZeroUsize) -> Result<QuerySet, LoadError> {
        let vectors = load_vectors(FileKind::Queries, &self.queries, dim)?;
        tracing::info!(count = vectors.nrows(), "loaded query vectors");

        let ranges = load_ranges(&self.ranges)?;
        tracing::info!(count = ranges.len(), "loaded query ranges");

        let mut groundtruth = load_groundtruth(&self.groundtruth)?;
        groundtruth.iter_mut().for_each(|row| row.truncate(self.k.get()));
        tracing::info!(count = groundtruth.len(), "loaded groundtruth entries");

        QuerySet::new(vectors, ranges, groundtruth)
    }
}

fn open(kind: FileKind, path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Open {
        kind,
        path: path.to_owned(),
        source,
    })
}

/// Load a `.fvecs` file whose records must all have dimension `dim`.
pub fn load_vectors(
    kind: FileKind,
    path: &Path,
    dim: NonZeroUsize,
) -> Result<Matrix<f32>, LoadError> {
    let mut reader = BufReader::new(open(kind, path)?);
    read_vecs::<f32>(&mut reader, dim.get()).map_err(|source| LoadError::Vectors {
        kind,
        path: path.to_owned(),
        source,
    })
}

/// Load an `.ivecs` groundtruth file. Rows keep their on-disk length.
pub fn load_groundtruth(path: &Path) -> Result<Vec<Vec<u32>>, LoadError> {
    let kind = FileKind::Groundtruth;
    let mut reader = BufReader::new(open(kind, path)?);
    read_vecs_ragged::<u32>(&mut reader).map_err(|source| LoadError::Vectors {
        kind,
        path: path.to_owned(),
        source,
    })
}

pub fn load_attributes(path: &Path) -> Result<AttributeMap, LoadError> {
    let kind = FileKind::Attributes;
    text::parse_attributes(BufReader::new(open(kind, path)?)).map_err(|source| {
        LoadError::Parse {
            kind,
            path: path.to_owned(),
            source,
        }
    })
}

pub fn load_ranges(path: &Path) -> Result<Vec<QueryRange>, LoadError> {
    let kind = FileKind::Ranges;
    text::parse_ranges(BufReader::new(open(kind, path)?)).map_err(|source| LoadError::Parse {
        kind,
        path: path.to_owned(),
        source,
    })
}

fn check_count(kind: FileKind, expected: usize, found: usize) -> Result<(), LoadError> {
    if expected == found {
        Ok(())
    } else {
        Err(LoadError::CountMismatch {
            kind,
            expected,
            found,
        })
    }
}

fn warn_misplaced_keys(attributes: &AttributeMap) {
    let mut misplaced = attributes.misplaced_keys();
    if let Some((row, key)) = misplaced.next() {
        let total = 1 + misplaced.count();
        tracing::warn!(
            row,
            key,
            total,
            "attribute keys do not match their row positions; values are used by position"
        );
    }
}

///////////
// Tests //
///////////
