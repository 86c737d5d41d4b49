/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::time::Duration;

use serde::Serialize;

use crate::{
    index::{ConstructInput, IndexBuilder, IndexError},
    phase::{self, PhaseError},
    pool::WorkerPool,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildStats {
    /// Wall-clock time of index construction. Serialized in microseconds.
    #[serde(serialize_with = "rangebench_runner::utils::serialize_duration")]
    pub elapsed: Duration,
    /// Peak number of busy workers during construction.
    pub peak_threads: usize,
}

impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "built in {:.3}s with at most {} threads",
            self.elapsed.as_secs_f64(),
            self.peak_threads
        )
    }
}

/// Construct an index on `pool`, timing and monitoring construction only.
pub fn build<B>(
    builder: &B,
    pool: &WorkerPool,
    input: ConstructInput,
) -> Result<(B::Index, BuildStats), PhaseError>
where
    B: IndexBuilder,
{
    tracing::info!(
        count = input.count,
        dim = input.dim,
        max_degree = input.max_degree.get(),
        ef_construction = input.ef_construction.get(),
        threads = pool.threads().get(),
        "starting timed index construction"
    );

    let result = phase::monitored(pool, || Ok(builder.construct(pool, input)?))?;
    let stats = BuildStats {
        elapsed: result.elapsed,
        peak_threads: result.peak_threads,
    };

    tracing::info!("index construction complete: {}", stats);
    Ok((result.output, stats))
}

/// Construct an index on `pool` without timing or monitoring.
pub fn build_untimed<B>(
    builder: &B,
    pool: &WorkerPool,
    input: ConstructInput,
) -> Result<B::Index, IndexError>
where
    B: IndexBuilder,
{
    tracing::info!(
        count = input.count,
        ef_construction = input.ef_construction.get(),
        threads = pool.threads().get(),
        "rebuilding index (not timed)"
    );
    builder.construct(pool, input)
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use std::{num::NonZeroUsize, sync::Arc};

    use rangebench_utils::{Matrix, text::AttributeMap};

    use super::*;
    use crate::test::AttributeScan;

    fn input(n: usize) -> ConstructInput {
        let attributes: AttributeMap = (0..n as i32).collect();
        ConstructInput::new(
            Arc::new(Matrix::new(0.5f32, n, 3)),
            Arc::new(attributes),
            NonZeroUsize::new(8).unwrap(),
            NonZeroUsize::new(64).unwrap(),
        )
    }

    #[test]
    fn build_reports_stats() {
        let pool = WorkerPool::new(NonZeroUsize::new(2).unwrap()).unwrap();
        let (index, stats) = build(&AttributeScan::new(), &pool, input(10)).unwrap();
        assert_eq!(index.len(), 10);
        assert!(stats.peak_threads >= 1);
        assert!(stats.peak_threads <= 2);
        assert!(stats.to_string().starts_with("built in "));
    }

    #[test]
    fn build_error_is_returned() {
        let pool = WorkerPool::single().unwrap();
        let err = build(&AttributeScan::new().fail_construction(), &pool, input(4)).unwrap_err();
        assert!(matches!(err, PhaseError::Index(IndexError::Construction(_))), "{err}");
    }

    #[test]
    fn untimed_build() {
        let pool = WorkerPool::single().unwrap();
        let index = build_untimed(&AttributeScan::new(), &pool, input(3)).unwrap();
        assert_eq!(index.len(), 3);
    }
}
