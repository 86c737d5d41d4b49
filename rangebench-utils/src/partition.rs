/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, ops::Range};

use thiserror::Error;

/// Split `0..nitems` into `nparts` contiguous ranges so that:
///
/// * The ranges are disjoint and their union is `0..nitems`.
/// * The ranges are yielded in ascending order.
/// * The lengths of any two ranges differ by at most 1, with longer ranges first.
///
/// Exactly `nparts` ranges are yielded, some of which are empty when `nitems < nparts`.
#[derive(Debug, Clone)]
pub struct PartitionIter {
    nitems: usize,
    nparts: NonZeroUsize,
    current: usize,
}

impl PartitionIter {
    pub fn new(nitems: usize, nparts: NonZeroUsize) -> Self {
        Self {
            nitems,
            nparts,
            current: 0,
        }
    }
}

impl Iterator for PartitionIter {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.nparts.get() {
            return None;
        }
        let range = part(self.nitems, self.nparts, self.current);
        self.current += 1;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.nparts.get() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PartitionIter {}

/// Return the `index`-th range yielded by `PartitionIter::new(nitems, nparts)`.
pub fn partition(
    nitems: usize,
    nparts: NonZeroUsize,
    index: usize,
) -> Result<Range<usize>, PartitionError> {
    if index >= nparts.get() {
        return Err(PartitionError {
            nparts: nparts.get(),
            index,
        });
    }
    Ok(part(nitems, nparts, index))
}

// Requires `index < nparts`.
fn part(nitems: usize, nparts: NonZeroUsize, index: usize) -> Range<usize> {
    let base = nitems / nparts.get();
    let extra = nitems % nparts.get();

    if index < extra {
        let start = index * (base + 1);
        start..start + base + 1
    } else {
        let start = extra * (base + 1) + (index - extra) * base;
        start..start + base
    }
}

#[derive(Debug, Error)]
#[error("partition index {index} must be less than the number of partitions {nparts}")]
pub struct PartitionError {
    nparts: usize,
    index: usize,
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1)]
    #[case(0, 4)]
    #[case(3, 8)]
    #[case(10, 3)]
    #[case(100, 7)]
    #[case(64, 8)]
    fn ranges_tile_the_input(#[case] nitems: usize, #[case] nparts: usize) {
        let nparts = NonZeroUsize::new(nparts).unwrap();
        let iter = PartitionIter::new(nitems, nparts);
        assert_eq!(iter.len(), nparts.get());

        let ranges: Vec<_> = iter.collect();
        assert_eq!(ranges.len(), nparts.get());

        let mut expected_start = 0;
        for (i, range) in ranges.iter().enumerate() {
            assert_eq!(range.start, expected_start, "range {i} is not contiguous");
            expected_start = range.end;
            assert_eq!(*range, partition(nitems, nparts, i).unwrap());
        }
        assert_eq!(expected_start, nitems);

        let min = ranges.iter().map(|r| r.len()).min().unwrap();
        let max = ranges.iter().map(|r| r.len()).max().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn longer_ranges_come_first() {
        let ranges: Vec<_> = PartitionIter::new(10, NonZeroUsize::new(4).unwrap()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn out_of_bounds_index() {
        let err = partition(10, NonZeroUsize::new(2).unwrap(), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "partition index 2 must be less than the number of partitions 2"
        );
    }
}
