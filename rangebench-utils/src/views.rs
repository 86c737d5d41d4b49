/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use thiserror::Error;

/// A dense, row-major matrix of `T`.
///
/// Every row has exactly [`Matrix::ncols`] elements. This is the in-memory representation
/// of a loaded vector file: row `i` is the vector with id `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Box<[T]>,
    nrows: usize,
    ncols: usize,
}

#[derive(Debug, Error)]
#[error("tried to construct a matrix of size {nrows}x{ncols} from a buffer of length {len}")]
pub struct TryFromError {
    len: usize,
    nrows: usize,
    ncols: usize,
}

impl<T> Matrix<T> {
    /// Construct a matrix of size `nrows x ncols` with every entry set to `value`.
    pub fn new(value: T, nrows: usize, ncols: usize) -> Self
    where
        T: Clone,
    {
        Self {
            data: vec![value; nrows * ncols].into_boxed_slice(),
            nrows,
            ncols,
        }
    }

    /// Wrap `data` as a matrix of size `nrows x ncols`.
    ///
    /// Returns an error if `data.len() != nrows * ncols`.
    pub fn try_from(data: Box<[T]>, nrows: usize, ncols: usize) -> Result<Self, TryFromError> {
        let len = data.len();
        if nrows.checked_mul(ncols) != Some(len) {
            return Err(TryFromError { len, nrows, ncols });
        }
        Ok(Self { data, nrows, ncols })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Return row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.nrows()`.
    pub fn row(&self, row: usize) -> &[T] {
        assert!(
            row < self.nrows,
            "row {} must be less than {}",
            row,
            self.nrows
        );
        let start = row * self.ncols;
        &self.data[start..start + self.ncols]
    }

    /// Return row `row` if it is in bounds.
    pub fn get_row(&self, row: usize) -> Option<&[T]> {
        if row < self.nrows {
            Some(self.row(row))
        } else {
            None
        }
    }

    /// Return row `row` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.nrows()`.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        assert!(
            row < self.nrows,
            "row {} must be less than {}",
            row,
            self.nrows
        );
        let start = row * self.ncols;
        &mut self.data[start..start + self.ncols]
    }

    pub fn row_iter(&self) -> impl ExactSizeIterator<Item = &[T]> {
        // `chunks_exact` with a zero chunk size panics, so zero-width matrices yield
        // `nrows` empty rows explicitly.
        let ncols = self.ncols;
        (0..self.nrows).map(move |i| &self.data[i * ncols..(i + 1) * ncols])
    }

    pub fn into_inner(self) -> Box<[T]> {
        self.data
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_rows() {
        let data: Box<[u32]> = (0..6).collect();
        let m = Matrix::try_from(data, 2, 3).unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.row(0), &[0, 1, 2]);
        assert_eq!(m.row(1), &[3, 4, 5]);
        assert!(m.get_row(2).is_none());

        let rows: Vec<&[u32]> = m.row_iter().collect();
        assert_eq!(rows, vec![&[0, 1, 2][..], &[3, 4, 5][..]]);
    }

    #[test]
    fn try_from_rejects_bad_length() {
        let data: Box<[u32]> = (0..5).collect();
        let err = Matrix::try_from(data, 2, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tried to construct a matrix of size 2x3 from a buffer of length 5"
        );
    }

    #[test]
    fn row_mut_writes_through() {
        let mut m = Matrix::new(0.0f32, 3, 2);
        m.row_mut(1).copy_from_slice(&[1.0, 2.0]);
        assert_eq!(m.as_slice(), &[0.0, 0.0, 1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_width_rows() {
        let m = Matrix::new(0u8, 3, 0);
        assert_eq!(m.row_iter().len(), 3);
        assert!(m.row(2).is_empty());
    }

    #[test]
    #[should_panic(expected = "row 3 must be less than 3")]
    fn row_out_of_bounds_panics() {
        let m = Matrix::new(0u8, 3, 2);
        let _ = m.row(3);
    }
}
