/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Read and write vectors in the `.fvecs` / `.ivecs` record format.
//!
//! A file is a sequence of records, each laid out as:
//! - `dim` (i32 LE)
//! - Payload: `dim` 4-byte elements (`f32` for `.fvecs`, `i32` for `.ivecs`)
//!
//! There is no file header; the number of records is implied by the file size.

use std::io::{Read, Seek, SeekFrom, Write};

use thiserror::Error;

use crate::views::Matrix;

const DIM_BYTES: usize = std::mem::size_of::<i32>();

/// Read a file of fixed-dimension records into a row-major matrix.
///
/// The number of records is `filesize / (4 + size_of::<T>() * dim)`. Every record must
/// declare exactly `dim` elements, otherwise [`ReadVecsError::DimensionMismatch`] is
/// returned for the first offending record.
pub fn read_vecs<T>(reader: &mut (impl Read + Seek), dim: usize) -> Result<Matrix<T>, ReadVecsError>
where
    T: bytemuck::Pod,
{
    let record_bytes = std::mem::size_of::<T>()
        .checked_mul(dim)
        .and_then(|n| n.checked_add(DIM_BYTES))
        .ok_or(ReadVecsError::Overflow { dim })?;

    let start = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;

    let npoints = ((end - start) / record_bytes as u64) as usize;
    let mut data = Matrix::new(<T as bytemuck::Zeroable>::zeroed(), npoints, dim);

    let mut header = [0u8; DIM_BYTES];
    for record in 0..npoints {
        reader.read_exact(&mut header)?;
        let found = i32::from_le_bytes(header);
        if usize::try_from(found).ok() != Some(dim) {
            return Err(ReadVecsError::DimensionMismatch {
                record,
                expected: dim,
                found,
            });
        }
        reader.read_exact(bytemuck::cast_slice_mut::<T, u8>(data.row_mut(record)))?;
    }

    Ok(data)
}

/// Read a file of variable-length records, one `Vec` per record.
///
/// This is used for groundtruth files where the record length is unrelated to the
/// dataset dimension. A record that ends before its declared length is an error.
pub fn read_vecs_ragged<T>(reader: &mut impl Read) -> Result<Vec<Vec<T>>, ReadVecsError>
where
    T: bytemuck::Pod,
{
    let mut records = Vec::new();
    loop {
        let record = records.len();
        let found = match read_dim(reader)? {
            Some(found) => found,
            None => break,
        };
        let len = usize::try_from(found)
            .map_err(|_| ReadVecsError::NegativeDimension { record, found })?;

        let mut row = vec![<T as bytemuck::Zeroable>::zeroed(); len];
        reader
            .read_exact(bytemuck::cast_slice_mut::<T, u8>(&mut row))
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::UnexpectedEof => ReadVecsError::Truncated { record },
                _ => ReadVecsError::Io(err),
            })?;
        records.push(row);
    }
    Ok(records)
}

/// Write `rows` as a sequence of records. Returns the total number of bytes written.
pub fn write_vecs<'a, T, I>(rows: I, writer: &mut impl Write) -> Result<usize, WriteVecsError>
where
    T: bytemuck::Pod,
    I: IntoIterator<Item = &'a [T]>,
{
    let mut written = 0;
    for row in rows {
        let dim = i32::try_from(row.len())
            .map_err(|_| WriteVecsError::DimensionOverflow { dim: row.len() })?;
        writer.write_all(&dim.to_le_bytes())?;
        let bytes = bytemuck::cast_slice::<T, u8>(row);
        writer.write_all(bytes)?;
        written += DIM_BYTES + bytes.len();
    }
    Ok(written)
}

// Return `None` on a clean end-of-file before any byte of the dimension was read.
fn read_dim(reader: &mut impl Read) -> Result<Option<i32>, ReadVecsError> {
    let mut header = [0u8; DIM_BYTES];
    let mut filled = 0;
    while filled < DIM_BYTES {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(ReadVecsError::Truncated { record: usize::MAX }),
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(Some(i32::from_le_bytes(header)))
}

/// Error type for [`read_vecs`] and [`read_vecs_ragged`].
#[derive(Debug, Error)]
pub enum ReadVecsError {
    #[error("record {record} declares dimension {found} but the expected dimension is {expected}")]
    DimensionMismatch {
        record: usize,
        expected: usize,
        found: i32,
    },

    #[error("record {record} declares a negative dimension {found}")]
    NegativeDimension { record: usize, found: i32 },

    #[error("record {} ends before its declared length", DisplayRecord(*.record))]
    Truncated { record: usize },

    #[error("record size for dimension {dim} overflows")]
    Overflow { dim: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error type for [`write_vecs`].
#[derive(Debug, Error)]
pub enum WriteVecsError {
    #[error("row length {dim} does not fit in an i32 record header")]
    DimensionOverflow { dim: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// A truncated dimension header is reported without a record number.
struct DisplayRecord(usize);

impl std::fmt::Display for DisplayRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == usize::MAX {
            write!(f, "header")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

///////////
// Tests //
///////////
