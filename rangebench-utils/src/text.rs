/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Line-oriented text formats: attribute files, query range files and single-column CSV.
//!
//! Line numbers in errors are 1-based.

use std::{
    fmt,
    io::{BufRead, Write},
    str::FromStr,
};

use serde::Serialize;
use thiserror::Error;

/// Per-item scalar attributes, in file order.
///
/// `keys[i]` is the key read from line `i` and `values[i]` its attribute value. Keys are
/// expected to equal the row position but this is not enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    keys: Vec<i64>,
    values: Vec<i32>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: i64, value: i32) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Return the rows whose key differs from the row position, as `(row, key)` pairs.
    pub fn misplaced_keys(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(|&(row, &key)| i64::try_from(row).ok() != Some(key))
            .map(|(row, &key)| (row, key))
    }
}

impl FromIterator<i32> for AttributeMap {
    /// Collect values with keys equal to their position.
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let values: Vec<i32> = iter.into_iter().collect();
        let keys = (0..values.len() as i64).collect();
        Self { keys, values }
    }
}

/// An inclusive attribute range `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryRange {
    pub low: i32,
    pub high: i32,
}

impl QueryRange {
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: i32) -> bool {
        self.low <= value && value <= self.high
    }
}

impl fmt::Display for QueryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected \"<low>-<high>\", found \"{0}\"")]
pub struct ParseRangeError(String);

impl FromStr for QueryRange {
    type Err = ParseRangeError;

    /// Parse `"<low>-<high>"`, splitting on the first `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRangeError(s.to_owned());
        let (low, high) = s.split_once('-').ok_or_else(err)?;
        let low = low.trim().parse::<i32>().map_err(|_| err())?;
        let high = high.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self { low, high })
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected \"<key> <value>\", found \"{content}\"")]
    MalformedAttribute { line: usize, content: String },

    #[error("line {line}: {source}")]
    MalformedRange {
        line: usize,
        #[source]
        source: ParseRangeError,
    },

    #[error("line {line}: expected an integer, found \"{content}\"")]
    InvalidInteger { line: usize, content: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse an attribute file with one `"<key> <value>"` pair per line.
///
/// Blank lines are skipped.
pub fn parse_attributes<R: BufRead>(reader: R) -> Result<AttributeMap, ParseError> {
    let mut attributes = AttributeMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let malformed = || ParseError::MalformedAttribute {
            line: i + 1,
            content: trimmed.to_owned(),
        };
        let mut fields = trimmed.split_whitespace();
        let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let key = key.parse::<i64>().map_err(|_| malformed())?;
        let value = value.parse::<i32>().map_err(|_| malformed())?;
        attributes.push(key, value);
    }
    Ok(attributes)
}

/// Parse a query range file with one `"<low>-<high>"` pair per line.
///
/// Blank lines are skipped. The first non-blank line is a header and is skipped if it
/// fails to parse as a range and either contains a `-` (one of its sides is not an
/// integer) or contains no digit at all. Any other malformed line is an error.
pub fn parse_ranges<R: BufRead>(reader: R) -> Result<Vec<QueryRange>, ParseError> {
    let mut ranges = Vec::new();
    let mut first = true;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.parse::<QueryRange>() {
            Ok(range) => ranges.push(range),
            Err(_) if first && is_range_header(trimmed) => {}
            Err(source) => {
                return Err(ParseError::MalformedRange {
                    line: i + 1,
                    source,
                });
            }
        }
        first = false;
    }
    Ok(ranges)
}

// Only called for lines that failed to parse as a range.
fn is_range_header(line: &str) -> bool {
    line.contains('-') || !line.bytes().any(|b| b.is_ascii_digit())
}

/// Parse a single-column CSV of integers.
///
/// The first line is always a header and is skipped, as are blank lines.
pub fn parse_csv_column<R: BufRead>(reader: R) -> Result<Vec<i32>, ParseError> {
    let mut values = Vec::new();
    for (i, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidInteger {
                line: i + 1,
                content: trimmed.to_owned(),
            })?;
        values.push(value);
    }
    Ok(values)
}

/// Write `values` as an attribute file, keyed by position.
pub fn write_attributes<W: Write>(values: &[i32], mut writer: W) -> std::io::Result<()> {
    for (i, value) in values.iter().enumerate() {
        writeln!(writer, "{} {}", i, value)?;
    }
    writer.flush()
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn attributes_keep_keys_and_values() {
        let text = "0 10\n1 11\n\n2   12\n";
        let attributes = parse_attributes(text.as_bytes()).unwrap();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.keys(), &[0, 1, 2]);
        assert_eq!(attributes.values(), &[10, 11, 12]);
        assert_eq!(attributes.misplaced_keys().count(), 0);
    }

    #[test]
    fn attributes_report_misplaced_keys() {
        let attributes = parse_attributes("0 1\n5 1\n2 1\n".as_bytes()).unwrap();
        let misplaced: Vec<_> = attributes.misplaced_keys().collect();
        assert_eq!(misplaced, vec![(1, 5)]);
    }

    #[rstest]
    #[case("0 1\nabc\n", 2)]
    #[case("0\n", 1)]
    #[case("0 1\n1 2 3\n", 2)]
    #[case("0 1.5\n", 1)]
    fn attributes_reject_malformed_lines(#[case] text: &str, #[case] expected: usize) {
        let err = parse_attributes(text.as_bytes()).unwrap_err();
        match err {
            ParseError::MalformedAttribute { line, .. } => assert_eq!(line, expected),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("12-45", QueryRange::new(12, 45))]
    #[case(" 0 - 0 ", QueryRange::new(0, 0))]
    #[case("7--3", QueryRange::new(7, -3))]
    fn range_parsing(#[case] text: &str, #[case] expected: QueryRange) {
        assert_eq!(text.parse::<QueryRange>().unwrap(), expected);
    }

    #[rstest]
    #[case("12,45")]
    #[case("12")]
    #[case("-")]
    #[case("a-b")]
    fn range_parsing_rejects(#[case] text: &str) {
        let err = text.parse::<QueryRange>().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("expected \"<low>-<high>\", found \"{}\"", text)
        );
    }

    #[test]
    fn range_display() {
        assert_eq!(QueryRange::new(3, 9).to_string(), "3-9");
        assert!(QueryRange::new(3, 9).contains(3));
        assert!(QueryRange::new(3, 9).contains(9));
        assert!(!QueryRange::new(3, 9).contains(10));
    }

    #[test]
    fn ranges_skip_one_header() {
        let ranges = parse_ranges("low-high\n1-2\n\n3-4\n".as_bytes()).unwrap();
        assert_eq!(ranges, vec![QueryRange::new(1, 2), QueryRange::new(3, 4)]);

        let ranges = parse_ranges("1-2\n3-4\n".as_bytes()).unwrap();
        assert_eq!(ranges.len(), 2);
    }

    #[rstest]
    #[case("attr_0-attr_1")]
    #[case("lo1-hi1")]
    #[case("low-45")]
    #[case("range")]
    fn ranges_skip_headers_with_digits(#[case] header: &str) {
        let text = format!("{}\n12-45\n", header);
        let ranges = parse_ranges(text.as_bytes()).unwrap();
        assert_eq!(ranges, vec![QueryRange::new(12, 45)]);
    }

    #[test]
    fn ranges_reject_second_header() {
        let err = parse_ranges("range\nrange\n1-2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRange { line: 2, .. }), "{err}");
    }

    #[test]
    fn ranges_reject_numeric_garbage_in_first_line() {
        let err = parse_ranges("12,45\n1-2\n".as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: expected \"<low>-<high>\", found \"12,45\""
        );
    }

    #[test]
    fn csv_skips_header_and_blank_lines() {
        let values = parse_csv_column("price\n3\n\n-4\n 5 \n".as_bytes()).unwrap();
        assert_eq!(values, vec![3, -4, 5]);
    }

    #[test]
    fn csv_reports_line_number() {
        let err = parse_csv_column("price\n3\nfour\n".as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 3: expected an integer, found \"four\"");
    }

    #[test]
    fn written_attributes_parse_back() {
        let mut buf = Vec::new();
        write_attributes(&[9, 8, 7], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "0 9\n1 8\n2 7\n");

        let attributes = parse_attributes(buf.as_slice()).unwrap();
        assert_eq!(attributes, [9, 8, 7].into_iter().collect::<AttributeMap>());
    }
}
