/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{num::NonZeroUsize, str::FromStr};

use thiserror::Error;

/// Parse the command line into `P`.
///
/// Help and version requests print to stdout and exit with 0. Any other parse error is
/// printed to stderr and exits with 1.
pub fn parse_args<P: clap::Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(exit_code(&err))
        }
    }
}

/// The process exit code for a command line parse error.
pub fn exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

/// A comma separated list of `ef_search` values, optionally wrapped in brackets:
/// `4,8,16` or `[4,8,16]`. Order is preserved and duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EfSearchList(Vec<NonZeroUsize>);

impl EfSearchList {
    pub fn as_slice(&self) -> &[NonZeroUsize] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<NonZeroUsize> {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseEfSearchError {
    #[error("ef_search list is empty")]
    Empty,
    #[error("invalid ef_search value \"{0}\": expected a positive integer")]
    InvalidValue(String),
}

impl FromStr for EfSearchList {
    type Err = ParseEfSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(s);

        if s.trim().is_empty() {
            return Err(ParseEfSearchError::Empty);
        }

        s.split(',')
            .map(|v| {
                let v = v.trim();
                v.parse::<NonZeroUsize>()
                    .map_err(|_| ParseEfSearchError::InvalidValue(v.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl std::fmt::Display for EfSearchList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn values(list: &EfSearchList) -> Vec<usize> {
        list.as_slice().iter().map(|v| v.get()).collect()
    }

    #[rstest]
    #[case("4,8,16", vec![4, 8, 16])]
    #[case("[4,8,16]", vec![4, 8, 16])]
    #[case(" [ 16, 4 ] ", vec![16, 4])]
    #[case("10", vec![10])]
    #[case("8,8", vec![8, 8])]
    fn parses(#[case] input: &str, #[case] expected: Vec<usize>) {
        let list: EfSearchList = input.parse().unwrap();
        assert_eq!(values(&list), expected);
    }

    #[rstest]
    #[case("", ParseEfSearchError::Empty)]
    #[case("[]", ParseEfSearchError::Empty)]
    #[case("4,0", ParseEfSearchError::InvalidValue("0".into()))]
    #[case("4,,8", ParseEfSearchError::InvalidValue("".into()))]
    #[case("4;8", ParseEfSearchError::InvalidValue("4;8".into()))]
    #[case("-4", ParseEfSearchError::InvalidValue("-4".into()))]
    fn rejects(#[case] input: &str, #[case] expected: ParseEfSearchError) {
        assert_eq!(input.parse::<EfSearchList>().unwrap_err(), expected);
    }

    #[derive(Debug, clap::Parser)]
    struct Args {
        dim: NonZeroUsize,
        ef_search: EfSearchList,
    }

    fn parse_error(args: &[&str]) -> clap::Error {
        use clap::Parser;
        Args::try_parse_from(std::iter::once("tool").chain(args.iter().copied())).unwrap_err()
    }

    #[test]
    fn parses_positional_arguments() {
        use clap::Parser;
        let args = Args::try_parse_from(["tool", "16", "[4,8]"]).unwrap();
        assert_eq!(args.dim.get(), 16);
        assert_eq!(values(&args.ef_search), vec![4, 8]);
    }

    #[rstest]
    #[case(&["0", "4,8"])]
    #[case(&["16", "4,0"])]
    #[case(&["16"])]
    #[case(&[])]
    #[case(&["16", "4", "extra"])]
    fn bad_arguments_exit_with_failure(#[case] args: &[&str]) {
        assert_eq!(exit_code(&parse_error(args)), 1);
    }

    #[test]
    fn help_exits_with_success() {
        let err = parse_error(&["--help"]);
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(exit_code(&err), 0);
    }

    #[test]
    fn display() {
        let list: EfSearchList = "[4,8,16]".parse().unwrap();
        assert_eq!(list.to_string(), "4 8 16");
    }
}
