/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

/// A unit of time representing microseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MicroSeconds(u64);

impl MicroSeconds {
    pub fn new(micros: u64) -> Self {
        Self(micros)
    }

    /// Return `self` as seconds.
    pub fn as_seconds(self) -> f64 {
        (self.0 as f64) / 1_000_000.0
    }

    pub fn as_micros(self) -> u64 {
        self.0
    }
}

impl From<Duration> for MicroSeconds {
    fn from(value: Duration) -> Self {
        Self::new(u64::try_from(value.as_micros()).unwrap_or(u64::MAX))
    }
}

impl std::fmt::Display for MicroSeconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}us", self.as_micros())
    }
}

impl std::ops::Add for MicroSeconds {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// Serialize a [`Duration`] as whole [`MicroSeconds`].
///
/// For use with `#[serde(serialize_with = "...")]` on fields that keep full clock
/// resolution in memory.
pub fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    MicroSeconds::from(*value).serialize(serializer)
}

/// Evaluate an expression and return `(elapsed, result)` where `elapsed` is the
/// [`Duration`](std::time::Duration) of the evaluation at full clock resolution.
#[macro_export]
macro_rules! timed {
    ($($exprs:tt)*) => {{
        let start = ::std::time::Instant::now();
        let result = $($exprs)*;
        let elapsed: ::std::time::Duration = start.elapsed();
        (elapsed, result)
    }}
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microseconds() {
        let x = MicroSeconds::new(2_000_000);
        assert_eq!(x.as_micros(), 2_000_000);
        assert_eq!(x.as_seconds(), 2.0);
        assert_eq!(x.to_string(), "2000000us");

        assert_eq!(
            MicroSeconds::new(2) + MicroSeconds::new(3),
            MicroSeconds::new(5)
        );

        let y: MicroSeconds = Duration::from_micros(12345).into();
        assert_eq!(y, MicroSeconds::new(12345));
    }

    #[test]
    fn test_microseconds_serde() {
        let x: MicroSeconds = serde_json::from_str("15243").unwrap();
        assert_eq!(x, MicroSeconds::new(15243));
        assert_eq!(serde_json::to_string(&x).unwrap(), "15243");
    }

    #[test]
    fn test_serialize_duration() {
        #[derive(Serialize)]
        struct Timed {
            #[serde(serialize_with = "serialize_duration")]
            elapsed: Duration,
        }

        let timed = Timed {
            elapsed: Duration::from_nanos(2_500_900),
        };
        assert_eq!(serde_json::to_string(&timed).unwrap(), r#"{"elapsed":2500}"#);
    }

    #[test]
    fn test_timed() {
        let (elapsed, value) = crate::timed!({
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(value, 42);
        assert!(elapsed >= Duration::from_millis(5), "{elapsed:?}");
    }
}
