use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::duration::{format_duration, parse_nanos};
use crate::error::TypeError;

/// Time-to-live for a stored entry.
///
/// Always non-negative: negative inputs from the wire clamp to zero, which
/// the store treats as "already expired". Deserializes from either a
/// Go-style duration string (`"10s"`) or a signed integer nanosecond count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Build a TTL from a signed nanosecond count, clamping negatives to zero.
    pub fn from_nanos(nanos: i128) -> Self {
        let clamped = nanos.clamp(0, i128::from(u64::MAX)) as u64;
        Self(Duration::from_nanos(clamped))
    }

    /// Parse a Go-style duration string, clamping negatives to zero.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        parse_nanos(input).map(Self::from_nanos)
    }

    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<Ttl> for Duration {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl FromStr for Ttl {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(self.0))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTtl {
    Nanos(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTtl::deserialize(deserializer)? {
            RawTtl::Nanos(nanos) => Ok(Self::from_nanos(i128::from(nanos))),
            RawTtl::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}
