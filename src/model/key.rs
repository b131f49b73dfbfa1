//! Row keys.
//!
//! A [`Key`] is either an integer or a string. String keys that spell a
//! canonical decimal integer are normalized to [`Key::Int`] on conversion, so
//! `"4"` and `4` address the same slot of a row.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// The key of a [`Row`](super::Row) entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Positional or explicitly numbered slot.
    Int(i64),
    /// Named slot.
    Str(String),
}

impl Key {
    /// Build a key from a string, normalizing canonical integers.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        canonical_int(s).map_or_else(|| Self::Str(s.to_owned()), Self::Int)
    }

    /// Returns `true` for integer keys.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// The string label, if this is a named key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

/// Parse `s` as an integer only when it is written the way the integer would
/// print itself (no sign on zero, no leading zeros, no `+`).
fn canonical_int(s: &str) -> Option<i64> {
    let n: i64 = s.parse().ok()?;
    (n.to_string() == s).then_some(n)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or_else(|_| Self::Str(n.to_string()), Self::Int)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        match canonical_int(&s) {
            Some(n) => Self::Int(n),
            None => Self::Str(s),
        }
    }
}

impl From<&Self> for Key {
    fn from(k: &Self) -> Self {
        k.clone()
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string key")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
                Ok(Key::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
                i64::try_from(v)
                    .map(Key::Int)
                    .map_err(|_| E::custom(format!("key {v} does not fit in i64")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(Key::parse(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
