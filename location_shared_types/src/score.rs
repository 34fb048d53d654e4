//! Location scores.
//!
//! Scores are carried as the raw text the cluster or the user supplied;
//! nothing on the write path validates them. Manifests may write them as
//! integers.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Preference strength of a location constraint, as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Score(String);

impl Score {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Score {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Score {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for Score {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct ScoreVisitor;

impl<'de> Visitor<'de> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer score or INFINITY / -INFINITY")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Score, E> {
        Ok(Score::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Score, E> {
        Ok(Score(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Score, E> {
        Ok(Score::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Score, E> {
        Ok(Score(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScoreVisitor)
    }
}
