//! Rule mapping attached to a location constraint.
//!
//! A rule is an ordered mapping. Declared rules usually look like
//!
//! ```yaml
//! rule:
//!   score: 200
//!   expression:
//!     attribute: "#uname"
//!     operation: eq
//!     value: node1
//! ```
//!
//! while rules rebuilt from the CIB are flat `name -> value` pairs. Order is
//! kept because the command builder lets later keys overwrite earlier ones.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const EXPRESSION_KEY: &str = "expression";
pub const SCORE_KEY: &str = "score";
pub const SCORE_ATTRIBUTE_KEY: &str = "score-attribute";

/// A single rule entry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValue {
    Text(String),
    Map(BTreeMap<String, String>),
}

impl RuleValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleValue::Text(s) => Some(s),
            RuleValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            RuleValue::Map(m) => Some(m),
            RuleValue::Text(_) => None,
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Text(s) => f.write_str(s),
            RuleValue::Map(m) => {
                let parts: Vec<String> = m.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        RuleValue::Text(s.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        RuleValue::Text(s)
    }
}

/// Ordered rule mapping. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    entries: Vec<(String, RuleValue)>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule with a single `expression` entry.
    pub fn expression(attribute: &str, operation: &str, value: &str) -> Self {
        let mut rule = Self::new();
        rule.insert(
            EXPRESSION_KEY,
            RuleValue::Map(BTreeMap::from([
                ("attribute".to_string(), attribute.to_string()),
                ("operation".to_string(), operation.to_string()),
                ("value".to_string(), value.to_string()),
            ])),
        );
        rule
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<RuleValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RuleValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RuleValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, RuleValue)> for Rule {
    fn from_iter<I: IntoIterator<Item = (String, RuleValue)>>(iter: I) -> Self {
        let mut rule = Rule::new();
        for (k, v) in iter {
            rule.insert(k, v);
        }
        rule
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for RuleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RuleValue::Text(s) => serializer.serialize_str(s),
            RuleValue::Map(m) => m.serialize(serializer),
        }
    }
}

struct RuleVisitor;

impl<'de> Visitor<'de> for RuleVisitor {
    type Value = Rule;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a rule mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Rule, A::Error> {
        let mut rule = Rule::new();
        while let Some((k, v)) = access.next_entry::<String, RuleValue>()? {
            rule.insert(k, v);
        }
        Ok(rule)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RuleVisitor)
    }
}

/// Scalars of any kind are kept as their text form.
struct Scalar(String);

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
        Ok(Scalar(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
        Ok(Scalar(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
        Ok(Scalar(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct RuleValueVisitor;

impl<'de> Visitor<'de> for RuleValueVisitor {
    type Value = RuleValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar or a mapping of scalars")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RuleValue, E> {
        Ok(RuleValue::Text(v.to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleValue, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((k, Scalar(v))) = access.next_entry::<String, Scalar>()? {
            map.insert(k, v);
        }
        Ok(RuleValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RuleValueVisitor)
    }
}
