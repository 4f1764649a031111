//! # Dynamic Value Types
//!
//! Caller-facing, schema-less values as a scripting host hands them over:
//! numbers, strings, booleans, lists and tables. These are the inputs of the
//! encoder and the outputs of the decoder.
//!
//! ## Design Principles
//!
//! 1. **Explicit Tagged Union**: Every dynamic value carries its tag, so the
//!    marshaling code dispatches with an exhaustive `match` instead of
//!    runtime reflection.
//! 2. **Shared Tags**: `ValueTag` names the types of both sides (dynamic
//!    values and store bins) so errors and logs speak one vocabulary.
//! 3. **Order-Insensitive Mappings**: `DynamicMapping` iterates in insertion
//!    order but compares as a set of entries, because stores do not promise a
//!    stable bin order.
//!
//! ## Wire Shape
//!
//! ```text
//! DynamicValue   {"tag": "int", "value": 5}
//!                {"tag": "list", "value": [{"tag": "string", "value": "cat"}]}
//!                {"tag": "map", "value": [[<key>, <value>], ...]}
//! DynamicMapping {"score": {"tag": "int", "value": 5}, ...}
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Floats at or above this magnitude print in exponent form.
const FLOAT_EXPONENT_THRESHOLD: f64 = 1e15;

/// Type tag shared by dynamic values and store bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueTag {
    #[serde(rename = "nil")]
    Nil,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "map")]
    Map,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "geojson")]
    GeoJson,
}

impl ValueTag {
    /// Returns the wire name of the tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueTag::Nil => "nil",
            ValueTag::Bool => "bool",
            ValueTag::Integer => "int",
            ValueTag::Float => "float",
            ValueTag::String => "string",
            ValueTag::List => "list",
            ValueTag::Map => "map",
            ValueTag::Bytes => "bytes",
            ValueTag::GeoJson => "geojson",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-less value.
///
/// `List` elements are expected to be scalars; anything deeper is turned into
/// its string form when written to a store. `Map` keeps the key/value pairs of
/// a scripting table in the order the host produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "value")]
pub enum DynamicValue {
    #[serde(rename = "bool")]
    Bool(bool),
    #[serde(rename = "int")]
    Integer(i64),
    #[serde(rename = "float")]
    Float(f64),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "list")]
    List(Vec<DynamicValue>),
    #[serde(rename = "map")]
    Map(Vec<(DynamicValue, DynamicValue)>),
}

impl DynamicValue {
    /// Returns the type tag of this value.
    pub const fn tag(&self) -> ValueTag {
        match self {
            DynamicValue::Bool(_) => ValueTag::Bool,
            DynamicValue::Integer(_) => ValueTag::Integer,
            DynamicValue::Float(_) => ValueTag::Float,
            DynamicValue::String(_) => ValueTag::String,
            DynamicValue::List(_) => ValueTag::List,
            DynamicValue::Map(_) => ValueTag::Map,
        }
    }

    /// Builds a list value from anything convertible into dynamic values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DynamicValue>,
    {
        DynamicValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Canonical string form, used wherever a value is coerced to a string
/// (numeric table keys, list elements).
impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Bool(value) => write!(f, "{}", value),
            DynamicValue::Integer(value) => write!(f, "{}", value),
            // Large magnitudes switch to exponent form, e.g. `1e15`.
            DynamicValue::Float(value) if value.abs() >= FLOAT_EXPONENT_THRESHOLD => {
                write!(f, "{:e}", value)
            }
            DynamicValue::Float(value) => write!(f, "{}", value),
            DynamicValue::String(value) => f.write_str(value),
            DynamicValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            DynamicValue::Map(pairs) => {
                f.write_str("{")?;
                for (idx, (key, value)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Bool(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Integer(value)
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        DynamicValue::Integer(value as i64)
    }
}

impl From<u32> for DynamicValue {
    fn from(value: u32) -> Self {
        DynamicValue::Integer(value as i64)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Float(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        DynamicValue::list(items)
    }
}

/// Mapping from bin name to dynamic value.
///
/// Backed by a vector: records hold a handful of bins, so a linear scan beats
/// hashing and keeps insertion order for free.
#[derive(Debug, Clone, Default)]
pub struct DynamicMapping {
    entries: Vec<(String, DynamicValue)>,
}

impl DynamicMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        DynamicMapping {
            entries: Vec::new(),
        }
    }

    /// Creates an empty mapping with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        DynamicMapping {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or replaces an entry, returning the previous value.
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DynamicValue>,
    ) -> Option<DynamicValue> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    /// Returns true when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Removes an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<DynamicValue> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == key)
    }
}

// Entry-set equality: stores do not guarantee bin order.
impl PartialEq for DynamicMapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for DynamicMapping
where
    K: Into<String>,
    V: Into<DynamicValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = DynamicMapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl<K, V> Extend<(K, V)> for DynamicMapping
where
    K: Into<String>,
    V: Into<DynamicValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Borrowing iterator over mapping entries.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, DynamicValue)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a DynamicValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a DynamicMapping {
    type Item = (&'a String, &'a DynamicValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for DynamicMapping {
    type Item = (String, DynamicValue);
    type IntoIter = std::vec::IntoIter<(String, DynamicValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for DynamicMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DynamicMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = DynamicMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from bin name to tagged value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = DynamicMapping::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, DynamicValue>()? {
                    mapping.insert(key, value);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
