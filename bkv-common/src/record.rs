//! # Record Types
//!
//! Store-side types: bin names, typed bin values, structured records and
//! increment batches.
//!
//! ## Design Principles
//!
//! 1. **Checked Capacity**: Records and batches declare a capacity up front,
//!    the same way the store client sizes them, but overflow returns
//!    `MarshalError::CapacityExceeded` instead of writing past the end.
//! 2. **Bounded Names**: Bin names are validated once at construction
//!    (non-empty, at most `MAX_BIN_NAME_LEN` bytes).
//! 3. **Full Store Type Set**: `BinValue` models every bin type a store can
//!    return, including the ones the decoder does not map, so records read
//!    back from a store are represented faithfully.
//!
//! ## Layout
//!
//! ```text
//! StructuredRecord
//!   ├── bins: Vec<Bin>          (insertion order, unique names)
//!   │     └── Bin { name: BinName, value: BinValue }
//!   ├── capacity: usize         (max distinct bins)
//!   └── generation: Generation  (store write counter)
//!
//! OperationBatch
//!   ├── ops: Vec<Increment>     (submission order)
//!   │     └── Increment { bin: BinName, delta: i64 }
//!   └── capacity: usize
//! ```

use std::borrow::Borrow;
use std::fmt;

use crate::error::{MarshalError, MarshalResult};
use crate::types::ValueTag;

/// Maximum bin name length in bytes.
pub const MAX_BIN_NAME_LEN: usize = 15;

/// Maximum number of bins a single record can declare.
pub const MAX_BINS: usize = u16::MAX as usize;

/// Validated bin name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinName(String);

impl BinName {
    /// Creates a bin name.
    ///
    /// # Errors
    /// Returns `MarshalError::EmptyBinName` for an empty name and
    /// `MarshalError::BinNameTooLong` when it exceeds `MAX_BIN_NAME_LEN` bytes.
    ///
    /// # Examples
    /// ```rust
    /// use bkv_common::{BinName, MarshalError};
    ///
    /// let name = BinName::new("score").expect("valid name");
    /// assert_eq!(name.as_str(), "score");
    ///
    /// assert_eq!(
    ///     BinName::new("a-very-long-bin-name"),
    ///     Err(MarshalError::BinNameTooLong { len: 20 })
    /// );
    /// ```
    pub fn new(name: impl Into<String>) -> MarshalResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(MarshalError::EmptyBinName);
        }
        if name.len() > MAX_BIN_NAME_LEN {
            return Err(MarshalError::BinNameTooLong { len: name.len() });
        }
        Ok(BinName(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BinName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BinName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BinName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed bin value as held by the store.
///
/// The marshaling layer writes `Integer`, `String` and `List` and reads
/// `Integer`, `Double`, `String` and `List`; the other variants exist because
/// a store may hold them.
#[derive(Debug, Clone, PartialEq)]
pub enum BinValue {
    Nil,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    List(Vec<BinValue>),
    Map(Vec<(BinValue, BinValue)>),
    Bytes(Vec<u8>),
    GeoJson(String),
}

impl BinValue {
    /// Returns the type tag of this bin value.
    pub const fn tag(&self) -> ValueTag {
        match self {
            BinValue::Nil => ValueTag::Nil,
            BinValue::Bool(_) => ValueTag::Bool,
            BinValue::Integer(_) => ValueTag::Integer,
            BinValue::Double(_) => ValueTag::Float,
            BinValue::String(_) => ValueTag::String,
            BinValue::List(_) => ValueTag::List,
            BinValue::Map(_) => ValueTag::Map,
            BinValue::Bytes(_) => ValueTag::Bytes,
            BinValue::GeoJson(_) => ValueTag::GeoJson,
        }
    }
}

/// Canonical string form of a bin value.
///
/// Strings render without quotes; bytes render as uppercase hex.
impl fmt::Display for BinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinValue::Nil => f.write_str("NIL"),
            BinValue::Bool(value) => write!(f, "{}", value),
            BinValue::Integer(value) => write!(f, "{}", value),
            BinValue::Double(value) => write!(f, "{}", value),
            BinValue::String(value) | BinValue::GeoJson(value) => f.write_str(value),
            BinValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            BinValue::Map(pairs) => {
                f.write_str("{")?;
                for (idx, (key, value)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            BinValue::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// A named bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub name: BinName,
    pub value: BinValue,
}

/// Per-record write counter maintained by the store.
///
/// Incremented on every successful write; wraps on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u32);

impl Generation {
    /// Generation of a record that has never been written.
    pub const ZERO: Generation = Generation(0);

    #[inline]
    pub const fn new(value: u32) -> Self {
        Generation(value)
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Increments the generation and returns the new value.
    #[inline]
    pub fn increment(&mut self) -> Generation {
        self.0 = self.0.wrapping_add(1);
        *self
    }

    /// Returns the next generation without modifying self.
    #[inline]
    pub const fn next(&self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }
}

/// Capacity-checked record of named, typed bins.
#[derive(Debug, Clone)]
pub struct StructuredRecord {
    bins: Vec<Bin>,
    capacity: usize,
    generation: Generation,
}

impl StructuredRecord {
    /// Creates an empty record that can hold up to `MAX_BINS` bins.
    pub fn new() -> Self {
        Self::with_capacity(MAX_BINS)
    }

    /// Creates an empty record that can hold up to `capacity` bins.
    pub fn with_capacity(capacity: usize) -> Self {
        StructuredRecord {
            bins: Vec::with_capacity(capacity.min(64)),
            capacity,
            generation: Generation::ZERO,
        }
    }

    /// Sets a bin, replacing any bin with the same name.
    ///
    /// # Errors
    /// Returns `MarshalError::CapacityExceeded` when adding a new bin would
    /// exceed the declared capacity. Replacing an existing bin always succeeds.
    pub fn set(&mut self, name: BinName, value: BinValue) -> MarshalResult<()> {
        if let Some(bin) = self.bins.iter_mut().find(|bin| bin.name == name) {
            bin.value = value;
            return Ok(());
        }
        if self.bins.len() >= self.capacity {
            return Err(MarshalError::CapacityExceeded {
                capacity: self.capacity,
                requested: self.bins.len() + 1,
            });
        }
        self.bins.push(Bin { name, value });
        Ok(())
    }

    /// Returns the value of the named bin.
    pub fn get(&self, name: &str) -> Option<&BinValue> {
        self.bins
            .iter()
            .find(|bin| bin.name.as_str() == name)
            .map(|bin| &bin.value)
    }

    /// Removes the named bin and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<BinValue> {
        let idx = self.bins.iter().position(|bin| bin.name.as_str() == name)?;
        Some(self.bins.remove(idx).value)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates bins in record order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bin> {
        self.bins.iter()
    }

    #[inline]
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Declared bin capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn set_generation(&mut self, generation: Generation) {
        self.generation = generation;
    }
}

impl Default for StructuredRecord {
    fn default() -> Self {
        Self::new()
    }
}

// Field-for-field comparison; bin order and declared capacity are not part of
// a record's identity.
impl PartialEq for StructuredRecord {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.bins.len() == other.bins.len()
            && self
                .bins
                .iter()
                .all(|bin| other.get(bin.name.as_str()) == Some(&bin.value))
    }
}

impl<'a> IntoIterator for &'a StructuredRecord {
    type Item = &'a Bin;
    type IntoIter = std::slice::Iter<'a, Bin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// "Add `delta` to `bin`" instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub bin: BinName,
    pub delta: i64,
}

/// Ordered, capacity-checked batch of increments.
#[derive(Debug, Clone)]
pub struct OperationBatch {
    ops: Vec<Increment>,
    capacity: usize,
}

impl OperationBatch {
    /// Creates an empty batch that can hold up to `capacity` operations.
    pub fn with_capacity(capacity: usize) -> Self {
        OperationBatch {
            ops: Vec::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Appends an increment.
    ///
    /// # Errors
    /// Returns `MarshalError::CapacityExceeded` when the batch is full.
    pub fn add_increment(&mut self, bin: BinName, delta: i64) -> MarshalResult<()> {
        if self.ops.len() >= self.capacity {
            return Err(MarshalError::CapacityExceeded {
                capacity: self.capacity,
                requested: self.ops.len() + 1,
            });
        }
        self.ops.push(Increment { bin, delta });
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Increment> {
        self.ops.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Increment] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl PartialEq for OperationBatch {
    fn eq(&self, other: &Self) -> bool {
        self.ops == other.ops
    }
}

impl<'a> IntoIterator for &'a OperationBatch {
    type Item = &'a Increment;
    type IntoIter = std::slice::Iter<'a, Increment>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
