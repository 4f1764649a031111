//! # Marshal Errors
//!
//! Errors raised while converting dynamic values into bins, records and
//! operation batches. All of them are local and recoverable: the caller can
//! retry with a larger capacity, split the payload, or fix the offending
//! entry.

use thiserror::Error;

use crate::record::MAX_BIN_NAME_LEN;
use crate::types::ValueTag;

/// Result type for marshaling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Errors produced by the encoder, decoder and increment builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// More entries than the declared bin/operation capacity.
    #[error("capacity exceeded: {requested} entries for declared capacity {capacity}")]
    CapacityExceeded { capacity: usize, requested: usize },

    /// A mapping key could not be coerced into a bin name.
    #[error("key of type {found} cannot be used as a bin name")]
    InvalidKeyType { found: ValueTag },

    /// A value could not be coerced into the field type the bin needs.
    #[error("bin {bin:?}: expected {expected}, found {found}")]
    InvalidValueType {
        bin: String,
        expected: &'static str,
        found: ValueTag,
    },

    /// Bin names must contain at least one byte.
    #[error("bin name is empty")]
    EmptyBinName,

    /// Bin name longer than the store allows.
    #[error("bin name is {len} bytes, maximum is {max}", max = MAX_BIN_NAME_LEN)]
    BinNameTooLong { len: usize },
}

/// A namespace, set or user key was empty.
///
/// Record keys are otherwise passed to the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} must not be empty")]
pub struct EmptyKeyPart(pub &'static str);
