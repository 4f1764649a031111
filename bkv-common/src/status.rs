//! # Status Codes
//!
//! Purpose: Carry the `(code, message)` pair every store-facing call returns.
//!
//! ## Usage Notes
//!
//! - `STATUS_OK` (0) means success; any other code is a failure.
//! - Negative codes are raised on the client side (bad parameters, connection
//!   failures, closed handles). Positive codes come from the store.
//! - Store codes are passed through opaquely: the marshaling layer never
//!   interprets or retries them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Success.
pub const STATUS_OK: i32 = 0;

/// Generic client-side failure (e.g. a call on a closed connection).
pub const ERR_CLIENT: i32 = -1;

/// Invalid parameter supplied by the caller.
pub const ERR_PARAM: i32 = -2;

/// Could not connect to the requested host.
pub const ERR_CONNECTION: i32 = -10;

/// Unspecified store-side failure.
pub const ERR_SERVER: i32 = 1;

/// Record does not exist.
pub const ERR_RECORD_NOT_FOUND: i32 = 2;

/// Operation is not valid for the type of an existing bin.
pub const ERR_BIN_INCOMPATIBLE_TYPE: i32 = 12;

/// Record would exceed the store's size limits.
pub const ERR_RECORD_TOO_BIG: i32 = 13;

/// Namespace is not configured on the store.
pub const ERR_NAMESPACE_NOT_FOUND: i32 = 20;

/// Result of a store-facing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    /// `STATUS_OK` on success, failure code otherwise.
    pub code: i32,
    /// Human-readable detail; empty on success.
    pub message: String,
}

impl Status {
    /// Successful status.
    pub fn ok() -> Self {
        Status {
            code: STATUS_OK,
            message: String::new(),
        }
    }

    /// Builds a status with an explicit code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Status {
            code,
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// Converts into `Ok(())` on success, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Status> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "status {}", self.code)
        } else {
            write!(f, "status {}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}
