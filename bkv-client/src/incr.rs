//! # Increment Builder
//!
//! Purpose: Turn a mapping of integer deltas into an `OperationBatch` of
//! "add N to bin" instructions.
//!
//! ## Integer Coercion
//!
//! ```text
//! Integer                      -> delta as-is
//! Float without a fraction     -> delta (must fit in i64)
//! String holding a base-10 i64 -> parsed delta (surrounding spaces ignored)
//! anything else                -> InvalidValueType
//! ```

use bkv_common::{BinName, DynamicValue, MarshalError, MarshalResult, OperationBatch};

use crate::encode::{check_capacity, BinKey};

// 2^63 as f64; floats at or beyond it do not fit in i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Builds one increment per entry, in iteration order.
///
/// # Errors
/// - `CapacityExceeded` when there are more entries than `capacity`.
/// - Key errors as for [`encode`](crate::encode::encode).
/// - `InvalidValueType` when a value is not integer-coercible.
pub fn build_increments<'a, K, I>(entries: I, capacity: usize) -> MarshalResult<OperationBatch>
where
    K: BinKey + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
{
    let entries: Vec<(&K, &DynamicValue)> = entries.into_iter().collect();
    check_capacity(entries.len(), capacity)?;

    let mut batch = OperationBatch::with_capacity(capacity);
    for (key, value) in entries {
        let name = key.to_bin_name()?;
        let delta = integer_delta(&name, value)?;
        batch.add_increment(name, delta)?;
    }
    Ok(batch)
}

fn integer_delta(name: &BinName, value: &DynamicValue) -> MarshalResult<i64> {
    let delta = match value {
        DynamicValue::Integer(number) => Some(*number),
        DynamicValue::Float(number) => float_to_i64(*number),
        DynamicValue::String(text) => text.trim().parse::<i64>().ok(),
        DynamicValue::Bool(_) | DynamicValue::List(_) | DynamicValue::Map(_) => None,
    };
    delta.ok_or_else(|| MarshalError::InvalidValueType {
        bin: name.to_string(),
        expected: "int",
        found: value.tag(),
    })
}

fn float_to_i64(number: f64) -> Option<i64> {
    if number.fract() == 0.0 && number >= -I64_BOUND && number < I64_BOUND {
        Some(number as i64)
    } else {
        None
    }
}
