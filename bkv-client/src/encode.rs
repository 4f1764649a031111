//! # Record Encoder
//!
//! Purpose: Turn dynamic key/value entries into a capacity-checked
//! `StructuredRecord`.
//!
//! ## Design Principles
//! 1. **Check Before Work**: Entry count is compared with the declared
//!    capacity before any bin is built.
//! 2. **Tag Dispatch**: Value conversion is one exhaustive `match` on the
//!    dynamic tag.
//! 3. **One Level Deep**: Lists and tables are unwrapped once; nested
//!    structure is stored as its string form.
//!
//! ## Value Mapping
//!
//! ```text
//! Integer  -> Integer bin
//! Float    -> Integer bin (truncated toward zero)
//! String   -> String bin
//! List     -> List bin of element strings
//! Map      -> List bin of value strings (keys dropped)
//! Bool     -> InvalidValueType
//! ```

use bkv_common::{
    BinName, BinValue, DynamicValue, MarshalError, MarshalResult, StructuredRecord,
};

/// Keys that can be coerced into a bin name.
pub trait BinKey {
    /// Coerces the key into a validated bin name.
    fn to_bin_name(&self) -> MarshalResult<BinName>;
}

impl BinKey for str {
    fn to_bin_name(&self) -> MarshalResult<BinName> {
        BinName::new(self)
    }
}

impl BinKey for String {
    fn to_bin_name(&self) -> MarshalResult<BinName> {
        BinName::new(self.as_str())
    }
}

impl BinKey for BinName {
    fn to_bin_name(&self) -> MarshalResult<BinName> {
        Ok(self.clone())
    }
}

/// Numeric keys use their string form, as scripting hosts do for table keys.
impl BinKey for DynamicValue {
    fn to_bin_name(&self) -> MarshalResult<BinName> {
        match self {
            DynamicValue::String(name) => BinName::new(name.as_str()),
            DynamicValue::Integer(_) | DynamicValue::Float(_) => BinName::new(self.to_string()),
            DynamicValue::Bool(_) | DynamicValue::List(_) | DynamicValue::Map(_) => {
                Err(MarshalError::InvalidKeyType { found: self.tag() })
            }
        }
    }
}

impl<T: BinKey + ?Sized> BinKey for &T {
    fn to_bin_name(&self) -> MarshalResult<BinName> {
        (**self).to_bin_name()
    }
}

/// Encodes entries into a record that declares `capacity` bins.
///
/// Later entries with an already-seen bin name replace the earlier value.
///
/// # Errors
/// - `CapacityExceeded` when there are more entries than `capacity`.
/// - `InvalidKeyType`, `EmptyBinName`, `BinNameTooLong` for unusable keys.
/// - `InvalidValueType` for values no bin type accepts.
///
/// # Examples
/// ```rust
/// use bkv_client::encode;
/// use bkv_common::{BinValue, DynamicMapping};
///
/// let mut bins = DynamicMapping::new();
/// bins.insert("name", "felix");
/// bins.insert("age", 4);
///
/// let record = encode(&bins, 2).expect("fits");
/// assert_eq!(record.get("age"), Some(&BinValue::Integer(4)));
/// ```
pub fn encode<'a, K, I>(entries: I, capacity: usize) -> MarshalResult<StructuredRecord>
where
    K: BinKey + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a DynamicValue)>,
{
    let entries: Vec<(&K, &DynamicValue)> = entries.into_iter().collect();
    check_capacity(entries.len(), capacity)?;

    let mut record = StructuredRecord::with_capacity(capacity);
    for (key, value) in entries {
        let name = key.to_bin_name()?;
        let bin = encode_value(&name, value)?;
        record.set(name, bin)?;
    }
    Ok(record)
}

/// Encodes a raw scripting table given as key/value pairs.
pub fn encode_table(
    table: &[(DynamicValue, DynamicValue)],
    capacity: usize,
) -> MarshalResult<StructuredRecord> {
    encode(table.iter().map(|(key, value)| (key, value)), capacity)
}

/// Converts one dynamic value into the bin value stored under `name`.
pub fn encode_value(name: &BinName, value: &DynamicValue) -> MarshalResult<BinValue> {
    match value {
        DynamicValue::Integer(number) => Ok(BinValue::Integer(*number)),
        // Saturating float-to-int cast; NaN becomes 0.
        DynamicValue::Float(number) => Ok(BinValue::Integer(*number as i64)),
        DynamicValue::String(text) => Ok(BinValue::String(text.clone())),
        DynamicValue::List(items) => Ok(BinValue::List(
            items.iter().map(element_string).collect(),
        )),
        DynamicValue::Map(pairs) => Ok(BinValue::List(
            pairs.iter().map(|(_, item)| element_string(item)).collect(),
        )),
        DynamicValue::Bool(_) => Err(MarshalError::InvalidValueType {
            bin: name.to_string(),
            expected: "int, float, string, list or map",
            found: value.tag(),
        }),
    }
}

fn element_string(item: &DynamicValue) -> BinValue {
    BinValue::String(item.to_string())
}

pub(crate) fn check_capacity(requested: usize, capacity: usize) -> MarshalResult<()> {
    if requested > capacity {
        return Err(MarshalError::CapacityExceeded {
            capacity,
            requested,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkv_common::{DynamicMapping, ValueTag};

    fn strings(items: &[&str]) -> BinValue {
        BinValue::List(items.iter().map(|item| BinValue::String(item.to_string())).collect())
    }

    #[test]
    fn encodes_scalars() {
        let mut bins = DynamicMapping::new();
        bins.insert("count", 7);
        bins.insert("name", "rex");

        let record = encode(&bins, 2).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.capacity(), 2);
        assert_eq!(record.get("count"), Some(&BinValue::Integer(7)));
        assert_eq!(record.get("name"), Some(&BinValue::String("rex".into())));
    }

    #[test]
    fn floats_collapse_to_integers() {
        let mut bins = DynamicMapping::new();
        bins.insert("up", 2.9);
        bins.insert("down", -2.9);
        bins.insert("huge", 1e300);

        let record = encode(&bins, 3).unwrap();
        assert_eq!(record.get("up"), Some(&BinValue::Integer(2)));
        assert_eq!(record.get("down"), Some(&BinValue::Integer(-2)));
        assert_eq!(record.get("huge"), Some(&BinValue::Integer(i64::MAX)));
    }

    #[test]
    fn lists_become_string_lists() {
        let mut bins = DynamicMapping::new();
        bins.insert("nums", vec![1, 2, 3]);
        bins.insert(
            "mixed",
            DynamicValue::List(vec![
                DynamicValue::from(1.5),
                DynamicValue::from(true),
                DynamicValue::from(vec!["a", "b"]),
            ]),
        );

        let record = encode(&bins, 2).unwrap();
        assert_eq!(record.get("nums"), Some(&strings(&["1", "2", "3"])));
        assert_eq!(record.get("mixed"), Some(&strings(&["1.5", "true", "[a, b]"])));
    }

    #[test]
    fn tables_keep_values_only() {
        let table = DynamicValue::Map(vec![
            (DynamicValue::from("first"), DynamicValue::from("cat")),
            (DynamicValue::from("second"), DynamicValue::from(2)),
        ]);
        let mut bins = DynamicMapping::new();
        bins.insert("pets", table);

        let record = encode(&bins, 1).unwrap();
        assert_eq!(record.get("pets"), Some(&strings(&["cat", "2"])));
    }

    #[test]
    fn capacity_is_checked_up_front() {
        let bins: DynamicMapping = vec![("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(
            encode(&bins, 2).unwrap_err(),
            MarshalError::CapacityExceeded {
                capacity: 2,
                requested: 3
            }
        );
        assert_eq!(encode(&bins, 3).unwrap().len(), 3);
    }

    #[test]
    fn empty_mapping_encodes_to_empty_record() {
        let record = encode(&DynamicMapping::new(), 0).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn booleans_are_rejected() {
        let mut bins = DynamicMapping::new();
        bins.insert("flag", true);
        assert_eq!(
            encode(&bins, 1).unwrap_err(),
            MarshalError::InvalidValueType {
                bin: "flag".into(),
                expected: "int, float, string, list or map",
                found: ValueTag::Bool,
            }
        );
    }

    #[test]
    fn table_keys_are_coerced() {
        let table = vec![
            (DynamicValue::from(1), DynamicValue::from("first")),
            (DynamicValue::from(2.5), DynamicValue::from("second")),
            (DynamicValue::from("name"), DynamicValue::from("third")),
        ];
        let record = encode_table(&table, 3).unwrap();
        assert_eq!(record.get("1"), Some(&BinValue::String("first".into())));
        assert_eq!(record.get("2.5"), Some(&BinValue::String("second".into())));
        assert_eq!(record.get("name"), Some(&BinValue::String("third".into())));
    }

    #[test]
    fn large_float_keys_fit_a_bin_name() {
        let table = vec![(DynamicValue::from(1e21), DynamicValue::from(1))];
        let record = encode_table(&table, 1).unwrap();
        assert_eq!(record.get("1e21"), Some(&BinValue::Integer(1)));
    }

    #[test]
    fn non_scalar_keys_are_rejected() {
        let table = vec![(DynamicValue::from(vec![1]), DynamicValue::from(1))];
        assert_eq!(
            encode_table(&table, 1).unwrap_err(),
            MarshalError::InvalidKeyType {
                found: ValueTag::List
            }
        );

        let table = vec![(DynamicValue::from(false), DynamicValue::from(1))];
        assert!(matches!(
            encode_table(&table, 1),
            Err(MarshalError::InvalidKeyType { found: ValueTag::Bool })
        ));
    }

    #[test]
    fn bin_names_are_validated() {
        let mut bins = DynamicMapping::new();
        bins.insert("this_name_is_too_long", 1);
        assert_eq!(
            encode(&bins, 1).unwrap_err(),
            MarshalError::BinNameTooLong { len: 21 }
        );

        let mut bins = DynamicMapping::new();
        bins.insert("", 1);
        assert_eq!(encode(&bins, 1).unwrap_err(), MarshalError::EmptyBinName);
    }

    #[test]
    fn duplicate_table_keys_replace() {
        let table = vec![
            (DynamicValue::from(1), DynamicValue::from("a")),
            (DynamicValue::from("1"), DynamicValue::from("b")),
        ];
        let record = encode_table(&table, 2).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("1"), Some(&BinValue::String("b".into())));
    }
}
