//! # Record Decoder
//!
//! Purpose: Rebuild a `DynamicMapping` from a record returned by a store.
//!
//! ## Notes
//! - Integer, Double, String and List bins are mapped. Every other bin type is
//!   left out of the result without failing the decode.
//! - List elements come back as strings whatever their stored type, so
//!   `[1, 2, 3]` decodes to `["1", "2", "3"]`.

use tracing::trace;

use bkv_common::{BinValue, DynamicMapping, DynamicValue, StructuredRecord};

/// Decodes every bin with a mapped type, in record order.
pub fn decode(record: &StructuredRecord) -> DynamicMapping {
    let mut mapping = DynamicMapping::with_capacity(record.len());
    for bin in record {
        match decode_value(&bin.value) {
            Some(value) => {
                mapping.insert(bin.name.as_str(), value);
            }
            None => trace!(
                bin = bin.name.as_str(),
                bin_type = %bin.value.tag(),
                "skipping bin of unmapped type"
            ),
        }
    }
    mapping
}

/// Converts one bin value, or `None` when its type is not mapped.
pub fn decode_value(value: &BinValue) -> Option<DynamicValue> {
    match value {
        BinValue::Integer(number) => Some(DynamicValue::Integer(*number)),
        BinValue::Double(number) => Some(DynamicValue::Float(*number)),
        BinValue::String(text) => Some(DynamicValue::String(text.clone())),
        BinValue::List(items) => Some(DynamicValue::List(
            items
                .iter()
                .map(|item| DynamicValue::String(item.to_string()))
                .collect(),
        )),
        BinValue::Nil
        | BinValue::Bool(_)
        | BinValue::Map(_)
        | BinValue::Bytes(_)
        | BinValue::GeoJson(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkv_common::BinName;

    fn record(bins: Vec<(&str, BinValue)>) -> StructuredRecord {
        let mut record = StructuredRecord::with_capacity(bins.len());
        for (name, value) in bins {
            record.set(BinName::new(name).unwrap(), value).unwrap();
        }
        record
    }

    #[test]
    fn decodes_mapped_types() {
        let record = record(vec![
            ("int", BinValue::Integer(-4)),
            ("dbl", BinValue::Double(2.5)),
            ("str", BinValue::String("hi".into())),
        ]);

        let mapping = decode(&record);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get("int"), Some(&DynamicValue::Integer(-4)));
        assert_eq!(mapping.get("dbl"), Some(&DynamicValue::Float(2.5)));
        assert_eq!(mapping.get("str"), Some(&DynamicValue::from("hi")));
    }

    #[test]
    fn list_elements_become_strings() {
        let record = record(vec![(
            "mixed",
            BinValue::List(vec![
                BinValue::Integer(1),
                BinValue::Double(0.5),
                BinValue::String("x".into()),
                BinValue::List(vec![BinValue::Integer(2)]),
            ]),
        )]);

        let mapping = decode(&record);
        assert_eq!(
            mapping.get("mixed"),
            Some(&DynamicValue::list(vec!["1", "0.5", "x", "[2]"]))
        );
    }

    #[test]
    fn unmapped_types_are_skipped() {
        let record = record(vec![
            ("count", BinValue::Integer(1)),
            ("blob", BinValue::Bytes(vec![1, 2])),
            ("flag", BinValue::Bool(true)),
            ("props", BinValue::Map(Vec::new())),
            ("geo", BinValue::GeoJson("{}".into())),
            ("none", BinValue::Nil),
        ]);

        let mapping = decode(&record);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("count"), Some(&DynamicValue::Integer(1)));
    }

    #[test]
    fn preserves_record_order() {
        let record = record(vec![
            ("b", BinValue::Integer(1)),
            ("a", BinValue::Integer(2)),
        ]);
        let keys: Vec<String> = decode(&record).keys().map(str::to_string).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
