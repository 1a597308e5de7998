//! Pivots a list of flat (already-dotted) records into per-key value columns.

use std::collections::{BTreeMap, BTreeSet};

use crate::value::Value;

/// A named column: all values of one flattened key across the batch, in row
/// order. Rectangular by construction — every column has `record_count` rows.
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Recomputes the union of flattened dotted keys across `flat_records`
/// (sorted, so it fixes column order on the wire) and backfills `Missing` for
/// any key absent from a given row.
pub fn pivot(flat_records: &[BTreeMap<String, Value>]) -> Vec<Column> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for record in flat_records {
        keys.extend(record.keys().map(String::as_str));
    }

    keys.into_iter()
        .map(|key| {
            let values = flat_records
                .iter()
                .map(|record| record.get(key).cloned().unwrap_or(Value::Missing))
                .collect();
            Column {
                name: key.to_string(),
                values,
            }
        })
        .collect()
}
