//! Price table remapper.
//!
//! The price section arrives as a flat, alternating label/value cell
//! sequence. Labels the vendor is known to use are renamed to canonical
//! field names; anything else passes through under its original label.

use crate::models::FieldMap;

/// Canonical name of the waiting-time field after renaming.
const WAITING_TIME: &str = "waiting_time";

/// Turn an alternating label/value cell sequence into a field map.
///
/// Even positions are labels, odd positions their values; a trailing
/// unpaired label is dropped. The waiting-time cell is a composite
/// `"<minutes> Min <price>"`; only the price substring past
/// `waiting_time_offset` characters is kept.
pub fn remap_table(
    cells: &[String],
    renames: &[(String, String)],
    waiting_time_offset: usize,
) -> FieldMap {
    let mut fields = FieldMap::new();
    for pair in cells.chunks_exact(2) {
        fields.insert(pair[0].clone(), Some(pair[1].clone()));
    }

    for (from, to) in renames {
        if let Some(value) = fields.remove(from) {
            fields.insert(to.clone(), value);
        }
    }

    let price = match fields.get(WAITING_TIME) {
        Some(Some(raw)) => Some(raw.chars().skip(waiting_time_offset).collect::<String>()),
        _ => None,
    };
    if let Some(price) = price {
        fields.insert(WAITING_TIME.to_string(), Some(price));
    }

    fields
}
