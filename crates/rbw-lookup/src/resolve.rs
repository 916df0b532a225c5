//! Field resolution on decoded rbw records
//!
//! A requested field may live in three places on a record. They are tried in
//! a fixed order and the first hit wins:
//!
//! 1. the `fields` list of custom `{name, value}` pairs,
//! 2. the `data` mapping of built-in fields (`password`, `username`, ...),
//! 3. a top-level key of the record itself.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Where a field value was found on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    CustomField,
    Data,
    TopLevel,
}

impl Location {
    /// Lookup precedence, highest first
    pub const LOOKUP_ORDER: [Location; 3] =
        [Location::CustomField, Location::Data, Location::TopLevel];

    /// Look for `field` at this location only
    pub fn find<'a>(self, record: &'a Value, field: &str) -> Option<&'a Value> {
        match self {
            Location::CustomField => custom_field(record, field),
            Location::Data => data_field(record, field),
            Location::TopLevel => record.get(field),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Location::CustomField => "custom field",
            Location::Data => "data",
            Location::TopLevel => "top-level",
        }
    }
}

/// First custom field whose name matches, in list order
fn custom_field<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    record
        .get("fields")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(field))
        .map(|entry| entry.get("value").unwrap_or(&NULL))
}

fn data_field<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    record.get("data")?.get(field)
}

/// Resolve `field` on a single record, reporting where it was found
pub fn resolve_field<'a>(record: &'a Value, field: &str) -> Option<(Location, &'a Value)> {
    Location::LOOKUP_ORDER
        .iter()
        .find_map(|location| location.find(record, field).map(|value| (*location, value)))
}
