//! Portrait and geo-trace records
//!
//! Both open-data providers wrap their rows differently (`records` vs
//! `results`, optional `record` wrapper, optional nested `fields`).
//! [`normalize_envelope`] flattens every shape into one canonical
//! array of field maps before any record is built.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geo::{extract_coordinate, Coordinate};

/// Canonical flat record: field name → JSON value
pub type Fields = Map<String, Value>;

/// Envelope keys tried for the portrait dataset
pub const PORTRAIT_ENVELOPE_KEYS: &[&str] = &["records", "results"];

/// Envelope keys tried for the geo-trace dataset
pub const GEO_TRACE_ENVELOPE_KEYS: &[&str] = &["results", "records"];

/// Number of free-text description fields (`desc1`..`desc5`)
pub const DESCRIPTION_FIELDS: usize = 5;

/// Flatten a provider response into canonical records
///
/// Takes the first array found under `keys`, unwraps an optional `record`
/// object around each element and merges a nested `fields` object over the
/// element's own keys. Non-object elements are dropped.
pub fn normalize_envelope(body: &Value, keys: &[&str]) -> Vec<Fields> {
    let Some(rows) = keys
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
    else {
        return Vec::new();
    };

    rows.iter().filter_map(canonical_record).collect()
}

fn canonical_record(row: &Value) -> Option<Fields> {
    let record = match row.get("record") {
        Some(inner @ Value::Object(_)) => inner,
        _ => row,
    };
    let mut flat = record.as_object()?.clone();
    if let Some(Value::Object(fields)) = flat.remove("fields") {
        flat.extend(fields);
    }
    Some(flat)
}

/// Non-blank text value of a field; numbers are rendered as text
pub fn text_field(fields: &Fields, key: &str) -> Option<String> {
    text_value(fields.get(key)?)
}

fn text_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Text of `object.member`, where `object` may also be an array of objects
fn nested_text(fields: &Fields, object: &str, member: &str) -> Option<String> {
    let outer = match fields.get(object)? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    text_value(outer.as_object()?.get(member)?)
}

/// One way of reading an optional string out of a record
pub type FieldAccessor = fn(&Fields) -> Option<String>;

/// Portrait image sources in priority order
pub const PORTRAIT_IMAGE_ACCESSORS: [FieldAccessor; 5] =
    [photo_url, media_image, media_url, flat_image, flat_url];

/// Geo-trace image sources in priority order
pub const GEO_TRACE_IMAGE_ACCESSORS: [FieldAccessor; 2] = [flat_image, flat_photo];

/// Geo-trace name sources in priority order
const GEO_TRACE_NAME_ACCESSORS: [FieldAccessor; 2] = [flat_nom, flat_name];

fn photo_url(f: &Fields) -> Option<String> {
    nested_text(f, "photos", "url")
}

fn media_image(f: &Fields) -> Option<String> {
    nested_text(f, "media", "image")
}

fn media_url(f: &Fields) -> Option<String> {
    nested_text(f, "media", "url")
}

fn flat_image(f: &Fields) -> Option<String> {
    text_field(f, "image")
}

fn flat_url(f: &Fields) -> Option<String> {
    text_field(f, "url")
}

fn flat_photo(f: &Fields) -> Option<String> {
    text_field(f, "photo")
}

fn flat_nom(f: &Fields) -> Option<String> {
    text_field(f, "nom")
}

fn flat_name(f: &Fields) -> Option<String> {
    text_field(f, "name")
}

/// First accessor that yields a value
pub fn first_present(accessors: &[FieldAccessor], fields: &Fields) -> Option<String> {
    accessors.iter().find_map(|accessor| accessor(fields))
}

/// Biographical entity from the portraits dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortraitRecord {
    /// Join key; may be empty when the provider omits it
    pub name: String,
    /// Route / category label (`tab_name`)
    pub tab_name: Option<String>,
    /// Non-blank `desc1`..`desc5`, in field order
    pub descriptions: Vec<String>,
    /// Address-like text used for fallback geocoding (`short_desc`)
    pub short_description: Option<String>,
    pub image_url: Option<String>,
}

impl PortraitRecord {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            name: text_field(fields, "name").unwrap_or_default(),
            tab_name: text_field(fields, "tab_name"),
            descriptions: (1..=DESCRIPTION_FIELDS)
                .filter_map(|i| text_field(fields, &format!("desc{i}")))
                .collect(),
            short_description: text_field(fields, "short_desc"),
            image_url: first_present(&PORTRAIT_IMAGE_ACCESSORS, fields),
        }
    }

    /// Text handed to the geocoder when no geo-trace matches
    pub fn geocode_address(&self) -> Option<&str> {
        self.short_description
            .as_deref()
            .or_else(|| self.descriptions.first().map(String::as_str))
    }

    /// Lowercased name, label and descriptions joined by spaces
    pub fn search_haystack(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.tab_name.as_deref())
            .chain(self.descriptions.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Named waypoint from the geo-trace dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTraceRecord {
    pub name: String,
    /// Street address (`adresse`)
    pub address: Option<String>,
    pub tab_name: Option<String>,
    pub image_url: Option<String>,
    /// `None` when no known shape yields two numbers
    pub coordinate: Option<Coordinate>,
}

impl GeoTraceRecord {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            name: first_present(&GEO_TRACE_NAME_ACCESSORS, fields).unwrap_or_default(),
            address: text_field(fields, "adresse"),
            tab_name: text_field(fields, "tab_name"),
            image_url: first_present(&GEO_TRACE_IMAGE_ACCESSORS, fields),
            coordinate: extract_coordinate(fields),
        }
    }

    /// Has both a coordinate and a non-empty name
    pub fn is_mappable(&self) -> bool {
        self.coordinate.is_some() && !self.name.trim().is_empty()
    }
}

/// Parse a portraits response body
pub fn portraits_from_body(body: &Value) -> Vec<PortraitRecord> {
    normalize_envelope(body, PORTRAIT_ENVELOPE_KEYS)
        .iter()
        .map(PortraitRecord::from_fields)
        .collect()
}

/// Parse a geo-traces response body
pub fn geo_traces_from_body(body: &Value) -> Vec<GeoTraceRecord> {
    normalize_envelope(body, GEO_TRACE_ENVELOPE_KEYS)
        .iter()
        .map(GeoTraceRecord::from_fields)
        .collect()
}
