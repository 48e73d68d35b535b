//! Coordinates and coordinate extraction
//!
//! The two open-data providers encode positions in several shapes. Extraction
//! runs an ordered list of strategies over a canonical record (see
//! [`crate::records::normalize_envelope`]) and stops at the first one that
//! yields two finite numbers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::Fields;

/// Default route start and map center (parvis of the Hôtel de Ville area)
pub const DEFAULT_START: Coordinate = Coordinate {
    lat: 48.8566,
    lon: 2.3522,
};

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite components
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Six-decimal display form, e.g. `48.856600, 2.352200`
    pub fn display_fixed(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lon)
    }

    /// Exact identity of the literal pair (used for route deduplication)
    pub(crate) fn literal_key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every point, `None` for an empty slice
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let init = Bounds {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        Some(points[1..].iter().fold(init, |b, p| Bounds {
            south: b.south.min(p.lat),
            west: b.west.min(p.lon),
            north: b.north.max(p.lat),
            east: b.east.max(p.lon),
        }))
    }
}

/// One way of reading a coordinate out of a record
pub type CoordinateStrategy = fn(&Fields) -> Option<Coordinate>;

/// Strategies in priority order
pub const COORDINATE_STRATEGIES: [CoordinateStrategy; 3] =
    [geo_point_object, geo_point_pair, coordinates_pair];

/// Extract a coordinate from a canonical record, first strategy wins
pub fn extract_coordinate(fields: &Fields) -> Option<Coordinate> {
    COORDINATE_STRATEGIES.iter().find_map(|strategy| strategy(fields))
}

/// `geo_point_2d: { "lat": .., "lon": .. }`
fn geo_point_object(fields: &Fields) -> Option<Coordinate> {
    let point = fields.get("geo_point_2d")?.as_object()?;
    Coordinate::new(number(point.get("lat")?)?, number(point.get("lon")?)?)
}

/// `geo_point_2d: [lat, lon]`
fn geo_point_pair(fields: &Fields) -> Option<Coordinate> {
    let (lat, lon) = leading_pair(fields.get("geo_point_2d")?)?;
    Coordinate::new(lat, lon)
}

/// `coordinates: [a, b]` in either (lat, lon) or (lon, lat) order
fn coordinates_pair(fields: &Fields) -> Option<Coordinate> {
    let (a, b) = leading_pair(fields.get("coordinates")?)?;
    if (-90.0..=90.0).contains(&a) {
        Coordinate::new(a, b)
    } else {
        Coordinate::new(b, a)
    }
}

fn leading_pair(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [a, b, ..] => Some((number(a)?, number(b)?)),
        _ => None,
    }
}

/// JSON number, or a string holding one
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
