//! Name-based reconciliation of portraits and geo-traces
//!
//! Normalized name equality is the only join key. Fuzzy matching belongs to
//! search, never to the join.

use crate::records::{GeoTraceRecord, PortraitRecord};

/// Identity key shared by markers, sidebar entries and lookups
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Read-side index over the two immutable collections
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    portraits: Vec<PortraitRecord>,
    geo_traces: Vec<GeoTraceRecord>,
}

impl Reconciler {
    pub fn new(portraits: Vec<PortraitRecord>, geo_traces: Vec<GeoTraceRecord>) -> Self {
        Self {
            portraits,
            geo_traces,
        }
    }

    pub fn portraits(&self) -> &[PortraitRecord] {
        &self.portraits
    }

    pub fn geo_traces(&self) -> &[GeoTraceRecord] {
        &self.geo_traces
    }

    /// First portrait whose normalized name equals `name`'s
    pub fn find_portrait_by_name(&self, name: &str) -> Option<&PortraitRecord> {
        let key = lookup_key(name)?;
        self.portraits
            .iter()
            .find(|p| normalize_name(&p.name) == key)
    }

    /// First geo-trace whose normalized name equals `name`'s
    pub fn find_geo_by_name(&self, name: &str) -> Option<&GeoTraceRecord> {
        let key = lookup_key(name)?;
        self.geo_traces
            .iter()
            .find(|g| normalize_name(&g.name) == key)
    }

    /// Coordinate of the geo-trace counterpart, if it has one
    pub fn geo_coordinate_for(&self, name: &str) -> Option<crate::Coordinate> {
        self.find_geo_by_name(name)?.coordinate
    }
}

/// Blank names never take part in a join
fn lookup_key(name: &str) -> Option<String> {
    let key = normalize_name(name);
    (!key.is_empty()).then_some(key)
}
