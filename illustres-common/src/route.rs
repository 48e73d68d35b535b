//! Walking route construction

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, Coordinate};

/// Ordered, deduplicated route coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    points: Vec<Coordinate>,
}

impl RoutePath {
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A line needs at least two points
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(&self.points)
    }
}

/// Build the route: optional start, then waypoints in order, exact duplicates dropped
pub fn build_route(start: Option<Coordinate>, ordered: &[Coordinate]) -> RoutePath {
    let mut seen = HashSet::new();
    let points = start
        .iter()
        .chain(ordered.iter())
        .filter(|c| seen.insert(c.literal_key()))
        .copied()
        .collect();
    RoutePath { points }
}
