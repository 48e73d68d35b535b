//! Search resolver
//!
//! Turns a free-text query into exactly one outcome: a portrait match (exact
//! then fuzzy), a place found by geocoding, or a "not listed" message.
//!
//! Every resolution is stamped with a request token. When a network call
//! returns after a newer resolution was issued, its result is dropped and the
//! older request reports [`SearchOutcome::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use illustres_common::{Coordinate, PortraitRecord, Reconciler};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::geocoder::Geocoder;
use crate::presentation::{DetailPanel, PresentationState};

/// Shortest accepted query, in characters after trimming
pub const MIN_QUERY_CHARS: usize = 3;

/// Monotonic request counter; the last issued token is the current one
#[derive(Debug, Default)]
pub struct RequestTokens(AtomicU64);

impl RequestTokens {
    pub fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.0.load(Ordering::SeqCst) == token
    }
}

/// How a portrait matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Fuzzy,
}

/// Where a matched portrait ended up on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MatchLocation {
    /// Geo-trace counterpart marker
    GeoTrace { coordinate: Coordinate },
    /// Marker already placed by an earlier geocode
    ExistingMarker,
    /// Freshly geocoded from the portrait's address text
    Geocoded { coordinate: Coordinate },
    /// No location could be found; detail panel only
    Unresolved,
}

/// Result of one resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Query too short, nothing looked up
    Rejected,
    Matched {
        name: String,
        tier: MatchTier,
        location: MatchLocation,
    },
    /// No portrait matched; a place did
    Place { query: String, coordinate: Coordinate },
    /// Nothing matched at all
    NotFound,
    /// A newer request was issued while this one waited on the network
    Superseded,
}

/// Exact normalized name match, else first fuzzy match in collection order
pub fn find_match<'a>(
    reconciler: &'a Reconciler,
    query: &str,
) -> Option<(&'a PortraitRecord, MatchTier)> {
    if let Some(portrait) = reconciler.find_portrait_by_name(query) {
        return Some((portrait, MatchTier::Exact));
    }

    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    reconciler
        .portraits()
        .iter()
        .find(|p| p.search_haystack().contains(&needle))
        .map(|p| (p, MatchTier::Fuzzy))
}

/// Search and sidebar-activation logic over the shared presentation state
pub struct SearchResolver {
    reconciler: Arc<Reconciler>,
    geocoder: Arc<dyn Geocoder>,
    state: Arc<Mutex<PresentationState>>,
    tokens: RequestTokens,
    focus_zoom: u8,
    place_zoom: u8,
}

impl SearchResolver {
    pub fn new(
        reconciler: Arc<Reconciler>,
        geocoder: Arc<dyn Geocoder>,
        state: Arc<Mutex<PresentationState>>,
        focus_zoom: u8,
        place_zoom: u8,
    ) -> Self {
        Self {
            reconciler,
            geocoder,
            state,
            tokens: RequestTokens::default(),
            focus_zoom,
            place_zoom,
        }
    }

    pub async fn resolve(&self, query: &str) -> SearchOutcome {
        let token = self.tokens.issue();
        let query = query.trim();

        if query.chars().count() < MIN_QUERY_CHARS {
            debug!(query = %query, "Query too short");
            self.state.lock().await.show_message(DetailPanel::QueryTooShort);
            return SearchOutcome::Rejected;
        }

        if let Some((portrait, tier)) = find_match(&self.reconciler, query) {
            info!(query = %query, name = %portrait.name, ?tier, "Portrait matched");
            return match self.locate(token, portrait).await {
                Some(location) => SearchOutcome::Matched {
                    name: portrait.name.clone(),
                    tier,
                    location,
                },
                None => SearchOutcome::Superseded,
            };
        }

        let place = self.geocoder.search_place(query).await;
        if !self.tokens.is_current(token) {
            debug!(query = %query, "Discarding stale place result");
            return SearchOutcome::Superseded;
        }

        let mut state = self.state.lock().await;
        match place {
            Some(coordinate) => {
                state.show_place(query, coordinate, self.place_zoom);
                SearchOutcome::Place {
                    query: query.to_string(),
                    coordinate,
                }
            }
            None => {
                info!(query = %query, "No portrait or place matched");
                state.show_message(DetailPanel::NotListed);
                SearchOutcome::NotFound
            }
        }
    }

    /// Sidebar click on a portrait entry
    pub async fn activate_entry(&self, name: &str) -> SearchOutcome {
        let token = self.tokens.issue();

        let Some(portrait) = self.reconciler.find_portrait_by_name(name) else {
            self.state.lock().await.show_detail(&self.reconciler, name);
            return SearchOutcome::NotFound;
        };

        match self.locate(token, portrait).await {
            Some(location) => SearchOutcome::Matched {
                name: portrait.name.clone(),
                tier: MatchTier::Exact,
                location,
            },
            None => SearchOutcome::Superseded,
        }
    }

    /// Detail panel plus map focus for a matched portrait
    ///
    /// Returns `None` when the geocode result went stale.
    async fn locate(&self, token: u64, portrait: &PortraitRecord) -> Option<MatchLocation> {
        let unnamed = portrait.name.trim().is_empty();
        {
            let mut state = self.state.lock().await;
            state.show_portrait(portrait);

            if let Some(coordinate) = self.reconciler.geo_coordinate_for(&portrait.name) {
                if !state.focus_marker(&portrait.name, self.focus_zoom) {
                    state.focus(coordinate, self.focus_zoom);
                }
                return Some(MatchLocation::GeoTrace { coordinate });
            }

            if state.focus_marker(&portrait.name, self.focus_zoom) {
                return Some(MatchLocation::ExistingMarker);
            }
        }

        let Some(address) = portrait.geocode_address() else {
            debug!(name = %portrait.name, "No address text to geocode");
            return Some(MatchLocation::Unresolved);
        };

        let found = self.geocoder.resolve_address(address).await;
        if !self.tokens.is_current(token) {
            debug!(name = %portrait.name, "Discarding stale geocode result");
            return None;
        }

        let Some(coordinate) = found else {
            return Some(MatchLocation::Unresolved);
        };

        let mut state = self.state.lock().await;
        if unnamed {
            // No identity key to hold a marker: pan only
            state.focus(coordinate, self.focus_zoom);
        } else {
            state.install_geocoded_marker(portrait, address, coordinate);
            state.focus_marker(&portrait.name, self.focus_zoom);
        }
        Some(MatchLocation::Geocoded { coordinate })
    }
}
