//! Presentation state
//!
//! Owns everything the user sees: the map view and its marker / route
//! handles, the sidebar list, the highlighted entry and the detail panel.
//! Markers and sidebar entries share one identity key, the normalized name.
//!
//! Sidebar presence follows the portrait collection; marker presence follows
//! the geo-trace collection plus fallback geocoding. The two may disagree and
//! every operation tolerates it.

use std::collections::HashMap;

use illustres_common::{
    build_route, normalize_name, Coordinate, GeoTraceRecord, PortraitRecord, Reconciler,
    RoutePath,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::view::{MapView, MarkerIcon, MarkerId, MarkerSpec, PolylineId, PolylineStyle, PopupContent};

/// Sidebar label for a portrait without a name
pub const UNNAMED_LABEL: &str = "(sans nom)";

/// GPS line for entries without a mapped location
pub const GPS_UNKNOWN: &str = "GPS: —";

/// Margin kept around the route when framing it
pub const ROUTE_PADDING_PX: u32 = 40;

const TRACE_ICON_PX: u32 = 50;
const GEOCODED_ICON_PX: u32 = 45;

/// One sidebar line per portrait
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarEntry {
    pub key: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub tab_name: Option<String>,
    /// Coordinate of the geo-trace counterpart
    pub coordinate: Option<Coordinate>,
    pub gps_line: String,
    pub highlighted: bool,
}

impl SidebarEntry {
    fn for_portrait(portrait: &PortraitRecord, reconciler: &Reconciler) -> Self {
        let name = display_name(portrait);
        let coordinate = reconciler
            .find_geo_by_name(&portrait.name)
            .filter(|g| g.is_mappable())
            .and_then(|g| g.coordinate);
        let gps_line = match &coordinate {
            Some(c) => format!("GPS: {}", c.display_fixed()),
            None => GPS_UNKNOWN.to_string(),
        };

        Self {
            key: normalize_name(&name),
            name,
            thumbnail_url: portrait.image_url.clone(),
            tab_name: portrait.tab_name.clone(),
            coordinate,
            gps_line,
            highlighted: false,
        }
    }
}

/// Name as listed in the sidebar; blank names get a placeholder
fn display_name(portrait: &PortraitRecord) -> String {
    if portrait.name.trim().is_empty() {
        UNNAMED_LABEL.to_string()
    } else {
        portrait.name.clone()
    }
}

/// Biographical content shown in the detail panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortraitDetail {
    pub name: String,
    pub image_url: Option<String>,
    pub tab_name: Option<String>,
    pub descriptions: Vec<String>,
    /// Present when opened from a marker
    pub coordinate: Option<Coordinate>,
}

/// Detail panel contents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailPanel {
    Empty,
    Portrait(PortraitDetail),
    /// Requested portrait does not exist
    NoData,
    /// Search query under the minimum length
    QueryTooShort,
    /// Place search fallback succeeded
    PlaceFound { query: String },
    /// Nothing matched at all
    NotListed,
}

impl DetailPanel {
    /// Informational text for non-portrait panels
    pub fn message(&self) -> Option<String> {
        match self {
            DetailPanel::Empty | DetailPanel::Portrait(_) => None,
            DetailPanel::NoData => Some("Aucune donnée portrait.".to_string()),
            DetailPanel::QueryTooShort => Some("Tape au moins 3 lettres.".to_string()),
            DetailPanel::PlaceFound { query } => {
                Some(format!("Localisation trouvée pour : {}", query))
            }
            DetailPanel::NotListed => {
                Some("Cette personne ne fait pas encore partie de la liste".to_string())
            }
        }
    }
}

/// Why a marker exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerOrigin {
    GeoTrace,
    Geocoded,
}

#[derive(Debug, Clone, Copy)]
struct MarkerEntry {
    id: MarkerId,
    coordinate: Coordinate,
    origin: MarkerOrigin,
}

/// Marker as reported in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSummary {
    pub key: String,
    pub coordinate: Coordinate,
    pub origin: MarkerOrigin,
}

/// Serializable copy of the presentation state
#[derive(Debug, Clone, Serialize)]
pub struct PresentationSnapshot {
    pub sidebar: Vec<SidebarEntry>,
    pub selected: Option<String>,
    pub detail: DetailPanel,
    pub detail_message: Option<String>,
    pub markers: Vec<MarkerSummary>,
    pub place_marker: Option<Coordinate>,
    pub route: RoutePath,
    pub route_drawn: bool,
}

/// Map, sidebar and detail-panel state keyed by normalized name
pub struct PresentationState {
    view: Box<dyn MapView>,
    markers: HashMap<String, MarkerEntry>,
    place_marker: Option<(MarkerId, Coordinate)>,
    route: Option<PolylineId>,
    route_path: RoutePath,
    sidebar: Vec<SidebarEntry>,
    detail: DetailPanel,
}

impl PresentationState {
    pub fn new(view: Box<dyn MapView>) -> Self {
        Self {
            view,
            markers: HashMap::new(),
            place_marker: None,
            route: None,
            route_path: RoutePath::default(),
            sidebar: Vec::new(),
            detail: DetailPanel::Empty,
        }
    }

    pub fn init_view(&mut self, center: Coordinate, zoom: u8) {
        self.view.set_view(center, zoom);
    }

    /// Full re-render from the geo-trace collection
    ///
    /// Replaces every marker, redraws the route in geo-trace order (starting
    /// at the first waypoint, or `default_start` when there is none) and
    /// rebuilds the sidebar from all portraits.
    pub fn render_entities(
        &mut self,
        geo_results: &[GeoTraceRecord],
        reconciler: &Reconciler,
        default_start: Coordinate,
    ) {
        self.remove_all_markers();

        let mut waypoints = Vec::new();
        for trace in geo_results.iter().filter(|t| t.is_mappable()) {
            let Some(coordinate) = trace.coordinate else {
                continue;
            };
            waypoints.push(coordinate);

            // First trace of a name owns its marker, as in the reconciler
            let key = normalize_name(&trace.name);
            if self.markers.contains_key(&key) {
                debug!(name = %trace.name, "Duplicate geo-trace name, keeping first marker");
                continue;
            }

            let portrait = reconciler.find_portrait_by_name(&trace.name);
            let image_url = portrait
                .and_then(|p| p.image_url.clone())
                .or_else(|| trace.image_url.clone());

            let spec = MarkerSpec {
                label: trace.name.clone(),
                coordinate,
                icon: Some(MarkerIcon::photo(image_url.clone(), TRACE_ICON_PX)),
                popup: PopupContent {
                    title: trace.name.clone(),
                    image_url,
                    address: trace.address.clone(),
                    descriptions: portrait.map(|p| p.descriptions.clone()).unwrap_or_default(),
                },
            };
            self.install_marker(key, spec, MarkerOrigin::GeoTrace);
        }

        let start = waypoints.first().copied().unwrap_or(default_start);
        self.draw_route(build_route(Some(start), &waypoints));
        self.rebuild_sidebar(reconciler);

        info!(
            markers = self.markers.len(),
            route_points = self.route_path.len(),
            sidebar = self.sidebar.len(),
            "Rendered entities"
        );
    }

    /// Replace the route line; a path under two points leaves no line
    fn draw_route(&mut self, path: RoutePath) {
        if let Some(old) = self.route.take() {
            self.view.remove_polyline(old);
        }
        if path.is_drawable() {
            self.route = Some(self.view.add_polyline(path.points(), &PolylineStyle::route()));
            if let Some(bounds) = path.bounds() {
                self.view.fit_bounds(bounds, ROUTE_PADDING_PX);
            }
        }
        self.route_path = path;
    }

    /// One entry per portrait, whether or not it is mapped
    fn rebuild_sidebar(&mut self, reconciler: &Reconciler) {
        let selected = self.selected().map(str::to_string);
        self.sidebar = reconciler
            .portraits()
            .iter()
            .map(|p| SidebarEntry::for_portrait(p, reconciler))
            .collect();
        if let Some(key) = selected {
            self.select(&key);
        }
    }

    /// Highlight the entry for `name`; no-op when there is none
    pub fn select(&mut self, name: &str) -> bool {
        let key = normalize_name(name);
        if !self.sidebar.iter().any(|e| e.key == key) {
            debug!(name = %name, "No sidebar entry to highlight");
            return false;
        }
        for entry in &mut self.sidebar {
            entry.highlighted = entry.key == key;
        }
        true
    }

    /// Detail panel for a portrait, or the explicit "no data" panel
    pub fn show_detail(&mut self, reconciler: &Reconciler, name: &str) -> bool {
        let Some(portrait) = reconciler.find_portrait_by_name(name) else {
            self.detail = DetailPanel::NoData;
            return false;
        };
        self.show_portrait(portrait);
        true
    }

    /// Detail panel straight from a record, highlighting its sidebar entry
    pub fn show_portrait(&mut self, portrait: &PortraitRecord) {
        self.detail = DetailPanel::Portrait(PortraitDetail {
            name: portrait.name.clone(),
            image_url: portrait.image_url.clone(),
            tab_name: portrait.tab_name.clone(),
            descriptions: portrait.descriptions.clone(),
            coordinate: None,
        });
        self.select(&display_name(portrait));
    }

    /// Marker click: detail with coordinate, highlight, popup
    pub fn activate_marker(&mut self, reconciler: &Reconciler, name: &str) -> bool {
        let key = normalize_name(name);
        let Some(entry) = self.markers.get(&key).copied() else {
            return false;
        };

        let portrait = reconciler.find_portrait_by_name(name);
        let trace = reconciler.find_geo_by_name(name);
        let display_name = portrait
            .map(|p| p.name.clone())
            .or_else(|| trace.map(|t| t.name.clone()))
            .unwrap_or_else(|| name.trim().to_string());

        self.detail = DetailPanel::Portrait(PortraitDetail {
            name: display_name.clone(),
            image_url: portrait
                .and_then(|p| p.image_url.clone())
                .or_else(|| trace.and_then(|t| t.image_url.clone())),
            tab_name: portrait
                .and_then(|p| p.tab_name.clone())
                .or_else(|| trace.and_then(|t| t.tab_name.clone())),
            descriptions: portrait.map(|p| p.descriptions.clone()).unwrap_or_default(),
            coordinate: Some(entry.coordinate),
        });
        self.select(&display_name);
        self.view.open_popup(entry.id);
        true
    }

    /// Pan to the entity's marker and open its popup
    pub fn focus_marker(&mut self, name: &str, zoom: u8) -> bool {
        let Some(entry) = self.markers.get(&normalize_name(name)).copied() else {
            return false;
        };
        self.view.set_view(entry.coordinate, zoom);
        self.view.open_popup(entry.id);
        true
    }

    /// Pan without touching markers
    pub fn focus(&mut self, coordinate: Coordinate, zoom: u8) {
        self.view.set_view(coordinate, zoom);
    }

    /// Marker for a portrait located by fallback geocoding
    pub fn install_geocoded_marker(
        &mut self,
        portrait: &PortraitRecord,
        address: &str,
        coordinate: Coordinate,
    ) -> MarkerId {
        let spec = MarkerSpec {
            label: portrait.name.clone(),
            coordinate,
            icon: Some(MarkerIcon::photo(portrait.image_url.clone(), GEOCODED_ICON_PX)),
            popup: PopupContent {
                title: portrait.name.clone(),
                address: Some(address.to_string()),
                ..Default::default()
            },
        };
        self.install_marker(normalize_name(&portrait.name), spec, MarkerOrigin::Geocoded)
    }

    /// Plain marker for a place-search hit; replaces the previous one
    pub fn show_place(&mut self, query: &str, coordinate: Coordinate, zoom: u8) {
        if let Some((old, _)) = self.place_marker.take() {
            self.view.remove_marker(old);
        }
        self.view.set_view(coordinate, zoom);
        let id = self.view.add_marker(MarkerSpec {
            label: query.to_string(),
            coordinate,
            icon: None,
            popup: PopupContent {
                title: query.to_string(),
                ..Default::default()
            },
        });
        self.view.open_popup(id);
        self.place_marker = Some((id, coordinate));
        self.detail = DetailPanel::PlaceFound {
            query: query.to_string(),
        };
    }

    pub fn show_message(&mut self, panel: DetailPanel) {
        self.detail = panel;
    }

    /// Remove every marker and the route
    pub fn clear(&mut self) {
        self.remove_all_markers();
        if let Some((id, _)) = self.place_marker.take() {
            self.view.remove_marker(id);
        }
        self.draw_route(RoutePath::default());
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.contains_key(&normalize_name(name))
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn sidebar(&self) -> &[SidebarEntry] {
        &self.sidebar
    }

    pub fn selected(&self) -> Option<&str> {
        self.sidebar
            .iter()
            .find(|e| e.highlighted)
            .map(|e| e.key.as_str())
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    pub fn route_path(&self) -> &RoutePath {
        &self.route_path
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        let mut markers: Vec<MarkerSummary> = self
            .markers
            .iter()
            .map(|(key, entry)| MarkerSummary {
                key: key.clone(),
                coordinate: entry.coordinate,
                origin: entry.origin,
            })
            .collect();
        markers.sort_by(|a, b| a.key.cmp(&b.key));

        PresentationSnapshot {
            sidebar: self.sidebar.clone(),
            selected: self.selected().map(str::to_string),
            detail: self.detail.clone(),
            detail_message: self.detail.message(),
            markers,
            place_marker: self.place_marker.map(|(_, c)| c),
            route: self.route_path.clone(),
            route_drawn: self.route.is_some(),
        }
    }

    /// At most one marker per key: the previous one is removed first
    fn install_marker(&mut self, key: String, spec: MarkerSpec, origin: MarkerOrigin) -> MarkerId {
        if let Some(old) = self.markers.remove(&key) {
            debug!(key = %key, "Replacing existing marker");
            self.view.remove_marker(old.id);
        }
        let coordinate = spec.coordinate;
        let id = self.view.add_marker(spec);
        self.markers.insert(
            key,
            MarkerEntry {
                id,
                coordinate,
                origin,
            },
        );
        id
    }

    fn remove_all_markers(&mut self) {
        for (_, entry) in self.markers.drain() {
            self.view.remove_marker(entry.id);
        }
    }
}
