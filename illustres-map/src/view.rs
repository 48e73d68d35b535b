//! Map widget boundary
//!
//! The map widget (tiles, pan/zoom, drawing) is an external collaborator
//! reached only through [`MapView`]. [`SceneMapView`] is the service-side
//! implementation: it keeps the live scene for inspection and broadcasts
//! each command as a [`MapEvent`] for the browser widget to replay.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use illustres_common::{Bounds, Coordinate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{EventBus, MapEvent};

/// Handle of a marker on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u64);

/// Handle of a polyline on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolylineId(pub u64);

/// Custom marker icon; `url: None` means the widget's default pin image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub url: Option<String>,
    pub size_px: u32,
    pub css_class: String,
}

impl MarkerIcon {
    /// Round photo icon used for people
    pub fn photo(url: Option<String>, size_px: u32) -> Self {
        Self {
            url,
            size_px,
            css_class: "photo-marker".to_string(),
        }
    }
}

/// Popup bound to a marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopupContent {
    pub title: String,
    pub image_url: Option<String>,
    pub address: Option<String>,
    pub descriptions: Vec<String>,
}

/// Everything needed to draw one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub label: String,
    pub coordinate: Coordinate,
    /// `None` draws a plain pin
    pub icon: Option<MarkerIcon>,
    pub popup: PopupContent,
}

/// Line style for the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f32,
}

impl PolylineStyle {
    pub fn route() -> Self {
        Self {
            color: "#f39c12".to_string(),
            weight: 4,
            opacity: 0.8,
        }
    }
}

/// Drawing primitives of the map widget
pub trait MapView: Send {
    fn set_view(&mut self, center: Coordinate, zoom: u8);
    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
    fn open_popup(&mut self, id: MarkerId);
    fn add_polyline(&mut self, points: &[Coordinate], style: &PolylineStyle) -> PolylineId;
    fn remove_polyline(&mut self, id: PolylineId);
    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32);
}

/// What the map currently shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub center: Option<Coordinate>,
    pub zoom: Option<u8>,
    pub markers: BTreeMap<MarkerId, MarkerSpec>,
    pub open_popup: Option<MarkerId>,
    pub polylines: BTreeMap<PolylineId, Vec<Coordinate>>,
    pub fitted_bounds: Option<Bounds>,
    #[serde(skip)]
    next_id: u64,
}

impl Scene {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Markers whose label matches exactly
    pub fn markers_labeled(&self, label: &str) -> Vec<&MarkerSpec> {
        self.markers.values().filter(|m| m.label == label).collect()
    }
}

/// Shared read access to a [`SceneMapView`]'s scene
#[derive(Clone, Default)]
pub struct SceneHandle(Arc<RwLock<Scene>>);

impl SceneHandle {
    /// Copy of the current scene
    pub fn snapshot(&self) -> Scene {
        self.read().clone()
    }

    pub fn marker_count(&self) -> usize {
        self.read().markers.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Scene> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Scene> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Scene-tracking map view that mirrors commands onto an [`EventBus`]
pub struct SceneMapView {
    scene: SceneHandle,
    bus: Option<EventBus>,
}

impl SceneMapView {
    pub fn new(bus: Option<EventBus>) -> Self {
        Self {
            scene: SceneHandle::default(),
            bus,
        }
    }

    pub fn handle(&self) -> SceneHandle {
        self.scene.clone()
    }

    fn publish(&self, event: MapEvent) {
        debug!(event = event.event_type(), "Map command");
        if let Some(bus) = &self.bus {
            bus.emit_lossy(event);
        }
    }
}

impl MapView for SceneMapView {
    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        {
            let mut scene = self.scene.write();
            scene.center = Some(center);
            scene.zoom = Some(zoom);
        }
        self.publish(MapEvent::ViewChanged { center, zoom });
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId {
        let id = {
            let mut scene = self.scene.write();
            let id = MarkerId(scene.allocate());
            scene.markers.insert(id, marker.clone());
            id
        };
        self.publish(MapEvent::MarkerAdded { id, marker });
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        let removed = {
            let mut scene = self.scene.write();
            if scene.open_popup == Some(id) {
                scene.open_popup = None;
            }
            scene.markers.remove(&id).is_some()
        };
        if removed {
            self.publish(MapEvent::MarkerRemoved { id });
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        let opened = {
            let mut scene = self.scene.write();
            let exists = scene.markers.contains_key(&id);
            if exists {
                scene.open_popup = Some(id);
            }
            exists
        };
        if opened {
            self.publish(MapEvent::PopupOpened { id });
        }
    }

    fn add_polyline(&mut self, points: &[Coordinate], style: &PolylineStyle) -> PolylineId {
        let id = {
            let mut scene = self.scene.write();
            let id = PolylineId(scene.allocate());
            scene.polylines.insert(id, points.to_vec());
            id
        };
        self.publish(MapEvent::RouteDrawn {
            id,
            points: points.to_vec(),
            style: style.clone(),
        });
        id
    }

    fn remove_polyline(&mut self, id: PolylineId) {
        if self.scene.write().polylines.remove(&id).is_some() {
            self.publish(MapEvent::RouteRemoved { id });
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32) {
        self.scene.write().fitted_bounds = Some(bounds);
        self.publish(MapEvent::BoundsFitted { bounds, padding_px });
    }
}
