//! Map events and the event bus
//!
//! Every command sent to the map view is mirrored as a [`MapEvent`] so a
//! browser-side map widget can replay it over SSE.

use illustres_common::{Bounds, Coordinate};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::view::{MarkerId, MarkerSpec, PolylineId, PolylineStyle};

/// Map view commands, serialized for SSE transmission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapEvent {
    /// Viewport moved
    ViewChanged { center: Coordinate, zoom: u8 },

    /// Marker placed on the map
    MarkerAdded { id: MarkerId, marker: MarkerSpec },

    /// Marker taken off the map
    MarkerRemoved { id: MarkerId },

    /// Marker popup opened
    PopupOpened { id: MarkerId },

    /// Route line drawn
    RouteDrawn {
        id: PolylineId,
        points: Vec<Coordinate>,
        style: PolylineStyle,
    },

    /// Route line removed
    RouteRemoved { id: PolylineId },

    /// Viewport fitted to a box
    BoundsFitted { bounds: Bounds, padding_px: u32 },
}

impl MapEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::ViewChanged { .. } => "ViewChanged",
            MapEvent::MarkerAdded { .. } => "MarkerAdded",
            MapEvent::MarkerRemoved { .. } => "MarkerRemoved",
            MapEvent::PopupOpened { .. } => "PopupOpened",
            MapEvent::RouteDrawn { .. } => "RouteDrawn",
            MapEvent::RouteRemoved { .. } => "RouteRemoved",
            MapEvent::BoundsFitted { .. } => "BoundsFitted",
        }
    }
}

/// Broadcast channel for [`MapEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MapEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MapEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(MapEvent::MarkerRemoved { id: MarkerId(3) });

        match rx.recv().await.unwrap() {
            MapEvent::MarkerRemoved { id } => assert_eq!(id, MarkerId(3)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(MapEvent::PopupOpened { id: MarkerId(1) });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_serialized_tag() {
        let event = MapEvent::ViewChanged {
            center: Coordinate { lat: 48.0, lon: 2.0 },
            zoom: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ViewChanged");
        assert_eq!(json["zoom"], 12);
        assert_eq!(event.event_type(), "ViewChanged");
    }
}
