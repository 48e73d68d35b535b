//! Shared test fixtures: a scripted geocoder and small catalogs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use illustres_common::{Coordinate, GeoTraceRecord, PortraitRecord};
use illustres_map::engine::{EngineSettings, MapEngine};
use illustres_map::events::EventBus;
use illustres_map::geocoder::Geocoder;
use illustres_map::sources::StaticCatalog;
use illustres_map::view::{SceneHandle, SceneMapView};

pub const PANTHEON: Coordinate = Coordinate { lat: 48.8462, lon: 2.3464 };
pub const NOHANT: Coordinate = Coordinate { lat: 48.8530, lon: 2.3330 };
pub const SERVANDONI: Coordinate = Coordinate { lat: 48.8489, lon: 2.3364 };
pub const TOUR_EIFFEL: Coordinate = Coordinate { lat: 48.8584, lon: 2.2945 };

/// Geocoder answering from fixed tables and counting calls
#[derive(Default)]
pub struct StubGeocoder {
    addresses: HashMap<String, Coordinate>,
    places: HashMap<String, Coordinate>,
    delays: HashMap<String, Duration>,
    address_calls: AtomicUsize,
    place_calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, text: &str, coordinate: Coordinate) -> Self {
        self.addresses.insert(text.to_string(), coordinate);
        self
    }

    pub fn with_place(mut self, text: &str, coordinate: Coordinate) -> Self {
        self.places.insert(text.to_string(), coordinate);
        self
    }

    /// Make lookups of `text` take `delay`
    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn address_calls(&self) -> usize {
        self.address_calls.load(Ordering::SeqCst)
    }

    pub fn place_calls(&self) -> usize {
        self.place_calls.load(Ordering::SeqCst)
    }

    async fn wait_for(&self, text: &str) {
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve_address(&self, text: &str) -> Option<Coordinate> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for(text).await;
        self.addresses.get(text).copied()
    }

    async fn search_place(&self, text: &str) -> Option<Coordinate> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for(text).await;
        self.places.get(text).copied()
    }
}

pub fn portrait(name: &str, short_description: Option<&str>, descriptions: &[&str]) -> PortraitRecord {
    PortraitRecord {
        name: name.to_string(),
        tab_name: None,
        descriptions: descriptions.iter().map(|d| d.to_string()).collect(),
        short_description: short_description.map(str::to_string),
        image_url: Some(format!("https://images.example/{}.jpg", name.replace(' ', "_"))),
    }
}

pub fn trace(name: &str, coordinate: Coordinate) -> GeoTraceRecord {
    GeoTraceRecord {
        name: name.to_string(),
        address: Some(format!("Adresse de {}", name)),
        tab_name: None,
        image_url: None,
        coordinate: Some(coordinate),
    }
}

/// Four portraits, two geo-traces (one without portrait)
pub fn tour_catalog() -> StaticCatalog {
    let mut louise = portrait(
        "Louise Michel",
        None,
        &["Institutrice et figure de la Commune"],
    );
    louise.tab_name = Some("Révolutionnaires".to_string());

    StaticCatalog {
        portraits: vec![
            portrait("Olympe", Some("Rue Servandoni"), &["Autrice de la Déclaration"]),
            portrait("Marie Curie", None, &["Physicienne et chimiste, prix Nobel"]),
            louise,
            portrait("Simone de Beauvoir", None, &[]),
        ],
        geo_traces: vec![trace("Marie Curie", PANTHEON), trace("George Sand", NOHANT)],
    }
}

/// Settings with no sweep delay
pub fn settings() -> EngineSettings {
    EngineSettings {
        sweep_delay: Duration::ZERO,
        ..EngineSettings::default()
    }
}

pub struct TestEngine {
    pub engine: Arc<MapEngine>,
    pub geocoder: Arc<StubGeocoder>,
    pub scene: SceneHandle,
    pub event_bus: EventBus,
}

pub async fn start_engine(catalog: StaticCatalog, geocoder: StubGeocoder) -> TestEngine {
    let event_bus = EventBus::new(256);
    let view = SceneMapView::new(Some(event_bus.clone()));
    let scene = view.handle();
    let geocoder = Arc::new(geocoder);

    let engine = MapEngine::bootstrap(
        settings(),
        &catalog,
        Arc::clone(&geocoder) as Arc<dyn Geocoder>,
        Box::new(view),
    )
    .await;

    TestEngine {
        engine: Arc::new(engine),
        geocoder,
        scene,
        event_bus,
    }
}
