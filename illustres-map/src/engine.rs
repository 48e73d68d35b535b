//! Map engine
//!
//! Startup orchestration and the user-facing operations. Startup is strictly
//! ordered: view init, portrait fetch, geo-trace fetch, render. The deferred
//! geocode sweep is started separately by the caller.

use std::sync::Arc;
use std::time::Duration;

use illustres_common::config::{AppConfig, CompiledDefaults};
use illustres_common::{Coordinate, Reconciler};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::geocoder::Geocoder;
use crate::presentation::{PresentationSnapshot, PresentationState};
use crate::search::{SearchOutcome, SearchResolver};
use crate::sources::CatalogSource;
use crate::sweep::{run_geocode_sweep, spawn_geocode_sweep, SweepReport};
use crate::view::MapView;

/// Viewport and timing settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub map_center: Coordinate,
    pub initial_zoom: u8,
    pub focus_zoom: u8,
    pub place_zoom: u8,
    pub sweep_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            map_center: defaults.map_center,
            initial_zoom: defaults.initial_zoom,
            focus_zoom: defaults.focus_zoom,
            place_zoom: defaults.place_zoom,
            sweep_delay: defaults.sweep_delay,
        }
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            map_center: config.map_center,
            initial_zoom: config.initial_zoom,
            focus_zoom: config.focus_zoom,
            place_zoom: config.place_zoom,
            sweep_delay: config.sweep_delay,
        }
    }
}

pub struct MapEngine {
    settings: EngineSettings,
    reconciler: Arc<Reconciler>,
    geocoder: Arc<dyn Geocoder>,
    state: Arc<Mutex<PresentationState>>,
    resolver: SearchResolver,
}

impl MapEngine {
    /// Load both collections and render the first view
    pub async fn bootstrap(
        settings: EngineSettings,
        catalog: &dyn CatalogSource,
        geocoder: Arc<dyn Geocoder>,
        view: Box<dyn MapView>,
    ) -> Self {
        let mut presentation = PresentationState::new(view);
        presentation.init_view(settings.map_center, settings.initial_zoom);

        let portraits = catalog.fetch_portraits().await;
        let geo_traces = catalog.fetch_geo_traces().await;
        let reconciler = Arc::new(Reconciler::new(portraits, geo_traces));

        presentation.render_entities(reconciler.geo_traces(), &reconciler, settings.map_center);
        info!(
            portraits = reconciler.portraits().len(),
            geo_traces = reconciler.geo_traces().len(),
            "Map engine ready"
        );

        let state = Arc::new(Mutex::new(presentation));
        let resolver = SearchResolver::new(
            Arc::clone(&reconciler),
            Arc::clone(&geocoder),
            Arc::clone(&state),
            settings.focus_zoom,
            settings.place_zoom,
        );

        Self {
            settings,
            reconciler,
            geocoder,
            state,
            resolver,
        }
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        self.resolver.resolve(query).await
    }

    pub async fn activate_sidebar_entry(&self, name: &str) -> SearchOutcome {
        self.resolver.activate_entry(name).await
    }

    /// Returns false when no marker exists for `name`
    pub async fn activate_marker(&self, name: &str) -> bool {
        self.state
            .lock()
            .await
            .activate_marker(&self.reconciler, name)
    }

    pub async fn run_sweep(&self) -> SweepReport {
        run_geocode_sweep(&self.reconciler, self.geocoder.as_ref(), &self.state).await
    }

    /// Sweep in the background after the configured delay
    pub fn spawn_sweep(&self) -> JoinHandle<SweepReport> {
        spawn_geocode_sweep(
            Arc::clone(&self.reconciler),
            Arc::clone(&self.geocoder),
            Arc::clone(&self.state),
            self.settings.sweep_delay,
        )
    }

    pub async fn snapshot(&self) -> PresentationSnapshot {
        self.state.lock().await.snapshot()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
