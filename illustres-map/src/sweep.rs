//! Deferred geocode sweep
//!
//! After the first render, portraits that have no marker yet are geocoded one
//! at a time, in collection order, from their short description (or first
//! description). A lookup without result is skipped silently.

use std::sync::Arc;
use std::time::Duration;

use illustres_common::Reconciler;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::geocoder::Geocoder;
use crate::presentation::PresentationState;

/// Counters for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Geocoder calls made
    pub attempted: usize,
    /// Markers installed
    pub placed: usize,
    /// Portraits left alone (already mapped, no address, no result)
    pub skipped: usize,
}

/// Geocode every unmapped portrait, sequentially
pub async fn run_geocode_sweep(
    reconciler: &Reconciler,
    geocoder: &dyn Geocoder,
    state: &Mutex<PresentationState>,
) -> SweepReport {
    let mut report = SweepReport::default();

    for portrait in reconciler.portraits() {
        if portrait.name.trim().is_empty() || state.lock().await.has_marker(&portrait.name) {
            report.skipped += 1;
            continue;
        }
        let Some(address) = portrait.geocode_address() else {
            report.skipped += 1;
            continue;
        };

        report.attempted += 1;
        let Some(coordinate) = geocoder.resolve_address(address).await else {
            debug!(name = %portrait.name, "Sweep found no location");
            report.skipped += 1;
            continue;
        };

        let mut state = state.lock().await;
        // A search may have placed it while we were waiting
        if state.has_marker(&portrait.name) {
            report.skipped += 1;
            continue;
        }
        state.install_geocoded_marker(portrait, address, coordinate);
        report.placed += 1;
    }

    info!(
        attempted = report.attempted,
        placed = report.placed,
        skipped = report.skipped,
        "Geocode sweep complete"
    );
    report
}

/// Run the sweep in the background after `delay`
pub fn spawn_geocode_sweep(
    reconciler: Arc<Reconciler>,
    geocoder: Arc<dyn Geocoder>,
    state: Arc<Mutex<PresentationState>>,
    delay: Duration,
) -> JoinHandle<SweepReport> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        run_geocode_sweep(&reconciler, geocoder.as_ref(), &state).await
    })
}
