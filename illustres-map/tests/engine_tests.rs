//! Engine tests: startup render, search resolution, sweep and activation

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use illustres_map::presentation::{DetailPanel, GPS_UNKNOWN};
use illustres_map::search::{MatchLocation, MatchTier, SearchOutcome};
use illustres_map::sources::StaticCatalog;
use illustres_map::sweep::SweepReport;

#[tokio::test]
async fn test_startup_renders_geo_traces_and_portrait_sidebar() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    let scene = t.scene.snapshot();
    assert_eq!(scene.markers.len(), 2);
    assert_eq!(scene.polylines.len(), 1);
    assert_eq!(scene.polylines.values().next().unwrap(), &vec![PANTHEON, NOHANT]);

    let snapshot = t.engine.snapshot().await;
    let names: Vec<_> = snapshot.sidebar.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Olympe", "Marie Curie", "Louise Michel", "Simone de Beauvoir"]
    );
    assert_eq!(snapshot.sidebar[1].gps_line, "GPS: 48.846200, 2.346400");
    assert_eq!(snapshot.sidebar[0].gps_line, GPS_UNKNOWN);
    assert_eq!(t.geocoder.address_calls(), 0);
}

#[tokio::test]
async fn test_unmapped_portrait_is_geocoded_exactly_once() {
    let geocoder = StubGeocoder::new().with_address("Rue Servandoni", SERVANDONI);
    let t = start_engine(tour_catalog(), geocoder).await;

    let outcome = t.engine.search("Olympe").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: "Olympe".to_string(),
            tier: MatchTier::Exact,
            location: MatchLocation::Geocoded { coordinate: SERVANDONI },
        }
    );
    assert_eq!(t.geocoder.address_calls(), 1);
    assert_eq!(t.geocoder.place_calls(), 0);

    let scene = t.scene.snapshot();
    assert_eq!(scene.markers_labeled("Olympe").len(), 1);
    assert_eq!(scene.center, Some(SERVANDONI));
    assert_eq!(scene.zoom, Some(17));

    // Second search reuses the marker
    let again = t.engine.search("olympe").await;
    assert!(matches!(
        again,
        SearchOutcome::Matched { location: MatchLocation::ExistingMarker, .. }
    ));
    assert_eq!(t.geocoder.address_calls(), 1);
    assert_eq!(t.scene.snapshot().markers_labeled("Olympe").len(), 1);
}

#[tokio::test]
async fn test_short_query_is_rejected_without_lookup() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    assert_eq!(t.engine.search("ab").await, SearchOutcome::Rejected);
    assert_eq!(t.engine.search("  é  ").await, SearchOutcome::Rejected);

    assert_eq!(t.geocoder.address_calls(), 0);
    assert_eq!(t.geocoder.place_calls(), 0);
    let snapshot = t.engine.snapshot().await;
    assert_eq!(snapshot.detail, DetailPanel::QueryTooShort);
    assert_eq!(snapshot.detail_message.as_deref(), Some("Tape au moins 3 lettres."));
}

#[tokio::test]
async fn test_geo_trace_match_focuses_existing_marker() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    let outcome = t.engine.search("  MARIE curie ").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: "Marie Curie".to_string(),
            tier: MatchTier::Exact,
            location: MatchLocation::GeoTrace { coordinate: PANTHEON },
        }
    );
    let scene = t.scene.snapshot();
    assert_eq!(scene.center, Some(PANTHEON));
    assert_eq!(scene.zoom, Some(17));
    let popup = scene.open_popup.unwrap();
    assert_eq!(scene.markers[&popup].label, "Marie Curie");

    let snapshot = t.engine.snapshot().await;
    assert_eq!(snapshot.selected.as_deref(), Some("marie curie"));
    assert!(matches!(snapshot.detail, DetailPanel::Portrait(ref d) if d.name == "Marie Curie"));
    assert_eq!(t.geocoder.address_calls(), 0);
}

#[tokio::test]
async fn test_fuzzy_match_on_tab_label() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    let outcome = t.engine.search("révolution").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: "Louise Michel".to_string(),
            tier: MatchTier::Fuzzy,
            location: MatchLocation::Unresolved,
        }
    );
    // First description was tried, city-constrained lookup only
    assert_eq!(t.geocoder.address_calls(), 1);
    assert_eq!(t.geocoder.place_calls(), 0);
    assert!(t.scene.snapshot().markers_labeled("Louise Michel").is_empty());
}

#[tokio::test]
async fn test_portrait_without_address_text_is_not_geocoded() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    let outcome = t.engine.search("Simone de Beauvoir").await;

    assert!(matches!(
        outcome,
        SearchOutcome::Matched { location: MatchLocation::Unresolved, .. }
    ));
    assert_eq!(t.geocoder.address_calls(), 0);
}

#[tokio::test]
async fn test_place_fallback_drops_plain_marker() {
    let geocoder = StubGeocoder::new().with_place("Tour Eiffel", TOUR_EIFFEL);
    let t = start_engine(tour_catalog(), geocoder).await;

    let outcome = t.engine.search(" Tour Eiffel ").await;

    assert_eq!(
        outcome,
        SearchOutcome::Place {
            query: "Tour Eiffel".to_string(),
            coordinate: TOUR_EIFFEL,
        }
    );
    assert_eq!(t.geocoder.place_calls(), 1);

    let scene = t.scene.snapshot();
    let markers = scene.markers_labeled("Tour Eiffel");
    assert_eq!(markers.len(), 1);
    assert!(markers[0].icon.is_none());
    assert_eq!(scene.center, Some(TOUR_EIFFEL));
    assert_eq!(scene.zoom, Some(16));

    let snapshot = t.engine.snapshot().await;
    assert_eq!(
        snapshot.detail_message.as_deref(),
        Some("Localisation trouvée pour : Tour Eiffel")
    );
    assert_eq!(snapshot.place_marker, Some(TOUR_EIFFEL));
}

#[tokio::test]
async fn test_nothing_matches_shows_not_listed() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    assert_eq!(t.engine.search("Zénobie").await, SearchOutcome::NotFound);

    assert_eq!(t.geocoder.place_calls(), 1);
    let snapshot = t.engine.snapshot().await;
    assert_eq!(snapshot.detail, DetailPanel::NotListed);
    assert_eq!(
        snapshot.detail_message.as_deref(),
        Some("Cette personne ne fait pas encore partie de la liste")
    );
}

#[tokio::test]
async fn test_unmapped_portrait_gets_marker_only_from_sweep() {
    let catalog = StaticCatalog {
        portraits: vec![portrait("A", Some("1 Rue X"), &[])],
        geo_traces: vec![],
    };
    let geocoder = StubGeocoder::new().with_address("1 Rue X", SERVANDONI);
    let t = start_engine(catalog, geocoder).await;

    let snapshot = t.engine.snapshot().await;
    assert_eq!(snapshot.sidebar.len(), 1);
    assert_eq!(snapshot.sidebar[0].gps_line, "GPS: —");
    assert!(snapshot.markers.is_empty());
    assert_eq!(t.scene.marker_count(), 0);

    let report = t.engine.run_sweep().await;
    assert_eq!(
        report,
        SweepReport {
            attempted: 1,
            placed: 1,
            skipped: 0,
        }
    );
    assert_eq!(t.scene.marker_count(), 1);
    assert_eq!(t.scene.snapshot().markers_labeled("A").len(), 1);

    // Already placed: nothing left to do
    let report = t.engine.run_sweep().await;
    assert_eq!(report.attempted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(t.geocoder.address_calls(), 1);
    assert_eq!(t.scene.marker_count(), 1);
}

#[tokio::test]
async fn test_sweep_skips_mapped_and_unresolvable_portraits() {
    let geocoder = StubGeocoder::new().with_address("Rue Servandoni", SERVANDONI);
    let t = start_engine(tour_catalog(), geocoder).await;

    let report = t.engine.spawn_sweep().await.unwrap();

    // Olympe placed; Marie Curie mapped; Louise Michel no result; Simone no text
    assert_eq!(report.placed, 1);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(t.scene.marker_count(), 3);
}

#[tokio::test]
async fn test_stale_geocode_result_is_discarded() {
    let geocoder = StubGeocoder::new()
        .with_address("Rue Servandoni", SERVANDONI)
        .with_delay("Rue Servandoni", Duration::from_millis(300));
    let t = start_engine(tour_catalog(), geocoder).await;

    let engine = Arc::clone(&t.engine);
    let slow = tokio::spawn(async move { engine.search("Olympe").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = t.engine.search("Marie Curie").await;
    assert!(matches!(fast, SearchOutcome::Matched { .. }));

    assert_eq!(slow.await.unwrap(), SearchOutcome::Superseded);
    assert!(t.scene.snapshot().markers_labeled("Olympe").is_empty());

    let snapshot = t.engine.snapshot().await;
    assert!(matches!(snapshot.detail, DetailPanel::Portrait(ref d) if d.name == "Marie Curie"));
    assert_eq!(t.scene.snapshot().center, Some(PANTHEON));
}

#[tokio::test]
async fn test_marker_activation() {
    let t = start_engine(tour_catalog(), StubGeocoder::new()).await;

    // Geo-trace without portrait still opens
    assert!(t.engine.activate_marker("george sand").await);
    let snapshot = t.engine.snapshot().await;
    match snapshot.detail {
        DetailPanel::Portrait(d) => {
            assert_eq!(d.name, "George Sand");
            assert_eq!(d.coordinate, Some(NOHANT));
        }
        other => panic!("unexpected panel {:?}", other),
    }
    // No sidebar entry for it: highlight unchanged
    assert_eq!(snapshot.selected, None);

    assert!(!t.engine.activate_marker("Olympe").await);
}

#[tokio::test]
async fn test_sidebar_activation() {
    let geocoder = StubGeocoder::new().with_address("Rue Servandoni", SERVANDONI);
    let t = start_engine(tour_catalog(), geocoder).await;

    let outcome = t.engine.activate_sidebar_entry("Olympe").await;
    assert!(matches!(
        outcome,
        SearchOutcome::Matched { location: MatchLocation::Geocoded { .. }, .. }
    ));
    assert_eq!(t.engine.snapshot().await.selected.as_deref(), Some("olympe"));

    assert_eq!(
        t.engine.activate_sidebar_entry("Inconnue").await,
        SearchOutcome::NotFound
    );
    assert_eq!(t.engine.snapshot().await.detail, DetailPanel::NoData);
}

#[tokio::test]
async fn test_unnamed_portrait_found_by_description() {
    let catalog = StaticCatalog {
        portraits: vec![portrait("", Some("Observatoire"), &["Astronome"])],
        geo_traces: vec![],
    };
    let geocoder = StubGeocoder::new().with_address("Observatoire", PANTHEON);
    let t = start_engine(catalog, geocoder).await;

    let outcome = t.engine.search("astronome").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: String::new(),
            tier: MatchTier::Fuzzy,
            location: MatchLocation::Geocoded { coordinate: PANTHEON },
        }
    );
    let snapshot = t.engine.snapshot().await;
    match &snapshot.detail {
        DetailPanel::Portrait(d) => assert_eq!(d.descriptions, vec!["Astronome"]),
        other => panic!("unexpected panel {:?}", other),
    }
    assert_eq!(snapshot.selected.as_deref(), Some("(sans nom)"));

    // Map pans, but no marker is keyed by an empty name
    assert!(snapshot.markers.is_empty());
    assert_eq!(t.scene.marker_count(), 0);
    assert_eq!(t.scene.snapshot().center, Some(PANTHEON));

    let report = t.engine.run_sweep().await;
    assert_eq!(report.attempted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(t.geocoder.address_calls(), 1);
}

#[tokio::test]
async fn test_duplicate_geo_trace_names_keep_first() {
    let catalog = StaticCatalog {
        portraits: vec![portrait("George Sand", None, &[])],
        geo_traces: vec![trace("George Sand", NOHANT), trace(" george sand ", PANTHEON)],
    };
    let t = start_engine(catalog, StubGeocoder::new()).await;

    let snapshot = t.engine.snapshot().await;
    assert_eq!(t.scene.marker_count(), 1);
    assert_eq!(snapshot.markers.len(), 1);
    assert_eq!(snapshot.markers[0].coordinate, NOHANT);
    assert_eq!(snapshot.sidebar[0].gps_line, "GPS: 48.853000, 2.333000");
    // Both traces still shape the route
    assert_eq!(
        t.scene.snapshot().polylines.values().next().unwrap(),
        &vec![NOHANT, PANTHEON]
    );

    let outcome = t.engine.search("George Sand").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: "George Sand".to_string(),
            tier: MatchTier::Exact,
            location: MatchLocation::GeoTrace { coordinate: NOHANT },
        }
    );
    let scene = t.scene.snapshot();
    assert_eq!(scene.center, Some(NOHANT));
    let popup = scene.open_popup.unwrap();
    assert_eq!(scene.markers[&popup].coordinate, NOHANT);
}

#[tokio::test]
async fn test_sidebar_activation_reuses_sweep_marker() {
    let geocoder = StubGeocoder::new().with_address("Rue Servandoni", SERVANDONI);
    let t = start_engine(tour_catalog(), geocoder).await;

    let report = t.engine.run_sweep().await;
    assert_eq!(report.placed, 1);
    assert_eq!(t.geocoder.address_calls(), 2);

    let outcome = t.engine.activate_sidebar_entry("Olympe").await;

    assert_eq!(
        outcome,
        SearchOutcome::Matched {
            name: "Olympe".to_string(),
            tier: MatchTier::Exact,
            location: MatchLocation::ExistingMarker,
        }
    );
    // No further lookup for a portrait the sweep already placed
    assert_eq!(t.geocoder.address_calls(), 2);
    assert_eq!(t.scene.snapshot().markers_labeled("Olympe").len(), 1);
    assert_eq!(t.scene.snapshot().center, Some(SERVANDONI));
    assert_eq!(t.engine.snapshot().await.selected.as_deref(), Some("olympe"));
}
