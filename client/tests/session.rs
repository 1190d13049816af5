use floodwatch_map::gestures::RecordingSource;
use floodwatch_map::ingest::parse_snapshot;
use floodwatch_map::profile::ViewProfile;
use floodwatch_map::session::MapSession;
use floodwatch_map::viewport::{InteractionState, MoveCause, MoveOutcome};
use floodwatch_map::Marker;
use floodwatch_shared::{Category, Coordinate, GeoEntity, MapError, MapEvent, MapView, Severity};
use serde_json::json;

const SHELTERS: &str = r#"{
    "shelters": [
        {"_id": "s1", "name": "Central Relief Camp", "location": [28.6139, 77.2090], "status": "READY", "capacity": 500, "current_occupancy": 120},
        {"_id": "s2", "name": "North Community Hall", "location": [28.6315, 77.2167], "status": "READY"},
        {"_id": "s3", "name": "East School", "location": [28.6129, 77.2295], "status": "OCCUPIED"}
    ],
    "total": 3
}"#;

fn c(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn delhi() -> MapView {
    MapView::new(c(28.6139, 77.2090), 11)
}

fn shelters() -> Vec<GeoEntity> {
    parse_snapshot(SHELTERS, Category::Shelter).unwrap().entities
}

fn sos(id: &str, lat: f64, lng: f64) -> GeoEntity {
    GeoEntity::new(id, c(lat, lng), Category::SosRequest).with_severity(Severity::High)
}

#[test]
fn selecting_an_sos_request_routes_to_the_nearest_shelter() {
    let mut session = MapSession::new(ViewProfile::admin(), delhi()).unwrap();
    let mut snapshot = shelters();
    snapshot.push(sos("r1", 28.6140, 77.2095));
    assert_eq!(session.replace_entities(snapshot, 0.0), None);

    let outcome = session.select("r1", 10.0).unwrap();
    assert_eq!(outcome, MoveOutcome::Applied(MapView::new(c(28.6140, 77.2095), 15)));

    let frame = session.frame(10_000.0);
    assert_eq!(frame.selected.as_deref(), Some("r1"));
    let route = frame.route.unwrap();
    assert_eq!(route.shelter_id, "s1");
    assert_eq!(route.points.first(), Some(&c(28.6140, 77.2095)));
    assert_eq!(route.points.last(), Some(&c(28.6139, 77.2090)));
    assert!(route.distance_km < 0.1);
}

#[test]
fn selecting_a_shelter_moves_without_a_route() {
    let mut session = MapSession::new(ViewProfile::generic(), delhi()).unwrap();
    session.replace_entities(shelters(), 0.0);
    session.select("s2", 0.0).unwrap();
    let frame = session.frame(5_000.0);
    assert_eq!(frame.view.center, c(28.6315, 77.2167));
    assert_eq!(frame.route, None);
}

#[test]
fn sos_without_shelters_gets_no_route() {
    let mut session = MapSession::new(ViewProfile::admin(), delhi()).unwrap();
    session.replace_entities(vec![sos("r1", 28.61, 77.20)], 0.0);
    assert!(session.select("r1", 0.0).is_ok());
    assert_eq!(session.frame(0.0).route, None);
}

#[test]
fn selection_is_cleared_when_its_entity_disappears() {
    let mut session = MapSession::new(ViewProfile::admin(), delhi()).unwrap();
    let mut snapshot = shelters();
    snapshot.push(sos("r1", 28.6140, 77.2095));
    session.replace_entities(snapshot, 0.0);
    session.select("r1", 0.0).unwrap();

    session.replace_entities(shelters(), 1_000.0);
    assert_eq!(session.selected(), None);
    assert_eq!(session.frame(1_000.0).route, None);
}

#[test]
fn selected_route_follows_shelter_status_changes() {
    let mut session = MapSession::new(ViewProfile::admin(), delhi()).unwrap();
    let mut snapshot = shelters();
    snapshot.push(sos("r1", 28.6140, 77.2095));
    session.replace_entities(snapshot.clone(), 0.0);
    session.select("r1", 0.0).unwrap();

    snapshot[0] = snapshot[0].clone().with_field("status", json!("FULL"));
    session.replace_entities(snapshot, 1_000.0);
    assert_ne!(session.frame(1_000.0).route.unwrap().shelter_id, "s1");
}

#[test]
fn citizen_view_follows_the_most_severe_alert_until_the_user_pans() {
    let mut session = MapSession::new(ViewProfile::citizen(), delhi()).unwrap();
    let alerts = vec![
        GeoEntity::new("a1", c(28.70, 77.10), Category::Alert).with_severity(Severity::Moderate),
        GeoEntity::new("a2", c(28.52, 77.15), Category::Alert).with_severity(Severity::Critical),
    ];
    let outcome = session.replace_entities(alerts.clone(), 0.0).unwrap();
    assert_eq!(outcome, MoveOutcome::Applied(MapView::new(c(28.52, 77.15), 11)));
    session.tick(1_000.0);

    session.handle_event(MapEvent::DragStart, 2_000.0).unwrap();
    let mut refreshed = alerts;
    refreshed.push(GeoEntity::new("a3", c(28.80, 77.30), Category::Alert).with_severity(Severity::Critical));
    assert_eq!(
        session.replace_entities(refreshed, 2_100.0),
        Some(MoveOutcome::Dropped(InteractionState::UserActive))
    );
    assert_eq!(session.viewport().view().center, c(28.52, 77.15));

    let updates = session.drain_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].cause, MoveCause::Recenter);
}

#[test]
fn refresh_with_same_focus_does_not_yank_the_camera() {
    let mut session = MapSession::new(ViewProfile::citizen(), delhi()).unwrap();
    let alerts = vec![GeoEntity::new("a1", c(28.70, 77.10), Category::Alert)];
    session.replace_entities(alerts.clone(), 0.0);
    session.tick(1_000.0);
    assert_eq!(session.replace_entities(alerts, 60_000.0), Some(MoveOutcome::Unchanged));
}

#[test]
fn refresh_with_same_focus_brings_back_a_panned_camera() {
    let mut session = MapSession::new(ViewProfile::citizen(), delhi()).unwrap();
    let focus = c(28.70, 77.10);
    let alerts = vec![GeoEntity::new("a1", focus, Category::Alert)];
    session.replace_entities(alerts.clone(), 0.0);
    session.tick(1_000.0);

    session.handle_event(MapEvent::DragStart, 2_000.0).unwrap();
    session
        .handle_event(MapEvent::MoveEnd { center: c(28.40, 76.90), zoom: 11 }, 2_100.0)
        .unwrap();
    session.handle_event(MapEvent::DragEnd, 2_200.0).unwrap();
    session.tick(3_200.0);
    assert_eq!(session.viewport().state(), InteractionState::Idle);

    assert_eq!(
        session.replace_entities(alerts, 60_000.0),
        Some(MoveOutcome::Applied(MapView::new(focus, 11)))
    );
}

#[test]
fn user_zoom_survives_routine_refresh() {
    let mut session = MapSession::new(ViewProfile::citizen(), delhi()).unwrap();
    session.handle_event(MapEvent::ZoomStart, 0.0).unwrap();
    session.handle_event(MapEvent::ZoomEnd { zoom: 14 }, 200.0).unwrap();
    session.tick(3_200.0);
    assert_eq!(session.viewport().state(), InteractionState::Idle);

    let alerts = vec![GeoEntity::new("a1", c(28.70, 77.10), Category::Alert)];
    let outcome = session.replace_entities(alerts, 3_300.0).unwrap();
    assert_eq!(outcome, MoveOutcome::Applied(MapView::new(c(28.70, 77.10), 14)));
}

#[test]
fn dense_snapshot_clusters_when_zoomed_out() {
    let mut session = MapSession::new(ViewProfile::generic(), MapView::new(c(28.6139, 77.2090), 5)).unwrap();
    let mut snapshot = shelters();
    snapshot.push(GeoEntity::new("far", c(19.0760, 72.8777), Category::Sensor));
    session.replace_entities(snapshot, 0.0);

    let frame = session.frame(0.0);
    let weights: Vec<usize> = frame.markers.iter().map(Marker::weight).collect();
    assert_eq!(weights, vec![3, 1]);

    session.navigate_to(c(28.6139, 77.2090), Some(13), 0.0).unwrap();
    assert_eq!(session.frame(10_000.0).markers.len(), 4);
}

#[test]
fn rapid_navigation_lands_on_the_last_target() {
    let mut session = MapSession::new(ViewProfile::generic(), delhi()).unwrap();
    session.navigate_to(c(28.61, 77.20), None, 0.0).unwrap();
    assert_eq!(session.navigate_to(c(28.62, 77.21), None, 40.0).unwrap(), MoveOutcome::Deferred);
    assert_eq!(session.navigate_to(c(28.63, 77.22), None, 80.0).unwrap(), MoveOutcome::Deferred);

    session.tick(1_000.0);
    assert_eq!(session.frame(1_000.0).view, MapView::new(c(28.63, 77.22), 15));
    let centers: Vec<Coordinate> = session.drain_updates().iter().map(|u| u.view.center).collect();
    assert_eq!(centers, vec![c(28.61, 77.20), c(28.63, 77.22)]);
}

#[test]
fn malformed_click_keeps_interaction_state() {
    let mut session = MapSession::new(ViewProfile::generic(), delhi()).unwrap();
    let err = session
        .handle_event(MapEvent::Click { at: Coordinate { lat: f64::NAN, lng: 0.0 } }, 0.0)
        .unwrap_err();
    assert!(matches!(err, MapError::InvalidCoordinate { .. }));
    assert_eq!(session.viewport().state(), InteractionState::Idle);
}

#[test]
fn dispose_releases_every_listener() {
    let mut source = RecordingSource::new();
    let mut session = MapSession::new(ViewProfile::generic(), delhi()).unwrap();
    assert_eq!(session.attach(&mut source), 9);
    session.handle_event(MapEvent::DragStart, 0.0).unwrap();
    session.handle_event(MapEvent::DragEnd, 10.0).unwrap();

    session.dispose(&mut source);
    assert_eq!(source.live_count(), 0);
    assert_eq!(session.next_deadline(), None);
    assert_eq!(session.navigate_to(c(1.0, 1.0), None, 20.0).unwrap(), MoveOutcome::Ignored);
}
