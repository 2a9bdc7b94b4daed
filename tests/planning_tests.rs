mod common;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use vetiver::constants::EARTH_RADIUS_KM;
use vetiver::models::detection::{normalize_classes, RawClassCount};
use vetiver::models::{Detection, Route, RouteComputationRequest, RouteResult, WasteCategory, Waypoint};
use vetiver::planning::{
    apply_filters, polyline, DistanceBucket, FilterCriteria, ModeAction, PlanningMode,
    PlanningState, QueryState, RouteRequestBuilder, SelectionSet,
};
use vetiver::services::{RouteComputation, RouteProvider};

fn wp(lat: f64, lng: f64) -> Waypoint {
    Waypoint::new(lat, lng).unwrap()
}

#[test]
fn test_canonical_polyline_decodes_to_reference_points() {
    let points = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];

    assert_eq!(points.len(), expected.len());
    for (point, (lat, lng)) in points.iter().zip(expected) {
        assert!((point.lat - lat).abs() < 1e-5, "lat {} vs {}", point.lat, lat);
        assert!((point.lng - lng).abs() < 1e-5, "lng {} vs {}", point.lng, lng);
    }
}

#[test]
fn test_last_stop_is_always_the_destination() {
    let builder = RouteRequestBuilder::default();
    let origin = wp(-23.648, -46.573);
    let stops: Vec<Waypoint> = (0..6).map(|i| wp(-23.6 - i as f64 * 0.01, -46.5)).collect();

    for n in 1..=stops.len() {
        let request = builder.build(origin, &stops[..n]).unwrap();
        assert_eq!(request.destination_waypoint(), stops[n - 1]);
        assert_eq!(request.intermediate_waypoints(), stops[..n - 1].to_vec());
        assert_eq!(request.origin.waypoint(), origin);
    }

    assert!(builder.build(origin, &[]).is_err());
}

#[test]
fn test_toggle_round_trip_restores_selection() {
    let original: SelectionSet = ["d1", "d2"].into_iter().collect();

    let mut selection = original.clone();
    selection.toggle("d9", true);
    selection.toggle("d9", false);
    assert_eq!(selection, original);

    // Toggling an already selected id on and off removes it
    selection.toggle("d1", true);
    selection.toggle("d1", false);
    assert!(!selection.contains("d1"));
}

#[test]
fn test_selection_survives_the_url_in_any_order() {
    let forward: SelectionSet = ["a", "b", "c"].into_iter().collect();
    let backward: SelectionSet = ["c", "a", "b"].into_iter().collect();

    let mut query = QueryState::parse("utm=1");
    forward.write_to(&mut query);
    let reparsed = SelectionSet::from_query(&QueryState::parse(&query.encode()));

    assert_eq!(reparsed, forward);
    assert_eq!(reparsed, backward);
}

#[test]
fn test_cancel_always_lands_in_browsing() {
    let modes = [
        PlanningMode::Browsing,
        PlanningMode::Planning,
        PlanningMode::Calculating,
    ];
    for mode in modes {
        assert_eq!(
            mode.transition(ModeAction::Cancel).unwrap(),
            PlanningMode::Browsing
        );
    }

    for query in ["", "planning=true", "calculating=true", "planning=true&calculating=true"] {
        let mut state = PlanningState::from_query(query);
        state.transition(ModeAction::Cancel).unwrap();
        let encoded = QueryState::parse(&state.encode());
        assert!(!encoded.has("planning") && !encoded.has("calculating"));
    }
}

#[test]
fn test_flags_are_never_both_set() {
    let mut state = PlanningState::from_query("planning=true&calculating=true&markers=a");
    assert_eq!(state.mode(), PlanningMode::Calculating);

    state.transition(ModeAction::Cancel).unwrap();
    state.transition(ModeAction::PlanRoute).unwrap();
    state.transition(ModeAction::CalculateRoute).unwrap();

    let query = QueryState::parse(&state.encode());
    assert!(query.flag("calculating"));
    assert!(!query.has("planning"));
    assert_eq!(query.get("markers"), Some("a"));
}

#[test]
fn test_calculating_only_from_planning() {
    assert!(PlanningMode::Browsing
        .transition(ModeAction::CalculateRoute)
        .is_err());
    assert!(PlanningMode::Calculating
        .transition(ModeAction::CalculateRoute)
        .is_err());
    assert_eq!(
        PlanningMode::Planning
            .transition(ModeAction::CalculateRoute)
            .unwrap(),
        PlanningMode::Calculating
    );
}

fn detection_at(id: &str, position: Waypoint, classes: &[(&str, u32)]) -> Detection {
    let raw: Vec<RawClassCount> = classes
        .iter()
        .map(|(nome, quantidade)| RawClassCount {
            nome: nome.to_string(),
            quantidade: *quantidade,
        })
        .collect();
    Detection {
        id: id.to_string(),
        position,
        photo: String::new(),
        classes: normalize_classes(&raw),
        geometry: None,
        detected_at: None,
        status: None,
        collected_at: None,
    }
}

#[test]
fn test_empty_criteria_is_identity() {
    let detections = common::map_detections();
    let filtered = apply_filters(&detections, &FilterCriteria::default(), None);
    assert_eq!(filtered, detections);
}

#[test]
fn test_class_filter_without_matches_is_empty() {
    let detections = vec![
        detection_at("p", wp(0.0, 0.0), &[("papel", 1)]),
        detection_at("g", wp(0.0, 0.0), &[("vidro", 2), ("metal", 0)]),
    ];
    let criteria = FilterCriteria {
        classes: [WasteCategory::Metal].into_iter().collect(),
        ..FilterCriteria::default()
    };
    assert!(apply_filters(&detections, &criteria, None).is_empty());
}

#[test]
fn test_distance_bucket_bounds_are_closed() {
    let bucket: DistanceBucket = "10-20".parse().unwrap();
    assert!(bucket.contains(10.0));
    assert!(bucket.contains(20.0));
    assert!(!bucket.contains(20.01));
    assert!(!bucket.contains(9.99));

    // Same boundaries through real positions due north of the origin
    let origin = wp(0.0, 0.0);
    let detections = vec![
        detection_at("ten", point_at_km(&origin, 10.0, Side::AtLeast), &[("papel", 1)]),
        detection_at("twenty", point_at_km(&origin, 20.0, Side::AtMost), &[("papel", 1)]),
        detection_at("short", point_at_km(&origin, 9.99, Side::AtMost), &[("papel", 1)]),
        detection_at("out", point_at_km(&origin, 20.01, Side::AtLeast), &[("papel", 1)]),
    ];
    for d in &detections[..2] {
        let km = origin.distance_to(&d.position);
        assert!((km - 10.0).abs() < 1e-9 || (km - 20.0).abs() < 1e-9, "got {}", km);
    }

    let criteria = FilterCriteria {
        distance: Some(bucket),
        ..FilterCriteria::default()
    };
    let ids: Vec<_> = apply_filters(&detections, &criteria, Some(&origin))
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["ten", "twenty"]);
}

enum Side {
    AtLeast,
    AtMost,
}

/// Point due north of `origin` whose haversine distance is `km` to within a
/// few ulps, nudged so the computed distance sits on the requested side.
fn point_at_km(origin: &Waypoint, km: f64, side: Side) -> Waypoint {
    let mut lat = origin.lat + (km / EARTH_RADIUS_KM).to_degrees();
    for _ in 0..64 {
        let d = origin.distance_to(&wp(lat, origin.lng));
        match side {
            Side::AtLeast if d < km => lat = f64::from_bits(lat.to_bits() + 1),
            Side::AtMost if d > km => lat = f64::from_bits(lat.to_bits() - 1),
            _ => return wp(lat, origin.lng),
        }
    }
    panic!("could not place a point at {} km", km);
}

#[test]
fn test_normalization_for_any_ordering() {
    let inputs = [
        vec![("papel", 1), ("plastico", 2), ("vidro", 3)],
        vec![("vidro", 3), ("papel", 1), ("plastico", 2)],
        vec![("plastico", 2), ("vidro", 3), ("papel", 1)],
    ];
    for input in inputs {
        let raw: Vec<RawClassCount> = input
            .iter()
            .map(|(nome, quantidade)| RawClassCount {
                nome: nome.to_string(),
                quantidade: *quantidade,
            })
            .collect();
        let classes = normalize_classes(&raw);
        let summary: Vec<_> = classes.iter().map(|c| (c.category, c.count)).collect();
        assert_eq!(
            summary,
            vec![
                (WasteCategory::Paper, 1),
                (WasteCategory::Plastic, 2),
                (WasteCategory::Glass, 3),
                (WasteCategory::Metal, 0),
            ]
        );
    }
}

/// Answers after a delay that depends on the destination, so overlapping
/// calls can finish out of order.
struct DelayedProvider;

#[async_trait]
impl RouteProvider for DelayedProvider {
    async fn compute_routes(
        &self,
        request: &RouteComputationRequest,
    ) -> vetiver::Result<RouteResult> {
        let destination = request.destination_waypoint();
        let delay = if destination.lat < -23.7 { 80 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(RouteResult {
            routes: vec![Route {
                distance_meters: 1000,
                duration: "60s".to_string(),
                description: Some(format!("to {}", destination)),
                ..Route::default()
            }],
        })
    }
}

#[tokio::test]
async fn test_overlapping_calculations_last_response_wins() {
    let computation = Arc::new(RouteComputation::new(
        Arc::new(DelayedProvider),
        RouteRequestBuilder::default(),
    ));
    let origin = wp(-23.648, -46.573);
    let slow = [wp(-23.75, -46.5)];
    let fast = [wp(-23.65, -46.5)];

    let calls = vec![
        computation.calculate_route(origin, &slow),
        computation.calculate_route(origin, &fast),
    ];
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));

    // The slow call resolved last and overwrote the fast one
    let snapshot = computation.snapshot().await;
    assert!(!snapshot.is_calculating);
    let description = snapshot
        .route_data
        .and_then(|r| r.routes.into_iter().next())
        .and_then(|r| r.description)
        .unwrap();
    assert_eq!(description, "to -23.75,-46.5");
}
