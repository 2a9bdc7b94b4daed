use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use vetiver::error::{AppError, Result};
use vetiver::models::route::EncodedPolyline;
use vetiver::models::{Detection, Route, RouteComputationRequest, RouteLeg, RouteResult};
use vetiver::planning::{polyline, RouteRequestBuilder};
use vetiver::services::backend::parse_detections;
use vetiver::services::{
    BackendReply, DetectionOutcome, DetectionsBackend, Geocoder, PlanningSessions,
};
use vetiver::{AppState, ViewSettings};

/// Device location used by most tests, next to the fixtures
#[allow(dead_code)]
pub const DEVICE_LOCATION: &str = "-23.6480,-46.5730";

/// Map detections around Santo André, as the backend returns them
#[allow(dead_code)]
pub fn map_detections() -> Vec<Detection> {
    parse_detections(vec![
        json!({"id": "d1", "lat": -23.648441, "lng": -46.573043, "foto": "",
               "classes": [{"nome": "papel", "quantidade": 2}, {"nome": "Plástico", "quantidade": 1}]}),
        json!({"id": "d2", "lat": -23.647336, "lng": -46.575399, "foto": "/9j/4AAQ",
               "classes": [{"nome": "vidro", "quantidade": 3}]}),
        json!({"id": "d3", "lat": -23.649123, "lng": -46.572187, "foto": "https://cdn.example/d3.jpg",
               "classes": [{"nome": "papel", "quantidade": 1}, {"nome": "vidro", "quantidade": 2}],
               "detection_points": {
                   "lixo_detections": [{"lixo_contour": [[0.1, 0.1], [0.4, 0.1], [0.4, 0.4]],
                                        "sub_classes": [{"class_name": "vidro", "contour": [[0.2, 0.2], [0.3, 0.2], [0.3, 0.3]]}]}],
                   "class_counts": {"vidro": 2}
               }}),
        // ~60 km away, outside every bounded distance bucket
        json!({"id": "far", "lat": -23.1, "lng": -46.6, "foto": "",
               "classes": [{"nome": "metal", "quantidade": 4}]}),
        // Dropped on ingestion: no coordinates
        json!({"id": "broken", "classes": []}),
    ])
}

/// Ten activity records: 7 collected in Aug/Sep 2025, 3 not found
#[allow(dead_code)]
pub fn collector_activity() -> Vec<Detection> {
    let records = (1..=10)
        .map(|i| {
            let collected = i % 4 != 0 && i != 10;
            json!({
                "id": format!("a{}", i),
                "lat": -23.648 - (i as f64) * 0.001,
                "lng": -46.573,
                "foto": "",
                "classes": [{"nome": if i % 2 == 0 { "papel" } else { "plastico" }, "quantidade": i}],
                "date": format!("2025-0{}-0{}T09:00:00", if i <= 5 { 8 } else { 9 }, i % 9 + 1),
                "status": if collected { "Coletado" } else { "NEncontrado" },
                "dataColetado": if collected {
                    Value::String(format!("2025-0{}-1{}T10:00:00", if i <= 5 { 8 } else { 9 }, i % 9))
                } else {
                    Value::Null
                },
            })
        })
        .collect();
    parse_detections(records)
}

pub struct FakeBackend {
    pub detections: Vec<Detection>,
    pub activity: Vec<Detection>,
    pub reply: BackendReply,
    pub fail: bool,
    pub marked: Mutex<Vec<(String, DetectionOutcome, String)>>,
    pub requested_statuses: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            detections: map_detections(),
            activity: collector_activity(),
            reply: BackendReply {
                status: 200,
                body: json!({"ok": true}),
            },
            fail: false,
            marked: Mutex::new(Vec::new()),
            requested_statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        FakeBackend {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_reply(status: u16, body: Value) -> Self {
        FakeBackend {
            reply: BackendReply { status, body },
            ..Self::new()
        }
    }
}

#[async_trait]
impl DetectionsBackend for FakeBackend {
    async fn detections_by_status(&self, status: &str) -> Result<Vec<Detection>> {
        self.requested_statuses.lock().unwrap().push(status.to_string());
        if self.fail {
            return Err(AppError::Backend("503 Service Unavailable".to_string()));
        }
        Ok(self.detections.clone())
    }

    async fn collector_activity(&self, _collector_id: &str) -> Result<Vec<Detection>> {
        if self.fail {
            return Err(AppError::Backend("503 Service Unavailable".to_string()));
        }
        Ok(self.activity.clone())
    }

    async fn mark_detection(
        &self,
        detection_id: &str,
        outcome: DetectionOutcome,
        collector_user_id: &str,
    ) -> Result<BackendReply> {
        self.marked.lock().unwrap().push((
            detection_id.to_string(),
            outcome,
            collector_user_id.to_string(),
        ));
        Ok(self.reply.clone())
    }
}

/// Route provider that answers with a straight-line route through the
/// requested points and records every request.
pub struct FakeRouteProvider {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<RouteComputationRequest>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl FakeRouteProvider {
    pub fn new() -> Self {
        FakeRouteProvider {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        FakeRouteProvider {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RouteComputationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl vetiver::services::RouteProvider for FakeRouteProvider {
    async fn compute_routes(&self, request: &RouteComputationRequest) -> Result<RouteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(AppError::RoutesApi(
                "403 Forbidden. {\"error\":{\"status\":\"PERMISSION_DENIED\"}}".to_string(),
            ));
        }

        let mut points = vec![request.origin.waypoint()];
        points.extend(request.intermediate_waypoints());
        points.push(request.destination_waypoint());

        let legs = points
            .windows(2)
            .map(|_| RouteLeg {
                distance_meters: 1200,
                duration: "300s".to_string(),
                start_location: None,
                end_location: None,
            })
            .collect::<Vec<_>>();

        Ok(RouteResult {
            routes: vec![Route {
                distance_meters: 1200 * legs.len() as u64,
                duration: format!("{}s", 300 * legs.len()),
                polyline: EncodedPolyline {
                    encoded_polyline: polyline::encode(&points),
                },
                legs,
                warnings: vec![],
                description: Some("Av. dos Estados".to_string()),
                optimized_intermediate_waypoint_index: (0..request.intermediates.len()).collect(),
            }],
        })
    }
}

/// Router over fakes, without the `/api/v1` prefix
#[allow(dead_code)]
pub fn test_app(backend: Arc<FakeBackend>, provider: Arc<FakeRouteProvider>) -> Router {
    let state = Arc::new(AppState {
        backend,
        sessions: PlanningSessions::new(provider, RouteRequestBuilder::default(), 60),
        // Nothing listens on the discard port; lookups fall back to coordinates
        geocoder: Geocoder::new(Some("http://127.0.0.1:9/reverse".to_string()), 60),
        settings: ViewSettings {
            map_detection_status: "pending".to_string(),
            history_page_size: 6,
        },
    });
    vetiver::routes::create_router(state)
}

/// Runs one request and returns status plus JSON body (`Null` when empty)
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[allow(dead_code)]
pub fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post_json(uri: &str, headers: &[(&str, &str)], body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Check if we should skip real API tests
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok()
}
