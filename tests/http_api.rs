//! End-to-end checks of the HTTP surface against a server bound to an
//! ephemeral port, with observations fed directly instead of a camera.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use fingerspell::{
    front::server::{FrameHub, SharedState, run_server},
    types::{Landmark, NUM_LANDMARKS, TrackedHand, landmark},
};
use serde_json::Value;
use tiny_http::Server;

/// Landmarks posing the letter B: thumb folded, all four fingers up.
fn hand_for_b() -> TrackedHand {
    let mut points = [Landmark {
        x: 0.5,
        y: 0.5,
        z: 0.0,
    }; NUM_LANDMARKS];
    points[landmark::THUMB_IP].x = 0.4;
    points[landmark::THUMB_TIP].x = 0.45;
    for tip in [
        landmark::INDEX_TIP,
        landmark::MIDDLE_TIP,
        landmark::RING_TIP,
        landmark::PINKY_TIP,
    ] {
        points[tip].y = 0.3;
    }
    TrackedHand {
        landmarks: points,
        projected: Vec::new(),
        confidence: 0.9,
    }
}

fn spawn_server(state: Arc<SharedState>) -> String {
    let hub = Arc::new(FrameHub::new());
    let server = Server::http("127.0.0.1:0").expect("bind ephemeral port");
    let addr = server.server_addr().to_ip().expect("ip listener");
    thread::spawn(move || run_server(server, state, hub));
    format!("http://{addr}")
}

fn get_json(url: &str) -> Value {
    let body = reqwest::blocking::get(url)
        .expect("request failed")
        .text()
        .expect("body read failed");
    serde_json::from_str(&body).expect("invalid JSON")
}

#[test]
fn status_reports_observed_word_and_fingers() {
    let state = Arc::new(SharedState::new(Duration::from_millis(10)));
    state.observe(Some(&hand_for_b()), Instant::now());
    let base = spawn_server(state);

    let status = get_json(&format!("{base}/status"));
    assert_eq!(status["word"], "B");
    let fingers: Vec<u64> = status["fingers"]
        .as_array()
        .expect("fingers array")
        .iter()
        .map(|v| v.as_u64().expect("finger bit"))
        .collect();
    assert_eq!(fingers.len(), 5);
    assert!(fingers.iter().all(|&b| b <= 1));
    assert_eq!(fingers, vec![0, 1, 1, 1, 1]);
}

#[test]
fn clear_then_status_reports_empty_word() {
    let state = Arc::new(SharedState::new(Duration::from_millis(10)));
    state.observe(Some(&hand_for_b()), Instant::now());
    let base = spawn_server(state);

    let cleared = get_json(&format!("{base}/clear"));
    assert_eq!(cleared["success"], true);

    let status = get_json(&format!("{base}/status"));
    assert_eq!(status["word"], "");
}

#[test]
fn unknown_route_is_not_found() {
    let state = Arc::new(SharedState::new(Duration::from_millis(10)));
    let base = spawn_server(state);

    let response = reqwest::blocking::get(format!("{base}/nope")).expect("request failed");
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn index_serves_html() {
    let state = Arc::new(SharedState::new(Duration::from_millis(10)));
    let base = spawn_server(state);

    let response = reqwest::blocking::get(format!("{base}/")).expect("request failed");
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .starts_with("text/html")
    );
    let body = response.text().expect("body read failed");
    assert!(body.contains("/video_feed"));
}
