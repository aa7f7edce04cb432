//! Web front-end: status JSON, clear, and an MJPEG stream.

use std::{
    io::{Cursor, Read},
    sync::{Arc, Condvar, Mutex},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow};
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::{
    pipeline::{self, TrackerBackend, overlay},
    types::{Frame, TrackedHand},
    word::{Tick, WordBuilder},
};

use super::hand_letter;

const JPEG_QUALITY: u8 = 80;
const STREAM_BOUNDARY: &str = "frame";

#[derive(Serialize)]
pub struct StatusResponse {
    pub word: String,
    pub fingers: [u8; 5],
}

#[derive(Serialize)]
struct ClearResponse {
    success: bool,
}

/// Word and finger snapshot shared between the tracking consumer (sole
/// writer) and the request handlers. One mutex makes reads and writes
/// atomic; nothing beyond last-write-wins is needed.
pub struct SharedState {
    inner: Mutex<StateInner>,
}

struct StateInner {
    builder: WordBuilder,
    fingers: [u8; 5],
}

impl SharedState {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                builder: WordBuilder::new(interval),
                fingers: [0; 5],
            }),
        }
    }

    /// Feed one tracked frame. Fingers update whenever a hand is visible on
    /// an evaluated tick; the word follows the debounce rules.
    pub fn observe(&self, hand: Option<&TrackedHand>, now: Instant) {
        let (state, letter) = hand_letter(hand);
        let mut inner = self.inner.lock().unwrap();
        if inner.builder.observe(letter, now) != Tick::Skipped {
            if let Some(state) = state {
                inner.fingers = state.bits();
            }
        }
    }

    pub fn status(&self) -> StatusResponse {
        let inner = self.inner.lock().unwrap();
        StatusResponse {
            word: inner.builder.word().to_string(),
            fingers: inner.fingers,
        }
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().builder.clear();
    }
}

/// Latest encoded frame plus a condition variable, so stream handlers block
/// until a new frame arrives instead of spinning.
pub struct FrameHub {
    state: Mutex<HubState>,
    cond: Condvar,
}

#[derive(Default)]
struct HubState {
    seq: u64,
    jpeg: Option<Arc<Vec<u8>>>,
}

impl FrameHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            cond: Condvar::new(),
        }
    }

    pub fn publish(&self, jpeg: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.seq += 1;
        state.jpeg = Some(Arc::new(jpeg));
        self.cond.notify_all();
    }

    /// Block until a frame newer than `last_seq` is available, or the
    /// timeout passes.
    pub fn wait_newer(&self, last_seq: u64, timeout: Duration) -> Option<(u64, Arc<Vec<u8>>)> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        loop {
            if state.seq != last_seq {
                if let Some(jpeg) = state.jpeg.clone() {
                    return Some((state.seq, jpeg));
                }
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, result) = self.cond.wait_timeout(state, remaining).unwrap();
            state = guard;
            if result.timed_out() && state.seq == last_seq {
                return None;
            }
        }
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Endless multipart JPEG reader backing `/video_feed`. Each part carries
/// the `frame` boundary; the reader blocks on the hub between parts.
pub struct MjpegStream {
    hub: Arc<FrameHub>,
    last_seq: u64,
    pending: Vec<u8>,
    pos: usize,
}

impl MjpegStream {
    pub fn new(hub: Arc<FrameHub>) -> Self {
        Self {
            hub,
            last_seq: 0,
            pending: Vec::new(),
            pos: 0,
        }
    }

    fn next_part(&mut self) {
        loop {
            if let Some((seq, jpeg)) = self
                .hub
                .wait_newer(self.last_seq, Duration::from_secs(5))
            {
                self.last_seq = seq;
                let mut part = Vec::with_capacity(jpeg.len() + 64);
                part.extend_from_slice(
                    format!("--{STREAM_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n").as_bytes(),
                );
                part.extend_from_slice(&jpeg);
                part.extend_from_slice(b"\r\n");
                self.pending = part;
                self.pos = 0;
                return;
            }
        }
    }
}

impl Read for MjpegStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.pending.len() {
            self.next_part();
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>> {
    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .context("JPEG encode failed")?;
    Ok(out.into_inner())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>ASL Translator</title>
    <style>
        body {
            font-family: 'Open Sans', sans-serif;
            background-color: #1E2229;
            color: #fff;
            text-align: center;
            padding-top: 30px;
            display: flex;
            flex-direction: column;
            align-items: center;
            height: 100vh;
        }
        .main-content {
            background-color: rgba(0, 0, 0, 0.1);
            padding: 20px;
            border-radius: 12px;
            box-shadow: 0px 0px 15px rgba(0, 0, 0, 0.2);
        }
        h1 {
            font-size: 2.5em;
            font-weight: bold;
        }
        p, button {
            font-size: 1.3em;
            margin-top: 10px;
            color: #eee;
        }
        img {
            margin-top: 20px;
            border-radius: 12px;
        }
        .clear-button {
            background-color: #1E7A54;
            border: none;
            padding: 10px 20px;
            font-size: 1.5em;
            font-weight: bold;
            cursor: pointer;
        }
        .clear-button:hover {
            background-color: #2C3E50;
        }
    </style>
</head>
<body>
    <div class="title-area">
        <h1>Live ASL Translation</h1>
        <button class="clear-button" onclick="clearWord()">Clear</button>
    </div>
    <div class="main-content">
        <p id="word">Loading...</p>
        <p id="fingers">Loading...</p>
        <img id="video" src="/video_feed" width="640" height="480">
    </div>
    <script>
        async function fetchData() {
            const res = await fetch('/status');
            const data = await res.json();
            document.getElementById("word").textContent = "Current Word: " + data.word;
            document.getElementById("fingers").textContent = "Finger State: " + data.fingers.join(", ");
        }
        async function clearWord() {
            await fetch('/clear');
            fetchData();
        }
        setInterval(fetchData, 1000);
        fetchData();
    </script>
</body>
</html>
"#;

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

fn json_response<T: Serialize>(body: &T) -> Response<Cursor<Vec<u8>>> {
    let json = serde_json::to_vec(body).expect("serializable response");
    Response::from_data(json).with_header(header("Content-Type", "application/json"))
}

fn handle_request(request: Request, state: &Arc<SharedState>, hub: &Arc<FrameHub>) {
    if *request.method() != Method::Get {
        let _ = request.respond(Response::from_string("method not allowed").with_status_code(405));
        return;
    }

    let url = request.url().to_string();
    let result = match url.as_str() {
        "/" => request.respond(
            Response::from_string(INDEX_HTML)
                .with_header(header("Content-Type", "text/html; charset=utf-8")),
        ),
        "/status" => request.respond(json_response(&state.status())),
        "/clear" => {
            state.clear();
            request.respond(json_response(&ClearResponse { success: true }))
        }
        "/video_feed" => {
            let stream = MjpegStream::new(hub.clone());
            let response = Response::new(
                StatusCode(200),
                vec![header(
                    "Content-Type",
                    &format!("multipart/x-mixed-replace; boundary={STREAM_BOUNDARY}"),
                )],
                stream,
                None,
                None,
            );
            request.respond(response)
        }
        _ => request.respond(Response::from_string("not found").with_status_code(404)),
    };

    if let Err(err) = result {
        log::debug!("client connection dropped: {err:?}");
    }
}

/// Accept loop. One thread per request, so a long-lived stream never blocks
/// the JSON routes.
pub fn run_server(server: Server, state: Arc<SharedState>, hub: Arc<FrameHub>) {
    for request in server.incoming_requests() {
        let state = state.clone();
        let hub = hub.clone();
        thread::spawn(move || handle_request(request, &state, &hub));
    }
}

/// `fingerspell serve`: camera + tracker feeding the shared snapshot and
/// frame hub, with the HTTP surface on the main thread.
pub fn run(camera_index: u32, port: u16, interval: Duration) -> Result<()> {
    let (result_rx, _camera) = pipeline::start(camera_index, TrackerBackend::default())?;

    let state = Arc::new(SharedState::new(interval));
    let hub = Arc::new(FrameHub::new());

    let consumer_state = state.clone();
    let consumer_hub = hub.clone();
    thread::spawn(move || {
        for tracked in result_rx {
            consumer_state.observe(tracked.hand.as_ref(), Instant::now());

            let mut frame = tracked.frame;
            if let Some(hand) = &tracked.hand {
                overlay::draw_hand(&mut frame.rgba, frame.width, frame.height, &hand.projected);
            }
            match encode_jpeg(&frame) {
                Ok(jpeg) => consumer_hub.publish(jpeg),
                Err(err) => log::warn!("failed to encode stream frame: {err:?}"),
            }
        }
    });

    let server = Server::http(("0.0.0.0", port))
        .map_err(|err| anyhow!("failed to bind HTTP server on port {port}: {err}"))?;
    log::info!("serving on http://0.0.0.0:{port}");
    println!("Serving on http://0.0.0.0:{port}");

    run_server(server, state, hub);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn status_starts_empty() {
        let state = SharedState::new(Duration::from_secs(1));
        let status = state.status();
        assert_eq!(status.word, "");
        assert_eq!(status.fingers, [0; 5]);
    }

    #[test]
    fn status_serializes_word_and_fingers() {
        let state = SharedState::new(Duration::from_secs(1));
        let json = serde_json::to_value(state.status()).unwrap();
        assert_eq!(json["word"], "");
        assert_eq!(json["fingers"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn hub_wakes_waiting_reader() {
        let hub = Arc::new(FrameHub::new());
        let waiter = hub.clone();
        let handle = thread::spawn(move || waiter.wait_newer(0, Duration::from_secs(5)));
        // Give the waiter a moment to block.
        thread::sleep(Duration::from_millis(50));
        hub.publish(vec![1, 2, 3]);
        let (seq, jpeg) = handle.join().unwrap().expect("publish must wake the waiter");
        assert_eq!(seq, 1);
        assert_eq!(*jpeg, vec![1, 2, 3]);
    }

    #[test]
    fn hub_wait_times_out_without_frames() {
        let hub = FrameHub::new();
        assert!(hub.wait_newer(0, Duration::from_millis(20)).is_none());
    }

    #[test]
    fn mjpeg_parts_carry_boundary_and_payload() {
        let hub = Arc::new(FrameHub::new());
        hub.publish(vec![0xFF, 0xD8, 0xFF]);

        let mut stream = MjpegStream::new(hub);
        let mut part = vec![0u8; 256];
        let mut read = 0;
        // One part is shorter than 256 bytes; read until the reader would
        // block on the next frame.
        let expected = "--frame\r\nContent-Type: image/jpeg\r\n\r\n".len() + 3 + 2;
        while read < expected {
            read += stream.read(&mut part[read..]).unwrap();
        }
        let text = String::from_utf8_lossy(&part[..read]);
        assert!(text.starts_with("--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
        assert!(part[..read].ends_with(&[0xFF, 0xD8, 0xFF, b'\r', b'\n']));
    }

    #[test]
    fn encode_jpeg_produces_jfif_bytes() {
        let frame = Frame {
            rgba: vec![200u8; 8 * 8 * 4],
            width: 8,
            height: 8,
            timestamp: Instant::now(),
        };
        let jpeg = encode_jpeg(&frame).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
