mod handpose;
mod palm;
mod tensor;

use std::{path::PathBuf, thread};

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};

use crate::{
    model_download::{ModelKind, ensure_model_ready},
    types::{Frame, TrackedFrame, TrackedHand},
};

use self::handpose::OrtTracker;

/// Seam between the pipeline and the pose-estimation models, so front-end
/// logic can be exercised without ONNX sessions.
pub trait HandTracker: Send + 'static {
    fn track(&mut self, frame: &Frame) -> Result<Option<TrackedHand>>;
}

#[derive(Clone, Debug)]
pub struct TrackerBackend {
    palm_model_path: PathBuf,
    handpose_model_path: PathBuf,
}

impl Default for TrackerBackend {
    fn default() -> Self {
        Self {
            palm_model_path: ModelKind::PalmDetector.default_path(),
            handpose_model_path: ModelKind::HandposeEstimator.default_path(),
        }
    }
}

/// Spawn the tracking worker. It always works on the newest available frame
/// and forwards results with `try_send`, so slow consumers see fresh data
/// rather than a backlog.
pub fn start_tracker(
    backend: TrackerBackend,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<TrackedFrame>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = ensure_model_ready(ModelKind::PalmDetector, &backend.palm_model_path) {
            log::error!("failed to prepare palm detector model: {err:?}");
            return;
        }
        if let Err(err) =
            ensure_model_ready(ModelKind::HandposeEstimator, &backend.handpose_model_path)
        {
            log::error!("failed to prepare handpose model: {err:?}");
            return;
        }

        let tracker = match OrtTracker::new(&backend.palm_model_path, &backend.handpose_model_path)
        {
            Ok(tracker) => {
                log::info!(
                    "hand tracker ready using {} and {}",
                    backend.palm_model_path.display(),
                    backend.handpose_model_path.display()
                );
                tracker
            }
            Err(err) => {
                log::error!("failed to load hand tracking models: {err:?}");
                return;
            }
        };

        run_worker_loop(tracker, frame_rx, result_tx);
    })
}

pub fn run_worker_loop<T: HandTracker>(
    mut tracker: T,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<TrackedFrame>,
) {
    while let Some(frame) = recv_latest_frame(&frame_rx) {
        let hand = match tracker.track(&frame) {
            Ok(hand) => hand,
            Err(err) => {
                log::warn!("hand tracking failed: {err:?}");
                None
            }
        };
        let _ = result_tx.try_send(TrackedFrame { frame, hand });
    }
}

fn recv_latest_frame(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}
