pub mod camera;
pub mod overlay;
pub mod rgba;
pub mod tracker;

pub use camera::{CameraStream, start_camera_stream};
pub use tracker::{HandTracker, TrackerBackend, start_tracker};

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};

use crate::types::TrackedFrame;

/// Wire camera capture into the tracking worker. Returns the result channel
/// and the camera handle; dropping the handle stops capture, which in turn
/// ends the worker.
pub fn start(camera_index: u32, backend: TrackerBackend) -> Result<(Receiver<TrackedFrame>, CameraStream)> {
    let (frame_tx, frame_rx) = bounded(1);
    let (result_tx, result_rx) = bounded(1);

    let camera = start_camera_stream(camera_index, frame_tx)?;
    start_tracker(backend, frame_rx, result_tx);

    Ok((result_rx, camera))
}
