use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::Result;
use crossbeam_channel::Sender;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
};

use super::rgba;
use crate::types::Frame;

/// Pixel formats widely supported across platforms; built-in macOS cameras
/// often reject YUYV even though Nokhwa reports it.
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("could not open camera {index} with any supported format")]
    OpenFailed { index: u32 },
}

/// Handle to the background capture thread. Stops and joins on drop.
#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn open_camera(index: u32) -> Result<Camera> {
    for requested in requested_formats() {
        if let Ok(mut camera) = Camera::new(CameraIndex::Index(index), requested) {
            if camera.open_stream().is_ok() {
                return Ok(camera);
            }
        }
    }
    Err(CameraError::OpenFailed { index }.into())
}

/// Spawn the capture loop. Frames are decoded to RGBA, mirrored, and
/// forwarded with `try_send` so a busy consumer drops frames rather than
/// building a queue.
pub fn start_camera_stream(index: u32, frame_tx: Sender<Frame>) -> Result<CameraStream> {
    // Fail fast before spawning the capture thread.
    drop(open_camera(index)?);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match open_camera(index) {
            Ok(cam) => cam,
            Err(err) => {
                log::error!("failed to reopen camera {index}: {err:?}");
                return;
            }
        };

        while !stop_flag.load(Ordering::Relaxed) {
            let read_start = Instant::now();
            let buffer = match camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!(
                        "camera frame read failed (after {:?}): {err:?}",
                        read_start.elapsed()
                    );
                    continue;
                }
            };

            let mut decoded = match rgba::decode_camera_buffer(&buffer) {
                Ok(frame) => frame,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    continue;
                }
            };

            rgba::mirror_horizontal(&mut decoded.rgba, decoded.width, decoded.height);

            let _ = frame_tx.try_send(Frame {
                rgba: decoded.rgba,
                width: decoded.width,
                height: decoded.height,
                timestamp: Instant::now(),
            });
        }
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}
