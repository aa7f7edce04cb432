use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    HandTracker,
    palm::{PalmDetector, PalmDetectorConfig, PalmRegion},
    tensor::{CropBox, prepare_crop},
};
use crate::types::{Frame, Landmark, NUM_LANDMARKS, TrackedHand};

pub const HANDPOSE_INPUT_SIZE: u32 = 224;
const MIN_CONFIDENCE: f32 = 0.2;

/// How far the square hand crop extends beyond the detected palm box.
const CROP_EXPANSION: f32 = 2.6;

/// Two-stage ONNX tracker: palm detection narrows the frame to a square
/// crop, then the landmark model runs on the crop.
pub struct OrtTracker {
    palm_detector: PalmDetector,
    handpose: Session,
}

impl OrtTracker {
    pub fn new(palm_model_path: &Path, handpose_model_path: &Path) -> Result<Self> {
        let palm_detector = PalmDetector::new(palm_model_path, PalmDetectorConfig::default())?;
        let handpose = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(handpose_model_path)
            .with_context(|| {
                format!(
                    "failed to load handpose model from {}",
                    handpose_model_path.display()
                )
            })?;

        Ok(Self {
            palm_detector,
            handpose,
        })
    }

    fn infer_landmarks(&mut self, frame: &Frame, crop: &CropBox) -> Result<(Vec<[f32; 3]>, f32)> {
        let input = prepare_crop(frame, crop, HANDPOSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run handpose session")?;
        if outputs.len() == 0 {
            return Err(anyhow!("handpose model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flat: Vec<f32> = coords.iter().copied().collect();
        if flat.len() < NUM_LANDMARKS * 3 {
            return Err(anyhow!(
                "unexpected landmarks length: got {}, need {}",
                flat.len(),
                NUM_LANDMARKS * 3
            ));
        }
        let landmarks: Vec<[f32; 3]> = flat
            .chunks_exact(3)
            .take(NUM_LANDMARKS)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Ok((landmarks, confidence))
    }
}

impl HandTracker for OrtTracker {
    fn track(&mut self, frame: &Frame) -> Result<Option<TrackedHand>> {
        let regions = self.palm_detector.detect(frame)?;
        let Some(primary) = regions.iter().max_by(|a, b| a.score.total_cmp(&b.score)) else {
            return Ok(None);
        };

        let crop = hand_crop(primary, frame.width, frame.height);
        let (raw, model_confidence) = self.infer_landmarks(frame, &crop)?;

        let confidence = (model_confidence * primary.score).clamp(0.0, 1.0);
        if confidence < MIN_CONFIDENCE {
            return Ok(None);
        }

        let projected: Vec<(f32, f32)> = raw
            .iter()
            .map(|[x, y, _z]| crop.project(*x, *y, HANDPOSE_INPUT_SIZE))
            .collect();

        let mut landmarks = [Landmark::default(); NUM_LANDMARKS];
        for (dst, (&(px, py), &[_, _, z])) in
            landmarks.iter_mut().zip(projected.iter().zip(raw.iter()))
        {
            *dst = Landmark {
                x: px / frame.width as f32,
                y: py / frame.height as f32,
                z: z / HANDPOSE_INPUT_SIZE as f32,
            };
        }

        Ok(Some(TrackedHand {
            landmarks,
            projected,
            confidence,
        }))
    }
}

/// Square crop around the palm, widened so the full finger span fits.
/// Centered between the wrist-center and middle-finger keypoints when the
/// detector provides them, on the box otherwise.
fn hand_crop(region: &PalmRegion, frame_w: u32, frame_h: u32) -> CropBox {
    let [x1, y1, x2, y2] = region.bbox;
    let center = match (region.keypoints.first(), region.keypoints.get(2)) {
        (Some(&(wx, wy)), Some(&(mx, my))) => ((wx + mx) / 2.0, (wy + my) / 2.0),
        _ => ((x1 + x2) / 2.0, (y1 + y2) / 2.0),
    };
    let side = ((x2 - x1).max(y2 - y1)).max(1.0) * CROP_EXPANSION;
    CropBox::centered(center, side, frame_w, frame_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_crop_widens_the_palm_box() {
        let region = PalmRegion {
            bbox: [100.0, 100.0, 140.0, 150.0],
            keypoints: Vec::new(),
            score: 0.9,
        };
        let crop = hand_crop(&region, 640, 480);
        assert_eq!(crop.side, 50.0 * CROP_EXPANSION);
        // Centered on the box.
        assert!((crop.x0 + crop.side / 2.0 - 120.0).abs() < 1e-3);
        assert!((crop.y0 + crop.side / 2.0 - 125.0).abs() < 1e-3);
    }

    #[test]
    fn hand_crop_prefers_palm_keypoints() {
        let region = PalmRegion {
            bbox: [0.0, 0.0, 10.0, 10.0],
            keypoints: vec![(2.0, 8.0), (0.0, 0.0), (6.0, 2.0)],
            score: 0.9,
        };
        let crop = hand_crop(&region, 640, 480);
        assert!((crop.x0 + crop.side / 2.0 - 4.0).abs() < 1e-3);
        assert!((crop.y0 + crop.side / 2.0 - 5.0).abs() < 1e-3);
    }
}
