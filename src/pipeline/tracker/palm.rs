//! SSD-style palm detection: anchor decode plus non-maximum suppression.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::tensor::{Letterbox, prepare_letterboxed};
use crate::types::Frame;

pub const PALM_INPUT_SIZE: u32 = 192;
const NUM_PALM_KEYPOINTS: usize = 7;
const BOX_FEATURES: usize = 4 + NUM_PALM_KEYPOINTS * 2;

/// One detected palm, in frame pixel coordinates.
#[derive(Clone, Debug)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 8,
        }
    }
}

/// Anchor center in input-normalized coordinates. The model was exported
/// with the MediaPipe SSD anchor layout: a 24x24 grid with 2 anchors per
/// cell (stride 8) followed by a 12x12 grid with 6 per cell (stride 16).
#[derive(Clone, Copy, Debug)]
struct Anchor {
    x: f32,
    y: f32,
}

fn generate_anchors() -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(2016);
    for (grid, per_cell) in [(24u32, 2usize), (12, 6)] {
        for row in 0..grid {
            for col in 0..grid {
                let x = (col as f32 + 0.5) / grid as f32;
                let y = (row as f32 + 0.5) / grid as f32;
                for _ in 0..per_cell {
                    anchors.push(Anchor { x, y });
                }
            }
        }
    }
    anchors
}

pub struct PalmDetector {
    session: Session,
    cfg: PalmDetectorConfig,
    anchors: Vec<Anchor>,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load palm detector from {}", model_path.display())
            })?;

        Ok(Self {
            session,
            cfg,
            anchors: generate_anchors(),
        })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, letterbox) = prepare_letterboxed(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;

        let candidates = decode_detections(
            boxes
                .as_slice()
                .ok_or_else(|| anyhow!("palm boxes not contiguous"))?,
            scores
                .as_slice()
                .ok_or_else(|| anyhow!("palm scores not contiguous"))?,
            &self.anchors,
            &letterbox,
            self.cfg.score_threshold,
        )?;

        Ok(non_max_suppression(
            candidates,
            self.cfg.nms_threshold,
            self.cfg.top_k,
        ))
    }
}

fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit.clamp(-80.0, 80.0)).exp())
}

fn decode_detections(
    boxes: &[f32],
    scores: &[f32],
    anchors: &[Anchor],
    letterbox: &Letterbox,
    score_threshold: f32,
) -> Result<Vec<PalmRegion>> {
    if boxes.len() < anchors.len() * BOX_FEATURES || scores.len() < anchors.len() {
        return Err(anyhow!(
            "palm output sizes {}/{} do not cover {} anchors",
            boxes.len(),
            scores.len(),
            anchors.len()
        ));
    }

    let input = PALM_INPUT_SIZE as f32;
    let mut regions = Vec::new();
    for (i, anchor) in anchors.iter().enumerate() {
        let score = sigmoid(scores[i]);
        if score < score_threshold {
            continue;
        }

        let raw = &boxes[i * BOX_FEATURES..(i + 1) * BOX_FEATURES];
        // Offsets are in input pixels relative to the anchor center.
        let cx = (raw[0] / input + anchor.x) * input;
        let cy = (raw[1] / input + anchor.y) * input;
        let w = raw[2];
        let h = raw[3];

        let (x1, y1) = letterbox.unproject(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unproject(cx + w / 2.0, cy + h / 2.0);

        let keypoints = (0..NUM_PALM_KEYPOINTS)
            .map(|k| {
                let kx = (raw[4 + k * 2] / input + anchor.x) * input;
                let ky = (raw[5 + k * 2] / input + anchor.y) * input;
                letterbox.unproject(kx, ky)
            })
            .collect();

        regions.push(PalmRegion {
            bbox: [x1, y1, x2, y2],
            keypoints,
            score,
        });
    }
    Ok(regions)
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn non_max_suppression(
    mut candidates: Vec<PalmRegion>,
    nms_threshold: f32,
    top_k: usize,
) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<PalmRegion> = Vec::new();
    for candidate in candidates {
        if kept.len() >= top_k {
            break;
        }
        if kept
            .iter()
            .all(|k| iou(&k.bbox, &candidate.bbox) < nms_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
