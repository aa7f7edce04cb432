//! Frame-to-tensor preparation for the ONNX models.

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::types::Frame;

fn check_frame(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    Ok(())
}

/// How a frame was scaled and padded into a square model input.
#[derive(Clone, Copy, Debug)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    /// Map a point in model-input pixels back to frame pixels.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        let px = (x - self.pad_x) / self.scale;
        let py = (y - self.pad_y) / self.scale;
        (
            px.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            py.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

/// An axis-aligned square crop of a frame, possibly extending past its
/// edges (the overhang samples as black).
#[derive(Clone, Copy, Debug)]
pub struct CropBox {
    pub x0: f32,
    pub y0: f32,
    pub side: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl CropBox {
    pub fn centered(center: (f32, f32), side: f32, orig_w: u32, orig_h: u32) -> Self {
        Self {
            x0: center.0 - side / 2.0,
            y0: center.1 - side / 2.0,
            side,
            orig_w,
            orig_h,
        }
    }

    /// Map a point in crop-input pixels back to frame pixels.
    pub fn project(&self, x: f32, y: f32, input_size: u32) -> (f32, f32) {
        let scale = self.side / input_size as f32;
        let px = self.x0 + x * scale;
        let py = self.y0 + y * scale;
        (
            px.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            py.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

fn resize_rgba(src: fir::images::Image<'_>, dst_w: u32, dst_h: u32) -> Result<Vec<u8>> {
    let mut dst = fir::images::Image::new(dst_w, dst_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src, &mut dst, Some(&options))
        .context("fast resize failed")?;
    Ok(dst.into_vec())
}

fn rgba_to_input(canvas: &[u8], size: u32) -> Result<Array4<f32>> {
    let normalized: Vec<f32> = canvas
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ]
        })
        .collect();
    Array4::from_shape_vec((1, size as usize, size as usize, 3), normalized)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))
}

/// Scale the whole frame into a `target x target` square, centered with
/// black padding, and normalize to an NHWC float tensor.
pub fn prepare_letterboxed(frame: &Frame, target: u32) -> Result<(Array4<f32>, Letterbox)> {
    check_frame(frame)?;

    let scale = target as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;

    let src = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let resized = resize_rgba(src, new_w, new_h)?;

    let pad_x = (target.saturating_sub(new_w) / 2) as usize;
    let pad_y = (target.saturating_sub(new_h) / 2) as usize;
    let mut canvas = vec![0u8; (target as usize) * (target as usize) * 4];
    for px in canvas.chunks_mut(4) {
        px[3] = 255;
    }
    let dst_stride = target as usize * 4;
    let src_stride = new_w as usize * 4;
    for row in 0..(new_h as usize) {
        let dst_offset = (pad_y + row) * dst_stride + pad_x * 4;
        canvas[dst_offset..dst_offset + src_stride]
            .copy_from_slice(&resized[row * src_stride..(row + 1) * src_stride]);
    }

    let input = rgba_to_input(&canvas, target)?;
    let letterbox = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };
    Ok((input, letterbox))
}

/// Extract a square crop, pad any overhang with black, and resize to
/// `target x target` as an NHWC float tensor.
pub fn prepare_crop(frame: &Frame, crop: &CropBox, target: u32) -> Result<Array4<f32>> {
    check_frame(frame)?;

    let side = crop.side.round().max(1.0) as u32;
    let mut canvas = vec![0u8; (side as usize) * (side as usize) * 4];
    for px in canvas.chunks_mut(4) {
        px[3] = 255;
    }

    let x0 = crop.x0.round() as i64;
    let y0 = crop.y0.round() as i64;
    let frame_stride = frame.width as usize * 4;
    let crop_stride = side as usize * 4;

    for row in 0..side as i64 {
        let src_y = y0 + row;
        if src_y < 0 || src_y >= frame.height as i64 {
            continue;
        }
        let src_x_start = x0.clamp(0, frame.width as i64);
        let src_x_end = (x0 + side as i64).clamp(0, frame.width as i64);
        if src_x_start >= src_x_end {
            continue;
        }
        let dst_x_start = (src_x_start - x0) as usize;
        let copy_px = (src_x_end - src_x_start) as usize;

        let src_offset = src_y as usize * frame_stride + src_x_start as usize * 4;
        let dst_offset = row as usize * crop_stride + dst_x_start * 4;
        canvas[dst_offset..dst_offset + copy_px * 4]
            .copy_from_slice(&frame.rgba[src_offset..src_offset + copy_px * 4]);
    }

    let src = fir::images::Image::from_vec_u8(side, side, canvas, fir::PixelType::U8x4)?;
    let resized = resize_rgba(src, target, target)?;
    rgba_to_input(&resized, target)
}
