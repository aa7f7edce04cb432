//! Camera pixel-format decode to RGBA.

use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn decode_camera_buffer(buffer: &Buffer) -> Result<DecodedFrame> {
    let resolution = buffer.resolution();
    let width = resolution.width_x;
    let height = resolution.height_y;
    let data = buffer.buffer();

    let rgba = match buffer.source_frame_format() {
        FrameFormat::NV12 => nv12_to_rgba(data, width, height)?,
        FrameFormat::YUYV => yuyv_to_rgba(data, width, height)?,
        FrameFormat::MJPEG => jpeg_to_rgba(data, width, height)?,
        FrameFormat::RAWRGB => packed_to_rgba(data, width, height, [0, 1, 2])?,
        FrameFormat::RAWBGR => packed_to_rgba(data, width, height, [2, 1, 0])?,
        FrameFormat::GRAY => gray_to_rgba(data, width, height)?,
    };

    Ok(DecodedFrame {
        rgba,
        width,
        height,
    })
}

fn check_len(data: &[u8], needed: usize, format: &str) -> Result<()> {
    if data.len() < needed {
        return Err(anyhow!(
            "{format} buffer too small: got {}, expected {needed}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = width as usize * height as usize;
    let uv_len = y_len / 2;
    check_len(data, y_len + uv_len, "NV12")?;

    let mut rgba = vec![0u8; y_len * 4];
    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + uv_len],
        uv_stride: width,
        width,
        height,
    };

    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_len(data, width as usize * height as usize * 2, "YUYV")?;

    let mut rgba = vec![0u8; (width as usize * height as usize) * 4];
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn jpeg_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    check_len(&rgba, width as usize * height as usize * 4, "decoded MJPEG")?;
    Ok(rgba)
}

fn packed_to_rgba(data: &[u8], width: u32, height: u32, order: [usize; 3]) -> Result<Vec<u8>> {
    check_len(data, width as usize * height as usize * 3, "RGB")?;

    let mut rgba = vec![0u8; (width as usize * height as usize) * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[order[0]];
            dst[1] = src[order[1]];
            dst[2] = src[order[2]];
            dst[3] = 255;
        });

    Ok(rgba)
}

fn gray_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let len = width as usize * height as usize;
    check_len(data, len, "GRAY")?;

    let mut rgba = vec![0u8; len * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_iter().copied())
        .for_each(|(dst, value)| {
            dst[0] = value;
            dst[1] = value;
            dst[2] = value;
            dst[3] = 255;
        });

    Ok(rgba)
}

/// Flip an RGBA buffer left-to-right in place.
pub fn mirror_horizontal(rgba: &mut [u8], width: u32, height: u32) {
    let stride = width as usize * 4;
    for row in 0..height as usize {
        let line = &mut rgba[row * stride..(row + 1) * stride];
        let mut left = 0usize;
        let mut right = width as usize - 1;
        while left < right {
            for c in 0..4 {
                line.swap(left * 4 + c, right * 4 + c);
            }
            left += 1;
            right -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_expands_to_opaque_rgba() {
        let rgba = gray_to_rgba(&[0, 128, 255, 7], 2, 2).unwrap();
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[128, 128, 128, 255]);
    }

    #[test]
    fn bgr_order_swaps_channels() {
        let rgba = packed_to_rgba(&[10, 20, 30], 1, 1, [2, 1, 0]).unwrap();
        assert_eq!(&rgba[..], &[30, 20, 10, 255]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(packed_to_rgba(&[1, 2], 1, 1, [0, 1, 2]).is_err());
    }

    #[test]
    fn mirror_swaps_columns() {
        // 2x1 image: red pixel, blue pixel.
        let mut rgba = vec![255, 0, 0, 255, 0, 0, 255, 255];
        mirror_horizontal(&mut rgba, 2, 1);
        assert_eq!(&rgba[0..4], &[0, 0, 255, 255]);
        assert_eq!(&rgba[4..8], &[255, 0, 0, 255]);
    }
}
