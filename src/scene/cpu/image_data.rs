use std::io::Write;
use std::path::Path;

use image::GenericImageView;
use image::codecs::jpeg::JpegEncoder;
use rayon::prelude::*;

use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};

/// The pixel format of the image data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalaPixelFormat {
  Luma8,
  Rgb8,
  Rgba8,
}

impl HalaPixelFormat {
  pub fn channels(&self) -> usize {
    match self {
      HalaPixelFormat::Luma8 => 1,
      HalaPixelFormat::Rgb8 => 3,
      HalaPixelFormat::Rgba8 => 4,
    }
  }
}

/// A captured image kept in memory until it is written out.
#[derive(Clone, Debug, PartialEq)]
pub struct HalaImageData {
  pub format: HalaPixelFormat,
  pub width: u32,
  pub height: u32,
  pub data: Vec<u8>,
}

impl HalaImageData {
  /// Create image data from raw pixels.
  /// param format: The pixel format.
  /// param width: The width.
  /// param height: The height.
  /// param data: The tightly packed pixels.
  /// return: The result.
  pub fn new(format: HalaPixelFormat, width: u32, height: u32, data: Vec<u8>) -> Result<Self, HalaExportError> {
    let expected = width as usize * height as usize * format.channels();
    if data.len() != expected {
      return Err(HalaExportError::new(
        HalaExportErrorKind::Image,
        &format!("The {}x{} {:?} image needs {} bytes but has {}.", width, height, format, expected, data.len()),
        None));
    }
    Ok(Self {
      format,
      width,
      height,
      data,
    })
  }

  /// Create image data with the given file path.
  /// param path: The file path.
  /// return: The result.
  pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, HalaExportError> {
    let path = path.as_ref();

    let img = image::open(path)
      .map_err(|e| HalaExportError::new(
        HalaExportErrorKind::Image,
        &format!("Failed to open image \"{}\".", path.to_string_lossy()),
        Some(Box::new(e))))?;
    let (width, height) = img.dimensions();

    let (format, data) = match img.color() {
      image::ColorType::L8 => (HalaPixelFormat::Luma8, img.into_bytes()),
      image::ColorType::Rgb8 => (HalaPixelFormat::Rgb8, img.into_bytes()),
      image::ColorType::Rgba8 => (HalaPixelFormat::Rgba8, img.into_bytes()),
      _ => (HalaPixelFormat::Rgb8, img.into_rgb8().into_raw()),
    };

    Self::new(format, width, height, data)
  }

  /// Create RGB image data from a bi-planar full range YCbCr 4:2:0 capture.
  /// param width: The luma plane width.
  /// param height: The luma plane height.
  /// param luma: The luma plane.
  /// param luma_stride: The bytes per luma row.
  /// param chroma: The interleaved CbCr plane at half resolution.
  /// param chroma_stride: The bytes per chroma row.
  /// return: The result.
  pub fn from_ycbcr_biplanar(
    width: u32,
    height: u32,
    luma: &[u8],
    luma_stride: usize,
    chroma: &[u8],
    chroma_stride: usize,
  ) -> Result<Self, HalaExportError> {
    let (w, h) = (width as usize, height as usize);
    let chroma_rows = h.div_ceil(2);
    let chroma_row_bytes = w.div_ceil(2) * 2;
    if w == 0 || h == 0
      || luma_stride < w || luma.len() < luma_stride * (h - 1) + w
      || chroma_stride < chroma_row_bytes || chroma.len() < chroma_stride * (chroma_rows - 1) + chroma_row_bytes {
      return Err(HalaExportError::new(
        HalaExportErrorKind::Image,
        &format!("The YCbCr planes do not cover a {}x{} image.", width, height),
        None));
    }

    let mut data = vec![0u8; w * h * 3];
    data.par_chunks_mut(w * 3).enumerate().for_each(|(y, row)| {
      let luma_row = &luma[y * luma_stride..y * luma_stride + w];
      let chroma_row = &chroma[(y / 2) * chroma_stride..(y / 2) * chroma_stride + chroma_row_bytes];
      for x in 0..w {
        let luma_value = luma_row[x] as f32;
        let cb = chroma_row[(x / 2) * 2] as f32 - 128.0;
        let cr = chroma_row[(x / 2) * 2 + 1] as f32 - 128.0;
        let r = luma_value + 1.402 * cr;
        let g = luma_value - 0.344_136 * cb - 0.714_136 * cr;
        let b = luma_value + 1.772 * cb;
        row[x * 3] = r.round().clamp(0.0, 255.0) as u8;
        row[x * 3 + 1] = g.round().clamp(0.0, 255.0) as u8;
        row[x * 3 + 2] = b.round().clamp(0.0, 255.0) as u8;
      }
    });

    Self::new(HalaPixelFormat::Rgb8, width, height, data)
  }

  /// Convert to packed RGB pixels. JPEG carries no alpha.
  fn to_rgb(&self) -> Vec<u8> {
    match self.format {
      HalaPixelFormat::Rgb8 => self.data.clone(),
      HalaPixelFormat::Rgba8 => self.data.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect(),
      HalaPixelFormat::Luma8 => self.data.iter().flat_map(|&l| [l, l, l]).collect(),
    }
  }

  /// Encode the image as JPEG.
  /// param writer: The destination.
  /// param quality: The JPEG quality, 1 to 100.
  /// return: The result.
  pub fn encode_jpeg<W: Write>(&self, writer: &mut W, quality: u8) -> Result<(), HalaExportError> {
    let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
    encoder.encode(&self.to_rgb(), self.width, self.height, image::ExtendedColorType::Rgb8)
      .map_err(|e| HalaExportError::new(
        HalaExportErrorKind::Image,
        &format!("Encode {}x{} image to JPEG failed.", self.width, self.height),
        Some(Box::new(e))))
  }
}
