// 该文件是 Shibie （识别） 项目的一部分。
// src/frame.rs - RGBA 原始图像定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

pub const RGBA_CHANNELS: usize = 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("图像尺寸无效: {0}x{1}")]
  EmptyDimensions(u32, u32),
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 采集层交付的 RGBA8 像素缓冲区，按行交错存储
///
/// 构造后不可变，预处理只读取它并分配新的缓冲区。
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
  image: RgbaImage,
}

impl RawImage {
  pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::EmptyDimensions(width, height));
    }

    let expected = RGBA_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    let actual = data.len();
    let image = RgbaImage::from_raw(width, height, data)
      .ok_or(FrameError::LengthMismatch { expected, actual })?;
    Ok(Self { image })
  }

  /// 以单一颜色填充的图像
  pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, FrameError> {
    let data = rgba
      .iter()
      .copied()
      .cycle()
      .take(RGBA_CHANNELS * width as usize * height as usize)
      .collect();
    Self::new(width, height, data)
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
    self.image.get_pixel(x, y).0
  }

  pub fn as_raw(&self) -> &[u8] {
    self.image.as_raw()
  }

  pub fn as_rgba_image(&self) -> &RgbaImage {
    &self.image
  }
}

impl TryFrom<RgbaImage> for RawImage {
  type Error = FrameError;

  fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(FrameError::EmptyDimensions(width, height));
    }
    Ok(Self { image })
  }
}

impl TryFrom<DynamicImage> for RawImage {
  type Error = FrameError;

  fn try_from(image: DynamicImage) -> Result<Self, Self::Error> {
    RawImage::try_from(image.to_rgba8())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_zero_dimensions() {
    assert_eq!(
      RawImage::new(0, 4, vec![]),
      Err(FrameError::EmptyDimensions(0, 4))
    );
  }

  #[test]
  fn rejects_wrong_buffer_length() {
    assert_eq!(
      RawImage::new(2, 2, vec![0; 15]),
      Err(FrameError::LengthMismatch {
        expected: 16,
        actual: 15
      })
    );
  }

  #[test]
  fn filled_image_repeats_pixel() {
    let image = RawImage::filled(3, 2, [1, 2, 3, 4]).unwrap();
    assert_eq!(image.as_raw().len(), 24);
    assert_eq!(image.pixel(2, 1), [1, 2, 3, 4]);
  }

  #[test]
  fn converts_dynamic_image_to_rgba() {
    let gray = image::GrayImage::from_pixel(2, 3, image::Luma([200]));
    let image = RawImage::try_from(DynamicImage::ImageLuma8(gray)).unwrap();
    assert_eq!((image.width(), image.height()), (2, 3));
    assert_eq!(image.pixel(1, 2), [200, 200, 200, 255]);
  }
}
