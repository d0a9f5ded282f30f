// 该文件是 Shibie （识别） 项目的一部分。
// src/output/preview.rs - 模型输入张量可视化
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

use image::{ImageBuffer, Rgb, RgbImage, imageops};

use crate::tensor::Tensor;

// 28x28 放大 5 倍到 140x140
pub const PREVIEW_SCALE: u32 = 5;
pub const MAX_PREVIEW_SCALE: u32 = 64;

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> Option<RgbImage>;
}

impl ToRgbImage for Tensor {
  /// 将 `[1, C, H, W]`（C 为 1 或 3）张量按最小/最大值拉伸回 0..255
  fn to_rgb_image(&self) -> Option<RgbImage> {
    let (_, channels, height, width) = self.nchw()?;
    if channels != 1 && channels != 3 {
      return None;
    }

    let plane = height * width;
    let data = &self.data()[..channels * plane];
    let (min, max) = data
      .iter()
      .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
      });
    let range = max - min;
    let to_u8 = |v: f32| {
      if range > 0.0 {
        ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
      } else {
        0
      }
    };

    // 单通道时三个分量取同一平面
    let offsets = if channels == 1 {
      [0, 0, 0]
    } else {
      [0, plane, 2 * plane]
    };

    Some(ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
      let idx = y as usize * width + x as usize;
      Rgb([
        to_u8(data[offsets[0] + idx]),
        to_u8(data[offsets[1] + idx]),
        to_u8(data[offsets[2] + idx]),
      ])
    }))
  }
}

/// 最近邻放大，保留像素边界；倍数限制在 `1..=MAX_PREVIEW_SCALE`
pub fn upscale(image: &RgbImage, scale: u32) -> RgbImage {
  let scale = scale.clamp(1, MAX_PREVIEW_SCALE);
  imageops::resize(
    image,
    image.width().saturating_mul(scale),
    image.height().saturating_mul(scale),
    imageops::FilterType::Nearest,
  )
}
