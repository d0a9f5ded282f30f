// 该文件是 Shibie （识别） 项目的一部分。
// src/preprocess/bbox.rs - 前景边界框检测
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

use serde::Serialize;

use crate::frame::{RGBA_CHANNELS, RawImage};

/// 图像坐标下的轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl BoundingBox {
  pub fn is_degenerate(&self) -> bool {
    self.width == 0 || self.height == 0
  }
}

/// 查找亮度高于阈值的所有像素的最小外接矩形，并向外扩展 `margin`
///
/// 亮度为 R、G、B 的算术平均（忽略 alpha）。没有前景像素时返回 `None`，
/// 这表示空输入而非错误。扩展后的矩形被限制在图像范围内。
pub fn detect(image: &RawImage, brightness_threshold: f32, margin: u32) -> Option<BoundingBox> {
  let width = image.width();
  let height = image.height();

  let mut min_x = u32::MAX;
  let mut min_y = u32::MAX;
  let mut max_x = 0u32;
  let mut max_y = 0u32;
  let mut found = false;

  for (i, pixel) in image.as_raw().chunks_exact(RGBA_CHANNELS).enumerate() {
    let brightness = (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / 3.0;
    if brightness <= brightness_threshold {
      continue;
    }

    let x = (i % width as usize) as u32;
    let y = (i / width as usize) as u32;
    found = true;
    min_x = min_x.min(x);
    max_x = max_x.max(x);
    min_y = min_y.min(y);
    max_y = max_y.max(y);
  }

  if !found {
    return None;
  }

  // 右/下边界为开区间
  let x0 = min_x.saturating_sub(margin);
  let y0 = min_y.saturating_sub(margin);
  let x1 = max_x.saturating_add(1).saturating_add(margin).min(width);
  let y1 = max_y.saturating_add(1).saturating_add(margin).min(height);

  Some(BoundingBox {
    x: x0,
    y: y0,
    width: x1.saturating_sub(x0),
    height: y1.saturating_sub(y0),
  })
}
