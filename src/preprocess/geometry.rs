// 该文件是 Shibie （识别） 项目的一部分。
// src/preprocess/geometry.rs - 裁剪、等比缩放与居中
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

use image::{
  Rgba, RgbaImage,
  imageops::{self, FilterType},
};
use tracing::debug;

use crate::{
  frame::{RGBA_CHANNELS, RawImage},
  preprocess::{BoundingBox, PreprocessError, check_target_size},
  tensor::Tensor,
};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 将 `bbox` 内的内容等比缩放到 `target_size` 画布并居中，输出 `[1, 1, S, S]` 灰度张量
///
/// 较长边映射为画布的 `content_fraction`，其余区域为黑色背景。
/// `bbox` 为 `None` 或面积为零时返回全零张量。
pub fn normalize(
  image: &RawImage,
  bbox: Option<&BoundingBox>,
  target_size: u32,
  content_fraction: f32,
) -> Result<Tensor, PreprocessError> {
  check_target_size(target_size)?;
  if !(content_fraction > 0.0 && content_fraction <= 1.0) {
    return Err(PreprocessError::invalid(format!(
      "内容占比必须位于 (0, 1]: {}",
      content_fraction
    )));
  }

  let side = target_size as usize;
  let shape = [1, 1, side, side];

  let bbox = match bbox {
    Some(bbox) if !bbox.is_degenerate() => bbox,
    _ => return Ok(Tensor::zeros(&shape)),
  };

  let cropped = extract(image, bbox);
  if cropped.width() == 0 || cropped.height() == 0 {
    return Ok(Tensor::zeros(&shape));
  }

  let size = bbox.width.max(bbox.height) as f32;
  let scale = target_size as f32 * content_fraction / size;
  // 缩放后至少保留一个像素，且不超出画布
  let scaled_width = ((bbox.width as f32 * scale).round() as u32).clamp(1, target_size);
  let scaled_height = ((bbox.height as f32 * scale).round() as u32).clamp(1, target_size);
  let offset_x = (target_size - scaled_width) / 2;
  let offset_y = (target_size - scaled_height) / 2;
  debug!(
    "缩放比例 {:.4}, 缩放后尺寸 {}x{}, 偏移 ({}, {})",
    scale, scaled_width, scaled_height, offset_x, offset_y
  );

  // 按像素中心重采样，边缘取最近的源像素
  let scaled = imageops::resize(&cropped, scaled_width, scaled_height, FilterType::Triangle);
  let mut canvas = RgbaImage::from_pixel(target_size, target_size, BACKGROUND);
  imageops::replace(&mut canvas, &scaled, offset_x as i64, offset_y as i64);

  let data = canvas
    .as_raw()
    .chunks_exact(RGBA_CHANNELS)
    .map(|p| (p[0] as f32 + p[1] as f32 + p[2] as f32) / 3.0 / 255.0)
    .collect();

  Tensor::new(&shape, data).map_err(|e| PreprocessError::invalid(e.to_string()))
}

// 逐像素复制，不做重采样
fn extract(image: &RawImage, bbox: &BoundingBox) -> RgbaImage {
  let x = bbox.x.min(image.width());
  let y = bbox.y.min(image.height());
  let width = bbox.width.min(image.width() - x);
  let height = bbox.height.min(image.height() - y);
  imageops::crop_imm(image.as_rgba_image(), x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(tensor: &Tensor, x: usize, y: usize) -> f32 {
    let (_, _, _, w) = tensor.nchw().unwrap();
    tensor.data()[y * w + x]
  }

  #[test]
  fn missing_box_gives_zero_tensor() {
    let image = RawImage::filled(16, 16, [255, 255, 255, 255]).unwrap();
    let tensor = normalize(&image, None, 28, 20.0 / 28.0).unwrap();
    assert_eq!(tensor.shape(), &[1, 1, 28, 28]);
    assert!(tensor.data().iter().all(|&v| v == 0.0));
  }

  #[test]
  fn degenerate_box_gives_zero_tensor() {
    let image = RawImage::filled(16, 16, [255, 255, 255, 255]).unwrap();
    let bbox = BoundingBox {
      x: 3,
      y: 3,
      width: 0,
      height: 5,
    };
    let tensor = normalize(&image, Some(&bbox), 28, 20.0 / 28.0).unwrap();
    assert!(tensor.data().iter().all(|&v| v == 0.0));
  }

  fn lit_columns(tensor: &Tensor, y: usize) -> Option<(usize, usize)> {
    let (_, _, _, w) = tensor.nchw().unwrap();
    let lit: Vec<usize> = (0..w).filter(|&x| at(tensor, x, y) > 0.0).collect();
    Some((*lit.first()?, *lit.last()?))
  }

  fn lit_count(tensor: &Tensor) -> usize {
    tensor.data().iter().filter(|&&v| v > 0.0).count()
  }

  #[test]
  fn square_content_is_centered() {
    let image = RawImage::filled(10, 10, [255, 255, 255, 255]).unwrap();
    let bbox = BoundingBox {
      x: 0,
      y: 0,
      width: 10,
      height: 10,
    };
    // 10 像素 -> 20 像素，偏移 4，占据 4..=23
    let tensor = normalize(&image, Some(&bbox), 28, 20.0 / 28.0).unwrap();
    assert_eq!(at(&tensor, 14, 14), 1.0);
    assert_eq!(at(&tensor, 4, 4), 1.0);
    assert_eq!(at(&tensor, 22, 14), 1.0);
    assert_eq!(at(&tensor, 23, 23), 1.0);
    assert_eq!(at(&tensor, 3, 14), 0.0);
    assert_eq!(at(&tensor, 24, 14), 0.0);
    assert_eq!(at(&tensor, 14, 24), 0.0);
    assert_eq!(lit_count(&tensor), 20 * 20);

    for y in 0..28 {
      if let Some((first, last)) = lit_columns(&tensor, y) {
        assert_eq!(first, 27 - last, "第 {} 行不对称", y);
      }
    }
  }

  #[test]
  fn single_pixel_box_fills_content_area() {
    let image = RawImage::filled(5, 5, [255, 255, 255, 255]).unwrap();
    let bbox = BoundingBox {
      x: 2,
      y: 2,
      width: 1,
      height: 1,
    };
    let tensor = normalize(&image, Some(&bbox), 28, 20.0 / 28.0).unwrap();
    assert_eq!(lit_count(&tensor), 20 * 20);
    assert_eq!(at(&tensor, 4, 4), 1.0);
    assert_eq!(at(&tensor, 23, 23), 1.0);
  }

  #[test]
  fn thin_vertical_line_is_kept() {
    let image = RawImage::filled(1, 20, [255, 255, 255, 255]).unwrap();
    let bbox = BoundingBox {
      x: 0,
      y: 0,
      width: 1,
      height: 20,
    };
    // 缩放 1.0: 1x20，横向偏移 13
    let tensor = normalize(&image, Some(&bbox), 28, 20.0 / 28.0).unwrap();
    assert_eq!(lit_count(&tensor), 20);
    for y in 4..24 {
      assert_eq!(lit_columns(&tensor, y), Some((13, 13)));
    }
    assert_eq!(lit_columns(&tensor, 3), None);
    assert_eq!(lit_columns(&tensor, 24), None);
  }

  #[test]
  fn wide_content_keeps_aspect_ratio() {
    let image = RawImage::filled(40, 10, [255, 255, 255, 255]).unwrap();
    let bbox = BoundingBox {
      x: 0,
      y: 0,
      width: 40,
      height: 10,
    };
    // 缩放 0.5: 内容为 20x5，偏移 (4, 11)
    let tensor = normalize(&image, Some(&bbox), 28, 20.0 / 28.0).unwrap();
    assert_eq!(tensor.shape(), &[1, 1, 28, 28]);
    assert_eq!(lit_count(&tensor), 20 * 5);
    for y in 11..16 {
      assert_eq!(lit_columns(&tensor, y), Some((4, 23)));
    }
    assert_eq!(lit_columns(&tensor, 10), None);
    assert_eq!(lit_columns(&tensor, 16), None);
  }

  #[test]
  fn values_stay_in_unit_range() {
    let mut data = Vec::new();
    for i in 0..(37 * 23) {
      let v = (i * 7 % 256) as u8;
      data.extend_from_slice(&[v, 255 - v, v / 2, 255]);
    }
    let image = RawImage::new(37, 23, data).unwrap();
    let bbox = BoundingBox {
      x: 5,
      y: 2,
      width: 30,
      height: 19,
    };
    for size in [1, 7, 28, 64] {
      let tensor = normalize(&image, Some(&bbox), size, 0.8).unwrap();
      assert_eq!(tensor.shape(), &[1, 1, size as usize, size as usize]);
      assert!(tensor.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
  }

  #[test]
  fn invalid_content_fraction_is_rejected() {
    let image = RawImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
    assert!(normalize(&image, None, 28, 0.0).is_err());
    assert!(normalize(&image, None, 28, 1.5).is_err());
  }
}
