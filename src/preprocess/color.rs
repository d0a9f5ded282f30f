// 该文件是 Shibie （识别） 项目的一部分。
// src/preprocess/color.rs - 彩色图像 NCHW 张量构建
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

use image::imageops::{self, FilterType};

use crate::{
  frame::{RGBA_CHANNELS, RawImage},
  preprocess::{PreprocessError, check_target_size},
  tensor::Tensor,
};

const RGB_CHANNELS: usize = 3;

/// 将整幅图像拉伸到 `target_size` 正方形（不保持宽高比），按通道标准化后以 NCHW 输出
///
/// 每个通道: `(value / 255 - mean[c]) / std[c]`，alpha 被忽略。
pub fn build(
  image: &RawImage,
  target_size: u32,
  mean: [f32; 3],
  std: [f32; 3],
) -> Result<Tensor, PreprocessError> {
  check_target_size(target_size)?;
  if let Some(s) = std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
    return Err(PreprocessError::invalid(format!("标准差必须为正数: {}", s)));
  }
  if mean.iter().any(|m| !m.is_finite()) {
    return Err(PreprocessError::invalid(format!("均值无效: {:?}", mean)));
  }

  let resized = imageops::resize(
    image.as_rgba_image(),
    target_size,
    target_size,
    FilterType::Triangle,
  );

  let plane = (target_size as usize) * (target_size as usize);
  let mut data = vec![0.0f32; RGB_CHANNELS * plane];

  for (idx, pixel) in resized.as_raw().chunks_exact(RGBA_CHANNELS).enumerate() {
    for c in 0..RGB_CHANNELS {
      let value = pixel[c] as f32 / 255.0;
      data[c * plane + idx] = (value - mean[c]) / std[c];
    }
  }

  let side = target_size as usize;
  Tensor::new(&[1, RGB_CHANNELS, side, side], data)
    .map_err(|e| PreprocessError::invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::preprocess::{IMAGENET_MEAN, IMAGENET_STD};

  #[test]
  fn output_is_channel_planar() {
    // 左红右蓝，宽度不变，高度 1 -> 2
    let data = vec![255, 0, 0, 255, 0, 0, 255, 255];
    let image = RawImage::new(2, 1, data).unwrap();
    let tensor = build(&image, 2, [0.0; 3], [1.0; 3]).unwrap();
    assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
    assert_eq!(
      tensor.data(),
      &[
        1.0, 0.0, 1.0, 0.0, // R
        0.0, 0.0, 0.0, 0.0, // G
        0.0, 1.0, 0.0, 1.0, // B
      ]
    );
  }

  #[test]
  fn applies_per_channel_standardization() {
    let image = RawImage::filled(30, 17, [255, 0, 128, 255]).unwrap();
    let tensor = build(&image, 8, IMAGENET_MEAN, IMAGENET_STD).unwrap();
    let plane = 64;
    let expected = [
      (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0],
      (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1],
      (128.0 / 255.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2],
    ];
    for (c, want) in expected.iter().enumerate() {
      for v in &tensor.data()[c * plane..(c + 1) * plane] {
        assert!((v - want).abs() < 0.02, "channel {}: {} vs {}", c, v, want);
      }
    }
  }

  #[test]
  fn aspect_ratio_is_not_preserved() {
    let image = RawImage::filled(100, 10, [255, 255, 255, 255]).unwrap();
    let tensor = build(&image, 16, [0.0; 3], [1.0; 3]).unwrap();
    // 整个画布都被拉伸后的内容覆盖
    assert!(tensor.data().iter().all(|&v| (v - 1.0).abs() < 1e-2));
  }

  #[test]
  fn values_within_six_std_of_zero() {
    let mut data = Vec::new();
    for i in 0..(64 * 48) {
      let v = (i * 13 % 256) as u8;
      data.extend_from_slice(&[v, v.wrapping_mul(3), 255 - v, 255]);
    }
    let image = RawImage::new(64, 48, data).unwrap();
    let tensor = build(&image, 32, IMAGENET_MEAN, IMAGENET_STD).unwrap();
    assert!(tensor.data().iter().all(|v| v.abs() <= 6.0));
  }

  #[test]
  fn rejects_non_positive_std() {
    let image = RawImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
    assert!(matches!(
      build(&image, 4, [0.5; 3], [0.2, 0.0, 0.2]),
      Err(PreprocessError::InvalidArgument(_))
    ));
    assert!(build(&image, 0, [0.5; 3], [0.2; 3]).is_err());
  }
}
