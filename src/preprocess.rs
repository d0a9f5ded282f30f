// 该文件是 Shibie （识别） 项目的一部分。
// src/preprocess.rs - 图像到张量的预处理
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

use thiserror::Error;
use tracing::{debug, warn};

use crate::{frame::RawImage, tensor::Tensor};

pub mod bbox;
pub mod color;
pub mod geometry;

pub use self::bbox::{BoundingBox, detect};
pub use self::color::build;
pub use self::geometry::normalize;

pub const DIGIT_BRIGHTNESS_THRESHOLD: f32 = 30.0;
pub const DIGIT_MARGIN: u32 = 10;
pub const DIGIT_TARGET_SIZE: u32 = 28;
// MNIST 中数字大约占据 28x28 画布中的 20 像素
pub const DIGIT_CONTENT_FRACTION: f32 = 20.0 / 28.0;

pub const COLOR_TARGET_SIZE: u32 = 224;
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Error, Debug, PartialEq)]
pub enum PreprocessError {
  #[error("参数无效: {0}")]
  InvalidArgument(String),
}

impl PreprocessError {
  pub fn invalid(msg: impl Into<String>) -> Self {
    PreprocessError::InvalidArgument(msg.into())
  }
}

pub(crate) fn check_target_size(target_size: u32) -> Result<(), PreprocessError> {
  if target_size == 0 {
    return Err(PreprocessError::invalid("目标尺寸必须为正数"));
  }
  Ok(())
}

pub trait Preprocess {
  fn preprocess(&self, image: &RawImage) -> Result<Tensor, PreprocessError>;
}

/// 手写数字：检测边界框，裁剪、等比缩放并居中到单通道画布
#[derive(Debug, Clone, PartialEq)]
pub struct DigitPreprocess {
  pub threshold: f32,
  pub margin: u32,
  pub target_size: u32,
  pub content_fraction: f32,
}

impl Default for DigitPreprocess {
  fn default() -> Self {
    Self {
      threshold: DIGIT_BRIGHTNESS_THRESHOLD,
      margin: DIGIT_MARGIN,
      target_size: DIGIT_TARGET_SIZE,
      content_fraction: DIGIT_CONTENT_FRACTION,
    }
  }
}

impl Preprocess for DigitPreprocess {
  fn preprocess(&self, image: &RawImage) -> Result<Tensor, PreprocessError> {
    let bbox = detect(image, self.threshold, self.margin);
    match &bbox {
      Some(bbox) => debug!("边界框: {:?}", bbox),
      None => warn!("未检测到数字，使用全零张量"),
    }
    normalize(
      image,
      bbox.as_ref(),
      self.target_size,
      self.content_fraction,
    )
  }
}

/// 彩色图像：整图拉伸到正方形，按通道标准化为 NCHW
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPreprocess {
  pub target_size: u32,
  pub mean: [f32; 3],
  pub std: [f32; 3],
}

impl Default for ColorPreprocess {
  fn default() -> Self {
    Self {
      target_size: COLOR_TARGET_SIZE,
      mean: IMAGENET_MEAN,
      std: IMAGENET_STD,
    }
  }
}

impl Preprocess for ColorPreprocess {
  fn preprocess(&self, image: &RawImage) -> Result<Tensor, PreprocessError> {
    build(image, self.target_size, self.mean, self.std)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preprocessor {
  Digit(DigitPreprocess),
  Color(ColorPreprocess),
}

impl Preprocess for Preprocessor {
  fn preprocess(&self, image: &RawImage) -> Result<Tensor, PreprocessError> {
    match self {
      Preprocessor::Digit(digit) => digit.preprocess(image),
      Preprocessor::Color(color) => color.preprocess(image),
    }
  }
}

impl From<DigitPreprocess> for Preprocessor {
  fn from(value: DigitPreprocess) -> Self {
    Preprocessor::Digit(value)
  }
}

impl From<ColorPreprocess> for Preprocessor {
  fn from(value: ColorPreprocess) -> Self {
    Preprocessor::Color(value)
  }
}
