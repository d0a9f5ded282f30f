// 该文件是 Shibie （识别） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::info;
use url::Url;

use crate::{
  FromUrl,
  labels::{LabelError, LabelSet},
  model::{DEFAULT_TOP_K, SessionBuilder, SessionError},
  preprocess::{
    COLOR_TARGET_SIZE, ColorPreprocess, DIGIT_BRIGHTNESS_THRESHOLD, DIGIT_CONTENT_FRACTION,
    DIGIT_MARGIN, DIGIT_TARGET_SIZE, DigitPreprocess, IMAGENET_MEAN, IMAGENET_STD, Preprocessor,
  },
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  /// 手写数字（单通道，居中）
  Digit,
  /// 彩色图像（三通道，标准化）
  Color,
}

/// 各个可执行程序共用的参数
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
  /// 推理引擎，例如 onnx:///path/model.onnx 或 stub://?logits=...
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，image:///path/a.png 或 folder:///path/dir
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，log://、image:///path/preview.png 或 folder:///path/records
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,

  #[arg(long, value_enum, default_value_t = Mode::Digit)]
  pub mode: Mode,
  /// 标签文件（TOML），缺省时使用 0-9
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,
  #[arg(long, default_value_t = DEFAULT_TOP_K)]
  pub top_k: usize,

  /// 亮度阈值（0-255）
  #[arg(long, default_value_t = DIGIT_BRIGHTNESS_THRESHOLD)]
  pub threshold: f32,
  #[arg(long, default_value_t = DIGIT_MARGIN)]
  pub margin: u32,
  /// 输出边长，缺省时按模式取 28 或 224
  #[arg(long)]
  pub target_size: Option<u32>,
  #[arg(long, default_value_t = DIGIT_CONTENT_FRACTION)]
  pub content_fraction: f32,

  #[arg(long, value_delimiter = ',')]
  pub mean: Option<Vec<f32>>,
  #[arg(long, value_delimiter = ',')]
  pub std: Option<Vec<f32>>,

  /// 覆盖 ONNX 模型的输入形状，例如 1,1,28,28
  #[arg(long, value_delimiter = ',', value_name = "SHAPE")]
  pub input_shape: Option<Vec<usize>>,
}

fn triple(values: Option<&Vec<f32>>, fallback: [f32; 3]) -> [f32; 3] {
  match values.map(Vec::as_slice) {
    Some(&[a, b, c]) => [a, b, c],
    _ => fallback,
  }
}

impl CommonArgs {
  pub fn preprocessor(&self) -> Preprocessor {
    match self.mode {
      Mode::Digit => DigitPreprocess {
        threshold: self.threshold,
        margin: self.margin,
        target_size: self.target_size.unwrap_or(DIGIT_TARGET_SIZE),
        content_fraction: self.content_fraction,
      }
      .into(),
      Mode::Color => ColorPreprocess {
        target_size: self.target_size.unwrap_or(COLOR_TARGET_SIZE),
        mean: triple(self.mean.as_ref(), IMAGENET_MEAN),
        std: triple(self.std.as_ref(), IMAGENET_STD),
      }
      .into(),
    }
  }

  pub fn session_builder(&self) -> Result<SessionBuilder, SessionError> {
    let builder = SessionBuilder::from_url(&self.model)?;
    Ok(match &self.input_shape {
      Some(shape) => builder.input_shape(shape.clone()),
      None => builder,
    })
  }

  pub fn load_labels(&self) -> Result<LabelSet, LabelError> {
    match &self.labels {
      Some(path) => LabelSet::from_toml_file(path),
      None => Ok(LabelSet::digits()),
    }
  }

  pub fn log_summary(&self) {
    info!("模型: {}", self.model);
    info!("输入来源: {}", self.input);
    info!("输出路径: {}", self.output);
    info!("预处理模式: {:?}", self.mode);
  }
}
