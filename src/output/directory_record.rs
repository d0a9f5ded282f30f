// 该文件是 Shibie （识别） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RawImage,
  model::{ClassificationResult, Recognition},
  output::{
    Render,
    preview::{ToRgbImage, upscale},
    preview_scale,
  },
  url_file_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 按日期分目录保存预览图像和 JSON 结果，`folder:///path/to/records?scale=5`
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  scale: u32,
  frame_counter: AtomicU16,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(url_file_path(uri)),
      scale: preview_scale(uri),
      frame_counter: AtomicU16::new(0),
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn record(&self, result: &ClassificationResult, path: &Path) -> Result<(), DirectoryRecordOutputError> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path.with_extension("json"), json)?;
    Ok(())
  }
}

impl Render<RawImage, Recognition> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, _frame: &RawImage, result: &Recognition) -> Result<(), Self::Error> {
    let path = self.frame_path()?;
    match result.tensor.to_rgb_image() {
      Some(image) => upscale(&image, self.scale).save(&path)?,
      None => warn!("张量形状 {:?} 无法可视化", result.tensor.shape()),
    }
    self.record(&result.result, &path)?;
    debug!("记录识别结果: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{model::RankedLabel, tensor::Tensor};

  fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        walk(&path, found);
      } else {
        found.push(path);
      }
    }
  }

  #[test]
  fn records_preview_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let url = url::Url::parse(&format!("folder://{}?scale=1", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();

    let recognition = Recognition {
      tensor: Tensor::zeros(&[1, 1, 28, 28]),
      result: ClassificationResult {
        best_index: 3,
        best_logit: 9.0,
        ranked: vec![RankedLabel {
          index: 3,
          label: "3".to_string(),
          probability: 0.9,
        }]
        .into_boxed_slice(),
      },
    };
    let frame = RawImage::filled(28, 28, [0, 0, 0, 255]).unwrap();
    output.render_result(&frame, &recognition).unwrap();
    output.render_result(&frame, &recognition).unwrap();

    let mut files = Vec::new();
    walk(dir.path(), &mut files);
    files.sort();
    let pngs = files.iter().filter(|p| p.extension().is_some_and(|e| e == "png")).count();
    let jsons: Vec<&PathBuf> = files
      .iter()
      .filter(|p| p.extension().is_some_and(|e| e == "json"))
      .collect();
    assert_eq!(pngs, 2);
    assert_eq!(jsons.len(), 2);

    let value: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(jsons[0]).unwrap()).unwrap();
    assert_eq!(value["best_index"], 3);
    assert_eq!(value["ranked"][0]["label"], "3");
  }
}
