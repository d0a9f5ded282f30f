// 该文件是 Shibie （识别） 项目的一部分。
// src/labels.rs - 类别标签
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件解析错误: {0}")]
  TomlError(#[from] toml::de::Error),
  #[error("标签列表为空")]
  Empty,
}

#[derive(Deserialize)]
struct LabelFile {
  labels: Vec<String>,
}

/// 有序的类别标签，下标即模型输出的类别编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
  labels: Box<[String]>,
}

impl LabelSet {
  /// 手写数字 `0` - `9`
  pub fn digits() -> Self {
    Self {
      labels: (0..10).map(|d| d.to_string()).collect(),
    }
  }

  pub fn from_toml_str(content: &str) -> Result<Self, LabelError> {
    let file: LabelFile = toml::from_str(content)?;
    if file.labels.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(Self {
      labels: file.labels.into_boxed_slice(),
    })
  }

  pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载标签文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    Self::from_toml_str(&content)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.labels
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }
}
