// 该文件是 Shibie （识别） 项目的一部分。
// src/model/interpret.rs - 分类输出解释
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
use thiserror::Error;
use tracing::debug;

use crate::tensor::Tensor;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterpretError {
  #[error("输出长度 {logits} 与标签数量 {labels} 不一致")]
  ShapeMismatch { logits: usize, labels: usize },
  #[error("参数无效: {0}")]
  InvalidArgument(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
  pub index: usize,
  pub label: String,
  pub probability: f32,
}

/// 按概率降序排列的分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
  /// 最大 logit 的下标（并列时取最小下标）
  pub best_index: usize,
  pub best_logit: f32,
  pub ranked: Box<[RankedLabel]>,
}

impl ClassificationResult {
  pub fn top(&self) -> Option<&RankedLabel> {
    self.ranked.first()
  }

  pub fn iter(&self) -> impl Iterator<Item = &RankedLabel> {
    self.ranked.iter()
  }

  pub fn len(&self) -> usize {
    self.ranked.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ranked.is_empty()
  }
}

/// 数值稳定的 softmax：先减去最大值再求指数
pub fn softmax(logits: &[f32]) -> Vec<f32> {
  let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
  let exps: Vec<f64> = logits
    .iter()
    .map(|&x| ((x - max_logit) as f64).exp())
    .collect();
  let sum: f64 = exps.iter().sum();
  exps.iter().map(|&e| (e / sum) as f32).collect()
}

/// 线性扫描求最大值，并列时保留第一个
fn argmax(logits: &[f32]) -> Option<(usize, f32)> {
  let mut best: Option<(usize, f32)> = None;
  for (i, &v) in logits.iter().enumerate() {
    match best {
      Some((_, b)) if v <= b => {}
      _ => best = Some((i, v)),
    }
  }
  best
}

pub fn interpret<S: AsRef<str>>(
  logits: &Tensor,
  labels: &[S],
  top_k: usize,
) -> Result<ClassificationResult, InterpretError> {
  let logits = logits.data();
  if logits.len() != labels.len() {
    return Err(InterpretError::ShapeMismatch {
      logits: logits.len(),
      labels: labels.len(),
    });
  }
  if top_k < 1 {
    return Err(InterpretError::InvalidArgument(format!(
      "top_k 必须至少为 1, 实际为 {}",
      top_k
    )));
  }

  let (best_index, best_logit) = argmax(logits)
    .ok_or_else(|| InterpretError::InvalidArgument("模型输出为空".to_string()))?;

  for (i, v) in logits.iter().enumerate() {
    debug!("类别 {} 输出: {}", i, v);
  }

  let probabilities = softmax(logits);
  let mut ranked: Vec<RankedLabel> = probabilities
    .into_iter()
    .zip(labels)
    .enumerate()
    .map(|(index, (probability, label))| RankedLabel {
      index,
      label: label.as_ref().to_string(),
      probability,
    })
    .collect();

  // 稳定排序，概率相同时保持原始顺序
  ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
  ranked.truncate(top_k);

  Ok(ClassificationResult {
    best_index,
    best_logit,
    ranked: ranked.into_boxed_slice(),
  })
}
