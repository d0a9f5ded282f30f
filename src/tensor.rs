// 该文件是 Shibie （识别） 项目的一部分。
// src/tensor.rs - 推理张量定义
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

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
  #[error("张量形状不匹配: 形状 {shape:?} 需要 {expected} 个元素, 实际 {actual} 个")]
  ShapeMismatch {
    shape: Vec<usize>,
    expected: usize,
    actual: usize,
  },
}

/// 推理引擎的输入/输出缓冲区：扁平 f32 数据与形状
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
  data: Box<[f32]>,
  shape: Box<[usize]>,
}

impl Tensor {
  pub fn new(shape: &[usize], data: Vec<f32>) -> Result<Self, TensorError> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
      return Err(TensorError::ShapeMismatch {
        shape: shape.to_vec(),
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      shape: shape.into(),
    })
  }

  /// 形状为 `[1, N]` 的单行张量
  pub fn row(data: Vec<f32>) -> Self {
    Self {
      shape: [1, data.len()].into(),
      data: data.into_boxed_slice(),
    }
  }

  pub fn zeros(shape: &[usize]) -> Self {
    let size = shape.iter().product();
    Self {
      data: vec![0.0f32; size].into_boxed_slice(),
      shape: shape.into(),
    }
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// 按 NCHW 解释形状，返回 (N, C, H, W)
  pub fn nchw(&self) -> Option<(usize, usize, usize, usize)> {
    match *self.shape {
      [n, c, h, w] => Some((n, c, h, w)),
      _ => None,
    }
  }
}
