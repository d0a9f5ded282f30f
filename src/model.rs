// 该文件是 Shibie （识别） 项目的一部分。
// src/model.rs - 模型
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
use tracing::{debug, info};

use crate::{
  frame::RawImage,
  labels::LabelSet,
  preprocess::{Preprocess, PreprocessError, Preprocessor},
  tensor::Tensor,
};

pub mod interpret;
pub mod session;
mod stub;
#[cfg(feature = "backend_tract")]
mod tract;

pub use self::interpret::{ClassificationResult, InterpretError, RankedLabel, interpret, softmax};
pub use self::session::{InferenceSession, SessionBuilder, SessionError, SessionHandle, TensorMap};
pub use self::stub::StubSession;
#[cfg(feature = "backend_tract")]
pub use self::tract::TractSession;

pub const DEFAULT_TOP_K: usize = 3;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("预处理错误: {0}")]
  PreprocessError(#[from] PreprocessError),
  #[error("会话错误: {0}")]
  SessionError(#[from] SessionError),
  #[error("结果解释错误: {0}")]
  InterpretError(#[from] InterpretError),
}

/// 一次识别：送入引擎的张量与解释后的结果
#[derive(Debug, Clone)]
pub struct Recognition {
  pub tensor: Tensor,
  pub result: ClassificationResult,
}

/// 预处理 -> 推理 -> 结果解释
///
/// 会话句柄由调用方持有并以只读方式借入。
pub struct Classifier<'a> {
  session: &'a SessionHandle,
  preprocessor: Preprocessor,
  labels: LabelSet,
  top_k: usize,
}

impl<'a> Classifier<'a> {
  pub fn new(session: &'a SessionHandle, preprocessor: Preprocessor, labels: LabelSet) -> Self {
    Self {
      session,
      preprocessor,
      labels,
      top_k: DEFAULT_TOP_K,
    }
  }

  pub fn top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k;
    self
  }
}

impl Model for Classifier<'_> {
  type Input = RawImage;
  type Output = Recognition;
  type Error = ClassifierError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("预处理输入图像 {}x{}", input.width(), input.height());
    let tensor = self.preprocessor.preprocess(input)?;

    debug!("执行模型推理");
    let logits = self.session.run_single(tensor.clone())?;

    let result = interpret(&logits, self.labels.as_slice(), self.top_k)?;
    if let Some(top) = result.top() {
      info!(
        "预测: {} (置信度: {:.1}%)",
        top.label,
        top.probability * 100.0
      );
    }

    Ok(Recognition { tensor, result })
  }
}
