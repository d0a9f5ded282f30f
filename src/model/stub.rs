// 该文件是 Shibie （识别） 项目的一部分。
// src/model/stub.rs - 固定输出的测试模型
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

use crate::{
  model::session::{InferenceSession, SessionError, TensorMap},
  tensor::Tensor,
};

const STUB_INPUT: &str = "input";
const STUB_OUTPUT: &str = "output";

/// 无论输入为何都返回同一组 logits
pub struct StubSession {
  logits: Tensor,
  input_names: Vec<String>,
  output_names: Vec<String>,
}

impl StubSession {
  pub fn new(logits: Vec<f32>) -> Self {
    Self {
      logits: Tensor::row(logits),
      input_names: vec![STUB_INPUT.to_string()],
      output_names: vec![STUB_OUTPUT.to_string()],
    }
  }
}

impl InferenceSession for StubSession {
  fn name(&self) -> &'static str {
    "stub"
  }

  fn input_names(&self) -> &[String] {
    &self.input_names
  }

  fn output_names(&self) -> &[String] {
    &self.output_names
  }

  fn run(&self, inputs: TensorMap) -> Result<TensorMap, SessionError> {
    if !inputs.contains_key(STUB_INPUT) {
      return Err(SessionError::InferenceError(format!(
        "缺少输入 {}",
        STUB_INPUT
      )));
    }
    Ok(TensorMap::from([(
      STUB_OUTPUT.to_string(),
      self.logits.clone(),
    )]))
  }
}
