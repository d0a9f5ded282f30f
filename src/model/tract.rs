// 该文件是 Shibie （识别） 项目的一部分。
// src/model/tract.rs - 基于 tract 的 ONNX 推理
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

use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::{
  model::session::{InferenceSession, SessionError, TensorMap},
  tensor::Tensor,
};

pub struct TractSession {
  plan: TypedRunnableModel<TypedModel>,
  input_names: Vec<String>,
  output_names: Vec<String>,
}

fn invalid(msg: &str, e: TractError) -> SessionError {
  SessionError::ModelInvalid(format!("{}: {:#}", msg, e))
}

impl TractSession {
  /// 加载 ONNX 模型；模型未声明固定输入形状时需提供 `input_shape`
  pub fn load<P: AsRef<Path>>(
    model_path: P,
    input_shape: Option<&[usize]>,
  ) -> Result<Self, SessionError> {
    let model_path = model_path.as_ref();
    if !model_path.is_file() {
      return Err(SessionError::ModelNotFound(
        model_path.display().to_string(),
      ));
    }

    info!("加载模型文件: {}", model_path.display());
    let mut model = tract_onnx::onnx()
      .model_for_path(model_path)
      .map_err(|e| invalid("无法解析 ONNX 模型", e))?;

    if let Some(shape) = input_shape {
      debug!("指定模型输入形状: {:?}", shape);
      let shape: TVec<usize> = shape.iter().copied().collect();
      model = model
        .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
        .map_err(|e| invalid("无法设置输入形状", e))?;
    }

    let model = model
      .into_optimized()
      .map_err(|e| invalid("无法优化模型", e))?;

    let input_names = model
      .input_outlets()
      .map_err(|e| invalid("无法获取模型输入", e))?
      .iter()
      .map(|outlet| model.node(outlet.node).name.clone())
      .collect::<Vec<_>>();
    let output_names = model
      .output_outlets()
      .map_err(|e| invalid("无法获取模型输出", e))?
      .iter()
      .map(|outlet| model.node(outlet.node).name.clone())
      .collect::<Vec<_>>();
    debug!("模型输入: {:?}", input_names);
    debug!("模型输出: {:?}", output_names);

    let plan = model
      .into_runnable()
      .map_err(|e| invalid("无法构建可执行模型", e))?;
    info!("模型加载完成");

    Ok(Self {
      plan,
      input_names,
      output_names,
    })
  }
}

impl InferenceSession for TractSession {
  fn name(&self) -> &'static str {
    "tract"
  }

  fn input_names(&self) -> &[String] {
    &self.input_names
  }

  fn output_names(&self) -> &[String] {
    &self.output_names
  }

  fn run(&self, mut inputs: TensorMap) -> Result<TensorMap, SessionError> {
    let mut values: TVec<TValue> = TVec::new();
    for name in &self.input_names {
      let tensor = inputs
        .remove(name)
        .ok_or_else(|| SessionError::InferenceError(format!("缺少输入 {}", name)))?;
      let value = tract_onnx::prelude::Tensor::from_shape(tensor.shape(), tensor.data())
        .map_err(|e| SessionError::InferenceError(format!("{:#}", e)))?;
      values.push(value.into());
    }

    let outputs = self
      .plan
      .run(values)
      .map_err(|e| SessionError::InferenceError(format!("ONNX 推理失败: {:#}", e)))?;

    let mut result = TensorMap::new();
    for (name, value) in self.output_names.iter().zip(outputs.iter()) {
      let view = value
        .to_array_view::<f32>()
        .map_err(|e| SessionError::InferenceError(format!("输出 {} 不是 f32: {:#}", name, e)))?;
      let tensor = Tensor::new(view.shape(), view.iter().copied().collect())
        .map_err(|e| SessionError::InferenceError(e.to_string()))?;
      result.insert(name.clone(), tensor);
    }

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_model_file_is_not_found() {
    assert!(matches!(
      TractSession::load("/nonexistent/model.onnx", None),
      Err(SessionError::ModelNotFound(_))
    ));
  }

  #[test]
  fn garbage_model_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, b"not an onnx model").unwrap();
    assert!(matches!(
      TractSession::load(&path, None),
      Err(SessionError::ModelInvalid(_))
    ));
  }
}
