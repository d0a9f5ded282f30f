// 该文件是 Shibie （识别） 项目的一部分。
// src/model/session.rs - 推理引擎会话
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

use std::{collections::HashMap, str::FromStr};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, model::stub::StubSession, tensor::Tensor};

pub type TensorMap = HashMap<String, Tensor>;

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("模型文件不存在: {0}")]
  ModelNotFound(String),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("推理错误: {0}")]
  InferenceError(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

/// 推理引擎：接收命名张量，返回命名张量
///
/// 实现者自行决定是否支持并发调用；不支持时由调用方串行化。
pub trait InferenceSession: Send + Sync {
  fn name(&self) -> &'static str;
  fn input_names(&self) -> &[String];
  fn output_names(&self) -> &[String];
  fn run(&self, inputs: TensorMap) -> Result<TensorMap, SessionError>;
}

/// 已加载的模型会话，启动时创建一次，之后只读
pub struct SessionHandle {
  session: Box<dyn InferenceSession>,
}

impl SessionHandle {
  pub fn new<S: InferenceSession + 'static>(session: S) -> Self {
    Self {
      session: Box::new(session),
    }
  }

  pub fn backend(&self) -> &'static str {
    self.session.name()
  }

  pub fn input_names(&self) -> &[String] {
    self.session.input_names()
  }

  pub fn output_names(&self) -> &[String] {
    self.session.output_names()
  }

  pub fn run(&self, inputs: TensorMap) -> Result<TensorMap, SessionError> {
    self.session.run(inputs)
  }

  /// 以第一个输入名送入张量，取回第一个输出
  pub fn run_single(&self, input: Tensor) -> Result<Tensor, SessionError> {
    let input_name = self
      .input_names()
      .first()
      .ok_or_else(|| SessionError::ModelInvalid("模型没有输入".to_string()))?
      .clone();
    let output_name = self
      .output_names()
      .first()
      .ok_or_else(|| SessionError::ModelInvalid("模型没有输出".to_string()))?
      .clone();

    debug!("输入 {} 形状: {:?}", input_name, input.shape());
    let mut outputs = self.run(HashMap::from([(input_name, input)]))?;
    outputs
      .remove(&output_name)
      .ok_or_else(|| SessionError::InferenceError(format!("缺少输出 {}", output_name)))
  }
}

const STUB_SCHEME: &str = "stub";
const ONNX_SCHEME: &str = "onnx";

pub enum SessionBuilder {
  Stub {
    logits: Vec<f32>,
  },
  Onnx {
    path: String,
    input_shape: Option<Vec<usize>>,
  },
}

pub(crate) fn parse_list<T: FromStr>(value: &str) -> Result<Vec<T>, String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| s.parse::<T>().map_err(|_| format!("无法解析 '{}'", s)))
    .collect()
}

impl FromUrl for SessionBuilder {
  type Error = SessionError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let query = |key: &str| {
      url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
    };

    match url.scheme() {
      STUB_SCHEME => {
        let logits = match query("logits") {
          Some(value) => parse_list(&value).map_err(SessionError::ModelPathError)?,
          None => Vec::new(),
        };
        if logits.is_empty() {
          return Err(SessionError::ModelPathError(
            "stub 模型需要 logits 参数".to_string(),
          ));
        }
        Ok(SessionBuilder::Stub { logits })
      }
      ONNX_SCHEME => {
        let input_shape = match query("shape") {
          Some(value) => Some(parse_list(&value).map_err(SessionError::ModelPathError)?),
          None => None,
        };
        Ok(SessionBuilder::Onnx {
          path: crate::url_file_path(url),
          input_shape,
        })
      }
      other => Err(SessionError::ModelPathError(format!(
        "模型路径必须使用 {} 或 {} 方案, 实际为 {}",
        STUB_SCHEME, ONNX_SCHEME, other
      ))),
    }
  }
}

impl SessionBuilder {
  pub fn input_shape(mut self, shape: Vec<usize>) -> Self {
    if let SessionBuilder::Onnx { input_shape, .. } = &mut self {
      *input_shape = Some(shape);
    }
    self
  }

  pub fn build(self) -> Result<SessionHandle, SessionError> {
    match self {
      SessionBuilder::Stub { logits } => {
        info!("使用固定输出的 stub 模型, 类别数 {}", logits.len());
        Ok(SessionHandle::new(StubSession::new(logits)))
      }
      SessionBuilder::Onnx { path, input_shape } => build_onnx(&path, input_shape.as_deref()),
    }
  }
}

#[cfg(feature = "backend_tract")]
fn build_onnx(path: &str, input_shape: Option<&[usize]>) -> Result<SessionHandle, SessionError> {
  let session = crate::model::tract::TractSession::load(path, input_shape)?;
  Ok(SessionHandle::new(session))
}

#[cfg(not(feature = "backend_tract"))]
fn build_onnx(path: &str, _input_shape: Option<&[usize]>) -> Result<SessionHandle, SessionError> {
  Err(SessionError::ModelPathError(format!(
    "加载 {} 需要启用 backend_tract 特性",
    path
  )))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stub_url_is_parsed() {
    let url = Url::parse("stub://?logits=10,0,0.5,-1").unwrap();
    let builder = SessionBuilder::from_url(&url).unwrap();
    assert!(matches!(
      builder,
      SessionBuilder::Stub { ref logits } if logits == &[10.0, 0.0, 0.5, -1.0]
    ));
  }

  #[test]
  fn stub_url_requires_logits() {
    let url = Url::parse("stub://").unwrap();
    assert!(matches!(
      SessionBuilder::from_url(&url),
      Err(SessionError::ModelPathError(_))
    ));
  }

  #[test]
  fn onnx_url_keeps_path_and_shape() {
    let url = Url::parse("onnx:///models/my%20model.onnx?shape=1,1,28,28").unwrap();
    let builder = SessionBuilder::from_url(&url).unwrap();
    match builder {
      SessionBuilder::Onnx { path, input_shape } => {
        assert_eq!(path, "/models/my model.onnx");
        assert_eq!(input_shape, Some(vec![1, 1, 28, 28]));
      }
      _ => panic!("expected onnx builder"),
    }
  }

  #[test]
  fn input_shape_overrides_onnx_only() {
    let url = Url::parse("onnx:///models/a.onnx?shape=1,1,28,28").unwrap();
    let builder = SessionBuilder::from_url(&url).unwrap().input_shape(vec![1, 3, 32, 32]);
    assert!(matches!(
      builder,
      SessionBuilder::Onnx { input_shape: Some(ref shape), .. } if shape == &[1, 3, 32, 32]
    ));

    let stub = SessionBuilder::Stub { logits: vec![1.0] }.input_shape(vec![1, 1, 28, 28]);
    assert!(matches!(stub, SessionBuilder::Stub { ref logits } if logits == &[1.0]));
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rknn:///model.rknn").unwrap();
    assert!(SessionBuilder::from_url(&url).is_err());
  }

  #[test]
  fn run_single_uses_first_names() {
    let handle = SessionBuilder::Stub {
      logits: vec![1.0, 2.0],
    }
    .build()
    .unwrap();
    let output = handle.run_single(Tensor::zeros(&[1, 1, 2, 2])).unwrap();
    assert_eq!(output.data(), &[1.0, 2.0]);
    assert_eq!(handle.backend(), "stub");
  }
}
