// 该文件是 Shibie （识别） 项目的一部分。
// src/output/log_output.rs - 日志输出
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
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RawImage,
  model::{ClassificationResult, Recognition},
  output::Render,
};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 通过 tracing 报告识别结果，`log://`
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch(uri.scheme().to_string()));
    }
    Ok(LogOutput)
  }
}

/// 首选结果的展示文本，置信度保留一位小数
pub fn summary(result: &ClassificationResult) -> Option<String> {
  result.top().map(|top| {
    format!(
      "预测: {} (置信度: {:.1}%)",
      top.label,
      top.probability * 100.0
    )
  })
}

impl Render<RawImage, Recognition> for LogOutput {
  type Error = LogOutputError;

  fn render_result(&self, frame: &RawImage, result: &Recognition) -> Result<(), Self::Error> {
    let Some(line) = summary(&result.result) else {
      warn!("没有可报告的识别结果");
      return Ok(());
    };
    info!("[{}x{}] {}", frame.width(), frame.height(), line);
    for (rank, item) in result.result.iter().enumerate().skip(1) {
      info!(
        "  #{} {}: {:.2}%",
        rank + 1,
        item.label,
        item.probability * 100.0
      );
    }
    Ok(())
  }
}
