// 该文件是 Shibie （识别） 项目的一部分。
// src/bin/simple_continueshot.rs - 逐张识别目录中的图像
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

use anyhow::Result;
use clap::Parser;

use shibie::{
  FromUrl,
  args::CommonArgs,
  input::InputWrapper,
  model::Classifier,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};

/// 逐张识别输入中的所有图像
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub common: CommonArgs,

  /// 最多处理的图像数量
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  args.common.log_summary();

  let session = args.common.session_builder()?.build()?;
  let classifier = Classifier::new(
    &session,
    args.common.preprocessor(),
    args.common.load_labels()?,
  )
  .top_k(args.common.top_k);
  let input = InputWrapper::from_url(&args.common.input)?;
  let output = OutputWrapper::from_url(&args.common.output)?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .run_task(input, classifier, output)?;

  Ok(())
}
