// 该文件是 Shibie （识别） 项目的一部分。
// src/bin/simple_repeatshot.rs - 重复识别同一张图像并统计耗时
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
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// 对同一张图像重复识别
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub common: CommonArgs,

  /// 重复次数
  #[arg(long, default_value_t = 100, value_name = "TIMES")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  args.common.log_summary();
  info!("重复次数: {}", args.repeat);

  let session = args.common.session_builder()?.build()?;
  let classifier = Classifier::new(
    &session,
    args.common.preprocessor(),
    args.common.load_labels()?,
  )
  .top_k(args.common.top_k);
  let input = InputWrapper::from_url(&args.common.input)?;
  let output = OutputWrapper::from_url(&args.common.output)?;

  RepeatShotTask::default()
    .with_repeat(args.repeat)
    .run_task(input, classifier, output)?;

  Ok(())
}
