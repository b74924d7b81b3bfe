// 该文件是 yolov8-trt 项目的一部分。
// src/main.rs - 项目主程序
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
use tracing::info;

use yolov8_trt::{
  args::Args,
  model::ort_tensorrt::OrtBackend,
  output::{SaveImageFileOutput, TextFileRecord, TracingRecord},
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入图像: {}", args.image.display());
  info!("模型文件路径: {}", args.model.display());
  info!("推理引擎: {}", args.engine);
  info!("输出目录: {}", args.output_dir.display());

  let output = SaveImageFileOutput::new(&args.output_dir, &args.output_name);
  let task = OneShotTask::new(&args.image, args.criteria(), output)?;

  let outcome = if args.record_text {
    let record = (
      TracingRecord,
      TextFileRecord {
        label_with_name: true,
      },
    );
    task.run_task(&OrtBackend, &record)?
  } else {
    task.run_task(&OrtBackend, &TracingRecord)?
  };

  info!("共检测到 {} 个目标", outcome.result.len());

  Ok(())
}
