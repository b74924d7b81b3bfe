// 该文件是 yolov8-trt 项目的一部分。
// src/bin/simple_oneshot.rs - 固定路径的单次推理
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

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use yolov8_trt::{
  DEFAULT_IMAGE_PATH, DEFAULT_MODEL_PATH,
  input::ImageFileInput,
  model::{Criteria, TracingProgress, TranslatorKind},
  output::{Draw, Record, SaveImageFileOutput, TracingRecord},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let mut input = ImageFileInput::open(DEFAULT_IMAGE_PATH)?;

  // 设置推理条件，使用 TensorRT 引擎
  let criteria = Criteria::builder()
    .opt_model_path(DEFAULT_MODEL_PATH)
    .opt_engine("TensorRT")
    .opt_argument("width", 1024)
    .opt_argument("height", 1024)
    .opt_argument("resize", true)
    .opt_argument("toTensor", true)
    .opt_argument("applyRatio", true)
    .opt_argument("threshold", 0.6f32)
    .opt_translator(TranslatorKind::YoloV8)
    .opt_progress(Arc::new(TracingProgress::new()))
    .build()?;

  let mut model = criteria.load_model()?;
  let mut predictor = model.new_predictor()?;

  let output = SaveImageFileOutput::default();
  output.prepare()?;

  let result = predictor.predict(input.image())?;
  let saved = if result.is_empty() {
    None
  } else {
    Draw::new()?.draw_detections(input.image_mut(), &result);
    let path = output.save(input.image())?;
    info!("检测到的对象已保存到: {}", path.display());
    Some(path)
  };

  TracingRecord.record(&result, saved.as_deref())?;

  Ok(())
}
