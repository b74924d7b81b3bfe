// 该文件是 yolov8-trt 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use crate::model::{
  Criteria, CriteriaBuilder, TracingProgress, TranslatorKind,
  criteria::{
    DEFAULT_INPUT_NAME, DEFAULT_INPUT_SIZE, DEFAULT_NMS_THRESHOLD, DEFAULT_OUTPUT_NAME,
    DEFAULT_THRESHOLD,
  },
};

/// YOLOv8 TensorRT 检测参数，默认值即固定的输入、模型与输出路径
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像路径
  #[arg(long, value_name = "FILE", default_value = crate::DEFAULT_IMAGE_PATH)]
  pub image: PathBuf,

  /// 模型文件路径
  #[arg(long, value_name = "FILE", default_value = crate::DEFAULT_MODEL_PATH)]
  pub model: PathBuf,

  /// 输出目录
  #[arg(long, value_name = "DIR", default_value = crate::DEFAULT_OUTPUT_DIR)]
  pub output_dir: PathBuf,

  /// 输出文件名
  #[arg(long, value_name = "NAME", default_value = crate::DEFAULT_OUTPUT_NAME)]
  pub output_name: String,

  /// 推理引擎: TensorRT, CUDA, OnnxRuntime
  #[arg(long, default_value = "TensorRT", value_name = "ENGINE")]
  pub engine: String,

  /// 模型输入宽度
  #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, value_name = "PIXELS")]
  pub width: u32,

  /// 模型输入高度
  #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, value_name = "PIXELS")]
  pub height: u32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_name = "THRESHOLD")]
  pub threshold: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_NMS_THRESHOLD, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 模型输入张量名
  #[arg(long, default_value = DEFAULT_INPUT_NAME, value_name = "NAME")]
  pub model_input: String,

  /// 模型输出张量名
  #[arg(long, default_value = DEFAULT_OUTPUT_NAME, value_name = "NAME")]
  pub model_output: String,

  /// GPU 设备编号
  #[arg(long, default_value_t = 0, value_name = "ID")]
  pub device_id: i32,

  /// TensorRT 引擎缓存目录
  #[arg(long, value_name = "DIR")]
  pub engine_cache: Option<PathBuf>,

  /// 启用 FP16 推理
  #[arg(long)]
  pub fp16: bool,

  /// 同时在输出图像旁写入 .txt 检测记录
  #[arg(long)]
  pub record_text: bool,
}

impl Args {
  /// 按参数构造推理条件，校验在 `build` 时进行
  pub fn criteria(&self) -> CriteriaBuilder {
    let mut builder = Criteria::builder()
      .opt_model_path(&self.model)
      .opt_engine(&self.engine)
      .opt_argument("width", self.width)
      .opt_argument("height", self.height)
      .opt_argument("resize", true)
      .opt_argument("toTensor", true)
      .opt_argument("applyRatio", true)
      .opt_argument("threshold", self.threshold)
      .opt_argument("nmsThreshold", self.nms_threshold)
      .opt_translator(TranslatorKind::YoloV8)
      .opt_input_name(&self.model_input)
      .opt_output_name(&self.model_output)
      .opt_device_id(self.device_id)
      .opt_fp16(self.fp16)
      .opt_progress(Arc::new(TracingProgress::new()));
    if let Some(dir) = &self.engine_cache {
      builder = builder.opt_engine_cache_dir(dir);
    }
    builder
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::criteria::EngineKind;

  #[test]
  fn defaults_match_fixed_constants() {
    let args = Args::parse_from(["yolov8-detection"]);
    assert_eq!(args.image, PathBuf::from("/home/images/group.jpg"));
    assert_eq!(args.model, PathBuf::from("/home/model/yolov8s.engine"));
    assert_eq!(args.output_dir, PathBuf::from("/home/output"));
    assert_eq!(args.output_name, "yolov8_detected.png");

    let criteria = args.criteria().build().unwrap();
    assert_eq!(criteria.engine, EngineKind::TensorRT);
    assert_eq!((criteria.width, criteria.height), (1024, 1024));
    assert!(criteria.resize && criteria.to_tensor && criteria.apply_ratio);
    assert_eq!(criteria.threshold, 0.6);
    assert_eq!(criteria.nms_threshold, 0.45);
    assert_eq!(criteria.input_name, "images");
    assert_eq!(criteria.output_name, "output0");
    assert!(criteria.progress.is_some());
  }

  #[test]
  fn overrides_are_applied() {
    let args = Args::parse_from([
      "yolov8-detection",
      "--engine",
      "OnnxRuntime",
      "--width",
      "640",
      "--height",
      "640",
      "--threshold",
      "0.25",
      "--nms-threshold",
      "0.5",
      "--model-input",
      "input",
      "--model-output",
      "output",
      "--engine-cache",
      "/tmp/trt-cache",
      "--fp16",
    ]);
    let criteria = args.criteria().build().unwrap();
    assert_eq!(criteria.engine, EngineKind::OnnxRuntime);
    assert_eq!((criteria.width, criteria.height), (640, 640));
    assert_eq!(criteria.threshold, 0.25);
    assert_eq!(criteria.nms_threshold, 0.5);
    assert_eq!(criteria.input_name, "input");
    assert_eq!(criteria.output_name, "output");
    assert_eq!(criteria.engine_cache_dir, Some(PathBuf::from("/tmp/trt-cache")));
    assert!(criteria.fp16);
  }
}
