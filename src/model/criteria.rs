// 该文件是 yolov8-trt 项目的一部分。
// src/model/criteria.rs - 推理条件配置
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

use std::{
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
};

use thiserror::Error;
use tracing::error;

use crate::model::{
  engine::Backend,
  ort_tensorrt::OrtBackend,
  progress::Progress,
  zoo::{ModelLoadError, ZooModel},
};

pub const DEFAULT_INPUT_SIZE: u32 = 1024;
pub const DEFAULT_THRESHOLD: f32 = 0.6;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.45;
pub const DEFAULT_INPUT_NAME: &str = "images";
pub const DEFAULT_OUTPUT_NAME: &str = "output0";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriteriaError {
  #[error("未设置模型路径")]
  MissingModelPath,
  #[error("未设置推理引擎")]
  MissingEngine,
  #[error("未知的推理引擎: {0}")]
  UnknownEngine(String),
  #[error("输入尺寸无效: {0}x{1}")]
  InvalidDimension(u32, u32),
  #[error("{0} 超出范围 [0, 1]: {1}")]
  InvalidThreshold(&'static str, f32),
  #[error("未知参数: {0}")]
  UnknownArgument(String),
  #[error("参数 {0} 的值无效: {1}")]
  InvalidArgument(String, String),
}

/// 推理引擎标识
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
  TensorRT,
  Cuda,
  OnnxRuntime,
}

impl EngineKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EngineKind::TensorRT => "TensorRT",
      EngineKind::Cuda => "CUDA",
      EngineKind::OnnxRuntime => "OnnxRuntime",
    }
  }
}

impl FromStr for EngineKind {
  type Err = CriteriaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "TensorRT" | "tensorrt" | "trt" => Ok(EngineKind::TensorRT),
      "CUDA" | "cuda" => Ok(EngineKind::Cuda),
      "OnnxRuntime" | "onnxruntime" | "ort" | "cpu" => Ok(EngineKind::OnnxRuntime),
      _ => Err(CriteriaError::UnknownEngine(s.to_string())),
    }
  }
}

impl std::fmt::Display for EngineKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 输出翻译器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslatorKind {
  #[default]
  YoloV8,
}

/// 推理条件：输入 RgbImage，输出 DetectResult
#[derive(Clone)]
pub struct Criteria {
  pub model_path: PathBuf,
  pub engine: EngineKind,
  pub width: u32,
  pub height: u32,
  pub resize: bool,
  pub to_tensor: bool,
  pub apply_ratio: bool,
  pub threshold: f32,
  pub nms_threshold: f32,
  pub translator: TranslatorKind,
  pub input_name: String,
  pub output_name: String,
  pub device_id: i32,
  pub engine_cache_dir: Option<PathBuf>,
  pub fp16: bool,
  pub progress: Option<Arc<dyn Progress>>,
}

impl std::fmt::Debug for Criteria {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Criteria")
      .field("model_path", &self.model_path)
      .field("engine", &self.engine)
      .field("width", &self.width)
      .field("height", &self.height)
      .field("resize", &self.resize)
      .field("to_tensor", &self.to_tensor)
      .field("apply_ratio", &self.apply_ratio)
      .field("threshold", &self.threshold)
      .field("nms_threshold", &self.nms_threshold)
      .field("translator", &self.translator)
      .field("input_name", &self.input_name)
      .field("output_name", &self.output_name)
      .field("device_id", &self.device_id)
      .field("engine_cache_dir", &self.engine_cache_dir)
      .field("fp16", &self.fp16)
      .field("progress", &self.progress.is_some())
      .finish()
  }
}

impl Criteria {
  pub fn builder() -> CriteriaBuilder {
    CriteriaBuilder::default()
  }

  /// 使用内置后端加载模型
  pub fn load_model(&self) -> Result<ZooModel<<OrtBackend as Backend>::Engine>, ModelLoadError> {
    ZooModel::load(self, &OrtBackend)
  }

  /// 使用指定后端加载模型
  pub fn load_model_with<B: Backend>(&self, backend: &B) -> Result<ZooModel<B::Engine>, ModelLoadError> {
    ZooModel::load(self, backend)
  }
}

pub struct CriteriaBuilder {
  model_path: Option<PathBuf>,
  engine: Option<String>,
  width: u32,
  height: u32,
  resize: bool,
  to_tensor: bool,
  apply_ratio: bool,
  threshold: f32,
  nms_threshold: f32,
  translator: TranslatorKind,
  input_name: String,
  output_name: String,
  device_id: i32,
  engine_cache_dir: Option<PathBuf>,
  fp16: bool,
  progress: Option<Arc<dyn Progress>>,
  argument_error: Option<CriteriaError>,
}

impl Default for CriteriaBuilder {
  fn default() -> Self {
    Self {
      model_path: None,
      engine: None,
      width: DEFAULT_INPUT_SIZE,
      height: DEFAULT_INPUT_SIZE,
      resize: false,
      to_tensor: true,
      apply_ratio: false,
      threshold: DEFAULT_THRESHOLD,
      nms_threshold: DEFAULT_NMS_THRESHOLD,
      translator: TranslatorKind::YoloV8,
      input_name: DEFAULT_INPUT_NAME.to_string(),
      output_name: DEFAULT_OUTPUT_NAME.to_string(),
      device_id: 0,
      engine_cache_dir: None,
      fp16: false,
      progress: None,
      argument_error: None,
    }
  }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, CriteriaError> {
  value
    .trim()
    .parse()
    .map_err(|_| CriteriaError::InvalidArgument(key.to_string(), value.to_string()))
}

impl CriteriaBuilder {
  pub fn opt_model_path(mut self, path: impl AsRef<Path>) -> Self {
    self.model_path = Some(path.as_ref().to_path_buf());
    self
  }

  pub fn opt_engine(mut self, engine: &str) -> Self {
    self.engine = Some(engine.to_string());
    self
  }

  pub fn opt_width(mut self, width: u32) -> Self {
    self.width = width;
    self
  }

  pub fn opt_height(mut self, height: u32) -> Self {
    self.height = height;
    self
  }

  pub fn opt_resize(mut self, resize: bool) -> Self {
    self.resize = resize;
    self
  }

  pub fn opt_to_tensor(mut self, to_tensor: bool) -> Self {
    self.to_tensor = to_tensor;
    self
  }

  pub fn opt_apply_ratio(mut self, apply_ratio: bool) -> Self {
    self.apply_ratio = apply_ratio;
    self
  }

  pub fn opt_threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn opt_nms_threshold(mut self, nms_threshold: f32) -> Self {
    self.nms_threshold = nms_threshold;
    self
  }

  pub fn opt_translator(mut self, translator: TranslatorKind) -> Self {
    self.translator = translator;
    self
  }

  pub fn opt_input_name(mut self, name: &str) -> Self {
    self.input_name = name.to_string();
    self
  }

  pub fn opt_output_name(mut self, name: &str) -> Self {
    self.output_name = name.to_string();
    self
  }

  pub fn opt_device_id(mut self, device_id: i32) -> Self {
    self.device_id = device_id;
    self
  }

  pub fn opt_engine_cache_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.engine_cache_dir = Some(dir.as_ref().to_path_buf());
    self
  }

  pub fn opt_fp16(mut self, fp16: bool) -> Self {
    self.fp16 = fp16;
    self
  }

  pub fn opt_progress(mut self, progress: Arc<dyn Progress>) -> Self {
    self.progress = Some(progress);
    self
  }

  /// 以键值对方式设置翻译器参数，错误在 `build` 时返回
  pub fn opt_argument(mut self, key: &str, value: impl ToString) -> Self {
    if self.argument_error.is_some() {
      return self;
    }
    let value = value.to_string();
    let applied = match key {
      "width" => parse_value(key, &value).map(|v| self.width = v),
      "height" => parse_value(key, &value).map(|v| self.height = v),
      "resize" => parse_value(key, &value).map(|v| self.resize = v),
      "toTensor" => parse_value(key, &value).map(|v| self.to_tensor = v),
      "applyRatio" => parse_value(key, &value).map(|v| self.apply_ratio = v),
      "threshold" => parse_value(key, &value).map(|v| self.threshold = v),
      "nmsThreshold" => parse_value(key, &value).map(|v| self.nms_threshold = v),
      _ => Err(CriteriaError::UnknownArgument(key.to_string())),
    };
    if let Err(e) = applied {
      self.argument_error = Some(e);
    }
    self
  }

  pub fn build(self) -> Result<Criteria, CriteriaError> {
    if let Some(e) = self.argument_error {
      error!("推理条件参数错误: {}", e);
      return Err(e);
    }

    let model_path = match self.model_path {
      Some(path) if !path.as_os_str().is_empty() => path,
      _ => return Err(CriteriaError::MissingModelPath),
    };
    let engine: EngineKind = self.engine.ok_or(CriteriaError::MissingEngine)?.parse()?;

    if self.width == 0 || self.height == 0 {
      return Err(CriteriaError::InvalidDimension(self.width, self.height));
    }
    if !(0.0..=1.0).contains(&self.threshold) {
      return Err(CriteriaError::InvalidThreshold("threshold", self.threshold));
    }
    if !(0.0..=1.0).contains(&self.nms_threshold) {
      return Err(CriteriaError::InvalidThreshold(
        "nmsThreshold",
        self.nms_threshold,
      ));
    }

    Ok(Criteria {
      model_path,
      engine,
      width: self.width,
      height: self.height,
      resize: self.resize,
      to_tensor: self.to_tensor,
      apply_ratio: self.apply_ratio,
      threshold: self.threshold,
      nms_threshold: self.nms_threshold,
      translator: self.translator,
      input_name: self.input_name,
      output_name: self.output_name,
      device_id: self.device_id,
      engine_cache_dir: self.engine_cache_dir,
      fp16: self.fp16,
      progress: self.progress,
    })
  }
}
