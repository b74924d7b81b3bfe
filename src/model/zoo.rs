// 该文件是 yolov8-trt 项目的一部分。
// src/model/zoo.rs - 模型句柄与预测器
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
  fs::File,
  io::Read,
  path::{Path, PathBuf},
  time::Instant,
};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::model::{
  DetectResult,
  criteria::{Criteria, CriteriaError},
  engine::{Backend, Engine, EngineError, ExecutionContext},
  progress::Progress,
  translator::{TranslateError, YoloV8Translator},
};

const READ_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ModelLoadError {
  #[error("推理条件无效: {0}")]
  Criteria(#[from] CriteriaError),
  #[error("无法读取模型文件 {0}: {1}")]
  Io(PathBuf, std::io::Error),
  #[error("后端 {0} 加载模型失败: {1}")]
  Engine(String, EngineError),
  #[error("无法创建预测器: {0}")]
  Predictor(EngineError),
}

#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("翻译错误: {0}")]
  Translate(#[from] TranslateError),
  #[error("推理错误: {0}")]
  Engine(#[from] EngineError),
}

fn read_model_file(path: &Path, progress: Option<&dyn Progress>) -> std::io::Result<Vec<u8>> {
  let mut file = File::open(path)?;
  let total = file.metadata()?.len();
  if let Some(progress) = progress {
    progress.start(total);
  }

  let mut data = Vec::with_capacity(total as usize);
  let mut chunk = vec![0u8; READ_CHUNK_SIZE];
  loop {
    let n = file.read(&mut chunk)?;
    if n == 0 {
      break;
    }
    data.extend_from_slice(&chunk[..n]);
    if let Some(progress) = progress {
      progress.update(data.len() as u64);
    }
  }

  if let Some(progress) = progress {
    progress.end();
  }
  Ok(data)
}

/// 已加载的模型，独占推理引擎
pub struct ZooModel<E: Engine> {
  engine: E,
  translator: YoloV8Translator,
}

impl<E: Engine> ZooModel<E> {
  pub(crate) fn load<B>(criteria: &Criteria, backend: &B) -> Result<Self, ModelLoadError>
  where
    B: Backend<Engine = E>,
  {
    info!("加载模型文件: {}", criteria.model_path.display());
    let data = read_model_file(&criteria.model_path, criteria.progress.as_deref()).map_err(|e| {
      error!("读取模型文件失败: {}", e);
      ModelLoadError::Io(criteria.model_path.clone(), e)
    })?;
    debug!(
      "模型文件大小: {:.2} MB",
      data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建推理引擎: {} ({})", criteria.engine, backend.name());
    let engine = backend.load(criteria, &data).map_err(|e| {
      error!("推理引擎加载失败: {}", e);
      ModelLoadError::Engine(backend.name().to_string(), e)
    })?;
    info!("模型加载完成");

    Ok(Self {
      engine,
      translator: YoloV8Translator::from_criteria(criteria),
    })
  }

  /// 创建预测器，其生命周期不超过模型本身
  pub fn new_predictor(&mut self) -> Result<Predictor<'_, E>, ModelLoadError> {
    let context = self
      .engine
      .new_context()
      .map_err(ModelLoadError::Predictor)?;
    debug!("预测器创建完成");
    Ok(Predictor {
      context,
      translator: &self.translator,
    })
  }
}

pub struct Predictor<'a, E: Engine + 'a> {
  context: E::Context<'a>,
  translator: &'a YoloV8Translator,
}

impl<'a, E: Engine + 'a> Predictor<'a, E> {
  pub fn predict(&mut self, image: &RgbImage) -> Result<DetectResult, InferenceError> {
    let input = self.translator.process_input(image)?;

    let now = Instant::now();
    let output = self.context.forward(input.view())?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    let result = self
      .translator
      .process_output(output.view(), image.dimensions())?;
    debug!("检测结果: {:?}", result);
    Ok(result)
  }
}
