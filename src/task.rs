// 该文件是 yolov8-trt 项目的一部分。
// src/task.rs - 检测任务
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::{
  input::{ImageFileInput, ImageFileInputError},
  model::{Backend, CriteriaBuilder, DetectResult, InferenceError, ModelLoadError},
  output::{Draw, OutputError, Record, SaveImageFileOutput},
};

#[derive(Error, Debug)]
pub enum RunError {
  #[error("图像解码失败: {0}")]
  Decode(#[from] ImageFileInputError),
  #[error("模型加载失败: {0}")]
  ModelLoad(#[from] ModelLoadError),
  #[error("推理失败: {0}")]
  Inference(#[from] InferenceError),
  #[error("输出失败: {0}")]
  Io(#[from] OutputError),
}

/// 任务结果：检测结果与标注图像路径（仅在检测到目标时保存）
#[derive(Debug, Clone)]
pub struct DetectOutcome {
  pub result: DetectResult,
  pub output: Option<PathBuf>,
}

pub trait Task<B, R>: Sized {
  type Output;
  type Error;
  fn run_task(self, backend: &B, record: &R) -> Result<Self::Output, Self::Error>;
}

/// 单张图像的检测任务
pub struct OneShotTask {
  image_path: PathBuf,
  criteria: CriteriaBuilder,
  output: SaveImageFileOutput,
  draw: Draw,
}

impl OneShotTask {
  pub fn new(
    image_path: impl AsRef<Path>,
    criteria: CriteriaBuilder,
    output: SaveImageFileOutput,
  ) -> Result<Self, OutputError> {
    Ok(Self {
      image_path: image_path.as_ref().to_path_buf(),
      criteria,
      output,
      draw: Draw::new()?,
    })
  }
}

impl<B: Backend, R: Record> Task<B, R> for OneShotTask {
  type Output = DetectOutcome;
  type Error = RunError;

  fn run_task(self, backend: &B, record: &R) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let now = std::time::Instant::now();

    // 图像先于模型加载，图像无效时不初始化后端
    let mut input = ImageFileInput::open(&self.image_path)?;

    let criteria = self.criteria.build().map_err(ModelLoadError::from)?;
    let mut model = criteria.load_model_with(backend)?;
    let mut predictor = model.new_predictor()?;

    self.output.prepare().map_err(OutputError::from)?;

    let result = predictor.predict(input.image())?;
    info!("检测到 {} 个目标", result.len());

    let output = if result.is_empty() {
      None
    } else {
      self.draw.draw_detections(input.image_mut(), &result);
      let path = self.output.save(input.image()).map_err(OutputError::from)?;
      info!("检测到的对象已保存到: {}", path.display());
      Some(path)
    };

    record
      .record(&result, output.as_deref())
      .map_err(OutputError::from)?;
    info!("任务完成，耗时: {:.2?}", now.elapsed());

    Ok(DetectOutcome { result, output })
  }
}
