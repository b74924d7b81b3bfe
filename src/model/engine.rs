// 该文件是 yolov8-trt 项目的一部分。
// src/model/engine.rs - 推理后端接口
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

use ndarray::{ArrayD, ArrayView4};
use thiserror::Error;

use crate::model::criteria::Criteria;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("推理引擎不可用: {0}")]
  Unavailable(String),
  #[error("模型加载失败: {0}")]
  Load(String),
  #[error("推理运行失败: {0}")]
  Runtime(String),
}

impl From<ort::Error> for EngineError {
  fn from(err: ort::Error) -> Self {
    EngineError::Runtime(err.to_string())
  }
}

/// 推理后端，负责把模型数据加载为引擎
pub trait Backend {
  type Engine: Engine;

  fn name(&self) -> &str;

  fn load(&self, criteria: &Criteria, model_data: &[u8]) -> Result<Self::Engine, EngineError>;
}

/// 已加载的推理引擎，释放由 `Drop` 完成
pub trait Engine {
  type Context<'a>: ExecutionContext
  where
    Self: 'a;

  fn new_context(&mut self) -> Result<Self::Context<'_>, EngineError>;
}

/// 绑定到引擎的执行上下文
pub trait ExecutionContext {
  /// 输入为 NCHW 张量，输出为模型原始张量
  fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<ArrayD<f32>, EngineError>;
}
