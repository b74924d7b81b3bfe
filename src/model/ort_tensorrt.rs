// 该文件是 yolov8-trt 项目的一部分。
// src/model/ort_tensorrt.rs - ONNX Runtime / TensorRT 推理后端
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
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use tracing::{debug, info};

use crate::model::{
  criteria::{Criteria, EngineKind},
  engine::{Backend, Engine, EngineError, ExecutionContext},
};

/// 基于 ONNX Runtime 的后端，按推理条件选择 TensorRT / CUDA / CPU 执行
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtBackend;

pub struct OrtEngine {
  session: Session,
  input_name: String,
  output_name: String,
}

pub struct OrtContext<'a> {
  engine: &'a mut OrtEngine,
}

fn load_error(e: impl std::fmt::Display) -> EngineError {
  EngineError::Load(e.to_string())
}

impl Backend for OrtBackend {
  type Engine = OrtEngine;

  fn name(&self) -> &str {
    "OnnxRuntime"
  }

  fn load(&self, criteria: &Criteria, model_data: &[u8]) -> Result<Self::Engine, EngineError> {
    let mut builder = Session::builder()
      .map_err(load_error)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(load_error)?;

    match criteria.engine {
      EngineKind::TensorRT => {
        #[cfg(feature = "tensorrt")]
        {
          info!("使用 TensorRT 执行后端, 设备 {}", criteria.device_id);
          let mut provider = ort::execution_providers::TensorRTExecutionProvider::default()
            .with_device_id(criteria.device_id)
            .with_fp16(criteria.fp16);
          if let Some(dir) = &criteria.engine_cache_dir {
            debug!("TensorRT 引擎缓存目录: {}", dir.display());
            provider = provider
              .with_engine_cache(true)
              .with_engine_cache_path(dir.display().to_string());
          }
          builder = builder
            .with_execution_providers([provider.build().error_on_failure()])
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        }
        #[cfg(not(feature = "tensorrt"))]
        return Err(EngineError::Unavailable(
          "未启用 tensorrt 特性".to_string(),
        ));
      }
      EngineKind::Cuda => {
        #[cfg(feature = "cuda")]
        {
          info!("使用 CUDA 执行后端, 设备 {}", criteria.device_id);
          builder = builder
            .with_execution_providers([ort::execution_providers::CUDAExecutionProvider::default()
              .with_device_id(criteria.device_id)
              .build()
              .error_on_failure()])
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        }
        #[cfg(not(feature = "cuda"))]
        return Err(EngineError::Unavailable("未启用 cuda 特性".to_string()));
      }
      EngineKind::OnnxRuntime => {
        info!("使用 CPU 执行后端");
      }
    }

    let session = builder.commit_from_memory(model_data).map_err(load_error)?;
    info!("推理会话创建完成");

    Ok(OrtEngine {
      session,
      input_name: criteria.input_name.clone(),
      output_name: criteria.output_name.clone(),
    })
  }
}

impl Engine for OrtEngine {
  type Context<'a> = OrtContext<'a>;

  fn new_context(&mut self) -> Result<Self::Context<'_>, EngineError> {
    Ok(OrtContext { engine: self })
  }
}

impl ExecutionContext for OrtContext<'_> {
  fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<ArrayD<f32>, EngineError> {
    debug!("输入张量形状: {:?}", input.shape());
    let tensor = TensorRef::from_array_view(input)?;
    let OrtEngine {
      session,
      input_name,
      output_name,
    } = &mut *self.engine;

    let outputs = session.run(ort::inputs![input_name.as_str() => tensor])?;
    let output = outputs
      .get(output_name.as_str())
      .ok_or_else(|| EngineError::Runtime(format!("模型没有输出 {}", output_name)))?
      .try_extract_array::<f32>()?
      .into_owned();
    debug!("输出张量形状: {:?}", output.shape());

    Ok(output)
  }
}
