// 该文件是 yolov8-trt 项目的一部分。
// src/model/progress.rs - 模型加载进度
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

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// 进度回调
pub trait Progress: Send + Sync {
  fn start(&self, total: u64);
  fn update(&self, done: u64);
  fn end(&self);
}

/// 以日志形式输出进度，每 10% 输出一次
#[derive(Debug, Default)]
pub struct TracingProgress {
  total: AtomicU64,
  last_step: AtomicU64,
}

impl TracingProgress {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Progress for TracingProgress {
  fn start(&self, total: u64) {
    self.total.store(total, Ordering::Relaxed);
    self.last_step.store(0, Ordering::Relaxed);
    info!("加载中: 0% (共 {} 字节)", total);
  }

  fn update(&self, done: u64) {
    let total = self.total.load(Ordering::Relaxed);
    if total == 0 {
      return;
    }
    let step = (done.min(total) * 10 / total).min(10);
    if step > self.last_step.fetch_max(step, Ordering::Relaxed) {
      info!("加载中: {}%", step * 10);
    }
  }

  fn end(&self) {
    info!("加载完成");
  }
}
