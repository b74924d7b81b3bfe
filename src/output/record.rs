// 该文件是 yolov8-trt 项目的一部分。
// src/output/record.rs - 检测结果记录
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
  sync::Mutex,
};

use tracing::info;

use crate::model::DetectResult;

/// 检测结果记录器，`output` 为标注图像的保存路径（未保存时为 None）
pub trait Record {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()>;
}

/// 以一行日志输出 JSON 形式的检测结果
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecord;

impl Record for TracingRecord {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()> {
    match output {
      Some(path) => info!(output = %path.display(), "{}", result),
      None => info!("{}", result),
    }
    Ok(())
  }
}

/// 在标注图像旁写入同名 `.txt` 文件，每行一个目标
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFileRecord {
  pub label_with_name: bool,
}

impl Record for TextFileRecord {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()> {
    let Some(path) = output else {
      return Ok(());
    };

    let records: Vec<String> = result
      .iter()
      .map(|item| {
        let name = if self.label_with_name {
          item.label.clone()
        } else {
          item.class_id.to_string()
        };
        format!(
          "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
          name, item.score, item.bbox.x, item.bbox.y, item.bbox.width, item.bbox.height
        )
      })
      .collect();
    std::fs::write(path.with_extension("txt"), records.join("\n"))
  }
}

/// 同时交给多个记录器
impl<A: Record, B: Record> Record for (A, B) {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()> {
    self.0.record(result, output)?;
    self.1.record(result, output)
  }
}

/// 保存在内存中的记录，便于检查
#[derive(Debug, Default)]
pub struct MemoryRecord {
  records: Mutex<Vec<(DetectResult, Option<PathBuf>)>>,
}

impl MemoryRecord {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn take(&self) -> Vec<(DetectResult, Option<PathBuf>)> {
    match self.records.lock() {
      Ok(mut records) => std::mem::take(&mut *records),
      Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
  }
}

impl Record for MemoryRecord {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()> {
    let entry = (result.clone(), output.map(Path::to_path_buf));
    match self.records.lock() {
      Ok(mut records) => records.push(entry),
      Err(poisoned) => poisoned.into_inner().push(entry),
    }
    Ok(())
  }
}

impl<R: Record + ?Sized> Record for &R {
  fn record(&self, result: &DetectResult, output: Option<&Path>) -> std::io::Result<()> {
    (**self).record(result, output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{BBox, DetectItem};

  fn result() -> DetectResult {
    DetectResult::from(vec![DetectItem {
      class_id: 0,
      label: "person".to_string(),
      score: 0.91,
      bbox: BBox::from_corners(10.0, 10.0, 60.0, 110.0),
    }])
  }

  #[test]
  fn text_record_writes_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("yolov8_detected.png");
    TextFileRecord {
      label_with_name: true,
    }
    .record(&result(), Some(&image_path))
    .unwrap();

    let text = std::fs::read_to_string(dir.path().join("yolov8_detected.txt")).unwrap();
    assert_eq!(text, "person, 0.9100, 10.0, 10.0, 50.0, 100.0");
  }

  #[test]
  fn text_record_uses_class_ids_without_names() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("yolov8_detected.png");
    let result = DetectResult::from(vec![DetectItem {
      class_id: 16,
      label: "dog".to_string(),
      score: 0.75,
      bbox: BBox::from_corners(0.0, 5.0, 20.0, 25.0),
    }]);
    TextFileRecord {
      label_with_name: false,
    }
    .record(&result, Some(&image_path))
    .unwrap();

    let text = std::fs::read_to_string(dir.path().join("yolov8_detected.txt")).unwrap();
    assert_eq!(text, "16, 0.7500, 0.0, 5.0, 20.0, 20.0");
  }

  #[test]
  fn text_record_without_output_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    TextFileRecord::default().record(&result(), None).unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
  }

  #[test]
  fn memory_record_keeps_everything() {
    let memory = MemoryRecord::new();
    let pair = (TracingRecord, &memory);
    pair.record(&result(), None).unwrap();
    pair.record(&result(), Some(Path::new("/tmp/x.png"))).unwrap();

    let records = memory.take();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].1.as_deref(), Some(Path::new("/tmp/x.png")));
    assert!(memory.take().is_empty());
  }
}
