// 该文件是 yolov8-trt 项目的一部分。
// src/model.rs - 模型与检测结果
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

use serde::Serialize;

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 类别编号与名称的映射
pub trait WithLabel {
  fn to_label_str(&self, class_id: u32) -> String;
}

/// COCO 80 类标签
#[derive(Debug, Clone, Copy, Default)]
pub struct CocoLabel;

impl WithLabel for CocoLabel {
  fn to_label_str(&self, class_id: u32) -> String {
    COCO_CLASSES
      .get(class_id as usize)
      .map(|name| name.to_string())
      .unwrap_or_else(|| format!("class_{}", class_id))
  }
}

/// 边界框，左上角坐标与宽高，单位为像素
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BBox {
  pub fn from_corners(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
    Self {
      x: x_min,
      y: y_min,
      width: x_max - x_min,
      height: y_max - y_min,
    }
  }

  pub fn x_max(&self) -> f32 {
    self.x + self.width
  }

  pub fn y_max(&self) -> f32 {
    self.y + self.height
  }

  pub fn area(&self) -> f32 {
    self.width.max(0.0) * self.height.max(0.0)
  }

  /// 交并比
  pub fn iou(&self, other: &BBox) -> f32 {
    let ix = (self.x_max().min(other.x_max()) - self.x.max(other.x)).max(0.0);
    let iy = (self.y_max().min(other.y_max()) - self.y.max(other.y)).max(0.0);
    let inter = ix * iy;
    let union = self.area() + other.area() - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectItem {
  pub class_id: u32,
  pub label: String,
  pub score: f32,
  pub bbox: BBox,
}

/// 一次推理的检测结果，按置信度从高到低排列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, DetectItem> {
    self.items.iter()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(mut items: Vec<DetectItem>) -> Self {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

impl std::fmt::Display for DetectResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
    f.write_str(&json)
  }
}

pub mod criteria;
pub mod engine;
pub mod ort_tensorrt;
pub mod progress;
pub mod translator;
pub mod zoo;

pub use self::criteria::{Criteria, CriteriaBuilder, CriteriaError, TranslatorKind};
pub use self::engine::{Backend, Engine, EngineError, ExecutionContext};
pub use self::progress::{Progress, TracingProgress};
pub use self::translator::{TranslateError, YoloV8Translator};
pub use self::zoo::{InferenceError, ModelLoadError, Predictor, ZooModel};

#[cfg(test)]
mod tests {
  use super::*;

  fn item(label: &str, score: f32) -> DetectItem {
    DetectItem {
      class_id: 0,
      label: label.to_string(),
      score,
      bbox: BBox::from_corners(0.0, 0.0, 10.0, 10.0),
    }
  }

  #[test]
  fn result_is_sorted_by_score() {
    let result = DetectResult::from(vec![item("a", 0.7), item("b", 0.9), item("c", 0.8)]);
    let labels: Vec<_> = result.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["b", "c", "a"]);
  }

  #[test]
  fn display_is_json() {
    let result = DetectResult::from(vec![item("person", 0.5)]);
    let value: serde_json::Value = serde_json::from_str(&result.to_string()).unwrap();
    assert_eq!(value["items"][0]["label"], "person");
    assert_eq!(value["items"][0]["bbox"]["width"], 10.0);
  }

  #[test]
  fn coco_label_falls_back_for_unknown_ids() {
    assert_eq!(CocoLabel.to_label_str(16), "dog");
    assert_eq!(CocoLabel.to_label_str(80), "class_80");
  }

  #[test]
  fn iou_of_disjoint_and_identical_boxes() {
    let a = BBox::from_corners(0.0, 0.0, 10.0, 10.0);
    let b = BBox::from_corners(20.0, 20.0, 30.0, 30.0);
    assert_eq!(a.iou(&b), 0.0);
    assert!((a.iou(&a) - 1.0).abs() < 1e-6);
  }
}
