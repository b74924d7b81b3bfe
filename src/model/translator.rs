// 该文件是 yolov8-trt 项目的一部分。
// src/model/translator.rs - YOLOv8 输入输出翻译
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

use image::{RgbImage, imageops::FilterType};
use ndarray::{Array4, ArrayViewD, Axis, Ix2};
use thiserror::Error;
use tracing::debug;

use crate::model::{
  BBox, CocoLabel, DetectItem, DetectResult, WithLabel,
  criteria::Criteria,
};

const BOX_CHANNELS: usize = 4;

#[derive(Error, Debug, PartialEq)]
pub enum TranslateError {
  #[error("输入尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
  #[error("输出张量形状无效: {0:?}")]
  OutputShape(Vec<usize>),
}

/// YOLOv8 翻译器
///
/// 输入：RGB 图像 → `[1, 3, H, W]` 张量。
/// 输出：`[1, 4 + C, N]` 张量，每列为 `cx, cy, w, h` 与各类别得分，
/// 经阈值筛选与按类别 NMS 后得到检测结果。
pub struct YoloV8Translator<L = CocoLabel> {
  width: u32,
  height: u32,
  resize: bool,
  to_tensor: bool,
  apply_ratio: bool,
  threshold: f32,
  nms_threshold: f32,
  labels: L,
}

impl YoloV8Translator<CocoLabel> {
  pub fn from_criteria(criteria: &Criteria) -> Self {
    Self::with_labels(criteria, CocoLabel)
  }
}

impl<L: WithLabel> YoloV8Translator<L> {
  pub fn with_labels(criteria: &Criteria, labels: L) -> Self {
    Self {
      width: criteria.width,
      height: criteria.height,
      resize: criteria.resize,
      to_tensor: criteria.to_tensor,
      apply_ratio: criteria.apply_ratio,
      threshold: criteria.threshold,
      nms_threshold: criteria.nms_threshold,
      labels,
    }
  }

  pub fn threshold(&self) -> f32 {
    self.threshold
  }

  pub fn process_input(&self, image: &RgbImage) -> Result<Array4<f32>, TranslateError> {
    let resized;
    let image = if self.resize {
      resized = image::imageops::resize(image, self.width, self.height, FilterType::Triangle);
      &resized
    } else {
      if image.dimensions() != (self.width, self.height) {
        return Err(TranslateError::ShapeMismatch {
          expected: (self.width, self.height),
          actual: image.dimensions(),
        });
      }
      image
    };

    let scale = if self.to_tensor { 1.0 / 255.0 } else { 1.0 };
    let (w, h) = (self.width as usize, self.height as usize);
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    for (x, y, pixel) in image.enumerate_pixels() {
      for c in 0..3 {
        tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 * scale;
      }
    }

    Ok(tensor)
  }

  /// `image_size` 为原始图像的 (宽, 高)
  pub fn process_output(
    &self,
    output: ArrayViewD<'_, f32>,
    image_size: (u32, u32),
  ) -> Result<DetectResult, TranslateError> {
    let shape = output.shape().to_vec();
    let output = match shape.as_slice() {
      [1, channels, _] if *channels > BOX_CHANNELS => output.index_axis_move(Axis(0), 0),
      _ => return Err(TranslateError::OutputShape(shape.clone())),
    };
    let output = output
      .into_dimensionality::<Ix2>()
      .map_err(|_| TranslateError::OutputShape(shape.clone()))?;
    let num_classes = output.shape()[0] - BOX_CHANNELS;
    let num_anchors = output.shape()[1];
    debug!("输出: {} 个类别, {} 个候选框", num_classes, num_anchors);

    let (ratio_x, ratio_y) = if self.apply_ratio {
      (
        image_size.0 as f32 / self.width as f32,
        image_size.1 as f32 / self.height as f32,
      )
    } else {
      (1.0, 1.0)
    };
    let (max_x, max_y) = if self.apply_ratio {
      (image_size.0 as f32, image_size.1 as f32)
    } else {
      (self.width as f32, self.height as f32)
    };

    let mut per_class: Vec<Vec<DetectItem>> = vec![Vec::new(); num_classes];
    for anchor in 0..num_anchors {
      let (class_id, score) = (0..num_classes)
        .map(|c| (c, output[[BOX_CHANNELS + c, anchor]]))
        .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

      if score < self.threshold {
        continue;
      }

      let cx = output[[0, anchor]];
      let cy = output[[1, anchor]];
      let w = output[[2, anchor]];
      let h = output[[3, anchor]];

      let x_min = ((cx - w / 2.0) * ratio_x).clamp(0.0, max_x);
      let y_min = ((cy - h / 2.0) * ratio_y).clamp(0.0, max_y);
      let x_max = ((cx + w / 2.0) * ratio_x).clamp(0.0, max_x);
      let y_max = ((cy + h / 2.0) * ratio_y).clamp(0.0, max_y);
      // 完全落在图像之外的框裁剪后面积为零
      if x_max <= x_min || y_max <= y_min {
        continue;
      }

      per_class[class_id].push(DetectItem {
        class_id: class_id as u32,
        label: self.labels.to_label_str(class_id as u32),
        score,
        bbox: BBox::from_corners(x_min, y_min, x_max, y_max),
      });
    }

    let items: Vec<DetectItem> = per_class
      .into_iter()
      .flat_map(|candidates| non_maximum_suppression(candidates, self.nms_threshold))
      .collect();
    debug!("检测到 {} 个物体", items.len());

    Ok(DetectResult::from(items))
  }
}

/// 单一类别内的非极大值抑制
fn non_maximum_suppression(mut candidates: Vec<DetectItem>, threshold: f32) -> Vec<DetectItem> {
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
  let mut kept: Vec<DetectItem> = Vec::with_capacity(candidates.len());
  for candidate in candidates {
    if kept.iter().all(|k| k.bbox.iou(&candidate.bbox) <= threshold) {
      kept.push(candidate);
    }
  }
  kept
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;
  use ndarray::Array3;

  fn criteria() -> Criteria {
    Criteria::builder()
      .opt_model_path("m.engine")
      .opt_engine("TensorRT")
      .opt_width(100)
      .opt_height(100)
      .opt_resize(true)
      .opt_to_tensor(true)
      .opt_apply_ratio(true)
      .opt_threshold(0.6)
      .build()
      .unwrap()
  }

  /// 构造 [1, 4 + classes, anchors] 输出，每个候选框为 (cx, cy, w, h, class, score)
  fn raw_output(classes: usize, anchors: &[(f32, f32, f32, f32, usize, f32)]) -> Array3<f32> {
    let mut out = Array3::<f32>::zeros((1, 4 + classes, anchors.len()));
    for (i, &(cx, cy, w, h, class, score)) in anchors.iter().enumerate() {
      out[[0, 0, i]] = cx;
      out[[0, 1, i]] = cy;
      out[[0, 2, i]] = w;
      out[[0, 3, i]] = h;
      out[[0, 4 + class, i]] = score;
    }
    out
  }

  #[test]
  fn input_is_resized_and_normalized() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let image = RgbImage::from_pixel(40, 20, Rgb([255, 0, 51]));
    let tensor = translator.process_input(&image).unwrap();
    assert_eq!(tensor.shape(), &[1, 3, 100, 100]);
    assert!((tensor[[0, 0, 50, 50]] - 1.0).abs() < 1e-2);
    assert!(tensor[[0, 1, 50, 50]] < 1e-2);
    assert!((tensor[[0, 2, 50, 50]] - 0.2).abs() < 1e-2);
  }

  #[test]
  fn input_without_resize_must_match() {
    let criteria = Criteria::builder()
      .opt_model_path("m.engine")
      .opt_engine("TensorRT")
      .opt_width(8)
      .opt_height(8)
      .opt_resize(false)
      .opt_to_tensor(false)
      .build()
      .unwrap();
    let translator = YoloV8Translator::from_criteria(&criteria);

    let err = translator
      .process_input(&RgbImage::new(4, 8))
      .unwrap_err();
    assert_eq!(
      err,
      TranslateError::ShapeMismatch {
        expected: (8, 8),
        actual: (4, 8)
      }
    );

    let tensor = translator
      .process_input(&RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])))
      .unwrap();
    assert_eq!(tensor[[0, 2, 3, 3]], 30.0);
  }

  #[test]
  fn scores_below_threshold_are_dropped() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    // person 0.91 与 dog 0.3
    let output = raw_output(
      80,
      &[
        (35.0, 60.0, 50.0, 100.0, 0, 0.91),
        (80.0, 80.0, 40.0, 40.0, 16, 0.3),
      ],
    );
    let result = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].label, "person");
    assert!(result.iter().all(|item| item.score >= translator.threshold()));
  }

  #[test]
  fn threshold_is_inclusive_lower_bound() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(2, &[(50.0, 50.0, 10.0, 10.0, 1, 0.6)]);
    let result = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap();
    assert_eq!(result.len(), 1);
  }

  #[test]
  fn boxes_are_rescaled_to_original_image() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(1, &[(50.0, 50.0, 20.0, 40.0, 0, 0.9)]);
    let result = translator
      .process_output(output.view().into_dyn(), (200, 50))
      .unwrap();
    let bbox = result.items[0].bbox;
    assert_eq!(bbox, BBox::from_corners(80.0, 15.0, 120.0, 35.0));
  }

  #[test]
  fn boxes_are_clamped_to_image() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(1, &[(5.0, 95.0, 20.0, 20.0, 0, 0.9)]);
    let result = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap();
    assert_eq!(result.items[0].bbox, BBox::from_corners(0.0, 85.0, 15.0, 100.0));
  }

  #[test]
  fn boxes_outside_image_are_dropped() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(
      1,
      &[
        (-50.0, 50.0, 10.0, 10.0, 0, 0.9),
        (50.0, 130.0, 10.0, 10.0, 0, 0.95),
        (50.0, 50.0, 10.0, 10.0, 0, 0.7),
      ],
    );
    let result = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].score, 0.7);
    assert!(result.iter().all(|item| item.bbox.area() > 0.0));
  }

  #[test]
  fn boxes_stay_in_input_space_without_ratio() {
    let criteria = Criteria::builder()
      .opt_model_path("m.engine")
      .opt_engine("TensorRT")
      .opt_width(100)
      .opt_height(100)
      .opt_resize(true)
      .opt_apply_ratio(false)
      .opt_threshold(0.6)
      .build()
      .unwrap();
    let translator = YoloV8Translator::from_criteria(&criteria);
    let output = raw_output(1, &[(50.0, 90.0, 20.0, 40.0, 0, 0.9)]);
    let result = translator
      .process_output(output.view().into_dyn(), (400, 300))
      .unwrap();
    // 不按原图缩放，且裁剪到模型输入尺寸
    assert_eq!(result.items[0].bbox, BBox::from_corners(40.0, 70.0, 60.0, 100.0));
  }

  #[test]
  fn overlapping_boxes_of_same_class_are_suppressed() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(
      2,
      &[
        (50.0, 50.0, 20.0, 20.0, 0, 0.8),
        (51.0, 51.0, 20.0, 20.0, 0, 0.9),
        (51.0, 51.0, 20.0, 20.0, 1, 0.7),
      ],
    );
    let result = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap();
    let scores: Vec<f32> = result.iter().map(|i| i.score).collect();
    assert_eq!(scores, [0.9, 0.7]);
  }

  #[test]
  fn unexpected_output_shape_is_rejected() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = ndarray::Array2::<f32>::zeros((3, 10));
    let err = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap_err();
    assert_eq!(err, TranslateError::OutputShape(vec![3, 10]));
  }

  #[test]
  fn output_without_batch_axis_is_rejected() {
    let translator = YoloV8Translator::from_criteria(&criteria());
    let output = raw_output(2, &[(50.0, 50.0, 10.0, 10.0, 0, 0.9)]);
    let output = output.index_axis_move(Axis(0), 0);
    let err = translator
      .process_output(output.view().into_dyn(), (100, 100))
      .unwrap_err();
    assert_eq!(err, TranslateError::OutputShape(vec![6, 1]));
  }
}
