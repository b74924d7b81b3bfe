// 该文件是 yolov8-trt 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontRef, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};

use crate::model::{BBox, DetectItem, DetectResult};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const LABEL_TEXT_COLOR: [u8; 3] = [255, 255, 255];
const BOX_THICKNESS: i32 = 2;
const PALETTE_SIZE: usize = 80;

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

pub struct Draw {
  font: FontRef<'static>,
  colors: Vec<Rgb<u8>>,
}

impl Draw {
  pub fn new() -> Result<Self, InvalidFont> {
    let font = FontRef::try_from_slice(FONT_DATA)?;

    // 每个类别一种颜色，在色相环上均匀分布
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Ok(Self { font, colors })
  }

  pub fn color_of(&self, class_id: u32) -> Rgb<u8> {
    self.colors[class_id as usize % self.colors.len()]
  }

  /// 在图像上绘制全部检测框与标签
  pub fn draw_detections(&self, image: &mut RgbImage, result: &DetectResult) {
    for item in result.iter() {
      self.draw_bbox_with_label(image, item);
    }
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, item: &DetectItem) {
    let Some(rect) = pixel_rect(image, &item.bbox) else {
      return;
    };
    let color = self.color_of(item.class_id);

    // 绘制边框（加粗为2像素）
    for inset in 0..BOX_THICKNESS {
      let width = rect.width().saturating_sub(2 * inset as u32);
      let height = rect.height().saturating_sub(2 * inset as u32);
      if width == 0 || height == 0 {
        break;
      }
      let inner = Rect::at(rect.left() + inset, rect.top() + inset).of_size(width, height);
      draw_hollow_rect_mut(image, inner, color);
    }

    let label = format!("{} {:.2}", item.label, item.score);
    let scale = PxScale::from(LABEL_FONT_SIZE);
    let (text_width, text_height) = text_size(scale, &self.font, &label);
    let label_height = text_height as i32 + 2 * LABEL_TEXT_VERTICAL_PADDING;

    // 标签放在边框上方，空间不足时放在框内顶部
    let label_x = rect.left();
    let label_y = if rect.top() >= label_height {
      rect.top() - label_height
    } else {
      rect.top()
    };

    let max_width = (image.width() as i32 - label_x).max(0) as u32;
    let label_width = text_width.min(max_width);
    if label_width == 0 {
      return;
    }

    let background = Rect::at(label_x, label_y).of_size(label_width, label_height as u32);
    draw_filled_rect_mut(image, background, color);
    draw_text_mut(
      image,
      Rgb(LABEL_TEXT_COLOR),
      label_x,
      label_y + LABEL_TEXT_VERTICAL_PADDING,
      scale,
      &self.font,
      &label,
    );
  }
}

/// 将浮点边界框转换为图像内的像素矩形，退化的框返回 None
fn pixel_rect(image: &RgbImage, bbox: &BBox) -> Option<Rect> {
  let (w, h) = (image.width() as i32, image.height() as i32);
  if w == 0 || h == 0 {
    return None;
  }

  // 先与图像求交，再把右/下边缘落到最后一列/行
  let x_min = bbox.x.floor().max(0.0);
  let y_min = bbox.y.floor().max(0.0);
  let x_end = bbox.x_max().ceil().min(w as f32);
  let y_end = bbox.y_max().ceil().min(h as f32);

  if x_min >= x_end || y_min >= y_end {
    return None;
  }

  let (x_min, y_min) = (x_min as i32, y_min as i32);
  let x_max = (x_end as i32).min(w - 1);
  let y_max = (y_end as i32).min(h - 1);
  Some(Rect::at(x_min, y_min).of_size((x_max - x_min + 1) as u32, (y_max - y_min + 1) as u32))
}

/// HSV 转 RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
