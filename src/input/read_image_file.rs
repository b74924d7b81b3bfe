// 该文件是 yolov8-trt 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("无法打开图像文件 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("无法解码图像文件 {0}: {1}")]
  ImageLoadError(PathBuf, image::ImageError),
}

/// 已解码的输入图像（RGB8）
#[derive(Debug, Clone)]
pub struct ImageFileInput {
  image: RgbImage,
}

impl ImageFileInput {
  /// 读取并解码图像文件，格式由文件内容自动识别
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    info!("加载图像: {}", path.display());

    let reader = ImageReader::open(path)
      .and_then(|reader| reader.with_guessed_format())
      .map_err(|e| {
        error!("打开图像失败: {}", e);
        ImageFileInputError::IoError(path.to_path_buf(), e)
      })?;
    debug!("图像格式: {:?}", reader.format());

    let image = reader.decode().map_err(|e| {
      error!("解码图像失败: {}", e);
      ImageFileInputError::ImageLoadError(path.to_path_buf(), e)
    })?;

    let image = image.to_rgb8();
    debug!("图像尺寸: {}x{}", image.width(), image.height());

    Ok(Self { image })
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn image_mut(&mut self) -> &mut RgbImage {
    &mut self.image
  }

  /// (宽, 高)
  pub fn dimensions(&self) -> (u32, u32) {
    self.image.dimensions()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{ImageFormat, Rgb};

  #[test]
  fn decode_then_encode_keeps_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.jpg");
    let image = RgbImage::from_pixel(37, 21, Rgb([120, 30, 200]));
    image.save_with_format(&source, ImageFormat::Jpeg).unwrap();

    let input = ImageFileInput::open(&source).unwrap();
    assert_eq!(input.dimensions(), (37, 21));

    let encoded = dir.path().join("encoded.png");
    input.image().save(&encoded).unwrap();
    let again = ImageFileInput::open(&encoded).unwrap();
    assert_eq!(again.dimensions(), (37, 21));
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ImageFileInput::open(dir.path().join("nope.jpg")).unwrap_err();
    assert!(matches!(err, ImageFileInputError::IoError(..)));
  }

  #[test]
  fn corrupt_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();
    let err = ImageFileInput::open(&path).unwrap_err();
    assert!(matches!(err, ImageFileInputError::ImageLoadError(..)));
  }

  #[test]
  fn format_is_guessed_from_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("png_without_extension");
    let image = RgbImage::from_pixel(8, 4, Rgb([1, 2, 3]));
    image.save_with_format(&path, ImageFormat::Png).unwrap();
    let input = ImageFileInput::open(&path).unwrap();
    assert_eq!(input.image().get_pixel(0, 0), &Rgb([1, 2, 3]));
  }
}
