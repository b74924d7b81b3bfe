// 该文件是 yolov8-trt 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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
  io::{BufWriter, Write},
  path::{Path, PathBuf},
};

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("无法创建输出目录 {0}: {1}")]
  CreateDirectory(PathBuf, std::io::Error),
  #[error("I/O 错误 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("图像编码错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 将标注后的图像以 PNG 格式写入固定目录下的固定文件名
#[derive(Debug, Clone)]
pub struct SaveImageFileOutput {
  directory: PathBuf,
  filename: String,
}

impl SaveImageFileOutput {
  pub fn new(directory: impl AsRef<Path>, filename: &str) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
      filename: filename.to_string(),
    }
  }

  pub fn path(&self) -> PathBuf {
    self.directory.join(&self.filename)
  }

  /// 创建输出目录（含缺失的上级目录）
  pub fn prepare(&self) -> Result<(), SaveImageFileError> {
    std::fs::create_dir_all(&self.directory)
      .map_err(|e| SaveImageFileError::CreateDirectory(self.directory.clone(), e))?;
    debug!("输出目录: {}", self.directory.display());
    Ok(())
  }

  pub fn save(&self, image: &RgbImage) -> Result<PathBuf, SaveImageFileError> {
    let path = self.path();
    let file = File::create(&path).map_err(|e| SaveImageFileError::IoError(path.clone(), e))?;
    let mut writer = BufWriter::new(file);
    image.write_to(&mut writer, ImageFormat::Png)?;
    writer
      .flush()
      .map_err(|e| SaveImageFileError::IoError(path.clone(), e))?;

    warn!("保存图像到文件: {}", path.display());
    Ok(path)
  }
}

impl Default for SaveImageFileOutput {
  fn default() -> Self {
    Self::new(crate::DEFAULT_OUTPUT_DIR, crate::DEFAULT_OUTPUT_NAME)
  }
}
