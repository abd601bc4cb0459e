// 该文件是 Dinovis 项目的一部分。
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

use std::path::Path;

use image::{DynamicImage, ImageReader};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::input::PreprocessError;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(image::ImageError),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

impl From<image::ImageError> for ImageFileInputError {
  fn from(err: image::ImageError) -> Self {
    ImageFileInputError::ImageLoadError(err)
  }
}

// 读不出的图像与空图像一样视为无效输入
impl From<ImageFileInputError> for PreprocessError {
  fn from(err: ImageFileInputError) -> Self {
    PreprocessError::InvalidImage(err.to_string())
  }
}

/// 单张图像输入，解码后保持原始分辨率与通道数
pub struct ImageFileInput {
  image: DynamicImage,
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    info!("读取图像文件: {}", path.display());
    let image = ImageReader::open(path)
      .and_then(|reader| reader.with_guessed_format())
      .map_err(|e| {
        error!("无法打开图像文件 {}: {}", path.display(), e);
        e
      })?
      .decode()?;
    debug!(
      "图像尺寸: {}x{}, 颜色类型: {:?}",
      image.width(),
      image.height(),
      image.color()
    );
    Ok(Self { image })
  }

  pub fn into_image(self) -> DynamicImage {
    self.image
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ImageFileInput::open(dir.path().join("missing.png"));
    assert!(matches!(result, Err(ImageFileInputError::IoError(_))));
  }

  #[test]
  fn garbage_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();
    let result = ImageFileInput::open(&path);
    assert!(matches!(result, Err(ImageFileInputError::ImageLoadError(_))));
  }

  #[test]
  fn unreadable_file_surfaces_as_invalid_image() {
    let dir = tempfile::tempdir().unwrap();
    let err = ImageFileInput::open(dir.path().join("missing.png")).err().unwrap();
    assert!(matches!(
      PreprocessError::from(err),
      PreprocessError::InvalidImage(_)
    ));
  }

  #[test]
  fn png_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.png");
    RgbImage::from_pixel(3, 2, Rgb([9, 8, 7])).save(&path).unwrap();

    let image = ImageFileInput::open(&path).unwrap().into_image();
    assert_eq!((image.width(), image.height()), (3, 2));
    assert_eq!(image.to_rgb8().get_pixel(2, 1), &Rgb([9, 8, 7]));
  }
}
