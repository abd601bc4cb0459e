// 该文件是 Dinovis 项目的一部分。
// src/input/preprocess.rs - 图像预处理
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

use image::{DynamicImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::frame::{ChannelOrder, RgbChwTensor};

const MIN_CHANNELS: u8 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
  #[error("无效图像: {0}")]
  InvalidImage(String),
  #[error("无效的模型输入尺寸: {0}x{1}")]
  InvalidTargetSize(u32, u32),
}

/// 预处理结果：模型输入张量与坐标缩放系数
#[derive(Debug, Clone)]
pub struct PreprocessResult {
  pub tensor: RgbChwTensor,
  /// 原图宽 / 模型输入宽
  pub scale_x: f32,
  /// 原图高 / 模型输入高
  pub scale_y: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
  channel_order: ChannelOrder,
  filter: FilterType,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self {
      channel_order: ChannelOrder::Rgb,
      filter: FilterType::Triangle,
    }
  }
}

impl Preprocessor {
  pub fn channel_order(mut self, order: ChannelOrder) -> Self {
    self.channel_order = order;
    self
  }

  /// 非等比缩放到 `target_width x target_height`，转换通道顺序，
  /// 转为 f32 并重排为 CHW。不做均值/方差归一化。
  pub fn prepare(
    &self,
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
  ) -> Result<PreprocessResult, PreprocessError> {
    if target_width == 0 || target_height == 0 {
      return Err(PreprocessError::InvalidTargetSize(
        target_width,
        target_height,
      ));
    }

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
      return Err(PreprocessError::InvalidImage(format!(
        "图像尺寸为 {}x{}",
        width, height
      )));
    }

    let channels = image.color().channel_count();
    if channels < MIN_CHANNELS {
      return Err(PreprocessError::InvalidImage(format!(
        "图像通道数为 {}, 至少需要 {}",
        channels, MIN_CHANNELS
      )));
    }

    let rgb = image.to_rgb8();
    let resized = if (width, height) == (target_width, target_height) {
      rgb
    } else {
      image::imageops::resize(&rgb, target_width, target_height, self.filter)
    };

    let scale_x = width as f32 / target_width as f32;
    let scale_y = height as f32 / target_height as f32;
    debug!(
      "预处理: {}x{} -> {}x{}, 缩放系数 ({:.4}, {:.4})",
      width, height, target_width, target_height, scale_x, scale_y
    );

    Ok(PreprocessResult {
      tensor: RgbChwTensor::from_rgb_image(&resized, self.channel_order),
      scale_x,
      scale_y,
    })
  }
}
