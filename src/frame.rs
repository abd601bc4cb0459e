// 该文件是 Dinovis 项目的一部分。
// src/frame.rs - CHW 浮点张量定义
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

use image::RgbImage;
use ndarray::Array3;

const RGB_CHANNELS: usize = 3;

/// 模型期望的通道顺序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelOrder {
  #[default]
  Rgb,
  Bgr,
}

impl ChannelOrder {
  /// 输出通道 `c` 对应的 RGB 源通道
  fn source_channel(self, c: usize) -> usize {
    match self {
      ChannelOrder::Rgb => c,
      ChannelOrder::Bgr => RGB_CHANNELS - 1 - c,
    }
  }
}

/// 形状为 [3, H, W] 的 f32 张量
#[derive(Debug, Clone, PartialEq)]
pub struct RgbChwTensor {
  data: Array3<f32>,
}

impl RgbChwTensor {
  /// HWC 排列的 u8 像素转为 CHW 排列的 f32，不做归一化
  pub fn from_rgb_image(image: &RgbImage, order: ChannelOrder) -> Self {
    let (width, height) = image.dimensions();
    let data = Array3::from_shape_fn(
      (RGB_CHANNELS, height as usize, width as usize),
      |(c, h, w)| {
        let pixel = image.get_pixel(w as u32, h as u32);
        f32::from(pixel[order.source_channel(c)])
      },
    );
    Self { data }
  }

  pub fn height(&self) -> usize {
    self.data.dim().1
  }

  pub fn width(&self) -> usize {
    self.data.dim().2
  }

  pub fn as_array(&self) -> &Array3<f32> {
    &self.data
  }

  pub fn into_array(self) -> Array3<f32> {
    self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn two_by_two() -> RgbImage {
    let mut image = RgbImage::new(2, 2);
    image.put_pixel(0, 0, Rgb([1, 2, 3]));
    image.put_pixel(1, 0, Rgb([4, 5, 6]));
    image.put_pixel(0, 1, Rgb([7, 8, 9]));
    image.put_pixel(1, 1, Rgb([10, 11, 12]));
    image
  }

  #[test]
  fn layout_is_channel_first() {
    let tensor = RgbChwTensor::from_rgb_image(&two_by_two(), ChannelOrder::Rgb);
    assert_eq!(tensor.as_array().dim(), (3, 2, 2));
    let data = tensor.as_array();
    assert_eq!(data[[0, 0, 0]], 1.0);
    assert_eq!(data[[0, 0, 1]], 4.0);
    assert_eq!(data[[0, 1, 0]], 7.0);
    assert_eq!(data[[1, 1, 1]], 11.0);
    assert_eq!(data[[2, 0, 1]], 6.0);
  }

  #[test]
  fn bgr_order_swaps_outer_channels() {
    let tensor = RgbChwTensor::from_rgb_image(&two_by_two(), ChannelOrder::Bgr);
    let data = tensor.as_array();
    assert_eq!(data[[0, 0, 0]], 3.0);
    assert_eq!(data[[1, 0, 0]], 2.0);
    assert_eq!(data[[2, 0, 0]], 1.0);
  }

  #[test]
  fn dimensions_follow_source_image() {
    let tensor = RgbChwTensor::from_rgb_image(&RgbImage::new(12, 8), ChannelOrder::Rgb);
    assert_eq!(tensor.height(), 8);
    assert_eq!(tensor.width(), 12);
  }
}
