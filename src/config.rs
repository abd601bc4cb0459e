// 该文件是 Dinovis 项目的一部分。
// src/config.rs - 检测参数
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

use crate::{
  frame::ChannelOrder,
  model::{DEFAULT_INPUT_NAME, Device, Threshold},
};

pub const DINO_INPUT_W: u32 = 1200;
pub const DINO_INPUT_H: u32 = 800;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectConfig {
  pub target_width: u32,
  pub target_height: u32,
  pub device: Device,
  pub threshold: Threshold,
  pub channel_order: ChannelOrder,
  pub input_name: String,
}

impl Default for DetectConfig {
  fn default() -> Self {
    Self {
      target_width: DINO_INPUT_W,
      target_height: DINO_INPUT_H,
      device: Device::default(),
      threshold: Threshold::default(),
      channel_order: ChannelOrder::Rgb,
      input_name: DEFAULT_INPUT_NAME.to_string(),
    }
  }
}
