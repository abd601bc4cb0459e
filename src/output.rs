// 该文件是 Dinovis 项目的一部分。
// src/output.rs - 输出定义
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
use thiserror::Error;

/// 已绘制结果的去向（文件、窗口）
pub trait Render {
  type Error;
  fn render(&self, image: &RgbImage) -> Result<(), Self::Error>;
}

pub mod draw;
pub use self::draw::Draw;

mod save_image_file;
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "display")]
mod display;
#[cfg(feature = "display")]
pub use self::display::{WindowOutput, WindowOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("字体加载错误: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
}
