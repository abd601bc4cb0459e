// 该文件是 Dinovis 项目的一部分。
// src/output/display.rs - 窗口显示
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

use image::{DynamicImage, RgbImage};
use macroquad::{
  Window,
  color::colors::{BLACK, WHITE},
  input::get_last_key_pressed,
  math::vec2,
  texture::{DrawTextureParams, FilterMode, Texture2D, draw_texture_ex},
  window::{Conf, clear_background, next_frame, screen_height, screen_width},
};
use thiserror::Error;
use tracing::info;

use crate::output::Render;

#[derive(Error, Debug)]
pub enum WindowOutputError {
  #[error("图像尺寸 {0}x{1} 超出窗口纹理上限")]
  TooLarge(u32, u32),
}

/// 在窗口中显示图像，按任意键或关闭窗口后返回。必须在主线程调用。
pub struct WindowOutput {
  title: String,
}

impl WindowOutput {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
    }
  }
}

impl Render for WindowOutput {
  type Error = WindowOutputError;

  fn render(&self, image: &RgbImage) -> Result<(), Self::Error> {
    let (width, height) = image.dimensions();
    let (tex_w, tex_h) = match (u16::try_from(width), u16::try_from(height)) {
      (Ok(w), Ok(h)) => (w, h),
      _ => return Err(WindowOutputError::TooLarge(width, height)),
    };
    let rgba = DynamicImage::ImageRgb8(image.clone()).into_rgba8().into_raw();

    let conf = Conf {
      window_title: self.title.clone(),
      window_width: i32::from(tex_w),
      window_height: i32::from(tex_h),
      ..Default::default()
    };

    info!("显示窗口 '{}'，按任意键退出", self.title);
    Window::from_config(conf, async move {
      let texture = Texture2D::from_rgba8(tex_w, tex_h, &rgba);
      texture.set_filter(FilterMode::Linear);

      loop {
        clear_background(BLACK);
        draw_texture_ex(
          &texture,
          0.0,
          0.0,
          WHITE,
          DrawTextureParams {
            dest_size: Some(vec2(screen_width(), screen_height())),
            ..Default::default()
          },
        );
        if get_last_key_pressed().is_some() {
          break;
        }
        next_frame().await;
      }
    });

    Ok(())
  }
}
