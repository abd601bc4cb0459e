// 该文件是 Dinovis 项目的一部分。
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use tracing::{debug, warn};

use crate::{
  label::{LabelTable, UnknownClassId},
  model::BoundingBox,
  output::OutputError,
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_BASELINE: u32 = 1;
const OUTLINE_THICKNESS: i32 = 1;
const BOX_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const TEXT_COLOR: [u8; 3] = [200, 200, 200]; // 浅灰
// 坐标限制在图像外该距离以内，远离图像的部分本就不可见
const CLIP_MARGIN: f32 = 4096.0;

pub struct Draw {
  font: FontArc,
  font_size: f32,
  thickness: i32,
  box_color: Rgb<u8>,
  text_color: Rgb<u8>,
}

impl Draw {
  pub fn new() -> Result<Self, OutputError> {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
    let font = FontArc::try_from_slice(font_data)?;

    Ok(Self {
      font,
      font_size: LABEL_FONT_SIZE,
      thickness: OUTLINE_THICKNESS,
      box_color: Rgb(BOX_COLOR),
      text_color: Rgb(TEXT_COLOR),
    })
  }

  pub fn thickness(mut self, thickness: i32) -> Self {
    self.thickness = thickness.max(1);
    self
  }

  /// 按给定顺序在图像上绘制检测框与标签。
  /// 类别编号不在标签表中时只画框，并在返回值中报告。
  pub fn annotate(
    &self,
    image: &mut RgbImage,
    detections: &[BoundingBox],
    labels: &LabelTable,
  ) -> Vec<UnknownClassId> {
    let mut unknown = Vec::new();

    for bbox in detections {
      let (x, y) = self.draw_outline(image, bbox);

      match labels.resolve(bbox.class_id) {
        Ok(label) => self.draw_label(image, x, y, label),
        Err(e) => {
          warn!("跳过标签绘制: {}", e);
          unknown.push(e);
        }
      }
    }

    debug!(
      "绘制 {} 个检测框, {} 个缺少标签",
      detections.len(),
      unknown.len()
    );
    unknown
  }

  // 返回取整后的左上角坐标
  fn draw_outline(&self, image: &mut RgbImage, bbox: &BoundingBox) -> (i32, i32) {
    let (img_w, img_h) = image.dimensions();
    let xmin = clip(bbox.xmin, img_w);
    let ymin = clip(bbox.ymin, img_h);
    let xmax = clip(bbox.xmax, img_w);
    let ymax = clip(bbox.ymax, img_h);

    let x = xmin as i32;
    let y = ymin as i32;
    let width = (xmax - xmin).max(1.0) as u32;
    let height = (ymax - ymin).max(1.0) as u32;

    for t in 0..self.thickness {
      let grow = 2 * t as u32;
      let rect = Rect::at(x - t, y - t).of_size(width + grow, height + grow);
      draw_hollow_rect_mut(image, rect, self.box_color);
    }

    (x, y)
  }

  fn draw_label(&self, image: &mut RgbImage, x: i32, y: i32, label: &str) {
    let scale = PxScale::from(self.font_size);
    let (text_width, text_height) = text_size(scale, &self.font, label);
    if text_width == 0 || text_height == 0 {
      return;
    }

    // 标签背景紧贴检测框左上角上方
    let top = y.saturating_sub(text_height as i32);
    let rect = Rect::at(x, top).of_size(text_width, text_height + LABEL_BASELINE);
    draw_filled_rect_mut(image, rect, self.box_color);

    draw_text_mut(image, self.text_color, x, top, scale, &self.font, label);
  }
}

fn clip(v: f32, extent: u32) -> f32 {
  v.round().clamp(-CLIP_MARGIN, extent as f32 + CLIP_MARGIN)
}
