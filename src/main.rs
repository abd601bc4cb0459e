// 该文件是 Dinovis 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use dinovis::{
  input::{ImageFileInput, PreprocessError},
  label::LabelTable,
  model::DinoDetectorBuilder,
  output::{Draw, Render, SaveImageFileOutput},
  task::OneShotTask,
};

const WINDOW_TITLE: &str = "DINO Detection";

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();
  let config = args.detect_config();

  info!("模型文件路径: {}", args.model.display());
  info!("输入图像: {}", args.image.display());
  info!("置信度阈值: {}", config.threshold.value());
  info!("推理设备: {:?}", config.device);

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)
      .with_context(|| format!("无法加载标签文件: {}", path.display()))?,
    None => LabelTable::coco(),
  };

  let image = ImageFileInput::open(&args.image)
    .map_err(PreprocessError::from)
    .with_context(|| format!("无效图像: {}", args.image.display()))?
    .into_image();

  let mut detector = DinoDetectorBuilder::new(&args.model)
    .device(config.device)
    .input_name(config.input_name.clone())
    .build()
    .with_context(|| format!("无法加载模型: {}", args.model.display()))?;

  let draw = Draw::new()?;
  let output = OneShotTask::new(&config, &draw).run(image, &mut detector, &labels)?;

  for det in &output.detections {
    let name = labels.resolve(det.class_id).unwrap_or("?");
    info!(
      "  - {}: {:.2}% at ({:.0}, {:.0}) - ({:.0}, {:.0})",
      name,
      det.score * 100.0,
      det.xmin,
      det.ymin,
      det.xmax,
      det.ymax
    );
  }
  if !output.unknown.is_empty() {
    warn!(
      "{} 个检测结果的类别编号超出标签表，模型与标签表可能不匹配",
      output.unknown.len()
    );
  }

  if let Some(path) = &args.output {
    SaveImageFileOutput::new(path)
      .render(&output.image)
      .with_context(|| format!("无法保存图片: {}", path.display()))?;
  }

  if !args.no_display {
    show(&output.image)?;
  }

  Ok(())
}

#[cfg(feature = "display")]
fn show(image: &image::RgbImage) -> Result<()> {
  dinovis::output::WindowOutput::new(WINDOW_TITLE)
    .render(image)
    .context("无法显示窗口")
}

#[cfg(not(feature = "display"))]
fn show(_image: &image::RgbImage) -> Result<()> {
  warn!("未启用 display 特性，跳过 '{}' 窗口", WINDOW_TITLE);
  Ok(())
}
