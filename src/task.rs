// 该文件是 Dinovis 项目的一部分。
// src/task.rs - 单张图像检测流程
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

use std::time::Instant;

use image::{DynamicImage, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  config::DetectConfig,
  input::{PreprocessError, PreprocessResult, Preprocessor},
  label::{LabelTable, UnknownClassId},
  model::{BoundingBox, DetectorError, Model, RawDetectionSet, Threshold, filter},
  output::Draw,
};

/// 流程阶段，严格按顺序推进，任一阶段失败即终止
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Start,
  Preprocessed,
  Inferred,
  Filtered,
  Annotated,
  Done,
}

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("预处理失败: {0}")]
  PreprocessError(#[from] PreprocessError),
  #[error("推理失败: {0}")]
  DetectorError(#[from] DetectorError),
}

impl TaskError {
  /// 出错时流程所处的阶段
  pub fn stage(&self) -> Stage {
    match self {
      TaskError::PreprocessError(_) => Stage::Start,
      TaskError::DetectorError(_) => Stage::Preprocessed,
    }
  }
}

#[derive(Debug)]
pub struct TaskOutput {
  pub image: RgbImage,
  pub detections: Vec<BoundingBox>,
  pub unknown: Vec<UnknownClassId>,
}

pub struct OneShotTask<'a> {
  preprocessor: Preprocessor,
  target_width: u32,
  target_height: u32,
  threshold: Threshold,
  draw: &'a Draw,
}

fn enter(stage: Stage, since: Instant) {
  debug!("进入阶段 {:?}，耗时: {:.2?}", stage, since.elapsed());
}

impl<'a> OneShotTask<'a> {
  pub fn new(config: &DetectConfig, draw: &'a Draw) -> Self {
    Self {
      preprocessor: Preprocessor::default().channel_order(config.channel_order),
      target_width: config.target_width,
      target_height: config.target_height,
      threshold: config.threshold,
      draw,
    }
  }

  pub fn with_threshold(mut self, threshold: Threshold) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn run<M>(
    &self,
    image: DynamicImage,
    model: &mut M,
    labels: &LabelTable,
  ) -> Result<TaskOutput, TaskError>
  where
    M: Model<Input = PreprocessResult, Output = RawDetectionSet, Error = DetectorError>,
  {
    info!("开始任务...");
    let now = Instant::now();

    let prepared = self
      .preprocessor
      .prepare(&image, self.target_width, self.target_height)?;
    let (scale_x, scale_y) = (prepared.scale_x, prepared.scale_y);
    enter(Stage::Preprocessed, now);

    let now = Instant::now();
    let raw = model.infer(prepared)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    enter(Stage::Inferred, now);

    let now = Instant::now();
    let detections = filter(&raw, scale_x, scale_y, self.threshold);
    enter(Stage::Filtered, now);

    let now = Instant::now();
    let mut annotated = image.into_rgb8();
    let unknown = self.draw.annotate(&mut annotated, &detections, labels);
    enter(Stage::Annotated, now);

    info!("检测到 {} 个对象", detections.len());
    debug!("阶段 {:?}", Stage::Done);
    Ok(TaskOutput {
      image: annotated,
      detections,
      unknown,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  struct FixedModel {
    raw: RawDetectionSet,
    seen: Vec<(usize, usize)>,
  }

  impl Model for FixedModel {
    type Input = PreprocessResult;
    type Output = RawDetectionSet;
    type Error = DetectorError;

    fn infer(&mut self, input: Self::Input) -> Result<Self::Output, Self::Error> {
      self.seen.push((input.tensor.width(), input.tensor.height()));
      Ok(self.raw.clone())
    }
  }

  struct BrokenModel;

  impl Model for BrokenModel {
    type Input = PreprocessResult;
    type Output = RawDetectionSet;
    type Error = DetectorError;

    fn infer(&mut self, _input: Self::Input) -> Result<Self::Output, Self::Error> {
      Err(DetectorError::unexpected("输出不是三元组"))
    }
  }

  fn small_config() -> DetectConfig {
    DetectConfig {
      target_width: 60,
      target_height: 40,
      ..DetectConfig::default()
    }
  }

  #[test]
  fn runs_every_stage_in_order() {
    let draw = Draw::new().unwrap();
    let config = small_config();
    let task = OneShotTask::new(&config, &draw);
    let mut model = FixedModel {
      raw: RawDetectionSet::from_candidates(&[
        ([5.0, 5.0, 15.0, 20.0], 0.92, 2),
        ([20.0, 10.0, 30.0, 30.0], 0.1, 0),
      ]),
      seen: Vec::new(),
    };

    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([0, 0, 0])));
    let output = task.run(image, &mut model, &LabelTable::coco()).unwrap();

    assert_eq!(model.seen, vec![(60, 40)]);
    assert_eq!(output.image.dimensions(), (120, 80));
    assert_eq!(
      output.detections,
      vec![BoundingBox {
        class_id: 2,
        score: 0.92,
        xmin: 10.0,
        ymin: 10.0,
        xmax: 30.0,
        ymax: 40.0,
      }]
    );
    assert!(output.unknown.is_empty());
    assert_eq!(*output.image.get_pixel(10, 25), Rgb([0, 0, 255]));
  }

  #[test]
  fn empty_detections_leave_image_unmodified() {
    let draw = Draw::new().unwrap();
    let config = small_config();
    let task = OneShotTask::new(&config, &draw);
    let mut model = FixedModel {
      raw: RawDetectionSet::empty(),
      seen: Vec::new(),
    };

    let original = RgbImage::from_fn(120, 80, |x, y| Rgb([x as u8, y as u8, 7]));
    let output = task
      .run(
        DynamicImage::ImageRgb8(original.clone()),
        &mut model,
        &LabelTable::coco(),
      )
      .unwrap();

    assert!(output.detections.is_empty());
    assert_eq!(output.image, original);
  }

  #[test]
  fn invalid_image_stops_before_inference() {
    let draw = Draw::new().unwrap();
    let config = small_config();
    let task = OneShotTask::new(&config, &draw);
    let mut model = FixedModel {
      raw: RawDetectionSet::empty(),
      seen: Vec::new(),
    };

    let err = task
      .run(
        DynamicImage::ImageRgb8(RgbImage::new(0, 0)),
        &mut model,
        &LabelTable::coco(),
      )
      .unwrap_err();

    assert!(matches!(err, TaskError::PreprocessError(_)));
    assert_eq!(err.stage(), Stage::Start);
    assert!(model.seen.is_empty());
  }

  #[test]
  fn model_failure_propagates() {
    let draw = Draw::new().unwrap();
    let config = small_config();
    let task = OneShotTask::new(&config, &draw);

    let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
    let err = task
      .run(image, &mut BrokenModel, &LabelTable::coco())
      .unwrap_err();

    assert!(matches!(
      err,
      TaskError::DetectorError(DetectorError::UnexpectedModelOutput(_))
    ));
    assert_eq!(err.stage(), Stage::Preprocessed);
  }

  #[test]
  fn threshold_override_is_applied() {
    let draw = Draw::new().unwrap();
    let config = small_config();
    let task = OneShotTask::new(&config, &draw).with_threshold(Threshold::new(0.95).unwrap());
    let mut model = FixedModel {
      raw: RawDetectionSet::from_candidates(&[([5.0, 5.0, 15.0, 20.0], 0.92, 2)]),
      seen: Vec::new(),
    };

    let image = DynamicImage::ImageRgb8(RgbImage::new(120, 80));
    let output = task.run(image, &mut model, &LabelTable::coco()).unwrap();
    assert!(output.detections.is_empty());
  }
}
