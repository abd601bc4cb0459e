// 该文件是 Dinovis 项目的一部分。
// src/model.rs - 模型
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

use ndarray::{Array1, Array2};
use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("模型文件读取错误: {0}")]
  ModelIoError(#[from] std::io::Error),
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("加速设备不可用: {0}")]
  DeviceUnavailable(String),
  #[error("模型输出不符合约定: {0}")]
  UnexpectedModelOutput(String),
  #[error("ONNX Runtime 错误: {0}")]
  RuntimeError(#[from] ort::Error),
}

impl DetectorError {
  pub fn unexpected(msg: impl Into<String>) -> Self {
    DetectorError::UnexpectedModelOutput(msg.into())
  }
}

/// 单个检测结果，坐标位于原图像素空间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub class_id: i64,
  pub score: f32,
  pub xmin: f32,
  pub ymin: f32,
  pub xmax: f32,
  pub ymax: f32,
}

/// 模型原始输出：N 个候选，boxes 为模型输入空间的 [xmin, ymin, xmax, ymax]
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetectionSet {
  boxes: Array2<f32>,
  scores: Array1<f32>,
  classes: Array1<i64>,
}

impl RawDetectionSet {
  pub fn new(
    boxes: Array2<f32>,
    scores: Array1<f32>,
    classes: Array1<i64>,
  ) -> Result<Self, DetectorError> {
    let n = boxes.nrows();
    if boxes.ncols() != 4 {
      return Err(DetectorError::unexpected(format!(
        "boxes 每行应有 4 个坐标, 实际为 {}",
        boxes.ncols()
      )));
    }
    if scores.len() != n || classes.len() != n {
      return Err(DetectorError::unexpected(format!(
        "boxes/scores/classes 长度不一致: {}/{}/{}",
        n,
        scores.len(),
        classes.len()
      )));
    }
    Ok(Self {
      boxes,
      scores,
      classes,
    })
  }

  pub fn empty() -> Self {
    Self {
      boxes: Array2::zeros((0, 4)),
      scores: Array1::zeros(0),
      classes: Array1::zeros(0),
    }
  }

  pub fn from_candidates(candidates: &[([f32; 4], f32, i64)]) -> Self {
    let n = candidates.len();
    Self {
      boxes: Array2::from_shape_fn((n, 4), |(i, j)| candidates[i].0[j]),
      scores: candidates.iter().map(|c| c.1).collect(),
      classes: candidates.iter().map(|c| c.2).collect(),
    }
  }

  /// 由运行时返回的 (shape, data) 三元组构造，检查 [N, 4] / [N] / [N] 形状约定
  pub fn from_raw_parts(
    (box_shape, boxes): (&[i64], &[f32]),
    (score_shape, scores): (&[i64], &[f32]),
    (class_shape, classes): (&[i64], &[i64]),
  ) -> Result<Self, DetectorError> {
    let n = match *box_shape {
      [n, 4] if n >= 0 => n as usize,
      _ => {
        return Err(DetectorError::unexpected(format!(
          "boxes 形状应为 [N, 4], 实际为 {:?}",
          box_shape
        )));
      }
    };
    if score_shape != [n as i64] {
      return Err(DetectorError::unexpected(format!(
        "scores 形状应为 [{}], 实际为 {:?}",
        n, score_shape
      )));
    }
    if class_shape != [n as i64] {
      return Err(DetectorError::unexpected(format!(
        "classes 形状应为 [{}], 实际为 {:?}",
        n, class_shape
      )));
    }

    let boxes = Array2::from_shape_vec((n, 4), boxes.to_vec())
      .map_err(|e| DetectorError::unexpected(format!("boxes 数据长度错误: {}", e)))?;
    Self::new(
      boxes,
      Array1::from_vec(scores.to_vec()),
      Array1::from_vec(classes.to_vec()),
    )
  }

  pub fn len(&self) -> usize {
    self.scores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  /// 按模型输出顺序遍历 (box, score, class)
  pub fn iter(&self) -> impl Iterator<Item = ([f32; 4], f32, i64)> + '_ {
    self
      .boxes
      .rows()
      .into_iter()
      .zip(self.scores.iter())
      .zip(self.classes.iter())
      .map(|((row, &score), &class_id)| ([row[0], row[1], row[2], row[3]], score, class_id))
  }
}

mod dino;
mod postprocess;
pub use self::dino::{DEFAULT_INPUT_NAME, Device, DinoDetector, DinoDetectorBuilder};
pub use self::postprocess::{InvalidThreshold, Threshold, filter};
