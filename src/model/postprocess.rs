// 该文件是 Dinovis 项目的一部分。
// src/model/postprocess.rs - 置信度过滤与坐标还原
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

use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::model::{BoundingBox, RawDetectionSet};

const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("置信度阈值必须位于 [0, 1] 区间, 实际为 {0}")]
pub struct InvalidThreshold(pub f32);

/// 取值在 [0, 1] 的置信度阈值
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f32);

impl Default for Threshold {
  fn default() -> Self {
    Threshold(DEFAULT_THRESHOLD)
  }
}

impl Threshold {
  pub fn new(value: f32) -> Result<Self, InvalidThreshold> {
    if (0.0..=1.0).contains(&value) {
      Ok(Threshold(value))
    } else {
      Err(InvalidThreshold(value))
    }
  }

  pub fn value(self) -> f32 {
    self.0
  }
}

impl FromStr for Threshold {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let value: f32 = s.parse().map_err(|e| format!("{}", e))?;
    Threshold::new(value).map_err(|e| e.to_string())
  }
}

/// 保留 `score >= threshold` 的候选，坐标按 x/y 缩放系数还原到原图空间。
/// 输出保持模型输出顺序，不排序、不去重。
pub fn filter(
  raw: &RawDetectionSet,
  scale_x: f32,
  scale_y: f32,
  threshold: Threshold,
) -> Vec<BoundingBox> {
  let threshold = threshold.value();
  let items: Vec<BoundingBox> = raw
    .iter()
    .filter(|&(_, score, _)| score >= threshold)
    .map(|([xmin, ymin, xmax, ymax], score, class_id)| BoundingBox {
      class_id,
      score,
      xmin: xmin * scale_x,
      ymin: ymin * scale_y,
      xmax: xmax * scale_x,
      ymax: ymax * scale_y,
    })
    .collect();

  debug!(
    "阈值 {:.2}: {} 个候选中保留 {} 个",
    threshold,
    raw.len(),
    items.len()
  );
  items
}
