// 该文件是 Dinovis 项目的一部分。
// src/model/dino.rs - DINO 检测模型推理适配
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

use std::path::{Path, PathBuf};

use ort::{
  execution_providers::{CUDAExecutionProvider, ExecutionProvider},
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use tracing::{debug, error, info};

use crate::{
  input::PreprocessResult,
  model::{DetectorError, Model, RawDetectionSet},
};

const DINO_NUM_INPUTS: usize = 1;
const DINO_NUM_OUTPUTS: usize = 3;
pub const DEFAULT_INPUT_NAME: &str = "image";

/// 推理设备。选择加速设备后若其不可用则直接报错，不回退到 CPU。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
  Cpu,
  Cuda { device_id: i32 },
}

impl Default for Device {
  fn default() -> Self {
    Device::Cuda { device_id: 0 }
  }
}

pub struct DinoDetector {
  session: Session,
  input_name: String,
}

pub struct DinoDetectorBuilder {
  model_path: PathBuf,
  device: Device,
  input_name: String,
}

fn load_error(msg: &str, e: impl std::fmt::Display) -> DetectorError {
  error!("{}: {}", msg, e);
  DetectorError::ModelLoadError(format!("{}: {}", msg, e))
}

impl DinoDetectorBuilder {
  pub fn new(model_path: impl AsRef<Path>) -> Self {
    Self {
      model_path: model_path.as_ref().to_path_buf(),
      device: Device::default(),
      input_name: DEFAULT_INPUT_NAME.to_string(),
    }
  }

  pub fn device(mut self, device: Device) -> Self {
    self.device = device;
    self
  }

  pub fn input_name(mut self, name: impl Into<String>) -> Self {
    self.input_name = name.into();
    self
  }

  pub fn build(self) -> Result<DinoDetector, DetectorError> {
    info!("加载模型文件: {}", self.model_path.display());
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let mut builder = Session::builder()
      .map_err(|e| load_error("无法创建推理会话", e))?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(|e| load_error("无法设置图优化等级", e))?;

    if let Device::Cuda { device_id } = self.device {
      info!("使用 CUDA 设备 {}", device_id);
      let cuda = CUDAExecutionProvider::default().with_device_id(device_id);
      match cuda.is_available() {
        Ok(true) => {}
        Ok(false) => {
          error!("CUDA 执行后端不可用");
          return Err(DetectorError::DeviceUnavailable(format!(
            "CUDA 设备 {} 不可用",
            device_id
          )));
        }
        Err(e) => return Err(DetectorError::DeviceUnavailable(e.to_string())),
      }
      builder = builder
        .with_execution_providers([cuda.build().error_on_failure()])
        .map_err(|e| DetectorError::DeviceUnavailable(e.to_string()))?;
    }

    info!("创建 ONNX Runtime 推理会话");
    let session = builder
      .commit_from_memory(&model_data)
      .map_err(|e| load_error("模型无效", e))?;

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs != DINO_NUM_INPUTS {
      return Err(load_error(
        "模型输入数量不符",
        format!("预期 {}, 实际 {}", DINO_NUM_INPUTS, num_inputs),
      ));
    }
    if session.inputs[0].name != self.input_name {
      return Err(load_error(
        "模型输入名称不符",
        format!("预期 '{}', 实际 '{}'", self.input_name, session.inputs[0].name),
      ));
    }
    if num_outputs != DINO_NUM_OUTPUTS {
      return Err(load_error(
        "模型输出数量不符",
        format!("预期 {}, 实际 {}", DINO_NUM_OUTPUTS, num_outputs),
      ));
    }

    info!("模型加载完成");
    Ok(DinoDetector {
      session,
      input_name: self.input_name,
    })
  }
}

impl Model for DinoDetector {
  type Input = PreprocessResult;
  type Output = RawDetectionSet;
  type Error = DetectorError;

  /// 返回全部候选，不做阈值过滤或去重
  fn infer(&mut self, input: Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let tensor = Tensor::from_array(input.tensor.into_array())?;

    debug!("执行模型推理");
    let outputs = self
      .session
      .run(ort::inputs![self.input_name.as_str() => tensor])?;

    if outputs.len() != DINO_NUM_OUTPUTS {
      return Err(DetectorError::unexpected(format!(
        "预期 {} 个输出, 实际为 {}",
        DINO_NUM_OUTPUTS,
        outputs.len()
      )));
    }

    let (box_shape, boxes) = outputs[0]
      .try_extract_tensor::<f32>()
      .map_err(|e| DetectorError::unexpected(format!("boxes 不是 f32 张量: {}", e)))?;
    let (score_shape, scores) = outputs[1]
      .try_extract_tensor::<f32>()
      .map_err(|e| DetectorError::unexpected(format!("scores 不是 f32 张量: {}", e)))?;
    let (class_shape, classes) = outputs[2]
      .try_extract_tensor::<i64>()
      .map_err(|e| DetectorError::unexpected(format!("classes 不是 i64 张量: {}", e)))?;

    let raw = RawDetectionSet::from_raw_parts(
      (&box_shape[..], boxes),
      (&score_shape[..], scores),
      (&class_shape[..], classes),
    )?;
    debug!("模型返回 {} 个候选", raw.len());
    Ok(raw)
  }
}
