// 该文件是 Dinovis 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use dinovis::{
  config::DetectConfig,
  model::{Device, Threshold},
};

/// Dinovis 项目参数配置
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about,
  long_about = None,
  after_help = "参数数量错误时在 stderr 打印用法并以状态码 2 退出"
)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(value_name = "MODEL")]
  pub model: PathBuf,

  /// 输入图像路径
  #[arg(value_name = "IMAGE")]
  pub image: PathBuf,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub threshold: Threshold,

  /// 使用 CPU 推理（默认使用 CUDA，需以 `--features cuda` 构建，否则报告设备不可用）
  #[arg(long)]
  pub cpu: bool,

  /// CUDA 设备编号
  #[arg(long, default_value = "0", value_name = "ID", conflicts_with = "cpu")]
  pub device_id: i32,

  /// 标签文件，每行一个类别名（默认使用内置 COCO 标签）
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 保存绘制结果的图像路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<PathBuf>,

  /// 不打开显示窗口
  #[arg(long)]
  pub no_display: bool,
}

impl Args {
  pub fn detect_config(&self) -> DetectConfig {
    let device = if self.cpu {
      Device::Cpu
    } else {
      Device::Cuda {
        device_id: self.device_id,
      }
    };

    DetectConfig {
      device,
      threshold: self.threshold,
      ..DetectConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn positional_paths_and_defaults() {
    let args = Args::try_parse_from(["dinovis", "model.onnx", "street.jpg"]).unwrap();
    assert_eq!(args.model, PathBuf::from("model.onnx"));
    assert_eq!(args.image, PathBuf::from("street.jpg"));

    let config = args.detect_config();
    assert_eq!(config.device, Device::Cuda { device_id: 0 });
    assert_eq!(config.threshold.value(), 0.5);
  }

  #[test]
  fn wrong_argument_count_is_usage_error() {
    assert!(Args::try_parse_from(["dinovis", "model.onnx"]).is_err());
    assert!(Args::try_parse_from(["dinovis", "a", "b", "c"]).is_err());
  }

  #[test]
  fn threshold_outside_range_is_rejected() {
    assert!(Args::try_parse_from(["dinovis", "m", "i", "--threshold", "1.2"]).is_err());
  }

  #[test]
  fn help_mentions_usage_exit_status_and_cuda_build() {
    let help = Args::command().render_help().to_string();
    assert!(help.contains("状态码 2"));
    assert!(help.contains("--features cuda"));
  }

  #[test]
  fn cpu_flag_selects_cpu() {
    let args = Args::try_parse_from(["dinovis", "m", "i", "--cpu"]).unwrap();
    assert_eq!(args.detect_config().device, Device::Cpu);
  }
}
