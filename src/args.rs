// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 服务参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use shanan_predict::{output::DEFAULT_JPEG_QUALITY, server::DEFAULT_BODY_LIMIT_MIB};

/// Shanan 推理服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址，例如 yolo26:///opt/models/model.rknn
  #[arg(long, env = "SHANAN_MODEL", value_name = "MODEL")]
  pub model: Url,

  /// 类别标签文件（JSON 数组或编号到名称的对象），最大编号加一即模型类别数
  #[arg(long, env = "SHANAN_LABELS", value_name = "FILE")]
  pub labels: PathBuf,

  /// 替换内置字体的 TrueType 字体文件
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 监听地址
  #[arg(long, default_value = "0.0.0.0")]
  pub host: String,

  /// 监听端口
  #[arg(long, default_value_t = 8080)]
  pub port: u16,

  /// 请求体大小上限 (MiB)
  #[arg(long, default_value_t = DEFAULT_BODY_LIMIT_MIB, value_parser = clap::value_parser!(u32).range(1..=1024))]
  pub max_body_mib: u32,

  /// 返回图像的 JPEG 质量 (1 - 100)
  #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
  pub jpeg_quality: u8,
}
