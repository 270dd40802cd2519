// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/display.rs - 本地图像检测结果展示
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use url::Url;

use shanan_predict::{
  FromUrl,
  annotate::Annotator,
  input::ImageFileInput,
  model::{LabelMap, Yolo26Builder},
  output::{SaveImageFileOutput, draw::Draw},
  task::{OneShotTask, QuadrantTask, Task},
};

/// 在本地图像上绘制检测结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址，例如 yolo26:///opt/models/model.rknn
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，image:// 方案，可以是文件或目录
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出图像路径，image:// 方案
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 类别标签文件，最大编号加一即模型类别数
  #[arg(long, value_name = "FILE")]
  pub labels: PathBuf,
  /// 替换内置字体的字体文件
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
  /// 按四象限分别推理
  #[arg(long)]
  pub tiled: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let mut input = ImageFileInput::from_url(&args.input)?;
  let output = SaveImageFileOutput::from_url(&args.output)?;

  let labels = LabelMap::load(&args.labels)?;
  let mut builder = Yolo26Builder::from_url(&args.model)?;
  if let Some(class_num) = labels.class_count() {
    builder = builder.class_num(class_num);
  }
  let model = builder.build()?;

  let mut draw = Draw::default();
  if let Some(path) = &args.font {
    draw = draw.with_font(Draw::load_font(path)?);
  }
  let annotator = Annotator::new(labels, draw);

  let frame = input
    .next()
    .ok_or_else(|| anyhow!("无法读取图像: {}", input.path().display()))?;

  let annotated = if args.tiled {
    QuadrantTask.run_task(&frame, &model, &annotator)?
  } else {
    OneShotTask.run_task(&frame, &model, &annotator)?
  };

  for det in &annotated.detections {
    info!(
      "  - {}: {:.2}% at {:?}",
      det.label,
      det.confidence * 100.0,
      det.coordinates
    );
  }
  output.save(&annotated.frame)?;

  Ok(())
}
