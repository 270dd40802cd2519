// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 推理服务主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shanan_predict::{
  FromUrl,
  annotate::Annotator,
  model::{LabelMap, Yolo26Builder},
  output::draw::Draw,
  predict::Predictor,
  server,
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型地址: {}", args.model);
  info!("监听地址: {}:{}", args.host, args.port);

  let labels = LabelMap::load(&args.labels)?;
  if labels.is_empty() {
    warn!("标签文件为空，所有类别将显示为 N/A");
  }

  // 模型不存在时拒绝启动
  let mut builder = Yolo26Builder::from_url(&args.model)?;
  if let Some(class_num) = labels.class_count() {
    builder = builder.class_num(class_num);
  }
  let model = builder.build()?;

  let mut draw = Draw::default();
  if let Some(path) = &args.font {
    draw = draw.with_font(Draw::load_font(path)?);
  }

  let predictor =
    Predictor::new(model, Annotator::new(labels, draw)).with_jpeg_quality(args.jpeg_quality);

  let body_limit = args.max_body_mib as usize * 1024 * 1024;
  server::serve(
    (args.host.as_str(), args.port),
    Arc::new(predictor),
    body_limit,
  )
  .await?;

  Ok(())
}
