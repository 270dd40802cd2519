// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/encode.rs - 结果图像编码
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

use base64::{Engine, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::debug;

use crate::frame::BgrFrame;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Error, Debug)]
#[error("Failed to encode image: {0}")]
pub struct EncodeError(#[from] image::ImageError);

pub fn encode_jpeg(frame: &BgrFrame, quality: u8) -> Result<Vec<u8>, EncodeError> {
  let mut buffer = Vec::new();
  JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
    .encode_image(&frame.to_rgb_image())?;
  debug!(
    "编码 JPEG: {}x{}, {} 字节",
    frame.width(),
    frame.height(),
    buffer.len()
  );
  Ok(buffer)
}

pub fn encode_jpeg_base64(frame: &BgrFrame, quality: u8) -> Result<String, EncodeError> {
  Ok(STANDARD.encode(encode_jpeg(frame, quality)?))
}
