// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/base64_image.rs - Base64 图像输入
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
use image::error::{LimitError, LimitErrorKind};
use thiserror::Error;
use tracing::debug;

use crate::frame::BgrFrame;

const DATA_URL_IMAGE_PREFIX: &str = "data:image";

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("Invalid Base64 image data: {0}")]
  InvalidEncoding(#[from] base64::DecodeError),
  #[error("Invalid image data: {0}")]
  InvalidImageData(#[from] image::ImageError),
}

/// 去掉 `data:image/...;base64,` 前缀；没有前缀时原样返回
pub fn strip_data_url_prefix(input: &str) -> &str {
  if input.starts_with(DATA_URL_IMAGE_PREFIX)
    && let Some((_, payload)) = input.split_once(',')
  {
    payload
  } else {
    input
  }
}

pub fn decode_base64(input: &str) -> Result<Vec<u8>, DecodeError> {
  let payload: String = strip_data_url_prefix(input)
    .chars()
    .filter(|c| !c.is_ascii_whitespace())
    .collect();
  Ok(STANDARD.decode(payload)?)
}

/// 按常见编码格式解码图像字节，统一转换为 BGR 三通道
pub fn decode_image_bytes(bytes: &[u8]) -> Result<BgrFrame, DecodeError> {
  let image = image::load_from_memory(bytes)?.to_rgb8();
  if image.width() == 0 || image.height() == 0 {
    return Err(DecodeError::InvalidImageData(image::ImageError::Limits(
      LimitError::from_kind(LimitErrorKind::DimensionError),
    )));
  }

  debug!("解码图像: {}x{}", image.width(), image.height());
  Ok(BgrFrame::from(image))
}

pub fn decode_base64_image(input: &str) -> Result<BgrFrame, DecodeError> {
  let bytes = decode_base64(input)?;
  decode_image_bytes(&bytes)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;

  fn png_base64(image: &RgbImage) -> String {
    let mut buf = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
      .unwrap();
    STANDARD.encode(buf)
  }

  #[test]
  fn strips_data_url_prefix() {
    assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
    assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    assert_eq!(strip_data_url_prefix("data:text/plain,AAAA"), "data:text/plain,AAAA");
  }

  #[test]
  fn decodes_png_into_bgr() {
    let mut image = RgbImage::new(3, 2);
    image.put_pixel(1, 1, Rgb([200, 100, 50]));

    let frame = decode_base64_image(&png_base64(&image)).unwrap();
    assert_eq!(frame.dimensions(), (3, 2));
    assert_eq!(frame.pixel(1, 1), [50, 100, 200]);
  }

  #[test]
  fn accepts_data_url_and_line_breaks() {
    let image = RgbImage::new(4, 4);
    let encoded = png_base64(&image);
    let (head, tail) = encoded.split_at(encoded.len() / 2);
    let wrapped = format!("data:image/png;base64,{head}\n{tail}");

    assert_eq!(decode_base64_image(&wrapped).unwrap().dimensions(), (4, 4));
  }

  #[test]
  fn malformed_base64_is_invalid_encoding() {
    assert!(matches!(
      decode_base64_image("not-base64!!"),
      Err(DecodeError::InvalidEncoding(_))
    ));
  }

  #[test]
  fn non_image_bytes_are_invalid_image_data() {
    let encoded = STANDARD.encode(b"definitely not an image");
    assert!(matches!(
      decode_base64_image(&encoded),
      Err(DecodeError::InvalidImageData(_))
    ));
  }
}
