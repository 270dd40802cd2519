// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - BGR HWC 帧定义
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

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

const BGR_CHANNELS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error(
    "裁剪区域越界: ({x}, {y}) {width}x{height} 超出帧 {frame_width}x{frame_height}"
  )]
  CropOutOfBounds {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    frame_width: u32,
    frame_height: u32,
  },
  #[error("水平拼接高度不一致: 左 {left}, 右 {right}")]
  HeightMismatch { left: u32, right: u32 },
  #[error("垂直拼接宽度不一致: 上 {top}, 下 {bottom}")]
  WidthMismatch { top: u32, bottom: u32 },
}

/// 行优先、BGR 通道顺序的 8 位三通道帧
///
/// 请求中的图像一经解码就转换为该格式，后续切分、推理与绘制都基于它。
/// 允许宽或高为 0，用于 1 像素宽（高）图像切分出的空象限。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl BgrFrame {
  pub fn with_shape(width: u32, height: u32) -> Self {
    let size = BGR_CHANNELS * (width as usize) * (height as usize);
    Self {
      width,
      height,
      data: vec![0u8; size].into_boxed_slice(),
    }
  }

  pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
    let expected = BGR_CHANNELS * (width as usize) * (height as usize);
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn dimensions(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn channels(&self) -> usize {
    BGR_CHANNELS
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  fn stride(&self) -> usize {
    self.width as usize * BGR_CHANNELS
  }

  /// 读取 (x, y) 处像素，返回 [b, g, r]
  pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
    let idx = y as usize * self.stride() + x as usize * BGR_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  pub fn put_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
    let idx = y as usize * self.stride() + x as usize * BGR_CHANNELS;
    self.data[idx..idx + BGR_CHANNELS].copy_from_slice(&bgr);
  }

  /// 复制出 [x, x + width) × [y, y + height) 区域，返回独立的新帧
  pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, FrameError> {
    let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
    let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
    if !fits_x || !fits_y {
      return Err(FrameError::CropOutOfBounds {
        x,
        y,
        width,
        height,
        frame_width: self.width,
        frame_height: self.height,
      });
    }

    let row_len = width as usize * BGR_CHANNELS;
    let mut data = Vec::with_capacity(row_len * height as usize);
    for row in y..y + height {
      let start = row as usize * self.stride() + x as usize * BGR_CHANNELS;
      data.extend_from_slice(&self.data[start..start + row_len]);
    }

    Self::from_raw(width, height, data)
  }

  /// 左右拼接，两帧高度必须一致
  pub fn hconcat(left: &Self, right: &Self) -> Result<Self, FrameError> {
    if left.height != right.height {
      return Err(FrameError::HeightMismatch {
        left: left.height,
        right: right.height,
      });
    }

    let width = left.width + right.width;
    let mut data = Vec::with_capacity(left.data.len() + right.data.len());
    for row in 0..left.height as usize {
      data.extend_from_slice(&left.data[row * left.stride()..(row + 1) * left.stride()]);
      data.extend_from_slice(&right.data[row * right.stride()..(row + 1) * right.stride()]);
    }

    Self::from_raw(width, left.height, data)
  }

  /// 上下拼接，两帧宽度必须一致
  pub fn vconcat(top: &Self, bottom: &Self) -> Result<Self, FrameError> {
    if top.width != bottom.width {
      return Err(FrameError::WidthMismatch {
        top: top.width,
        bottom: bottom.width,
      });
    }

    let mut data = Vec::with_capacity(top.data.len() + bottom.data.len());
    data.extend_from_slice(&top.data);
    data.extend_from_slice(&bottom.data);

    Self::from_raw(top.width, top.height + bottom.height, data)
  }

  pub fn to_rgb_image(&self) -> RgbImage {
    // BGR 转 RGB
    ImageBuffer::from_fn(self.width, self.height, |x, y| {
      let [b, g, r] = self.pixel(x, y);
      Rgb([r, g, b])
    })
  }

  pub fn from_rgb_image(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity(BGR_CHANNELS * width as usize * height as usize);
    for Rgb([r, g, b]) in image.pixels() {
      data.extend_from_slice(&[*b, *g, *r]);
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }
}

impl From<RgbImage> for BgrFrame {
  fn from(image: RgbImage) -> Self {
    Self::from_rgb_image(&image)
  }
}

impl AsRef<[u8]> for BgrFrame {
  fn as_ref(&self) -> &[u8] {
    &self.data
  }
}

impl AsMut<[u8]> for BgrFrame {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gradient(width: u32, height: u32) -> BgrFrame {
    let mut frame = BgrFrame::with_shape(width, height);
    for y in 0..height {
      for x in 0..width {
        frame.put_pixel(x, y, [x as u8, y as u8, (x + y) as u8]);
      }
    }
    frame
  }

  #[test]
  fn from_raw_rejects_wrong_length() {
    let err = BgrFrame::from_raw(2, 2, vec![0; 11]).unwrap_err();
    assert_eq!(
      err,
      FrameError::LengthMismatch {
        expected: 12,
        actual: 11
      }
    );
  }

  #[test]
  fn rgb_conversion_swaps_channels() {
    let mut image = RgbImage::new(1, 1);
    image.put_pixel(0, 0, Rgb([10, 20, 30]));

    let frame = BgrFrame::from(image.clone());
    assert_eq!(frame.pixel(0, 0), [30, 20, 10]);
    assert_eq!(frame.to_rgb_image(), image);
  }

  #[test]
  fn crop_copies_region() {
    let frame = gradient(5, 4);
    let part = frame.crop(2, 1, 3, 2).unwrap();

    assert_eq!(part.dimensions(), (3, 2));
    assert_eq!(part.pixel(0, 0), frame.pixel(2, 1));
    assert_eq!(part.pixel(2, 1), frame.pixel(4, 2));
  }

  #[test]
  fn crop_out_of_bounds() {
    let frame = gradient(4, 4);
    assert!(matches!(
      frame.crop(3, 0, 2, 1),
      Err(FrameError::CropOutOfBounds { .. })
    ));
    assert!(matches!(
      frame.crop(0, u32::MAX, 1, 2),
      Err(FrameError::CropOutOfBounds { .. })
    ));
  }

  #[test]
  fn concat_restores_original() {
    let frame = gradient(5, 3);
    let left = frame.crop(0, 0, 2, 3).unwrap();
    let right = frame.crop(2, 0, 3, 3).unwrap();
    assert_eq!(BgrFrame::hconcat(&left, &right).unwrap(), frame);

    let top = frame.crop(0, 0, 5, 1).unwrap();
    let bottom = frame.crop(0, 1, 5, 2).unwrap();
    assert_eq!(BgrFrame::vconcat(&top, &bottom).unwrap(), frame);
  }

  #[test]
  fn concat_rejects_mismatched_shapes() {
    let a = BgrFrame::with_shape(2, 2);
    let b = BgrFrame::with_shape(2, 3);
    assert_eq!(
      BgrFrame::hconcat(&a, &b).unwrap_err(),
      FrameError::HeightMismatch { left: 2, right: 3 }
    );

    let c = BgrFrame::with_shape(3, 2);
    assert_eq!(
      BgrFrame::vconcat(&a, &c).unwrap_err(),
      FrameError::WidthMismatch { top: 2, bottom: 3 }
    );
  }

  #[test]
  fn empty_frames_concat() {
    let top = BgrFrame::hconcat(&BgrFrame::with_shape(0, 0), &BgrFrame::with_shape(1, 0)).unwrap();
    assert_eq!(top.dimensions(), (1, 0));
    assert!(top.is_empty());

    let full = BgrFrame::vconcat(&top, &BgrFrame::with_shape(1, 1)).unwrap();
    assert_eq!(full.dimensions(), (1, 1));
  }
}
