// 该文件是 Shanan （山南西风） 项目的一部分。
// src/quadrant.rs - 四象限切分与拼接
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

use thiserror::Error;

use crate::frame::{BgrFrame, FrameError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuadrantError {
  #[error("帧操作错误: {0}")]
  FrameError(#[from] FrameError),
  #[error("拼接尺寸不一致: 期望 {expected:?}, 实际 {actual:?}")]
  DimensionMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadrantPosition {
  TopLeft,
  TopRight,
  BottomLeft,
  BottomRight,
}

impl QuadrantPosition {
  /// 合并检测结果与拼接时使用的顺序
  pub const ALL: [QuadrantPosition; 4] = [
    QuadrantPosition::TopLeft,
    QuadrantPosition::TopRight,
    QuadrantPosition::BottomLeft,
    QuadrantPosition::BottomRight,
  ];
}

/// 象限：原图的一份独立拷贝，以及其左上角在原图中的偏移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadrant {
  pub position: QuadrantPosition,
  pub frame: BgrFrame,
  pub offset: (u32, u32),
}

/// 以 floor(W/2)、floor(H/2) 为界切成四块，奇数尺寸多出的像素归右侧与下方
pub fn split_quadrants(frame: &BgrFrame) -> Result<[Quadrant; 4], QuadrantError> {
  let (width, height) = frame.dimensions();
  let (mid_w, mid_h) = (width / 2, height / 2);

  let cut = |position: QuadrantPosition,
             x: u32,
             y: u32,
             w: u32,
             h: u32|
   -> Result<Quadrant, QuadrantError> {
    Ok(Quadrant {
      position,
      frame: frame.crop(x, y, w, h)?,
      offset: (x, y),
    })
  };

  Ok([
    cut(QuadrantPosition::TopLeft, 0, 0, mid_w, mid_h)?,
    cut(QuadrantPosition::TopRight, mid_w, 0, width - mid_w, mid_h)?,
    cut(QuadrantPosition::BottomLeft, 0, mid_h, mid_w, height - mid_h)?,
    cut(
      QuadrantPosition::BottomRight,
      mid_w,
      mid_h,
      width - mid_w,
      height - mid_h,
    )?,
  ])
}

/// 按 [左上, 右上, 左下, 右下] 顺序拼回整图，结果必须为 expected 尺寸
pub fn reassemble_quadrants(
  parts: &[BgrFrame; 4],
  expected: (u32, u32),
) -> Result<BgrFrame, QuadrantError> {
  let [top_left, top_right, bottom_left, bottom_right] = parts;
  let top = BgrFrame::hconcat(top_left, top_right)?;
  let bottom = BgrFrame::hconcat(bottom_left, bottom_right)?;
  let full = BgrFrame::vconcat(&top, &bottom)?;

  if full.dimensions() != expected {
    return Err(QuadrantError::DimensionMismatch {
      expected,
      actual: full.dimensions(),
    });
  }
  Ok(full)
}
