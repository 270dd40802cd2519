// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{collections::BTreeMap, path::Path};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::info;

/// BGR 颜色
pub type Bgr = [u8; 3];

pub const DEFAULT_COLOR: Bgr = [255, 0, 0];

const CLASS_COLORS: [(u32, Bgr); 4] = [
  (0, [255, 51, 51]),
  (1, [128, 255, 0]),
  (2, [255, 0, 255]),
  (3, [0, 102, 204]),
];

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_TEXT_HEIGHT: i32 = 16;
const LABEL_TEXT_GAP: i32 = 4;
const BOX_THICKNESS: i32 = 2;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 类别编号到显示颜色的固定映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
  colors: BTreeMap<u32, Bgr>,
  fallback: Bgr,
}

impl Default for ColorMap {
  fn default() -> Self {
    Self {
      colors: CLASS_COLORS.into_iter().collect(),
      fallback: DEFAULT_COLOR,
    }
  }
}

impl ColorMap {
  pub fn color(&self, class_id: u32) -> Bgr {
    self.colors.get(&class_id).copied().unwrap_or(self.fallback)
  }
}

fn to_rgb([b, g, r]: Bgr) -> Rgb<u8> {
  Rgb([r, g, b])
}

/// 在 RGB 图像上绘制检测框与标签
#[derive(Clone)]
pub struct Draw {
  font: FontArc,
  font_size: f32,
  label_text_height: i32,
  thickness: i32,
}

impl Default for Draw {
  fn default() -> Self {
    let font_data = include_bytes!("../../assets/font.ttf"); // default font
    let font = FontArc::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      thickness: BOX_THICKNESS,
    }
  }
}

impl Draw {
  /// 替换内置字体
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = font;
    self
  }

  pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, DrawError> {
    let path = path.as_ref();
    let font = FontArc::try_from_vec(std::fs::read(path)?)?;
    info!("加载字体文件: {}", path.display());
    Ok(font)
  }

  /// 标签文字的顶边：框上方留出文字高度与间隙，不超出第 0 行
  fn label_y(&self, y_min: i32) -> i32 {
    (y_min - self.label_text_height - LABEL_TEXT_GAP).max(0)
  }

  /// bbox 为像素坐标 [x_min, y_min, x_max, y_max]，超出图像的部分被裁掉
  pub fn draw_bbox_with_label(&self, image: &mut RgbImage, bbox: [u32; 4], label: &str, color: Bgr) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let x_min = (bbox[0] as i64).clamp(0, w as i64 - 1) as i32;
    let y_min = (bbox[1] as i64).clamp(0, h as i64 - 1) as i32;
    let x_max = (bbox[2] as i64).clamp(0, w as i64 - 1) as i32;
    let y_max = (bbox[3] as i64).clamp(0, h as i64 - 1) as i32;
    let color = to_rgb(color);

    // 由外向内逐层描边
    for t in 0..self.thickness {
      let box_w = x_max - x_min - 2 * t + 1;
      let box_h = y_max - y_min - 2 * t + 1;
      if box_w <= 0 || box_h <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(box_w as u32, box_h as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    draw_text_mut(
      image,
      color,
      x_min,
      self.label_y(y_min),
      PxScale::from(self.font_size),
      &self.font,
      label,
    );
  }
}
