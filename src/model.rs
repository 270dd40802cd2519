// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;

use crate::frame::BgrFrame;

/// 目标检测模型
///
/// 输入任意尺寸的 BGR 帧，输出坐标位于该帧局部像素坐标系中的检测结果。
/// 模型在启动时构造一次，之后只读共享。
pub trait Model {
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&self, input: &BgrFrame) -> Result<DetectResult, Self::Error>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("类别编号无效: {0}")]
pub struct InvalidClassId(pub f32);

/// 模型输出的单个检测
#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  /// 类别编号，模型以浮点形式给出
  pub class: f32,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，输入帧像素坐标
}

impl DetectItem {
  pub fn class_id(&self) -> Result<u32, InvalidClassId> {
    let class = self.class;
    if class.is_finite() && class >= 0.0 && class.fract() == 0.0 && class <= u32::MAX as f32 {
      Ok(class as u32)
    } else {
      Err(InvalidClassId(class))
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

pub mod head;
mod label;
pub use self::label::{LabelMap, LabelMapError, UNKNOWN_LABEL};

#[cfg(feature = "model_yolo26")]
mod yolo26;
#[cfg(feature = "model_yolo26")]
pub use self::yolo26::{YOLO26_CLASS_NUM, Yolo26, Yolo26Builder, Yolo26Error};
