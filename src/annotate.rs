// 该文件是 Shanan （山南西风） 项目的一部分。
// src/annotate.rs - 检测结果过滤、坐标平移与标注
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

use serde::Serialize;
use tracing::debug;

use crate::{
  frame::BgrFrame,
  model::{DetectResult, InvalidClassId, LabelMap},
  output::draw::{ColorMap, Draw},
};

/// 置信度低于该值的检测被丢弃，不可按请求调整
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// 整图坐标系下的检测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  pub coordinates: [u32; 4],
  pub label: String,
  pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
  pub frame: BgrFrame,
  pub detections: Vec<Detection>,
}

/// 局部浮点框截断为整数像素，并保证 min <= max
pub fn pixel_box(bbox: [f32; 4]) -> [u32; 4] {
  let [x1, y1, x2, y2] = bbox.map(|v| v as u32);
  [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]
}

pub fn translate_box(bbox: [u32; 4], (offset_x, offset_y): (u32, u32)) -> [u32; 4] {
  [
    bbox[0].saturating_add(offset_x),
    bbox[1].saturating_add(offset_y),
    bbox[2].saturating_add(offset_x),
    bbox[3].saturating_add(offset_y),
  ]
}

pub fn label_text(label: &str, confidence: f32) -> String {
  format!("{}: {:.2}", label, confidence)
}

/// 把模型输出转换为带标签的整图检测，并在帧的拷贝上绘制
#[derive(Clone, Default)]
pub struct Annotator {
  labels: LabelMap,
  colors: ColorMap,
  draw: Draw,
}

impl Annotator {
  pub fn new(labels: LabelMap, draw: Draw) -> Self {
    Self {
      labels,
      colors: ColorMap::default(),
      draw,
    }
  }

  pub fn labels(&self) -> &LabelMap {
    &self.labels
  }

  /// frame 为模型的输入帧，offset 为其左上角在整图中的位置
  pub fn annotate(
    &self,
    frame: &BgrFrame,
    result: &DetectResult,
    offset: (u32, u32),
  ) -> Result<Annotated, InvalidClassId> {
    let mut detections = Vec::new();
    let mut image = None;

    for item in result.items.iter() {
      // NaN 不满足比较，同样被丢弃
      if !(item.score >= CONFIDENCE_THRESHOLD) {
        continue;
      }

      let class_id = item.class_id()?;
      let label = self.labels.name(class_id);
      let local = pixel_box(item.bbox);

      let canvas = image.get_or_insert_with(|| frame.to_rgb_image());
      self.draw.draw_bbox_with_label(
        canvas,
        local,
        &label_text(label, item.score),
        self.colors.color(class_id),
      );

      let coordinates = translate_box(local, offset);
      debug!(
        "检测到 {}: {:.2} at {:?}",
        label, item.score, coordinates
      );
      detections.push(Detection {
        coordinates,
        label: label.to_string(),
        confidence: item.score,
      });
    }

    let frame = match image {
      Some(image) => BgrFrame::from(image),
      None => frame.clone(),
    };
    Ok(Annotated { frame, detections })
  }
}
