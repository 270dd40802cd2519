// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/head.rs - YOLO 检测头解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::model::DetectItem;

/// 单个检测头的网格与步长
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadShape {
  pub map_h: usize,
  pub map_w: usize,
  pub stride: f32,
}

impl HeadShape {
  pub fn spatial(&self) -> usize {
    self.map_h * self.map_w
  }
}

/// 按大小区分同一检测头的回归 (4 * spatial) 与分类 (class_num * spatial) 张量
///
/// 两者大小相同（class_num == 4）时无法靠大小区分，按输出顺序取 tensor1 为回归张量。
pub fn split_reg_cls<'a>(
  tensor1: &'a [f32],
  tensor2: &'a [f32],
  spatial: usize,
  class_num: usize,
) -> Option<(&'a [f32], &'a [f32])> {
  let reg_expected = 4 * spatial;
  let cls_expected = class_num * spatial;

  if tensor1.len() == reg_expected && tensor2.len() == cls_expected {
    Some((tensor1, tensor2))
  } else if tensor2.len() == reg_expected && tensor1.len() == cls_expected {
    Some((tensor2, tensor1))
  } else {
    None
  }
}

/// 网格位置 idx 上得分最高的类别，NaN 不参与比较
pub fn best_class(cls: &[f32], spatial: usize, idx: usize, class_num: usize) -> Option<(usize, f32)> {
  (0..class_num)
    .map(|c| (c, cls[c * spatial + idx]))
    .filter(|(_, logit)| !logit.is_nan())
    .max_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 解码一个检测头
///
/// 框先按 input_size 截断，再乘以 scale 映射到原始输入帧。
pub fn decode_head(
  reg: &[f32],
  cls: &[f32],
  shape: HeadShape,
  class_num: usize,
  input_size: f32,
  (scale_x, scale_y): (f32, f32),
  candidate_thresh: f32,
) -> Vec<DetectItem> {
  let spatial = shape.spatial();
  let mut items = Vec::new();

  for h in 0..shape.map_h {
    for w in 0..shape.map_w {
      let idx = h * shape.map_w + w;

      let Some((class_idx, max_logit)) = best_class(cls, spatial, idx, class_num) else {
        continue;
      };
      let score = sigmoid(max_logit);
      if !(score >= candidate_thresh) {
        continue;
      }

      let grid_x = (w as f32) + 0.5;
      let grid_y = (h as f32) + 0.5;
      let stride = shape.stride;
      let xmin = ((grid_x - reg[idx]) * stride).clamp(0.0, input_size);
      let ymin = ((grid_y - reg[spatial + idx]) * stride).clamp(0.0, input_size);
      let xmax = ((grid_x + reg[2 * spatial + idx]) * stride).clamp(0.0, input_size);
      let ymax = ((grid_y + reg[3 * spatial + idx]) * stride).clamp(0.0, input_size);

      items.push(DetectItem {
        class: class_idx as f32,
        score,
        bbox: [
          xmin * scale_x,
          ymin * scale_y,
          xmax * scale_x,
          ymax * scale_y,
        ],
      });
    }
  }

  items
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_by_size_in_either_order() {
    let spatial = 4;
    let reg = vec![0.0; 16];
    let cls = vec![0.0; 8];

    let (r, c) = split_reg_cls(&cls, &reg, spatial, 2).unwrap();
    assert_eq!((r.len(), c.len()), (16, 8));
    let (r, c) = split_reg_cls(&reg, &cls, spatial, 2).unwrap();
    assert_eq!((r.len(), c.len()), (16, 8));

    assert!(split_reg_cls(&reg, &[0.0; 3], spatial, 2).is_none());
    // 类别数与张量大小不符
    assert!(split_reg_cls(&reg, &cls, spatial, 80).is_none());
  }

  #[test]
  fn four_class_head_uses_output_order() {
    for (map_h, map_w) in [(80, 80), (40, 40), (20, 20)] {
      let spatial = map_h * map_w;
      let reg = vec![1.0; 4 * spatial];
      let cls = vec![2.0; 4 * spatial];

      let (r, c) = split_reg_cls(&reg, &cls, spatial, 4).unwrap();
      assert_eq!(r[0], 1.0);
      assert_eq!(c[0], 2.0);
    }
  }

  #[test]
  fn four_class_head_decodes_detection() {
    let shape = HeadShape {
      map_h: 2,
      map_w: 2,
      stride: 8.0,
    };
    let spatial = shape.spatial();
    // 网格 (1, 0) 上类别 3 得分最高，框向四周各延伸 0.5 格
    let reg = vec![0.5; 4 * spatial];
    let mut cls = vec![-10.0; 4 * spatial];
    cls[3 * spatial + 1] = 5.0;

    let (reg, cls) = split_reg_cls(&reg, &cls, spatial, 4).unwrap();
    let items = decode_head(reg, cls, shape, 4, 16.0, (2.0, 1.0), 0.25);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].class, 3.0);
    assert!(items[0].score > 0.99);
    assert_eq!(items[0].bbox, [16.0, 0.0, 32.0, 8.0]);
  }

  #[test]
  fn best_class_ignores_nan() {
    let spatial = 1;
    assert_eq!(best_class(&[0.1, 0.7, 0.3], spatial, 0, 3), Some((1, 0.7)));
    assert_eq!(best_class(&[f32::NAN, -2.0], spatial, 0, 2), Some((1, -2.0)));
    assert_eq!(best_class(&[f32::NAN, f32::NAN], spatial, 0, 2), None);
    assert_eq!(best_class(&[f32::MIN, f32::NEG_INFINITY], spatial, 0, 2), Some((0, f32::MIN)));
  }

  #[test]
  fn all_nan_logits_yield_nothing() {
    let shape = HeadShape {
      map_h: 1,
      map_w: 1,
      stride: 8.0,
    };
    let items = decode_head(&[0.0; 4], &[f32::NAN; 2], shape, 2, 640.0, (1.0, 1.0), 0.25);
    assert!(items.is_empty());
  }
}
