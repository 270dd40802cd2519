// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 推理任务
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

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  annotate::{Annotated, Annotator},
  frame::BgrFrame,
  model::{InvalidClassId, Model},
  quadrant::{Quadrant, QuadrantError, reassemble_quadrants, split_quadrants},
};

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("模型推理错误: {0}")]
  ModelError(Box<dyn std::error::Error + Send + Sync>),
  #[error("{0}")]
  InvalidClassId(#[from] InvalidClassId),
  #[error("{0}")]
  QuadrantError(#[from] QuadrantError),
}

impl TaskError {
  fn model<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    TaskError::ModelError(Box::new(err))
  }
}

/// 对一帧完成推理与标注，返回整图坐标下的检测与标注后的整图
pub trait Task {
  fn run_task<M: Model>(
    &self,
    frame: &BgrFrame,
    model: &M,
    annotator: &Annotator,
  ) -> Result<Annotated, TaskError>;
}

/// 整图单次推理
pub struct OneShotTask;

impl Task for OneShotTask {
  fn run_task<M: Model>(
    &self,
    frame: &BgrFrame,
    model: &M,
    annotator: &Annotator,
  ) -> Result<Annotated, TaskError> {
    let now = Instant::now();
    let result = model.infer(frame).map_err(TaskError::model)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    Ok(annotator.annotate(frame, &result, (0, 0))?)
  }
}

/// 四象限分别推理，再把标注后的象限拼回整图
pub struct QuadrantTask;

impl QuadrantTask {
  fn run_quadrant<M: Model>(
    quadrant: &Quadrant,
    model: &M,
    annotator: &Annotator,
  ) -> Result<Annotated, TaskError> {
    if quadrant.frame.is_empty() {
      debug!("{:?} 象限为空，跳过推理", quadrant.position);
      return Ok(Annotated {
        frame: quadrant.frame.clone(),
        detections: Vec::new(),
      });
    }

    let result = model.infer(&quadrant.frame).map_err(TaskError::model)?;
    let annotated = annotator.annotate(&quadrant.frame, &result, quadrant.offset)?;
    debug!(
      "{:?} 象限: 偏移 {:?}, {} 个检测",
      quadrant.position,
      quadrant.offset,
      annotated.detections.len()
    );
    Ok(annotated)
  }
}

impl Task for QuadrantTask {
  fn run_task<M: Model>(
    &self,
    frame: &BgrFrame,
    model: &M,
    annotator: &Annotator,
  ) -> Result<Annotated, TaskError> {
    let now = Instant::now();
    let [tl, tr, bl, br] = split_quadrants(frame)?;

    let tl = Self::run_quadrant(&tl, model, annotator)?;
    let tr = Self::run_quadrant(&tr, model, annotator)?;
    let bl = Self::run_quadrant(&bl, model, annotator)?;
    let br = Self::run_quadrant(&br, model, annotator)?;

    let detections = [tl.detections, tr.detections, bl.detections, br.detections].concat();
    let frame = reassemble_quadrants(
      &[tl.frame, tr.frame, bl.frame, br.frame],
      frame.dimensions(),
    )?;
    info!(
      "四象限推理完成，共 {} 个检测，耗时: {:.2?}",
      detections.len(),
      now.elapsed()
    );

    Ok(Annotated { frame, detections })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible};

  use super::*;
  use crate::{
    model::{DetectItem, DetectResult},
    output::draw::Draw,
  };

  /// 返回固定检测并记录每次输入尺寸
  struct FixedModel {
    items: Vec<DetectItem>,
    calls: RefCell<Vec<(u32, u32)>>,
  }

  impl FixedModel {
    fn new(items: Vec<DetectItem>) -> Self {
      Self {
        items,
        calls: RefCell::new(Vec::new()),
      }
    }
  }

  impl Model for FixedModel {
    type Error = Infallible;

    fn infer(&self, input: &BgrFrame) -> Result<DetectResult, Self::Error> {
      self.calls.borrow_mut().push(input.dimensions());
      Ok(DetectResult::from(self.items.clone()))
    }
  }

  /// 只在包含白色像素的帧上报告检测
  struct MarkerModel;

  impl Model for MarkerModel {
    type Error = Infallible;

    fn infer(&self, input: &BgrFrame) -> Result<DetectResult, Self::Error> {
      let marked = input.as_ref().chunks_exact(3).any(|p| p == [255, 255, 255]);
      let items = if marked {
        vec![DetectItem {
          class: 0.0,
          score: 0.9,
          bbox: [10.0, 10.0, 20.0, 20.0],
        }]
      } else {
        Vec::new()
      };
      Ok(DetectResult::from(items))
    }
  }

  #[derive(Debug, Error)]
  #[error("npu offline")]
  struct Offline;

  struct FailingModel;

  impl Model for FailingModel {
    type Error = Offline;

    fn infer(&self, _input: &BgrFrame) -> Result<DetectResult, Self::Error> {
      Err(Offline)
    }
  }

  fn annotator() -> Annotator {
    Annotator::new([(0, "crack")].into_iter().collect(), Draw::default())
  }

  #[test]
  fn quadrant_task_calls_model_per_quadrant() {
    let model = FixedModel::new(Vec::new());
    let result = QuadrantTask
      .run_task(&BgrFrame::with_shape(5, 3), &model, &annotator())
      .unwrap();

    assert_eq!(*model.calls.borrow(), vec![(2, 1), (3, 1), (2, 2), (3, 2)]);
    assert_eq!(result.frame.dimensions(), (5, 3));
    assert!(result.detections.is_empty());
  }

  #[test]
  fn detection_in_top_right_is_offset() {
    let mut frame = BgrFrame::with_shape(100, 100);
    frame.put_pixel(75, 25, [255, 255, 255]);

    let result = QuadrantTask.run_task(&frame, &MarkerModel, &annotator()).unwrap();
    assert_eq!(result.detections.len(), 1);
    assert_eq!(result.detections[0].coordinates, [60, 10, 70, 20]);
    assert_eq!(result.detections[0].label, "crack");
    // 标注绘制在右上象限对应位置
    assert_eq!(result.frame.pixel(70, 20), [255, 51, 51]);
    assert_eq!(result.frame.pixel(10, 10), [0, 0, 0]);
  }

  #[test]
  fn detections_are_merged_in_quadrant_order() {
    let model = FixedModel::new(vec![DetectItem {
      class: 0.0,
      score: 0.75,
      bbox: [1.0, 1.0, 2.0, 2.0],
    }]);
    let result = QuadrantTask
      .run_task(&BgrFrame::with_shape(10, 8), &model, &annotator())
      .unwrap();

    let boxes: Vec<_> = result.detections.iter().map(|d| d.coordinates).collect();
    assert_eq!(
      boxes,
      vec![[1, 1, 2, 2], [6, 1, 7, 2], [1, 5, 2, 6], [6, 5, 7, 6]]
    );
  }

  #[test]
  fn empty_quadrants_skip_inference() {
    let model = FixedModel::new(Vec::new());
    let result = QuadrantTask
      .run_task(&BgrFrame::with_shape(1, 1), &model, &annotator())
      .unwrap();

    assert_eq!(*model.calls.borrow(), vec![(1, 1)]);
    assert_eq!(result.frame.dimensions(), (1, 1));
  }

  #[test]
  fn one_shot_uses_full_frame_coordinates() {
    let mut frame = BgrFrame::with_shape(100, 100);
    frame.put_pixel(75, 25, [255, 255, 255]);

    let result = OneShotTask.run_task(&frame, &MarkerModel, &annotator()).unwrap();
    assert_eq!(result.detections[0].coordinates, [10, 10, 20, 20]);
  }

  #[test]
  fn model_failure_is_reported() {
    let err = QuadrantTask
      .run_task(&BgrFrame::with_shape(4, 4), &FailingModel, &annotator())
      .unwrap_err();
    assert!(matches!(err, TaskError::ModelError(_)));
    assert_eq!(err.to_string(), "模型推理错误: npu offline");
  }
}
