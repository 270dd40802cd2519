// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/yolo26.rs - YOLO26 RKNPU 推理后端
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{path::Path, sync::Mutex};

use image::imageops::{self, FilterType};
use rknpu::{Context, InitFlags, TensorFormat, TensorType};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::BgrFrame,
  model::{
    DetectItem, DetectResult, Model,
    head::{HeadShape, decode_head, split_reg_cls},
  },
};

const YOLO26_NUM_INPUTS: u32 = 1;
const YOLO26_NUM_OUTPUTS: u32 = 6;
const YOLO26_INPUT_SIZE: u32 = 640;
const YOLO26_HEAD_SIZES: [(usize, usize); 3] = [(80, 80), (40, 40), (20, 20)];
const YOLO26_STRIDES: [f32; 3] = [8.0, 16.0, 32.0];
/// 未指定类别数时按 COCO 的 80 类解码
pub const YOLO26_CLASS_NUM: usize = 80;
// 候选阈值低于服务端的置信度阈值，最终过滤由调用方决定
const YOLO26_CANDIDATE_THRESH: f32 = 0.25;

/// 运行在 RKNPU 上的 YOLO26 检测模型
///
/// 任意尺寸的输入帧会被拉伸到 640x640 后送入 NPU，输出框再按比例映射回输入帧的像素坐标。
pub struct Yolo26 {
  context: Mutex<Context>,
  class_num: usize,
}

#[derive(Error, Debug)]
pub enum Yolo26Error {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, rknpu::Error),
  #[error("RKNN 错误: {0}")]
  RknnError(rknpu::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("类别数无效: {0}")]
  InvalidClassNum(usize),
  #[error("推理上下文锁已损坏")]
  ContextPoisoned,
}

impl From<rknpu::Error> for Yolo26Error {
  fn from(err: rknpu::Error) -> Self {
    Yolo26Error::RknnError(err)
  }
}

impl Yolo26Error {
  pub fn invalid(msg: &str, e: rknpu::Error) -> Self {
    Yolo26Error::ModelInvalid(msg.to_string(), e)
  }
}

pub struct Yolo26Builder {
  model_path: String,
  flags: InitFlags,
  class_num: usize,
}

impl FromUrlWithScheme for Yolo26Builder {
  const SCHEME: &'static str = "yolo26";
}

impl FromUrl for Yolo26Builder {
  type Error = Yolo26Error;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(Yolo26Error::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(Yolo26Builder {
      model_path: url.path().to_string(),
      flags: InitFlags::default(),
      class_num: YOLO26_CLASS_NUM,
    })
  }
}

impl Yolo26Builder {
  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  /// 分类张量的类别数，用于区分回归与分类输出
  pub fn class_num(mut self, class_num: usize) -> Self {
    self.class_num = class_num;
    self
  }

  pub fn build(self) -> Result<Yolo26, Yolo26Error> {
    if self.class_num == 0 {
      return Err(Yolo26Error::InvalidClassNum(self.class_num));
    }

    if !Path::new(&self.model_path).is_file() {
      error!("模型文件不存在: {}", self.model_path);
      return Err(Yolo26Error::ModelPathError(format!(
        "模型文件不存在: {}",
        self.model_path
      )));
    }

    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    let context = Context::new(&model_data, self.flags)?;

    let num_inputs = context
      .num_inputs()
      .map_err(|e| Yolo26Error::invalid("无法获取输入数量", e))?;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| Yolo26Error::invalid("无法获取输出数量", e))?;

    if num_inputs != YOLO26_NUM_INPUTS || num_outputs != YOLO26_NUM_OUTPUTS {
      let msg = format!(
        "预期模型输入/输出数量为 {}/{}, 实际为 {}/{}",
        YOLO26_NUM_INPUTS, YOLO26_NUM_OUTPUTS, num_inputs, num_outputs
      );
      error!("{}", msg);
      return Err(Yolo26Error::invalid(&msg, rknpu::Error::InvalidModel));
    }

    info!("模型加载完成, 类别数: {}", self.class_num);
    Ok(Yolo26 {
      context: Mutex::new(context),
      class_num: self.class_num,
    })
  }
}

impl Model for Yolo26 {
  type Error = Yolo26Error;

  fn infer(&self, input: &BgrFrame) -> Result<DetectResult, Self::Error> {
    if input.is_empty() {
      return Ok(DetectResult::default());
    }

    // NPU 输入为 RGB NHWC
    let resized = imageops::resize(
      &input.to_rgb_image(),
      YOLO26_INPUT_SIZE,
      YOLO26_INPUT_SIZE,
      FilterType::Triangle,
    );

    let context = self
      .context
      .lock()
      .map_err(|_| Yolo26Error::ContextPoisoned)?;

    debug!("设置模型输入");
    context.set_input(
      0,
      resized.as_raw().as_slice(),
      TensorFormat::NHWC,
      TensorType::UInt8,
    )?;

    debug!("执行模型推理");
    context.run()?;

    let output = context.get_outputs()?;
    let items = decode_heads(
      &output,
      self.class_num,
      input.width() as f32,
      input.height() as f32,
    );
    debug!("检测到 {} 个候选目标", items.len());

    Ok(DetectResult::from(items))
  }
}

/// 解码三个检测头，框坐标映射到 width x height 的输入帧
fn decode_heads(
  output: &rknpu::Output,
  class_num: usize,
  width: f32,
  height: f32,
) -> Vec<DetectItem> {
  let input_size = YOLO26_INPUT_SIZE as f32;
  let scale = (width / input_size, height / input_size);
  let mut items = Vec::new();

  for (head_idx, (&(map_h, map_w), stride)) in
    YOLO26_HEAD_SIZES.iter().zip(YOLO26_STRIDES).enumerate()
  {
    let shape = HeadShape {
      map_h,
      map_w,
      stride,
    };
    let spatial = shape.spatial();
    let (tensor1, tensor2) = match (output.get_f32(head_idx * 2), output.get_f32(head_idx * 2 + 1)) {
      (Ok(t1), Ok(t2)) => (t1, t2),
      (Err(e), _) | (_, Err(e)) => {
        error!("检测头 {}: 获取输出失败: {}", head_idx, e);
        continue;
      }
    };

    let Some((reg, cls)) = split_reg_cls(tensor1, tensor2, spatial, class_num) else {
      error!(
        "检测头 {}: 输出大小不匹配 - 张量1: {}, 张量2: {}, 空间大小: {}, 类别数: {}",
        head_idx,
        tensor1.len(),
        tensor2.len(),
        spatial,
        class_num
      );
      continue;
    };

    items.extend(decode_head(
      reg,
      cls,
      shape,
      class_num,
      input_size,
      scale,
      YOLO26_CANDIDATE_THRESH,
    ));
  }

  items
}
