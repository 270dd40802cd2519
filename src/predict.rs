// 该文件是 Shanan （山南西风） 项目的一部分。
// src/predict.rs - 预测请求处理与响应构建
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

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  annotate::{Annotated, Annotator, Detection},
  error::PredictError,
  input::decode_base64_image,
  model::Model,
  output::{DEFAULT_JPEG_QUALITY, encode_jpeg_base64},
  task::{OneShotTask, QuadrantTask, Task},
};

/// `{"instances": [{"image": ["<base64>"]}], "parameters": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
  pub instances: Vec<Instance>,
  #[serde(default)]
  pub parameters: PredictParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
  pub image: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictParameters {
  /// 是否按四象限分别推理
  pub tiled: bool,
  /// 响应中是否附带标注后的图像
  pub return_image: bool,
}

impl Default for PredictParameters {
  fn default() -> Self {
    Self {
      tiled: true,
      return_image: true,
    }
  }
}

impl PredictRequest {
  pub fn from_slice(body: &[u8]) -> Result<Self, PredictError> {
    serde_json::from_slice(body).map_err(|e| {
      debug!("请求体解析失败: {}", e);
      PredictError::InvalidRequestShape
    })
  }

  /// 只使用第一个实例的第一张图像
  pub fn image(&self) -> Result<&str, PredictError> {
    self
      .instances
      .first()
      .and_then(|instance| instance.image.first())
      .map(String::as_str)
      .ok_or(PredictError::InvalidRequestShape)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
  pub predictions: Vec<Detection>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
}

impl PredictResponse {
  pub fn build(
    annotated: Annotated,
    return_image: bool,
    jpeg_quality: u8,
  ) -> Result<Self, PredictError> {
    let image = if return_image {
      Some(encode_jpeg_base64(&annotated.frame, jpeg_quality)?)
    } else {
      None
    };

    Ok(Self {
      predictions: annotated.detections,
      image,
    })
  }
}

/// 模型句柄与标注配置，启动时构造一次，所有请求只读共享
pub struct Predictor<M> {
  model: M,
  annotator: Annotator,
  jpeg_quality: u8,
}

impl<M: Model> Predictor<M> {
  pub fn new(model: M, annotator: Annotator) -> Self {
    Self {
      model,
      annotator,
      jpeg_quality: DEFAULT_JPEG_QUALITY,
    }
  }

  pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
    self.jpeg_quality = jpeg_quality;
    self
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  pub fn annotator(&self) -> &Annotator {
    &self.annotator
  }

  pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, PredictError> {
    let frame = decode_base64_image(request.image()?)?;
    let parameters = request.parameters;
    info!(
      "收到图像 {}x{}, 四象限: {}",
      frame.width(),
      frame.height(),
      parameters.tiled
    );

    let annotated = if parameters.tiled {
      QuadrantTask.run_task(&frame, &self.model, &self.annotator)?
    } else {
      OneShotTask.run_task(&frame, &self.model, &self.annotator)?
    };

    PredictResponse::build(annotated, parameters.return_image, self.jpeg_quality)
  }

  pub fn predict_body(&self, body: &[u8]) -> Result<PredictResponse, PredictError> {
    self.predict(&PredictRequest::from_slice(body)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parameters_default_to_tiled_with_image() {
    let request = PredictRequest::from_slice(br#"{"instances": [{"image": ["AAAA"]}]}"#).unwrap();
    assert_eq!(request.parameters, PredictParameters::default());
    assert_eq!(request.image().unwrap(), "AAAA");
  }

  #[test]
  fn partial_parameters() {
    let request = PredictRequest::from_slice(
      br#"{"instances": [{"image": ["AAAA"]}], "parameters": {"return_image": false}}"#,
    )
    .unwrap();
    assert!(request.parameters.tiled);
    assert!(!request.parameters.return_image);
  }

  #[test]
  fn malformed_shapes() {
    for body in [
      &br#"{}"#[..],
      br#"{"instances": {}}"#,
      br#"{"instances": [{"image": "AAAA"}]}"#,
      br#"not json"#,
    ] {
      assert!(matches!(
        PredictRequest::from_slice(body),
        Err(PredictError::InvalidRequestShape)
      ));
    }

    for body in [
      &br#"{"instances": []}"#[..],
      br#"{"instances": [{"image": []}]}"#,
    ] {
      let request = PredictRequest::from_slice(body).unwrap();
      assert!(matches!(request.image(), Err(PredictError::InvalidRequestShape)));
    }
  }

  #[test]
  fn response_omits_image_when_not_requested() {
    let annotated = Annotated {
      frame: crate::frame::BgrFrame::with_shape(2, 2),
      detections: Vec::new(),
    };
    let response = PredictResponse::build(annotated, false, DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(
      serde_json::to_value(&response).unwrap(),
      serde_json::json!({ "predictions": [] })
    );
  }

  #[test]
  fn detection_json_shape() {
    let response = PredictResponse {
      predictions: vec![Detection {
        coordinates: [60, 10, 70, 20],
        label: "crack".to_string(),
        confidence: 0.5,
      }],
      image: Some("AAAA".to_string()),
    };
    assert_eq!(
      serde_json::to_value(&response).unwrap(),
      serde_json::json!({
        "predictions": [{"coordinates": [60, 10, 70, 20], "label": "crack", "confidence": 0.5}],
        "image": "AAAA",
      })
    );
  }
}
