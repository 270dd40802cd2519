// 该文件是 Shanan （山南西风） 项目的一部分。
// src/error.rs - 预测接口错误
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

use axum::{
  Json,
  extract::rejection::BytesRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{input::DecodeError, output::EncodeError, task::TaskError};

/// `/predict` 的错误分类；客户端错误返回 400，其余返回 500
///
/// 请求体读取失败（例如超出大小上限）沿用框架给出的状态码，同样以 JSON 返回。
#[derive(Error, Debug)]
pub enum PredictError {
  #[error("Invalid request format")]
  InvalidRequestShape,
  #[error("{message}")]
  RequestBody { status: StatusCode, message: String },
  #[error("Invalid Base64 image data: {0}")]
  InvalidEncoding(base64::DecodeError),
  #[error("Invalid image data: {0}")]
  InvalidImageData(image::ImageError),
  #[error("{0}")]
  EncodingFailure(#[from] EncodeError),
  #[error("{0}")]
  Internal(String),
}

impl From<DecodeError> for PredictError {
  fn from(err: DecodeError) -> Self {
    match err {
      DecodeError::InvalidEncoding(e) => PredictError::InvalidEncoding(e),
      DecodeError::InvalidImageData(e) => PredictError::InvalidImageData(e),
    }
  }
}

impl From<BytesRejection> for PredictError {
  fn from(rejection: BytesRejection) -> Self {
    PredictError::RequestBody {
      status: rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl From<TaskError> for PredictError {
  fn from(err: TaskError) -> Self {
    PredictError::Internal(err.to_string())
  }
}

impl PredictError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      PredictError::InvalidRequestShape
      | PredictError::InvalidEncoding(_)
      | PredictError::InvalidImageData(_) => StatusCode::BAD_REQUEST,
      PredictError::RequestBody { status, .. } => *status,
      PredictError::EncodingFailure(_) | PredictError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for PredictError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    if status.is_client_error() {
      warn!("请求无效: {}", self);
    } else {
      error!("请求处理失败: {}", self);
    }

    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
