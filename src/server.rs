// 该文件是 Shanan （山南西风） 项目的一部分。
// src/server.rs - HTTP 推理服务
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

use std::sync::Arc;

use axum::{
  Json, Router,
  body::Bytes,
  extract::{DefaultBodyLimit, State, rejection::BytesRejection},
  http::StatusCode,
  routing::{get, post},
};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::{
  error::PredictError,
  model::Model,
  predict::{PredictResponse, Predictor},
};

/// 请求体默认上限 (MiB)；base64 编码的高分辨率图像远超框架默认的 2 MiB
pub const DEFAULT_BODY_LIMIT_MIB: u32 = 64;
pub const DEFAULT_BODY_LIMIT: usize = DEFAULT_BODY_LIMIT_MIB as usize * 1024 * 1024;

pub fn router<M>(predictor: Arc<Predictor<M>>) -> Router
where
  M: Model + Send + Sync + 'static,
{
  router_with_body_limit(predictor, DEFAULT_BODY_LIMIT)
}

/// body_limit 为 `/predict` 请求体的字节上限，超出时返回 413 与 JSON 错误
pub fn router_with_body_limit<M>(predictor: Arc<Predictor<M>>, body_limit: usize) -> Router
where
  M: Model + Send + Sync + 'static,
{
  Router::new()
    .route("/isalive", get(is_alive))
    .route("/predict", post(predict::<M>))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(predictor)
}

pub async fn serve<M, A>(
  addr: A,
  predictor: Arc<Predictor<M>>,
  body_limit: usize,
) -> std::io::Result<()>
where
  M: Model + Send + Sync + 'static,
  A: ToSocketAddrs,
{
  let listener = TcpListener::bind(addr).await?;
  info!(
    "服务监听于: {}, 请求体上限 {} 字节",
    listener.local_addr()?,
    body_limit
  );
  axum::serve(listener, router_with_body_limit(predictor, body_limit)).await
}

async fn is_alive() -> StatusCode {
  debug!("/isalive 请求");
  StatusCode::OK
}

async fn predict<M>(
  State(predictor): State<Arc<Predictor<M>>>,
  body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictResponse>, PredictError>
where
  M: Model + Send + Sync + 'static,
{
  let body = body?;
  info!("/predict 请求, 请求体 {} 字节", body.len());

  // 推理与编解码都是 CPU 密集操作，放到阻塞线程池执行
  let response = tokio::task::spawn_blocking(move || predictor.predict_body(&body))
    .await
    .map_err(|e| PredictError::Internal(format!("推理任务异常退出: {e}")))??;

  info!("/predict 完成, {} 个检测", response.predictions.len());
  Ok(Json(response))
}
