// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::BgrFrame};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("No image files found in directory: {0}")]
  NoImageInDirectory(PathBuf),
}

/// 单张图像文件输入；路径为目录时取其中按名称排序的第一张图像
pub struct ImageFileInput {
  path: PathBuf,
  image: Option<BgrFrame>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    Self::open(url.path())
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = resolve_image_path(path.as_ref())?;
    info!("读取图像文件: {}", path.display());
    let image = ImageReader::open(&path)?.decode()?.to_rgb8();

    Ok(ImageFileInput {
      path,
      image: Some(BgrFrame::from(image)),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Iterator for ImageFileInput {
  type Item = BgrFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

fn has_image_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| {
      IMAGE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn resolve_image_path(path: &Path) -> Result<PathBuf, ImageFileInputError> {
  if !path.is_dir() {
    return Ok(path.to_path_buf());
  }

  let mut candidates = std::fs::read_dir(path)?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.is_file() && has_image_extension(p))
    .collect::<Vec<_>>();
  candidates.sort();

  candidates
    .into_iter()
    .next()
    .ok_or_else(|| ImageFileInputError::NoImageInDirectory(path.to_path_buf()))
}
