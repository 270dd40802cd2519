// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/label.rs - 类别标签映射
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

use std::{collections::BTreeMap, path::Path};

use thiserror::Error;
use tracing::info;

pub const UNKNOWN_LABEL: &str = "N/A";

#[derive(Error, Debug)]
pub enum LabelMapError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件格式错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 类别编号到名称的映射，缺失的编号解析为 [`UNKNOWN_LABEL`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
  names: BTreeMap<u32, String>,
}

impl LabelMap {
  /// 标签文件既可以是名称数组（下标即类别编号），也可以是编号到名称的对象
  pub fn from_json(json: &str) -> Result<Self, LabelMapError> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(json) {
      return Ok(list.into_iter().enumerate().map(|(id, name)| (id as u32, name)).collect());
    }

    let names = serde_json::from_str::<BTreeMap<u32, String>>(json)?;
    Ok(Self { names })
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelMapError> {
    let path = path.as_ref();
    let labels = Self::from_json(&std::fs::read_to_string(path)?)?;
    info!("加载 {} 个类别标签: {}", labels.len(), path.display());
    Ok(labels)
  }

  pub fn name(&self, class_id: u32) -> &str {
    self
      .names
      .get(&class_id)
      .map(String::as_str)
      .unwrap_or(UNKNOWN_LABEL)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// 覆盖所有已知编号所需的类别数，即最大编号加一
  pub fn class_count(&self) -> Option<usize> {
    self
      .names
      .last_key_value()
      .map(|(&id, _)| id as usize + 1)
  }
}

impl<S: Into<String>> FromIterator<(u32, S)> for LabelMap {
  fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
    Self {
      names: iter.into_iter().map(|(id, name)| (id, name.into())).collect(),
    }
  }
}
