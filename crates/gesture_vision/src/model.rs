//! 识别模型适配
//!
//! 外部模型对一帧返回按置信度排序的 (标签, 分数) 列表，这里取第一名，
//! 小写后经过改名表得到 [`GestureLabel`]。

use std::path::{Path, PathBuf};

use gesture_core::GestureLabel;
use serde::Deserialize;

use crate::{ClassifierFault, GestureClassifier};

/// 识别模型错误
#[derive(thiserror::Error, Debug)]
pub enum RecognizerError {
    #[error("Model asset not found: {0}")]
    MissingAsset(PathBuf),
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// 模型输出的一个候选
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub label: String,
    #[serde(default)]
    pub score: f32,
}

impl Category {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// 外部识别模型
pub trait Recognizer<F: ?Sized> {
    /// 返回本帧的候选，不要求有序
    fn recognize(&mut self, frame: &F) -> Result<Vec<Category>, RecognizerError>;
}

/// 置信度最高的候选；分数相同时取靠前的
pub fn top_category(categories: &[Category]) -> Option<&Category> {
    categories.iter().reduce(|best, c| {
        if c.score.total_cmp(&best.score).is_gt() {
            c
        } else {
            best
        }
    })
}

/// 改名表，`None` 表示该标签被屏蔽（视为无手势）
const RENAMES: [(&str, Option<&str>); 4] = [
    ("closed_fist", Some("fist")),
    ("victory", Some("rock")),
    ("pointing_up", None),
    ("none", None),
];

/// 把模型原始标签规整为手势；未收录的标签原样透传
pub fn normalize_label(raw: &str) -> Option<GestureLabel> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    match RENAMES.iter().find(|(from, _)| *from == lower) {
        Some((_, Some(to))) => Some(GestureLabel::parse(to)),
        Some((_, None)) => None,
        None => Some(GestureLabel::parse(&lower)),
    }
}

/// 基于外部模型的分类器
///
/// 模型缺失时仍可构造，只是永远返回 `None`，其余部分照常运行。
pub struct ModelClassifier<F: ?Sized> {
    recognizer: Option<Box<dyn Recognizer<F>>>,
}

impl<F: ?Sized> ModelClassifier<F> {
    pub fn new<R: Recognizer<F> + 'static>(recognizer: R) -> Self {
        Self {
            recognizer: Some(Box::new(recognizer)),
        }
    }

    /// 无模型的降级分类器
    pub fn degraded() -> Self {
        Self { recognizer: None }
    }

    /// 从模型文件加载；文件不存在或加载失败时降级
    pub fn open<R, L>(asset: &Path, loader: L) -> Self
    where
        R: Recognizer<F> + 'static,
        L: FnOnce(&Path) -> Result<R, RecognizerError>,
    {
        let result = if asset.is_file() {
            loader(asset)
        } else {
            Err(RecognizerError::MissingAsset(asset.to_path_buf()))
        };

        match result {
            Ok(recognizer) => Self::new(recognizer),
            Err(e) => {
                log::warn!("gesture model disabled: {}", e);
                Self::degraded()
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.recognizer.is_none()
    }

    pub fn try_classify(&mut self, frame: &F) -> Result<Option<GestureLabel>, ClassifierFault> {
        let recognizer = self
            .recognizer
            .as_mut()
            .ok_or(ClassifierFault::Unavailable)?;
        let categories = recognizer.recognize(frame)?;
        Ok(top_category(&categories).and_then(|top| normalize_label(&top.label)))
    }
}

impl<F: ?Sized> GestureClassifier<F> for ModelClassifier<F> {
    fn classify(&mut self, frame: &F) -> Option<GestureLabel> {
        match self.try_classify(frame) {
            Ok(label) => label,
            Err(ClassifierFault::Unavailable) => None,
            Err(e) => {
                log::debug!("model classifier: {}", e);
                None
            }
        }
    }
}
