//! gesture_vision - 手势识别适配层
//!
//! 摄像头、关键点检测和识别模型都是外部组件，这里只定义它们的接口，
//! 并提供两种可互换的分类策略：
//! - [`HeuristicClassifier`]：按 21 个手部关键点判断手指伸直
//! - [`ModelClassifier`]：包装外部识别模型的排序结果
//!
//! 分类器永远不向外抛错：内部故障一律折叠为“无手势”。

mod heuristic;
mod landmarks;
mod model;
mod source;

pub use heuristic::*;
pub use landmarks::*;
pub use model::*;
pub use source::*;

use gesture_core::GestureLabel;

/// 分类器内部故障（在边界处折叠为 `None`）
#[derive(thiserror::Error, Debug)]
pub enum ClassifierFault {
    #[error("No hand detected")]
    NoHand,
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
    #[error("Recognizer unavailable")]
    Unavailable,
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// 统一的分类接口
pub trait GestureClassifier<I: ?Sized> {
    /// 返回本帧的手势；任何失败都返回 `None`
    fn classify(&mut self, input: &I) -> Option<GestureLabel>;
}
