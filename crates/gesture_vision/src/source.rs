//! 帧来源与手部检测接口

use crate::Landmark;

/// 帧来源错误（设备断开、数据损坏等），对主循环而言是终止条件
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed frame at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("Device error: {0}")]
    Device(String),
}

/// 逐帧阻塞读取的来源，不可重启
pub trait FrameSource {
    type Frame;

    /// `Ok(None)` 表示流已结束
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, SourceError>;
}

/// 手部关键点检测（外部组件）
pub trait HandDetector<F: ?Sized> {
    /// 返回检测到的所有手，每只手一组关键点
    fn detect_hands(&mut self, frame: &F) -> Vec<Vec<Landmark>>;
}
