//! 播放线程的命令与事件

use std::path::PathBuf;
use std::time::Duration;

/// 播放器命令（控制器 -> 播放线程）
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// 加载曲目，从头开始，加载后处于暂停
    Load(PathBuf),
    Play,
    Pause,
    /// 停止并卸载当前曲目
    Stop,
    /// 设置音量 (0.0 - 1.0)
    SetVolume(f32),
    /// 关闭播放线程
    Shutdown,
}

/// 播放器事件（播放线程 -> 控制器）
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    TrackInfo(TrackInfo),
    /// 曲目自然播放结束
    TrackEnded,
    Error(String),
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
}

/// 已加载曲目的信息
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub path: PathBuf,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Option<Duration>,
}
