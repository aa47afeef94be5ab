//! 播放控制器使用的音频后端

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::{spawn_player, PlaybackState, PlayerCommand, PlayerEvent, PlayerHandle, TrackInfo};

/// 音频后端错误
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Track not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load track: {0}")]
    Load(String),
    #[error("Player thread is gone")]
    Disconnected,
    #[error("Timed out waiting for the player")]
    Timeout,
}

/// 音频后端
///
/// `load` 之后调用 `start` 从头播放；`is_busy` 在暂停或停止时为假。
pub trait AudioSink {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_busy(&mut self) -> bool;
}

const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// 驱动后台播放线程的真实后端
pub struct EngineSink {
    handle: PlayerHandle,
    state: PlaybackState,
}

impl EngineSink {
    pub fn spawn(volume: f32) -> Self {
        let handle = spawn_player();
        handle.send(PlayerCommand::SetVolume(volume));
        Self {
            handle,
            state: PlaybackState::Idle,
        }
    }

    /// 处理积压的事件，只接受“播放结束/出错”这类线程主动产生的状态
    fn poll_events(&mut self) {
        while let Ok(event) = self.handle.evt_rx.try_recv() {
            match event {
                PlayerEvent::TrackEnded => {
                    log::debug!("track ended");
                    self.state = PlaybackState::Stopped;
                }
                PlayerEvent::Error(e) => {
                    log::warn!("player: {}", e);
                    self.state = PlaybackState::Stopped;
                }
                PlayerEvent::TrackInfo(info) => log::debug!("{}", describe_track(&info)),
                PlayerEvent::StateChanged(_) => {}
            }
        }
    }

    fn send(&mut self, cmd: PlayerCommand) {
        if !self.handle.send(cmd) {
            log::error!("player thread is gone");
            self.state = PlaybackState::Stopped;
        }
    }
}

impl AudioSink for EngineSink {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::NotFound(path.to_path_buf()));
        }

        self.poll_events();
        if !self.handle.send(PlayerCommand::Load(path.to_path_buf())) {
            return Err(PlayerError::Disconnected);
        }

        // 等待加载结果
        let deadline = Instant::now() + LOAD_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.handle.evt_rx.recv_timeout(remaining) {
                Ok(PlayerEvent::TrackInfo(info)) => {
                    log::info!("{}", describe_track(&info));
                    self.state = PlaybackState::Paused;
                    return Ok(());
                }
                Ok(PlayerEvent::Error(e)) => {
                    self.state = PlaybackState::Stopped;
                    return Err(PlayerError::Load(e));
                }
                Ok(_) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    return Err(PlayerError::Timeout)
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return Err(PlayerError::Disconnected)
                }
            }
        }
    }

    fn start(&mut self) {
        self.send(PlayerCommand::Play);
        self.state = PlaybackState::Playing;
    }

    fn pause(&mut self) {
        self.send(PlayerCommand::Pause);
        self.state = PlaybackState::Paused;
    }

    fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.send(PlayerCommand::Play);
            self.state = PlaybackState::Playing;
        }
    }

    fn stop(&mut self) {
        self.send(PlayerCommand::Stop);
        self.state = PlaybackState::Stopped;
    }

    fn is_busy(&mut self) -> bool {
        self.poll_events();
        self.state == PlaybackState::Playing
    }
}

/// 曲目信息的一行描述
pub fn describe_track(info: &TrackInfo) -> String {
    let length = match info.duration {
        Some(d) => {
            let secs = d.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "--:--".to_string(),
    };
    format!(
        "{} [{} {} Hz {} ch {}]",
        crate::display_name(&info.path),
        info.codec,
        info.sample_rate,
        info.channels,
        length
    )
}

/// 不打开音频设备的后端，只记录状态
#[derive(Debug, Default)]
pub struct SilentSink {
    loaded: Option<PathBuf>,
    state: PlaybackState,
}

impl SilentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }
}

impl AudioSink for SilentSink {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::NotFound(path.to_path_buf()));
        }
        log::debug!("silent load {}", path.display());
        self.loaded = Some(path.to_path_buf());
        self.state = PlaybackState::Paused;
        Ok(())
    }

    fn start(&mut self) {
        if self.loaded.is_some() {
            self.state = PlaybackState::Playing;
        }
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    fn stop(&mut self) {
        self.loaded = None;
        self.state = PlaybackState::Stopped;
    }

    fn is_busy(&mut self) -> bool {
        self.state == PlaybackState::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_track() {
        let info = TrackInfo {
            path: PathBuf::from("music/a.mp3"),
            codec: "mp3".to_string(),
            sample_rate: 44100,
            channels: 2,
            duration: Some(Duration::from_secs(185)),
        };
        assert_eq!(describe_track(&info), "a.mp3 [mp3 44100 Hz 2 ch 3:05]");

        let unknown = TrackInfo {
            duration: None,
            ..info
        };
        assert!(describe_track(&unknown).ends_with("--:--]"));
    }

    #[test]
    fn test_silent_sink_lifecycle() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut sink = SilentSink::new();
        assert!(!sink.is_busy());

        sink.load(file.path()).unwrap();
        assert!(!sink.is_busy());
        sink.start();
        assert!(sink.is_busy());
        sink.pause();
        assert!(!sink.is_busy());
        assert_eq!(sink.state(), PlaybackState::Paused);
        sink.resume();
        assert!(sink.is_busy());
        sink.stop();
        assert!(!sink.is_busy());
        assert!(sink.loaded().is_none());
    }

    #[test]
    fn test_silent_sink_missing_file() {
        let mut sink = SilentSink::new();
        let err = sink.load(Path::new("/nonexistent/a.mp3")).unwrap_err();
        assert!(matches!(err, PlayerError::NotFound(_)));
        sink.start();
        assert!(!sink.is_busy());
    }

    #[test]
    fn test_resume_after_stop_does_nothing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut sink = SilentSink::new();
        sink.load(file.path()).unwrap();
        sink.start();
        sink.stop();
        sink.resume();
        assert!(!sink.is_busy());
    }
}
