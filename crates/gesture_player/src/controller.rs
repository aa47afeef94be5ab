//! 播放控制器：播放列表 + 当前位置 + 暂停标志

use gesture_core::Dispatcher;

use crate::{AudioSink, Playlist};

pub struct MusicController<S: AudioSink> {
    playlist: Playlist,
    current_index: usize,
    paused: bool,
    sink: S,
}

impl<S: AudioSink> MusicController<S> {
    pub fn new(playlist: Playlist, sink: S) -> Self {
        Self {
            playlist,
            current_index: 0,
            paused: false,
            sink,
        }
    }

    /// 暂停中则原地恢复，否则从头播放当前曲目
    pub fn play(&mut self) -> Option<String> {
        let path = self.playlist.get(self.current_index)?;

        if self.paused {
            self.sink.resume();
        } else {
            if let Err(e) = self.sink.load(path) {
                log::warn!("cannot play {}: {}", path.display(), e);
                return None;
            }
            self.sink.start();
        }
        self.paused = false;
        self.playlist.display_name(self.current_index)
    }

    /// 有音频在播放时暂停
    pub fn pause(&mut self) -> Option<String> {
        if !self.sink.is_busy() {
            return None;
        }
        self.sink.pause();
        self.paused = true;
        self.playlist.display_name(self.current_index)
    }

    pub fn next(&mut self) -> Option<String> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }
        self.jump((self.current_index + 1) % len)
    }

    pub fn previous(&mut self) -> Option<String> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }
        self.jump((self.current_index + len - 1) % len)
    }

    /// 随机选一首（可能与当前相同）
    pub fn shuffle(&mut self) -> Option<String> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }
        let index = match random_index(len) {
            Ok(index) => index,
            Err(e) => {
                log::warn!("random source failed, replaying current track: {}", e);
                self.current_index
            }
        };
        self.jump(index)
    }

    /// 切到指定曲目并从头播放
    fn jump(&mut self, index: usize) -> Option<String> {
        self.current_index = index;
        self.sink.stop();
        self.paused = false;
        self.play()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_name(&self) -> Option<String> {
        self.playlist.display_name(self.current_index)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: AudioSink> Dispatcher for MusicController<S> {
    fn play(&mut self) -> Option<String> {
        MusicController::play(self)
    }

    fn pause(&mut self) -> Option<String> {
        MusicController::pause(self)
    }

    fn next(&mut self) -> Option<String> {
        MusicController::next(self)
    }

    fn previous(&mut self) -> Option<String> {
        MusicController::previous(self)
    }

    fn shuffle(&mut self) -> Option<String> {
        MusicController::shuffle(self)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_playing(&mut self) -> bool {
        self.sink.is_busy()
    }
}

/// `[0, len)` 内均匀分布的随机下标
pub fn random_index(len: usize) -> Result<usize, getrandom::Error> {
    let bound = len.max(1) as u64;
    // 拒绝落在最后一段不完整区间的值，避免取模偏差
    let zone = u64::MAX - (u64::MAX % bound);
    loop {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)?;
        let value = u64::from_le_bytes(buf);
        if value < zone {
            return Ok((value % bound) as usize);
        }
    }
}
