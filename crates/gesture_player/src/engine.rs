//! 后台播放线程

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use crate::{
    AudioDecoder, AudioOutput, DecoderError, OutputConfig, PlaybackState, PlayerCommand,
    PlayerEvent, SampleQueue, TrackInfo,
};

/// 播放线程句柄，析构时关闭线程并释放音频设备
pub struct PlayerHandle {
    pub cmd_tx: Sender<PlayerCommand>,
    pub evt_rx: Receiver<PlayerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub fn send(&self, cmd: PlayerCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    /// 通知线程退出并等待其结束
    pub fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("player thread panicked");
            }
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 启动播放线程
pub fn spawn_player() -> PlayerHandle {
    let (cmd_tx, cmd_rx) = bounded(32);
    let (evt_tx, evt_rx) = bounded(64);

    let thread = thread::Builder::new()
        .name("gesture-player".to_string())
        .spawn(move || run_engine(cmd_rx, evt_tx))
        .map_err(|e| log::error!("failed to spawn player thread: {}", e))
        .ok();

    PlayerHandle {
        cmd_tx,
        evt_rx,
        thread,
    }
}

fn run_engine(cmd_rx: Receiver<PlayerCommand>, evt_tx: Sender<PlayerEvent>) {
    let mut state = EngineState::new(evt_tx);
    state.emit(PlayerEvent::StateChanged(PlaybackState::Idle));

    loop {
        // 播放时只轮询命令，空闲时阻塞等待
        let cmd = if state.playback_state == PlaybackState::Playing {
            match cmd_rx.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match cmd_rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        if let Some(cmd) = cmd {
            if !state.handle_command(cmd) {
                break;
            }
        }

        if state.playback_state == PlaybackState::Playing {
            state.pump();
            thread::sleep(Duration::from_millis(5));
        }
    }

    log::debug!("player thread exiting");
}

struct EngineState {
    evt_tx: Sender<PlayerEvent>,
    playback_state: PlaybackState,
    current_track: Option<LoadedTrack>,
    volume: f32,
}

struct LoadedTrack<O = AudioOutput> {
    decoder: AudioDecoder,
    output: O,
    /// 输出队列满时暂存的采样块
    pending: Option<Vec<f32>>,
    /// 解码已到结尾，等待输出播空
    finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpStatus {
    Playing,
    /// 解码完毕且输出已播空
    Ended,
}

impl<O: SampleQueue> LoadedTrack<O> {
    fn new(decoder: AudioDecoder, output: O) -> Self {
        Self {
            decoder,
            output,
            pending: None,
            finished: false,
        }
    }

    /// 解码并尽量填满输出队列
    ///
    /// 解码出错时返回错误，之后按结尾处理：已送出的采样播完即结束。
    fn pump(&mut self, volume: f32) -> Result<PumpStatus, DecoderError> {
        loop {
            let block = match self.pending.take() {
                Some(block) => block,
                None if self.finished => break,
                None => match self.decoder.decode_next() {
                    Ok(Some(mut samples)) => {
                        for sample in &mut samples {
                            *sample *= volume;
                        }
                        samples
                    }
                    Ok(None) => {
                        self.finished = true;
                        break;
                    }
                    Err(e) => {
                        self.finished = true;
                        return Err(e);
                    }
                },
            };

            if let Err(block) = self.output.write(block) {
                self.pending = Some(block);
                return Ok(PumpStatus::Playing);
            }
        }

        if self.pending.is_none() && self.output.is_drained() {
            self.output.set_playing(false);
            Ok(PumpStatus::Ended)
        } else {
            Ok(PumpStatus::Playing)
        }
    }
}

impl EngineState {
    fn new(evt_tx: Sender<PlayerEvent>) -> Self {
        Self {
            evt_tx,
            playback_state: PlaybackState::Idle,
            current_track: None,
            volume: 1.0,
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.evt_tx.try_send(event);
    }

    fn handle_command(&mut self, cmd: PlayerCommand) -> bool {
        match cmd {
            PlayerCommand::Load(path) => self.load_track(path),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::SetVolume(vol) => self.volume = vol.clamp(0.0, 1.0),
            PlayerCommand::Shutdown => {
                self.stop();
                return false;
            }
        }
        true
    }

    fn load_track(&mut self, path: PathBuf) {
        self.set_state(PlaybackState::Loading);

        if let Some(track) = self.current_track.take() {
            track.output.set_playing(false);
        }

        let decoder = match AudioDecoder::open(&path) {
            Ok(d) => d,
            Err(e) => {
                self.fail(format!("Failed to decode {}: {}", path.display(), e));
                return;
            }
        };

        let info = decoder.info.clone();
        let output = match AudioOutput::open(OutputConfig {
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            ..Default::default()
        }) {
            Ok(o) => o,
            Err(e) => {
                self.fail(format!("Audio output error: {}", e));
                return;
            }
        };

        self.emit(PlayerEvent::TrackInfo(TrackInfo {
            path,
            codec: info.codec,
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            duration: info.duration,
        }));

        self.current_track = Some(LoadedTrack::new(decoder, output));
        self.set_state(PlaybackState::Paused);
    }

    fn play(&mut self) {
        if let Some(track) = &self.current_track {
            track.output.set_playing(true);
            self.set_state(PlaybackState::Playing);
        }
    }

    fn pause(&mut self) {
        if let Some(track) = &self.current_track {
            if self.playback_state == PlaybackState::Playing {
                track.output.set_playing(false);
                self.set_state(PlaybackState::Paused);
            }
        }
    }

    fn stop(&mut self) {
        if let Some(track) = self.current_track.take() {
            track.output.set_playing(false);
        }
        self.set_state(PlaybackState::Stopped);
    }

    fn pump(&mut self) {
        let Some(track) = &mut self.current_track else {
            return;
        };
        match track.pump(self.volume) {
            Ok(PumpStatus::Playing) => {}
            Ok(PumpStatus::Ended) => {
                self.current_track = None;
                self.set_state(PlaybackState::Stopped);
                self.emit(PlayerEvent::TrackEnded);
            }
            Err(e) => self.emit(PlayerEvent::Error(format!("Decode error: {}", e))),
        }
    }

    fn fail(&mut self, message: String) {
        log::warn!("{}", message);
        self.emit(PlayerEvent::Error(message));
        self.set_state(PlaybackState::Idle);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.playback_state != state {
            self.playback_state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }
}
