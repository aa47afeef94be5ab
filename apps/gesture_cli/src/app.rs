//! 主循环：取帧 -> 分类 -> 会话 -> 播放控制

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use gesture_core::{Dispatcher, GestureLabel, Outcome, Session};
use gesture_vision::FrameSource;

use crate::source::{TimedFrame, FRAME_INTERVAL_SECS};

/// 活动记录保留的行数
pub const ACTIVITY_LINES: usize = 5;

/// 最近的活动记录
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    lines: VecDeque<String>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);
        if self.lines.len() == ACTIVITY_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// 循环结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    ExitKey,
    SourceError(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::ExitKey => write!(f, "exit key"),
            StopReason::SourceError(e) => write!(f, "source error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub frames: usize,
    pub dispatched: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// 按帧时间戳休眠，模拟实时摄像头
    pub realtime: bool,
}

/// 主循环
pub struct App<'a, D: Dispatcher> {
    session: Session,
    dispatcher: &'a mut D,
    activity: ActivityLog,
    now_playing: Option<String>,
    options: LoopOptions,
}

impl<'a, D: Dispatcher> App<'a, D> {
    pub fn new(session: Session, dispatcher: &'a mut D, options: LoopOptions) -> Self {
        Self {
            session,
            dispatcher,
            activity: ActivityLog::new(),
            now_playing: None,
            options,
        }
    }

    /// 开始时尝试自动播放第一首
    pub fn autoplay(&mut self) {
        match self.dispatcher.play() {
            Some(track) => self.track_changed(track),
            None => log::warn!("nothing to play"),
        }
    }

    /// 跑到数据源结束、出错或收到退出信号为止
    pub fn run<S, C>(&mut self, source: &mut S, mut classify: C, exit: &Receiver<()>) -> RunStats
    where
        S: FrameSource,
        S::Frame: TimedFrame,
        C: FnMut(&S::Frame) -> Option<GestureLabel>,
    {
        let start = Instant::now();
        let mut stats = RunStats {
            frames: 0,
            dispatched: 0,
            suppressed: 0,
            skipped: 0,
            stop: StopReason::EndOfStream,
        };
        let mut last_t = None::<f64>;

        loop {
            if exit.try_recv().is_ok() {
                stats.stop = StopReason::ExitKey;
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    log::error!("frame source: {}", e);
                    stats.stop = StopReason::SourceError(e.to_string());
                    break;
                }
            };
            stats.frames += 1;

            let t = frame_time(frame.timestamp(), last_t);
            last_t = Some(t);
            let Some(now) = frame_instant(start, t) else {
                log::error!("frame timestamp out of range: {}", t);
                stats.stop = StopReason::SourceError(format!("timestamp out of range: {}", t));
                break;
            };
            if self.options.realtime {
                let wait = now.saturating_duration_since(Instant::now());
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
            }

            let label = classify(&frame);
            match self.session.tick(label.as_ref(), now, &mut *self.dispatcher) {
                Outcome::Idle | Outcome::Holding => {}
                Outcome::Suppressed(_) => stats.suppressed += 1,
                Outcome::Skipped(action) => {
                    stats.skipped += 1;
                    log::debug!("{} ignored: already playing", action);
                }
                Outcome::Dispatched { action, track } => {
                    stats.dispatched += 1;
                    if let Some(label) = &label {
                        self.activity.push(format!(
                            "[Gesture] {} → [Action] {}",
                            label.display_name(),
                            action.display_name()
                        ));
                    }
                    if let Some(track) = track {
                        self.track_changed(track);
                    }
                }
            }
        }

        log::info!(
            "stopped after {} frame(s): {} ({} dispatched)",
            stats.frames,
            stats.stop,
            stats.dispatched
        );
        stats
    }

    fn track_changed(&mut self, track: String) {
        self.activity.push(format!("[Music] {}", track));
        if self.now_playing.as_deref() != Some(track.as_str()) {
            log::info!("Now: {}", track);
            self.now_playing = Some(track);
        }
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }
}

/// 帧时间：优先用时间戳，缺失时按上一帧加一个帧间隔推算
fn frame_time(timestamp: Option<f64>, last: Option<f64>) -> f64 {
    let t = match (timestamp, last) {
        (Some(t), _) if t.is_finite() && t >= 0.0 => t,
        (_, Some(last)) => last + FRAME_INTERVAL_SECS,
        (_, None) => 0.0,
    };
    // 时间不回退
    match last {
        Some(last) if t < last => last,
        _ => t,
    }
}

/// `start + t` 秒；超出 `Instant` 可表示范围时返回 `None`
fn frame_instant(start: Instant, t: f64) -> Option<Instant> {
    let offset = Duration::try_from_secs_f64(t).ok()?;
    start.checked_add(offset)
}
