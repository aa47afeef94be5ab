//! 每帧调度：标签 -> 引擎 -> 闸门 -> 播放控制器

use std::time::Instant;

use crate::{Action, ActionGate, DwellEngine, GestureLabel};

/// 播放控制接口
///
/// 返回值为当前曲目的显示名；`None` 表示什么都没发生（例如播放列表为空），不是错误。
pub trait Dispatcher {
    fn play(&mut self) -> Option<String>;
    fn pause(&mut self) -> Option<String>;
    fn next(&mut self) -> Option<String>;
    fn previous(&mut self) -> Option<String>;
    fn shuffle(&mut self) -> Option<String>;

    /// 是否处于暂停状态
    fn is_paused(&self) -> bool;

    /// 当前是否有音频在播放
    fn is_playing(&mut self) -> bool;
}

/// 单帧处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 无手势，状态已清空
    Idle,
    /// 手势仍在去抖动，或映射不到动作
    Holding,
    /// 与上一次执行的动作相同，被闸门拦下
    Suppressed(Action),
    /// 已在播放时收到 play，不做任何事
    Skipped(Action),
    /// 动作已发送给播放控制器
    Dispatched {
        action: Action,
        track: Option<String>,
    },
}

pub struct Session {
    engine: DwellEngine,
    gate: ActionGate,
}

impl Session {
    pub fn new(engine: DwellEngine) -> Self {
        Self {
            engine,
            gate: ActionGate::new(),
        }
    }

    pub fn tick<D: Dispatcher + ?Sized>(
        &mut self,
        label: Option<&GestureLabel>,
        now: Instant,
        dispatcher: &mut D,
    ) -> Outcome {
        if label.is_none() {
            // 计时器和动作记录必须在同一帧一起清空
            self.engine.reset();
            self.gate.reset();
            return Outcome::Idle;
        }

        let Some(action) = self.engine.observe(label, now) else {
            return Outcome::Holding;
        };

        if action == Action::Play && dispatcher.is_playing() {
            self.gate.reset();
            return Outcome::Skipped(action);
        }

        if !self.gate.admit(action) {
            return Outcome::Suppressed(action);
        }

        let track = match action {
            Action::Play => dispatcher.play(),
            // pause 是切换：已暂停则恢复播放
            Action::Pause if dispatcher.is_paused() => dispatcher.play(),
            Action::Pause => dispatcher.pause(),
            Action::Next => dispatcher.next(),
            Action::Previous => dispatcher.previous(),
            Action::Shuffle => dispatcher.shuffle(),
        };

        Outcome::Dispatched { action, track }
    }

    pub fn engine(&self) -> &DwellEngine {
        &self.engine
    }

    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DwellEngine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// 内存中的播放器，行为与真实控制器一致
    struct FakePlayer {
        tracks: Vec<&'static str>,
        index: usize,
        paused: bool,
        busy: bool,
        calls: Vec<&'static str>,
    }

    impl FakePlayer {
        fn new(tracks: Vec<&'static str>) -> Self {
            Self {
                tracks,
                index: 0,
                paused: false,
                busy: false,
                calls: Vec::new(),
            }
        }

        fn current(&self) -> Option<String> {
            self.tracks.get(self.index).map(|t| t.to_string())
        }
    }

    impl Dispatcher for FakePlayer {
        fn play(&mut self) -> Option<String> {
            self.calls.push("play");
            if self.tracks.is_empty() {
                return None;
            }
            self.paused = false;
            self.busy = true;
            self.current()
        }

        fn pause(&mut self) -> Option<String> {
            self.calls.push("pause");
            if !self.busy {
                return None;
            }
            self.busy = false;
            self.paused = true;
            self.current()
        }

        fn next(&mut self) -> Option<String> {
            self.calls.push("next");
            if self.tracks.is_empty() {
                return None;
            }
            self.index = (self.index + 1) % self.tracks.len();
            self.paused = false;
            self.play()
        }

        fn previous(&mut self) -> Option<String> {
            self.calls.push("previous");
            if self.tracks.is_empty() {
                return None;
            }
            self.index = (self.index + self.tracks.len() - 1) % self.tracks.len();
            self.paused = false;
            self.play()
        }

        fn shuffle(&mut self) -> Option<String> {
            self.calls.push("shuffle");
            if self.tracks.is_empty() {
                return None;
            }
            self.paused = false;
            self.play()
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn is_playing(&mut self) -> bool {
            self.busy
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// 以 100ms 间隔保持同一手势，返回所有非 Holding 结果
    fn hold(
        session: &mut Session,
        player: &mut FakePlayer,
        label: Option<&GestureLabel>,
        start: Instant,
        from_ms: u64,
        to_ms: u64,
    ) -> Vec<Outcome> {
        let mut out = Vec::new();
        let mut t = from_ms;
        while t <= to_ms {
            let outcome = session.tick(label, start + ms(t), player);
            if outcome != Outcome::Holding && outcome != Outcome::Idle {
                out.push(outcome);
            }
            t += 100;
        }
        out
    }

    #[test]
    fn test_pause_toggle_scenario() {
        // pause 采用“切换”语义：已暂停时再次握拳会恢复播放
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3", "b.mp3", "c.mp3"]);
        player.busy = true;
        let t0 = Instant::now();

        let fist = GestureLabel::Fist;
        let out = hold(&mut session, &mut player, Some(&fist), t0, 0, 500);
        assert_eq!(
            out,
            vec![Outcome::Dispatched {
                action: Action::Pause,
                track: Some("a.mp3".to_string())
            }]
        );
        assert!(player.paused);

        assert_eq!(session.tick(None, t0 + ms(600), &mut player), Outcome::Idle);
        assert_eq!(session.gate().active(), None);

        let out = hold(&mut session, &mut player, Some(&fist), t0, 700, 1200);
        assert_eq!(
            out,
            vec![Outcome::Dispatched {
                action: Action::Pause,
                track: Some("a.mp3".to_string())
            }]
        );
        assert!(!player.paused);
        assert_eq!(player.calls, vec!["pause", "play"]);
    }

    #[test]
    fn test_held_fist_pauses_once() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3"]);
        player.busy = true;
        let t0 = Instant::now();

        let out = hold(&mut session, &mut player, Some(&GestureLabel::Fist), t0, 0, 2000);
        assert_eq!(out.len(), 4);
        assert!(matches!(out[0], Outcome::Dispatched { action: Action::Pause, .. }));
        for outcome in &out[1..] {
            assert_eq!(*outcome, Outcome::Suppressed(Action::Pause));
        }
        assert_eq!(player.calls, vec!["pause"]);
    }

    #[test]
    fn test_held_thumb_up_advances_every_half_second() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3", "b.mp3", "c.mp3"]);
        let t0 = Instant::now();

        let out = hold(&mut session, &mut player, Some(&GestureLabel::ThumbUp), t0, 0, 1500);
        let tracks: Vec<_> = out
            .into_iter()
            .map(|o| match o {
                Outcome::Dispatched {
                    action: Action::Next,
                    track,
                } => track,
                other => panic!("unexpected outcome: {:?}", other),
            })
            .collect();
        assert_eq!(
            tracks,
            vec![
                Some("b.mp3".to_string()),
                Some("c.mp3".to_string()),
                Some("a.mp3".to_string())
            ]
        );
        assert_eq!(session.gate().active(), None);
    }

    #[test]
    fn test_play_while_playing_is_noop() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3"]);
        player.busy = true;
        let t0 = Instant::now();

        let out = hold(&mut session, &mut player, Some(&GestureLabel::OpenPalm), t0, 0, 1500);
        assert_eq!(out, vec![Outcome::Skipped(Action::Play); 3]);
        assert!(player.calls.is_empty());
    }

    #[test]
    fn test_play_from_stopped_then_skip() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3"]);
        let t0 = Instant::now();

        let out = hold(&mut session, &mut player, Some(&GestureLabel::OpenPalm), t0, 0, 1000);
        assert_eq!(
            out,
            vec![
                Outcome::Dispatched {
                    action: Action::Play,
                    track: Some("a.mp3".to_string())
                },
                Outcome::Skipped(Action::Play),
            ]
        );
        assert_eq!(player.calls, vec!["play"]);
    }

    #[test]
    fn test_empty_playlist_dispatch_returns_none() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(Vec::new());
        let t0 = Instant::now();

        let out = hold(&mut session, &mut player, Some(&GestureLabel::Rock), t0, 0, 500);
        assert_eq!(
            out,
            vec![Outcome::Dispatched {
                action: Action::Shuffle,
                track: None
            }]
        );
    }

    #[test]
    fn test_none_resets_engine_and_gate_together() {
        let mut session = Session::default();
        let mut player = FakePlayer::new(vec!["a.mp3"]);
        player.busy = true;
        let t0 = Instant::now();

        hold(&mut session, &mut player, Some(&GestureLabel::Fist), t0, 0, 500);
        assert_eq!(session.gate().active(), Some(Action::Pause));
        assert!(session.engine().held().is_some());

        session.tick(None, t0 + ms(600), &mut player);
        assert_eq!(session.gate().active(), None);
        assert!(session.engine().held().is_none());
    }
}
