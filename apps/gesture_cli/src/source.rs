//! 帧来源：录制的关键点帧 / 手势脚本，以及退出按键监听
//!
//! 摄像头采集不在本程序内，录制文件由外部采集工具生成。

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, Receiver};
use gesture_core::GestureLabel;
use gesture_vision::{
    Category, FrameSource, HandDetector, Landmark, Recognizer, RecognizerError, SourceError,
};
use serde::Deserialize;

/// 未给出时间戳时假定的帧间隔（约 30fps）
pub const FRAME_INTERVAL_SECS: f64 = 1.0 / 30.0;

/// 带时间戳的帧
pub trait TimedFrame {
    /// 相对开始时刻的秒数
    fn timestamp(&self) -> Option<f64>;
}

/// 一行 JSON 记录的帧
///
/// `{"t": 0.5, "hands": [[[x, y, z], ...]], "categories": [{"label": "Thumb_Up", "score": 0.9}]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub t: Option<f64>,
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl TimedFrame for RecordedFrame {
    fn timestamp(&self) -> Option<f64> {
        self.t
    }
}

/// JSON lines 帧文件
pub struct RecordedFrames<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> RecordedFrames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl RecordedFrames<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameSource for RecordedFrames<R> {
    type Frame = RecordedFrame;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>, SourceError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|e| SourceError::Malformed {
                line: self.line_no,
                message: e.to_string(),
            })?;
            return Ok(Some(frame));
        }
        Ok(None)
    }
}

/// 录制帧中已包含检测结果
#[derive(Debug, Default)]
pub struct RecordedDetector;

impl HandDetector<RecordedFrame> for RecordedDetector {
    fn detect_hands(&mut self, frame: &RecordedFrame) -> Vec<Vec<Landmark>> {
        frame.hands.clone()
    }
}

/// 录制帧中已包含模型输出
#[derive(Debug, Default)]
pub struct RecordedRecognizer;

impl Recognizer<RecordedFrame> for RecordedRecognizer {
    fn recognize(&mut self, frame: &RecordedFrame) -> Result<Vec<Category>, RecognizerError> {
        Ok(frame.categories.clone())
    }
}

/// 手势脚本中的一帧
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedLabel {
    pub t: f64,
    pub label: Option<GestureLabel>,
}

impl TimedFrame for ScriptedLabel {
    fn timestamp(&self) -> Option<f64> {
        Some(self.t)
    }
}

/// 手势脚本：每行 `<秒> <标签|none>`，`#` 开头为注释
pub struct LabelScript<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LabelScript<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl LabelScript<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameSource for LabelScript<R> {
    type Frame = ScriptedLabel;

    fn next_frame(&mut self) -> Result<Option<ScriptedLabel>, SourceError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return parse_script_line(text)
                .map(Some)
                .ok_or_else(|| SourceError::Malformed {
                    line: self.line_no,
                    message: format!("expected `<seconds> <label>`, got `{}`", text),
                });
        }
        Ok(None)
    }
}

fn parse_script_line(text: &str) -> Option<ScriptedLabel> {
    let mut parts = text.split_whitespace();
    let t: f64 = parts.next()?.parse().ok()?;
    let tag = parts.next()?;
    if parts.next().is_some() || !t.is_finite() || t < 0.0 {
        return None;
    }
    let label = if tag.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(GestureLabel::parse(tag))
    };
    Some(ScriptedLabel { t, label })
}

/// 后台读取标准输入，输入 `q` 时发出退出信号
pub fn spawn_exit_listener() -> Receiver<()> {
    let (tx, rx) = bounded(1);
    let spawned = thread::Builder::new()
        .name("exit-key".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    return;
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    let _ = tx.send(());
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("exit key disabled: {}", e);
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_label_script() {
        let text = "# warm-up\n0.0 fist\n\n0.25 thumbs_up\n0.5 none\n";
        let mut script = LabelScript::new(Cursor::new(text));

        assert_eq!(
            script.next_frame().unwrap(),
            Some(ScriptedLabel {
                t: 0.0,
                label: Some(GestureLabel::Fist)
            })
        );
        assert_eq!(
            script.next_frame().unwrap(),
            Some(ScriptedLabel {
                t: 0.25,
                label: Some(GestureLabel::ThumbUp)
            })
        );
        assert_eq!(
            script.next_frame().unwrap(),
            Some(ScriptedLabel { t: 0.5, label: None })
        );
        assert_eq!(script.next_frame().unwrap(), None);
    }

    #[test]
    fn test_label_script_malformed_line() {
        let mut script = LabelScript::new(Cursor::new("0.0 fist\nabc\n"));
        assert!(script.next_frame().unwrap().is_some());
        assert!(matches!(
            script.next_frame(),
            Err(SourceError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_recorded_frames() {
        let text = concat!(
            r#"{"t": 0.1, "hands": [[[0.1, 0.2, 0.0], [0.3, 0.4]]]}"#,
            "\n",
            r#"{"categories": [{"label": "Victory", "score": 0.8}]}"#,
            "\n"
        );
        let mut frames = RecordedFrames::new(Cursor::new(text));

        let first = frames.next_frame().unwrap().unwrap();
        assert_eq!(first.timestamp(), Some(0.1));
        let hands = RecordedDetector.detect_hands(&first);
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0][1], Landmark::new(0.3, 0.4, 0.0));

        let second = frames.next_frame().unwrap().unwrap();
        assert_eq!(second.timestamp(), None);
        let categories = RecordedRecognizer.recognize(&second).unwrap();
        assert_eq!(categories[0].label, "Victory");

        assert!(frames.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_recorded_frames_bad_json() {
        let mut frames = RecordedFrames::new(Cursor::new("{not json}\n"));
        assert!(matches!(
            frames.next_frame(),
            Err(SourceError::Malformed { line: 1, .. })
        ));
    }
}
