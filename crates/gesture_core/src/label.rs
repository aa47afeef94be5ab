//! 手势标签、播放动作与映射表

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 单帧识别出的手势
///
/// “无手势”用 `Option<GestureLabel>::None` 表示，不是一个变体。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    OpenPalm,
    Fist,
    ThumbUp,
    ThumbDown,
    /// 摇滚手势 / 胜利手势
    Rock,
    /// 模型输出中未改名的其它标签（已小写）
    Other(String),
}

impl GestureLabel {
    /// 解析标签字符串，大小写不敏感；未知标签落入 `Other`
    pub fn parse(s: &str) -> Self {
        let tag = s.trim().to_lowercase();
        match tag.as_str() {
            "open_palm" => Self::OpenPalm,
            "fist" => Self::Fist,
            "thumb_up" | "thumbs_up" => Self::ThumbUp,
            "thumb_down" | "thumbs_down" => Self::ThumbDown,
            "rock" | "rock_or_victory" => Self::Rock,
            _ => Self::Other(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenPalm => "open_palm",
            Self::Fist => "fist",
            Self::ThumbUp => "thumb_up",
            Self::ThumbDown => "thumb_down",
            Self::Rock => "rock",
            Self::Other(tag) => tag,
        }
    }

    /// 日志里显示的名字
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenPalm => "Open Palm",
            Self::Fist => "Fist",
            Self::ThumbUp => "ThumbsUp",
            Self::ThumbDown => "ThumbsDown",
            Self::Rock => "Rock",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 播放动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// 暂停中则恢复，否则（未在播放时）从头播放当前曲目
    Play,
    /// 切换暂停
    Pause,
    Next,
    Previous,
    #[serde(alias = "random")]
    Shuffle,
}

impl Action {
    /// 导航动作不受边沿触发限制，按住即按固定节奏重复
    pub fn is_navigation(self) -> bool {
        matches!(self, Self::Next | Self::Previous | Self::Shuffle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Shuffle => "shuffle",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Next => "Next",
            Self::Previous => "Previous",
            Self::Shuffle => "Random",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 动作名解析错误
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "next" => Ok(Self::Next),
            "previous" => Ok(Self::Previous),
            "shuffle" | "random" => Ok(Self::Shuffle),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// 手势 -> 动作 映射表
///
/// 对任何标签都有定义：未绑定的标签映射为 `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    bindings: HashMap<GestureLabel, Action>,
}

impl ActionTable {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// 关键点启发式分类器使用的映射
    pub fn heuristic() -> Self {
        let mut table = Self::empty();
        table.bind(GestureLabel::OpenPalm, Action::Play);
        table.bind(GestureLabel::Fist, Action::Pause);
        table.bind(GestureLabel::ThumbUp, Action::Next);
        table.bind(GestureLabel::ThumbDown, Action::Previous);
        table.bind(GestureLabel::Rock, Action::Shuffle);
        table
    }

    /// 模型分类器使用的映射
    ///
    /// 共有标签的绑定与启发式一致；模型透传的 `Other` 标签一律不触发。
    pub fn model() -> Self {
        Self::heuristic()
    }

    pub fn bind(&mut self, label: GestureLabel, action: Action) {
        self.bindings.insert(label, action);
    }

    pub fn unbind(&mut self, label: &GestureLabel) -> Option<Action> {
        self.bindings.remove(label)
    }

    pub fn map_to_action(&self, label: &GestureLabel) -> Option<Action> {
        self.bindings.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::heuristic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_legacy_tags() {
        assert_eq!(GestureLabel::parse("open_palm"), GestureLabel::OpenPalm);
        assert_eq!(GestureLabel::parse("Fist"), GestureLabel::Fist);
        assert_eq!(GestureLabel::parse("thumbs_up"), GestureLabel::ThumbUp);
        assert_eq!(GestureLabel::parse("THUMB_DOWN"), GestureLabel::ThumbDown);
        assert_eq!(GestureLabel::parse("rock_or_victory"), GestureLabel::Rock);
        assert_eq!(
            GestureLabel::parse("ILoveYou"),
            GestureLabel::Other("iloveyou".to_string())
        );
    }

    #[test]
    fn test_heuristic_table() {
        let table = ActionTable::heuristic();
        assert_eq!(table.map_to_action(&GestureLabel::OpenPalm), Some(Action::Play));
        assert_eq!(table.map_to_action(&GestureLabel::Fist), Some(Action::Pause));
        assert_eq!(table.map_to_action(&GestureLabel::ThumbUp), Some(Action::Next));
        assert_eq!(table.map_to_action(&GestureLabel::ThumbDown), Some(Action::Previous));
        assert_eq!(table.map_to_action(&GestureLabel::Rock), Some(Action::Shuffle));
    }

    #[test]
    fn test_unknown_label_maps_to_none() {
        let table = ActionTable::model();
        let label = GestureLabel::Other("iloveyou".to_string());
        assert_eq!(table.map_to_action(&label), None);
    }

    #[test]
    fn test_action_names() {
        assert_eq!("random".parse::<Action>(), Ok(Action::Shuffle));
        assert_eq!(" Next ".parse::<Action>(), Ok(Action::Next));
        assert!("stop".parse::<Action>().is_err());
        assert!(Action::Shuffle.is_navigation());
        assert!(!Action::Pause.is_navigation());
    }
}
