//! 配置文件（JSON）

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gesture_core::{Action, ActionTable, GestureLabel, DEFAULT_MIN_DURATION};
use gesture_player::DEFAULT_EXTENSIONS;
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 分类策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Heuristic,
    Model,
}

impl ClassifierKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "heuristic" => Some(Self::Heuristic),
            "model" => Some(Self::Model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub music_dir: PathBuf,
    pub extensions: Vec<String>,
    pub min_duration_ms: u64,
    pub classifier: ClassifierKind,
    /// 识别模型文件；配置了但不存在时手势控制降级为无效
    pub model_asset: Option<PathBuf>,
    pub volume: f32,
    /// 启动时自动播放第一首
    pub autoplay: bool,
    /// 手势标签 -> 动作，覆盖默认映射
    pub bindings: HashMap<String, Action>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_dir: PathBuf::from("music"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_duration_ms: DEFAULT_MIN_DURATION.as_millis() as u64,
            classifier: ClassifierKind::default(),
            model_asset: None,
            volume: 1.0,
            autoplay: true,
            bindings: HashMap::new(),
        }
    }
}

impl Config {
    /// 读取配置；未指定路径时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::Invalid(format!(
                "volume must be within 0.0..=1.0, got {}",
                self.volume
            )));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    /// 按分类策略选默认映射，再叠加配置中的绑定
    pub fn action_table(&self) -> ActionTable {
        let mut table = match self.classifier {
            ClassifierKind::Heuristic => ActionTable::heuristic(),
            ClassifierKind::Model => ActionTable::model(),
        };
        for (tag, action) in &self.bindings {
            table.bind(GestureLabel::parse(tag), *action);
        }
        table
    }
}
