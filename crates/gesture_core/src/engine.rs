//! 去抖动 / 节奏触发引擎
//!
//! 同一手势连续保持 `min_duration` 后触发一次映射动作，随后立即重新计时，
//! 因此一直保持的手势会以固定节奏重复触发。边沿触发不在这里处理，见 [`crate::ActionGate`]。

use std::time::{Duration, Instant};

use crate::{Action, ActionTable, GestureLabel};

/// 默认保持时长 0.5 秒
pub const DEFAULT_MIN_DURATION: Duration = Duration::from_millis(500);

/// 单槽计时器：最多记录一个（手势, 首次出现时间）
pub struct DwellEngine {
    slot: Option<(GestureLabel, Instant)>,
    min_duration: Duration,
    table: ActionTable,
}

impl DwellEngine {
    pub fn new(table: ActionTable) -> Self {
        Self::with_min_duration(table, DEFAULT_MIN_DURATION)
    }

    pub fn with_min_duration(table: ActionTable, min_duration: Duration) -> Self {
        Self {
            slot: None,
            min_duration,
            table,
        }
    }

    /// 输入一帧标签，返回本帧应触发的动作
    pub fn observe(&mut self, label: Option<&GestureLabel>, now: Instant) -> Option<Action> {
        let Some(label) = label else {
            self.slot = None;
            return None;
        };

        let since = match &self.slot {
            Some((held, since)) if held == label => *since,
            _ => {
                // 换手势（包括两个非空手势之间切换）都从头计时
                log::debug!("dwell restart: {}", label);
                self.slot = Some((label.clone(), now));
                return None;
            }
        };

        if now.saturating_duration_since(since) < self.min_duration {
            return None;
        }

        self.slot = Some((label.clone(), now));
        let action = self.table.map_to_action(label);
        log::debug!("dwell fire: {} -> {:?}", label, action);
        action
    }

    /// 当前正在计时的手势
    pub fn held(&self) -> Option<&GestureLabel> {
        self.slot.as_ref().map(|(label, _)| label)
    }

    pub fn reset(&mut self) {
        self.slot = None;
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }
}

impl Default for DwellEngine {
    fn default() -> Self {
        Self::new(ActionTable::default())
    }
}
