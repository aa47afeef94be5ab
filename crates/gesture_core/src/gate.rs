//! 边沿触发闸门

use crate::Action;

/// 记录最近一次真正执行的动作
///
/// 相同动作在手势持续期间只放行一次；导航动作（下一首/上一首/随机）总是放行，
/// 并在放行后清空记录，保证按住手势时可以连续切歌。
#[derive(Debug, Default, Clone)]
pub struct ActionGate {
    active: Option<Action>,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回是否放行该动作
    pub fn admit(&mut self, action: Action) -> bool {
        if action.is_navigation() {
            self.active = None;
            return true;
        }
        if self.active == Some(action) {
            return false;
        }
        self.active = Some(action);
        true
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<Action> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_action_admitted_once() {
        let mut gate = ActionGate::new();
        assert!(gate.admit(Action::Pause));
        assert!(!gate.admit(Action::Pause));
        assert!(!gate.admit(Action::Pause));
        assert_eq!(gate.active(), Some(Action::Pause));
    }

    #[test]
    fn test_change_is_admitted() {
        let mut gate = ActionGate::new();
        assert!(gate.admit(Action::Pause));
        assert!(gate.admit(Action::Play));
        assert!(gate.admit(Action::Pause));
    }

    #[test]
    fn test_navigation_bypasses_and_clears() {
        let mut gate = ActionGate::new();
        assert!(gate.admit(Action::Pause));
        assert!(gate.admit(Action::Next));
        assert!(gate.admit(Action::Next));
        assert_eq!(gate.active(), None);
        // 导航之后相同的非导航动作可以再次放行
        assert!(gate.admit(Action::Pause));
    }

    #[test]
    fn test_reset() {
        let mut gate = ActionGate::new();
        assert!(gate.admit(Action::Play));
        gate.reset();
        assert!(gate.admit(Action::Play));
    }
}
