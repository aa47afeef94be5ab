//! gesture_core - 手势到播放动作的映射核心
//!
//! 每帧输入一个手势标签（或无手势），输出至多一个播放动作：
//! - [`DwellEngine`]：去抖动 + 固定节奏重复触发
//! - [`ActionGate`]：边沿触发（导航动作例外）
//! - [`Session`]：把两层与播放控制器组合在一起

mod engine;
mod gate;
mod label;
mod session;

pub use engine::*;
pub use gate::*;
pub use label::*;
pub use session::*;
