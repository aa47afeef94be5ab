//! gesture_player - 播放控制
//!
//! 扫描音乐目录得到播放列表，按手势动作切歌、暂停、随机播放。
//! 音频在后台线程中用 symphonia 解码、cpal 输出。

mod command;
mod controller;
mod decoder;
mod engine;
mod output;
mod playlist;
mod sink;

pub use command::*;
pub use controller::*;
pub use decoder::*;
pub use engine::*;
pub use output::*;
pub use playlist::*;
pub use sink::*;
