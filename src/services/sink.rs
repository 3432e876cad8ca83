//! 进度/日志上报边界 - 业务能力层
//!
//! 引擎对外的唯一出口：日志事件、播放进度、课程进度。
//! 以构造参数注入（不是进程级可设置的函数指针），事件按
//! 发出顺序送达，除此之外不做缓冲承诺。数据只向外流，
//! 调用方影响引擎的唯一途径是停止信号。

use std::sync::Arc;

/// 上报日志级别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkLevel {
    Info,
    Error,
    Debug,
}

/// 事件接收器
///
/// 实现方通常是嵌入方的 UI 层，实现必须快进快出，
/// 不得阻塞引擎。
pub trait EventSink: Send + Sync {
    /// 一条日志事件
    fn log(&self, level: SinkLevel, message: &str);

    /// 播放进度（当前秒数、总秒数、讲次标题）
    fn video_progress(&self, current: u64, duration: u64, title: &str);

    /// 课程级进度（序号、总数、状态描述）
    fn course_progress(&self, index: usize, total: usize, status: &str);
}

/// 丢弃一切事件的接收器（默认值/测试用）
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn log(&self, _level: SinkLevel, _message: &str) {}
    fn video_progress(&self, _current: u64, _duration: u64, _title: &str) {}
    fn course_progress(&self, _index: usize, _total: usize, _status: &str) {}
}

/// 共享接收器句柄类型别名
pub type SharedSink = Arc<dyn EventSink>;
