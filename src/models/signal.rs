//! 协作式取消信号

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 停止信号
///
/// 调用方置位、引擎只读（从不清除）。置位是幂等的，
/// 引擎的每个循环在循环体顶部检查一次，最坏停止延迟
/// 等于一个等待/轮询间隔。
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止（幂等）
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// 是否已请求停止
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_is_shared() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_set());
        signal.set();
        assert!(clone.is_set());
        // 重复置位无副作用
        signal.set();
        assert!(clone.is_set());
    }
}
