//! 拟人化节奏延迟 - 基础设施层
//!
//! 平台会对"明显是机器"的交互节奏起疑，所以在输入、点击、
//! 导航之间插入随机化的短延迟。这些等待本身不可中途取消，
//! 取消请求由各个循环在循环体顶部检查。

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// 在 [min_secs, max_secs] 区间内随机睡一段
pub async fn random_sleep(min_secs: f64, max_secs: f64) {
    let secs = rand::thread_rng().gen_range(min_secs..max_secs);
    sleep(Duration::from_secs_f64(secs)).await;
}

/// 一般操作之间的停顿（0.3 ~ 0.8 秒）
pub async fn human_like_delay() {
    let base = rand::thread_rng().gen_range(0.2..0.6);
    let micro = rand::thread_rng().gen_range(0.1..0.2);
    sleep(Duration::from_secs_f64(base + micro)).await;
}

/// 逐字符输入之间的停顿（20 ~ 70 毫秒）
pub async fn typing_delay() {
    let secs = rand::thread_rng().gen_range(0.02..0.07);
    sleep(Duration::from_secs_f64(secs)).await;
}

/// 点击之前的停顿（0.3 ~ 0.8 秒）
pub async fn click_delay() {
    let secs = rand::thread_rng().gen_range(0.3..0.8);
    sleep(Duration::from_secs_f64(secs)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typing_delay_is_short() {
        let start = std::time::Instant::now();
        typing_delay().await;
        // 上界 70ms，留一点调度余量
        assert!(start.elapsed() < Duration::from_millis(300));
    }
}
