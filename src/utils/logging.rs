//! 日志工具模块
//!
//! 初始化 tracing 订阅器。级别默认 info，`RUST_LOG` 可覆盖，
//! 配置里的 verbose 开关把默认级别提到 debug。

use tracing_subscriber::EnvFilter;

/// 初始化日志，`verbose` 为真时默认 debug 级别
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试里可能重复初始化，失败就保持已有订阅器
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("짧은 제목", 10), "짧은 제목");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }
}
