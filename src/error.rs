//! 错误类型定义
//!
//! 分两层：
//! - `ChannelError`：浏览器控制通道的故障分类，必须把"会话失效"
//!   与"元素不存在/等待超时"严格区分开，恢复逻辑依赖这个区分
//! - `AppError`：应用层错误，包装通道/认证/配置错误

use thiserror::Error;

/// 浏览器控制通道错误
///
/// 所有通道操作（导航、查找元素、执行脚本、窗口切换）都返回这个类型。
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 预期的元素/行不存在（通常是良性的，表示"本处无事可做"）
    #[error("元素未找到: {0}")]
    NotFound(String),

    /// 等待超过了时限
    #[error("等待超时: {0}")]
    Timeout(String),

    /// 浏览器会话已失效，必须重建会话并重新登录
    #[error("浏览器会话已失效")]
    SessionInvalid,

    /// 脚本执行失败
    #[error("脚本执行失败: {0}")]
    Script(String),

    /// 其余后端故障（WebDriver 协议错误等）
    #[error("通道后端错误: {0}")]
    Backend(String),
}

impl ChannelError {
    /// 是否是会话失效错误
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, ChannelError::SessionInvalid)
    }

    /// 是否是良性的"未找到"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChannelError::NotFound(_))
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器通道错误
    #[error("浏览器通道错误: {0}")]
    Channel(#[from] ChannelError),

    /// 登录未成功（计入恢复重试预算）
    #[error("登录失败: {0}")]
    Auth(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件操作错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 通道结果类型别名
pub type ChannelResult<T> = Result<T, ChannelError>;

/// 应用程序结果类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_invalid_classification() {
        assert!(ChannelError::SessionInvalid.is_session_invalid());
        assert!(!ChannelError::NotFound("x".into()).is_session_invalid());
        assert!(ChannelError::NotFound("x".into()).is_not_found());
        assert!(!ChannelError::Timeout("t".into()).is_not_found());
    }

    #[test]
    fn test_auth_rejection_display() {
        let e = AppError::Auth("凭据被拒".into());
        assert!(e.to_string().contains("登录失败"));
    }
}
