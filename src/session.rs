//! 会话所有权
//!
//! 同一时刻只允许存在一个活会话，引擎独占持有；替换会话时
//! 必须先尽力关停旧会话再创建新会话——同一身份下两个活会话
//! 会在服务端状态上互相竞争。

use tracing::{debug, error};

use crate::infrastructure::channel::ControlChannel;

/// 一次已认证的、活的浏览器会话绑定
///
/// 等待/超时策略随 `Config` 注入到各个服务，这里只承载
/// 通道句柄本身的独占所有权。
pub struct Session {
    channel: Box<dyn ControlChannel>,
}

impl Session {
    pub fn new(channel: Box<dyn ControlChannel>) -> Self {
        Self { channel }
    }

    /// 借出通道能力（不转移所有权）
    pub fn channel(&self) -> &dyn ControlChannel {
        self.channel.as_ref()
    }

    /// 尽力关停会话
    ///
    /// 失效会话的关停失败只记日志，不算故障。
    pub async fn close(&self) {
        match self.channel.quit().await {
            Ok(()) => debug!("会话已关闭"),
            Err(e) => error!("关停旧会话失败（忽略）: {}", e),
        }
    }
}
