//! 登录服务 - 业务能力层
//!
//! 只负责"提交凭据并确认进入"这一件事。初次登录和会话恢复
//! 后的重新登录走的都是这里。

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::ChannelResult;
use crate::infrastructure::channel::{wait_for_element, ControlChannel, Locator};
use crate::infrastructure::pacing;
use crate::models::Credentials;

/// 登录页元素
const USERNAME_INPUT: &str = "input-username";
const PASSWORD_INPUT: &str = "input-password";
const LOGIN_BUTTON: &str = ".btn.btn-login";
/// 登录成功后页面上出现的用户头像标记
const POST_LOGIN_MARKER: &str = "userpicture";

/// 登录服务
pub struct Authenticator {
    login_url: String,
    wait_timeout: std::time::Duration,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            wait_timeout: config.wait_timeout,
        }
    }

    /// 提交凭据并验证是否成功进入
    ///
    /// 返回 `Ok(false)` 表示凭据被拒绝（计入恢复重试预算）；
    /// 通道故障按 `Err` 上抛。
    pub async fn login(
        &self,
        channel: &dyn ControlChannel,
        credentials: &Credentials,
    ) -> ChannelResult<bool> {
        info!("正在打开登录页面: {}", self.login_url);
        channel.navigate(&self.login_url).await?;
        pacing::human_like_delay().await;

        let username = wait_for_element(
            channel,
            &Locator::id(USERNAME_INPUT),
            self.wait_timeout,
        )
        .await?;
        pacing::human_like_delay().await;
        self.type_slowly(channel, &username, &credentials.user_id)
            .await?;

        pacing::human_like_delay().await;
        let password = wait_for_element(
            channel,
            &Locator::id(PASSWORD_INPUT),
            self.wait_timeout,
        )
        .await?;
        pacing::human_like_delay().await;
        self.type_slowly(channel, &password, &credentials.password)
            .await?;

        pacing::click_delay().await;
        let button = wait_for_element(channel, &Locator::css(LOGIN_BUTTON), self.wait_timeout)
            .await?;
        channel.click(&button).await?;
        pacing::random_sleep(1.5, 2.5).await;

        // 仍停留在登录页说明提交被拒：再用头像标记确认一次
        let url = channel.current_url().await?;
        if url.contains("login") {
            match channel.find(&Locator::class_name(POST_LOGIN_MARKER)).await {
                Ok(_) => {
                    debug!("登录页 URL 未变化但已出现头像标记，视为成功");
                }
                Err(e) if e.is_not_found() => {
                    error!("登录失败: 没有进入主页面");
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }

        info!("✅ 登录成功");
        Ok(true)
    }

    /// 逐字符输入，模拟真人打字
    async fn type_slowly(
        &self,
        channel: &dyn ControlChannel,
        handle: &crate::infrastructure::channel::ElementHandle,
        text: &str,
    ) -> ChannelResult<()> {
        for ch in text.chars() {
            channel.send_keys(handle, &ch.to_string()).await?;
            pacing::typing_delay().await;
        }
        Ok(())
    }
}
