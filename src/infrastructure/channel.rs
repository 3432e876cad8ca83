//! 浏览器控制通道 - 基础设施层
//!
//! 引擎与受控浏览器之间的唯一边界。引擎只依赖这个 trait，
//! 不认识 thirtyfour，也不认识测试里的脚本化模拟实现。
//!
//! 所有方法都可失败，并且会话失效（`ChannelError::SessionInvalid`）
//! 与元素缺失/超时是截然不同的故障，调用方靠这个区分决定
//! 是"跳过本项"还是"走会话恢复"。

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ChannelError, ChannelResult};

/// 元素定位方式
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
    ClassName(String),
    Tag(String),
    XPath(String),
}

impl Locator {
    pub fn id(s: impl Into<String>) -> Self {
        Locator::Id(s.into())
    }
    pub fn css(s: impl Into<String>) -> Self {
        Locator::Css(s.into())
    }
    pub fn class_name(s: impl Into<String>) -> Self {
        Locator::ClassName(s.into())
    }
    pub fn tag(s: impl Into<String>) -> Self {
        Locator::Tag(s.into())
    }
    pub fn xpath(s: impl Into<String>) -> Self {
        Locator::XPath(s.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::ClassName(s) => write!(f, "class={}", s),
            Locator::Tag(s) => write!(f, "tag={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// 元素活句柄
///
/// 只在产出它的那一次页面加载内有效。具体实现会在每次导航时
/// 作废全部旧句柄，拿旧句柄再操作会得到 `NotFound`，这把
/// "句柄不得跨导航缓存"从约定变成了机制。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// 浏览器控制通道
///
/// 职责：
/// - 打开页面、定位元素、执行脚本
/// - 管理多窗口（讲次视频在第二个窗口里播放）
/// - 读取/接受原生弹窗
/// - 把后端故障分类成 `ChannelError`
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// 导航到指定 URL（会作废所有已发出的元素句柄）
    async fn navigate(&self, url: &str) -> ChannelResult<()>;

    /// 当前页面 URL
    async fn current_url(&self) -> ChannelResult<String>;

    /// 查找单个元素
    async fn find(&self, locator: &Locator) -> ChannelResult<ElementHandle>;

    /// 查找全部匹配元素
    async fn find_all(&self, locator: &Locator) -> ChannelResult<Vec<ElementHandle>>;

    /// 在某个元素内部查找（XPath 相对定位用）
    async fn find_in(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> ChannelResult<ElementHandle>;

    /// 点击元素
    async fn click(&self, handle: &ElementHandle) -> ChannelResult<()>;

    /// 向元素输入文本
    async fn send_keys(&self, handle: &ElementHandle, text: &str) -> ChannelResult<()>;

    /// 读取元素文本
    async fn text(&self, handle: &ElementHandle) -> ChannelResult<String>;

    /// 读取元素属性
    async fn attr(&self, handle: &ElementHandle, name: &str) -> ChannelResult<Option<String>>;

    /// 元素是否可见
    async fn is_displayed(&self, handle: &ElementHandle) -> ChannelResult<bool>;

    /// 执行脚本并返回 JSON 结果
    async fn execute_script(&self, src: &str, args: Vec<JsonValue>) -> ChannelResult<JsonValue>;

    /// 以某个元素为 arguments[0] 执行脚本
    async fn execute_on(&self, src: &str, handle: &ElementHandle) -> ChannelResult<JsonValue>;

    /// 列出全部窗口句柄
    async fn window_handles(&self) -> ChannelResult<Vec<String>>;

    /// 当前窗口句柄
    async fn current_window(&self) -> ChannelResult<String>;

    /// 切换到指定窗口
    async fn switch_to_window(&self, id: &str) -> ChannelResult<()>;

    /// 关闭当前窗口
    async fn close_window(&self) -> ChannelResult<()>;

    /// 读取弹窗文本（无弹窗时返回 `NotFound`）
    async fn alert_text(&self) -> ChannelResult<String>;

    /// 接受（关闭）弹窗
    async fn accept_alert(&self) -> ChannelResult<()>;

    /// 结束会话并关闭浏览器
    async fn quit(&self) -> ChannelResult<()>;
}

/// 通道工厂
///
/// 恢复层在旧会话失效后用它构造全新的通道。同一时刻只允许
/// 存在一个活通道，旧通道必须先尽力关停再创建新的。
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn ControlChannel>, ChannelError>;
}

/// 在时限内反复尝试一个查找，直到成功或超时
///
/// `NotFound` 在时限内吞掉继续等；`SessionInvalid` 立即上抛，
/// 不允许被等待循环吃掉。
pub async fn wait_for_element(
    channel: &dyn ControlChannel,
    locator: &Locator,
    timeout: std::time::Duration,
) -> ChannelResult<ElementHandle> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        match channel.find(locator).await {
            Ok(handle) => return Ok(handle),
            Err(e) if e.is_session_invalid() => return Err(e),
            Err(e) if e.is_not_found() => {
                if std::time::Instant::now() >= deadline {
                    return Err(ChannelError::Timeout(format!("等待元素超时: {}", locator)));
                }
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 在时限内等待窗口数达到预期
pub async fn wait_for_window_count(
    channel: &dyn ControlChannel,
    expected: usize,
    timeout: std::time::Duration,
) -> ChannelResult<Vec<String>> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let windows = channel.window_handles().await?;
        if windows.len() >= expected {
            return Ok(windows);
        }
        if std::time::Instant::now() >= deadline {
            return Err(ChannelError::Timeout(format!(
                "等待窗口数达到 {} 超时（当前 {}）",
                expected,
                windows.len()
            )));
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
