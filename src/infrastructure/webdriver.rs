//! thirtyfour WebDriver 通道 - 基础设施层
//!
//! `ControlChannel` 的真实实现。持有唯一的 WebDriver 连接，
//! 把 thirtyfour 的错误分类成引擎认识的 `ChannelError`。
//!
//! 元素句柄在这里落地为一张注册表：每次导航清空注册表，
//! 旧句柄自然失效（返回 `NotFound`），不可能跨页面加载复用。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use thirtyfour::error::WebDriverError;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::WindowHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{ChannelError, ChannelResult};
use crate::infrastructure::channel::{
    ChannelFactory, ControlChannel, ElementHandle, Locator,
};

/// 固定 UA，与隐身脚本里声明的平台保持一致
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// 新文档注入的隐身脚本：抹掉 webdriver 痕迹、伪装插件/语言/WebGL
const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });

    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5]
    });
    Object.defineProperty(navigator, 'languages', {
        get: () => ['ko-KR', 'ko', 'en-US', 'en']
    });

    window.chrome = {
        runtime: {},
        loadTimes: function() {},
        csi: function() {},
        app: {}
    };

    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
    );

    const getParameter = WebGLRenderingContext.prototype.getParameter;
    WebGLRenderingContext.prototype.getParameter = function(parameter) {
        if (parameter === 37445) return 'Intel Inc.';
        if (parameter === 37446) return 'Intel Iris OpenGL Engine';
        return getParameter.call(this, parameter);
    };

    Object.defineProperty(navigator, 'platform', { get: () => 'Win32' });
    Object.defineProperty(navigator, 'vendor', { get: () => 'Google Inc.' });
    Object.defineProperty(navigator, 'maxTouchPoints', { get: () => 0 });
"#;

/// 把 thirtyfour 错误分类为通道错误
///
/// 会话失效的判定是恢复路径的命门，除了专用变体之外
/// 还做一次消息兜底匹配，避免驱动实现差异把它漏成后端错误。
fn classify(e: WebDriverError) -> ChannelError {
    let msg = e.to_string();
    match e {
        WebDriverError::NoSuchElement(_)
        | WebDriverError::NoSuchWindow(_)
        | WebDriverError::NoSuchAlert(_)
        | WebDriverError::NoSuchFrame(_)
        | WebDriverError::StaleElementReference(_) => ChannelError::NotFound(msg),
        WebDriverError::InvalidSessionId(_) => ChannelError::SessionInvalid,
        WebDriverError::JavascriptError(_) => ChannelError::Script(msg),
        WebDriverError::ScriptTimeout(_) | WebDriverError::Timeout(_) => {
            ChannelError::Timeout(msg)
        }
        _ => {
            if msg.contains("invalid session id") || msg.contains("session deleted") {
                ChannelError::SessionInvalid
            } else {
                ChannelError::Backend(msg)
            }
        }
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Id(s) => By::Id(s.as_str()),
        Locator::Css(s) => By::Css(s.as_str()),
        Locator::ClassName(s) => By::ClassName(s.as_str()),
        Locator::Tag(s) => By::Tag(s.as_str()),
        Locator::XPath(s) => By::XPath(s.as_str()),
    }
}

/// thirtyfour 实现的浏览器控制通道
pub struct WebDriverChannel {
    driver: WebDriver,
    elements: Mutex<HashMap<String, WebElement>>,
    seq: AtomicU64,
}

impl WebDriverChannel {
    /// 启动无头浏览器并建立通道
    pub async fn connect(config: &Config) -> ChannelResult<Self> {
        info!("🚀 启动无头浏览器...");
        let mut caps = DesiredCapabilities::chrome();

        if config.headless {
            caps.add_arg("--headless=new").map_err(classify)?;
        }
        for arg in [
            "--start-maximized",
            "--window-size=1920,1080",
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-software-rasterizer",
            "--disable-extensions",
            "--disable-popup-blocking",
            "--disable-infobars",
            "--mute-audio",
            "--disable-notifications",
            "--disable-logging",
            "--log-level=3",
            "--silent",
            "--disable-blink-features=AutomationControlled",
            "--disable-web-security",
            "--allow-running-insecure-content",
            "--disable-features=IsolateOrigins,site-per-process",
            "--disable-site-isolation-trials",
            "--disable-setuid-sandbox",
            "--disable-accelerated-2d-canvas",
            "--disable-background-timer-throttling",
            "--disable-backgrounding-occluded-windows",
            "--disable-renderer-backgrounding",
        ] {
            caps.add_arg(arg).map_err(classify)?;
        }
        caps.add_arg(&format!("user-agent={}", USER_AGENT))
            .map_err(classify)?;
        caps.add_experimental_option(
            "excludeSwitches",
            json!(["enable-automation", "enable-logging"]),
        )
        .map_err(classify)?;
        caps.add_experimental_option("useAutomationExtension", json!(false))
            .map_err(classify)?;
        caps.add_experimental_option(
            "prefs",
            json!({
                "profile.default_content_setting_values.notifications": 2,
                "profile.default_content_setting_values.media_stream_mic": 2,
                "profile.default_content_setting_values.media_stream_camera": 2,
                "profile.default_content_setting_values.geolocation": 2,
                "credentials_enable_service": false,
                "profile.password_manager_enabled": false,
                "profile.default_content_settings.popups": 0,
                "download.prompt_for_download": false,
                "safebrowsing.enabled": false
            }),
        )
        .map_err(classify)?;

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(|e| {
                error!("连接 WebDriver 失败 ({}): {}", config.webdriver_url, e);
                classify(e)
            })?;
        debug!("WebDriver 会话建立成功");

        driver
            .set_page_load_timeout(config.page_load_timeout)
            .await
            .map_err(classify)?;
        driver
            .set_script_timeout(config.page_load_timeout)
            .await
            .map_err(classify)?;

        // 新文档注入隐身脚本 + UA 覆写（CDP）
        let dev_tools = ChromeDevTools::new(driver.handle.clone());
        dev_tools
            .execute_cdp_with_params(
                "Network.setUserAgentOverride",
                json!({ "userAgent": USER_AGENT }),
            )
            .await
            .map_err(classify)?;
        dev_tools
            .execute_cdp_with_params(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": STEALTH_JS }),
            )
            .await
            .map_err(classify)?;

        info!("✅ 无头浏览器就绪");
        Ok(Self {
            driver,
            elements: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        })
    }

    /// 把 WebElement 登记进注册表，换取一个不透明句柄
    fn register(&self, element: WebElement) -> ElementHandle {
        let id = format!("elem-{}", self.seq.fetch_add(1, Ordering::Relaxed));
        self.elements
            .lock()
            .expect("元素注册表锁中毒")
            .insert(id.clone(), element);
        ElementHandle::new(id)
    }

    /// 取回句柄对应的 WebElement；导航后旧句柄一律 `NotFound`
    fn resolve(&self, handle: &ElementHandle) -> ChannelResult<WebElement> {
        self.elements
            .lock()
            .expect("元素注册表锁中毒")
            .get(handle.id())
            .cloned()
            .ok_or_else(|| {
                ChannelError::NotFound(format!("句柄 {} 已随页面导航失效", handle.id()))
            })
    }

    fn invalidate_handles(&self) {
        self.elements.lock().expect("元素注册表锁中毒").clear();
    }
}

#[async_trait]
impl ControlChannel for WebDriverChannel {
    async fn navigate(&self, url: &str) -> ChannelResult<()> {
        // 导航作废全部活句柄
        self.invalidate_handles();
        self.driver.goto(url).await.map_err(classify)
    }

    async fn current_url(&self) -> ChannelResult<String> {
        let url = self.driver.current_url().await.map_err(classify)?;
        Ok(url.to_string())
    }

    async fn find(&self, locator: &Locator) -> ChannelResult<ElementHandle> {
        let element = self.driver.find(to_by(locator)).await.map_err(classify)?;
        Ok(self.register(element))
    }

    async fn find_all(&self, locator: &Locator) -> ChannelResult<Vec<ElementHandle>> {
        let elements = self
            .driver
            .find_all(to_by(locator))
            .await
            .map_err(classify)?;
        Ok(elements.into_iter().map(|e| self.register(e)).collect())
    }

    async fn find_in(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> ChannelResult<ElementHandle> {
        let parent = self.resolve(parent)?;
        let element = parent.find(to_by(locator)).await.map_err(classify)?;
        Ok(self.register(element))
    }

    async fn click(&self, handle: &ElementHandle) -> ChannelResult<()> {
        self.resolve(handle)?.click().await.map_err(classify)
    }

    async fn send_keys(&self, handle: &ElementHandle, text: &str) -> ChannelResult<()> {
        self.resolve(handle)?.send_keys(text).await.map_err(classify)
    }

    async fn text(&self, handle: &ElementHandle) -> ChannelResult<String> {
        self.resolve(handle)?.text().await.map_err(classify)
    }

    async fn attr(&self, handle: &ElementHandle, name: &str) -> ChannelResult<Option<String>> {
        self.resolve(handle)?.attr(name).await.map_err(classify)
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> ChannelResult<bool> {
        self.resolve(handle)?.is_displayed().await.map_err(classify)
    }

    async fn execute_script(&self, src: &str, args: Vec<JsonValue>) -> ChannelResult<JsonValue> {
        let ret = self.driver.execute(src, args).await.map_err(classify)?;
        Ok(ret.json().clone())
    }

    async fn execute_on(&self, src: &str, handle: &ElementHandle) -> ChannelResult<JsonValue> {
        let element = self.resolve(handle)?;
        let arg = element.to_json().map_err(classify)?;
        let ret = self.driver.execute(src, vec![arg]).await.map_err(classify)?;
        Ok(ret.json().clone())
    }

    async fn window_handles(&self) -> ChannelResult<Vec<String>> {
        let windows = self.driver.windows().await.map_err(classify)?;
        Ok(windows.into_iter().map(|w| w.to_string()).collect())
    }

    async fn current_window(&self) -> ChannelResult<String> {
        let window = self.driver.window().await.map_err(classify)?;
        Ok(window.to_string())
    }

    async fn switch_to_window(&self, id: &str) -> ChannelResult<()> {
        // 切换窗口等于换了一棵 DOM 树，旧句柄一并作废
        self.invalidate_handles();
        self.driver
            .switch_to_window(WindowHandle::from(id.to_string()))
            .await
            .map_err(classify)
    }

    async fn close_window(&self) -> ChannelResult<()> {
        self.invalidate_handles();
        self.driver.close_window().await.map_err(classify)
    }

    async fn alert_text(&self) -> ChannelResult<String> {
        self.driver.get_alert_text().await.map_err(classify)
    }

    async fn accept_alert(&self) -> ChannelResult<()> {
        self.driver.accept_alert().await.map_err(classify)
    }

    async fn quit(&self) -> ChannelResult<()> {
        self.invalidate_handles();
        self.driver.clone().quit().await.map_err(classify)
    }
}

/// WebDriver 通道工厂（恢复层重建会话时使用）
pub struct WebDriverFactory {
    config: Config,
}

impl WebDriverFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChannelFactory for WebDriverFactory {
    async fn create(&self) -> Result<Box<dyn ControlChannel>, ChannelError> {
        let channel = WebDriverChannel::connect(&self.config).await?;
        Ok(Box::new(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 真实浏览器连通性测试
    #[tokio::test]
    #[ignore] // 默认忽略，需要本机有 chromedriver：cargo test -- --ignored
    async fn test_webdriver_connect() {
        let config = Config::from_env();
        let channel = WebDriverChannel::connect(&config)
            .await
            .expect("应该能够连接 WebDriver");
        channel.quit().await.expect("应该能够关闭会话");
    }
}
