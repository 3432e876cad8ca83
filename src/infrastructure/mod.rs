//! 基础设施层
//!
//! 持有稀缺资源（WebDriver 连接），只向上暴露能力：
//! - `channel` - 浏览器控制通道的抽象边界（trait）
//! - `webdriver` - thirtyfour 实现的具体通道
//! - `pacing` - 拟人化的随机节奏延迟

pub mod channel;
pub mod pacing;
pub mod webdriver;

pub use channel::{ChannelFactory, ControlChannel, ElementHandle, Locator};
pub use webdriver::{WebDriverChannel, WebDriverFactory};
