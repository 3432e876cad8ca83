//! # Hoseo Macro
//!
//! 代替单个已认证用户顺序消化在线课程视频讲次的自动化引擎：
//! 枚举已注册课程，找出每门课/每周的未完成讲次，驱动受控浏览器
//! 会话逐条看完，期间容忍会话被平台作废——丢弃旧会话、重新登录、
//! 从原位置继续，已完成的工作不重复也不丢失。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（WebDriver 连接），只暴露能力
//! - `ControlChannel` - 浏览器控制通道边界（导航/查找/脚本/窗口/弹窗）
//! - `pacing` - 拟人化随机节奏
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不编排流程
//! - `Authenticator` - 登录能力
//! - `CourseScanner` - 课程/周次扫描能力
//! - `EventSink` - 进度/日志上报边界（构造注入，非全局钩子）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一讲"与"一遍课程"的完整处理流程
//! - `LectureWatcher` - 单讲状态机（打开 → 弹窗 → 起播 → 轮询 → 清理）
//! - `CourseRunner` - 逐周重扫、逐条观看、回列表页刷新
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/recovery` - 会话恢复监督器（显式 FSM + 跳过集合）
//! - `orchestrator/automation` - 多课程顺序编排，跨课程传递会话
//!
//! ## 并发模型
//!
//! 单一逻辑控制流驱动唯一的活会话；对外只有单向的进度/日志
//! 回调和一个共享停止标志，停止延迟最坏一个轮询间隔。

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ChannelError, ChannelResult};
pub use infrastructure::{ChannelFactory, ControlChannel, ElementHandle, Locator};
pub use infrastructure::{WebDriverChannel, WebDriverFactory};
pub use models::{Course, Credentials, LectureItem, StopSignal, WatchOutcome};
pub use orchestrator::{Automation, RecoverySupervisor};
pub use services::{Authenticator, CourseScanner, EventSink, NullSink, SinkLevel};
pub use session::Session;
pub use workflow::{CourseRunner, LectureWatcher, PassOutcome};
