//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，不编排流程：
//! - `auth` - 登录能力
//! - `scanner` - 课程/周次扫描能力
//! - `sink` - 向调用方上报进度与日志的回调边界

pub mod auth;
pub mod scanner;
pub mod sink;

pub use auth::Authenticator;
pub use scanner::CourseScanner;
pub use sink::{EventSink, NullSink, SinkLevel};
