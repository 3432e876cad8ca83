//! 编排层
//!
//! ## 模块划分
//!
//! ### `recovery` - 会话恢复监督器
//! - 以显式有限状态机（ATTEMPT / RECOVERING / DONE / ABORTED）
//!   包住一门课的处理
//! - 检测会话丢失，限额内重建会话并重新登录
//! - 维护本门课的跳过集合（受限讲次不再重选）
//!
//! ### `automation` - 多课程自动化编排
//! - 按调用方给定的顺序逐门处理（无重排、无并行）
//! - 跨课程传递会话（课程边界不强制换会话）
//! - 上报粗粒度课程进度，尊重停止信号
//!
//! ## 层次关系
//!
//! ```text
//! automation (处理 Vec<Course>)
//!     ↓
//! recovery (处理单门 Course + 会话恢复)
//!     ↓
//! workflow::CourseRunner (一遍课程) → workflow::LectureWatcher (单讲)
//!     ↓
//! services (能力层：auth / scanner / sink)
//!     ↓
//! infrastructure (通道：ControlChannel)
//! ```
//!
//! 故障只能上行到 recovery 为止：它之下的任何故障都不允许
//! 终止整次运行。

pub mod automation;
pub mod recovery;

pub use automation::Automation;
pub use recovery::RecoverySupervisor;
