//! 流程层
//!
//! 定义"一讲"和"一门课的一遍"的完整处理流程：
//! - `watcher` - 单个讲次从点开到看完的状态机
//! - `course_runner` - 按周次顺序驱动 Watcher 的一遍课程处理

pub mod course_runner;
pub mod watcher;

pub use course_runner::{CourseRunner, PassOutcome};
pub use watcher::LectureWatcher;
