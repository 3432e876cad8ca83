//! 数据模型

pub mod course;
pub mod lecture;
pub mod signal;

pub use course::Course;
pub use lecture::{LectureItem, WatchOutcome};
pub use signal::StopSignal;

/// 登录凭据
///
/// 只在内存中存在一次运行的时长，引擎自身从不持久化。
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 密码不进日志
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"***")
            .finish()
    }
}
