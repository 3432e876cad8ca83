//! 会话恢复监督器 - 编排层
//!
//! 把"重新登录"和"继续迭代"用一张显式状态转移表表达出来，
//! 而不是嵌套的异常控制流——重试上限与跳过集合的不变量
//! 在一个 match 里看得见。
//!
//! 状态机：
//! - `Attempt`：委托 CourseRunner 跑一遍（逐周重扫、按跳过
//!   集合过滤、一次处理一条）
//! - `Recovering`：丢弃当前会话 → 建新会话 → 重新登录；
//!   登录失败计数，整门课共 3 次预算，超限转 `Aborted`
//! - `Done`：15 周全部没有剩余未完成讲次
//! - `Aborted`：放弃本门课（不影响其他课程）

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::infrastructure::channel::ChannelFactory;
use crate::models::{Course, Credentials, StopSignal};
use crate::services::auth::Authenticator;
use crate::services::sink::{SharedSink, SinkLevel};
use crate::session::Session;
use crate::workflow::course_runner::{CourseRunner, PassOutcome};

/// 监督器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SupervisorState {
    Attempt,
    Recovering,
    Done,
    Aborted,
}

/// 会话恢复监督器
pub struct RecoverySupervisor {
    runner: CourseRunner,
    auth: Authenticator,
    factory: Arc<dyn ChannelFactory>,
    sink: SharedSink,
    max_login_attempts: u32,
}

impl RecoverySupervisor {
    pub fn new(config: &Config, sink: SharedSink, factory: Arc<dyn ChannelFactory>) -> Self {
        Self {
            runner: CourseRunner::new(config, sink.clone()),
            auth: Authenticator::new(config),
            factory,
            sink,
            max_login_attempts: config.max_login_attempts,
        }
    }

    /// 带会话恢复地处理一门课
    ///
    /// 返回 `(是否完成, 会话)`。停止请求不算失败：观测到就带着
    /// 已有进度返回成功。跳过集合只活在这一次调用里，且只属于
    /// 这一门课——同名讲次出现在两门课里互不影响。
    pub async fn run_with_recovery(
        &self,
        mut session: Session,
        course: &Course,
        stop: &StopSignal,
        credentials: &Credentials,
    ) -> (bool, Session) {
        let mut skip: HashSet<String> = HashSet::new();
        let mut login_attempts: u32 = 0;
        let mut state = SupervisorState::Attempt;

        loop {
            state = match state {
                SupervisorState::Attempt => {
                    if stop.is_set() {
                        self.report_info("收到停止请求。");
                        return (true, session);
                    }

                    match self
                        .runner
                        .run_pass(session.channel(), course, stop, &mut skip)
                        .await
                    {
                        Ok(PassOutcome::Completed) => SupervisorState::Done,
                        Ok(PassOutcome::Stopped) => {
                            self.report_info("收到停止请求。");
                            return (true, session);
                        }
                        Ok(PassOutcome::SessionLost) => {
                            self.report_error("会话已失效，尝试重新登录...");
                            SupervisorState::Recovering
                        }
                        Err(e) => {
                            self.report_error(&format!("预期之外的错误: {}", e));
                            SupervisorState::Aborted
                        }
                    }
                }

                SupervisorState::Recovering => {
                    if stop.is_set() {
                        self.report_info("收到停止请求。");
                        return (true, session);
                    }
                    if login_attempts >= self.max_login_attempts {
                        SupervisorState::Aborted
                    } else {
                        login_attempts += 1;
                        match self.recover(&mut session, credentials).await {
                            true => {
                                self.report_info("重新登录成功! 继续处理课程。");
                                SupervisorState::Attempt
                            }
                            false => {
                                self.report_error(&format!(
                                    "重新登录失败 ({}/{})，再试一次。",
                                    login_attempts, self.max_login_attempts
                                ));
                                SupervisorState::Recovering
                            }
                        }
                    }
                }

                SupervisorState::Done => {
                    info!("[{}] 本门课处理完成。", course.name);
                    return (true, session);
                }

                SupervisorState::Aborted => {
                    self.report_error(&format!(
                        "[{}] 超过最大重试次数，放弃本门课。",
                        course.name
                    ));
                    return (false, session);
                }
            };
        }
    }

    /// 一次恢复尝试：关停旧会话 → 新会话 → 重新登录
    ///
    /// 旧会话必须先行关停（尽力而为），同一身份不允许两个活会话。
    async fn recover(&self, session: &mut Session, credentials: &Credentials) -> bool {
        session.close().await;

        let channel = match self.factory.create().await {
            Ok(channel) => channel,
            Err(e) => {
                error!("重建浏览器会话失败: {}", e);
                return false;
            }
        };
        *session = Session::new(channel);

        match self.auth.login(session.channel(), credentials).await {
            Ok(true) => true,
            Ok(false) => false,
            Err(e) => {
                error!("重新登录过程中出错: {}", e);
                false
            }
        }
    }

    fn report_info(&self, msg: &str) {
        info!("{}", msg);
        self.sink.log(SinkLevel::Info, msg);
    }

    fn report_error(&self, msg: &str) {
        error!("{}", msg);
        self.sink.log(SinkLevel::Error, msg);
    }
}
