//! 多课程自动化编排 - 编排层
//!
//! 按调用方给定的顺序逐门课调用恢复监督器，把返回的会话
//! 传给下一门课（课程边界不换会话）。某门课放弃只记一条
//! 日志，继续处理下一门——没有任何课程级故障能终止整次运行。

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::infrastructure::channel::ChannelFactory;
use crate::models::{Course, Credentials, StopSignal};
use crate::orchestrator::recovery::RecoverySupervisor;
use crate::services::sink::{SharedSink, SinkLevel};
use crate::session::Session;

/// 多课程自动化编排器
pub struct Automation {
    supervisor: RecoverySupervisor,
    sink: SharedSink,
}

impl Automation {
    pub fn new(config: &Config, sink: SharedSink, factory: Arc<dyn ChannelFactory>) -> Self {
        Self {
            supervisor: RecoverySupervisor::new(config, sink.clone(), factory),
            sink,
        }
    }

    /// 顺序处理选中的课程
    ///
    /// 不重排、不并行。停止信号只在课程边界检查——已经开始的
    /// 课程由监督器自己响应停止。
    pub async fn run(
        &self,
        mut session: Session,
        selected: &[Course],
        stop: &StopSignal,
        credentials: &Credentials,
    ) -> Session {
        let total = selected.len();

        for (index, course) in selected.iter().enumerate() {
            if stop.is_set() {
                break;
            }

            self.sink
                .course_progress(index, total, &format!("进行中: {}", course.name));
            self.report_info(&format!("[{}] 开始处理课程。", course.name));

            let (success, next_session) = self
                .supervisor
                .run_with_recovery(session, course, stop, credentials)
                .await;
            session = next_session;

            // 课程结束后无论成败都上报一次粗粒度进度，嵌入方的
            // 计数器不因放弃的课程而停摆
            if success {
                self.sink
                    .course_progress(index + 1, total, &format!("完成: {}", course.name));
            } else {
                self.sink
                    .course_progress(index + 1, total, &format!("未完成: {}", course.name));
                self.report_info(&format!("[{}] 没能完成处理。", course.name));
            }
        }

        if stop.is_set() {
            self.report_info("按用户请求停止了任务。");
        } else {
            self.report_info("全部任务处理完成。");
        }

        session
    }

    fn report_info(&self, msg: &str) {
        info!("{}", msg);
        self.sink.log(SinkLevel::Info, msg);
    }
}
