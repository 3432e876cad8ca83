//! 课程处理流程 - 流程层
//!
//! 按 1..N 周的顺序，对每周反复"重扫未完成讲次 → 看第一条 →
//! 回到列表页"，直到该周没有未完成讲次为止。完成标记只有在
//! 页面重新加载后才会刷新，所以每看完一条都必须回列表页重扫，
//! 讲次句柄也因此每轮重新派生，从不跨导航复用。
//!
//! 会话失效只会中止本遍处理并把控制权交还调用方——重新登录的
//! 权力只属于恢复层。

use std::collections::HashSet;

use tracing::{error, info};

use crate::config::Config;
use crate::error::ChannelResult;
use crate::infrastructure::channel::ControlChannel;
use crate::models::{Course, StopSignal, WatchOutcome};
use crate::services::scanner::CourseScanner;
use crate::services::sink::{SharedSink, SinkLevel};
use crate::workflow::watcher::LectureWatcher;

/// 一遍课程处理的结束方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// 所有周次都没有剩余未完成讲次
    Completed,
    /// 会话失效，调用方（恢复层）决定是否重建会话再来一遍
    SessionLost,
    /// 观测到停止请求
    Stopped,
}

/// 课程处理流程
pub struct CourseRunner {
    scanner: CourseScanner,
    watcher: LectureWatcher,
    sink: SharedSink,
    post_navigation_delay: std::time::Duration,
}

impl CourseRunner {
    pub fn new(config: &Config, sink: SharedSink) -> Self {
        Self {
            scanner: CourseScanner::new(config),
            watcher: LectureWatcher::new(config, sink.clone()),
            sink,
            post_navigation_delay: config.post_navigation_delay,
        }
    }

    /// 不带跳过集合的单遍处理（等价于空跳过集合）
    pub async fn run(
        &self,
        channel: &dyn ControlChannel,
        course: &Course,
        stop: &StopSignal,
    ) -> ChannelResult<PassOutcome> {
        let mut skip = HashSet::new();
        self.run_pass(channel, course, stop, &mut skip).await
    }

    /// 处理一门课的一遍
    ///
    /// `skip` 是恢复层传入的跳过集合（以讲次标题为键）：被平台
    /// 判定受限的讲次进集合，重扫后不再被选中。集合的生命周期
    /// 由调用方掌握，跨越会话重建但不跨课程。
    pub async fn run_pass(
        &self,
        channel: &dyn ControlChannel,
        course: &Course,
        stop: &StopSignal,
        skip: &mut HashSet<String>,
    ) -> ChannelResult<PassOutcome> {
        self.report_info(&format!("[{}] 接入课程页面。", course.name));
        match channel.navigate(&course.url).await {
            Ok(()) => {}
            Err(e) if e.is_session_invalid() => return Ok(PassOutcome::SessionLost),
            Err(e) => return Err(e),
        }

        for week in 1..=self.scanner.week_count() {
            if stop.is_set() {
                self.report_info("收到停止请求，中止课程处理。");
                return Ok(PassOutcome::Stopped);
            }

            match self.drain_week(channel, course, week, stop, skip).await? {
                WeekOutcome::Drained => {}
                WeekOutcome::SessionLost => return Ok(PassOutcome::SessionLost),
                WeekOutcome::Stopped => return Ok(PassOutcome::Stopped),
            }
        }

        self.report_info(&format!("[{}] 所有周次处理完毕!", course.name));
        Ok(PassOutcome::Completed)
    }

    /// 反复处理某一周，直到重扫不再给出可处理的讲次
    async fn drain_week(
        &self,
        channel: &dyn ControlChannel,
        course: &Course,
        week: u32,
        stop: &StopSignal,
        skip: &mut HashSet<String>,
    ) -> ChannelResult<WeekOutcome> {
        // 本遍内已失败的讲次：不再重选，让位给同周后面的讲次。
        // 集合只活在这一次 drain 里，下一遍重扫时失败的讲次会被
        // 自然地重新看到。
        let mut failed: HashSet<String> = HashSet::new();

        loop {
            if stop.is_set() {
                return Ok(WeekOutcome::Stopped);
            }

            // 每一轮都基于当前页面重新派生讲次（活句柄不跨导航）
            let mut items = match self.scanner.uncompleted_by_week(channel, week).await {
                Ok(items) => items,
                Err(e) if e.is_session_invalid() => return Ok(WeekOutcome::SessionLost),
                Err(e) => {
                    // 单周解析故障不拖垮整门课
                    error!("[{}] {} 周次处理出错: {}", course.name, week, e);
                    return Ok(WeekOutcome::Drained);
                }
            };
            items.retain(|item| !skip.contains(&item.title) && !failed.contains(&item.title));

            let item = match items.into_iter().next() {
                Some(item) => item,
                None => return Ok(WeekOutcome::Drained),
            };

            self.report_info(&format!(
                "[{}] {} 周次 - {} 开始观看",
                course.name, week, item.title
            ));

            let outcome = self.watcher.watch(channel, &item, stop).await;

            // 回到列表页刷新完成标记
            match channel.navigate(&course.url).await {
                Ok(()) => {}
                Err(e) if e.is_session_invalid() => return Ok(WeekOutcome::SessionLost),
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.post_navigation_delay).await;

            match outcome {
                WatchOutcome::Completed => {}
                WatchOutcome::Unavailable => {
                    self.report_info(&format!(
                        "[{}] {} - 无法阅览，本次运行内跳过。",
                        course.name, item.title
                    ));
                    skip.insert(item.title);
                }
                WatchOutcome::SessionLost => return Ok(WeekOutcome::SessionLost),
                WatchOutcome::Stopped => return Ok(WeekOutcome::Stopped),
                WatchOutcome::Failed => {
                    // 瞬态失败：本遍不再重选这一讲，否则一个打不开的
                    // 播放器会把整周的循环钉死；下一遍重扫时再试
                    failed.insert(item.title);
                }
            }
        }
    }

    fn report_info(&self, msg: &str) {
        info!("{}", msg);
        self.sink.log(SinkLevel::Info, msg);
    }
}

/// 单周循环的出口
enum WeekOutcome {
    Drained,
    SessionLost,
    Stopped,
}
