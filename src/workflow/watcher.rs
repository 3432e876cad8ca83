//! 讲次观看流程 - 流程层
//!
//! 驱动单个讲次从点击打开到播放完成，产出一个分类结果。
//!
//! 状态机：
//! 1. 打开：点击讲次链接，等第二个窗口出现
//! 2. 弹窗：读取并接受插页弹窗，"열람이 불가능합니다" 意味着
//!    这一讲被平台限制阅览，立即判定 `Unavailable`
//! 3. 起播：定位 video 元素，点大播放键（若可见），再直接 play()
//! 4. 轮询：固定间隔读 ended/currentTime/duration 直到结束、
//!    超出硬上限、会话失效或收到停止请求
//! 5. 清理：无论结果如何都关掉多余窗口并切回主窗口（尽力而为）

use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::ChannelError;
use crate::infrastructure::channel::{
    wait_for_element, wait_for_window_count, ControlChannel, Locator,
};
use crate::infrastructure::pacing;
use crate::models::{LectureItem, StopSignal, WatchOutcome};
use crate::services::sink::{SharedSink, SinkLevel};

/// 平台在受限讲次的弹窗里使用的字面标记
const RESTRICTED_ALERT_MARKER: &str = "열람이 불가능합니다";
/// video.js 的大播放按钮
const BIG_PLAY_BUTTON: &str = "vjs-big-play-button";

/// 讲次观看流程
pub struct LectureWatcher {
    sink: SharedSink,
    wait_timeout: std::time::Duration,
    poll_interval: std::time::Duration,
    playback_ceiling: std::time::Duration,
}

impl LectureWatcher {
    pub fn new(config: &Config, sink: SharedSink) -> Self {
        Self {
            sink,
            wait_timeout: config.wait_timeout,
            poll_interval: config.poll_interval,
            playback_ceiling: config.playback_ceiling,
        }
    }

    /// 观看一个讲次并给出分类结果
    ///
    /// 通道故障不外泄：会话失效折叠成 `SessionLost`，
    /// 其余故障折叠成 `Failed`，每个终态恰好一条日志。
    pub async fn watch(
        &self,
        channel: &dyn ControlChannel,
        item: &LectureItem,
        stop: &StopSignal,
    ) -> WatchOutcome {
        if stop.is_set() {
            return WatchOutcome::Stopped;
        }

        let main_window = match channel.current_window().await {
            Ok(w) => w,
            Err(e) => return self.classify_fault(&item.title, "读取主窗口", e),
        };

        let outcome = self.drive(channel, item, stop, &main_window).await;

        // 清理始终执行，与结果无关
        self.cleanup(channel, &main_window).await;
        outcome
    }

    /// 步骤 1-4：打开、弹窗、起播、轮询
    async fn drive(
        &self,
        channel: &dyn ControlChannel,
        item: &LectureItem,
        stop: &StopSignal,
        main_window: &str,
    ) -> WatchOutcome {
        let title = &item.title;

        // --- 打开：点击讲次，等待第二个窗口 ---
        pacing::human_like_delay().await;
        if let Err(e) = channel.click(&item.handle).await {
            return self.classify_fault(title, "点击讲次链接", e);
        }

        let windows = match wait_for_window_count(channel, 2, self.wait_timeout).await {
            Ok(w) => w,
            Err(ChannelError::Timeout(_)) => {
                self.report_error(&format!("视频播放器窗口没有打开: {}", title));
                return WatchOutcome::Failed;
            }
            Err(e) => return self.classify_fault(title, "等待播放器窗口", e),
        };

        let player_window = match windows.iter().find(|w| w.as_str() != main_window) {
            Some(w) => w.clone(),
            None => {
                self.report_error(&format!("没有找到播放器窗口: {}", title));
                return WatchOutcome::Failed;
            }
        };
        if let Err(e) = channel.switch_to_window(&player_window).await {
            return self.classify_fault(title, "切换到播放器窗口", e);
        }

        pacing::human_like_delay().await;

        // --- 插页弹窗：受限讲次在这里被判定 ---
        match channel.alert_text().await {
            Ok(text) => {
                if let Err(e) = channel.accept_alert().await {
                    return self.classify_fault(title, "接受弹窗", e);
                }
                if text.contains(RESTRICTED_ALERT_MARKER) {
                    self.report_error(&format!(
                        "讲次无法阅览: {} - 不在修读期间或属于受限讲次",
                        title
                    ));
                    return WatchOutcome::Unavailable;
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return self.classify_fault(title, "读取弹窗", e),
        }

        // --- 起播 ---
        let video = match wait_for_element(channel, &Locator::tag("video"), self.wait_timeout)
            .await
        {
            Ok(v) => v,
            Err(ChannelError::Timeout(_)) => {
                self.report_error(&format!("没有找到视频元素: {}", title));
                return WatchOutcome::Failed;
            }
            Err(e) => return self.classify_fault(title, "定位视频元素", e),
        };

        match channel.find(&Locator::class_name(BIG_PLAY_BUTTON)).await {
            Ok(play_button) => {
                if channel.is_displayed(&play_button).await.unwrap_or(false) {
                    pacing::click_delay().await;
                    if let Err(e) = channel.click(&play_button).await {
                        if e.is_session_invalid() {
                            return self.classify_fault(title, "点击播放按钮", e);
                        }
                        debug!("大播放按钮点击失败，改用脚本起播: {}", e);
                    }
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return self.classify_fault(title, "查找播放按钮", e),
        }

        if let Err(e) = channel.execute_on("arguments[0].play();", &video).await {
            return self.classify_fault(title, "调用 play()", e);
        }
        self.report_info(&format!("开始播放讲次: {}", title));

        // --- 轮询到完成 ---
        let start = Instant::now();
        let mut last_debug = start;

        loop {
            if stop.is_set() {
                self.report_info("收到停止请求，关闭视频窗口。");
                return WatchOutcome::Stopped;
            }

            let state = self.read_playback_state(channel, &video).await;
            let (ended, current, duration) = match state {
                Ok(s) => s,
                Err(e) if e.is_session_invalid() => {
                    self.report_error("会话已失效，中断本讲观看。");
                    return WatchOutcome::SessionLost;
                }
                Err(e) => {
                    self.report_error(&format!("读取播放状态出错: {}", e));
                    return WatchOutcome::Failed;
                }
            };

            if duration > 0.0 {
                self.sink
                    .video_progress(current as u64, duration as u64, title);
            }

            if ended || (duration > 0.0 && current >= duration) {
                self.report_info(&format!("讲次观看完成: {}", title));
                return WatchOutcome::Completed;
            }

            if last_debug.elapsed().as_secs() > 60 {
                debug!(
                    "[{}] 当前进度: {}/{} 秒",
                    title, current as u64, duration as u64
                );
                last_debug = Instant::now();
            }

            if start.elapsed() > self.playback_ceiling {
                self.report_error("超时: 视频播放时间过长，中断观看。");
                return WatchOutcome::Failed;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 读一次 (ended, currentTime, duration)
    async fn read_playback_state(
        &self,
        channel: &dyn ControlChannel,
        video: &crate::infrastructure::channel::ElementHandle,
    ) -> Result<(bool, f64, f64), ChannelError> {
        let ended = channel
            .execute_on("return arguments[0].ended;", video)
            .await?;
        let current = channel
            .execute_on("return arguments[0].currentTime;", video)
            .await?;
        let duration = channel
            .execute_on("return arguments[0].duration;", video)
            .await?;
        Ok((
            json_bool(&ended),
            json_f64(&current),
            json_f64(&duration),
        ))
    }

    /// 步骤 5：尽力而为地收拾窗口
    ///
    /// 这里的会话失效只记日志不上报，清理失败不改变观看结果。
    async fn cleanup(&self, channel: &dyn ControlChannel, main_window: &str) {
        let result: Result<(), ChannelError> = async {
            let windows = channel.window_handles().await?;
            if windows.len() > 1 {
                let current = channel.current_window().await?;
                if current != main_window {
                    channel.close_window().await?;
                }
            }

            let windows = channel.window_handles().await?;
            if windows.iter().any(|w| w == main_window) {
                channel.switch_to_window(main_window).await?;
            } else if let Some(first) = windows.first() {
                channel.switch_to_window(first).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = result {
            if e.is_session_invalid() {
                error!("会话已失效，无法关闭窗口。");
            } else {
                error!("关闭窗口时出错: {}", e);
            }
        }
    }

    /// 把通道故障折叠成观看结果，并产出对应的那一条日志
    fn classify_fault(&self, title: &str, action: &str, e: ChannelError) -> WatchOutcome {
        if e.is_session_invalid() {
            self.report_error(&format!("会话已失效，跳过本讲: {}", title));
            WatchOutcome::SessionLost
        } else {
            self.report_error(&format!("{} 失败 ('{}'): {}", action, title, e));
            WatchOutcome::Failed
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

fn json_bool(v: &JsonValue) -> bool {
    v.as_bool().unwrap_or(false)
}

fn json_f64(v: &JsonValue) -> f64 {
    // duration 在元数据未就绪时是 NaN，序列化成 null
    v.as_f64().unwrap_or(0.0)
}
