//! 程序配置
//!
//! 与教学平台交互所需的全部 URL 与时间参数。凭据本身不在配置里
//! 持久化，只在一次运行期间从环境变量读取。

use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::models::Credentials;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 登录页面 URL
    pub login_url: String,
    /// 选课列表（已注册课程）页面 URL
    pub course_index_url: String,
    /// 单门课程出席状态页面 URL 模板（`{id}` 占位）
    pub attendance_url_template: String,
    /// WebDriver 服务端地址
    pub webdriver_url: String,
    /// 一学期的周数
    pub week_count: u32,
    /// 页面/元素等待上限
    pub wait_timeout: Duration,
    /// 页面加载超时
    pub page_load_timeout: Duration,
    /// 播放状态轮询间隔
    pub poll_interval: Duration,
    /// 单个视频的播放时长硬上限（防止卡死的播放器把循环拖垮）
    pub playback_ceiling: Duration,
    /// 每次回到课程列表页后的缓冲等待
    pub post_navigation_delay: Duration,
    /// 会话恢复时的登录尝试预算（整门课共 3 次）
    pub max_login_attempts: u32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 是否启用无头模式
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: "https://learn.hoseo.ac.kr/login/index.php".to_string(),
            course_index_url: "https://learn.hoseo.ac.kr/local/ubion/user/index.php"
                .to_string(),
            attendance_url_template:
                "https://learn.hoseo.ac.kr/local/ubonattend/my_status.php?id={id}".to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            week_count: 15,
            wait_timeout: Duration::from_secs(30),
            page_load_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
            playback_ceiling: Duration::from_secs(3600),
            post_navigation_delay: Duration::from_secs(2),
            max_login_attempts: 3,
            verbose_logging: false,
            headless: true,
        }
    }
}

impl Config {
    /// 从环境变量加载配置（缺省值见 `Default`）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            login_url: std::env::var("HOSEO_LOGIN_URL").unwrap_or(default.login_url),
            course_index_url: std::env::var("HOSEO_COURSE_INDEX_URL")
                .unwrap_or(default.course_index_url),
            attendance_url_template: std::env::var("HOSEO_ATTENDANCE_URL_TEMPLATE")
                .unwrap_or(default.attendance_url_template),
            webdriver_url: std::env::var("WEBDRIVER_URL").unwrap_or(default.webdriver_url),
            week_count: env_parse("HOSEO_WEEK_COUNT", default.week_count),
            wait_timeout: env_secs("HOSEO_WAIT_TIMEOUT_SECS", default.wait_timeout),
            page_load_timeout: env_secs("HOSEO_PAGE_LOAD_TIMEOUT_SECS", default.page_load_timeout),
            poll_interval: env_secs("HOSEO_POLL_INTERVAL_SECS", default.poll_interval),
            playback_ceiling: env_secs("HOSEO_PLAYBACK_CEILING_SECS", default.playback_ceiling),
            post_navigation_delay: env_secs(
                "HOSEO_POST_NAVIGATION_DELAY_SECS",
                default.post_navigation_delay,
            ),
            max_login_attempts: env_parse("HOSEO_MAX_LOGIN_ATTEMPTS", default.max_login_attempts),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
            headless: env_parse("HOSEO_HEADLESS", default.headless),
        }
    }
}

/// 凭据只从环境变量读取，不落盘
///
/// 加密凭据存储属于外部嵌入方，不在本引擎范围内。
pub fn credentials_from_env() -> AppResult<Credentials> {
    let user_id = std::env::var("HOSEO_USER_ID")
        .map_err(|_| AppError::Config("环境变量 HOSEO_USER_ID 不存在".to_string()))?;
    let password = std::env::var("HOSEO_PASSWORD")
        .map_err(|_| AppError::Config("环境变量 HOSEO_PASSWORD 不存在".to_string()))?;
    Ok(Credentials { user_id, password })
}

/// 课程选择的持久化（不含任何凭据）
///
/// 保存上一次运行勾选的课程名列表，便于下次只跑同一批课。
pub mod selection {
    use std::fs;
    use std::path::PathBuf;

    use serde::{Deserialize, Serialize};
    use tracing::debug;

    use crate::error::AppResult;

    /// 选择文件的磁盘格式
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct SavedSelection {
        selected_courses: Vec<String>,
    }

    fn config_dir() -> PathBuf {
        let base = if cfg!(windows) {
            std::env::var("APPDATA").map(PathBuf::from).unwrap_or_default()
        } else {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".hoseo_macro"))
                .unwrap_or_default()
        };
        if cfg!(windows) {
            base.join("HoseoMacro")
        } else {
            base
        }
    }

    fn selection_path() -> PathBuf {
        config_dir().join("selected_courses.json")
    }

    /// 读取已保存的课程名列表；文件不存在或损坏都视为"没有选择"
    pub fn load() -> Option<Vec<String>> {
        let path = selection_path();
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<SavedSelection>(&content) {
            Ok(saved) => Some(saved.selected_courses),
            Err(e) => {
                debug!("课程选择文件解析失败 ({}): {}", path.display(), e);
                None
            }
        }
    }

    /// 保存课程名列表
    pub fn save(names: &[String]) -> AppResult<()> {
        let dir = config_dir();
        fs::create_dir_all(&dir)?;
        let saved = SavedSelection {
            selected_courses: names.to_vec(),
        };
        let content = serde_json::to_string_pretty(&saved)?;
        fs::write(selection_path(), content)?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_url_template_substitution() {
        let config = Config::default();
        assert_eq!(
            config.attendance_url_template.replace("{id}", "12345"),
            "https://learn.hoseo.ac.kr/local/ubonattend/my_status.php?id=12345"
        );
    }

    #[test]
    fn test_default_week_count() {
        // 平台学期固定 15 周
        assert_eq!(Config::default().week_count, 15);
    }
}
