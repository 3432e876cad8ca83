use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use hoseo_macro::config::{self, Config};
use hoseo_macro::error::AppError;
use hoseo_macro::infrastructure::channel::ChannelFactory;
use hoseo_macro::models::{Course, StopSignal};
use hoseo_macro::orchestrator::Automation;
use hoseo_macro::services::auth::Authenticator;
use hoseo_macro::services::scanner::CourseScanner;
use hoseo_macro::services::sink::NullSink;
use hoseo_macro::session::Session;
use hoseo_macro::utils::logging;
use hoseo_macro::WebDriverFactory;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（日志级别依赖 verbose 开关，先读配置再初始化日志）
    let config = Config::from_env();
    logging::init_with_verbose(config.verbose_logging);
    info!(
        "🚀 호서 강의 자동시청 시작 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    // 凭据只从环境变量读取
    let credentials = config::credentials_from_env()?;

    // Ctrl-C 置位停止信号，各层在循环顶部自行观测
    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到 Ctrl-C，等待当前等待间隔结束后停止...");
                stop.set();
            }
        });
    }

    // 建立会话并登录
    let factory = Arc::new(WebDriverFactory::new(config.clone()));
    let channel = factory.create().await?;
    let session = Session::new(channel);

    let auth = Authenticator::new(&config);
    if !auth.login(session.channel(), &credentials).await? {
        session.close().await;
        return Err(AppError::Auth("账号或密码被平台拒绝".to_string()).into());
    }

    // 扫描全部课程
    info!("📁 正在扫描已注册课程...");
    let courses = CourseScanner::new(&config)
        .scan_courses(session.channel())
        .await?;
    log_scan_summary(&courses);

    // 选择要处理的课程：环境变量 > 上次保存的选择 > 全部有欠账的课
    let selected = select_courses(&courses);
    if selected.is_empty() {
        warn!("⚠️ 没有需要处理的课程，程序结束");
        session.close().await;
        return Ok(());
    }
    info!("📋 本次将处理 {} 门课程", selected.len());

    // 顺序处理，课程之间传递会话
    let automation = Automation::new(&config, Arc::new(NullSink), factory);
    let session = automation.run(session, &selected, &stop, &credentials).await;

    session.close().await;
    Ok(())
}

fn log_scan_summary(courses: &[Course]) {
    info!("{}", "=".repeat(60));
    info!("📊 扫描结果: 共 {} 门课程", courses.len());
    for course in courses {
        info!(
            "  {} - 未完成 {} 讲 (周次: {})",
            logging::truncate_text(&course.name, 40),
            course.uncompleted_count,
            course.uncompleted_weeks.join(", ")
        );
    }
    info!("{}", "=".repeat(60));
}

/// 决定本次要处理哪些课程
///
/// `HOSEO_COURSES`（逗号分隔课程名）优先并会被保存；其次用上次
/// 保存的选择；都没有时处理所有存在未完成讲次的课程。
fn select_courses(courses: &[Course]) -> Vec<Course> {
    if let Ok(value) = std::env::var("HOSEO_COURSES") {
        let names: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Err(e) = config::selection::save(&names) {
            warn!("保存课程选择失败（忽略）: {}", e);
        }
        return courses
            .iter()
            .filter(|c| names.iter().any(|n| n == &c.name))
            .cloned()
            .collect();
    }

    if let Some(names) = config::selection::load() {
        return courses
            .iter()
            .filter(|c| names.iter().any(|n| n == &c.name))
            .cloned()
            .collect();
    }

    courses
        .iter()
        .filter(|c| c.uncompleted_count > 0)
        .cloned()
        .collect()
}
