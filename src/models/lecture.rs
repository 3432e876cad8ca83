//! 讲次条目与观看结果

use crate::infrastructure::channel::ElementHandle;

/// 一个未完成的讲次（某周内的一个视频单元）
///
/// `handle` 是当前页面加载产出的活句柄，只在这一次页面加载内有效，
/// 绝不能跨导航缓存——每次回到列表页都必须重新派生。
#[derive(Clone, Debug)]
pub struct LectureItem {
    /// 所在周次
    pub week: u32,
    /// 讲次标题（跳过集合的去重键）
    pub title: String,
    /// 可点击表示的活句柄
    pub handle: ElementHandle,
}

/// 单次观看的分类结果
///
/// 每次 Watcher 调用恰好产出一个，产出后不再变更。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchOutcome {
    /// 播放到结束，平台侧完成标记会在下次刷新列表时出现
    Completed,
    /// 平台提示无法阅览，这一讲在本次运行内永久跳过
    Unavailable,
    /// 会话失效，必须交由恢复层重建会话后继续
    SessionLost,
    /// 观测到停止请求后的干净退出
    Stopped,
    /// 瞬态失败（窗口没打开、找不到视频、播放超时等），
    /// 本遍让位给同周后面的讲次，下一遍处理时再试
    Failed,
}
