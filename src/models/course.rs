//! 课程记录

/// 一门已注册的课程
///
/// 扫描阶段创建，之后只读。未完成数量/周次是扫描时的快照，
/// 运行过程中的进度记账由上层自己维护，不回写到这条记录上。
#[derive(Clone, Debug)]
pub struct Course {
    /// 课程名
    pub name: String,
    /// 出席状态（课程内容列表）页面 URL
    pub url: String,
    /// 扫描时的未完成讲次数量
    pub uncompleted_count: usize,
    /// 存在未完成讲次的周次标签
    pub uncompleted_weeks: Vec<String>,
}

impl Course {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            uncompleted_count: 0,
            uncompleted_weeks: Vec::new(),
        }
    }
}
