//! 课程/周次扫描服务 - 业务能力层
//!
//! 从选课列表解析课程，从出席状态表解析某一周的未完成讲次。
//! 讲次句柄是当页活句柄，每次调用都基于当前页面重新派生，
//! 调用方不得把返回的句柄带过任何一次导航。
//!
//! 平台把完成状态编码为两个字面记号：`O`（已出席）和
//! `X`（缺席豁免）。其余任何文本（进行中、空白）都算未完成。

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{ChannelError, ChannelResult};
use crate::infrastructure::channel::{
    wait_for_element, ControlChannel, ElementHandle, Locator,
};
use crate::models::{Course, LectureItem};

/// 课程表容器
const COURSE_TABLE_CLASS: &str = "table-coursemos";
/// 选课列表的行
const COURSE_ROW_CSS: &str = "table.table-coursemos tbody tr";
/// 行内的课程名链接
const COURSE_NAME_CSS: &str = "td.col-name a";

/// 完成标记：出席
const MARKER_PRESENT: &str = "O";
/// 完成标记：缺席豁免
const MARKER_EXCUSED: &str = "X";

/// 课程/周次扫描服务
pub struct CourseScanner {
    course_index_url: String,
    attendance_url_template: String,
    week_count: u32,
    wait_timeout: std::time::Duration,
}

impl CourseScanner {
    pub fn new(config: &Config) -> Self {
        Self {
            course_index_url: config.course_index_url.clone(),
            attendance_url_template: config.attendance_url_template.clone(),
            week_count: config.week_count,
            wait_timeout: config.wait_timeout,
        }
    }

    pub fn week_count(&self) -> u32 {
        self.week_count
    }

    /// 枚举已注册课程（课程名 + 出席状态页 URL）
    ///
    /// 单行解析失败只跳过那一行，不影响其他课程。
    pub async fn course_list(&self, channel: &dyn ControlChannel) -> ChannelResult<Vec<Course>> {
        channel.navigate(&self.course_index_url).await?;
        wait_for_element(
            channel,
            &Locator::class_name(COURSE_TABLE_CLASS),
            self.wait_timeout,
        )
        .await?;

        let rows = channel.find_all(&Locator::css(COURSE_ROW_CSS)).await?;
        let mut courses = Vec::new();

        for row in &rows {
            match self.parse_course_row(channel, row).await {
                Ok(Some(course)) => courses.push(course),
                Ok(None) => {}
                Err(e) if e.is_session_invalid() => return Err(e),
                Err(e) => {
                    debug!("课程行解析失败，跳过: {}", e);
                }
            }
        }

        info!("✓ 找到 {} 门已注册课程", courses.len());
        Ok(courses)
    }

    async fn parse_course_row(
        &self,
        channel: &dyn ControlChannel,
        row: &ElementHandle,
    ) -> ChannelResult<Option<Course>> {
        if let Some(class) = channel.attr(row, "class").await? {
            // 占位行没有课程数据
            if class.contains("emptyrow") {
                return Ok(None);
            }
        }

        let name_cell = channel.find_in(row, &Locator::css(COURSE_NAME_CSS)).await?;
        let name = channel.text(&name_cell).await?.trim().to_string();
        let link = match channel.attr(&name_cell, "href").await? {
            Some(link) => link,
            None => return Ok(None),
        };

        // 课程 id 藏在链接的 id= 查询参数里
        let course_id = match link.split("id=").last() {
            Some(id) if link.contains("id=") => id.to_string(),
            _ => return Ok(None),
        };

        let url = self
            .attendance_url_template
            .replace("{id}", &course_id);
        Ok(Some(Course::new(name, url)))
    }

    /// 解析某一周的未完成讲次
    ///
    /// 周分组在表格里用 rowspan 折叠：主行的标题在第 2 列、
    /// 出席标记在第 6 列；后续行少了周次那一格，标题在第 1 列、
    /// 标记在第 5 列。找不到周次单元格是常态（该周没有讲次），
    /// 返回空列表而不是错误。
    pub async fn uncompleted_by_week(
        &self,
        channel: &dyn ControlChannel,
        week: u32,
    ) -> ChannelResult<Vec<LectureItem>> {
        let week_cell_xpath = format!(
            "//table[contains(@class, 'table-coursemos')]//td[normalize-space(text())='{}']",
            week
        );

        let week_cell = match channel.find(&Locator::xpath(week_cell_xpath)).await {
            Ok(cell) => cell,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut row = channel
            .find_in(&week_cell, &Locator::xpath("./parent::tr"))
            .await?;

        let rowspan = channel
            .attr(&week_cell, "rowspan")
            .await?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let mut items = Vec::new();

        // 主行：标题第 2 列 / 标记第 6 列
        self.collect_row_item(channel, &row, week, "./td[2]//a", "./td[6]", &mut items)
            .await?;

        // 后续行：标题第 1 列 / 标记第 5 列
        for _ in 1..rowspan {
            row = match channel
                .find_in(&row, &Locator::xpath("./following-sibling::tr[1]"))
                .await
            {
                Ok(next) => next,
                Err(e) if e.is_not_found() => break,
                Err(e) => return Err(e),
            };
            self.collect_row_item(channel, &row, week, "./td[1]//a", "./td[5]", &mut items)
                .await?;
        }

        Ok(items)
    }

    /// 读一行的标题与出席标记；行内缺元素视为"这行没有讲次"
    async fn collect_row_item(
        &self,
        channel: &dyn ControlChannel,
        row: &ElementHandle,
        week: u32,
        title_xpath: &str,
        status_xpath: &str,
        items: &mut Vec<LectureItem>,
    ) -> ChannelResult<()> {
        let parsed = async {
            let title_el = channel.find_in(row, &Locator::xpath(title_xpath)).await?;
            let status_el = channel.find_in(row, &Locator::xpath(status_xpath)).await?;
            let status = channel.text(&status_el).await?.trim().to_string();
            let title = channel.text(&title_el).await?.trim().to_string();
            Ok::<_, ChannelError>((title_el, title, status))
        }
        .await;

        match parsed {
            Ok((handle, title, status)) => {
                if status != MARKER_PRESENT && status != MARKER_EXCUSED {
                    items.push(LectureItem {
                        week,
                        title,
                        handle,
                    });
                }
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) if e.is_session_invalid() => Err(e),
            Err(e) => {
                // 版面异动等意外故障按"该行无讲次"处理，只记日志
                error!("讲次行解析出错: {}", e);
                Ok(())
            }
        }
    }

    /// 扫描全部课程并标注未完成数量/周次
    pub async fn scan_courses(&self, channel: &dyn ControlChannel) -> ChannelResult<Vec<Course>> {
        let course_list = self.course_list(channel).await?;
        let mut detailed = Vec::new();

        for mut course in course_list {
            info!("正在扫描 {} ...", course.name);
            channel.navigate(&course.url).await?;

            for week in 1..=self.week_count {
                let lectures = self.uncompleted_by_week(channel, week).await?;
                if !lectures.is_empty() {
                    course.uncompleted_count += lectures.len();
                    course.uncompleted_weeks.push(week.to_string());
                }
            }
            detailed.push(course);
        }

        Ok(detailed)
    }
}
