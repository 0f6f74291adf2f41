//! Result presentation state.
//!
//! All state lives in [`ViewState`] and changes only through
//! [`ViewState::update`], one [`Message`] at a time. Anything that needs the
//! outside world (network, clipboard) is handed back to the driver as an
//! [`Effect`]; its outcome comes back in as another message.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::client::{HealthReport, SearchOutcome};
use crate::providers::CloudType;
use crate::types::{ProviderGroup, SearchQuery, SearchResultItem, SearchResultSet};

pub const MSG_EMPTY_KEYWORD: &str = "请输入搜索关键词";
pub const MSG_BAD_PARAMS: &str = "参数错误：关键词不能为空";
pub const MSG_RATE_LIMITED: &str = "请求过于频繁，请稍后再试";
pub const MSG_SEARCH_ERROR: &str = "搜索出错，请稍后重试";
pub const MSG_NETWORK_ERROR: &str = "网络错误，请检查连接后重试";
pub const MSG_UNREACHABLE: &str = "无法连接到服务";
pub const MSG_COPY_FAILED: &str = "复制失败，请手动复制";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Datetime,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Milliseconds since the epoch. Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn compare(a: &SearchResultItem, b: &SearchResultItem, key: SortKey) -> Ordering {
    match key {
        // Unparsable timestamps (None) order before every real one.
        SortKey::Datetime => parse_timestamp(&a.datetime).cmp(&parse_timestamp(&b.datetime)),
        SortKey::Name => a.note.to_lowercase().cmp(&b.note.to_lowercase()),
    }
}

/// Sorted copy of `items`; the input is left untouched. Equal elements keep
/// their relative order.
pub fn sort_items(
    items: &[SearchResultItem],
    key: SortKey,
    direction: SortDirection,
) -> Vec<SearchResultItem> {
    let mut sorted = items.to_vec();
    match direction {
        SortDirection::Asc => sorted.sort_by(|a, b| compare(a, b, key)),
        SortDirection::Desc => sorted.sort_by(|a, b| compare(b, a, key)),
    }
    sorted
}

/// Providers the user wants results from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<CloudType>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

impl Selection {
    pub fn all() -> Self {
        Self {
            selected: CloudType::ALL.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }

    pub fn toggle(&mut self, cloud_type: CloudType) {
        if !self.selected.remove(&cloud_type) {
            self.selected.insert(cloud_type);
        }
    }

    pub fn toggle_all(&mut self) {
        *self = if self.is_all() { Self::none() } else { Self::all() };
    }

    pub fn is_all(&self) -> bool {
        self.selected.len() == CloudType::ALL.len()
    }

    pub fn contains(&self, cloud_type: CloudType) -> bool {
        self.selected.contains(&cloud_type)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// The `cloud_types` request field: omitted when every provider is
    /// selected, otherwise the ids in table order.
    pub fn to_filter(&self) -> Option<Vec<String>> {
        if self.is_all() {
            return None;
        }
        Some(self.selected.iter().map(|t| t.id().to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthIndicator {
    Checking,
    Ok(String),
    Unknown(String),
    Error(String),
}

impl From<HealthReport> for HealthIndicator {
    fn from(report: HealthReport) -> Self {
        match report {
            HealthReport::Healthy { plugin_count } => HealthIndicator::Ok(format!(
                "服务正常运行 - {} 个插件可用",
                plugin_count.map_or_else(|| "未知".to_string(), |n| n.to_string())
            )),
            HealthReport::Unknown { message } => HealthIndicator::Unknown(message),
            HealthReport::Failing(status) => HealthIndicator::Error(format!("服务异常 - {status}")),
            HealthReport::Unreachable => HealthIndicator::Error(MSG_UNREACHABLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, dismissible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    fn success(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description,
        }
    }

    fn error(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Url,
    Password,
}

impl CopyTarget {
    pub fn label(self) -> &'static str {
        match self {
            CopyTarget::Url => "链接",
            CopyTarget::Password => "提取码",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    QueryChanged(String),
    Submit,
    ToggleProvider(CloudType),
    ToggleAll,
    /// `None` shows every provider.
    SelectTab(Option<String>),
    SortBy(SortKey),
    SearchFinished(Result<SearchOutcome, String>),
    HealthTick,
    HealthChecked(HealthReport),
    /// Index into the rendered, flattened item list.
    CopyUrl(usize),
    CopyPassword(usize),
    Copied { what: CopyTarget, ok: bool },
    DismissNotice,
}

/// Work the driver has to carry out after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Search(SearchQuery),
    CheckHealth,
    Copy { text: String, what: CopyTarget },
}

/// One rendered provider section.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleGroup<'a> {
    pub provider: &'a str,
    pub items: Vec<SearchResultItem>,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub query: String,
    pub selection: Selection,
    pub results: Option<SearchResultSet>,
    pub active_tab: Option<String>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub error: Option<String>,
    pub loading: bool,
    pub health: HealthIndicator,
    pub notice: Option<Notice>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            selection: Selection::all(),
            results: None,
            active_tab: None,
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            error: None,
            loading: false,
            health: HealthIndicator::Checking,
            notice: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, message: Message) -> Effect {
        match message {
            Message::QueryChanged(query) => {
                self.query = query;
                Effect::None
            }

            Message::Submit => self.submit(),

            Message::ToggleProvider(cloud_type) => {
                self.selection.toggle(cloud_type);
                Effect::None
            }

            Message::ToggleAll => {
                self.selection.toggle_all();
                Effect::None
            }

            Message::SelectTab(tab) => {
                self.active_tab = tab;
                Effect::None
            }

            Message::SortBy(key) => {
                if self.sort_key == key {
                    self.sort_direction = self.sort_direction.flip();
                } else {
                    self.sort_key = key;
                    self.sort_direction = SortDirection::Desc;
                }
                Effect::None
            }

            Message::SearchFinished(outcome) => {
                self.finish_search(outcome);
                Effect::None
            }

            Message::HealthTick => {
                self.health = HealthIndicator::Checking;
                Effect::CheckHealth
            }

            Message::HealthChecked(report) => {
                self.health = report.into();
                Effect::None
            }

            Message::CopyUrl(index) => match self.visible_item(index) {
                Some(item) => Effect::Copy {
                    text: item.url,
                    what: CopyTarget::Url,
                },
                None => Effect::None,
            },

            Message::CopyPassword(index) => match self.visible_item(index).and_then(|i| i.password) {
                Some(password) => Effect::Copy {
                    text: password,
                    what: CopyTarget::Password,
                },
                None => Effect::None,
            },

            Message::Copied { what, ok } => {
                self.notice = Some(if ok {
                    Notice::success(format!("{}已复制到剪贴板", what.label()), None)
                } else {
                    Notice::error(MSG_COPY_FAILED, None)
                });
                Effect::None
            }

            Message::DismissNotice => {
                self.notice = None;
                Effect::None
            }
        }
    }

    fn submit(&mut self) -> Effect {
        if self.query.trim().is_empty() {
            self.error = Some(MSG_EMPTY_KEYWORD.to_string());
            return Effect::None;
        }

        self.loading = true;
        self.error = None;
        self.active_tab = None;
        self.notice = None;

        Effect::Search(SearchQuery::new(self.query.clone()).with_cloud_types(self.selection.to_filter()))
    }

    // Responses apply in arrival order; a late answer to an older query
    // replaces a newer one.
    fn finish_search(&mut self, outcome: Result<SearchOutcome, String>) {
        self.loading = false;
        match outcome {
            Ok(SearchOutcome::Found(results)) => {
                self.notice = Some(Notice::success(
                    "搜索完成",
                    Some(format!("找到 {} 条结果", results.total)),
                ));
                self.results = Some(results);
            }
            Ok(SearchOutcome::Rejected(status)) => {
                let (inline, description) = match status {
                    400 => (MSG_BAD_PARAMS.to_string(), MSG_BAD_PARAMS.to_string()),
                    429 => (MSG_RATE_LIMITED.to_string(), MSG_RATE_LIMITED.to_string()),
                    other => (format!("搜索失败: {other}"), format!("HTTP错误: {other}")),
                };
                self.error = Some(inline);
                self.notice = Some(Notice::error("搜索失败", Some(description)));
            }
            Err(_) => {
                self.error = Some(MSG_SEARCH_ERROR.to_string());
                self.notice = Some(Notice::error("搜索失败", Some(MSG_NETWORK_ERROR.to_string())));
            }
        }
    }

    /// Provider sections for the active tab, each sorted by the current key.
    pub fn visible_groups(&self) -> Vec<VisibleGroup<'_>> {
        let Some(results) = &self.results else {
            return Vec::new();
        };
        let groups: Vec<&ProviderGroup> = match self.active_tab.as_deref() {
            None => results.merged_by_type.iter().collect(),
            Some(tab) => results.group(tab).into_iter().collect(),
        };
        groups
            .into_iter()
            .map(|g| VisibleGroup {
                provider: &g.provider,
                items: sort_items(&g.items, self.sort_key, self.sort_direction),
            })
            .collect()
    }

    fn visible_item(&self, index: usize) -> Option<SearchResultItem> {
        self.visible_groups()
            .into_iter()
            .flat_map(|g| g.items)
            .nth(index)
    }
}
