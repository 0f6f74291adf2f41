//! Plain-text rendering of a [`ViewState`].

use chrono::{DateTime, Datelike, Local, TimeZone};
use std::fmt::Write;

use crate::providers::{display_name, CloudType};
use crate::view::{
    parse_timestamp, HealthIndicator, NoticeLevel, SortDirection, SortKey, ViewState,
};

const WELCOME: &str = "欢迎使用网盘资源搜索：输入关键词即可搜索百度网盘、阿里云盘、夸克网盘、迅雷云盘等12种网盘资源";

/// `YYYY/M/D` in the local time zone, or the raw string when it cannot be
/// parsed.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| format!("{}/{}/{}", dt.year(), dt.month(), dt.day()))
        .unwrap_or_else(|| raw.to_string())
}

pub fn health_line(health: &HealthIndicator) -> String {
    match health {
        HealthIndicator::Checking => "● 检查中...".to_string(),
        HealthIndicator::Ok(msg) => format!("● {msg}"),
        HealthIndicator::Unknown(msg) => format!("○ 状态未知 - {msg}"),
        HealthIndicator::Error(msg) => format!("✕ {msg}"),
    }
}

pub fn selector_line(state: &ViewState) -> String {
    let toggle = if state.selection.is_all() { "取消全选" } else { "全选" };
    let mut line = format!(
        "网盘类型: [{toggle}] (已选择 {}/{})",
        state.selection.len(),
        CloudType::ALL.len()
    );
    for t in CloudType::ALL {
        let mark = if state.selection.contains(t) { "x" } else { " " };
        let _ = write!(line, " [{mark}]{}({})", t.name(), t.id());
    }
    line
}

fn sort_button(label: &str, key: SortKey, state: &ViewState) -> String {
    if state.sort_key != key {
        return label.to_string();
    }
    let arrow = match state.sort_direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    format!("[{label}{arrow}]")
}

pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", health_line(&state.health));
    let _ = writeln!(out, "{}", selector_line(state));

    if let Some(err) = &state.error {
        let _ = writeln!(out, "! {err}");
    }
    if let Some(notice) = &state.notice {
        let tag = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✕",
        };
        match &notice.description {
            Some(desc) => {
                let _ = writeln!(out, "{tag} {}: {desc}", notice.title);
            }
            None => {
                let _ = writeln!(out, "{tag} {}", notice.title);
            }
        }
    }
    if state.loading {
        let _ = writeln!(out, "搜索中...");
    }

    let Some(results) = &state.results else {
        if !state.loading {
            let _ = writeln!(out, "{WELCOME}");
        }
        return out;
    };

    let _ = writeln!(out, "共找到 {} 条结果", results.total);
    if results.is_empty() {
        let _ = writeln!(out, "未找到相关资源");
        let _ = writeln!(out, "尝试使用其他关键词进行搜索");
        return out;
    }

    let all_tab = format!("全部 ({})", results.merged_by_type.len());
    let mut tabs = vec![if state.active_tab.is_none() {
        format!("[{all_tab}]")
    } else {
        all_tab
    }];
    for group in &results.merged_by_type {
        let tab = format!("{} ({})", display_name(&group.provider), group.items.len());
        if state.active_tab.as_deref() == Some(group.provider.as_str()) {
            tabs.push(format!("[{tab}]"));
        } else {
            tabs.push(tab);
        }
    }
    let _ = writeln!(out, "{}", tabs.join(" "));
    let _ = writeln!(
        out,
        "排序: {} {}",
        sort_button("按时间", SortKey::Datetime, state),
        sort_button("按名称", SortKey::Name, state)
    );

    let mut index = 0;
    for group in state.visible_groups() {
        let _ = writeln!(
            out,
            "\n{} ({} 个资源)",
            display_name(group.provider),
            group.items.len()
        );
        for item in &group.items {
            let _ = writeln!(out, "  #{index} {}  {}", item.note, format_date(&item.datetime));
            if let Some(password) = &item.password {
                let _ = writeln!(out, "     提取码: {password}");
            }
            let _ = writeln!(out, "     {}", item.url);
            index += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SearchOutcome;
    use crate::types::SearchEnvelope;
    use crate::view::Message;

    fn searched(body: serde_json::Value) -> ViewState {
        let mut state = ViewState::new();
        let results = SearchEnvelope::decode(body).unwrap();
        state.update(Message::SearchFinished(Ok(SearchOutcome::Found(results))));
        state
    }

    #[test]
    fn dates_render_in_local_zone() {
        let raw = "2024-01-01T02:00:00+08:00";
        let local = DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Local);
        assert_eq!(
            format_date(raw),
            format!("{}/{}/{}", local.year(), local.month(), local.day())
        );
    }

    #[test]
    fn dates_render_without_padding() {
        // Mid-month, so no zone offset can change the year or month.
        let shown = format_date("2024-03-15T12:00:00Z");
        assert!(shown.starts_with("2024/3/1"), "{shown}");
        assert!(!shown.contains("/0"), "{shown}");
        assert_eq!(format_date("sometime"), "sometime");
    }

    #[test]
    fn welcome_before_first_search() {
        let out = render(&ViewState::new());
        assert!(out.contains(WELCOME));
        assert!(out.contains("(已选择 12/12)"));
        assert!(out.contains("[取消全选]"));
    }

    #[test]
    fn empty_result_map_shows_not_found() {
        let out = render(&searched(serde_json::json!({"total": 0, "merged_by_type": {}})));
        assert!(out.contains("共找到 0 条结果"));
        assert!(out.contains("未找到相关资源"));
    }

    #[test]
    fn unknown_provider_keeps_raw_key() {
        let out = render(&searched(serde_json::json!({
            "total": 1,
            "merged_by_type": {"weiyun": [{"note": "doc", "url": "http://w", "password": "1234", "datetime": "2024-06-01"}]}
        })));
        assert!(out.contains("[全部 (1)] weiyun (1)"));
        assert!(out.contains("weiyun (1 个资源)"));
        assert!(out.contains("提取码: 1234"));
    }
}
