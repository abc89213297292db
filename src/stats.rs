use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::models::{Employee, PerformanceSummary, StatsSummary, TaskStatus};

pub const DEFAULT_CARD_CLASS: &str = "card-default";

/// Totals across every per-user summary. Plain summation, so order does not
/// matter and an empty list yields zeros.
pub fn aggregate(summaries: &[StatsSummary]) -> StatsSummary {
    summaries
        .iter()
        .fold(StatsSummary::default(), |acc, user| StatsSummary {
            total: acc.total + user.total,
            on_time: acc.on_time + user.on_time,
            late: acc.late + user.late,
            pending: acc.pending + user.pending,
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Distinct departments, case-insensitively, sorted by their lowercase form.
/// The first spelling seen becomes the label.
pub fn department_options(employees: &[Employee]) -> Vec<SelectOption> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for employee in employees {
        let department = employee.department.trim();
        if department.is_empty() {
            continue;
        }
        seen.entry(department.to_lowercase())
            .or_insert_with(|| department.to_string());
    }

    let mut options: Vec<SelectOption> = seen
        .into_iter()
        .map(|(value, label)| SelectOption { value, label })
        .collect();
    options.sort_by(|a, b| a.value.cmp(&b.value));
    options
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetStatus {
    Achieved,
    Below,
}

impl TargetStatus {
    pub fn label(self) -> &'static str {
        match self {
            TargetStatus::Achieved => "Target Achieved!",
            TargetStatus::Below => "Below Target",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            TargetStatus::Achieved => "status-on-time",
            TargetStatus::Below => "status-late",
        }
    }
}

pub fn target_status(performance: &PerformanceSummary) -> TargetStatus {
    if performance.achieved >= performance.target_percent {
        TargetStatus::Achieved
    } else {
        TargetStatus::Below
    }
}

pub fn status_class(status: &TaskStatus) -> &'static str {
    match status {
        TaskStatus::OnTime => "status-on-time",
        TaskStatus::Late => "status-late",
        _ => "status-pending",
    }
}

/// Local part of an email address.
pub fn short_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Card color class for an assignee, keyed by lowercase email.
pub fn card_class<'a>(email: &str, classes: &'a HashMap<String, String>) -> &'a str {
    classes
        .get(&email.trim().to_lowercase())
        .map(String::as_str)
        .unwrap_or(DEFAULT_CARD_CLASS)
}

/// Formats a planned date as `dd-Mon-yyyy`. Values that are neither RFC 3339
/// timestamps nor `YYYY-MM-DD` dates are returned unchanged.
pub fn format_planned_date(raw: &str) -> String {
    match parse_planned_date(raw) {
        Some(date) => date.format("%d-%b-%Y").to_string(),
        None => raw.trim().to_string(),
    }
}

pub fn parse_planned_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok())
}

/// Whether a planned date given on the command line names `raw`.
pub fn same_planned_date(raw: &str, given: &str) -> bool {
    if raw.trim() == given.trim() {
        return true;
    }
    match (parse_planned_date(raw), parse_planned_date(given)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
