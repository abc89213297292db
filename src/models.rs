use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Admin" => Role::Admin,
            "User" => Role::User,
            _ => Role::Other(value),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("Admin"),
            Role::User => f.write_str("User"),
            Role::Other(role) => f.write_str(role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Employee {
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Email", default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "Department", default, deserialize_with = "lenient_string")]
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskDefinition {
    #[serde(rename = "Task ID", default, deserialize_with = "lenient_string")]
    pub task_id: String,
    #[serde(rename = "Task Name", default, deserialize_with = "lenient_string")]
    pub task_name: String,
    #[serde(rename = "Description", default, deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    OnTime,
    Late,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::OnTime => "On Time",
            TaskStatus::Late => "Late",
            TaskStatus::Other(status) => status,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => TaskStatus::Pending,
            "On Time" => TaskStatus::OnTime,
            "Late" => TaskStatus::Late,
            _ => TaskStatus::Other(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

/// One assigned task instance as returned by `getUserTasks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserTask {
    #[serde(rename = "Task", default, deserialize_with = "lenient_string")]
    pub task: String,
    #[serde(rename = "Planned Date", default, deserialize_with = "lenient_string")]
    pub planned_date: String,
    #[serde(rename = "Assigned To", default, deserialize_with = "lenient_string")]
    pub assigned_to: String,
    #[serde(rename = "Status", default)]
    pub status: TaskStatus,
    #[serde(rename = "Task ID", default, deserialize_with = "lenient_string")]
    pub task_id: String,
}

/// Per-user counters from `getStatsAll`. Missing counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub on_time: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub late: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredStat {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub on_time: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub late: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub pending: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub percent: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub level: String,
}

/// Personal performance from `getMyPerformance`.
///
/// The backend has shipped the target under both `targetPercent` and
/// `target`; `target_percent` is the canonical field and prefers
/// `targetPercent` when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPerformance", rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total: u64,
    pub on_time: u64,
    pub late: u64,
    pub pending: u64,
    pub target_percent: f64,
    pub achieved: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerformance {
    #[serde(default, deserialize_with = "lenient_count")]
    total: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    on_time: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    late: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pending: u64,
    #[serde(default, deserialize_with = "lenient_optional_number")]
    target_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_number")]
    target: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    achieved: f64,
}

impl From<RawPerformance> for PerformanceSummary {
    fn from(raw: RawPerformance) -> Self {
        PerformanceSummary {
            total: raw.total,
            on_time: raw.on_time,
            late: raw.late,
            pending: raw.pending,
            target_percent: raw.target_percent.or(raw.target).unwrap_or(0.0),
            achieved: raw.achieved,
        }
    }
}

/// Optional filters for `getFilteredStats`. Blank values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsFilter {
    pub department: Option<String>,
    pub level: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl StatsFilter {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        [
            ("department", &self.department),
            ("level", &self.level),
            ("from", &self.from),
            ("to", &self.to),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.to_string()))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.params().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    pub name: String,
    pub email: String,
    pub department: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentForm {
    pub task: String,
    pub assigned_to: String,
    pub recurrence: String,
    pub start_date: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn parse_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim();
            trimmed.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn lenient_optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_number(&value))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_number(deserializer)?.unwrap_or(0.0))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = lenient_number(deserializer)?;
    Ok(if number.is_finite() && number > 0.0 {
        number.round() as u64
    } else {
        0
    })
}
