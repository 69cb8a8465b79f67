use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

pub type TaskId = String;

/// Kanban column a task sits in: 0 Backlog, 1 Todo, 2 In Progress, 3 Done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    pub const BACKLOG: Stage = Stage(0);
    pub const TODO: Stage = Stage(1);
    pub const IN_PROGRESS: Stage = Stage(2);
    pub const DONE: Stage = Stage(3);

    pub const ALL: [Stage; 4] = [Self::BACKLOG, Self::TODO, Self::IN_PROGRESS, Self::DONE];

    pub fn new(value: u8) -> Option<Self> {
        (value <= 3).then_some(Stage(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Next column, or `None` when already in Done.
    pub fn forward(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Previous column, or `None` when already in Backlog.
    pub fn backward(self) -> Option<Self> {
        self.0.checked_sub(1).map(Stage)
    }

    pub fn title(self) -> &'static str {
        match self.0 {
            0 => "Backlog",
            1 => "Todo",
            2 => "In Progress",
            _ => "Done",
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::new(value).ok_or_else(|| format!("stage {value} out of range 0..=3"))
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// "Low", "Medium", "High" for display.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_deadline")]
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub stage: Stage,
    pub user_id: String,
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp such as
/// `2025-03-04T00:00:00.000Z`; timestamps keep the date in their own offset.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
}

fn deserialize_deadline<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_deadline(&raw).ok_or_else(|| de::Error::custom(format!("invalid deadline '{raw}'")))
}

impl Task {
    /// e.g. "March 4, 2025".
    pub fn formatted_deadline(&self) -> String {
        self.deadline.format("%B %-d, %Y").to_string()
    }
}

/// Body sent by the add/edit form on create and full update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub user_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub stage: Stage,
}

/// Partial update carrying only the new stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StagePatch {
    pub stage: Stage,
}
