//! Task model for the weekly tracker.
//!
//! Tasks are append-only: the only mutation after creation is completion,
//! which sets `status`, `date_completed` and `token_earned` once.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text marker carried by bonus tasks.
pub const BONUS_MARKER: &str = "[BONUS]";

static BONUS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\[bonus\]").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Display colour only; priority never feeds into XP.
    pub fn color(self) -> &'static str {
        match self {
            Priority::Low => "#3498db",
            Priority::Medium => "#f1c40f",
            Priority::High => "#e74c3c",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `<week_start>-<seq:03>`, unique within the store.
    pub id: String,
    /// Sunday (local date) of the task's week bucket.
    pub week_start: NaiveDate,
    pub date_added: NaiveDate,
    pub text: String,
    pub status: TaskStatus,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    /// Fixed at creation.
    pub xp: u32,
    pub date_completed: Option<DateTime<Utc>>,
    pub is_bonus: bool,
    pub token_earned: u32,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        week_start: NaiveDate,
        date_added: NaiveDate,
        text: impl Into<String>,
        deadline: DateTime<Utc>,
    ) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            week_start,
            date_added,
            is_bonus: has_bonus_marker(&text),
            text,
            status: TaskStatus::Pending,
            deadline,
            priority: Priority::Medium,
            xp: 0,
            date_completed: None,
            token_earned: 0,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = xp;
        self
    }

    pub fn with_bonus(mut self, is_bonus: bool) -> Self {
        self.is_bonus = is_bonus || has_bonus_marker(&self.text);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

pub fn has_bonus_marker(text: &str) -> bool {
    BONUS_PREFIX.is_match(text)
}

/// Task text with any leading bonus marker removed.
pub fn strip_bonus_marker(text: &str) -> &str {
    match BONUS_PREFIX.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

/// Prefix `text` with the bonus marker unless it already carries one.
pub fn mark_bonus(text: &str) -> String {
    let text = text.trim();
    if has_bonus_marker(text) {
        text.to_string()
    } else {
        format!("{BONUS_MARKER} {text}")
    }
}

/// Id for the `seq`-th task of a week: "2026-10-11-003".
pub fn format_task_id(week_start: NaiveDate, seq: u32) -> String {
    format!("{}-{:03}", week_start.format("%Y-%m-%d"), seq)
}

/// First unused sequence number among the week's existing ids.
pub fn next_task_id(tasks: &[Task], week_start: NaiveDate) -> String {
    let mut seq = 1;
    loop {
        let candidate = format_task_id(week_start, seq);
        if !tasks.iter().any(|t| t.id == candidate) {
            return candidate;
        }
        seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 11).unwrap()
    }

    fn task(id: &str, text: &str) -> Task {
        let deadline = Utc.with_ymd_and_hms(2026, 10, 17, 18, 29, 0).unwrap();
        Task::new(id, sunday(), sunday(), text, deadline)
    }

    #[test]
    fn bonus_marker_detection() {
        assert!(has_bonus_marker("[BONUS] Clean garage"));
        assert!(has_bonus_marker("  [bonus] lowercase"));
        assert!(!has_bonus_marker("Clean garage [BONUS]"));
        assert!(task("a", "[BONUS] x").is_bonus);
        assert!(!task("b", "x").is_bonus);
        assert!(task("c", "x").with_bonus(true).is_bonus);
    }

    #[test]
    fn mark_bonus_does_not_double_prefix() {
        assert_eq!(mark_bonus("Clean garage"), "[BONUS] Clean garage");
        assert_eq!(mark_bonus("[BONUS] Clean garage"), "[BONUS] Clean garage");
        assert_eq!(strip_bonus_marker(" [bonus]  Clean garage "), "Clean garage");
        assert_eq!(strip_bonus_marker("[BONUS]"), "");
    }

    #[test]
    fn ids_are_sequential_per_week() {
        assert_eq!(next_task_id(&[], sunday()), "2026-10-11-001");
        let tasks = vec![task("2026-10-11-001", "a"), task("2026-10-04-002", "b")];
        assert_eq!(next_task_id(&tasks, sunday()), "2026-10-11-002");
    }

    #[test]
    fn parses_priority_names() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("med".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
