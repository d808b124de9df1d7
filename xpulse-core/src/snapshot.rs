//! Read-side aggregation for the weekly dashboard.
//!
//! Built fresh from a loaded task slice on every call.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{bonus_panel_active, weekly_reminder_active};
use crate::reward::{urgency, RewardEngine, Urgency};
use crate::task::{Priority, Task};
use crate::time::Calendar;

const DONE_COLOR: &str = "#2ecc71";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub text: String,
    pub xp: u32,
    pub priority: Priority,
    pub priority_color: String,
    /// `None` once the task is completed.
    pub urgency: Option<Urgency>,
    pub color: String,
    pub is_bonus: bool,
    pub week_start: NaiveDate,
    pub deadline: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
}

impl TaskView {
    fn build(task: &Task, xp: u32, now: DateTime<Utc>) -> Self {
        let urgency = task.is_pending().then(|| urgency(task.deadline, now));
        let color = urgency.map(Urgency::color).unwrap_or(DONE_COLOR);
        Self {
            id: task.id.clone(),
            text: task.text.clone(),
            xp,
            priority: task.priority,
            priority_color: task.priority.color().to_string(),
            urgency,
            color: color.to_string(),
            is_bonus: task.is_bonus,
            week_start: task.week_start,
            deadline: task.deadline,
            date_completed: task.date_completed,
        }
    }
}

/// Tasks added per weekday (Sunday first) for last week and this week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarCounts {
    pub prev: [u32; 7],
    pub curr: [u32; 7],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub week_start: NaiveDate,
    pub pending: Vec<TaskView>,
    pub completed: Vec<TaskView>,
    /// Still-pending tasks from earlier weeks, shown at their discounted XP.
    pub carried_over: Vec<TaskView>,
    /// `[completed, pending]` for the current week.
    pub pie_counts: [u32; 2],
    pub bar_counts: BarCounts,
    pub total_xp: u32,
    pub tokens: u32,
    pub streak: u32,
    pub show_weekly_reminder: bool,
    pub show_bonus_panel: bool,
}

pub fn bar_counts(tasks: &[Task], week_start: NaiveDate) -> BarCounts {
    let prev_start = week_start - Duration::days(7);
    let mut counts = BarCounts::default();
    for i in 0..7 {
        let prev_day = prev_start + Duration::days(i as i64);
        let curr_day = week_start + Duration::days(i as i64);
        counts.prev[i] = tasks.iter().filter(|t| t.date_added == prev_day).count() as u32;
        counts.curr[i] = tasks.iter().filter(|t| t.date_added == curr_day).count() as u32;
    }
    counts
}

pub fn build_snapshot(
    tasks: &[Task],
    now: DateTime<Utc>,
    calendar: &Calendar,
    rewards: &RewardEngine,
) -> WeeklySnapshot {
    let week_start = calendar.week_start_date(now);

    let this_week: Vec<&Task> = tasks.iter().filter(|t| t.week_start == week_start).collect();
    let pending_tasks: Vec<Task> = this_week.iter().filter(|t| t.is_pending()).map(|t| (*t).clone()).collect();

    let pending: Vec<TaskView> = pending_tasks
        .iter()
        .map(|t| TaskView::build(t, t.xp, now))
        .collect();
    let completed: Vec<TaskView> = this_week
        .iter()
        .filter(|t| t.is_completed())
        .map(|t| TaskView::build(t, rewards.awarded_xp(t), now))
        .collect();
    let carried_over: Vec<TaskView> = tasks
        .iter()
        .filter(|t| t.is_pending() && t.week_start < week_start)
        .map(|t| TaskView::build(t, rewards.effective_xp(t, now), now))
        .collect();

    let total_xp = completed.iter().map(|v| v.xp).sum();

    WeeklySnapshot {
        week_start,
        pie_counts: [completed.len() as u32, pending.len() as u32],
        bar_counts: bar_counts(tasks, week_start),
        total_xp,
        tokens: rewards.tokens_available(tasks),
        streak: rewards.streak(tasks, now),
        show_weekly_reminder: weekly_reminder_active(calendar, now),
        show_bonus_panel: bonus_panel_active(calendar, now, &pending_tasks),
        pending,
        completed,
        carried_over,
    }
}
