//! Lifecycle controller: task creation, completion and dashboard gating.
//!
//! Every mutation is one load -> modify -> save cycle performed while holding
//! the store lock, so two concurrent requests cannot lose each other's
//! update. A result is only returned after the save succeeded.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::reward::RewardEngine;
use crate::snapshot::{build_snapshot, WeeklySnapshot};
use crate::store::TaskStore;
use crate::task::{
    has_bonus_marker, mark_bonus, next_task_id, strip_bonus_marker, Priority, Task, TaskStatus,
};
use crate::time::{Calendar, Clock, DayCategory, SystemClock};

/// The "new week, new goals" prompt shows on Saturday and Sunday.
pub fn weekly_reminder_active(calendar: &Calendar, now: DateTime<Utc>) -> bool {
    calendar.day_category(now) == DayCategory::Weekend
}

/// The bonus panel shows on weekdays once nothing is left pending.
pub fn bonus_panel_active(calendar: &Calendar, now: DateTime<Utc>, pending: &[Task]) -> bool {
    calendar.day_category(now) == DayCategory::Weekday && pending.is_empty()
}

pub struct Tracker<S: TaskStore, C: Clock = SystemClock> {
    store: Mutex<S>,
    clock: C,
    calendar: Calendar,
    rewards: RewardEngine,
}

impl<S: TaskStore, C: Clock> Tracker<S, C> {
    pub fn new(store: S, clock: C, config: TrackerConfig) -> Result<Self> {
        config.validate().map_err(TrackerError::Config)?;
        let calendar = Calendar::new(&config.timezone)?;
        Ok(Self {
            store: Mutex::new(store),
            clock,
            calendar,
            rewards: RewardEngine::new(config, calendar),
        })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn rewards(&self) -> &RewardEngine {
        &self.rewards
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Give back the store, e.g. to inspect it after a run.
    pub fn into_store(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let mut guard = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// File a regular task under the current week.
    pub fn add_task(
        &self,
        text: &str,
        priority: Priority,
        custom_deadline: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        self.create(text, priority, custom_deadline, false)
    }

    /// File a bonus task. The bonus-panel gate is a display concern and is
    /// not checked here.
    pub fn add_bonus_task(&self, text: &str, custom_deadline: Option<DateTime<Utc>>) -> Result<Task> {
        self.create(text, Priority::Medium, custom_deadline, true)
    }

    fn create(
        &self,
        text: &str,
        priority: Priority,
        custom_deadline: Option<DateTime<Utc>>,
        bonus: bool,
    ) -> Result<Task> {
        let text = text.trim();
        if strip_bonus_marker(text).is_empty() {
            warn!("rejected task with empty text");
            return Err(TrackerError::Validation("task text must not be empty".to_string()));
        }
        let is_bonus = bonus || has_bonus_marker(text);
        let text = if bonus { mark_bonus(text) } else { text.to_string() };

        self.with_store(|store| {
            let mut tasks = store.load_all()?;

            let now = self.clock.now();
            let week_start = self.calendar.week_start_date(now);
            let deadline = custom_deadline.unwrap_or_else(|| self.calendar.default_deadline(week_start));
            let streak = self.rewards.streak(&tasks, now);
            let xp = self.rewards.creation_xp(
                self.rewards.config().base_xp,
                deadline,
                now,
                streak,
                is_bonus,
            );

            let task = Task::new(
                next_task_id(&tasks, week_start),
                week_start,
                self.calendar.date_of(now),
                text,
                deadline,
            )
            .with_priority(priority)
            .with_xp(xp)
            .with_bonus(is_bonus);

            tasks.push(task.clone());
            store.save_all(&tasks)?;

            info!(id = %task.id, xp = task.xp, streak, bonus = task.is_bonus, "task added");
            Ok(task)
        })
    }

    /// Mark a pending task completed and settle any token it unlocks.
    pub fn complete_task(&self, task_id: &str) -> Result<Task> {
        self.with_store(|store| {
            let mut tasks = store.load_all()?;

            let Some(idx) = tasks.iter().position(|t| t.id == task_id) else {
                warn!(id = task_id, "complete: unknown task");
                return Err(TrackerError::NotFound(task_id.to_string()));
            };
            if tasks[idx].is_completed() {
                warn!(id = task_id, "complete: already completed");
                return Err(TrackerError::AlreadyCompleted(task_id.to_string()));
            }

            // Whatever this completion adds to the ledger is credited here,
            // even when the replay attributes it to an earlier task.
            let issued_before = self.rewards.token_ledger(&tasks).issued.len();

            tasks[idx].status = TaskStatus::Completed;
            tasks[idx].date_completed = Some(self.clock.now());

            let issued_after = self.rewards.token_ledger(&tasks).issued.len();
            tasks[idx].token_earned = issued_after.saturating_sub(issued_before) as u32;

            store.save_all(&tasks)?;

            let task = tasks.swap_remove(idx);
            info!(
                id = %task.id,
                xp = self.rewards.awarded_xp(&task),
                tokens = task.token_earned,
                "task completed"
            );
            Ok(task)
        })
    }

    pub fn should_show_weekly_reminder(&self, now: DateTime<Utc>) -> bool {
        weekly_reminder_active(&self.calendar, now)
    }

    pub fn should_show_bonus_panel(&self, now: DateTime<Utc>, pending: &[Task]) -> bool {
        bonus_panel_active(&self.calendar, now, pending)
    }

    /// Dashboard aggregates as of `now`.
    pub fn weekly_snapshot(&self, now: DateTime<Utc>) -> Result<WeeklySnapshot> {
        let tasks = self.with_store(|store| Ok(store.load_all()?))?;
        Ok(build_snapshot(&tasks, now, &self.calendar, &self.rewards))
    }

    /// Dashboard aggregates as of the tracker's clock.
    pub fn snapshot(&self) -> Result<WeeklySnapshot> {
        self.weekly_snapshot(self.clock.now())
    }

    /// Every task, in store order.
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.with_store(|store| Ok(store.load_all()?))
    }
}
