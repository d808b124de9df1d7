//! Reward engine: XP, urgency, streaks and rate-limited tokens.
//!
//! Everything here is a pure function of the task slice, the config and an
//! explicit `now`; nothing is cached between calls.
//!
//! XP at creation:
//! - decay:  (days_left + 1) / 7, days_left clamped at 0, capped at 1.0
//! - streak: min(1 + 0.1 * streak, 1 + max_streak_bonus)
//! - bonus:  x bonus_xp_multiplier
//!
//! Tokens: completed tasks are replayed in completion order and their awarded
//! XP fills a pool; each conversion takes `token_xp_value` out of the pool,
//! but only while the completion's week and month are under their limits.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::task::Task;
use crate::time::Calendar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Overdue,
    Soon,
    Safe,
}

impl Urgency {
    pub fn color(self) -> &'static str {
        match self {
            Urgency::Overdue => "red",
            Urgency::Soon => "yellow",
            Urgency::Safe => "green",
        }
    }
}

/// Overdue strictly before `now`; Soon up to and including `now + 1 day`.
pub fn urgency(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Urgency {
    if deadline < now {
        Urgency::Overdue
    } else if deadline - now <= Duration::days(1) {
        Urgency::Soon
    } else {
        Urgency::Safe
    }
}

/// Whole days of lead time left, never negative.
pub fn days_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_days().max(0)
}

pub fn decay_factor(days_left: i64) -> f64 {
    ((days_left.max(0) + 1) as f64 / 7.0).min(1.0)
}

pub fn streak_factor(streak: u32, max_streak_bonus: f64) -> f64 {
    (1.0 + 0.1 * streak as f64).min(1.0 + max_streak_bonus)
}

// Products like 50 * 1.3 land a hair under the integer in f64.
fn floor_xp(value: f64) -> u32 {
    (value + 1e-9).floor().max(0.0) as u32
}

/// One token conversion, attributed to the completion that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIssue {
    pub task_id: String,
    pub week_start: NaiveDate,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub issued: Vec<TokenIssue>,
    /// XP still sitting in the pool after the last conversion.
    pub pool_xp: u32,
}

impl TokenLedger {
    pub fn tokens_for(&self, task_id: &str) -> u32 {
        self.issued.iter().filter(|i| i.task_id == task_id).count() as u32
    }
}

#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: TrackerConfig,
    calendar: Calendar,
}

impl RewardEngine {
    pub fn new(config: TrackerConfig, calendar: Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Plain bonus scaling of a base value, no decay or streak.
    pub fn compute_creation_xp(&self, base_xp: u32, is_bonus: bool) -> u32 {
        if is_bonus {
            floor_xp(base_xp as f64 * self.config.bonus_xp_multiplier)
        } else {
            base_xp
        }
    }

    /// XP stamped on a task when it is created.
    pub fn creation_xp(
        &self,
        base_xp: u32,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
        streak: u32,
        is_bonus: bool,
    ) -> u32 {
        let decay = decay_factor(days_left(deadline, now));
        let boost = streak_factor(streak, self.config.max_streak_bonus);
        let bonus = if is_bonus {
            self.config.bonus_xp_multiplier
        } else {
            1.0
        };
        floor_xp(base_xp as f64 * decay * boost * bonus)
    }

    pub fn rollover_penalty(&self, xp: u32, carried_over: bool) -> u32 {
        if carried_over {
            floor_xp(xp as f64 * (1.0 - self.config.rollover_penalty))
        } else {
            xp
        }
    }

    /// A pending task from an earlier bucket, or a task finished after its week.
    pub fn is_carried_over(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let reference = task.date_completed.unwrap_or(now);
        self.calendar.week_start_date(reference) > task.week_start
    }

    /// XP the task is currently worth, with the rollover discount applied.
    pub fn effective_xp(&self, task: &Task, now: DateTime<Utc>) -> u32 {
        self.rollover_penalty(task.xp, self.is_carried_over(task, now))
    }

    /// XP actually credited; zero until the task is completed.
    pub fn awarded_xp(&self, task: &Task) -> u32 {
        match task.date_completed {
            Some(at) if task.is_completed() => self.effective_xp(task, at),
            _ => 0,
        }
    }

    /// Consecutive week buckets holding at least one completed task.
    ///
    /// The walk starts at the current week, or at the previous one while the
    /// current week has no completion yet, so tasks added early in a week
    /// still see last week's run.
    pub fn streak(&self, tasks: &[Task], now: DateTime<Utc>) -> u32 {
        let weeks: HashSet<NaiveDate> = tasks
            .iter()
            .filter(|t| t.is_completed())
            .map(|t| t.week_start)
            .collect();

        let mut week = self.calendar.week_start_date(now);
        if !weeks.contains(&week) {
            week -= Duration::days(7);
        }
        let mut streak = 0;
        while weeks.contains(&week) {
            streak += 1;
            week -= Duration::days(7);
        }
        streak
    }

    /// Replay completions in `(date_completed, id)` order and issue a token
    /// each time the XP pool reaches `token_xp_value`.
    ///
    /// Weekly and monthly limits are keyed by the local week and month of the
    /// completion, not by the task's `week_start` bucket. A carried-over task
    /// finished next week draws on next week's allowance.
    pub fn token_ledger(&self, tasks: &[Task]) -> TokenLedger {
        let mut completed: Vec<(&Task, DateTime<Utc>)> = tasks
            .iter()
            .filter(|t| t.is_completed())
            .filter_map(|t| t.date_completed.map(|at| (t, at)))
            .collect();
        completed.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));

        let value = self.config.token_xp_value.max(1);
        let mut per_week: HashMap<NaiveDate, u32> = HashMap::new();
        let mut per_month: HashMap<(i32, u32), u32> = HashMap::new();
        let mut ledger = TokenLedger::default();

        for (task, at) in completed {
            ledger.pool_xp += self.awarded_xp(task);

            let week = self.calendar.week_start_date(at);
            let (year, month) = self.calendar.month_key(at);

            while ledger.pool_xp >= value {
                let week_used = per_week.entry(week).or_default();
                let month_used = per_month.entry((year, month)).or_default();
                if *week_used >= self.config.weekly_token_limit
                    || *month_used >= self.config.monthly_token_limit
                {
                    break;
                }
                *week_used += 1;
                *month_used += 1;
                ledger.pool_xp -= value;
                ledger.issued.push(TokenIssue {
                    task_id: task.id.clone(),
                    week_start: week,
                    year,
                    month,
                });
            }
        }

        ledger
    }

    /// Tokens recorded on completed tasks.
    pub fn tokens_available(&self, tasks: &[Task]) -> u32 {
        tasks
            .iter()
            .filter(|t| t.is_completed())
            .map(|t| t.token_earned)
            .sum()
    }
}
