//! xpulse-core: weekly task lifecycle and reward engine for the XPulse tracker

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod reward;
pub mod snapshot;
pub mod store;
pub mod task;
pub mod time;

pub use config::TrackerConfig;
pub use error::{Result, StoreError, TrackerError};
pub use lifecycle::{bonus_panel_active, weekly_reminder_active, Tracker};
pub use reward::{urgency, RewardEngine, TokenIssue, TokenLedger, Urgency};
pub use snapshot::{BarCounts, TaskView, WeeklySnapshot};
pub use store::{CsvStore, MemoryStore, TaskStore};
pub use task::{Priority, Task, TaskStatus, BONUS_MARKER};
pub use time::{Calendar, Clock, DayCategory, FixedClock, SystemClock};
