//! Reward constants and calendar zone.
//!
//! Everything here is fixed at start-up; the shell loads it from
//! `config.toml` and hands it to [`crate::Tracker`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// XP a regular task is worth before decay/streak scaling.
    pub base_xp: u32,
    /// Tokens that may be issued inside one week bucket.
    pub weekly_token_limit: u32,
    /// Tokens that may be issued inside one calendar month.
    pub monthly_token_limit: u32,
    /// Ceiling on the streak boost (0.5 = at most +50%).
    pub max_streak_bonus: f64,
    /// XP consumed by one token conversion.
    pub token_xp_value: u32,
    /// Fraction of XP lost when a task is finished after its week.
    pub rollover_penalty: f64,
    pub bonus_xp_multiplier: f64,
    /// IANA zone name; all weekday/week/month questions are asked in it.
    pub timezone: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_xp: 50,
            weekly_token_limit: 1,
            monthly_token_limit: 1,
            max_streak_bonus: 0.5,
            token_xp_value: 200,
            rollover_penalty: 0.2,
            bonus_xp_multiplier: 1.5,
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Reject values that would make the reward formulas meaningless.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_xp_value == 0 {
            return Err("token_xp_value must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.rollover_penalty) {
            return Err("rollover_penalty must be within 0.0..=1.0".to_string());
        }
        if self.max_streak_bonus < 0.0 {
            return Err("max_streak_bonus must not be negative".to_string());
        }
        if self.bonus_xp_multiplier <= 0.0 {
            return Err("bonus_xp_multiplier must be positive".to_string());
        }
        Ok(())
    }
}
