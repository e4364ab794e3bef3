use crate::{DrawError, SessionError, WeightMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRule {
    pub white_count: u32,
    pub white_max: u32,
    pub red_max: u32,
}

impl Default for LotteryRule {
    fn default() -> Self {
        Self {
            white_count: 5,
            white_max: 69,
            red_max: 26,
        }
    }
}

impl LotteryRule {
    pub fn validate(&self) -> Result<(), DrawError> {
        if self.white_count == 0 || self.white_max == 0 || self.red_max == 0 {
            return Err(DrawError::InvalidLotteryRule(
                "counts and bounds must be positive".to_string(),
            ));
        }
        if self.white_count > self.white_max {
            return Err(DrawError::InvalidLotteryRule(format!(
                "cannot draw {} distinct balls from 1..={}",
                self.white_count, self.white_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub weight_mode: WeightMode,
    #[serde(default = "default_options")]
    pub default_options: Vec<String>,
    #[serde(default = "default_without_replacement")]
    pub without_replacement: bool,
    #[serde(default = "default_lottery_delay")]
    pub lottery_delay_secs: f64,
    #[serde(default = "default_max_lottery_delay")]
    pub max_lottery_delay_secs: f64,
    /// Cap on draft-list size when picks may repeat.
    #[serde(default = "default_max_picks_with_replacement")]
    pub max_picks_with_replacement: usize,
    #[serde(default)]
    pub lottery: LotteryRule,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            weight_mode: WeightMode::default(),
            default_options: default_options(),
            without_replacement: default_without_replacement(),
            lottery_delay_secs: default_lottery_delay(),
            max_lottery_delay_secs: default_max_lottery_delay(),
            max_picks_with_replacement: default_max_picks_with_replacement(),
            lottery: LotteryRule::default(),
        }
    }
}

impl SessionConfig {
    /// True when `secs` is within `0..=max_lottery_delay_secs` and fits a
    /// [`Duration`].
    pub fn delay_in_range(&self, secs: f64) -> bool {
        secs.is_finite()
            && (0.0..=self.max_lottery_delay_secs).contains(&secs)
            && Duration::try_from_secs_f64(secs).is_ok()
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        let max = self.max_lottery_delay_secs;
        if !max.is_finite() || max < 0.0 || Duration::try_from_secs_f64(max).is_err() {
            return Err(SessionError::InvalidDelay(max));
        }
        if !self.delay_in_range(self.lottery_delay_secs) {
            return Err(SessionError::InvalidDelay(self.lottery_delay_secs));
        }
        self.lottery.validate()?;
        Ok(())
    }
}

fn default_options() -> Vec<String> {
    vec!["1".to_string(), "2".to_string()]
}

fn default_without_replacement() -> bool {
    true
}

fn default_lottery_delay() -> f64 {
    3.0
}

fn default_max_lottery_delay() -> f64 {
    10.0
}

fn default_max_picks_with_replacement() -> usize {
    100
}
