use crate::{
    draw_lottery_numbers_with, DraftPhase, DraftState, DrawError, Event, EventBus,
    LotteryNumbers, Pick, RngState, SessionConfig, WeightMode, WeightedPool,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    SingleWinner,
    DraftList,
    LotteryDraft,
    PowerBall,
}

impl DrawMode {
    pub const ALL: [DrawMode; 4] = [
        DrawMode::SingleWinner,
        DrawMode::DraftList,
        DrawMode::LotteryDraft,
        DrawMode::PowerBall,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::SingleWinner => "winner",
            Self::DraftList => "draft",
            Self::LotteryDraft => "lottery",
            Self::PowerBall => "powerball",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "winner" | "single" | "single_winner" => Some(Self::SingleWinner),
            "draft" | "draft_list" => Some(Self::DraftList),
            "lottery" | "lottery_draft" => Some(Self::LotteryDraft),
            "powerball" | "power_ball" => Some(Self::PowerBall),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Winner(Pick),
    Draft(Vec<Pick>),
    Lottery(LotteryNumbers),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("this draw requires the {expected:?} mode, current mode is {actual:?}")]
    WrongMode { expected: DrawMode, actual: DrawMode },
    #[error("lottery delay {0} is out of range")]
    InvalidDelay(f64),
    #[error("pick count must be at least 1")]
    InvalidPickCount,
    #[error("requested {requested} picks, at most {max} allowed")]
    TooManyPicks { requested: usize, max: usize },
}

/// Everything one randomizer screen needs: the pool, the selected draw mode
/// and the latest result.
#[derive(Debug)]
pub struct Randomizer {
    pub config: SessionConfig,
    pool: WeightedPool,
    mode: DrawMode,
    without_replacement: bool,
    lottery_delay_secs: f64,
    draft: DraftState,
    outcome: Option<Outcome>,
    rng: RngState,
}

impl Randomizer {
    /// Starts from the configured default options, weighted equally.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, SessionError> {
        let pool = WeightedPool::with_labels(config.weight_mode, config.default_options.clone())?;
        Self::with_pool(config, pool, seed)
    }

    pub fn with_pool(
        config: SessionConfig,
        pool: WeightedPool,
        seed: u64,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            without_replacement: config.without_replacement,
            lottery_delay_secs: config.lottery_delay_secs,
            config,
            pool,
            mode: DrawMode::default(),
            draft: DraftState::new(),
            outcome: None,
            rng: RngState::from_seed(seed),
        })
    }

    pub fn pool(&self) -> &WeightedPool {
        &self.pool
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn without_replacement(&self) -> bool {
        self.without_replacement
    }

    pub fn lottery_delay_secs(&self) -> f64 {
        self.lottery_delay_secs
    }

    pub fn lottery_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.lottery_delay_secs).unwrap_or_default()
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode, events: &mut EventBus) {
        self.mode = mode;
        events.push(Event::DrawModeChanged { mode });
        self.reset_results(events);
    }

    pub fn set_without_replacement(&mut self, value: bool, events: &mut EventBus) {
        self.without_replacement = value;
        self.reset_results(events);
    }

    pub fn set_lottery_delay(&mut self, secs: f64) -> Result<(), SessionError> {
        if !self.config.delay_in_range(secs) {
            return Err(SessionError::InvalidDelay(secs));
        }
        self.lottery_delay_secs = secs;
        Ok(())
    }

    pub fn add_option(
        &mut self,
        label: impl Into<String>,
        weight: Option<f64>,
        events: &mut EventBus,
    ) -> Result<usize, SessionError> {
        let index = self.pool.add_option(label, weight)?;
        self.push_added(index, events);
        Ok(index)
    }

    pub fn add_default_option(&mut self, events: &mut EventBus) -> Result<usize, SessionError> {
        let index = self.pool.add_default_option()?;
        self.push_added(index, events);
        Ok(index)
    }

    pub fn remove_option(
        &mut self,
        index: usize,
        events: &mut EventBus,
    ) -> Result<String, SessionError> {
        let label = self.pool.remove_option(index)?;
        events.push(Event::OptionRemoved {
            index,
            label: label.clone(),
        });
        self.push_weights(events);
        self.reset_results(events);
        Ok(label)
    }

    pub fn rename_option(
        &mut self,
        index: usize,
        label: impl Into<String>,
        events: &mut EventBus,
    ) -> Result<(), SessionError> {
        let label = label.into();
        self.pool.rename_option(index, label.clone())?;
        events.push(Event::OptionRenamed { index, label });
        Ok(())
    }

    pub fn replace_options<S: Into<String>>(
        &mut self,
        labels: impl IntoIterator<Item = S>,
        events: &mut EventBus,
    ) -> Result<(), SessionError> {
        self.pool.replace_options(labels)?;
        events.push(Event::OptionsReplaced {
            count: self.pool.len(),
        });
        self.push_weights(events);
        self.reset_results(events);
        Ok(())
    }

    pub fn set_weight(
        &mut self,
        index: usize,
        weight: f64,
        events: &mut EventBus,
    ) -> Result<(), SessionError> {
        self.pool.set_weight(index, weight)?;
        self.push_weights(events);
        Ok(())
    }

    pub fn set_weights(&mut self, weights: &[f64], events: &mut EventBus) -> Result<(), SessionError> {
        self.pool.set_weights(weights)?;
        self.push_weights(events);
        Ok(())
    }

    pub fn normalize_weights(&mut self, events: &mut EventBus) -> Result<(), SessionError> {
        self.pool.normalize_to_hundred()?;
        self.push_weights(events);
        Ok(())
    }

    pub fn rebalance_weights(&mut self, events: &mut EventBus) -> Result<(), SessionError> {
        self.pool.rebalance_equally()?;
        self.push_weights(events);
        Ok(())
    }

    /// Changing the weighting method resets weights and clears results.
    pub fn set_weight_mode(&mut self, mode: WeightMode, events: &mut EventBus) {
        self.pool.set_mode(mode);
        self.push_weights(events);
        self.reset_results(events);
    }

    pub fn pick_winner(&mut self, events: &mut EventBus) -> Result<Pick, SessionError> {
        self.require_mode(DrawMode::SingleWinner)?;
        let pick = self.pool.draw_one(&mut self.rng)?;
        debug!(index = pick.index, label = %pick.label, "winner picked");
        self.outcome = Some(Outcome::Winner(pick.clone()));
        events.push(Event::WinnerPicked { pick: pick.clone() });
        Ok(pick)
    }

    /// Fresh draft list of `count` picks; the previous result is cleared
    /// first, even when the draw fails.
    pub fn run_draft(
        &mut self,
        count: usize,
        events: &mut EventBus,
    ) -> Result<Vec<Pick>, SessionError> {
        self.require_mode(DrawMode::DraftList)?;
        self.reset_results(events);
        if count == 0 {
            return Err(SessionError::InvalidPickCount);
        }
        let with_replacement = !self.without_replacement;
        if with_replacement && count > self.config.max_picks_with_replacement {
            return Err(SessionError::TooManyPicks {
                requested: count,
                max: self.config.max_picks_with_replacement,
            });
        }
        let picks = self.pool.draw_many(count, with_replacement, &mut self.rng)?;
        debug!(count, with_replacement, "draft list drawn");
        self.outcome = Some(Outcome::Draft(picks.clone()));
        events.push(Event::DraftDrawn {
            picks: picks.clone(),
            with_replacement,
        });
        Ok(picks)
    }

    /// One suspense-paced lottery draft pick. Callers wait
    /// [`Randomizer::lottery_delay`] before revealing it.
    pub fn draft_next(&mut self, events: &mut EventBus) -> Result<Pick, SessionError> {
        self.require_mode(DrawMode::LotteryDraft)?;
        let round = self.draft.round();
        let pick = self.draft.advance(&self.pool, &mut self.rng)?;
        debug!(round, label = %pick.label, "draft advanced");
        self.outcome = Some(Outcome::Draft(self.draft.picks().to_vec()));
        events.push(Event::DraftAdvanced {
            round,
            pick: pick.clone(),
            remaining: self.draft.remaining_len(),
        });
        if self.draft.phase() == DraftPhase::Complete {
            events.push(Event::DraftCompleted {
                picks: self.draft.picks().len(),
            });
        }
        Ok(pick)
    }

    pub fn draw_power_ball(&mut self, events: &mut EventBus) -> Result<LotteryNumbers, SessionError> {
        self.require_mode(DrawMode::PowerBall)?;
        self.reset_results(events);
        let numbers = draw_lottery_numbers_with(&self.config.lottery, &mut self.rng)?;
        debug!(%numbers, "lottery numbers drawn");
        self.outcome = Some(Outcome::Lottery(numbers.clone()));
        events.push(Event::LotteryDrawn {
            numbers: numbers.clone(),
        });
        Ok(numbers)
    }

    /// Clears the winner, draft list, lottery numbers and any draft in
    /// progress.
    pub fn reset_results(&mut self, events: &mut EventBus) {
        if self.outcome.is_none() && self.draft.phase() == DraftPhase::NotStarted {
            return;
        }
        self.outcome = None;
        self.draft.reset();
        events.push(Event::ResultsReset);
    }

    fn require_mode(&self, expected: DrawMode) -> Result<(), SessionError> {
        if self.mode != expected {
            return Err(SessionError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    fn push_added(&self, index: usize, events: &mut EventBus) {
        events.push(Event::OptionAdded {
            index,
            label: self.pool.labels()[index].clone(),
        });
        self.push_weights(events);
    }

    fn push_weights(&self, events: &mut EventBus) {
        events.push(Event::WeightsChanged {
            method: self.pool.mode(),
            total: self.pool.total_weight(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Randomizer {
        Randomizer::new(SessionConfig::default(), 0xC0FFEE).expect("session")
    }

    #[test]
    fn starts_with_two_even_options() {
        let session = session();
        assert_eq!(session.pool().labels(), &["1", "2"]);
        assert_eq!(session.pool().weights(), &[50.0, 50.0]);
        assert_eq!(session.mode(), DrawMode::SingleWinner);
        assert!(session.without_replacement());
        assert_eq!(session.lottery_delay(), Duration::from_secs(3));
    }

    #[test]
    fn draw_requires_matching_mode() {
        let mut session = session();
        let mut events = EventBus::default();
        let err = session.run_draft(1, &mut events).expect_err("wrong mode");
        assert!(matches!(
            err,
            SessionError::WrongMode {
                expected: DrawMode::DraftList,
                actual: DrawMode::SingleWinner
            }
        ));
    }

    #[test]
    fn mode_change_clears_outcome() {
        let mut session = session();
        let mut events = EventBus::default();
        session.pick_winner(&mut events).expect("winner");
        assert!(matches!(session.outcome(), Some(Outcome::Winner(_))));
        session.set_draw_mode(DrawMode::PowerBall, &mut events);
        assert!(session.outcome().is_none());
        let drained: Vec<_> = events.drain().collect();
        assert!(drained.contains(&Event::ResultsReset));
    }

    #[test]
    fn draft_list_caps_picks_with_replacement() {
        let mut session = session();
        let mut events = EventBus::default();
        session.set_draw_mode(DrawMode::DraftList, &mut events);
        session.set_without_replacement(false, &mut events);
        let picks = session.run_draft(100, &mut events).expect("draft");
        assert_eq!(picks.len(), 100);
        assert!(matches!(
            session.run_draft(101, &mut events),
            Err(SessionError::TooManyPicks {
                requested: 101,
                max: 100
            })
        ));
        assert!(session.outcome().is_none());
    }

    #[test]
    fn draft_list_without_replacement_limited_by_pool() {
        let mut session = session();
        let mut events = EventBus::default();
        session.set_draw_mode(DrawMode::DraftList, &mut events);
        assert!(matches!(
            session.run_draft(3, &mut events),
            Err(SessionError::Draw(DrawError::InsufficientOptions { .. }))
        ));
        assert!(matches!(
            session.run_draft(0, &mut events),
            Err(SessionError::InvalidPickCount)
        ));
        let picks = session.run_draft(2, &mut events).expect("draft");
        assert_ne!(picks[0].label, picks[1].label);
    }

    #[test]
    fn lottery_draft_runs_until_complete() {
        let mut session = session();
        let mut events = EventBus::default();
        session.add_option("3", None, &mut events).expect("add");
        session.set_draw_mode(DrawMode::LotteryDraft, &mut events);
        for round in 1..=3 {
            assert_eq!(session.draft().round(), round);
            session.draft_next(&mut events).expect("advance");
        }
        assert!(session.draft().is_complete());
        assert!(matches!(
            session.draft_next(&mut events),
            Err(SessionError::Draw(DrawError::DraftComplete))
        ));
        match session.outcome() {
            Some(Outcome::Draft(picks)) => assert_eq!(picks.len(), 3),
            other => panic!("unexpected outcome {other:?}"),
        }
        let completed = events
            .drain()
            .filter(|event| matches!(event, Event::DraftCompleted { picks: 3 }))
            .count();
        assert_eq!(completed, 1);

        session.reset_results(&mut events);
        assert_eq!(session.draft().phase(), DraftPhase::NotStarted);
        session.draft_next(&mut events).expect("restart");
    }

    #[test]
    fn removing_an_option_resets_results() {
        let mut session = session();
        let mut events = EventBus::default();
        session.pick_winner(&mut events).expect("winner");
        session.remove_option(0, &mut events).expect("remove");
        assert!(session.outcome().is_none());
        assert_eq!(session.pool().weights(), &[100.0]);
        assert!(matches!(
            session.remove_option(0, &mut events),
            Err(SessionError::Draw(DrawError::LastOptionProtected))
        ));
    }

    #[test]
    fn weight_method_switch_resets_weights() {
        let mut session = session();
        let mut events = EventBus::default();
        session.set_weight(0, 80.0, &mut events).expect("weight");
        session.set_weight_mode(WeightMode::WholeNumber, &mut events);
        assert_eq!(session.pool().weights(), &[1.0, 1.0]);
        session.set_weight(1, 3.0, &mut events).expect("weight");
        assert_eq!(session.pool().weights(), &[1.0, 3.0]);
    }

    #[test]
    fn power_ball_uses_configured_rule() {
        let mut session = session();
        let mut events = EventBus::default();
        session.set_draw_mode(DrawMode::PowerBall, &mut events);
        let numbers = session.draw_power_ball(&mut events).expect("draw");
        assert_eq!(numbers.white_balls.len(), 5);
        assert_eq!(session.outcome(), Some(&Outcome::Lottery(numbers)));
    }

    #[test]
    fn delay_outside_bounds_rejected() {
        let mut session = session();
        assert!(session.set_lottery_delay(0.5).is_ok());
        assert!(matches!(
            session.set_lottery_delay(11.0),
            Err(SessionError::InvalidDelay(_))
        ));
        assert_eq!(session.lottery_delay_secs(), 0.5);
    }

    #[test]
    fn oversized_delay_config_rejected() {
        let config = SessionConfig {
            max_lottery_delay_secs: 1e30,
            lottery_delay_secs: 1e25,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Randomizer::new(config, 1),
            Err(SessionError::InvalidDelay(_))
        ));
        let config = SessionConfig {
            lottery_delay_secs: 20.0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Randomizer::new(config, 1),
            Err(SessionError::InvalidDelay(delay)) if delay == 20.0
        ));
    }

    #[test]
    fn same_seed_same_results() {
        let mut a = session();
        let mut b = session();
        let mut events = EventBus::default();
        for _ in 0..20 {
            assert_eq!(
                a.pick_winner(&mut events).expect("a"),
                b.pick_winner(&mut events).expect("b")
            );
        }
    }

    #[test]
    fn mode_ids_round_trip() {
        for mode in DrawMode::ALL {
            assert_eq!(DrawMode::from_id(mode.id()), Some(mode));
        }
        assert_eq!(DrawMode::from_id("nope"), None);
    }
}
