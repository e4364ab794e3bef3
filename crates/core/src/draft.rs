use crate::pool::{renormalize, take_weighted};
use crate::{DrawError, Pick, RngState, WeightedPool};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// A without-replacement draft revealed one pick per [`DraftState::advance`].
///
/// The first advance snapshots the pool, so later edits to the pool do not
/// affect a draft in progress. Picks carry the option's index at snapshot
/// time.
#[derive(Debug, Clone, Default)]
pub struct DraftState {
    phase: DraftPhase,
    source: Vec<String>,
    remaining: Vec<usize>,
    weights: Vec<f64>,
    picks: Vec<Pick>,
}

impl DraftState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == DraftPhase::Complete
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    /// 1-based number of the pick the next advance will make.
    pub fn round(&self) -> usize {
        self.picks.len() + 1
    }

    /// Options still in the snapshot with their current (renormalized) weights.
    pub fn remaining(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.remaining
            .iter()
            .zip(self.weights.iter().copied())
            .map(move |(index, weight)| (self.source[*index].as_str(), weight))
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    pub fn advance(&mut self, pool: &WeightedPool, rng: &mut RngState) -> Result<Pick, DrawError> {
        match self.phase {
            DraftPhase::Complete => return Err(DrawError::DraftComplete),
            DraftPhase::NotStarted => self.start(pool)?,
            DraftPhase::InProgress => {}
        }
        let index = take_weighted(&mut self.remaining, &mut self.weights, rng)?;
        let pick = Pick {
            index,
            label: self.source[index].clone(),
        };
        self.picks.push(pick.clone());
        if self.remaining.is_empty() {
            self.phase = DraftPhase::Complete;
        }
        Ok(pick)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn start(&mut self, pool: &WeightedPool) -> Result<(), DrawError> {
        if pool.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        let mut weights = pool.weights().to_vec();
        if !renormalize(&mut weights) {
            return Err(DrawError::AllZeroWeights);
        }
        self.source = pool.labels().to_vec();
        self.remaining = (0..pool.len()).collect();
        self.weights = weights;
        self.picks.clear();
        self.phase = DraftPhase::InProgress;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeightMode;

    fn pool(entries: &[(&str, f64)]) -> WeightedPool {
        WeightedPool::from_entries(
            WeightMode::Percentage,
            entries.iter().map(|(label, _)| label.to_string()).collect(),
            entries.iter().map(|(_, weight)| *weight).collect(),
        )
        .expect("pool")
    }

    #[test]
    fn runs_to_completion_as_permutation() {
        let pool = pool(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
        let mut rng = RngState::from_seed(21);
        let mut draft = DraftState::new();
        assert_eq!(draft.phase(), DraftPhase::NotStarted);

        draft.advance(&pool, &mut rng).expect("first");
        assert_eq!(draft.phase(), DraftPhase::InProgress);
        assert_eq!(draft.remaining_len(), 2);
        let total: f64 = draft.remaining().map(|(_, weight)| weight).sum();
        assert!((total - 100.0).abs() < 1e-9);

        draft.advance(&pool, &mut rng).expect("second");
        draft.advance(&pool, &mut rng).expect("third");
        assert!(draft.is_complete());
        assert_eq!(draft.round(), 4);

        let mut labels: Vec<_> = draft.picks().iter().map(|pick| pick.label.clone()).collect();
        labels.sort();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn advance_after_complete_fails() {
        let pool = pool(&[("solo", 100.0)]);
        let mut rng = RngState::from_seed(1);
        let mut draft = DraftState::new();
        assert_eq!(draft.advance(&pool, &mut rng).expect("pick").label, "solo");
        assert_eq!(draft.advance(&pool, &mut rng), Err(DrawError::DraftComplete));
        assert_eq!(draft.picks().len(), 1);
    }

    #[test]
    fn reset_returns_to_not_started() {
        let pool = pool(&[("a", 50.0), ("b", 50.0)]);
        let mut rng = RngState::from_seed(2);
        let mut draft = DraftState::new();
        draft.advance(&pool, &mut rng).expect("pick");
        draft.reset();
        assert_eq!(draft.phase(), DraftPhase::NotStarted);
        assert!(draft.picks().is_empty());
        assert_eq!(draft.remaining_len(), 0);
    }

    #[test]
    fn snapshot_ignores_later_pool_edits() {
        let mut pool = pool(&[("a", 50.0), ("b", 50.0)]);
        let mut rng = RngState::from_seed(4);
        let mut draft = DraftState::new();
        let first = draft.advance(&pool, &mut rng).expect("pick");
        pool.add_option("c", None).expect("add");
        let second = draft.advance(&pool, &mut rng).expect("pick");
        assert!(draft.is_complete());
        assert_ne!(first.label, second.label);
        assert_ne!(second.label, "c");
    }

    #[test]
    fn all_zero_pool_stays_not_started() {
        let pool = pool(&[("x", 0.0), ("y", 0.0)]);
        let mut rng = RngState::from_seed(3);
        let mut draft = DraftState::new();
        assert_eq!(draft.advance(&pool, &mut rng), Err(DrawError::AllZeroWeights));
        assert_eq!(draft.phase(), DraftPhase::NotStarted);
    }

    #[test]
    fn zero_weight_remainder_stops_without_mutation() {
        let pool = pool(&[("hot", 100.0), ("cold", 0.0)]);
        let mut rng = RngState::from_seed(8);
        let mut draft = DraftState::new();
        assert_eq!(draft.advance(&pool, &mut rng).expect("pick").label, "hot");
        assert_eq!(draft.advance(&pool, &mut rng), Err(DrawError::AllZeroWeights));
        assert_eq!(draft.phase(), DraftPhase::InProgress);
        assert_eq!(draft.picks().len(), 1);
        assert_eq!(draft.remaining_len(), 1);
    }

    #[test]
    fn empty_pool_cannot_start() {
        let pool = WeightedPool::new(WeightMode::Percentage);
        let mut rng = RngState::from_seed(3);
        let mut draft = DraftState::new();
        assert_eq!(draft.advance(&pool, &mut rng), Err(DrawError::EmptyPool));
    }
}
