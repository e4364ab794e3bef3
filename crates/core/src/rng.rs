use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    seq::index,
    Rng, SeedableRng,
};

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from OS entropy; the chosen seed stays readable through [`RngState::seed`].
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Index chosen with probability `weights[i] / sum(weights)`.
    /// Zero weights are never chosen; `None` when no weight is positive or
    /// the sum overflows.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        if !weights.iter().sum::<f64>().is_finite() {
            return None;
        }
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    /// `amount` distinct values from `0..upper`, in draw order.
    pub fn sample_distinct(&mut self, upper: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, upper, amount).into_vec()
    }

    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }
}
