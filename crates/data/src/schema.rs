use serde::{Deserialize, Serialize};

pub use randomizer_core::{DrawError, LotteryRule, SessionConfig, WeightMode, WeightedPool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetOption {
    pub label: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// A named starting pool stored under `assets/presets/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub method: WeightMode,
    pub options: Vec<PresetOption>,
}

impl Preset {
    /// Builds the pool. With no weights given every option is weighted
    /// equally; otherwise missing weights default to 0 (percentage) or 1
    /// (whole number).
    pub fn into_pool(self) -> Result<WeightedPool, DrawError> {
        if self.options.iter().all(|option| option.weight.is_none()) {
            return WeightedPool::with_labels(
                self.method,
                self.options.into_iter().map(|option| option.label),
            );
        }
        let fallback = match self.method {
            WeightMode::Percentage => 0.0,
            WeightMode::WholeNumber => 1.0,
        };
        let (labels, weights) = self
            .options
            .into_iter()
            .map(|option| (option.label, option.weight.unwrap_or(fallback)))
            .unzip();
        WeightedPool::from_entries(self.method, labels, weights)
    }
}
