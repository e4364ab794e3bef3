use crate::{DrawError, RngState};
use serde::{Deserialize, Serialize};

pub const PERCENT_TOTAL: f64 = 100.0;

const BALANCE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    /// Weights in `0..=100`, expected to sum to 100.
    #[default]
    Percentage,
    /// Relative weights, integers `>= 1`.
    WholeNumber,
}

impl WeightMode {
    pub fn id(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::WholeNumber => "whole_number",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percentage" | "percent" | "pct" | "%" => Some(Self::Percentage),
            "whole_number" | "whole" | "whole-number" | "int" => Some(Self::WholeNumber),
            _ => None,
        }
    }
}

/// How the current weight sum relates to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "total", rename_all = "snake_case")]
pub enum WeightStatus {
    Balanced,
    Under(f64),
    Over(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pick {
    pub index: usize,
    pub label: String,
}

/// Ordered options with a parallel weight for each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPool {
    mode: WeightMode,
    labels: Vec<String>,
    weights: Vec<f64>,
}

impl WeightedPool {
    pub fn new(mode: WeightMode) -> Self {
        Self {
            mode,
            labels: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Pool with equal weights for `labels` (100/n, or 1 each for whole numbers).
    pub fn with_labels<S: Into<String>>(
        mode: WeightMode,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self, DrawError> {
        let mut pool = Self::new(mode);
        pool.replace_options(labels)?;
        Ok(pool)
    }

    pub fn from_entries(
        mode: WeightMode,
        labels: Vec<String>,
        weights: Vec<f64>,
    ) -> Result<Self, DrawError> {
        if labels.len() != weights.len() {
            return Err(DrawError::LengthMismatch {
                expected: labels.len(),
                actual: weights.len(),
            });
        }
        ensure_unique(&labels)?;
        for (index, weight) in weights.iter().enumerate() {
            validate_weight(mode, index, *weight)?;
        }
        ensure_finite_total(&weights)?;
        Ok(Self {
            mode,
            labels,
            weights,
        })
    }

    pub fn mode(&self) -> WeightMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn weight_status(&self) -> WeightStatus {
        let total = self.total_weight();
        if is_close(total, PERCENT_TOTAL) {
            WeightStatus::Balanced
        } else if total > PERCENT_TOTAL {
            WeightStatus::Over(total)
        } else {
            WeightStatus::Under(total)
        }
    }

    pub fn set_weights(&mut self, weights: &[f64]) -> Result<(), DrawError> {
        if weights.len() != self.labels.len() {
            return Err(DrawError::LengthMismatch {
                expected: self.labels.len(),
                actual: weights.len(),
            });
        }
        for (index, weight) in weights.iter().enumerate() {
            validate_weight(self.mode, index, *weight)?;
        }
        ensure_finite_total(weights)?;
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    pub fn set_weight(&mut self, index: usize, weight: f64) -> Result<(), DrawError> {
        self.check_index(index)?;
        validate_weight(self.mode, index, weight)?;
        let rest = self.total_weight() - self.weights[index];
        if !(rest + weight).is_finite() {
            return Err(DrawError::InvalidWeight { index, weight });
        }
        self.weights[index] = weight;
        Ok(())
    }

    /// Discards the current ratios. Percentage pools get `100/n` each,
    /// whole-number pools get 1 each.
    pub fn rebalance_equally(&mut self) -> Result<(), DrawError> {
        if self.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        let value = match self.mode {
            WeightMode::Percentage => PERCENT_TOTAL / self.len() as f64,
            WeightMode::WholeNumber => 1.0,
        };
        self.weights.iter_mut().for_each(|weight| *weight = value);
        Ok(())
    }

    /// Rescales weights to sum to 100 keeping their ratios. Weights are left
    /// untouched on failure.
    pub fn normalize_to_hundred(&mut self) -> Result<(), DrawError> {
        if self.mode != WeightMode::Percentage {
            return Err(DrawError::ModeMismatch);
        }
        if self.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        if !renormalize(&mut self.weights) {
            return Err(DrawError::ZeroTotal);
        }
        Ok(())
    }

    /// Appends an option and returns its index. Percentage pools ignore
    /// `initial_weight` and rebalance every option equally.
    pub fn add_option(
        &mut self,
        label: impl Into<String>,
        initial_weight: Option<f64>,
    ) -> Result<usize, DrawError> {
        let label = label.into();
        if self.labels.contains(&label) {
            return Err(DrawError::DuplicateOption(label));
        }
        let index = self.labels.len();
        match self.mode {
            WeightMode::Percentage => {
                self.labels.push(label);
                self.weights.push(0.0);
                self.rebalance_equally()?;
            }
            WeightMode::WholeNumber => {
                let weight = initial_weight.unwrap_or(1.0);
                validate_weight(self.mode, index, weight)?;
                if !(self.total_weight() + weight).is_finite() {
                    return Err(DrawError::InvalidWeight { index, weight });
                }
                self.labels.push(label);
                self.weights.push(weight);
            }
        }
        Ok(index)
    }

    /// Appends the next free numeric label, starting from `len + 1`.
    pub fn add_default_option(&mut self) -> Result<usize, DrawError> {
        let mut number = self.labels.len() + 1;
        while self.labels.iter().any(|label| *label == number.to_string()) {
            number += 1;
        }
        self.add_option(number.to_string(), None)
    }

    /// Removes the option at `index` and returns its label. The pool never
    /// drops below one option.
    pub fn remove_option(&mut self, index: usize) -> Result<String, DrawError> {
        self.check_index(index)?;
        if self.labels.len() == 1 {
            return Err(DrawError::LastOptionProtected);
        }
        let label = self.labels.remove(index);
        self.weights.remove(index);
        if self.mode == WeightMode::Percentage {
            self.rebalance_equally()?;
        }
        Ok(label)
    }

    pub fn rename_option(
        &mut self,
        index: usize,
        label: impl Into<String>,
    ) -> Result<(), DrawError> {
        self.check_index(index)?;
        let label = label.into();
        if self
            .labels
            .iter()
            .enumerate()
            .any(|(other, existing)| other != index && *existing == label)
        {
            return Err(DrawError::DuplicateOption(label));
        }
        self.labels[index] = label;
        Ok(())
    }

    /// Switches the weighting method and resets every weight for it.
    pub fn set_mode(&mut self, mode: WeightMode) {
        self.mode = mode;
        if !self.is_empty() {
            let _ = self.rebalance_equally();
        }
    }

    /// Rebuilds the pool from plain labels with equal weights.
    pub fn replace_options<S: Into<String>>(
        &mut self,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<(), DrawError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        ensure_unique(&labels)?;
        self.weights = vec![0.0; labels.len()];
        self.labels = labels;
        self.rebalance_equally()
    }

    pub fn draw_one(&self, rng: &mut RngState) -> Result<Pick, DrawError> {
        if self.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        let index = rng
            .pick_weighted(&self.weights)
            .ok_or(DrawError::AllZeroWeights)?;
        Ok(self.pick_at(index))
    }

    /// Draws `count` picks. Without replacement the whole request is
    /// validated up front, so either every pick is returned or none is.
    pub fn draw_many(
        &self,
        count: usize,
        with_replacement: bool,
        rng: &mut RngState,
    ) -> Result<Vec<Pick>, DrawError> {
        if self.is_empty() {
            return Err(DrawError::EmptyPool);
        }
        if with_replacement {
            return (0..count).map(|_| self.draw_one(rng)).collect();
        }
        if count > self.len() {
            return Err(DrawError::InsufficientOptions {
                requested: count,
                available: self.len(),
            });
        }
        let drawable = self.weights.iter().filter(|weight| **weight > 0.0).count();
        if count > drawable {
            return Err(DrawError::AllZeroWeights);
        }
        let mut remaining: Vec<usize> = (0..self.len()).collect();
        let mut weights = self.weights.clone();
        renormalize(&mut weights);
        let mut picks = Vec::with_capacity(count);
        for _ in 0..count {
            let index = take_weighted(&mut remaining, &mut weights, rng)?;
            picks.push(self.pick_at(index));
        }
        Ok(picks)
    }

    fn pick_at(&self, index: usize) -> Pick {
        Pick {
            index,
            label: self.labels[index].clone(),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), DrawError> {
        if index >= self.labels.len() {
            return Err(DrawError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            });
        }
        Ok(())
    }
}

impl Default for WeightedPool {
    fn default() -> Self {
        Self::new(WeightMode::default())
    }
}

/// One without-replacement step over parallel `remaining`/`weights`:
/// removes the chosen entry, renormalizes the rest to 100 and returns the
/// removed entry's value from `remaining`.
pub(crate) fn take_weighted(
    remaining: &mut Vec<usize>,
    weights: &mut Vec<f64>,
    rng: &mut RngState,
) -> Result<usize, DrawError> {
    let slot = rng
        .pick_weighted(weights)
        .ok_or(DrawError::AllZeroWeights)?;
    let index = remaining.remove(slot);
    weights.remove(slot);
    renormalize(weights);
    Ok(index)
}

/// Scales `weights` to sum to 100. Returns false (and leaves them alone)
/// when the sum is not positive.
pub(crate) fn renormalize(weights: &mut [f64]) -> bool {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return false;
    }
    for weight in weights.iter_mut() {
        *weight = *weight / total * PERCENT_TOTAL;
    }
    true
}

fn validate_weight(mode: WeightMode, index: usize, weight: f64) -> Result<(), DrawError> {
    let valid = match mode {
        WeightMode::Percentage => weight.is_finite() && (0.0..=PERCENT_TOTAL).contains(&weight),
        WeightMode::WholeNumber => weight.is_finite() && weight >= 1.0 && weight.fract() == 0.0,
    };
    if valid {
        Ok(())
    } else {
        Err(DrawError::InvalidWeight { index, weight })
    }
}

/// The running sum must stay finite so draws can always scale by it.
fn ensure_finite_total(weights: &[f64]) -> Result<(), DrawError> {
    let mut total = 0.0_f64;
    for (index, weight) in weights.iter().enumerate() {
        total += weight;
        if !total.is_finite() {
            return Err(DrawError::InvalidWeight {
                index,
                weight: *weight,
            });
        }
    }
    Ok(())
}

fn ensure_unique(labels: &[String]) -> Result<(), DrawError> {
    for (index, label) in labels.iter().enumerate() {
        if labels[..index].contains(label) {
            return Err(DrawError::DuplicateOption(label.clone()));
        }
    }
    Ok(())
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= BALANCE_TOLERANCE * a.abs().max(b.abs())
}
