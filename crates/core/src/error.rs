use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    #[error("the pool has no options")]
    EmptyPool,
    #[error("cannot remove the last remaining option")]
    LastOptionProtected,
    #[error("option index {index} out of range for {len} options")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("expected {expected} weights, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("weights sum to zero")]
    ZeroTotal,
    #[error("every remaining option has zero weight")]
    AllZeroWeights,
    #[error("requested {requested} picks but only {available} options are available")]
    InsufficientOptions { requested: usize, available: usize },
    #[error("the draft is complete")]
    DraftComplete,
    #[error("invalid weight {weight} for option {index}")]
    InvalidWeight { index: usize, weight: f64 },
    #[error("option {0:?} already exists")]
    DuplicateOption(String),
    #[error("operation requires percentage weights")]
    ModeMismatch,
    #[error("invalid lottery rule: {0}")]
    InvalidLotteryRule(String),
}
