//! Linear dB budget model.
//!
//! Losses subtract from the launch power because optical budgets are additive in log scale.

pub mod loss;
pub mod power;

pub use loss::{splitter_loss, total_loss, LossBudget, CONNECTOR_LOSS, SPLICE_LOSS, STANDARD_SPLIT_RATIOS};
pub use power::{to_percent, to_percent_in, PowerLevel, PowerWindow, MARGINAL_POWER, MAX_POWER, MIN_POWER};

/// Power, in dBm
pub type Dbm = f64;
/// Loss or gain, in dB
pub type Db = f64;
