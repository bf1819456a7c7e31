use network::{LaneIndex, MAX_LANES};
use optics::Dbm;
use thiserror::Error;

use crate::layout::LayoutOptions;
use crate::power::SplitPolicyKind;
use crate::rules::{DEFAULT_MAX_ONTS_PER_LANE, DEFAULT_MAX_SPLIT_DEPTH, DEFAULT_NAP_CAPACITY};

pub const DEFAULT_TX_POWER: Dbm = 3.0;
pub const DEFAULT_LANE_COUNT: LaneIndex = 1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid lane count. count: {0}, expected 1..={max}", max = MAX_LANES)]
    InvalidLaneCount(LaneIndex),

    #[error("Invalid NAP capacity. capacity: {0}, expected a value > 0")]
    InvalidNapCapacity(u32),

    #[error("Invalid launch power. power: {0}")]
    InvalidTxPower(Dbm),

    #[error("Invalid layout options. options: {0:?}")]
    InvalidLayoutOptions(LayoutOptions),
}

/// Settings read on every regeneration.
///
/// The display flags are carried for the renderer, they never change any computed value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub lane_count: LaneIndex,
    /// OLT launch power
    pub tx_power: Dbm,
    /// Terminals per physical NAP enclosure
    pub nap_capacity: u32,
    pub max_onts_per_lane: u32,
    pub max_split_depth: usize,
    pub split_policy: SplitPolicyKind,
    pub layout: LayoutOptions,

    pub show_power_labels: bool,
    pub show_port_numbers: bool,
    pub show_unused_ports: bool,
    pub dragging_enabled: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            tx_power: DEFAULT_TX_POWER,
            nap_capacity: DEFAULT_NAP_CAPACITY,
            max_onts_per_lane: DEFAULT_MAX_ONTS_PER_LANE,
            max_split_depth: DEFAULT_MAX_SPLIT_DEPTH,
            split_policy: SplitPolicyKind::default(),
            layout: LayoutOptions::default(),
            show_power_labels: true,
            show_port_numbers: true,
            show_unused_ports: true,
            dragging_enabled: true,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LANES).contains(&self.lane_count) {
            return Err(ConfigError::InvalidLaneCount(self.lane_count));
        }
        if self.nap_capacity == 0 {
            return Err(ConfigError::InvalidNapCapacity(self.nap_capacity));
        }
        if !self.tx_power.is_finite() {
            return Err(ConfigError::InvalidTxPower(self.tx_power));
        }
        let LayoutOptions {
            start_x,
            lane_top,
            pad_x,
        } = self.layout;
        if ![start_x, lane_top, pad_x]
            .iter()
            .all(|value| value.is_finite())
        {
            return Err(ConfigError::InvalidLayoutOptions(self.layout));
        }
        Ok(())
    }

    pub fn lane_indexes(&self) -> impl Iterator<Item = LaneIndex> {
        0..self.lane_count.min(MAX_LANES)
    }
}
