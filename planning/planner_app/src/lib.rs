use itertools::Itertools;
pub use network::{LaneIndex, Network, NetworkError, Node, NodeId, NodeSpec, NodeType, ParentLink};
use network::Lane;
pub use planning::config::{ConfigError, PlannerConfig};
use planning::layout;
pub use planning::layout::{Layout, LayoutOptions, NodePosition, Position, PositionOverrides};
use planning::power;
pub use planning::power::{PowerRow, SplitPolicyKind};
use planning::report;
pub use planning::report::{IssueKind, IssueSeverity, PlanningIssue};
use planning::rules;
pub use planning::rules::{DepthValidation, NetworkSummary, OntValidation};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Lane not configured. lane: {lane}, lane_count: {lane_count}")]
    LaneNotConfigured { lane: LaneIndex, lane_count: LaneIndex },
    #[error("Network error. cause: {0}")]
    NetworkError(#[from] NetworkError),
    #[error("Configuration error. cause: {0}")]
    ConfigError(#[from] ConfigError),
}

/// An edit, as produced by a user interface or read from a script.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    AddNode {
        lane: LaneIndex,
        /// None to add a root
        #[serde(default)]
        parent: Option<ParentLink>,
        node: NodeSpec,
    },
    DeleteNode {
        lane: LaneIndex,
        node: NodeId,
    },
    SetRatio {
        lane: LaneIndex,
        node: NodeId,
        ratio: u32,
    },
    Rename {
        lane: LaneIndex,
        node: NodeId,
        name: String,
    },
    SetPosition {
        lane: LaneIndex,
        node: NodeId,
        x: f64,
        y: f64,
    },
    ResetAllPositions,
    Configure {
        config: PlannerConfig,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    NodeAdded(NodeId),
    /// In breadth-first order, empty if the node did not exist.
    NodesDeleted(Vec<NodeId>),
    NodeUpdated,
    /// None if the position was ignored.
    PositionChanged(Option<PositionChange>),
    PositionsReset,
    Configured,
}

/// Emitted for every accepted position so a renderer can move the node and its connections.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PositionChange {
    pub lane_index: LaneIndex,
    pub node_id: NodeId,
    pub previous: Option<Position>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LaneRegeneration {
    pub lane_index: LaneIndex,
    pub layout: Layout,
    pub power_rows: Vec<PowerRow>,
}

/// Everything a renderer needs to redraw the design.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Regeneration {
    pub lanes: Vec<LaneRegeneration>,
    pub summary: NetworkSummary,
    pub ont_validation: OntValidation,
    pub depth_validation: DepthValidation,
    pub issues: Vec<PlanningIssue>,
}

impl Regeneration {
    pub fn power_rows(&self) -> impl Iterator<Item = &PowerRow> {
        self.lanes
            .iter()
            .flat_map(|lane| lane.power_rows.iter())
    }
}

/// A planning session.
///
/// Edits are only accepted for configured lanes. Nodes left behind in a lane that is no longer configured are kept,
/// they still count in the summary and validations but get no layout or power rows.
#[derive(Debug, Default)]
pub struct Planner {
    config: PlannerConfig,
    network: Network,
    overrides: PositionOverrides,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Self, AppError> {
        config.validate()?;

        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn overrides(&self) -> &PositionOverrides {
        &self.overrides
    }

    /// Replaces the configuration, a rejected configuration leaves the current one in place.
    pub fn configure(&mut self, config: PlannerConfig) -> Result<(), AppError> {
        config.validate()?;
        info!("Configured planner. config: {:?}", config);
        self.config = config;
        Ok(())
    }

    pub fn add_node(
        &mut self,
        lane: LaneIndex,
        parent: Option<ParentLink>,
        spec: NodeSpec,
    ) -> Result<NodeId, AppError> {
        self.ensure_lane_configured(lane)?;
        Ok(self.network.add_node(lane, parent, spec)?)
    }

    /// Deletes the node with its subtree and forgets the positions of every removed node.
    pub fn delete_node(&mut self, lane: LaneIndex, id: NodeId) -> Result<Vec<NodeId>, AppError> {
        self.ensure_lane_configured(lane)?;
        let removed = self.network.delete_node(lane, id);
        if !removed.is_empty() {
            let purged = self
                .overrides
                .remove_all(lane, &removed);
            debug!(
                "Purged position overrides. lane: {}, removed: [{}], purged: {}",
                lane,
                removed.iter().join(", "),
                purged
            );
        }
        Ok(removed)
    }

    pub fn set_ratio(&mut self, lane: LaneIndex, id: NodeId, ratio: u32) -> Result<(), AppError> {
        self.ensure_lane_configured(lane)?;
        Ok(self.network.set_ratio(lane, id, ratio)?)
    }

    pub fn rename(&mut self, lane: LaneIndex, id: NodeId, name: &str) -> Result<(), AppError> {
        self.ensure_lane_configured(lane)?;
        Ok(self.network.rename(lane, id, name)?)
    }

    pub fn node_depth(&self, lane: LaneIndex, id: NodeId) -> usize {
        self.network.node_depth(lane, id)
    }

    /// Nodes in lane order, empty for an unused lane.
    pub fn lane_nodes(&self, lane: LaneIndex) -> Vec<&Node> {
        self.network
            .lane(lane)
            .map(|lane| lane.nodes().collect())
            .unwrap_or_default()
    }

    pub fn compute_layout(&self, lane: LaneIndex) -> Layout {
        match self.network.lane(lane) {
            Some(nodes) => layout::compute_layout(lane, nodes, &self.overrides, &self.config.layout),
            None => Layout::default(),
        }
    }

    /// Records a user-chosen position for a node.
    ///
    /// Positions for unknown nodes and non-finite coordinates are ignored.
    pub fn set_position(
        &mut self,
        lane: LaneIndex,
        id: NodeId,
        x: f64,
        y: f64,
    ) -> Result<Option<PositionChange>, AppError> {
        self.ensure_lane_configured(lane)?;
        let position = Position {
            x,
            y,
        };
        if !position.is_finite() {
            debug!("Ignoring non-finite position. lane: {}, node: {}, position: {:?}", lane, id, position);
            return Ok(None);
        }
        if self.network.node(lane, id).is_none() {
            debug!("Ignoring position of unknown node. lane: {}, node: {}", lane, id);
            return Ok(None);
        }

        let previous = self.overrides.set(lane, id, position);
        info!("Set node position. lane: {}, node: {}, position: {:?}", lane, id, position);

        Ok(Some(PositionChange {
            lane_index: lane,
            node_id: id,
            previous,
            position,
        }))
    }

    pub fn reset_all_positions(&mut self) {
        info!("Reset all node positions. count: {}", self.overrides.len());
        self.overrides.clear();
    }

    /// Applies an event, rejected events are logged and leave the session unchanged.
    pub fn apply(&mut self, event: Event) -> Result<EventOutcome, AppError> {
        debug!("Applying event. event: {:?}", event);
        let result = match event {
            Event::AddNode {
                lane,
                parent,
                node,
            } => self
                .add_node(lane, parent, node)
                .map(EventOutcome::NodeAdded),
            Event::DeleteNode {
                lane,
                node,
            } => self
                .delete_node(lane, node)
                .map(EventOutcome::NodesDeleted),
            Event::SetRatio {
                lane,
                node,
                ratio,
            } => self
                .set_ratio(lane, node, ratio)
                .map(|_| EventOutcome::NodeUpdated),
            Event::Rename {
                lane,
                node,
                name,
            } => self
                .rename(lane, node, &name)
                .map(|_| EventOutcome::NodeUpdated),
            Event::SetPosition {
                lane,
                node,
                x,
                y,
            } => self
                .set_position(lane, node, x, y)
                .map(EventOutcome::PositionChanged),
            Event::ResetAllPositions => {
                self.reset_all_positions();
                Ok(EventOutcome::PositionsReset)
            }
            Event::Configure {
                config,
            } => self
                .configure(config)
                .map(|_| EventOutcome::Configured),
        };

        if let Err(error) = &result {
            warn!("Event rejected. error: {}", error);
        }

        result
    }

    /// Computes layout and power for every configured lane, then validates the whole design.
    ///
    /// The summary and validations cover the configured lanes and every lane that still holds nodes.
    /// Only reads the session, so repeated calls give identical results.
    pub fn regenerate(&self) -> Regeneration {
        let empty_lane = Lane::default();
        let configured_lanes: Vec<(LaneIndex, &Lane)> = self
            .config
            .lane_indexes()
            .map(|index| (index, self.network.lane(index).unwrap_or(&empty_lane)))
            .collect();
        let all_lanes: Vec<(LaneIndex, &Lane)> = configured_lanes
            .iter()
            .copied()
            .merge_by(
                self.network
                    .lanes()
                    .filter(|(index, _)| *index >= self.config.lane_count),
                |(a, _), (b, _)| a <= b,
            )
            .collect();

        let policy = self.config.split_policy.policy();

        let lane_regenerations = configured_lanes
            .iter()
            .map(|(lane_index, lane)| LaneRegeneration {
                lane_index: *lane_index,
                layout: layout::compute_layout(*lane_index, lane, &self.overrides, &self.config.layout),
                power_rows: power::propagate(*lane_index, lane, self.config.tx_power, policy),
            })
            .collect::<Vec<_>>();

        let summary = rules::summarize(&all_lanes, self.config.nap_capacity);
        let ont_validation = rules::validate_onts_per_lane(&all_lanes, self.config.max_onts_per_lane);
        let depth_validation = rules::validate_split_depth(&all_lanes, self.config.max_split_depth);

        let power_rows = lane_regenerations
            .iter()
            .flat_map(|lane| lane.power_rows.iter().cloned())
            .collect::<Vec<_>>();
        let issues = report::build_issues(&ont_validation, &depth_validation, &power_rows);

        debug!(
            "Regenerated. lanes: {}, rows: {}, issues: {}",
            lane_regenerations.len(),
            power_rows.len(),
            issues.len()
        );

        Regeneration {
            lanes: lane_regenerations,
            summary,
            ont_validation,
            depth_validation,
            issues,
        }
    }

    fn ensure_lane_configured(&self, lane: LaneIndex) -> Result<(), AppError> {
        if lane >= self.config.lane_count {
            return Err(AppError::LaneNotConfigured {
                lane,
                lane_count: self.config.lane_count,
            });
        }
        Ok(())
    }
}
