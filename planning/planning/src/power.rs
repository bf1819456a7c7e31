use std::fmt::{Debug, Display, Formatter};

use network::{ChildrenIndex, Lane, LaneIndex, Node, NodeId, NodeKind, NodeType};
use optics::{splitter_loss, to_percent, Dbm, PowerLevel, CONNECTOR_LOSS, SPLICE_LOSS};
use tracing::{trace, warn};

/// Decides how the output power of a splitter is shared between its connected children.
pub trait PowerSplitPolicy: Debug {
    /// One percentage per connected child, in port order.
    fn shares(&self, connected: usize) -> Vec<u32>;
}

/// Unbalanced split, the child on the lowest port gets the largest share.
///
/// 1 → [100], 2 → [90, 10], 3 → [70, 20, 10], 4 → [50, 25, 15, 10]. Beyond that the remaining percentage is divided
/// over the remaining children, rounding up, so earlier ports get the remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadedSplit;

impl PowerSplitPolicy for CascadedSplit {
    fn shares(&self, connected: usize) -> Vec<u32> {
        match connected {
            0 => vec![],
            1 => vec![100],
            2 => vec![90, 10],
            3 => vec![70, 20, 10],
            4 => vec![50, 25, 15, 10],
            _ => {
                let mut remaining: u32 = 100;
                (0..connected)
                    .map(|index| {
                        let remaining_children = (connected - index) as u32;
                        let share = remaining.div_ceil(remaining_children);
                        remaining -= share;
                        share
                    })
                    .collect()
            }
        }
    }
}

/// Every connected child receives the full splitter output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformSplit;

impl PowerSplitPolicy for UniformSplit {
    fn shares(&self, connected: usize) -> Vec<u32> {
        vec![100; connected]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicyKind {
    #[default]
    Cascaded,
    Uniform,
}

impl SplitPolicyKind {
    pub fn policy(&self) -> &'static dyn PowerSplitPolicy {
        match self {
            SplitPolicyKind::Cascaded => &CascadedSplit,
            SplitPolicyKind::Uniform => &UniformSplit,
        }
    }
}

impl Display for SplitPolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitPolicyKind::Cascaded => f.write_str("Cascaded"),
            SplitPolicyKind::Uniform => f.write_str("Uniform"),
        }
    }
}

/// The power computed for one node.
///
/// For a splitter it is the output power, for a distribution point the power at the subscriber terminals.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PowerRow {
    /// 1-based
    pub lane_number: u32,
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub path_label: String,
    pub power_dbm: Dbm,
    pub percent: u8,
    pub depth: usize,
    pub level: PowerLevel,
}

impl PowerRow {
    pub fn lane_index(&self) -> LaneIndex {
        self.lane_number.saturating_sub(1) as LaneIndex
    }
}

/// Walks every tree of the lane from its root, roots in lane order and children in port order, and returns one row per
/// reachable node in the order they were visited.
///
/// The walk uses an explicit work stack, chains of any depth are supported.
pub fn propagate(lane_index: LaneIndex, lane: &Lane, tx_power: Dbm, policy: &dyn PowerSplitPolicy) -> Vec<PowerRow> {
    let children_index = lane.children_index();
    let context = Context {
        lane_number: lane_index as u32 + 1,
        children_index: &children_index,
        policy,
    };
    let mut rows = Vec::with_capacity(lane.len());

    for root in lane.roots() {
        let mut pending: Vec<(&Node, usize, Dbm)> = vec![(root, 0, tx_power)];
        while let Some((node, depth, power_in)) = pending.pop() {
            let children = propagate_node(&context, node, depth, power_in, &mut rows);
            // reversed, so the lowest port is visited first
            pending.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|(child, power)| (child, depth + 1, power)),
            );
        }
    }

    rows
}

struct Context<'a> {
    lane_number: u32,
    children_index: &'a ChildrenIndex<'a>,
    policy: &'a dyn PowerSplitPolicy,
}

/// Pushes the row of the node and returns its children, in port order, with the power each one receives.
fn propagate_node<'a>(
    context: &Context<'a>,
    node: &Node,
    depth: usize,
    power_in: Dbm,
    rows: &mut Vec<PowerRow>,
) -> Vec<(&'a Node, Dbm)> {
    match &node.kind {
        NodeKind::Splitter(splitter) => {
            let power_out = power_in - splitter_loss(splitter.ratio()) - SPLICE_LOSS;
            rows.push(build_row(context, node, node.name.clone(), depth, power_out));

            let children = context
                .children_index
                .children_by_port(node.id);
            let shares = context
                .policy
                .shares(children.len());
            if shares.len() != children.len() {
                warn!(
                    "Split policy returned an unexpected number of shares. policy: {:?}, children: {}, shares: {:?}",
                    context.policy,
                    children.len(),
                    shares
                );
            }

            children
                .into_iter()
                .enumerate()
                .map(|(index, child)| {
                    let share = shares
                        .get(index)
                        .copied()
                        .unwrap_or_default();
                    let child_power = power_out * share as f64 / 100.0;
                    trace!(
                        "Split. node: {}, child: {}, share: {}%, power: {}",
                        node.id,
                        child.id,
                        share,
                        child_power
                    );
                    (child, child_power)
                })
                .collect()
        }
        NodeKind::DistributionPoint(distribution_point) => {
            let terminals = distribution_point.terminals;
            let power = power_in - splitter_loss(terminals) - CONNECTOR_LOSS;
            let label = format!("{} → {} ONTs", node.name, terminals);
            rows.push(build_row(context, node, label, depth, power));
            vec![]
        }
    }
}

fn build_row(context: &Context, node: &Node, path_label: String, depth: usize, power: Dbm) -> PowerRow {
    PowerRow {
        lane_number: context.lane_number,
        node_id: node.id,
        node_type: node.node_type(),
        path_label,
        power_dbm: power,
        percent: to_percent(power),
        depth,
        level: PowerLevel::classify(power),
    }
}
