use std::collections::BTreeMap;

use network::{ChildrenIndex, Lane, LaneIndex, NodeId, NodeKind};
use tracing::debug;

pub const DEFAULT_NAP_CAPACITY: u32 = 8;
pub const DEFAULT_MAX_ONTS_PER_LANE: u32 = 128;
pub const DEFAULT_MAX_SPLIT_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct NetworkSummary {
    pub total_onts: u32,
    /// Physical enclosures needed to host the distribution points' terminals.
    pub total_naps: u32,
    pub total_splitters: u32,
    pub total_ports: u32,
    pub used_ports: u32,
}

impl NetworkSummary {
    pub fn free_ports(&self) -> u32 {
        self.total_ports
            .saturating_sub(self.used_ports)
    }

    /// Used ports as a rounded percentage of all splitter ports, 0 when there are no ports.
    pub fn port_utilization(&self) -> u32 {
        if self.total_ports == 0 {
            return 0;
        }
        (self.used_ports as f64 / self.total_ports as f64 * 100.0).round() as u32
    }
}

pub fn summarize(lanes: &[(LaneIndex, &Lane)], nap_capacity: u32) -> NetworkSummary {
    let nap_capacity = nap_capacity.max(1);

    lanes
        .iter()
        .flat_map(|(_, lane)| lane.nodes())
        .fold(NetworkSummary::default(), |mut summary, node| {
            match &node.kind {
                NodeKind::Splitter(splitter) => {
                    summary.total_splitters += 1;
                    summary.total_ports += splitter.ratio();
                    summary.used_ports += splitter.used_ports() as u32;
                }
                NodeKind::DistributionPoint(distribution_point) => {
                    summary.total_onts += distribution_point.terminals;
                    summary.total_naps += distribution_point
                        .terminals
                        .div_ceil(nap_capacity);
                }
            }
            summary
        })
}

/// Terminal counts per lane, compared to a per-lane limit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OntValidation {
    pub per_lane_counts: BTreeMap<LaneIndex, u32>,
    pub per_lane_depths: BTreeMap<LaneIndex, usize>,
    pub limit: u32,
    pub ok_global: bool,
}

impl OntValidation {
    /// The first lane, in lane order, with more terminals than the limit.
    pub fn first_violation(&self) -> Option<(LaneIndex, u32)> {
        self.per_lane_counts
            .iter()
            .find(|(_, count)| **count > self.limit)
            .map(|(lane, count)| (*lane, *count))
    }
}

pub fn validate_onts_per_lane(lanes: &[(LaneIndex, &Lane)], limit: u32) -> OntValidation {
    let mut per_lane_counts = BTreeMap::new();
    let mut per_lane_depths = BTreeMap::new();

    for (lane_index, lane) in lanes {
        let count = lane
            .nodes()
            .filter_map(|node| match &node.kind {
                NodeKind::DistributionPoint(distribution_point) => Some(distribution_point.terminals),
                NodeKind::Splitter(_) => None,
            })
            .sum::<u32>();

        per_lane_counts.insert(*lane_index, count);
        per_lane_depths.insert(*lane_index, max_split_depth(lane));
    }

    let ok_global = per_lane_counts
        .values()
        .all(|count| *count <= limit);

    debug!("Validated ONTs per lane. limit: {}, counts: {:?}, ok: {}", limit, per_lane_counts, ok_global);

    OntValidation {
        per_lane_counts,
        per_lane_depths,
        limit,
        ok_global,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DepthViolation {
    pub lane_index: LaneIndex,
    pub max_depth: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DepthValidation {
    pub ok: bool,
    pub violations: Vec<DepthViolation>,
}

pub fn validate_split_depth(lanes: &[(LaneIndex, &Lane)], limit: usize) -> DepthValidation {
    let violations = lanes
        .iter()
        .filter_map(|(lane_index, lane)| {
            let max_depth = max_split_depth(lane);
            (max_depth > limit).then_some(DepthViolation {
                lane_index: *lane_index,
                max_depth,
                limit,
            })
        })
        .collect::<Vec<_>>();

    DepthValidation {
        ok: violations.is_empty(),
        violations,
    }
}

/// The number of levels of the deepest tree in the lane, a lone root counts as 1 and an empty lane as 0.
pub fn max_split_depth(lane: &Lane) -> usize {
    let children_index = lane.children_index();
    lane.roots()
        .map(|root| levels(&children_index, root.id))
        .max()
        .unwrap_or(0)
}

fn levels(children_index: &ChildrenIndex, root: NodeId) -> usize {
    let mut deepest = 0;
    let mut pending: Vec<(NodeId, usize)> = vec![(root, 1)];

    while let Some((id, level)) = pending.pop() {
        deepest = deepest.max(level);
        pending.extend(
            children_index
                .children(id)
                .iter()
                .map(|child| (child.id, level + 1)),
        );
    }

    deepest
}

#[cfg(test)]
mod summarize_tests {
    use network::{Network, NodeSpec};
    use rstest::rstest;

    use super::*;
    use crate::test_lanes::{build_small_network, link};

    #[test]
    fn summary_of_small_network() {
        // given
        let network = build_small_network();
        let lanes = vec![(0, network.lane(0).unwrap())];

        // when
        let summary = summarize(&lanes, 8);

        // then
        assert_eq!(summary, NetworkSummary {
            total_onts: 24,
            total_naps: 3,
            total_splitters: 2,
            total_ports: 6,
            used_ports: 3,
        });
        assert_eq!(summary.free_ports(), 3);
        assert_eq!(summary.port_utilization(), 50);
    }

    #[rstest]
    #[case(8, 1)]
    #[case(9, 2)]
    #[case(16, 2)]
    #[case(17, 3)]
    fn naps_round_up(#[case] terminals: u32, #[case] expected_naps: u32) {
        // given
        let mut network = Network::new();
        network
            .add_node(0, None, NodeSpec::distribution_point(terminals, "Zone"))
            .unwrap();

        // when
        let summary = summarize(&[(0, network.lane(0).unwrap())], 8);

        // then
        assert_eq!(summary.total_naps, expected_naps);
    }

    #[test]
    fn spans_all_lanes() {
        // given
        let mut network = build_small_network();
        let root = network
            .add_node(5, None, NodeSpec::splitter(4, "Other"))
            .unwrap();
        network
            .add_node(5, link(root, 3), NodeSpec::distribution_point(4, "Zone C"))
            .unwrap();
        let lanes = network.lanes().collect::<Vec<_>>();

        // when
        let summary = summarize(&lanes, 8);

        // then
        assert_eq!(summary.total_onts, 28);
        assert_eq!(summary.total_splitters, 3);
        assert_eq!(summary.total_ports, 10);
        assert_eq!(summary.used_ports, 4);
        assert_eq!(summary.port_utilization(), 40);
    }

    #[test]
    fn empty_summary() {
        // when
        let summary = summarize(&[], 8);

        // then
        assert_eq!(summary, NetworkSummary::default());
        assert_eq!(summary.port_utilization(), 0);
    }
}
