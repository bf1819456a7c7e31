use std::collections::BTreeMap;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::lane::Lane;
use crate::node::{Node, NodeKind, NodeSpec, ParentLink};
use crate::{LaneIndex, NodeId, PortNumber};

/// The number of OLT ports, and therefore lanes, that can be used.
pub const MAX_LANES: LaneIndex = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Unknown lane. lane: {0}, max_lanes: {max}", max = MAX_LANES)]
    UnknownLane(LaneIndex),

    #[error("Unknown node. lane: {lane}, node: {node}")]
    UnknownNode { lane: LaneIndex, node: NodeId },

    #[error("Node has no ports. node: {0}")]
    NodeHasNoPorts(NodeId),

    #[error("Unknown port. node: {node}, port: {port}, ratio: {ratio}")]
    UnknownPort { node: NodeId, port: PortNumber, ratio: u32 },

    #[error("Port in use. node: {node}, port: {port}, connection: {connection}")]
    PortInUse {
        node: NodeId,
        port: PortNumber,
        connection: NodeId,
    },

    #[error("Invalid ratio. ratio: {0}, expected a value > 0")]
    InvalidRatio(u32),

    #[error("Ports beyond the new ratio are in use. node: {node}, ratio: {ratio}, ports: [{}]", .ports.iter().join(", "))]
    PortsBeyondRatioInUse {
        node: NodeId,
        ratio: u32,
        ports: Vec<PortNumber>,
    },
}

/// All the lanes of a design, and the id allocator shared by them.
///
/// Every mutation either applies completely or, on error, leaves the network untouched.
///
/// Serialize only, a network is built through its mutations so port connections always match the parent links.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Network {
    lanes: BTreeMap<LaneIndex, Lane>,
    next_node_id: NodeId,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(&self, index: LaneIndex) -> Option<&Lane> {
        self.lanes.get(&index)
    }

    /// Lanes that have been used, in lane order.
    pub fn lanes(&self) -> impl Iterator<Item = (LaneIndex, &Lane)> {
        self.lanes
            .iter()
            .map(|(index, lane)| (*index, lane))
    }

    pub fn node(&self, lane: LaneIndex, id: NodeId) -> Option<&Node> {
        self.lane(lane)
            .and_then(|lane| lane.node(id))
    }

    /// See [`Lane::node_depth`], unknown lanes and nodes have depth 0.
    pub fn node_depth(&self, lane: LaneIndex, id: NodeId) -> usize {
        self.lane(lane)
            .map(|lane| lane.node_depth(id))
            .unwrap_or_default()
    }

    /// Adds a leaf node and, for a non-root node, connects it to the parent's port.
    ///
    /// The parent must be a splitter in the same lane and the port must exist and be free.
    pub fn add_node(
        &mut self,
        lane_index: LaneIndex,
        parent: Option<ParentLink>,
        spec: NodeSpec,
    ) -> Result<NodeId, NetworkError> {
        if lane_index >= MAX_LANES {
            return Err(NetworkError::UnknownLane(lane_index));
        }
        if spec.ratio == 0 {
            return Err(NetworkError::InvalidRatio(spec.ratio));
        }
        if let Some(link) = parent {
            self.check_port_available(lane_index, link)?;
        }

        let id = self.next_node_id;
        self.next_node_id += 1;

        let node = Node::new(id, parent, &spec);
        info!(
            "Added node. lane: {}, node: {}, type: {}, ratio: {}, name: '{}', parent: {:?}",
            lane_index,
            id,
            spec.node_type,
            spec.ratio,
            node.name,
            parent
        );

        let lane = self.lanes.entry(lane_index).or_default();
        lane.insert(node);

        if let Some(link) = parent {
            if let Some(splitter) = lane
                .node_mut(link.node)
                .and_then(Node::as_splitter_mut)
            {
                splitter.connect(link.port, id);
            }
        }

        Ok(id)
    }

    fn check_port_available(&self, lane_index: LaneIndex, link: ParentLink) -> Result<(), NetworkError> {
        let parent = self
            .node(lane_index, link.node)
            .ok_or(NetworkError::UnknownNode {
                lane: lane_index,
                node: link.node,
            })?;

        let splitter = parent
            .as_splitter()
            .ok_or(NetworkError::NodeHasNoPorts(link.node))?;

        let port = splitter
            .port(link.port)
            .ok_or(NetworkError::UnknownPort {
                node: link.node,
                port: link.port,
                ratio: splitter.ratio(),
            })?;

        match port.connection {
            Some(connection) => Err(NetworkError::PortInUse {
                node: link.node,
                port: link.port,
                connection,
            }),
            None => Ok(()),
        }
    }

    /// Deletes the node and its whole subtree, freeing the port on its parent.
    ///
    /// Returns the removed ids in breadth-first order, deleting an unknown node does nothing and returns no ids.
    pub fn delete_node(&mut self, lane_index: LaneIndex, id: NodeId) -> Vec<NodeId> {
        let Some(lane) = self.lanes.get_mut(&lane_index) else {
            debug!("Ignoring delete, unknown lane. lane: {}, node: {}", lane_index, id);
            return vec![];
        };
        let Some(parent) = lane.node(id).map(|node| node.parent) else {
            debug!("Ignoring delete, unknown node. lane: {}, node: {}", lane_index, id);
            return vec![];
        };

        if let Some(link) = parent {
            let freed = lane
                .node_mut(link.node)
                .and_then(Node::as_splitter_mut)
                .map(|splitter| splitter.disconnect(link.port, id))
                .unwrap_or(false);
            trace!("Parent port freed: {}. link: {:?}", freed, link);
        }

        let removed = lane.children_index().subtree(id);
        lane.remove_all(&removed);

        info!(
            "Deleted node. lane: {}, node: {}, removed: [{}]",
            lane_index,
            id,
            removed.iter().join(", ")
        );

        removed
    }

    /// Changes the split ratio of a splitter, or the terminal count of a distribution point.
    ///
    /// A splitter keeps the state of the ports that fit in the new ratio and gains free ports when growing.
    /// Shrinking is refused while any port that would be discarded is still connected.
    pub fn set_ratio(&mut self, lane_index: LaneIndex, id: NodeId, ratio: u32) -> Result<(), NetworkError> {
        if ratio == 0 {
            return Err(NetworkError::InvalidRatio(ratio));
        }

        let node = self
            .lanes
            .get_mut(&lane_index)
            .and_then(|lane| lane.node_mut(id))
            .ok_or(NetworkError::UnknownNode {
                lane: lane_index,
                node: id,
            })?;

        let old_ratio = node.ratio();
        match &mut node.kind {
            NodeKind::Splitter(splitter) => {
                let ports = splitter.used_ports_beyond(ratio);
                if !ports.is_empty() {
                    return Err(NetworkError::PortsBeyondRatioInUse {
                        node: id,
                        ratio,
                        ports,
                    });
                }
                splitter.resize(ratio);
            }
            NodeKind::DistributionPoint(distribution_point) => {
                distribution_point.terminals = ratio;
            }
        }

        info!(
            "Updated node ratio. lane: {}, node: {}, old: {}, new: {}",
            lane_index, id, old_ratio, ratio
        );

        Ok(())
    }

    pub fn rename(&mut self, lane_index: LaneIndex, id: NodeId, name: &str) -> Result<(), NetworkError> {
        let node = self
            .lanes
            .get_mut(&lane_index)
            .and_then(|lane| lane.node_mut(id))
            .ok_or(NetworkError::UnknownNode {
                lane: lane_index,
                node: id,
            })?;

        let name = name.trim().to_string();
        info!(
            "Renamed node. lane: {}, node: {}, old: '{}', new: '{}'",
            lane_index, id, node.name, name
        );
        node.name = name;

        Ok(())
    }
}



#[cfg(test)]
mod delete_node_tests {
    use tap::Tap;

    use super::*;

    /// A (splitter 1:2) -> B (splitter 1:2, port 2) -> C (nap, port 1)
    fn build_chain() -> (Network, NodeId, NodeId, NodeId) {
        let mut network = Network::new();
        let a = network
            .add_node(0, None, NodeSpec::splitter(2, "A"))
            .unwrap();
        let b = network
            .add_node(
                0,
                Some(ParentLink {
                    node: a,
                    port: 2,
                }),
                NodeSpec::splitter(2, "B"),
            )
            .unwrap();
        let c = network
            .add_node(
                0,
                Some(ParentLink {
                    node: b,
                    port: 1,
                }),
                NodeSpec::distribution_point(8, "C"),
            )
            .unwrap();
        (network, a, b, c)
    }

    #[test]
    fn cascades_to_subtree_and_frees_parent_port() {
        // given
        let (mut network, a, b, c) = build_chain();

        // when
        let removed = network.delete_node(0, b);

        // then
        assert_eq!(removed, vec![b, c]);
        let lane = network.lane(0).unwrap();
        assert_eq!(lane.nodes().map(|node| node.id).collect::<Vec<_>>(), vec![a]);
        assert!(!lane
            .node(a)
            .unwrap()
            .as_splitter()
            .unwrap()
            .port(2)
            .unwrap()
            .is_used());
    }

    #[test]
    fn deleting_a_root_empties_the_lane() {
        // given
        let (mut network, a, b, c) = build_chain();

        // when
        let removed = network.delete_node(0, a);

        // then
        assert_eq!(removed, vec![a, b, c]);
        assert!(network.lane(0).unwrap().is_empty());
    }

    #[test]
    fn unknown_node_is_ignored() {
        // given
        let (mut network, ..) = build_chain();
        let before = network.clone();

        // when
        let removed = network.delete_node(0, 42);
        let removed_from_unknown_lane = network.delete_node(5, 0);

        // then
        assert!(removed.is_empty());
        assert!(removed_from_unknown_lane.is_empty());
        assert_eq!(network, before);
    }

    #[test]
    fn ids_are_never_reused() {
        // given
        let (mut network, a, _b, c) = build_chain();
        network.delete_node(0, c);

        // when
        let id = network
            .add_node(
                0,
                Some(ParentLink {
                    node: a,
                    port: 1,
                }),
                NodeSpec::distribution_point(4, "D"),
            )
            .unwrap();

        // then
        assert_eq!(id, c + 1);
        let lane_ids = network
            .lane(0)
            .unwrap()
            .nodes()
            .map(|node| node.id)
            .collect::<Vec<_>>()
            .tap_mut(|ids| ids.sort());
        assert_eq!(lane_ids, vec![a, 1, id]);
    }
}
