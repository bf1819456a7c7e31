use network::{LaneIndex, Network, NodeId, NodeSpec, ParentLink};

pub fn link(node: NodeId, port: u32) -> Option<ParentLink> {
    Some(ParentLink {
        node,
        port,
    })
}

/// Lane 0: root splitter 1:2 (0), port 1 -> splitter 1:4 (1), port 2 -> nap 8 (2), splitter 1 port 1 -> nap 16 (3)
pub fn build_small_network() -> Network {
    let mut network = Network::new();
    let root = network
        .add_node(0, None, NodeSpec::splitter(2, "Root"))
        .unwrap();
    let feeder = network
        .add_node(0, link(root, 1), NodeSpec::splitter(4, "Feeder"))
        .unwrap();
    network
        .add_node(0, link(root, 2), NodeSpec::distribution_point(8, "Zone A"))
        .unwrap();
    network
        .add_node(0, link(feeder, 1), NodeSpec::distribution_point(16, "Zone B"))
        .unwrap();
    network
}

/// A chain of `levels` splitters 1:2 connected on port 1.
pub fn add_chain(network: &mut Network, lane: LaneIndex, levels: usize) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = vec![];
    for level in 0..levels {
        let parent = ids.last().and_then(|id| link(*id, 1));
        let id = network
            .add_node(lane, parent, NodeSpec::splitter(2, &format!("L{}", level)))
            .unwrap();
        ids.push(id);
    }
    ids
}
