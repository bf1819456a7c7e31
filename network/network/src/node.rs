use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::{NodeId, PortNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Splitter,
    #[serde(alias = "nap")]
    DistributionPoint,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Splitter => f.write_str("Splitter"),
            NodeType::DistributionPoint => f.write_str("DistributionPoint"),
        }
    }
}

/// What to build when adding a node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Split count for a splitter, terminal count for a distribution point.
    pub ratio: u32,
    #[serde(default)]
    pub name: String,
}

impl NodeSpec {
    pub fn splitter(ratio: u32, name: &str) -> Self {
        Self {
            node_type: NodeType::Splitter,
            ratio,
            name: name.to_string(),
        }
    }

    pub fn distribution_point(terminals: u32, name: &str) -> Self {
        Self {
            node_type: NodeType::DistributionPoint,
            ratio: terminals,
            name: name.to_string(),
        }
    }
}

/// The port on the parent through which a node is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ParentLink {
    pub node: NodeId,
    pub port: PortNumber,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Port {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<NodeId>,
}

impl Port {
    pub fn is_used(&self) -> bool {
        self.connection.is_some()
    }
}

/// A passive splitter, the number of ports is the split ratio.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Splitter {
    ports: BTreeMap<PortNumber, Port>,
}

impl Splitter {
    pub fn new(ratio: u32) -> Self {
        let ports = (1..=ratio)
            .map(|port| (port, Port::default()))
            .collect();

        Self {
            ports,
        }
    }

    pub fn ratio(&self) -> u32 {
        self.ports.len() as u32
    }

    pub fn ports(&self) -> &BTreeMap<PortNumber, Port> {
        &self.ports
    }

    pub fn port(&self, port: PortNumber) -> Option<&Port> {
        self.ports.get(&port)
    }

    pub fn used_ports(&self) -> usize {
        self.ports
            .values()
            .filter(|port| port.is_used())
            .count()
    }

    pub fn free_ports(&self) -> impl Iterator<Item = PortNumber> + '_ {
        self.ports
            .iter()
            .filter(|(_, port)| !port.is_used())
            .map(|(number, _)| *number)
    }

    /// Ports that would be discarded by resizing to `ratio` but which still have a connection.
    pub fn used_ports_beyond(&self, ratio: u32) -> Vec<PortNumber> {
        self.ports
            .range(ratio.saturating_add(1)..)
            .filter(|(_, port)| port.is_used())
            .map(|(number, _)| *number)
            .collect()
    }

    pub(crate) fn connect(&mut self, port: PortNumber, node: NodeId) {
        if let Some(port) = self.ports.get_mut(&port) {
            port.connection = Some(node);
        }
    }

    /// Frees the port, but only if it is connected to `node`.
    pub(crate) fn disconnect(&mut self, port: PortNumber, node: NodeId) -> bool {
        match self.ports.get_mut(&port) {
            Some(port) if port.connection == Some(node) => {
                port.connection = None;
                true
            }
            _ => false,
        }
    }

    /// Ports in both the old and the new range keep their state, new ports are free and ports beyond `ratio` are
    /// dropped.
    pub(crate) fn resize(&mut self, ratio: u32) {
        self.ports.retain(|number, _| *number <= ratio);
        for number in 1..=ratio {
            self.ports.entry(number).or_default();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DistributionPoint {
    /// Subscriber terminals (ONTs) served
    pub terminals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Splitter(Splitter),
    DistributionPoint(DistributionPoint),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: NodeId, parent: Option<ParentLink>, spec: &NodeSpec) -> Self {
        let kind = match spec.node_type {
            NodeType::Splitter => NodeKind::Splitter(Splitter::new(spec.ratio)),
            NodeType::DistributionPoint => NodeKind::DistributionPoint(DistributionPoint {
                terminals: spec.ratio,
            }),
        };

        let name = match spec.name.trim() {
            "" => format!("Node {}", id),
            name => name.to_string(),
        };

        Self {
            id,
            parent,
            name,
            kind,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Splitter(_) => NodeType::Splitter,
            NodeKind::DistributionPoint(_) => NodeType::DistributionPoint,
        }
    }

    /// Split ratio for a splitter, terminal count for a distribution point.
    pub fn ratio(&self) -> u32 {
        match &self.kind {
            NodeKind::Splitter(splitter) => splitter.ratio(),
            NodeKind::DistributionPoint(distribution_point) => distribution_point.terminals,
        }
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent.map(|link| link.node)
    }

    pub fn parent_port(&self) -> Option<PortNumber> {
        self.parent.map(|link| link.port)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn as_splitter(&self) -> Option<&Splitter> {
        match &self.kind {
            NodeKind::Splitter(splitter) => Some(splitter),
            NodeKind::DistributionPoint(_) => None,
        }
    }

    pub(crate) fn as_splitter_mut(&mut self) -> Option<&mut Splitter> {
        match &mut self.kind {
            NodeKind::Splitter(splitter) => Some(splitter),
            NodeKind::DistributionPoint(_) => None,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let badge = match self.kind {
            NodeKind::Splitter(_) => "SPLIT",
            NodeKind::DistributionPoint(_) => "NAP",
        };
        write!(f, "{} ({} 1:{})", self.name, badge, self.ratio())
    }
}

#[cfg(test)]
mod splitter_tests {
    use rstest::rstest;

    use super::*;

    fn splitter_with_used_ports(ratio: u32, used: &[PortNumber]) -> Splitter {
        let mut splitter = Splitter::new(ratio);
        for (index, port) in used.iter().enumerate() {
            splitter.connect(*port, 100 + index as NodeId);
        }
        splitter
    }

    #[test]
    fn new_splitter_has_all_ports_free() {
        // when
        let splitter = Splitter::new(4);

        // then
        assert_eq!(splitter.ratio(), 4);
        assert_eq!(splitter.used_ports(), 0);
        assert_eq!(splitter.free_ports().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn shrink_keeps_state_of_remaining_ports() {
        // given
        let mut splitter = splitter_with_used_ports(4, &[2]);

        // when
        splitter.resize(2);

        // then
        assert_eq!(splitter.ratio(), 2);
        assert_eq!(splitter.port(2).unwrap().connection, Some(100));
        assert!(!splitter.port(1).unwrap().is_used());
        assert!(splitter.port(3).is_none());
    }

    #[test]
    fn grow_adds_free_ports() {
        // given
        let mut splitter = splitter_with_used_ports(2, &[2]);

        // when
        splitter.resize(6);

        // then
        assert_eq!(splitter.ratio(), 6);
        assert!(splitter.port(2).unwrap().is_used());
        assert!(!splitter.port(5).unwrap().is_used());
        assert!(!splitter.port(6).unwrap().is_used());
    }

    #[rstest]
    #[case(4, &[1, 3, 4], 2, vec![3, 4])]
    #[case(4, &[1, 2], 2, vec![])]
    #[case(8, &[8], 4, vec![8])]
    #[case(2, &[1], 4, vec![])]
    fn used_ports_beyond(
        #[case] ratio: u32,
        #[case] used: &[PortNumber],
        #[case] new_ratio: u32,
        #[case] expected: Vec<PortNumber>,
    ) {
        // given
        let splitter = splitter_with_used_ports(ratio, used);

        // expect
        assert_eq!(splitter.used_ports_beyond(new_ratio), expected);
    }

    #[test]
    fn disconnect_requires_matching_connection() {
        // given
        let mut splitter = splitter_with_used_ports(2, &[1]);

        // expect
        assert!(!splitter.disconnect(1, 42));
        assert!(splitter.port(1).unwrap().is_used());
        assert!(splitter.disconnect(1, 100));
        assert!(!splitter.port(1).unwrap().is_used());
    }
}
