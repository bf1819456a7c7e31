use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::node::Node;
use crate::NodeId;

/// One independent forest of nodes, connected to a single OLT port.
///
/// Nodes are kept in insertion order, which is also the order in which siblings are visited.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Lane {
    nodes: IndexMap<NodeId, Node>,
}

impl Lane {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|node| node.is_root())
    }

    pub fn children_index(&self) -> ChildrenIndex<'_> {
        ChildrenIndex::build(self)
    }

    /// Number of parent links between the node and its root, a root has depth 0.
    ///
    /// Unknown nodes have depth 0, a parent link to a node that is not in the lane counts as one level.
    /// The walk is bounded by the number of nodes in the lane so a malformed parent chain cannot loop forever.
    pub fn node_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(&id);

        while let Some(parent_id) = current.and_then(Node::parent_id) {
            if depth >= self.nodes.len() {
                break;
            }
            depth += 1;
            current = self.nodes.get(&parent_id);
        }

        depth
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Removes the nodes, preserving the order of the remaining nodes.
    pub(crate) fn remove_all(&mut self, ids: &[NodeId]) {
        let ids: BTreeSet<NodeId> = ids.iter().copied().collect();
        self.nodes
            .retain(|id, _| !ids.contains(id));
    }
}

/// Parent to children adjacency, built once per pass over a lane.
///
/// Children are listed in lane insertion order.
#[derive(Debug)]
pub struct ChildrenIndex<'a> {
    children: BTreeMap<NodeId, Vec<&'a Node>>,
}

impl<'a> ChildrenIndex<'a> {
    fn build(lane: &'a Lane) -> Self {
        let mut children: BTreeMap<NodeId, Vec<&'a Node>> = BTreeMap::new();
        for node in lane.nodes() {
            if let Some(parent_id) = node.parent_id() {
                children
                    .entry(parent_id)
                    .or_default()
                    .push(node);
            }
        }

        Self {
            children,
        }
    }

    pub fn children(&self, id: NodeId) -> &[&'a Node] {
        self.children
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Children ordered by the parent port they are connected to.
    pub fn children_by_port(&self, id: NodeId) -> Vec<&'a Node> {
        let mut children = self.children(id).to_vec();
        children.sort_by_key(|child| child.parent_port());
        children
    }

    /// The node ids of the subtree rooted at `id`, including `id`, in breadth-first order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut subtree = vec![id];
        let mut index = 0;
        while index < subtree.len() {
            let current = subtree[index];
            subtree.extend(
                self.children(current)
                    .iter()
                    .map(|child| child.id),
            );
            index += 1;
        }
        subtree
    }
}
