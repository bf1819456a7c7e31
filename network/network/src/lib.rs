pub mod lane;
pub mod network;
pub mod node;

pub use lane::{ChildrenIndex, Lane};
pub use network::{Network, NetworkError, MAX_LANES};
pub use node::{DistributionPoint, Node, NodeKind, NodeSpec, NodeType, ParentLink, Port, Splitter};

/// 0-based, at most [`MAX_LANES`] lanes.
pub type LaneIndex = u8;
/// Unique for the lifetime of a [`Network`], never reused.
pub type NodeId = u32;
/// 1-based
pub type PortNumber = u32;
