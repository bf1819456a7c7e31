use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use network::{ChildrenIndex, Lane, LaneIndex, Node, NodeId};
use serde_with::serde_as;
use tracing::trace;

/// Vertical distance between two automatically placed nodes.
pub const ROW_HEIGHT: f64 = 80.0;
/// Offset of the first automatically placed row below the top of the lane.
pub const FIRST_ROW_OFFSET: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub start_x: f64,
    pub lane_top: f64,
    /// Horizontal distance between depth levels
    pub pad_x: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            start_x: 250.0,
            lane_top: 40.0,
            pad_x: 250.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub depth: usize,
}

/// Positions in placement order, which is a depth-first walk of each root in lane order.
pub type Layout = IndexMap<NodeId, NodePosition>;

/// Positions set explicitly by the user, they win over computed positions until reset or until the node is deleted.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionOverrides {
    #[serde_as(as = "Vec<(_, _)>")]
    overrides: BTreeMap<(LaneIndex, NodeId), Position>,
}

impl PositionOverrides {
    pub fn get(&self, lane: LaneIndex, id: NodeId) -> Option<Position> {
        self.overrides.get(&(lane, id)).copied()
    }

    /// Returns the previous override, if any.
    pub fn set(&mut self, lane: LaneIndex, id: NodeId, position: Position) -> Option<Position> {
        self.overrides
            .insert((lane, id), position)
    }

    pub fn remove_all(&mut self, lane: LaneIndex, ids: &[NodeId]) -> usize {
        let ids: BTreeSet<NodeId> = ids.iter().copied().collect();
        let before = self.overrides.len();
        self.overrides
            .retain(|(override_lane, id), _| !(*override_lane == lane && ids.contains(id)));
        before - self.overrides.len()
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Places every node reachable from a root of the lane.
///
/// Roots are walked in lane order and children in insertion order. A node with a finite override is placed there and
/// does not consume a row, otherwise it goes on the next free row, indented by its depth.
pub fn compute_layout(
    lane_index: LaneIndex,
    lane: &Lane,
    overrides: &PositionOverrides,
    options: &LayoutOptions,
) -> Layout {
    let children_index = lane.children_index();

    let mut placer = Placer {
        lane_index,
        children_index: &children_index,
        overrides,
        options,
        cursor: options.lane_top + FIRST_ROW_OFFSET,
        layout: Layout::with_capacity(lane.len()),
    };

    for root in lane.roots() {
        placer.place_subtree(root);
    }

    placer.layout
}

struct Placer<'a> {
    lane_index: LaneIndex,
    children_index: &'a ChildrenIndex<'a>,
    overrides: &'a PositionOverrides,
    options: &'a LayoutOptions,
    cursor: f64,
    layout: Layout,
}

impl Placer<'_> {
    /// Depth-first, using an explicit work stack.
    fn place_subtree(&mut self, root: &Node) {
        let children_index = self.children_index;
        let mut pending: Vec<(&Node, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = pending.pop() {
            self.place(node, depth);
            pending.extend(
                children_index
                    .children(node.id)
                    .iter()
                    .rev()
                    .map(|child| (*child, depth + 1)),
            );
        }
    }

    fn place(&mut self, node: &Node, depth: usize) {
        let position = match self
            .overrides
            .get(self.lane_index, node.id)
            .filter(Position::is_finite)
        {
            Some(Position {
                x,
                y,
            }) => NodePosition {
                x,
                y,
                depth,
            },
            None => {
                let y = self.cursor;
                self.cursor += ROW_HEIGHT;
                NodePosition {
                    x: self.options.start_x + depth as f64 * self.options.pad_x,
                    y,
                    depth,
                }
            }
        };
        trace!("Placed node. lane: {}, node: {}, position: {:?}", self.lane_index, node.id, position);
        self.layout.insert(node.id, position);
    }
}

#[cfg(test)]
mod compute_layout_tests {
    use network::{Network, NodeSpec};

    use super::*;
    use crate::test_lanes::{add_chain, build_small_network, link};

    #[test]
    fn default_placement() {
        // given
        let network = build_small_network();
        let lane = network.lane(0).unwrap();

        // when
        let layout = compute_layout(0, lane, &PositionOverrides::default(), &LayoutOptions::default());

        // then
        let expected = vec![
            (0, NodePosition { x: 250.0, y: 100.0, depth: 0 }),
            (1, NodePosition { x: 500.0, y: 180.0, depth: 1 }),
            (3, NodePosition { x: 750.0, y: 260.0, depth: 2 }),
            (2, NodePosition { x: 500.0, y: 340.0, depth: 1 }),
        ];
        assert_eq!(layout.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn layout_is_deterministic() {
        // given
        let network = build_small_network();
        let lane = network.lane(0).unwrap();
        let options = LayoutOptions::default();
        let overrides = PositionOverrides::default();

        // when
        let first = compute_layout(0, lane, &overrides, &options);
        let second = compute_layout(0, lane, &overrides, &options);

        // then
        assert_eq!(first, second);
    }

    #[test]
    fn override_is_used_verbatim_and_keeps_the_row_free() {
        // given
        let network = build_small_network();
        let lane = network.lane(0).unwrap();
        let mut overrides = PositionOverrides::default();
        overrides.set(0, 1, Position { x: 12.5, y: -3.0 });

        // when
        let layout = compute_layout(0, lane, &overrides, &LayoutOptions::default());

        // then
        assert_eq!(layout[&1], NodePosition { x: 12.5, y: -3.0, depth: 1 });
        // the feeder's child takes the row the feeder would have used
        assert_eq!(layout[&3], NodePosition { x: 750.0, y: 180.0, depth: 2 });
        assert_eq!(layout[&2], NodePosition { x: 500.0, y: 260.0, depth: 1 });
    }

    #[test]
    fn non_finite_override_is_ignored() {
        // given
        let network = build_small_network();
        let lane = network.lane(0).unwrap();
        let mut overrides = PositionOverrides::default();
        overrides.set(0, 0, Position { x: f64::NAN, y: 10.0 });

        // when
        let layout = compute_layout(0, lane, &overrides, &LayoutOptions::default());

        // then
        assert_eq!(layout[&0], NodePosition { x: 250.0, y: 100.0, depth: 0 });
    }

    #[test]
    fn overrides_are_scoped_to_their_lane() {
        // given
        let network = build_small_network();
        let lane = network.lane(0).unwrap();
        let mut overrides = PositionOverrides::default();
        overrides.set(1, 0, Position { x: 1.0, y: 1.0 });

        // when
        let layout = compute_layout(0, lane, &overrides, &LayoutOptions::default());

        // then
        assert_eq!(layout[&0], NodePosition { x: 250.0, y: 100.0, depth: 0 });
    }

    #[test]
    fn custom_options_and_multiple_roots() {
        // given
        let mut network = Network::new();
        let a = network
            .add_node(2, None, NodeSpec::splitter(2, "A"))
            .unwrap();
        let b = network
            .add_node(2, None, NodeSpec::splitter(2, "B"))
            .unwrap();
        let c = network
            .add_node(2, link(a, 2), NodeSpec::distribution_point(8, "C"))
            .unwrap();
        let options = LayoutOptions {
            start_x: 10.0,
            lane_top: 0.0,
            pad_x: 100.0,
        };

        // when
        let layout = compute_layout(2, network.lane(2).unwrap(), &PositionOverrides::default(), &options);

        // then
        assert_eq!(layout.keys().copied().collect::<Vec<_>>(), vec![a, c, b]);
        assert_eq!(layout[&a], NodePosition { x: 10.0, y: 60.0, depth: 0 });
        assert_eq!(layout[&c], NodePosition { x: 110.0, y: 140.0, depth: 1 });
        assert_eq!(layout[&b], NodePosition { x: 10.0, y: 220.0, depth: 0 });
    }

    #[test]
    fn very_deep_chain_is_placed_without_recursion() {
        // given
        let mut network = Network::new();
        let ids = add_chain(&mut network, 0, 200_000);

        // when
        let layout = compute_layout(0, network.lane(0).unwrap(), &PositionOverrides::default(), &LayoutOptions::default());

        // then
        assert_eq!(layout.len(), 200_000);
        assert_eq!(layout[&ids[199_999]], NodePosition {
            x: 250.0 + 199_999.0 * 250.0,
            y: 100.0 + 199_999.0 * 80.0,
            depth: 199_999
        });
    }

    #[test]
    fn empty_lane() {
        // expect
        assert!(compute_layout(0, &Lane::default(), &PositionOverrides::default(), &LayoutOptions::default()).is_empty());
    }
}
