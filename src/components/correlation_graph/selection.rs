//! Highlight, pin and search state for one loaded graph.
//!
//! The state is owned by the interaction controller and rebuilt from scratch
//! on every load. Transitions return a description of what changed so the
//! controller can issue the matching render and physics calls.

use std::collections::HashSet;

use log::debug;

use super::model::{CorrelationGraph, EdgeId, NodeId};
use super::search::SearchFilter;

/// Identifies the rendered selection edges owned by one highlight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// A highlighted node and the selection edges it owns.
#[derive(Clone, Debug, PartialEq)]
pub struct Highlight {
	pub node: NodeId,
	pub layer: LayerId,
	pub network: Vec<EdgeId>,
	/// Nodes sub-highlighted through this highlight.
	pub neighbors: Vec<NodeId>,
}

/// Why a node is pinned. A node stays pinned while any reason holds.
#[derive(Clone, Debug, Default)]
pub struct PinSet {
	drag: HashSet<NodeId>,
	highlight: HashSet<NodeId>,
}

impl PinSet {
	pub fn is_pinned(&self, node: NodeId) -> bool {
		self.drag.contains(&node) || self.highlight.contains(&node)
	}

	pub fn is_dragging(&self, node: NodeId) -> bool {
		self.drag.contains(&node)
	}

	pub fn any_dragging(&self) -> bool {
		!self.drag.is_empty()
	}

	/// Every pinned node, sorted.
	#[cfg(test)]
	pub(crate) fn pinned(&self) -> Vec<NodeId> {
		let mut all: Vec<NodeId> = self.drag.union(&self.highlight).copied().collect();
		all.sort();
		all
	}
}

/// Result of [`SelectionState::toggle_highlight`].
#[derive(Clone, Debug, PartialEq)]
pub enum HighlightChange {
	Added {
		layer: LayerId,
		network: Vec<EdgeId>,
		/// 0 → 1 highlighted nodes.
		entered_mode: bool,
		/// The node was not pinned before.
		pinned: bool,
		newly_sublit: Vec<NodeId>,
	},
	Removed {
		layer: LayerId,
		/// 1 → 0 highlighted nodes.
		left_mode: bool,
		/// The node is no longer pinned for any reason.
		unpinned: bool,
		no_longer_sublit: Vec<NodeId>,
	},
	/// The node does not exist in the graph.
	Ignored,
}

/// Result of [`SelectionState::clear_highlights`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClearedHighlights {
	pub nodes: Vec<NodeId>,
	pub layers: Vec<LayerId>,
	pub unpinned: Vec<NodeId>,
	pub no_longer_sublit: Vec<NodeId>,
	pub left_mode: bool,
}

/// Process-wide selection state for the current graph.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
	highlighted: Vec<Highlight>,
	pins: PinSet,
	search: SearchFilter,
	next_layer: u64,
}

impl SelectionState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn highlighted(&self) -> &[Highlight] {
		&self.highlighted
	}

	#[cfg(test)]
	pub(crate) fn highlighted_nodes(&self) -> Vec<NodeId> {
		self.highlighted.iter().map(|h| h.node).collect()
	}

	pub fn is_highlighted(&self, node: NodeId) -> bool {
		self.highlighted.iter().any(|h| h.node == node)
	}

	/// Reached as a neighbor of at least one highlighted node.
	#[cfg(test)]
	pub(crate) fn is_sublighted(&self, node: NodeId) -> bool {
		self.highlighted.iter().any(|h| h.neighbors.contains(&node))
	}

	#[cfg(test)]
	pub(crate) fn in_highlight_mode(&self) -> bool {
		!self.highlighted.is_empty()
	}

	pub fn pins(&self) -> &PinSet {
		&self.pins
	}

	pub fn is_pinned(&self, node: NodeId) -> bool {
		self.pins.is_pinned(node)
	}

	/// Number of selection edges currently owned by highlights.
	pub fn selection_edge_count(&self) -> usize {
		self.highlighted.iter().map(|h| h.network.len()).sum()
	}

	fn sublit(&self) -> HashSet<NodeId> {
		self.highlighted
			.iter()
			.flat_map(|h| h.neighbors.iter().copied())
			.collect()
	}

	/// Highlight `node`, or un-highlight it if it already is.
	pub fn toggle_highlight(&mut self, graph: &CorrelationGraph, node: NodeId) -> HighlightChange {
		if graph.node(node).is_none() {
			return HighlightChange::Ignored;
		}
		let before = self.sublit();

		if let Some(pos) = self.highlighted.iter().position(|h| h.node == node) {
			let removed = self.highlighted.remove(pos);
			self.pins.highlight.remove(&node);
			let after = self.sublit();
			let mut no_longer_sublit: Vec<NodeId> = before.difference(&after).copied().collect();
			no_longer_sublit.sort();
			debug!(
				"corr-graph: unhighlighted node {} ({} remain)",
				node.0,
				self.highlighted.len()
			);
			return HighlightChange::Removed {
				layer: removed.layer,
				left_mode: self.highlighted.is_empty(),
				unpinned: !self.pins.is_pinned(node),
				no_longer_sublit,
			};
		}

		let was_pinned = self.pins.is_pinned(node);
		let layer = LayerId(self.next_layer);
		self.next_layer += 1;
		let network = graph.network(node);
		let neighbors = graph.neighbors(node);
		let mut newly_sublit: Vec<NodeId> = neighbors
			.iter()
			.copied()
			.filter(|n| !before.contains(n))
			.collect();
		newly_sublit.sort();

		self.highlighted.push(Highlight {
			node,
			layer,
			network: network.clone(),
			neighbors,
		});
		self.pins.highlight.insert(node);
		debug!(
			"corr-graph: highlighted node {} with {} network edges",
			node.0,
			network.len()
		);

		HighlightChange::Added {
			layer,
			network,
			entered_mode: self.highlighted.len() == 1,
			pinned: !was_pinned,
			newly_sublit,
		}
	}

	/// Drop every highlight, its pins and its selection edges.
	pub fn clear_highlights(&mut self) -> ClearedHighlights {
		let mut no_longer_sublit: Vec<NodeId> = self.sublit().into_iter().collect();
		no_longer_sublit.sort();
		let left_mode = !self.highlighted.is_empty();
		let mut cleared = ClearedHighlights {
			left_mode,
			no_longer_sublit,
			..ClearedHighlights::default()
		};
		for h in self.highlighted.drain(..) {
			self.pins.highlight.remove(&h.node);
			if !self.pins.is_pinned(h.node) {
				cleared.unpinned.push(h.node);
			}
			cleared.nodes.push(h.node);
			cleared.layers.push(h.layer);
		}
		cleared
	}

	/// Start drag-pinning `node`. Returns true if it just became pinned.
	pub fn start_drag(&mut self, node: NodeId) -> bool {
		let was_pinned = self.pins.is_pinned(node);
		self.pins.drag.insert(node);
		!was_pinned
	}

	/// Release the drag pin. Returns true if the node is now unpinned.
	/// Releasing a drag that never started does nothing.
	pub fn end_drag(&mut self, node: NodeId) -> bool {
		self.pins.drag.remove(&node) && !self.pins.is_pinned(node)
	}

	pub fn search(&self) -> &SearchFilter {
		&self.search
	}

	/// Replace the search filter, returning the previous one.
	pub fn set_search(&mut self, filter: SearchFilter) -> SearchFilter {
		std::mem::replace(&mut self.search, filter)
	}

	pub fn search_visible(&self, node: NodeId) -> bool {
		self.search.passes(node)
	}

	#[cfg(test)]
	pub(crate) fn filter_active(&self) -> bool {
		self.search.is_active()
	}
}
