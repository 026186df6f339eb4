//! In-memory correlation graph built once per loaded document.
//!
//! Each input record declares its correlations once; building registers the
//! reverse adjacency as well, so every edge is undirected and listed exactly
//! once in the incident list of each endpoint.

use std::collections::HashSet;

use log::warn;

use super::error::GraphError;
use super::types::NodeRecord;

/// Default multiplier applied to `sqrt(sum of weights)` for node radius.
pub const DEFAULT_RADIUS_SCALE: f64 = 1.5;

/// Index of a node in [`CorrelationGraph::nodes`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of an edge in [`CorrelationGraph::edges`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// A neighbor paired with the correlation weight to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub neighbor: NodeId,
	pub weight: f64,
	pub edge: EdgeId,
}

/// A graph vertex: one data series from one document.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub name: String,
	/// Owning document, used for color grouping.
	pub tag: String,
	/// Neighbors in both directions, each paired with its weight.
	pub links: Vec<Link>,
	/// Every edge touching this node, once each.
	pub incident: Vec<EdgeId>,
	radius: f64,
}

impl Node {
	/// Largest correlation weight on this node, 0 for isolated nodes.
	pub fn max_weight(&self) -> f64 {
		self.links.iter().map(|l| l.weight).fold(0.0, f64::max)
	}

	/// Weight of the correlation to `other`, if the two are linked.
	#[cfg(test)]
	pub(crate) fn weight_to(&self, other: NodeId) -> Option<f64> {
		self.links
			.iter()
			.find(|l| l.neighbor == other)
			.map(|l| l.weight)
	}
}

/// An undirected weighted correlation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
	pub id: EdgeId,
	pub source: NodeId,
	pub target: NodeId,
	pub weight: f64,
}

impl Edge {
	#[cfg(test)]
	pub(crate) fn touches(&self, node: NodeId) -> bool {
		self.source == node || self.target == node
	}
}

/// Nodes plus the authoritative edge list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationGraph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
}

impl CorrelationGraph {
	/// Build with the default radius scale.
	pub fn build(records: &[NodeRecord]) -> Result<Self, GraphError> {
		Self::build_with_scale(records, DEFAULT_RADIUS_SCALE)
	}

	/// Validate `records` and build the graph.
	///
	/// Self-referencing links are dropped. Repeated links between the same
	/// pair become parallel edges.
	pub fn build_with_scale(records: &[NodeRecord], radius_scale: f64) -> Result<Self, GraphError> {
		validate(records)?;

		let mut nodes: Vec<Node> = records
			.iter()
			.enumerate()
			.map(|(i, r)| Node {
				id: NodeId(i),
				name: r.name.clone(),
				tag: r.document_tag.clone(),
				links: Vec::new(),
				incident: Vec::new(),
				radius: 0.0,
			})
			.collect();
		let mut edges = Vec::new();

		for (i, record) in records.iter().enumerate() {
			for (&j, &weight) in record.neighbor_indices.iter().zip(&record.weights) {
				if i == j {
					warn!("corr-graph: dropping self-link on node {} ({})", i, record.name);
					continue;
				}
				let id = EdgeId(edges.len());
				let (source, target) = (NodeId(i), NodeId(j));
				edges.push(Edge {
					id,
					source,
					target,
					weight,
				});
				nodes[i].links.push(Link {
					neighbor: target,
					weight,
					edge: id,
				});
				nodes[i].incident.push(id);
				nodes[j].links.push(Link {
					neighbor: source,
					weight,
					edge: id,
				});
				nodes[j].incident.push(id);
			}
		}

		for node in &mut nodes {
			let sum: f64 = node.links.iter().map(|l| l.weight).sum();
			node.radius = sum.max(0.0).sqrt() * radius_scale;
		}

		Ok(Self { nodes, edges })
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.get(id.0)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Visual radius: `sqrt(sum of incident weights) * scale`.
	pub fn radius(&self, id: NodeId) -> f64 {
		self.node(id).map(|n| n.radius).unwrap_or(0.0)
	}

	/// Distinct neighbors of `id`, in link order.
	pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
		let mut seen = HashSet::new();
		self.node(id)
			.map(|n| {
				n.links
					.iter()
					.map(|l| l.neighbor)
					.filter(|&nb| seen.insert(nb))
					.collect()
			})
			.unwrap_or_default()
	}

	/// The "highlight network" of a node: its incident edges, followed by
	/// every edge whose two endpoints are both neighbors of the node.
	pub fn network(&self, id: NodeId) -> Vec<EdgeId> {
		let Some(node) = self.node(id) else {
			return Vec::new();
		};
		let neighbors: HashSet<NodeId> = node.links.iter().map(|l| l.neighbor).collect();
		let mut seen: HashSet<EdgeId> = node.incident.iter().copied().collect();
		let mut network = node.incident.clone();

		for nb in self.neighbors(id) {
			for &eid in &self.nodes[nb.0].incident {
				let edge = &self.edges[eid.0];
				if neighbors.contains(&edge.source)
					&& neighbors.contains(&edge.target)
					&& seen.insert(eid)
				{
					network.push(eid);
				}
			}
		}
		network
	}

	/// Document tags in order of first appearance.
	pub fn tags(&self) -> Vec<&str> {
		let mut seen = HashSet::new();
		self.nodes
			.iter()
			.map(|n| n.tag.as_str())
			.filter(|t| seen.insert(*t))
			.collect()
	}
}

fn validate(records: &[NodeRecord]) -> Result<(), GraphError> {
	let len = records.len();
	for (node, record) in records.iter().enumerate() {
		if record.neighbor_indices.len() != record.weights.len() {
			return Err(GraphError::MismatchedWeights {
				node,
				neighbors: record.neighbor_indices.len(),
				weights: record.weights.len(),
			});
		}
		for (index, (&j, w)) in record
			.neighbor_indices
			.iter()
			.zip(&record.weights)
			.enumerate()
		{
			if j >= len {
				return Err(GraphError::NeighborOutOfRange {
					node,
					index: j,
					len,
				});
			}
			if !w.is_finite() {
				return Err(GraphError::NonFiniteWeight { node, index });
			}
		}
	}
	Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	/// A–B, B–C, B–D with weights 1, 2, 3.
	pub(crate) fn star() -> CorrelationGraph {
		CorrelationGraph::build(&[
			NodeRecord::new("Alpha", "doc1").link(1, 1.0),
			NodeRecord::new("Beta", "doc1").link(2, 2.0).link(3, 3.0),
			NodeRecord::new("Gamma", "doc2"),
			NodeRecord::new("Delta", "doc2"),
		])
		.unwrap()
	}

	#[test]
	fn radius_is_scaled_root_of_weight_sum() {
		let g = star();
		let expected = (1.0f64 + 2.0 + 3.0).sqrt() * 1.5;
		assert!((g.radius(NodeId(1)) - expected).abs() < 1e-12);
		assert!((g.radius(NodeId(0)) - 1.5).abs() < 1e-12);
		assert_eq!(g.radius(NodeId(99)), 0.0);
	}

	#[test]
	fn reverse_adjacency_is_registered() {
		let g = star();
		assert_eq!(g.edges().len(), 3);
		assert_eq!(g.neighbors(NodeId(2)), vec![NodeId(1)]);
		assert_eq!(g.node(NodeId(2)).unwrap().weight_to(NodeId(1)), Some(2.0));
		assert_eq!(
			g.neighbors(NodeId(1)),
			vec![NodeId(0), NodeId(2), NodeId(3)]
		);
	}

	#[test]
	fn network_covers_incident_edges_only_for_star() {
		let g = star();
		assert_eq!(g.network(NodeId(1)), vec![EdgeId(0), EdgeId(1), EdgeId(2)]);
	}

	#[test]
	fn network_includes_edges_among_neighbors() {
		// Star plus C–D and an unrelated E–F.
		let g = CorrelationGraph::build(&[
			NodeRecord::new("A", "x").link(1, 1.0),
			NodeRecord::new("B", "x").link(2, 2.0).link(3, 3.0),
			NodeRecord::new("C", "x").link(3, 0.5),
			NodeRecord::new("D", "x"),
			NodeRecord::new("E", "y").link(5, 0.9),
			NodeRecord::new("F", "y"),
		])
		.unwrap();
		let network = g.network(NodeId(1));
		assert_eq!(network.len(), 4);
		let cd = g
			.edges()
			.iter()
			.find(|e| e.source == NodeId(2) && e.target == NodeId(3))
			.unwrap();
		assert!(network.contains(&cd.id));
		assert!(network.iter().all(|&e| !g.edge(e).unwrap().touches(NodeId(4))));
	}

	#[test]
	fn mismatched_lengths_are_rejected() {
		let mut bad = NodeRecord::new("A", "x").link(1, 0.3);
		bad.weights.push(0.4);
		let err = CorrelationGraph::build(&[bad, NodeRecord::new("B", "x")]).unwrap_err();
		assert_eq!(
			err,
			GraphError::MismatchedWeights {
				node: 0,
				neighbors: 1,
				weights: 2
			}
		);
	}

	#[test]
	fn out_of_range_index_is_rejected() {
		let err = CorrelationGraph::build(&[NodeRecord::new("A", "x").link(5, 0.3)]).unwrap_err();
		assert_eq!(
			err,
			GraphError::NeighborOutOfRange {
				node: 0,
				index: 5,
				len: 1
			}
		);
	}

	#[test]
	fn nan_weight_is_rejected() {
		let err = CorrelationGraph::build(&[
			NodeRecord::new("A", "x").link(1, f64::NAN),
			NodeRecord::new("B", "x"),
		])
		.unwrap_err();
		assert!(matches!(err, GraphError::NonFiniteWeight { node: 0, index: 0 }));
	}

	#[test]
	fn self_links_are_dropped_and_duplicates_kept() {
		let g = CorrelationGraph::build(&[
			NodeRecord::new("A", "x").link(0, 0.5).link(1, 0.2).link(1, 0.2),
			NodeRecord::new("B", "x"),
		])
		.unwrap();
		assert_eq!(g.edges().len(), 2);
		assert_eq!(g.node(NodeId(0)).unwrap().incident.len(), 2);
		assert_eq!(g.neighbors(NodeId(0)), vec![NodeId(1)]);
	}

	#[test]
	fn tags_in_first_appearance_order() {
		assert_eq!(star().tags(), vec!["doc1", "doc2"]);
	}

	fn arb_records() -> impl Strategy<Value = Vec<NodeRecord>> {
		(1usize..12).prop_flat_map(|n| {
			proptest::collection::vec(
				proptest::collection::vec((0..n, 0.0f64..1.0), 0..5),
				n,
			)
			.prop_map(|links| {
				links
					.into_iter()
					.enumerate()
					.map(|(i, ls)| {
						ls.into_iter().fold(
							NodeRecord::new(format!("n{i}"), "doc"),
							|r, (j, w)| r.link(j, w),
						)
					})
					.collect()
			})
		})
	}

	proptest! {
		#[test]
		fn every_edge_listed_once_by_each_endpoint(records in arb_records()) {
			let g = CorrelationGraph::build(&records).unwrap();
			for edge in g.edges() {
				for end in [edge.source, edge.target] {
					let count = g.node(end).unwrap().incident.iter().filter(|&&e| e == edge.id).count();
					prop_assert_eq!(count, 1);
				}
			}
			let incident_total: usize = g.nodes().iter().map(|n| n.incident.len()).sum();
			prop_assert_eq!(incident_total, g.edges().len() * 2);
		}
	}
}
