//! Error types for graph loading and region statistics lookups.

use thiserror::Error;

/// Input graph data that cannot be turned into a graph.
///
/// Raised by [`CorrelationGraph::build`](super::model::CorrelationGraph::build)
/// before anything is bound to the renderer or the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
	#[error("invalid graph data: node {node} lists {neighbors} neighbors but {weights} weights")]
	MismatchedWeights {
		node: usize,
		neighbors: usize,
		weights: usize,
	},

	#[error("invalid graph data: node {node} references neighbor {index}, but there are only {len} nodes")]
	NeighborOutOfRange { node: usize, index: usize, len: usize },

	#[error("invalid graph data: node {node} has a non-finite weight for neighbor {index}")]
	NonFiniteWeight { node: usize, index: usize },

	#[error("failed to parse graph data: {0}")]
	Parse(String),
}

impl From<serde_json::Error> for GraphError {
	fn from(e: serde_json::Error) -> Self {
		Self::Parse(e.to_string())
	}
}

/// A failed region statistics request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
	#[error("region stats request failed: {0}")]
	Request(String),

	#[error("region stats endpoint answered with status {0}")]
	Status(u16),

	#[error("region stats response is malformed: {0}")]
	Malformed(String),

	#[error("no region stats endpoint configured")]
	Disabled,
}

impl From<serde_json::Error> for LoadError {
	fn from(e: serde_json::Error) -> Self {
		Self::Malformed(e.to_string())
	}
}
