//! Name search over graph nodes.

use std::collections::HashSet;

use super::model::{CorrelationGraph, NodeId};

/// A parsed search query: lower-cased, whitespace-separated terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
	terms: Vec<String>,
}

impl SearchQuery {
	/// Returns `None` for an empty or blank query, which clears the filter.
	pub fn parse(query: &str) -> Option<Self> {
		let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
		if terms.is_empty() {
			None
		} else {
			Some(Self { terms })
		}
	}

	#[cfg(test)]
	pub(crate) fn terms(&self) -> &[String] {
		&self.terms
	}

	/// True when `name` contains every term, ignoring case.
	pub fn matches(&self, name: &str) -> bool {
		let name = name.to_lowercase();
		self.terms.iter().all(|t| name.contains(t.as_str()))
	}
}

/// The active name filter.
///
/// `Inactive` means nothing is filtered, which is different from an active
/// filter that happens to match nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SearchFilter {
	#[default]
	Inactive,
	Active(HashSet<NodeId>),
}

impl SearchFilter {
	pub fn is_active(&self) -> bool {
		matches!(self, Self::Active(_))
	}

	/// Whether `node` should be drawn at full size.
	pub fn passes(&self, node: NodeId) -> bool {
		match self {
			Self::Inactive => true,
			Self::Active(set) => set.contains(&node),
		}
	}
}

/// Evaluate `query` against every node name.
pub fn run_search(graph: &CorrelationGraph, query: Option<&str>) -> SearchFilter {
	match query.and_then(SearchQuery::parse) {
		None => SearchFilter::Inactive,
		Some(q) => SearchFilter::Active(
			graph
				.nodes()
				.iter()
				.filter(|n| q.matches(&n.name))
				.map(|n| n.id)
				.collect(),
		),
	}
}
