//! Graph data structures for input to the correlation graph component.

use serde::Deserialize;

use super::error::GraphError;

/// One node of the input document, as produced by the correlation export.
///
/// `neighbor_indices` point at other records in the same sequence and
/// `weights` holds the correlation coefficient for each of them, index for
/// index. The short keys of the older export format (`n`, `n2`, `c`, `r`) are
/// accepted as aliases.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeRecord {
	/// Display name. Search matches against this.
	#[serde(alias = "n")]
	pub name: String,
	/// Name of the document the series comes from. Drives color grouping.
	#[serde(rename = "documentTag", alias = "n2")]
	pub document_tag: String,
	/// Indices of correlated records.
	#[serde(rename = "neighborIndices", alias = "c", default)]
	pub neighbor_indices: Vec<usize>,
	/// Correlation weight per neighbor.
	#[serde(alias = "r", default)]
	pub weights: Vec<f64>,
}

impl NodeRecord {
	/// Convenience constructor used by tests and demo data.
	pub fn new(name: impl Into<String>, document_tag: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			document_tag: document_tag.into(),
			..Self::default()
		}
	}

	/// Declare a correlation with another record.
	pub fn link(mut self, neighbor: usize, weight: f64) -> Self {
		self.neighbor_indices.push(neighbor);
		self.weights.push(weight);
		self
	}
}

/// Complete input document: one record per node.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GraphData {
	pub records: Vec<NodeRecord>,
}

impl GraphData {
	/// Parse a JSON array of records.
	pub fn from_json(json: &str) -> Result<Self, GraphError> {
		let data = serde_json::from_str(json)?;
		Ok(data)
	}
}
