//! Contracts with the collaborators the interaction core drives.
//!
//! The controller never draws, simulates or fetches anything itself. It only
//! issues calls through these traits, which keeps it runnable without a
//! browser: the canvas renderer, the `force_graph` simulation and the HTTP
//! loader implement them for the real page.

use std::rc::Rc;

use super::choropleth::{ChoroplethKey, RegionStats};
use super::error::LoadError;
use super::model::{CorrelationGraph, EdgeId, NodeId};
use super::selection::LayerId;
use super::theme::Color;
use super::tween::Transition;

/// What an attribute call or transition applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
	Node(NodeId),
	/// The base edge layer as a whole.
	EdgeLayer,
	/// Every base edge, individually.
	Edges,
	/// Selection edges owned by one highlight.
	SelectionLayer(LayerId),
}

/// An attribute set immediately, without animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attribute {
	Radius(f64),
	Opacity(f64),
	/// Visible fraction of each line, see [`Tween::Dash`](super::tween::Tween::Dash).
	DashFraction(f64),
	Highlighted(bool),
	Sublighted(bool),
}

/// Drawing side of the viewer.
pub trait RenderAdapter {
	/// Create one shape per node, replacing any previous binding.
	fn bind_nodes(&mut self, graph: &CorrelationGraph);
	/// Create one line per edge, replacing any previous binding.
	fn bind_edges(&mut self, graph: &CorrelationGraph);
	fn set_attribute(&mut self, target: Target, attribute: Attribute);
	fn transition(&mut self, target: Target, transition: Transition);
	/// Draw `edges` as selection edges in `color`, starting invisible.
	fn add_selection_layer(&mut self, layer: LayerId, edges: &[EdgeId], color: Color);
	/// Play `exit` on the layer, then drop it.
	fn remove_selection_layer(&mut self, layer: LayerId, exit: Transition);
	fn show_tooltip(&mut self, tooltip: &Tooltip);
	fn hide_tooltip(&mut self);
	fn show_region_tip(&mut self, region: &str, value: Option<f64>);
	fn hide_region_tip(&mut self);
}

/// Position side of the viewer.
pub trait PhysicsEngine {
	/// Start simulating `graph`, dropping anything simulated before.
	fn attach(&mut self, graph: &CorrelationGraph);
	/// Energy the simulation is kept at; higher keeps nodes moving.
	fn set_energy_target(&mut self, energy: f64);
	/// Pin `node` at a position, or release it with `None`.
	fn set_fixed(&mut self, node: NodeId, position: Option<(f64, f64)>);
	fn position(&self, node: NodeId) -> Option<(f64, f64)>;
	/// Advance the simulation by `dt` seconds.
	fn tick(&mut self, dt: f64);
}

/// Source of region statistics for tooltip maps.
pub trait ChoroplethLoader {
	/// Start loading stats for `key.dataset`. Never blocks.
	fn fetch(&mut self, key: &ChoroplethKey);
	/// Requests that finished since the last call.
	fn drain_completed(&mut self) -> Vec<(ChoroplethKey, Result<RegionStats, LoadError>)>;
}

/// State of the map embedded in a tooltip.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MapStatus {
	/// The tooltip has no map.
	#[default]
	None,
	Loading(ChoroplethKey),
	Ready(ChoroplethKey, Rc<RegionStats>),
	/// The lookup failed; shown as "no map available".
	Unavailable(ChoroplethKey),
}

/// Correlation to a highlighted neighbor, listed in the tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationLine {
	pub neighbor: NodeId,
	pub weight: f64,
	/// Color of the neighbor's document.
	pub color: Color,
}

/// Everything the renderer needs to draw the node tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub node: NodeId,
	pub title: String,
	pub correlations: Vec<CorrelationLine>,
	/// Graph-space position of the node.
	pub anchor: (f64, f64),
	pub radius: f64,
	/// Shown for a highlighted node: wider, persists while hovered, has a map.
	pub persistent: bool,
	pub map: MapStatus,
}
