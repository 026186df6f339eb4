//! Viewer timing, energy and endpoint configuration.

use serde::Deserialize;

use super::model::DEFAULT_RADIUS_SCALE;

/// Tunables for the viewer. Every field has a default, so a partial JSON
/// object (or none at all) is a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
	/// Multiplier for `sqrt(sum of weights)` node radii.
	pub radius_scale: f64,
	/// Duration of the search shrink/restore animation.
	pub search_transition_ms: f64,
	/// Duration of selection edge grow/shrink and edge layer fades.
	pub highlight_transition_ms: f64,
	/// Duration of the intro animation after a load.
	pub intro_transition_ms: f64,
	/// Edge layer opacity while any node is highlighted.
	pub dim_opacity: f64,
	/// Simulation energy at rest.
	pub rest_energy: f64,
	/// Simulation energy while any node is being dragged.
	pub drag_energy: f64,
	/// Simulation steps run before the graph is first shown.
	pub presettle_ticks: usize,
	/// How long a persistent tooltip waits for the pointer to reach it.
	pub tooltip_grace_ms: f64,
	/// Region statistics endpoint. Maps are disabled when unset.
	pub stats_endpoint: Option<String>,
	/// Element id the tooltip map is mounted in.
	pub map_mount: String,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			radius_scale: DEFAULT_RADIUS_SCALE,
			search_transition_ms: 500.0,
			highlight_transition_ms: 2000.0,
			intro_transition_ms: 2000.0,
			dim_opacity: 0.5,
			rest_energy: 0.9,
			drag_energy: 1.0,
			presettle_ticks: 30,
			tooltip_grace_ms: 120.0,
			stats_endpoint: None,
			map_mount: "toolmap".to_string(),
		}
	}
}

impl ViewerConfig {
	/// Parse a JSON configuration object.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}
