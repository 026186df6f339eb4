//! corr-graph: Interactive force-directed viewer for correlated data series.
//!
//! This crate provides a WASM-based viewer that draws the correlation network
//! of a set of data series, lets the user highlight and pin neighborhoods,
//! filter by name and inspect per-region maps of highlighted series.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::correlation_graph::{
	CorrelationGraphCanvas, GraphData, GraphError, NodeRecord, ViewerConfig,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("corr-graph: logging initialized");
}

/// Text of the script element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load node records from a script element with id="graph-data".
/// Expected format: a JSON array of `{ name, documentTag, neighborIndices, weights }`.
/// A missing element yields an empty graph.
fn load_graph_data() -> Result<GraphData, GraphError> {
	let Some(json_text) = script_text("graph-data") else {
		return Ok(GraphData::default());
	};
	let data = GraphData::from_json(&json_text)?;
	info!("corr-graph: read {} records", data.records.len());
	Ok(data)
}

/// Load viewer settings from a script element with id="viewer-config".
/// Missing fields, or a missing element, fall back to defaults.
fn load_viewer_config() -> ViewerConfig {
	let Some(json_text) = script_text("viewer-config") else {
		return ViewerConfig::default();
	};
	ViewerConfig::from_json(&json_text).unwrap_or_else(|e| {
		warn!("corr-graph: failed to parse viewer config: {}", e);
		ViewerConfig::default()
	})
}

/// Main application component.
/// Loads records and settings from the DOM and renders the viewer.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_else(|e| {
		warn!("corr-graph: {}", e);
		GraphData::default()
	});
	let graph_signal = Signal::derive(move || graph_data.clone());
	let config = load_viewer_config();

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Correlation Explorer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<CorrelationGraphCanvas data=graph_signal config=config fullscreen=true />
			<div class="graph-overlay">
				<h1>"Correlation Explorer"</h1>
				<p class="subtitle">
					"Double-click a series to highlight its correlations. Drag to reposition."
				</p>
			</div>
		</div>
	}
}
