//! Turns pointer events into selection transitions and render/physics calls.
//!
//! Every handler runs to completion, including the render calls it derives,
//! before the next event is dispatched. Asynchronous work (region stats) only
//! re-enters through [`InteractionController::tick`].

use std::collections::HashMap;

use log::{debug, info};

use super::adapter::{
	Attribute, ChoroplethLoader, CorrelationLine, MapStatus, PhysicsEngine, RenderAdapter, Target,
	Tooltip,
};
use super::choropleth::{ChoroplethCache, ChoroplethKey, MapLookup, RegionStats};
use super::config::ViewerConfig;
use super::error::{GraphError, LoadError};
use super::model::{CorrelationGraph, EdgeId, NodeId};
use super::search;
use super::selection::{HighlightChange, SelectionState};
use super::theme::{Color, TagPalette};
use super::tween::{Ease, Transition, Tween};
use super::types::NodeRecord;

/// Kind of user interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	PointerOver,
	PointerOut,
	DoubleClick,
	DragStart,
	Drag,
	DragEnd,
}

/// What the event happened on.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	Node(NodeId),
	Edge(EdgeId),
	/// A region of the tooltip map, by region id.
	Region(String),
	Tooltip,
}

/// Discriminant of [`Payload`], used as dispatch key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
	Node,
	Edge,
	Region,
	Tooltip,
}

impl Payload {
	pub fn kind(&self) -> PayloadKind {
		match self {
			Payload::Node(_) => PayloadKind::Node,
			Payload::Edge(_) => PayloadKind::Edge,
			Payload::Region(_) => PayloadKind::Region,
			Payload::Tooltip => PayloadKind::Tooltip,
		}
	}
}

/// A pointer event in graph coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEvent {
	pub kind: EventKind,
	pub payload: Payload,
	pub position: (f64, f64),
}

impl GraphEvent {
	pub fn new(kind: EventKind, payload: Payload) -> Self {
		Self {
			kind,
			payload,
			position: (0.0, 0.0),
		}
	}

	pub fn node(kind: EventKind, node: NodeId) -> Self {
		Self::new(kind, Payload::Node(node))
	}

	pub fn at(self, x: f64, y: f64) -> Self {
		Self {
			position: (x, y),
			..self
		}
	}
}

type Handler<R, P, L> = fn(&mut InteractionController<R, P, L>, &GraphEvent);

/// Owns the graph and its selection state and drives the collaborators.
pub struct InteractionController<R, P, L> {
	graph: CorrelationGraph,
	selection: SelectionState,
	render: R,
	physics: P,
	loader: L,
	maps: ChoroplethCache,
	palette: TagPalette,
	config: ViewerConfig,
	tooltip: Option<Tooltip>,
	hovered: Option<NodeId>,
	tooltip_hovered: bool,
	/// Remaining grace before a persistent tooltip is hidden.
	hide_in_ms: Option<f64>,
	dispatch: HashMap<(EventKind, PayloadKind), Handler<R, P, L>>,
}

impl<R, P, L> InteractionController<R, P, L>
where
	R: RenderAdapter,
	P: PhysicsEngine,
	L: ChoroplethLoader,
{
	pub fn new(graph: CorrelationGraph, render: R, physics: P, loader: L, config: ViewerConfig) -> Self {
		let mut controller = Self {
			graph: CorrelationGraph::default(),
			selection: SelectionState::new(),
			render,
			physics,
			loader,
			maps: ChoroplethCache::default(),
			palette: TagPalette::default(),
			config,
			tooltip: None,
			hovered: None,
			tooltip_hovered: false,
			hide_in_ms: None,
			dispatch: Self::dispatch_table(),
		};
		controller.load(graph);
		controller
	}

	fn dispatch_table() -> HashMap<(EventKind, PayloadKind), Handler<R, P, L>> {
		use EventKind::*;
		let entries: [((EventKind, PayloadKind), Handler<R, P, L>); 10] = [
			((PointerOver, PayloadKind::Node), Self::on_node_over),
			((PointerOut, PayloadKind::Node), Self::on_node_out),
			((DoubleClick, PayloadKind::Node), Self::on_node_double_click),
			((DragStart, PayloadKind::Node), Self::on_drag_start),
			((Drag, PayloadKind::Node), Self::on_drag),
			((DragEnd, PayloadKind::Node), Self::on_drag_end),
			((PointerOver, PayloadKind::Tooltip), Self::on_tooltip_over),
			((PointerOut, PayloadKind::Tooltip), Self::on_tooltip_out),
			((PointerOver, PayloadKind::Region), Self::on_region_over),
			((PointerOut, PayloadKind::Region), Self::on_region_out),
		];
		entries.into_iter().collect()
	}

	/// Validate and load `records`. Nothing is rendered if they are invalid.
	pub fn load_records(&mut self, records: &[NodeRecord]) -> Result<(), GraphError> {
		let graph = CorrelationGraph::build_with_scale(records, self.config.radius_scale)?;
		self.load(graph);
		Ok(())
	}

	/// Replace the graph and rebuild all selection state.
	pub fn load(&mut self, graph: CorrelationGraph) {
		info!(
			"corr-graph: loaded {} nodes, {} edges",
			graph.len(),
			graph.edges().len()
		);
		self.hide_tooltip();
		self.selection = SelectionState::new();
		self.hovered = None;
		self.tooltip_hovered = false;
		self.palette = TagPalette::new(graph.tags());

		self.render.bind_nodes(&graph);
		self.render.bind_edges(&graph);
		self.physics.attach(&graph);
		self.physics.set_energy_target(self.config.rest_energy);

		let intro = self.config.intro_transition_ms;
		self.render.set_attribute(Target::EdgeLayer, Attribute::Opacity(1.0));
		self.render
			.set_attribute(Target::Edges, Attribute::DashFraction(0.0));
		self.render
			.transition(Target::Edges, Transition::new(Tween::Dash { grow: true }, intro));
		for node in graph.nodes() {
			let target = Target::Node(node.id);
			self.render.set_attribute(target, Attribute::Radius(0.0));
			self.render.transition(
				target,
				Transition::new(Tween::Radius { to: graph.radius(node.id) }, intro),
			);
		}
		self.graph = graph;
	}

	pub fn graph(&self) -> &CorrelationGraph {
		&self.graph
	}

	pub fn selection(&self) -> &SelectionState {
		&self.selection
	}

	pub fn config(&self) -> &ViewerConfig {
		&self.config
	}

	pub fn render(&self) -> &R {
		&self.render
	}

	pub fn render_mut(&mut self) -> &mut R {
		&mut self.render
	}

	pub fn physics(&self) -> &P {
		&self.physics
	}

	#[cfg(test)]
	pub(crate) fn loader_mut(&mut self) -> &mut L {
		&mut self.loader
	}

	pub fn tooltip(&self) -> Option<&Tooltip> {
		self.tooltip.as_ref()
	}

	pub fn hovered(&self) -> Option<NodeId> {
		self.hovered
	}

	/// Color of a node's document.
	pub fn node_color(&self, node: NodeId) -> Color {
		self.graph
			.node(node)
			.map(|n| self.palette.get(&n.tag))
			.unwrap_or(Color::rgb(128, 128, 128))
	}

	/// `(tag, color)` for every document in the graph.
	pub fn legend(&self) -> Vec<(String, Color)> {
		self.palette.legend()
	}

	/// Route an event through the dispatch table. Unhandled events are ignored.
	pub fn dispatch(&mut self, event: GraphEvent) {
		let key = (event.kind, event.payload.kind());
		if let Some(handler) = self.dispatch.get(&key).copied() {
			handler(self, &event);
		}
	}

	/// Advance the simulation, apply finished map lookups and run timers.
	pub fn tick(&mut self, dt: f64) {
		self.physics.tick(dt);

		for (key, result) in self.loader.drain_completed() {
			self.finish_map(key, result);
		}

		if let Some(remaining) = self.hide_in_ms.as_mut() {
			*remaining -= dt * 1000.0;
			if *remaining <= 0.0 {
				self.hide_in_ms = None;
				if !self.tooltip_hovered && self.hovered.is_none() {
					self.hide_tooltip();
				}
			}
		}
	}

	/// Highlight `node`, or drop its highlight if it has one.
	pub fn toggle_highlight(&mut self, node: NodeId) {
		let duration = self.config.highlight_transition_ms;
		match self.selection.toggle_highlight(&self.graph, node) {
			HighlightChange::Added {
				layer,
				network,
				entered_mode,
				pinned,
				newly_sublit,
			} => {
				if pinned {
					self.pin_in_place(node);
				}
				if entered_mode {
					self.render.transition(
						Target::EdgeLayer,
						Transition::new(Tween::Opacity { to: self.config.dim_opacity }, duration)
							.with_ease(Ease::QuadOut),
					);
				}
				let color = self.node_color(node);
				self.render.add_selection_layer(layer, &network, color);
				self.render.transition(
					Target::SelectionLayer(layer),
					Transition::new(Tween::Dash { grow: true }, duration),
				);
				self.render
					.set_attribute(Target::Node(node), Attribute::Highlighted(true));
				for n in newly_sublit {
					self.render
						.set_attribute(Target::Node(n), Attribute::Sublighted(true));
				}
			}
			HighlightChange::Removed {
				layer,
				left_mode,
				unpinned,
				no_longer_sublit,
			} => {
				if unpinned {
					self.physics.set_fixed(node, None);
				}
				self.render.remove_selection_layer(
					layer,
					Transition::new(Tween::Dash { grow: false }, duration),
				);
				if left_mode {
					self.restore_edge_layer();
				}
				self.render
					.set_attribute(Target::Node(node), Attribute::Highlighted(false));
				for n in no_longer_sublit {
					self.render
						.set_attribute(Target::Node(n), Attribute::Sublighted(false));
				}
			}
			HighlightChange::Ignored => {}
		}
	}

	/// Drop every highlight at once.
	pub fn clear_highlights(&mut self) {
		let cleared = self.selection.clear_highlights();
		for &node in &cleared.unpinned {
			self.physics.set_fixed(node, None);
		}
		for &layer in &cleared.layers {
			self.render
				.remove_selection_layer(layer, Transition::new(Tween::Dash { grow: false }, 0.0));
		}
		for &node in &cleared.nodes {
			self.render
				.set_attribute(Target::Node(node), Attribute::Highlighted(false));
		}
		for &node in &cleared.no_longer_sublit {
			self.render
				.set_attribute(Target::Node(node), Attribute::Sublighted(false));
		}
		if cleared.left_mode {
			self.restore_edge_layer();
		}
		debug!("corr-graph: cleared {} highlights", cleared.nodes.len());
	}

	/// Pin `node` for dragging. The simulation is energized while any drag runs.
	pub fn start_drag(&mut self, node: NodeId, at: (f64, f64)) {
		if self.graph.node(node).is_none() {
			return;
		}
		if !self.selection.pins().any_dragging() {
			self.physics.set_energy_target(self.config.drag_energy);
		}
		self.selection.start_drag(node);
		let position = self.physics.position(node).unwrap_or(at);
		self.physics.set_fixed(node, Some(position));
	}

	pub fn drag_to(&mut self, node: NodeId, at: (f64, f64)) {
		if !self.selection.pins().is_dragging(node) {
			return;
		}
		self.physics.set_fixed(node, Some(at));
		if let Some(tooltip) = self.tooltip.as_mut().filter(|t| t.node == node) {
			tooltip.anchor = at;
			self.render.show_tooltip(tooltip);
		}
	}

	/// Release the drag pin. The node stays put if it is still highlighted.
	pub fn end_drag(&mut self, node: NodeId) {
		if !self.selection.pins().is_dragging(node) {
			return;
		}
		if self.selection.end_drag(node) {
			self.physics.set_fixed(node, None);
		}
		if !self.selection.pins().any_dragging() {
			self.physics.set_energy_target(self.config.rest_energy);
		}
	}

	/// Filter nodes by name; `None` or a blank query clears the filter.
	pub fn run_search(&mut self, query: Option<&str>) {
		let filter = search::run_search(&self.graph, query);
		if *self.selection.search() == filter {
			return;
		}
		self.selection.set_search(filter);
		let duration = self.config.search_transition_ms;
		let mut visible = 0;
		for node in self.graph.nodes() {
			let to = if self.selection.search_visible(node.id) {
				visible += 1;
				self.graph.radius(node.id)
			} else {
				0.0
			};
			self.render.transition(
				Target::Node(node.id),
				Transition::new(Tween::Radius { to }, duration),
			);
		}
		debug!(
			"corr-graph: search {:?} leaves {} of {} nodes visible",
			query,
			visible,
			self.graph.len()
		);
	}

	fn restore_edge_layer(&mut self) {
		self.render.transition(
			Target::EdgeLayer,
			Transition::new(Tween::Opacity { to: 1.0 }, self.config.highlight_transition_ms),
		);
	}

	fn pin_in_place(&mut self, node: NodeId) {
		if let Some(position) = self.physics.position(node) {
			self.physics.set_fixed(node, Some(position));
		}
	}

	fn show_tooltip(&mut self, node: NodeId) {
		let Some(n) = self.graph.node(node) else {
			return;
		};
		let persistent = self.selection.is_highlighted(node);
		let correlations = n
			.links
			.iter()
			.filter(|l| self.selection.is_highlighted(l.neighbor))
			.map(|l| CorrelationLine {
				neighbor: l.neighbor,
				weight: l.weight,
				color: self.node_color(l.neighbor),
			})
			.collect();
		let radius = if self.selection.search_visible(node) {
			self.graph.radius(node)
		} else {
			0.0
		};
		let key = ChoroplethKey {
			dataset: n.name.clone(),
			mount: self.config.map_mount.clone(),
			source: n.tag.clone(),
		};
		let tooltip = Tooltip {
			node,
			title: n.name.clone(),
			correlations,
			anchor: self.physics.position(node).unwrap_or_default(),
			radius,
			persistent,
			map: MapStatus::None,
		};
		let map = if persistent {
			self.lookup_map(key)
		} else {
			MapStatus::None
		};

		let tooltip = Tooltip { map, ..tooltip };
		self.render.hide_region_tip();
		self.render.show_tooltip(&tooltip);
		self.tooltip = Some(tooltip);
		self.hide_in_ms = None;
	}

	fn hide_tooltip(&mut self) {
		self.render.hide_tooltip();
		self.render.hide_region_tip();
		self.tooltip = None;
		self.hide_in_ms = None;
	}

	fn lookup_map(&mut self, key: ChoroplethKey) -> MapStatus {
		match self.maps.request(&key) {
			MapLookup::Ready(stats) => MapStatus::Ready(key, stats),
			MapLookup::Pending => MapStatus::Loading(key),
			MapLookup::Fetch => {
				debug!("corr-graph: fetching region stats for {}", key.dataset);
				self.loader.fetch(&key);
				MapStatus::Loading(key)
			}
		}
	}

	fn finish_map(&mut self, key: ChoroplethKey, result: Result<RegionStats, LoadError>) {
		let outcome = self.maps.complete(&key, result);
		let Some(tooltip) = self
			.tooltip
			.as_mut()
			.filter(|t| matches!(&t.map, MapStatus::Loading(k) if *k == key))
		else {
			debug!(
				"corr-graph: region stats for {} arrived after the tooltip moved on",
				key.dataset
			);
			return;
		};
		tooltip.map = match outcome {
			Ok(stats) => MapStatus::Ready(key, stats),
			Err(_) => MapStatus::Unavailable(key),
		};
		self.render.show_tooltip(tooltip);
	}

	fn event_node(event: &GraphEvent) -> Option<NodeId> {
		match event.payload {
			Payload::Node(id) => Some(id),
			_ => None,
		}
	}

	fn on_node_over(&mut self, event: &GraphEvent) {
		if let Some(node) = Self::event_node(event) {
			self.hovered = Some(node);
			self.show_tooltip(node);
		}
	}

	fn on_node_out(&mut self, _event: &GraphEvent) {
		self.hovered = None;
		let persistent = self.tooltip.as_ref().is_some_and(|t| t.persistent);
		if persistent {
			if !self.tooltip_hovered {
				self.hide_in_ms = Some(self.config.tooltip_grace_ms);
			}
		} else {
			self.hide_tooltip();
		}
	}

	fn on_node_double_click(&mut self, event: &GraphEvent) {
		if let Some(node) = Self::event_node(event) {
			self.toggle_highlight(node);
			self.show_tooltip(node);
		}
	}

	fn on_drag_start(&mut self, event: &GraphEvent) {
		if let Some(node) = Self::event_node(event) {
			self.start_drag(node, event.position);
		}
	}

	fn on_drag(&mut self, event: &GraphEvent) {
		if let Some(node) = Self::event_node(event) {
			self.drag_to(node, event.position);
		}
	}

	fn on_drag_end(&mut self, event: &GraphEvent) {
		if let Some(node) = Self::event_node(event) {
			self.end_drag(node);
		}
	}

	fn on_tooltip_over(&mut self, _event: &GraphEvent) {
		self.tooltip_hovered = true;
		self.hide_in_ms = None;
	}

	fn on_tooltip_out(&mut self, _event: &GraphEvent) {
		self.tooltip_hovered = false;
		if self.hovered.is_none() {
			self.hide_tooltip();
		}
	}

	fn on_region_over(&mut self, event: &GraphEvent) {
		let Payload::Region(region) = &event.payload else {
			return;
		};
		let value = match self.tooltip.as_ref().map(|t| &t.map) {
			Some(MapStatus::Ready(_, stats)) => stats.value(region),
			_ => None,
		};
		self.render.show_region_tip(region, value);
	}

	fn on_region_out(&mut self, _event: &GraphEvent) {
		self.render.hide_region_tip();
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::collections::{BTreeMap, HashMap};

	use pretty_assertions::assert_eq;

	use super::super::model::tests::star;
	use super::super::selection::LayerId;
	use super::*;

	/// Applies every attribute and transition end value immediately.
	#[derive(Default)]
	pub(crate) struct RecordingRender {
		pub binds: usize,
		pub radius: HashMap<NodeId, f64>,
		pub highlighted: HashMap<NodeId, bool>,
		pub sublighted: HashMap<NodeId, bool>,
		pub edge_layer_opacity: f64,
		pub layers: BTreeMap<LayerId, Vec<EdgeId>>,
		pub tooltip: Option<Tooltip>,
		pub region_tip: Option<(String, Option<f64>)>,
	}

	impl RenderAdapter for RecordingRender {
		fn bind_nodes(&mut self, _graph: &CorrelationGraph) {
			self.binds += 1;
			self.radius.clear();
		}

		fn bind_edges(&mut self, _graph: &CorrelationGraph) {
			self.layers.clear();
		}

		fn set_attribute(&mut self, target: Target, attribute: Attribute) {
			match (target, attribute) {
				(Target::Node(n), Attribute::Radius(r)) => {
					self.radius.insert(n, r);
				}
				(Target::Node(n), Attribute::Highlighted(h)) => {
					self.highlighted.insert(n, h);
				}
				(Target::Node(n), Attribute::Sublighted(s)) => {
					self.sublighted.insert(n, s);
				}
				(Target::EdgeLayer, Attribute::Opacity(o)) => self.edge_layer_opacity = o,
				_ => {}
			}
		}

		fn transition(&mut self, target: Target, transition: Transition) {
			match (target, transition.tween) {
				(Target::Node(n), Tween::Radius { to }) => {
					self.radius.insert(n, to);
				}
				(Target::EdgeLayer, Tween::Opacity { to }) => self.edge_layer_opacity = to,
				_ => {}
			}
		}

		fn add_selection_layer(&mut self, layer: LayerId, edges: &[EdgeId], _color: Color) {
			self.layers.insert(layer, edges.to_vec());
		}

		fn remove_selection_layer(&mut self, layer: LayerId, _exit: Transition) {
			self.layers.remove(&layer);
		}

		fn show_tooltip(&mut self, tooltip: &Tooltip) {
			self.tooltip = Some(tooltip.clone());
		}

		fn hide_tooltip(&mut self) {
			self.tooltip = None;
		}

		fn show_region_tip(&mut self, region: &str, value: Option<f64>) {
			self.region_tip = Some((region.to_string(), value));
		}

		fn hide_region_tip(&mut self) {
			self.region_tip = None;
		}
	}

	impl RecordingRender {
		pub(crate) fn selection_edge_count(&self) -> usize {
			self.layers.values().map(Vec::len).sum()
		}
	}

	#[derive(Default)]
	pub(crate) struct RecordingPhysics {
		pub positions: HashMap<NodeId, (f64, f64)>,
		pub fixed: HashMap<NodeId, (f64, f64)>,
		pub energy: f64,
		pub ticks: usize,
	}

	impl PhysicsEngine for RecordingPhysics {
		fn attach(&mut self, graph: &CorrelationGraph) {
			self.fixed.clear();
			self.positions = graph
				.nodes()
				.iter()
				.map(|n| (n.id, (n.id.0 as f64 * 10.0, 5.0)))
				.collect();
		}

		fn set_energy_target(&mut self, energy: f64) {
			self.energy = energy;
		}

		fn set_fixed(&mut self, node: NodeId, position: Option<(f64, f64)>) {
			match position {
				Some(p) => {
					self.fixed.insert(node, p);
					self.positions.insert(node, p);
				}
				None => {
					self.fixed.remove(&node);
				}
			}
		}

		fn position(&self, node: NodeId) -> Option<(f64, f64)> {
			self.positions.get(&node).copied()
		}

		fn tick(&mut self, _dt: f64) {
			self.ticks += 1;
		}
	}

	#[derive(Default)]
	pub(crate) struct QueuedLoader {
		pub fetched: Vec<ChoroplethKey>,
		pub done: Vec<(ChoroplethKey, Result<RegionStats, LoadError>)>,
	}

	impl QueuedLoader {
		/// Finish the oldest outstanding fetch for `dataset`.
		fn finish(&mut self, dataset: &str, result: Result<RegionStats, LoadError>) {
			let key = self
				.fetched
				.iter()
				.find(|k| k.dataset == dataset)
				.cloned()
				.unwrap();
			self.done.push((key, result));
		}
	}

	impl ChoroplethLoader for QueuedLoader {
		fn fetch(&mut self, key: &ChoroplethKey) {
			self.fetched.push(key.clone());
		}

		fn drain_completed(&mut self) -> Vec<(ChoroplethKey, Result<RegionStats, LoadError>)> {
			std::mem::take(&mut self.done)
		}
	}

	type TestController = InteractionController<RecordingRender, RecordingPhysics, QueuedLoader>;

	const A: NodeId = NodeId(0);
	const B: NodeId = NodeId(1);
	const C: NodeId = NodeId(2);

	fn controller() -> TestController {
		InteractionController::new(
			star(),
			RecordingRender::default(),
			RecordingPhysics::default(),
			QueuedLoader::default(),
			ViewerConfig::default(),
		)
	}

	fn stats() -> RegionStats {
		RegionStats::new([("06001".to_string(), 4.0), ("06003".to_string(), 8.0)].into())
	}

	#[test]
	fn load_grows_nodes_to_radius() {
		let c = controller();
		assert_eq!(c.render().binds, 1);
		for node in c.graph().nodes() {
			assert_eq!(c.render().radius[&node.id], c.graph().radius(node.id));
		}
		assert_eq!(c.physics().energy, 0.9);
		assert_eq!(c.legend().len(), 2);
	}

	#[test]
	fn invalid_records_render_nothing() {
		let mut c = controller();
		let err = c
			.load_records(&[NodeRecord::new("A", "x").link(3, 0.2)])
			.unwrap_err();
		assert!(matches!(err, GraphError::NeighborOutOfRange { .. }));
		assert_eq!(c.render().binds, 1);
		assert_eq!(c.graph().len(), 4);
	}

	#[test]
	fn highlight_round_trip_restores_everything() {
		let mut c = controller();
		c.toggle_highlight(B);
		assert_eq!(c.selection().highlighted_nodes(), vec![B]);
		assert!(c.physics().fixed.contains_key(&B));
		assert_eq!(c.render().edge_layer_opacity, 0.5);
		assert_eq!(c.render().selection_edge_count(), 3);
		assert_eq!(c.render().sublighted.get(&A), Some(&true));

		c.toggle_highlight(B);
		assert!(c.selection().highlighted().is_empty());
		assert!(c.physics().fixed.is_empty());
		assert_eq!(c.render().edge_layer_opacity, 1.0);
		assert_eq!(c.render().selection_edge_count(), 0);
		assert_eq!(c.render().highlighted.get(&B), Some(&false));
		assert_eq!(c.render().sublighted.get(&A), Some(&false));
	}

	#[test]
	fn edge_layer_stays_dimmed_until_last_highlight_leaves() {
		let mut c = controller();
		c.toggle_highlight(A);
		c.toggle_highlight(C);
		c.toggle_highlight(A);
		assert_eq!(c.render().edge_layer_opacity, 0.5);
		c.toggle_highlight(C);
		assert_eq!(c.render().edge_layer_opacity, 1.0);
	}

	#[test]
	fn clear_highlights_removes_all_layers() {
		let mut c = controller();
		c.toggle_highlight(A);
		c.toggle_highlight(B);
		c.clear_highlights();
		assert_eq!(c.render().selection_edge_count(), 0);
		assert!(c.physics().fixed.is_empty());
		assert_eq!(c.render().edge_layer_opacity, 1.0);
		assert!(!c.selection().in_highlight_mode());
	}

	#[test]
	fn search_round_trip_restores_radius() {
		let mut c = controller();
		c.run_search(Some("alpha"));
		assert!(c.selection().filter_active());
		assert_eq!(c.render().radius[&B], 0.0);
		assert_eq!(c.render().radius[&A], c.graph().radius(A));

		c.run_search(None);
		assert!(!c.selection().filter_active());
		for node in c.graph().nodes() {
			assert_eq!(c.render().radius[&node.id], c.graph().radius(node.id));
		}
	}

	#[test]
	fn unmatched_search_hides_everyone() {
		let mut c = controller();
		c.run_search(Some("nothing here"));
		assert!(c.render().radius.values().all(|&r| r == 0.0));
	}

	#[test]
	fn drag_without_highlight_unpins() {
		let mut c = controller();
		c.dispatch(GraphEvent::node(EventKind::DragStart, C).at(3.0, 4.0));
		assert_eq!(c.physics().energy, 1.0);
		c.dispatch(GraphEvent::node(EventKind::Drag, C).at(50.0, 60.0));
		assert_eq!(c.physics().fixed[&C], (50.0, 60.0));
		c.dispatch(GraphEvent::node(EventKind::DragEnd, C));
		assert!(!c.physics().fixed.contains_key(&C));
		assert_eq!(c.physics().energy, 0.9);
	}

	#[test]
	fn drag_release_keeps_highlight_pin() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.start_drag(B, (0.0, 0.0));
		c.drag_to(B, (7.0, 7.0));
		c.end_drag(B);
		assert_eq!(c.physics().fixed.get(&B), Some(&(7.0, 7.0)));
		c.toggle_highlight(B);
		assert!(!c.physics().fixed.contains_key(&B));
	}

	#[test]
	fn unhighlight_while_dragging_keeps_pin() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.start_drag(B, (0.0, 0.0));
		c.toggle_highlight(B);
		assert!(c.physics().fixed.contains_key(&B));
		c.end_drag(B);
		assert!(!c.physics().fixed.contains_key(&B));
	}

	#[test]
	fn energy_stays_up_while_any_drag_runs() {
		let mut c = controller();
		c.start_drag(A, (0.0, 0.0));
		c.start_drag(C, (0.0, 0.0));
		c.end_drag(A);
		assert_eq!(c.physics().energy, 1.0);
		c.end_drag(C);
		assert_eq!(c.physics().energy, 0.9);
	}

	#[test]
	fn ending_unknown_drag_is_noop() {
		let mut c = controller();
		c.toggle_highlight(A);
		c.end_drag(A);
		assert!(c.physics().fixed.contains_key(&A));
		assert_eq!(c.physics().energy, 0.9);
	}

	#[test]
	fn double_click_highlights_and_shows_persistent_tooltip() {
		let mut c = controller();
		c.dispatch(GraphEvent::node(EventKind::DoubleClick, B));
		assert!(c.selection().is_highlighted(B));
		let tip = c.render().tooltip.clone().unwrap();
		assert_eq!(tip.title, "Beta");
		assert!(tip.persistent);
		assert!(matches!(tip.map, MapStatus::Loading(_)));
	}

	#[test]
	fn tooltip_lists_correlations_to_highlighted_neighbors() {
		let mut c = controller();
		c.toggle_highlight(A);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		let tip = c.tooltip().unwrap();
		assert!(!tip.persistent);
		assert_eq!(tip.map, MapStatus::None);
		assert_eq!(tip.correlations.len(), 1);
		assert_eq!(tip.correlations[0].neighbor, A);
		assert_eq!(tip.correlations[0].weight, 1.0);
		assert_eq!(tip.correlations[0].color, c.node_color(A));
	}

	#[test]
	fn plain_tooltip_hides_on_pointer_out() {
		let mut c = controller();
		c.dispatch(GraphEvent::node(EventKind::PointerOver, C));
		assert!(c.render().tooltip.is_some());
		c.dispatch(GraphEvent::node(EventKind::PointerOut, C));
		assert!(c.render().tooltip.is_none());
	}

	#[test]
	fn persistent_tooltip_survives_move_onto_it() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		c.dispatch(GraphEvent::node(EventKind::PointerOut, B));
		c.dispatch(GraphEvent::new(EventKind::PointerOver, Payload::Tooltip));
		c.tick(1.0);
		assert!(c.render().tooltip.is_some());

		c.dispatch(GraphEvent::new(EventKind::PointerOut, Payload::Tooltip));
		assert!(c.render().tooltip.is_none());
	}

	#[test]
	fn persistent_tooltip_hides_after_grace() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		c.dispatch(GraphEvent::node(EventKind::PointerOut, B));
		c.tick(0.05);
		assert!(c.render().tooltip.is_some());
		c.tick(0.1);
		assert!(c.render().tooltip.is_none());
	}

	#[test]
	fn second_map_lookup_is_served_from_cache() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		assert_eq!(c.loader_mut().fetched.len(), 1);
		c.loader_mut().finish("Beta", Ok(stats()));
		c.tick(0.016);
		assert!(matches!(c.tooltip().unwrap().map, MapStatus::Ready(..)));

		c.dispatch(GraphEvent::node(EventKind::PointerOut, B));
		c.tick(1.0);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		assert_eq!(c.loader_mut().fetched.len(), 1);
		assert!(matches!(c.tooltip().unwrap().map, MapStatus::Ready(..)));
	}

	#[test]
	fn failed_lookup_is_not_left_loading() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		c.loader_mut().finish("Beta", Err(LoadError::Status(502)));
		c.tick(0.016);
		assert!(matches!(
			c.render().tooltip.as_ref().unwrap().map,
			MapStatus::Unavailable(_)
		));
	}

	#[test]
	fn stale_response_is_cached_not_shown() {
		let mut c = controller();
		c.toggle_highlight(A);
		c.toggle_highlight(C);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, A));
		c.dispatch(GraphEvent::node(EventKind::PointerOver, C));
		c.loader_mut().finish("Alpha", Ok(stats()));
		c.tick(0.016);
		let tip = c.tooltip().unwrap();
		assert_eq!(tip.node, C);
		assert!(matches!(&tip.map, MapStatus::Loading(k) if k.dataset == "Gamma"));

		c.dispatch(GraphEvent::node(EventKind::PointerOver, A));
		assert!(matches!(c.tooltip().unwrap().map, MapStatus::Ready(..)));
		assert_eq!(c.loader_mut().fetched.len(), 2);
	}

	#[test]
	fn region_tip_reads_current_map() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.dispatch(GraphEvent::node(EventKind::PointerOver, B));
		c.loader_mut().finish("Beta", Ok(stats()));
		c.tick(0.016);
		c.dispatch(GraphEvent::new(
			EventKind::PointerOver,
			Payload::Region("06003".into()),
		));
		assert_eq!(
			c.render().region_tip,
			Some(("06003".to_string(), Some(8.0)))
		);
		c.dispatch(GraphEvent::new(
			EventKind::PointerOut,
			Payload::Region("06003".into()),
		));
		assert!(c.render().region_tip.is_none());
	}

	#[test]
	fn edge_events_are_ignored() {
		let mut c = controller();
		c.dispatch(GraphEvent::new(EventKind::PointerOver, Payload::Edge(EdgeId(0))));
		c.dispatch(GraphEvent::new(EventKind::DoubleClick, Payload::Edge(EdgeId(0))));
		assert!(c.tooltip().is_none());
		assert!(!c.selection().in_highlight_mode());
	}

	#[test]
	fn reload_resets_selection() {
		let mut c = controller();
		c.toggle_highlight(B);
		c.run_search(Some("beta"));
		c.load(star());
		assert!(!c.selection().in_highlight_mode());
		assert!(!c.selection().filter_active());
		assert!(c.physics().fixed.is_empty());
		assert_eq!(c.render().binds, 2);
	}

	#[test]
	fn query_reapplies_after_reload() {
		let mut c = controller();
		c.run_search(Some("alpha"));
		c.load(star());
		assert_eq!(c.render().radius[&B], c.graph().radius(B));

		c.run_search(Some("alpha"));
		assert!(c.selection().filter_active());
		assert_eq!(c.render().radius[&B], 0.0);
		assert_eq!(c.render().radius[&A], c.graph().radius(A));
	}

	#[test]
	fn blank_query_after_reload_changes_nothing() {
		let mut c = controller();
		c.load(star());
		c.run_search(Some("  "));
		assert!(!c.selection().filter_active());
		for node in c.graph().nodes() {
			assert_eq!(c.render().radius[&node.id], c.graph().radius(node.id));
		}
	}

	#[test]
	fn tick_drives_physics() {
		let mut c = controller();
		c.tick(0.016);
		c.tick(0.016);
		assert_eq!(c.physics().ticks, 2);
	}
}
