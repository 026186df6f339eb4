//! Canvas rendering for the correlation graph.
//!
//! [`CanvasRenderer`] keeps the display state of every bound shape, advances
//! running transitions once per frame and draws everything in passes for
//! correct z-ordering:
//! 1. Background (screen space)
//! 2. Base edges, faded as a layer while anything is highlighted
//! 3. Selection edges of each highlight
//! 4. Nodes, with rings for highlighted and sub-highlighted nodes
//!
//! The node tooltip and the region tip are DOM overlays positioned over the
//! canvas.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlElement};

use super::adapter::{Attribute, MapStatus, PhysicsEngine, RenderAdapter, Target, Tooltip};
use super::model::{CorrelationGraph, EdgeId, NodeId};
use super::selection::LayerId;
use super::theme::{Color, GraphStyle, TagPalette};
use super::tween::{Transition, Tween, dash_pattern};

/// Smallest radius a node can be picked at.
const MIN_HIT_RADIUS: f64 = 3.0;
/// Regions listed in a tooltip map.
const MAP_ROWS: usize = 12;

#[derive(Clone, Debug)]
struct NodeDisplay {
	radius: f64,
	color: Color,
	/// Border opacity: strongest correlation of the node.
	border_alpha: f64,
	highlighted: bool,
	sublighted: bool,
}

#[derive(Clone, Debug)]
struct EdgeDisplay {
	source: NodeId,
	target: NodeId,
	weight: f64,
}

#[derive(Clone, Debug)]
struct SelectionLayer {
	id: LayerId,
	edges: Vec<EdgeId>,
	color: Color,
	fraction: f64,
	retiring: bool,
}

/// Which animated value a tween drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
	Radius,
	Opacity,
	Dash,
}

impl Channel {
	fn of(tween: &Tween) -> Self {
		match tween {
			Tween::Radius { .. } => Channel::Radius,
			Tween::Opacity { .. } => Channel::Opacity,
			Tween::Dash { .. } => Channel::Dash,
		}
	}
}

#[derive(Clone, Debug)]
struct Animation {
	target: Target,
	transition: Transition,
	from: f64,
	elapsed_ms: f64,
}

/// DOM elements of the tooltip overlay.
#[derive(Clone, Debug, Default)]
pub struct TooltipOverlay {
	pub wrap: Option<HtmlElement>,
	pub text: Option<HtmlElement>,
	pub map: Option<HtmlElement>,
	pub region_tip: Option<HtmlElement>,
}

/// Canvas implementation of [`RenderAdapter`].
#[derive(Clone, Debug)]
pub struct CanvasRenderer {
	nodes: Vec<NodeDisplay>,
	edges: Vec<EdgeDisplay>,
	edge_fraction: f64,
	edge_layer_opacity: f64,
	layers: Vec<SelectionLayer>,
	animations: Vec<Animation>,
	style: GraphStyle,
	overlay: TooltipOverlay,
	pub width: f64,
	pub height: f64,
}

impl CanvasRenderer {
	pub fn new(width: f64, height: f64, overlay: TooltipOverlay) -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			edge_fraction: 1.0,
			edge_layer_opacity: 1.0,
			layers: Vec::new(),
			animations: Vec::new(),
			style: GraphStyle::default(),
			overlay,
			width,
			height,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Graph-space point for a canvas pixel. The graph is centered on the canvas.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(sx - self.width / 2.0, sy - self.height / 2.0)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx + self.width / 2.0, gy + self.height / 2.0)
	}

	/// Topmost drawn node under a canvas pixel.
	pub fn node_at(&self, physics: &impl PhysicsEngine, sx: f64, sy: f64) -> Option<NodeId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.nodes
			.iter()
			.enumerate()
			.rev()
			.filter(|(_, d)| d.radius > 0.01)
			.find_map(|(i, d)| {
				let (x, y) = physics.position(NodeId(i))?;
				let (dx, dy) = (x - gx, y - gy);
				((dx * dx + dy * dy).sqrt() <= d.radius.max(MIN_HIT_RADIUS)).then_some(NodeId(i))
			})
	}

	/// Displayed radius of a node, mid-animation included.
	pub fn radius(&self, node: NodeId) -> f64 {
		self.nodes.get(node.0).map(|d| d.radius).unwrap_or(0.0)
	}

	#[cfg(test)]
	pub(crate) fn edge_layer_opacity(&self) -> f64 {
		self.edge_layer_opacity
	}

	/// Selection edges still on screen, not counting layers on their way out.
	pub fn selection_edge_count(&self) -> usize {
		self.layers
			.iter()
			.filter(|l| !l.retiring)
			.map(|l| l.edges.len())
			.sum()
	}

	#[cfg(test)]
	pub(crate) fn is_animating(&self) -> bool {
		!self.animations.is_empty()
	}

	fn current(&self, target: Target, channel: Channel) -> f64 {
		match (target, channel) {
			(Target::Node(n), Channel::Radius) => self.radius(n),
			(Target::EdgeLayer, Channel::Opacity) => self.edge_layer_opacity,
			(Target::Edges, Channel::Dash) => self.edge_fraction,
			(Target::SelectionLayer(id), Channel::Dash) => self
				.layers
				.iter()
				.find(|l| l.id == id)
				.map(|l| l.fraction)
				.unwrap_or(0.0),
			_ => 0.0,
		}
	}

	fn apply(&mut self, target: Target, channel: Channel, value: f64) {
		match (target, channel) {
			(Target::Node(n), Channel::Radius) => {
				if let Some(d) = self.nodes.get_mut(n.0) {
					d.radius = value.max(0.0);
				}
			}
			(Target::EdgeLayer, Channel::Opacity) => self.edge_layer_opacity = value,
			(Target::Edges, Channel::Dash) => self.edge_fraction = value,
			(Target::SelectionLayer(id), Channel::Dash) => {
				if let Some(l) = self.layers.iter_mut().find(|l| l.id == id) {
					l.fraction = value;
				}
			}
			_ => {}
		}
	}

	/// Interrupt any transition already running on the same value.
	fn interrupt(&mut self, target: Target, channel: Channel) {
		self.animations
			.retain(|a| !(a.target == target && Channel::of(&a.transition.tween) == channel));
	}

	/// Advance every running transition by `dt_ms`.
	pub fn advance(&mut self, dt_ms: f64) {
		let mut animations = std::mem::take(&mut self.animations);
		let mut finished_layers = Vec::new();
		animations.retain_mut(|a| {
			a.elapsed_ms += dt_ms;
			let channel = Channel::of(&a.transition.tween);
			let value = a.transition.value_at(a.from, a.elapsed_ms);
			self.apply(a.target, channel, value);
			let done = a.transition.is_done(a.elapsed_ms);
			if done && let Target::SelectionLayer(id) = a.target {
				finished_layers.push(id);
			}
			!done
		});
		// Transitions started while advancing are kept.
		animations.append(&mut self.animations);
		self.animations = animations;
		self.layers
			.retain(|l| !(l.retiring && finished_layers.contains(&l.id)));
	}

	/// Draw the current frame.
	pub fn draw(&self, ctx: &CanvasRenderingContext2d, physics: &impl PhysicsEngine) {
		ctx.set_fill_style_str(&self.style.background.to_css());
		ctx.fill_rect(0.0, 0.0, self.width, self.height);

		ctx.save();
		let _ = ctx.translate(self.width / 2.0, self.height / 2.0);

		ctx.set_global_alpha(self.edge_layer_opacity);
		ctx.set_line_width(self.style.edge_width);
		for edge in &self.edges {
			let stroke = self.style.edge_color.with_alpha(edge.weight * self.style.edge_alpha);
			draw_line(ctx, physics, edge, stroke, self.edge_fraction);
		}
		ctx.set_global_alpha(1.0);

		ctx.set_line_width(self.style.selection_width);
		for layer in &self.layers {
			for edge in layer.edges.iter().filter_map(|e| self.edges.get(e.0)) {
				let stroke = layer.color.with_alpha(edge.weight * self.style.selection_alpha);
				draw_line(ctx, physics, edge, stroke, layer.fraction);
			}
		}
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		for (i, node) in self.nodes.iter().enumerate() {
			if node.radius <= 0.01 {
				continue;
			}
			if let Some((x, y)) = physics.position(NodeId(i)) {
				draw_node(ctx, &self.style, node, x, y);
			}
		}

		ctx.restore();
	}

	fn tooltip_html(&self, tooltip: &Tooltip) -> String {
		let mut html = escape_html(&tooltip.title);
		for line in &tooltip.correlations {
			html.push_str(&format!(
				"<br><span style=\"color: {}\">r = {:.3}</span>",
				line.color.to_css(),
				line.weight
			));
		}
		html
	}

	fn map_html(map: &MapStatus) -> String {
		match map {
			MapStatus::None => String::new(),
			MapStatus::Loading(_) => "<div class=\"map-status\">Loading map…</div>".to_string(),
			MapStatus::Unavailable(_) => {
				"<div class=\"map-status\">No map available</div>".to_string()
			}
			MapStatus::Ready(key, stats) => {
				let mut rows: Vec<(&str, f64)> = stats.iter().collect();
				rows.sort_by(|a, b| b.1.total_cmp(&a.1));
				let mut html = format!(
					"<div class=\"map-title\">{}</div>",
					escape_html(&key.source)
				);
				for (region, value) in rows.into_iter().take(MAP_ROWS) {
					let shade = stats.shade(region).unwrap_or(0.0);
					html.push_str(&format!(
						"<div class=\"region\" data-region=\"{}\" style=\"background: rgba(0, 0, 0, {:.3}); color: {}\">{} <b>{}</b></div>",
						escape_html(region),
						shade,
						if shade > 0.5 { "#fff" } else { "#000" },
						escape_html(region),
						value
					));
				}
				html
			}
		}
	}
}

impl RenderAdapter for CanvasRenderer {
	fn bind_nodes(&mut self, graph: &CorrelationGraph) {
		let palette = TagPalette::new(graph.tags());
		self.nodes = graph
			.nodes()
			.iter()
			.map(|n| NodeDisplay {
				radius: graph.radius(n.id),
				color: palette.get(&n.tag),
				border_alpha: n.max_weight(),
				highlighted: false,
				sublighted: false,
			})
			.collect();
		self.animations
			.retain(|a| !matches!(a.target, Target::Node(_)));
	}

	fn bind_edges(&mut self, graph: &CorrelationGraph) {
		self.edges = graph
			.edges()
			.iter()
			.map(|e| EdgeDisplay {
				source: e.source,
				target: e.target,
				weight: e.weight,
			})
			.collect();
		self.layers.clear();
		self.edge_fraction = 1.0;
		self.edge_layer_opacity = 1.0;
		self.animations
			.retain(|a| matches!(a.target, Target::Node(_)));
	}

	fn set_attribute(&mut self, target: Target, attribute: Attribute) {
		let channel_value = match attribute {
			Attribute::Radius(r) => Some((Channel::Radius, r)),
			Attribute::Opacity(o) => Some((Channel::Opacity, o)),
			Attribute::DashFraction(f) => Some((Channel::Dash, f)),
			_ => None,
		};
		if let Some((channel, value)) = channel_value {
			self.interrupt(target, channel);
			self.apply(target, channel, value);
			return;
		}
		let Target::Node(n) = target else {
			return;
		};
		let Some(d) = self.nodes.get_mut(n.0) else {
			return;
		};
		match attribute {
			Attribute::Highlighted(on) => d.highlighted = on,
			Attribute::Sublighted(on) => d.sublighted = on,
			_ => {}
		}
	}

	fn transition(&mut self, target: Target, transition: Transition) {
		let channel = Channel::of(&transition.tween);
		self.interrupt(target, channel);
		let from = self.current(target, channel);
		if transition.duration_ms <= 0.0 {
			self.apply(target, channel, transition.tween.end(from));
			return;
		}
		self.animations.push(Animation {
			target,
			transition,
			from,
			elapsed_ms: 0.0,
		});
	}

	fn add_selection_layer(&mut self, layer: LayerId, edges: &[EdgeId], color: Color) {
		self.layers.push(SelectionLayer {
			id: layer,
			edges: edges.to_vec(),
			color,
			fraction: 0.0,
			retiring: false,
		});
	}

	fn remove_selection_layer(&mut self, layer: LayerId, exit: Transition) {
		let target = Target::SelectionLayer(layer);
		if exit.duration_ms <= 0.0 {
			self.interrupt(target, Channel::Dash);
			self.layers.retain(|l| l.id != layer);
			return;
		}
		if let Some(l) = self.layers.iter_mut().find(|l| l.id == layer) {
			l.retiring = true;
		}
		self.transition(target, exit);
	}

	fn show_tooltip(&mut self, tooltip: &Tooltip) {
		let Some(wrap) = &self.overlay.wrap else {
			return;
		};
		let (x, y) = self.graph_to_screen(tooltip.anchor.0, tooltip.anchor.1);
		let offset = if tooltip.persistent { 165.0 } else { 115.0 };
		let style = wrap.style();
		let _ = style.set_property("display", "block");
		let _ = style.set_property("bottom", &format!("{}px", tooltip.radius + self.height - y));
		let _ = style.set_property("left", &format!("{}px", x - offset));
		wrap.set_class_name(if tooltip.persistent { "highlighted" } else { "" });

		if let Some(text) = &self.overlay.text {
			text.set_inner_html(&self.tooltip_html(tooltip));
		}
		if let Some(map) = &self.overlay.map {
			map.set_inner_html(&Self::map_html(&tooltip.map));
			let display = if tooltip.map == MapStatus::None { "none" } else { "block" };
			let _ = map.style().set_property("display", display);
		}
	}

	fn hide_tooltip(&mut self) {
		if let Some(wrap) = &self.overlay.wrap {
			let _ = wrap.style().set_property("display", "none");
		}
	}

	fn show_region_tip(&mut self, region: &str, value: Option<f64>) {
		let Some(tip) = &self.overlay.region_tip else {
			return;
		};
		let value = value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string());
		tip.set_inner_html(&format!("{}<br><b>{}</b>", escape_html(region), value));
		let _ = tip.style().set_property("display", "block");
	}

	fn hide_region_tip(&mut self) {
		if let Some(tip) = &self.overlay.region_tip {
			let _ = tip.style().set_property("display", "none");
		}
	}
}

fn draw_line(
	ctx: &CanvasRenderingContext2d,
	physics: &impl PhysicsEngine,
	edge: &EdgeDisplay,
	stroke: Color,
	fraction: f64,
) {
	let (Some((x1, y1)), Some((x2, y2))) = (physics.position(edge.source), physics.position(edge.target))
	else {
		return;
	};
	if fraction <= 0.0 {
		return;
	}
	if fraction < 1.0 {
		let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
		let (dash, gap) = dash_pattern(length, fraction);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap.max(0.001)),
		));
	} else {
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}
	ctx.set_stroke_style_str(&stroke.to_css());
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(x2, y2);
	ctx.stroke();
}

fn draw_node(ctx: &CanvasRenderingContext2d, style: &GraphStyle, node: &NodeDisplay, x: f64, y: f64) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.color.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&style.node_border.with_alpha(node.border_alpha).to_css());
	ctx.set_line_width(if node.highlighted { 2.5 } else { 1.0 });
	ctx.stroke();

	if node.highlighted {
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.radius + 3.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&style.highlight_ring.to_css());
		ctx.set_line_width(1.5);
		ctx.stroke();
	} else if node.sublighted {
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.radius + 2.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&style.sublight_ring.to_css());
		ctx.set_line_width(1.0);
		ctx.stroke();
	}
}

fn escape_html(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}
