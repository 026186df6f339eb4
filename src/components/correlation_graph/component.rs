//! Leptos component wrapping the correlation graph canvas.
//!
//! The component creates the canvas, the tooltip overlay and the search and
//! legend controls, and translates their DOM events into [`GraphEvent`]s for
//! the controller. An animation loop runs via `requestAnimationFrame`, ticking
//! the controller and redrawing each frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::choropleth::HttpChoroplethLoader;
use super::config::ViewerConfig;
use super::controller::{EventKind, GraphEvent, InteractionController, Payload};
use super::model::{CorrelationGraph, NodeId};
use super::physics::ForcePhysics;
use super::render::{CanvasRenderer, TooltipOverlay};
use super::types::GraphData;

/// Frame step handed to the controller, in seconds.
const FRAME_DT: f64 = 0.016;

type Controller = InteractionController<CanvasRenderer, ForcePhysics, HttpChoroplethLoader>;
type Callback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

struct GraphContext {
	controller: Controller,
	ctx: CanvasRenderingContext2d,
	/// Node under an active drag.
	dragging: Option<NodeId>,
}

impl GraphContext {
	/// Replace the graph, keeping whatever is typed in the search box applied.
	fn load(&mut self, data: &GraphData, query: &str) {
		if let Err(e) = self.controller.load_records(&data.records) {
			warn!("corr-graph: rejected graph data: {}", e);
			self.controller.load(CorrelationGraph::default());
		}
		self.controller.run_search(Some(query));
		self.dragging = None;
	}

	fn event_at(&self, kind: EventKind, node: NodeId, sx: f64, sy: f64) -> GraphEvent {
		let (gx, gy) = self.controller.render().screen_to_graph(sx, sy);
		GraphEvent::node(kind, node).at(gx, gy)
	}

	fn node_at(&self, sx: f64, sy: f64) -> Option<NodeId> {
		self.controller
			.render()
			.node_at(self.controller.physics(), sx, sy)
	}

	fn end_drag(&mut self) {
		if let Some(node) = self.dragging.take() {
			self.controller
				.dispatch(GraphEvent::node(EventKind::DragEnd, node));
		}
	}

	fn leave_hovered(&mut self) {
		if let Some(prev) = self.controller.hovered() {
			self.controller
				.dispatch(GraphEvent::node(EventKind::PointerOut, prev));
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Drop the graph state and detach the resize listener once the canvas is gone.
fn release<T>(context: &RefCell<Option<T>>, resize_cb: &RefCell<Option<Closure<dyn FnMut()>>>) {
	context.borrow_mut().take();
	let Some(cb) = resize_cb.borrow_mut().take() else {
		return;
	};
	if let Some(window) = web_sys::window() {
		let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}
}

/// Canvas-relative position of a mouse event.
fn local_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Region id of the map row under the pointer, if any.
fn event_region(ev: &MouseEvent) -> Option<String> {
	let target: Element = ev.target()?.dyn_into().ok()?;
	target
		.closest("[data-region]")
		.ok()??
		.get_attribute("data-region")
}

/// Renders the interactive correlation graph.
///
/// Pass node records via the reactive `data` signal; each change reloads the
/// graph and drops all highlights. The component sizes itself to its parent
/// container by default; set `fullscreen = true` to fill the viewport and
/// resize with the window.
#[component]
pub fn CorrelationGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: ViewerConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let tooltip_ref = NodeRef::<leptos::html::Div>::new();
	let tooltip_text_ref = NodeRef::<leptos::html::Div>::new();
	let map_ref = NodeRef::<leptos::html::Div>::new();
	let region_tip_ref = NodeRef::<leptos::html::Div>::new();
	let search_ref = NodeRef::<leptos::html::Input>::new();
	let legend = RwSignal::new(Vec::new());
	let map_mount = config.map_mount.clone();

	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Callback = Rc::new(RefCell::new(None));
	let resize_cb: Callback = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let records = data.get();
		let query = search_ref
			.get_untracked()
			.map(|input| input.value())
			.unwrap_or_default();
		if let Some(c) = context_init.borrow_mut().as_mut() {
			c.load(&records, &query);
			legend.set(c.controller.legend());
			return;
		}

		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("corr-graph: canvas has no 2d context");
				return;
			}
		};

		let overlay = TooltipOverlay {
			wrap: tooltip_ref.get().map(HtmlElement::from),
			text: tooltip_text_ref.get().map(HtmlElement::from),
			map: map_ref.get().map(HtmlElement::from),
			region_tip: region_tip_ref.get().map(HtmlElement::from),
		};
		let controller = InteractionController::new(
			CorrelationGraph::default(),
			CanvasRenderer::new(w, h, overlay),
			ForcePhysics::new(config.presettle_ticks),
			HttpChoroplethLoader::new(config.stats_endpoint.clone()),
			config.clone(),
		);
		let mut graph_context = GraphContext {
			controller,
			ctx,
			dragging: None,
		};
		graph_context.load(&records, &query);
		legend.set(graph_context.controller.legend());
		*context_init.borrow_mut() = Some(graph_context);

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.controller.render_mut().resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner, resize_anim) =
			(context_init.clone(), animate_init.clone(), resize_cb_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !canvas.is_connected() {
				release(&*context_anim, &*resize_anim);
				// Freeing a closure while it runs is deferred until it returns.
				drop(animate_inner.borrow_mut().take());
				debug!("corr-graph: canvas detached, animation loop stopped");
				return;
			}
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.controller.tick(FRAME_DT);
				c.controller.render_mut().advance(FRAME_DT * 1000.0);
				c.controller.render().draw(&c.ctx, c.controller.physics());
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let canvas_position = move |ev: &MouseEvent| {
		canvas_ref
			.get()
			.map(|canvas| local_position(&canvas.into(), ev))
	};

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(&ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut()
			&& let Some(node) = c.node_at(x, y)
		{
			let event = c.event_at(EventKind::DragStart, node, x, y);
			c.dragging = Some(node);
			c.controller.dispatch(event);
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(&ev) else {
			return;
		};
		let mut guard = context_mm.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		if let Some(node) = c.dragging {
			let event = c.event_at(EventKind::Drag, node, x, y);
			c.controller.dispatch(event);
			return;
		}
		let hit = c.node_at(x, y);
		if hit != c.controller.hovered() {
			c.leave_hovered();
			if let Some(node) = hit {
				let event = c.event_at(EventKind::PointerOver, node, x, y);
				c.controller.dispatch(event);
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			c.end_drag();
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.end_drag();
			c.leave_hovered();
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(&ev) else {
			return;
		};
		if let Some(ref mut c) = *context_dc.borrow_mut()
			&& let Some(node) = c.node_at(x, y)
		{
			let event = c.event_at(EventKind::DoubleClick, node, x, y);
			c.controller.dispatch(event);
		}
	};

	let context_te = context.clone();
	let on_tooltip_enter = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_te.borrow_mut() {
			c.controller
				.dispatch(GraphEvent::new(EventKind::PointerOver, Payload::Tooltip));
		}
	};

	let context_tl = context.clone();
	let on_tooltip_leave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_tl.borrow_mut() {
			c.controller
				.dispatch(GraphEvent::new(EventKind::PointerOut, Payload::Tooltip));
		}
	};

	let context_ro = context.clone();
	let on_region_over = move |ev: MouseEvent| {
		if let (Some(region), Some(c)) = (event_region(&ev), context_ro.borrow_mut().as_mut()) {
			c.controller
				.dispatch(GraphEvent::new(EventKind::PointerOver, Payload::Region(region)));
		}
	};

	let context_rl = context.clone();
	let on_region_out = move |ev: MouseEvent| {
		if let (Some(region), Some(c)) = (event_region(&ev), context_rl.borrow_mut().as_mut()) {
			c.controller
				.dispatch(GraphEvent::new(EventKind::PointerOut, Payload::Region(region)));
		}
	};

	let context_search = context.clone();
	let on_search = move |ev: web_sys::Event| {
		let query = event_target_value(&ev);
		if let Some(ref mut c) = *context_search.borrow_mut() {
			c.controller.run_search(Some(&query));
		}
	};

	let context_clear = context.clone();
	let on_clear = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_clear.borrow_mut() {
			c.controller.clear_highlights();
		}
	};

	view! {
		<div class="correlation-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="correlation-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				style="display: block; cursor: pointer;"
			/>
			<div
				node_ref=tooltip_ref
				class="tooltip"
				style="position: absolute; display: none;"
				on:mouseenter=on_tooltip_enter
				on:mouseleave=on_tooltip_leave
			>
				<div node_ref=tooltip_text_ref class="tooltip-text"></div>
				<div
					node_ref=map_ref
					id=map_mount
					class="tooltip-map"
					on:mouseover=on_region_over
					on:mouseout=on_region_out
				></div>
				<div node_ref=region_tip_ref class="region-tip" style="display: none;"></div>
			</div>
			<div class="graph-controls">
				<input
					type="search"
					class="graph-search"
					placeholder="Search variables"
					node_ref=search_ref
					on:input=on_search
				/>
				<button class="clear-highlights" on:click=on_clear>
					"Clear highlights"
				</button>
				<ul class="graph-legend">
					{move || {
						legend
							.get()
							.into_iter()
							.map(|(tag, color)| {
								view! {
									<li>
										<span
											class="swatch"
											style=format!("background: {};", color.to_css())
										></span>
										{tag}
									</li>
								}
							})
							.collect_view()
					}}
				</ul>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn release_drops_graph_state() {
		let context = RefCell::new(Some(7_u32));
		let resize_cb = RefCell::new(None);
		release(&context, &resize_cb);
		assert!(context.borrow().is_none());
		release(&context, &resize_cb);
		assert!(context.borrow().is_none());
	}
}
