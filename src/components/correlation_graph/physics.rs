//! `force_graph` simulation behind the [`PhysicsEngine`] contract.

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::adapter::PhysicsEngine;
use super::model::{CorrelationGraph, NodeId};

/// Radius of the circle nodes start on, in graph units.
const START_RADIUS: f64 = 100.0;
/// Fixed step used for pre-settling.
const SETTLE_DT: f32 = 0.016;

fn parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

/// Force simulation centered on the origin.
///
/// Energy scales the time step handed to the simulation, so a higher target
/// makes the layout react faster while something is being dragged. Pinned
/// nodes become anchors and are excluded from movement.
pub struct ForcePhysics {
	graph: ForceGraph<NodeId, ()>,
	indices: Vec<DefaultNodeIdx>,
	positions: Vec<(f64, f64)>,
	energy: f64,
	presettle_ticks: usize,
}

impl ForcePhysics {
	pub fn new(presettle_ticks: usize) -> Self {
		Self {
			graph: ForceGraph::new(parameters()),
			indices: Vec::new(),
			positions: Vec::new(),
			energy: 1.0,
			presettle_ticks,
		}
	}

	pub fn energy(&self) -> f64 {
		self.energy
	}

	fn refresh_positions(&mut self) {
		let positions = &mut self.positions;
		self.graph.visit_nodes(|node| {
			let id = node.data.user_data;
			if let Some(slot) = positions.get_mut(id.0) {
				*slot = (node.x() as f64, node.y() as f64);
			}
		});
	}
}

impl PhysicsEngine for ForcePhysics {
	fn attach(&mut self, graph: &CorrelationGraph) {
		self.graph = ForceGraph::new(parameters());
		self.indices.clear();
		self.positions.clear();

		let count = graph.len().max(1) as f64;
		for node in graph.nodes() {
			let angle = node.id.0 as f64 * 2.0 * PI / count;
			let (x, y) = (START_RADIUS * angle.cos(), START_RADIUS * angle.sin());
			let idx = self.graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: node.id,
			});
			self.indices.push(idx);
			self.positions.push((x, y));
		}
		for edge in graph.edges() {
			self.graph.add_edge(
				self.indices[edge.source.0],
				self.indices[edge.target.0],
				EdgeData::default(),
			);
		}

		for _ in 0..self.presettle_ticks {
			self.graph.update(SETTLE_DT);
		}
		self.refresh_positions();
	}

	fn set_energy_target(&mut self, energy: f64) {
		self.energy = energy.max(0.0);
	}

	fn set_fixed(&mut self, node: NodeId, position: Option<(f64, f64)>) {
		let Some(&idx) = self.indices.get(node.0) else {
			return;
		};
		self.graph.visit_nodes_mut(|n| {
			if n.index() == idx {
				match position {
					Some((x, y)) => {
						n.data.x = x as f32;
						n.data.y = y as f32;
						n.data.is_anchor = true;
					}
					None => n.data.is_anchor = false,
				}
			}
		});
		if let (Some(p), Some(slot)) = (position, self.positions.get_mut(node.0)) {
			*slot = p;
		}
	}

	fn position(&self, node: NodeId) -> Option<(f64, f64)> {
		self.positions.get(node.0).copied()
	}

	fn tick(&mut self, dt: f64) {
		if self.indices.is_empty() {
			return;
		}
		self.graph.update((dt * self.energy) as f32);
		self.refresh_positions();
	}
}

#[cfg(test)]
mod tests {
	use super::super::model::tests::star;
	use super::*;

	#[test]
	fn attach_places_every_node() {
		let mut physics = ForcePhysics::new(0);
		physics.attach(&star());
		assert!(physics.position(NodeId(3)).is_some());
		assert!(physics.position(NodeId(4)).is_none());
		let (x, y) = physics.position(NodeId(0)).unwrap();
		assert!((x - START_RADIUS).abs() < 1e-3 && y.abs() < 1e-3);
	}

	#[test]
	fn pinned_node_holds_position() {
		let mut physics = ForcePhysics::new(5);
		physics.attach(&star());
		physics.set_fixed(NodeId(1), Some((42.0, -7.0)));
		for _ in 0..20 {
			physics.tick(0.016);
		}
		let (x, y) = physics.position(NodeId(1)).unwrap();
		assert!((x - 42.0).abs() < 1e-3);
		assert!((y + 7.0).abs() < 1e-3);
	}

	#[test]
	fn energy_is_never_negative() {
		let mut physics = ForcePhysics::new(0);
		physics.set_energy_target(-1.0);
		assert_eq!(physics.energy(), 0.0);
		physics.set_fixed(NodeId(0), None);
		physics.tick(0.016);
	}
}
