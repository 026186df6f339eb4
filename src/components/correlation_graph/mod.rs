//! Correlation graph viewer.
//!
//! Draws a force-directed network of correlated data series on an HTML
//! canvas with:
//! - Double-click highlighting of a node's correlation network, with
//!   selection edges drawn in the node's document color
//! - Node dragging, with pinning of highlighted and dragged nodes
//! - Live name search that shrinks non-matching nodes away
//! - Tooltips listing correlations, and a per-region map for highlighted
//!   nodes backed by a cached stats endpoint
//!
//! The interaction logic lives in [`InteractionController`], which only talks
//! to its collaborators through [`RenderAdapter`], [`PhysicsEngine`] and
//! [`ChoroplethLoader`] and so runs without a browser.
//!
//! # Example
//!
//! ```ignore
//! use corr_graph::{CorrelationGraphCanvas, GraphData, NodeRecord};
//!
//! let data = GraphData {
//!     records: vec![
//!         NodeRecord::new("Unemployment", "BLS").link(1, 0.8),
//!         NodeRecord::new("Median income", "Census").link(0, 0.8),
//!     ],
//! };
//!
//! view! { <CorrelationGraphCanvas data=data fullscreen=true /> }
//! ```

mod adapter;
pub mod choropleth;
mod component;
pub mod config;
mod controller;
mod error;
pub mod model;
mod physics;
mod render;
pub mod search;
pub mod selection;
pub mod theme;
pub mod tween;
mod types;

pub use adapter::{
	Attribute, ChoroplethLoader, CorrelationLine, MapStatus, PhysicsEngine, RenderAdapter, Target,
	Tooltip,
};
pub use component::CorrelationGraphCanvas;
pub use config::ViewerConfig;
pub use controller::{EventKind, GraphEvent, InteractionController, Payload, PayloadKind};
pub use error::{GraphError, LoadError};
pub use model::{CorrelationGraph, EdgeId, NodeId};
pub use physics::ForcePhysics;
pub use render::{CanvasRenderer, TooltipOverlay};
pub use types::{GraphData, NodeRecord};
