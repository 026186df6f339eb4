//! UI components.

pub mod correlation_graph;
