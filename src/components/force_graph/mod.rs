//! Graph canvas: layout, interaction, styling and drawing.
//!
//! Everything except `component` and `render` is plain Rust and runs natively:
//! - [`layout`] positions nodes (Force, Circular, Hierarchical)
//! - [`simulation`] is the force model behind Force mode
//! - [`interaction`] handles node dragging
//! - [`presentation`] maps metrics and toggles to node styles
//! - [`state`] ties them together in a [`GraphSession`]
//!
//! # Example
//!
//! ```ignore
//! use graph_weave::{ForceGraphCanvas, GraphSession, Viewport};
//!
//! let session = GraphSession::new(Viewport::default()).shared();
//! view! { <ForceGraphCanvas session=session fullscreen=true /> }
//! ```

mod component;
pub mod interaction;
pub mod layout;
pub mod presentation;
mod render;
pub mod simulation;
pub mod state;
pub mod theme;

pub use component::ForceGraphCanvas;
pub use interaction::{DragOutcome, InteractionController};
pub use layout::{Body, LayoutEngine, LayoutMode, LayoutPhase, Viewport};
pub use presentation::{NodeStyle, StyleConfig, StyleToggles};
pub use simulation::{ForceParameters, ForceSimulation};
pub use state::{GraphSession, MetricsStatus, SessionStatus, SharedSession};
pub use theme::Theme;
