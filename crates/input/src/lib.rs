//! Navigation input: raw pointer events mapped to orbit actions.
//!
//! # Invariants
//! - Window-system types never leave the app; this crate sees plain
//!   buttons, positions and wheel deltas.
//! - Controls consume actions, never raw events.

pub mod action;

pub use action::{NavAction, PointerButton, PointerState};

pub fn crate_info() -> &'static str {
    "portal-input v0.1.0"
}
