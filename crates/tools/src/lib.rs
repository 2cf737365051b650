//! Developer Tooling: a debug panel built from typed control bindings.
//!
//! A binding pairs a label with a getter/setter over some target state.
//! The panel itself holds no values; views read through the getters and
//! write through the bindings, which apply range clamping and change
//! callbacks.
//!
//! # Invariants
//! - A slider write always lands inside the slider's range.
//! - Bindings can only reach fields their accessor functions name.

pub mod panel;

pub use panel::{ColorBinding, Control, DebugPanel, Folder, PanelEntry, PanelError, SliderBinding};

pub fn crate_info() -> &'static str {
    "portal-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
