//! Space that grows to fill the rest of the terminal line.
//!
//! The module only emits a marker. Once the whole prompt is rendered, each
//! marker is replaced by spaces so the line spans the terminal width; see
//! [`crate::render::layout_flexible_spaces`].

use super::{Module, ModuleResult};
use crate::context::Context;
use std::sync::Arc;

/// Not something anyone will type by accident.
pub const FLEXIBLE_SPACE_MARKER: &str = "\t \u{a0}/\\;:flex:;\\/\u{a0} \t";

pub struct FlexibleSpaceModule;

impl Module for FlexibleSpaceModule {
    fn execute(&self, _context: &Arc<Context>) -> ModuleResult {
        let mut result = ModuleResult::empty();
        result.default_text = FLEXIBLE_SPACE_MARKER.to_string();
        result
    }
}
