//! Style engine.
//!
//! Turns style strings from the configuration (`bold brightBlue`,
//! `linear-gradient(#f00, #00f)`, `bg:$accent`) into compiled [`Style`]s,
//! and applies them to text at the terminal's colour level.

pub mod ansi;
pub mod color;
mod compiled;
pub mod descriptor;
pub mod gradient;
mod registry;
pub mod render;

pub use ansi::print_width;
pub use color::ColorLevel;
pub use compiled::{CharacterColors, Style};
pub use registry::{Registry, to_bg_color, to_fg_color};
