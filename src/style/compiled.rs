//! Compiled styles.

use super::color::{ColorLevel, parse_hex};
use super::descriptor::{
    BG_PREFIX, DescriptorError, StyleDescriptor, gradient_stops, modifier_codes,
    named_color_code, parse_descriptor,
};
use super::gradient::LinearGradient;
use super::render::apply_gradients;
use serde::Serialize;
use std::collections::HashMap;

/// Foreground and background colour of a single character, as colour
/// strings (`red`, `#ff0000`). Backgrounds carry a `bg:` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CharacterColors {
    #[serde(rename = "FG")]
    pub fg: String,
    #[serde(rename = "BG")]
    pub bg: String,
}

/// One SGR open/close pair.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layer {
    open: String,
    close: String,
}

impl Layer {
    fn sgr(open: u8, close: u8) -> Self {
        Layer {
            open: format!("\x1b[{}m", open),
            close: format!("\x1b[{}m", close),
        }
    }
}

/// A parsed, ready to apply style. Immutable once built; get one from
/// [`super::Registry::get`].
#[derive(Debug, Clone)]
pub struct Style {
    descriptor: StyleDescriptor,
    level: ColorLevel,
    layers: Vec<Layer>,
    fg_gradient: Option<LinearGradient>,
    bg_gradient: Option<LinearGradient>,
}

fn color_layer(color: &str, background: bool, level: ColorLevel) -> Option<Layer> {
    if let Some(code) = named_color_code(color) {
        let code = if background { code + 10 } else { code };
        return Some(Layer::sgr(code, if background { 49 } else { 39 }));
    }
    let rgb = parse_hex(color)?;
    let mut open = String::new();
    if background {
        level.write_bg(&mut open, rgb);
        Some(Layer {
            open,
            close: "\x1b[49m".to_string(),
        })
    } else {
        level.write_fg(&mut open, rgb);
        Some(Layer {
            open,
            close: "\x1b[39m".to_string(),
        })
    }
}

impl Style {
    pub fn compile(
        custom_colors: &HashMap<String, String>,
        s: &str,
        level: ColorLevel,
    ) -> Result<Self, DescriptorError> {
        let descriptor = parse_descriptor(custom_colors, s)?;
        let mut layers = Vec::new();
        let mut fg_gradient = None;
        let mut bg_gradient = None;

        for (color, background) in [(&descriptor.bg, true), (&descriptor.fg, false)] {
            if color.is_empty() {
                continue;
            }
            if let Some(stops) = gradient_stops(color) {
                let gradient = LinearGradient::parse(stops, Some(custom_colors)).map_err(|source| {
                    DescriptorError::Gradient {
                        token: color.clone(),
                        position: s.find(color.as_str()).map_or(0, |p| p + 1),
                        source,
                    }
                })?;
                if background {
                    bg_gradient = Some(gradient);
                } else {
                    fg_gradient = Some(gradient);
                }
            } else if let Some(layer) = color_layer(color, background, level) {
                layers.push(layer);
            }
        }

        for modifier in &descriptor.modifiers {
            if let Some((open, close)) = modifier_codes(modifier) {
                layers.push(Layer::sgr(open, close));
            }
        }

        Ok(Style {
            descriptor,
            level,
            layers,
            fg_gradient,
            bg_gradient,
        })
    }

    /// Wrap `text` in the style's solid colours and modifiers. Any close
    /// code inside `text` that would end one of our layers early reopens it.
    fn paint(&self, text: &str) -> String {
        if self.level == ColorLevel::None || self.layers.is_empty() || text.is_empty() {
            return text.to_string();
        }

        let mut body = text.to_string();
        for layer in self.layers.iter().rev() {
            if layer.open != layer.close && body.contains(&layer.close) {
                body = body.replace(&layer.close, &format!("{}{}", layer.close, layer.open));
            }
        }

        let mut out = String::with_capacity(body.len() + self.layers.len() * 10);
        for layer in &self.layers {
            out.push_str(&layer.open);
        }
        out.push_str(&body);
        for layer in self.layers.iter().rev() {
            out.push_str(&layer.close);
        }
        out
    }

    /// Apply this style to `text`.
    pub fn apply(&self, text: &str) -> String {
        self.apply_get_colors(text).0
    }

    /// Apply this style to `text`, and report the colours of the first and
    /// last characters.
    pub fn apply_get_colors(&self, text: &str) -> (String, CharacterColors, CharacterColors) {
        let painted = self.paint(text);
        let (result, width) = if self.fg_gradient.is_some() || self.bg_gradient.is_some() {
            apply_gradients(
                &painted,
                self.fg_gradient.as_ref(),
                self.bg_gradient.as_ref(),
                self.level,
            )
        } else {
            (painted, 0)
        };

        let (first_fg, last_fg) = end_colors(&self.descriptor.fg, self.fg_gradient.as_ref(), width);
        let (first_bg, last_bg) = end_colors(&self.descriptor.bg, self.bg_gradient.as_ref(), width);

        let first = CharacterColors {
            fg: first_fg,
            bg: with_bg_prefix(first_bg),
        };
        let last = CharacterColors {
            fg: last_fg,
            bg: with_bg_prefix(last_bg),
        };
        (result, first, last)
    }
}

fn with_bg_prefix(color: String) -> String {
    if color.is_empty() {
        color
    } else {
        format!("{}{}", BG_PREFIX, color)
    }
}

fn end_colors(color: &str, gradient: Option<&LinearGradient>, width: usize) -> (String, String) {
    match gradient {
        Some(gradient) => (
            gradient.color_at(width, -1).to_hex(),
            gradient.color_at(width, width as i64 + 1).to_hex(),
        ),
        None => (color.to_string(), color.to_string()),
    }
}
