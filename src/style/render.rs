//! Paint per-column colours over an already styled string.

use super::ansi::{BG_CLOSE, FG_CLOSE, Token, TokenKind, print_width, tokenize};
use super::color::{ColorLevel, Rgba};
use super::gradient::LinearGradient;

/// Apply foreground and/or background gradients to `text`.
///
/// Returns the rendered text and its print width.
pub fn apply_gradients(
    text: &str,
    fg: Option<&LinearGradient>,
    bg: Option<&LinearGradient>,
    level: ColorLevel,
) -> (String, usize) {
    if fg.is_none() && bg.is_none() {
        return (text.to_string(), print_width(text));
    }

    let tokens = tokenize(text);
    let width: usize = tokens.iter().map(|t| t.width).sum();
    let fg_colors = fg.map(|g| g.colors(width)).unwrap_or_default();
    let bg_colors = bg.map(|g| g.colors(width)).unwrap_or_default();

    (render_colors(&tokens, &fg_colors, &bg_colors, level), width)
}

/// Apply explicit per-column colours to `text`.
#[cfg(test)]
pub fn color_string(text: &str, fg: &[Rgba], bg: &[Rgba], level: ColorLevel) -> String {
    render_colors(&tokenize(text), fg, bg, level)
}

struct Painter<'a> {
    level: ColorLevel,
    fg_colors: &'a [Rgba],
    bg_colors: &'a [Rgba],
    last_fg: Option<Rgba>,
    last_bg: Option<Rgba>,
    out: String,
}

impl Painter<'_> {
    /// Emit colour codes for `column`, skipping anything the terminal would
    /// already be showing.
    fn paint_column(&mut self, column: usize, fg: bool, bg: bool) {
        if fg && let Some(&next) = self.fg_colors.get(column) {
            let unchanged = self
                .last_fg
                .is_some_and(|last| self.level.colors_equal(next, last));
            if !unchanged {
                self.last_fg = Some(next);
                self.level.write_fg(&mut self.out, next);
            }
        }
        if bg && let Some(&next) = self.bg_colors.get(column) {
            let unchanged = self
                .last_bg
                .is_some_and(|last| self.level.colors_equal(next, last));
            if !unchanged {
                self.last_bg = Some(next);
                self.level.write_bg(&mut self.out, next);
            }
        }
    }
}

fn render_colors(tokens: &[Token<'_>], fg_colors: &[Rgba], bg_colors: &[Rgba], level: ColorLevel) -> String {
    let width: usize = tokens.iter().map(|t| t.width).sum();
    let mut painter = Painter {
        level,
        fg_colors,
        bg_colors,
        last_fg: None,
        last_bg: None,
        out: String::with_capacity(width * 20),
    };
    let has_fg = !fg_colors.is_empty();
    let has_bg = !bg_colors.is_empty();

    let mut column = 0;
    let mut prev_fg: Option<&str> = None;
    let mut prev_bg: Option<&str> = None;

    for token in tokens {
        match token.kind {
            TokenKind::Text => {
                // Text the input already coloured keeps its colour.
                let paint_fg = has_fg && token.fg.is_none();
                let paint_bg = has_bg && token.bg.is_none();
                if paint_fg || paint_bg {
                    for ch in token.content.chars() {
                        painter.paint_column(column, paint_fg, paint_bg);
                        painter.out.push(ch);
                        column += 1;
                    }
                } else {
                    painter.out.push_str(token.content);
                    column += token.width;
                }
            }
            TokenKind::ComplexChar => {
                painter.paint_column(
                    column,
                    has_fg && token.fg.is_none(),
                    has_bg && token.bg.is_none(),
                );
                painter.out.push_str(token.content);
                column += token.width;
            }
            TokenKind::EscapeCode => {
                if has_fg && token.content == FG_CLOSE {
                    painter.last_fg = None;
                } else if has_bg && token.content == BG_CLOSE {
                    painter.last_bg = None;
                } else {
                    if prev_fg != token.fg {
                        painter.last_fg = None;
                    }
                    if prev_bg != token.bg {
                        painter.last_bg = None;
                    }
                    painter.out.push_str(token.content);
                }
                prev_fg = token.fg;
                prev_bg = token.bg;
            }
        }
    }

    if level != ColorLevel::None {
        if has_fg {
            painter.out.push_str(FG_CLOSE);
        }
        if has_bg {
            painter.out.push_str(BG_CLOSE);
        }
    }

    painter.out
}
