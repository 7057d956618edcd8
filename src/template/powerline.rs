//! Powerline builder, created from templates with `newPowerline`.
//!
//! ```text
//! {{ $pl := newPowerline "" "" "" }}
//! {{ $pl.Segment "blue" .Data.Modules.directory.Text }}
//! {{ $pl.Segment "green" .Data.Modules.git_head.Text }}
//! {{ $pl.Finish }}
//! ```

use crate::logging;
use crate::style::{CharacterColors, Registry, to_bg_color, to_fg_color};

#[derive(Debug, Clone, Default)]
pub struct Powerline {
    last_color: CharacterColors,
    prefix: String,
    separator: String,
    suffix: String,
    reverse: bool,
}

fn styled(styles: &Registry, descriptor: &str, text: &str) -> String {
    match styles.get(descriptor) {
        Ok(style) => style.apply(text),
        Err(err) => {
            logging::warn(err);
            text.to_string()
        }
    }
}

impl Powerline {
    pub fn new(prefix: &str, separator: &str, suffix: &str, reverse: bool) -> Self {
        Powerline {
            last_color: CharacterColors::default(),
            prefix: prefix.to_string(),
            separator: separator.to_string(),
            suffix: suffix.to_string(),
            reverse,
        }
    }

    /// A segment with `color` as its background. The transition from the
    /// previous segment is drawn first: the prefix takes the previous
    /// background over this one, the suffix the reverse. The separator
    /// sides with the suffix, or the prefix when reversed.
    pub fn segment(&mut self, styles: &Registry, color: &str, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let style = match styles.get(&to_bg_color(color)) {
            Ok(style) => style,
            Err(err) => {
                logging::warn(&err);
                return format!("{}{}", err, text);
            }
        };
        let (colored, first, last) = style.apply_get_colors(text);

        let mut out = String::new();
        if !self.last_color.bg.is_empty() || self.reverse {
            let mut prefix = self.prefix.clone();
            let mut suffix = self.suffix.clone();
            if self.reverse {
                prefix = if self.last_color.bg.is_empty() {
                    self.separator.clone()
                } else {
                    format!("{}{}", self.prefix, self.separator)
                };
            } else {
                suffix = format!("{}{}", self.separator, self.suffix);
            }

            out.push_str(&styled(
                styles,
                &format!(
                    "{} {}",
                    to_fg_color(&first.bg),
                    to_bg_color(&self.last_color.bg)
                ),
                &prefix,
            ));
            out.push_str(&styled(
                styles,
                &format!(
                    "{} {}",
                    to_fg_color(&self.last_color.bg),
                    to_bg_color(&first.bg)
                ),
                &suffix,
            ));
        }

        out.push_str(&colored);
        self.last_color = last;
        if self.last_color.bg.is_empty() {
            self.last_color.bg = "bg:black".to_string();
        }
        out
    }

    /// Close a forward powerline: the separator in the last segment's
    /// background colour, over the terminal's own background.
    pub fn finish(&self, styles: &Registry) -> String {
        if self.last_color.bg.is_empty() || self.reverse {
            return String::new();
        }
        let mut out = styled(
            styles,
            &format!("black {}", to_bg_color(&self.last_color.bg)),
            &self.prefix,
        );
        out.push_str(&styled(
            styles,
            &to_fg_color(&self.last_color.bg),
            &self.separator,
        ));
        out
    }
}
