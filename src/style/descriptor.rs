//! Style descriptor parsing.
//!
//! A descriptor is a whitespace separated list of tokens:
//!
//! - a named colour (`red`, `brightBlue`, `grey`) or modifier (`bold`)
//! - a hex colour (`#f80`, `#ff8800`)
//! - `linear-gradient(...)`
//! - a custom colour (`$accent`), looked up in the registry's colour map
//! - any colour prefixed with `bg:` or `bg` (`bg:red`, `bgRed`, `bg:#fff`)
//!
//! Later colours replace earlier ones.

use super::color::is_hex_color;
use super::gradient::StopsError;
use std::collections::HashMap;
use std::fmt;

pub const LINEAR_GRADIENT_PREFIX: &str = "linear-gradient(";
pub const BG_PREFIX: &str = "bg:";

/// Custom colours may refer to other custom colours, but not indefinitely.
const MAX_CUSTOM_COLOR_DEPTH: usize = 16;

const NAMED_COLORS: &[(&str, u8)] = &[
    ("black", 30),
    ("red", 31),
    ("green", 32),
    ("yellow", 33),
    ("blue", 34),
    ("magenta", 35),
    ("cyan", 36),
    ("white", 37),
    ("gray", 90),
    ("grey", 90),
    ("brightBlack", 90),
    ("blackBright", 90),
    ("brightRed", 91),
    ("redBright", 91),
    ("brightGreen", 92),
    ("greenBright", 92),
    ("brightYellow", 93),
    ("yellowBright", 93),
    ("brightBlue", 94),
    ("blueBright", 94),
    ("brightMagenta", 95),
    ("magentaBright", 95),
    ("brightCyan", 96),
    ("cyanBright", 96),
    ("brightWhite", 97),
    ("whiteBright", 97),
];

/// `(open, close)` SGR codes.
const MODIFIERS: &[(&str, u8, u8)] = &[
    ("reset", 0, 0),
    ("bold", 1, 22),
    ("dim", 2, 22),
    ("italic", 3, 23),
    ("underline", 4, 24),
    ("inverse", 7, 27),
    ("hidden", 8, 28),
    ("strikethrough", 9, 29),
    ("overline", 53, 55),
];

/// Foreground SGR code of a named colour. Add 10 for the background code.
pub fn named_color_code(name: &str) -> Option<u8> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

pub fn modifier_codes(name: &str) -> Option<(u8, u8)> {
    MODIFIERS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, open, close)| (*open, *close))
}

pub fn is_gradient(color: &str) -> bool {
    color.starts_with(LINEAR_GRADIENT_PREFIX) && color.ends_with(')')
}

/// The stop list inside `linear-gradient(...)`.
pub fn gradient_stops(color: &str) -> Option<&str> {
    color
        .strip_prefix(LINEAR_GRADIENT_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
}

fn is_color(token: &str) -> bool {
    named_color_code(token).is_some() || is_hex_color(token) || is_gradient(token)
}

/// If `token` names a background colour, returns it without the prefix.
pub fn strip_bg(token: &str) -> Option<String> {
    if let Some(rest) = token.strip_prefix(BG_PREFIX) {
        return Some(rest.to_string());
    }
    let rest = token.strip_prefix("bg")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if first.is_ascii_uppercase() || first == '#' || first == '$' {
        Some(first.to_ascii_lowercase().to_string() + chars.as_str())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    MissingParen { position: usize },
    UnknownStyle { token: String, position: usize },
    UnknownCustomColor(String),
    Gradient { token: String, position: usize, source: StopsError },
}

impl DescriptorError {
    /// 1-based position of the offending token, if known.
    pub fn position(&self) -> usize {
        match self {
            DescriptorError::MissingParen { position }
            | DescriptorError::UnknownStyle { position, .. }
            | DescriptorError::Gradient { position, .. } => *position,
            DescriptorError::UnknownCustomColor(_) => 0,
        }
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::MissingParen { position } => {
                write!(f, "Token at position {} is missing ')'", position)
            }
            DescriptorError::UnknownStyle { token, .. } => write!(f, "unknown style \"{}\"", token),
            DescriptorError::UnknownCustomColor(name) => {
                write!(f, "unknown custom color \"{}\"", name)
            }
            DescriptorError::Gradient { source, .. } => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Parsed form of a style string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDescriptor {
    /// Named colour, hex colour or `linear-gradient(...)`. Custom colours
    /// are already resolved.
    pub fg: String,
    pub bg: String,
    pub modifiers: Vec<String>,
}

/// Split a descriptor into `(position, token)` pairs. A `(` swallows
/// everything up to the next `)`, whitespace included.
fn tokens(s: &str) -> Result<Vec<(usize, &str)>, DescriptorError> {
    let bytes = s.as_bytes();
    let mut result = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Ok(result);
        }

        let start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            if bytes[pos] == b'(' {
                match s[pos..].find(')') {
                    Some(close) => pos += close,
                    None => {
                        return Err(DescriptorError::MissingParen {
                            position: start + 1,
                        });
                    }
                }
            }
            pos += 1;
        }
        result.push((start + 1, &s[start..pos]));
    }
}

struct DescriptorParser<'a> {
    custom_colors: &'a HashMap<String, String>,
    descriptor: StyleDescriptor,
}

impl DescriptorParser<'_> {
    fn token(
        &mut self,
        token: &str,
        position: usize,
        background: bool,
        depth: usize,
    ) -> Result<(), DescriptorError> {
        let unknown = || DescriptorError::UnknownStyle {
            token: token.to_string(),
            position,
        };

        if !background && let Some(color) = strip_bg(token) {
            return self
                .token(&color, position, true, depth)
                .map_err(|err| match err {
                    DescriptorError::UnknownStyle { .. } => unknown(),
                    other => other,
                });
        }

        if is_color(token) {
            let slot = if background {
                &mut self.descriptor.bg
            } else {
                &mut self.descriptor.fg
            };
            *slot = token.to_string();
            return Ok(());
        }

        if token.starts_with('$') {
            let value = self
                .custom_colors
                .get(token)
                .ok_or_else(|| DescriptorError::UnknownCustomColor(token.to_string()))?;
            if depth >= MAX_CUSTOM_COLOR_DEPTH {
                return Err(unknown());
            }
            let value = value.trim().to_string();
            return self.token(&value, position, background, depth + 1);
        }

        if !background && modifier_codes(token).is_some() {
            self.descriptor.modifiers.push(token.to_string());
            return Ok(());
        }

        Err(unknown())
    }
}

/// Parse a style string, resolving `$name` references through
/// `custom_colors`.
pub fn parse_descriptor(
    custom_colors: &HashMap<String, String>,
    s: &str,
) -> Result<StyleDescriptor, DescriptorError> {
    let mut parser = DescriptorParser {
        custom_colors,
        descriptor: StyleDescriptor::default(),
    };
    for (position, token) in tokens(s)? {
        parser.token(token, position, false, 0)?;
    }
    Ok(parser.descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<StyleDescriptor, DescriptorError> {
        parse_descriptor(&HashMap::new(), s)
    }

    #[test]
    fn test_named_colors_and_modifiers() {
        let d = parse("red bold bg:blue").unwrap();
        assert_eq!(d.fg, "red");
        assert_eq!(d.bg, "blue");
        assert_eq!(d.modifiers, vec!["bold"]);
    }

    #[test]
    fn test_later_colors_win() {
        assert_eq!(parse("red green grey").unwrap().fg, "grey");
    }

    #[test]
    fn test_background_forms() {
        assert_eq!(parse("bgRed").unwrap().bg, "red");
        assert_eq!(parse("bgBrightBlue").unwrap().bg, "brightBlue");
        assert_eq!(parse("bg:#ff0").unwrap().bg, "#ff0");
        assert_eq!(parse("bg#ff0").unwrap().bg, "#ff0");
        assert_eq!(
            parse("bg:linear-gradient(#000, #fff)").unwrap().bg,
            "linear-gradient(#000, #fff)"
        );
    }

    #[test]
    fn test_gradient_token_keeps_spaces() {
        let d = parse("bold linear-gradient(#f00 10%, #00f) italic").unwrap();
        assert_eq!(d.fg, "linear-gradient(#f00 10%, #00f)");
        assert_eq!(d.modifiers, vec!["bold", "italic"]);
    }

    #[test]
    fn test_missing_paren() {
        let err = parse("bold linear-gradient(#f00, #00f").unwrap_err();
        assert_eq!(err.to_string(), "Token at position 6 is missing ')'");
        assert_eq!(err.position(), 6);
    }

    #[test]
    fn test_unknown_styles() {
        let err = parse("bold purple").unwrap_err();
        assert_eq!(err.to_string(), "unknown style \"purple\"");
        assert_eq!(err.position(), 6);

        assert_eq!(
            parse("bg:bold").unwrap_err().to_string(),
            "unknown style \"bg:bold\""
        );
    }

    #[test]
    fn test_custom_colors() {
        let mut colors = HashMap::new();
        colors.insert("$foreground".to_string(), "white".to_string());
        colors.insert("$alias".to_string(), "$foreground".to_string());
        colors.insert("$loop".to_string(), "$loop".to_string());

        let d = parse_descriptor(&colors, "$foreground bg:$alias").unwrap();
        assert_eq!(d.fg, "white");
        assert_eq!(d.bg, "white");

        assert_eq!(
            parse_descriptor(&colors, "$nope").unwrap_err(),
            DescriptorError::UnknownCustomColor("$nope".to_string())
        );
        assert!(matches!(
            parse_descriptor(&colors, "$loop").unwrap_err(),
            DescriptorError::UnknownStyle { .. }
        ));
    }

    #[test]
    fn test_empty_descriptor() {
        assert_eq!(parse("  ").unwrap(), StyleDescriptor::default());
    }
}
