//! Parser for the CSS `linear-gradient` stop list.
//!
//! ```text
//! stops   := entry ("," entry)*
//! entry   := color offset? offset?    linear-color-stop
//!          | offset                   linear-color-hint
//! offset  := N "%" | N "px" | "0"
//! ```

use super::{Offset, Stop};
use crate::style::color::{Rgba, parse_hex};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopsError {
    /// A syntax error; `position` is 1-based.
    Syntax { message: String, position: usize },
    /// `$name` is not a defined custom colour.
    UnknownCustomColor(String),
    /// `$name` is defined but is not a plain hex colour (e.g. it is itself a
    /// gradient, which would allow cycles).
    UnusableCustomColor { name: String, value: String },
}

impl fmt::Display for StopsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopsError::Syntax { message, .. } => write!(f, "{}", message),
            StopsError::UnknownCustomColor(name) => {
                write!(f, "unknown custom color \"{}\"", name)
            }
            StopsError::UnusableCustomColor { name, value } => write!(
                f,
                "color {}=\"{}\" cannot be used in linear-gradient",
                name, value
            ),
        }
    }
}

impl std::error::Error for StopsError {}

struct Parser<'a> {
    colors: Option<&'a HashMap<String, String>>,
    s: &'a [u8],
    src: &'a str,
    index: usize,
}

fn syntax(message: String, position: usize) -> StopsError {
    StopsError::Syntax { message, position }
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.s.get(self.index).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.index += 1;
        }
    }

    fn next_token(&mut self) -> &'a str {
        let start = self.index;
        while let Some(c) = self.peek() {
            if c == b' ' || c == b'\t' || c == b',' {
                break;
            }
            self.index += 1;
        }
        &self.src[start..self.index]
    }

    fn parse_color(&mut self) -> Result<Rgba, StopsError> {
        let start = self.index;
        let token = self.next_token();

        if token.starts_with('$') {
            let value = self
                .colors
                .and_then(|m| m.get(token))
                .ok_or_else(|| StopsError::UnknownCustomColor(token.to_string()))?;
            return parse_hex(value).ok_or_else(|| StopsError::UnusableCustomColor {
                name: token.to_string(),
                value: value.clone(),
            });
        }

        parse_hex(token)
            .ok_or_else(|| syntax(format!("invalid color \"{}\" at {}", token, start), start + 1))
    }

    /// Parse an optional offset. `Ok(None)` if there isn't one here.
    fn parse_offset(&mut self) -> Result<Option<Offset>, StopsError> {
        self.skip_whitespace();
        let start = self.index;

        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Ok(None);
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
        }
        let value: f64 = self.src[start..self.index]
            .parse()
            .map_err(|_| syntax(format!("invalid number at position {}", start + 1), start + 1))?;

        if self.peek() == Some(b'%') {
            self.index += 1;
            return Ok(Some(Offset::Relative(value / 100.0)));
        }
        if self.s[self.index..].starts_with(b"px") {
            self.index += 2;
            return Ok(Some(Offset::Absolute(value)));
        }
        if value == 0.0 {
            return Ok(Some(Offset::Absolute(0.0)));
        }
        Err(syntax(
            format!(
                "Expected offset at position {}, got {}",
                start + 1,
                &self.src[self.index..]
            ),
            start + 1,
        ))
    }
}

/// Parse a stop list. Custom `$name` colours are resolved through `colors`.
pub fn parse_stops(
    colors: Option<&HashMap<String, String>>,
    src: &str,
) -> Result<Vec<Stop>, StopsError> {
    let mut result: Vec<Stop> = Vec::with_capacity(2);
    let mut parser = Parser {
        colors,
        s: src.as_bytes(),
        src,
        index: 0,
    };

    while parser.index < parser.s.len() {
        parser.skip_whitespace();
        let entry_start = parser.index;

        if parser.peek().is_some_and(|c| c.is_ascii_digit()) {
            let offset = parser.parse_offset()?;
            match result.last() {
                None => {
                    return Err(syntax(
                        format!("Expected linear-color-stop at position {}", entry_start + 1),
                        entry_start + 1,
                    ));
                }
                Some(prev) if prev.color.is_none() => {
                    return Err(syntax(
                        format!(
                            "Cannot have two linear-color-hint in a row at position {}",
                            entry_start + 1
                        ),
                        entry_start + 1,
                    ));
                }
                Some(_) => result.push(Stop {
                    color: None,
                    offset,
                }),
            }
        } else if parser.index < parser.s.len() {
            let color = parser.parse_color()?;
            let offset = parser.parse_offset()?;
            let second = parser.parse_offset()?;

            result.push(Stop {
                color: Some(color),
                offset,
            });
            if second.is_some() {
                result.push(Stop {
                    color: Some(color),
                    offset: second,
                });
            }
        }

        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            if c == b',' {
                parser.index += 1;
            } else {
                return Err(syntax(
                    format!(
                        "expected ',' at position {}, found '{}'",
                        parser.index + 1,
                        c as char
                    ),
                    parser.index + 1,
                ));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(color: Option<Rgba>, offset: Option<Offset>) -> Stop {
        Stop { color, offset }
    }

    #[test]
    fn test_single_stops() {
        assert_eq!(
            parse_stops(None, "#010203").unwrap(),
            vec![stop(Some(Rgba::rgb(1, 2, 3)), None)]
        );
        assert_eq!(
            parse_stops(None, "#010203 10%").unwrap(),
            vec![stop(Some(Rgba::rgb(1, 2, 3)), Some(Offset::Relative(0.1)))]
        );
        assert_eq!(
            parse_stops(None, "#010203 10px").unwrap(),
            vec![stop(Some(Rgba::rgb(1, 2, 3)), Some(Offset::Absolute(10.0)))]
        );
        assert_eq!(
            parse_stops(None, "#010203 0").unwrap(),
            vec![stop(Some(Rgba::rgb(1, 2, 3)), Some(Offset::Absolute(0.0)))]
        );
    }

    #[test]
    fn test_double_offset_pushes_two_stops() {
        assert_eq!(
            parse_stops(None, "#f00 0% 50%").unwrap(),
            vec![
                stop(Some(Rgba::rgb(255, 0, 0)), Some(Offset::Relative(0.0))),
                stop(Some(Rgba::rgb(255, 0, 0)), Some(Offset::Relative(0.5))),
            ]
        );
    }

    #[test]
    fn test_multi_stops_and_hints() {
        let stops = parse_stops(None, " #fff ,\t50%, #000").unwrap();
        assert_eq!(
            stops,
            vec![
                stop(Some(Rgba::WHITE), None),
                stop(None, Some(Offset::Relative(0.5))),
                stop(Some(Rgba::BLACK), None),
            ]
        );
    }

    #[test]
    fn test_bad_stops() {
        assert_eq!(
            parse_stops(None, "10%, #fff").unwrap_err().to_string(),
            "Expected linear-color-stop at position 1"
        );
        assert_eq!(
            parse_stops(None, "#fff, 10%, 90%, #fff")
                .unwrap_err()
                .to_string(),
            "Cannot have two linear-color-hint in a row at position 12"
        );
        assert_eq!(
            parse_stops(None, "#fff 10em").unwrap_err().to_string(),
            "Expected offset at position 6, got em"
        );
        assert_eq!(
            parse_stops(None, "red, blue").unwrap_err().to_string(),
            "invalid color \"red\" at 0"
        );
        assert_eq!(
            parse_stops(None, "#fff 10% 20% 30%")
                .unwrap_err()
                .to_string(),
            "expected ',' at position 14, found '3'"
        );
    }

    #[test]
    fn test_custom_colors() {
        let mut colors = HashMap::new();
        colors.insert("$accent".to_string(), "#00f".to_string());
        colors.insert(
            "$rainbow".to_string(),
            "linear-gradient(#f00, $rainbow)".to_string(),
        );

        assert_eq!(
            parse_stops(Some(&colors), "$accent, #fff").unwrap()[0].color,
            Some(Rgba::rgb(0, 0, 255))
        );
        assert_eq!(
            parse_stops(Some(&colors), "$nope").unwrap_err(),
            StopsError::UnknownCustomColor("$nope".to_string())
        );
        assert_eq!(
            parse_stops(Some(&colors), "#000, $rainbow")
                .unwrap_err()
                .to_string(),
            "color $rainbow=\"linear-gradient(#f00, $rainbow)\" cannot be used in linear-gradient"
        );
    }
}
