//! Colour values, colour levels and ANSI escape generation.

use std::fmt::Write as _;

/// An RGBA colour. An alpha of zero marks "no colour yet" while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse `#rgb` or `#rrggbb`.
pub fn parse_hex(s: &str) -> Option<Rgba> {
    let digits = s.strip_prefix('#')?.as_bytes();
    let values: Option<Vec<u8>> = digits.iter().map(|&c| hex_digit(c)).collect();
    let v = values?;
    match v.len() {
        3 => Some(Rgba::rgb(v[0] * 17, v[1] * 17, v[2] * 17)),
        6 => Some(Rgba::rgb(
            v[0] * 16 + v[1],
            v[2] * 16 + v[3],
            v[4] * 16 + v[5],
        )),
        _ => None,
    }
}

pub fn is_hex_color(s: &str) -> bool {
    parse_hex(s).is_some()
}

/// Linear interpolation between two colours; channels are truncated.
pub fn lerp(from: Rgba, to: Rgba, s: f64) -> Rgba {
    fn channel(a: u8, b: u8, s: f64) -> u8 {
        (a as f64 + s * (b as f64 - a as f64)) as u8
    }
    Rgba {
        r: channel(from.r, to.r, s),
        g: channel(from.g, to.g, s),
        b: channel(from.b, to.b, s),
        a: channel(from.a, to.a, s),
    }
}

/// How many colours the terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ColorLevel {
    None,
    Basic,
    Ansi256,
    #[default]
    TrueColor,
}

impl ColorLevel {
    pub fn from_number(n: u8) -> Self {
        match n {
            0 => ColorLevel::None,
            1 => ColorLevel::Basic,
            2 => ColorLevel::Ansi256,
            _ => ColorLevel::TrueColor,
        }
    }

    /// Guess the level from the environment.
    pub fn detect(get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(forced) = get("KITSCH_COLOR_LEVEL")
            && let Ok(n) = forced.trim().parse::<u8>()
        {
            return ColorLevel::from_number(n);
        }
        if get("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            return ColorLevel::None;
        }
        if let Some(colorterm) = get("COLORTERM")
            && (colorterm == "truecolor" || colorterm == "24bit")
        {
            return ColorLevel::TrueColor;
        }
        match get("TERM") {
            Some(term) if term == "dumb" => ColorLevel::None,
            Some(term) if term.contains("256") => ColorLevel::Ansi256,
            Some(term) if term.contains("truecolor") || term.contains("direct") => {
                ColorLevel::TrueColor
            }
            _ => ColorLevel::Basic,
        }
    }

    /// Colour equality at this level: two colours are "the same" if the
    /// terminal would show them identically.
    pub fn colors_equal(&self, a: Rgba, b: Rgba) -> bool {
        match self {
            ColorLevel::None => true,
            ColorLevel::Basic => {
                ansi256_to_ansi16(rgb_to_ansi256(a)) == ansi256_to_ansi16(rgb_to_ansi256(b))
            }
            ColorLevel::Ansi256 => rgb_to_ansi256(a) == rgb_to_ansi256(b),
            ColorLevel::TrueColor => a.r == b.r && a.g == b.g && a.b == b.b,
        }
    }

    pub fn write_fg(&self, out: &mut String, c: Rgba) {
        let _ = match self {
            ColorLevel::None => Ok(()),
            ColorLevel::Basic => write!(out, "\x1b[{}m", ansi256_to_ansi16(rgb_to_ansi256(c))),
            ColorLevel::Ansi256 => write!(out, "\x1b[38;5;{}m", rgb_to_ansi256(c)),
            ColorLevel::TrueColor => write!(out, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b),
        };
    }

    pub fn write_bg(&self, out: &mut String, c: Rgba) {
        let _ = match self {
            ColorLevel::None => Ok(()),
            ColorLevel::Basic => write!(
                out,
                "\x1b[{}m",
                ansi256_to_ansi16(rgb_to_ansi256(c)) + 10
            ),
            ColorLevel::Ansi256 => write!(out, "\x1b[48;5;{}m", rgb_to_ansi256(c)),
            ColorLevel::TrueColor => write!(out, "\x1b[48;2;{};{};{}m", c.r, c.g, c.b),
        };
    }
}

/// Standard 6x6x6 cube plus 24-step greyscale ramp.
pub fn rgb_to_ansi256(c: Rgba) -> u8 {
    let (r, g, b) = (c.r as f64, c.g as f64, c.b as f64);
    if c.r == c.g && c.g == c.b {
        if c.r < 8 {
            return 16;
        }
        if c.r > 248 {
            return 231;
        }
        return (((r - 8.0) / 247.0) * 24.0).round() as u8 + 232;
    }
    let scale = |v: f64| (v / 255.0 * 5.0).round() as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}

/// Map a 256-colour index onto a 16-colour foreground SGR code (30-37, 90-97).
pub fn ansi256_to_ansi16(code: u8) -> u8 {
    if code < 8 {
        return 30 + code;
    }
    if code < 16 {
        return 90 + (code - 8);
    }

    let (red, green, blue) = if code >= 232 {
        let v = ((code as f64 - 232.0) * 10.0 + 8.0) / 255.0;
        (v, v, v)
    } else {
        let c = code as u32 - 16;
        let remainder = c % 36;
        (
            (c / 36) as f64 / 5.0,
            (remainder / 6) as f64 / 5.0,
            (remainder % 6) as f64 / 5.0,
        )
    };

    let value = red.max(green).max(blue) * 2.0;
    if value == 0.0 {
        return 30;
    }

    let mut result =
        30 + (((blue.round() as u8) << 2) | ((green.round() as u8) << 1) | red.round() as u8);
    if value.round() as u8 == 2 {
        result += 60;
    }
    result
}
