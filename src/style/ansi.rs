//! ANSI-aware tokenizer and print-width measurement.
//!
//! Splits a string into runs of plain ASCII, single multi-byte grapheme
//! clusters, and escape sequences. Each printable token remembers which
//! foreground/background escape was in effect when it was reached, so the
//! gradient renderer can leave explicitly coloured text alone.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const FG_CLOSE: &str = "\x1b[39m";
pub const BG_CLOSE: &str = "\x1b[49m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of printable ASCII; one column per byte.
    Text,
    /// A single non-ASCII grapheme cluster.
    ComplexChar,
    /// A CSI/OSC or other escape sequence; zero width.
    EscapeCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub content: &'a str,
    /// The escape that set the current foreground, if any.
    pub fg: Option<&'a str>,
    /// The escape that set the current background, if any.
    pub bg: Option<&'a str>,
    pub width: usize,
}

/// Length in bytes of the escape sequence at the start of `s`.
fn escape_len(s: &[u8]) -> usize {
    debug_assert_eq!(s.first(), Some(&0x1b));
    match s.get(1) {
        // CSI: ESC [ params... final byte in 0x40..=0x7e
        Some(b'[') => {
            for (i, &c) in s.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(&c) {
                    return i + 1;
                }
            }
            s.len()
        }
        // OSC: ESC ] ... terminated by BEL or ESC \
        Some(b']') => {
            let mut i = 2;
            while i < s.len() {
                if s[i] == 0x07 {
                    return i + 1;
                }
                if s[i] == 0x1b && s.get(i + 1) == Some(&b'\\') {
                    return i + 2;
                }
                i += 1;
            }
            s.len()
        }
        Some(c) if c.is_ascii() => 2,
        // A lone ESC before a multi-byte character.
        Some(_) | None => 1,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SgrEffect {
    SetFg,
    ResetFg,
    SetBg,
    ResetBg,
    ResetAll,
}

/// Work out what an SGR sequence does to the foreground and background.
fn sgr_effects(code: &str) -> Vec<SgrEffect> {
    let Some(params) = code
        .strip_prefix("\x1b[")
        .and_then(|rest| rest.strip_suffix('m'))
    else {
        return Vec::new();
    };
    if params.is_empty() {
        return vec![SgrEffect::ResetAll];
    }

    let nums: Vec<u32> = params
        .split([';', ':'])
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    let mut effects = Vec::new();
    let mut i = 0;
    while i < nums.len() {
        match nums[i] {
            0 => effects.push(SgrEffect::ResetAll),
            30..=37 | 90..=97 => effects.push(SgrEffect::SetFg),
            39 => effects.push(SgrEffect::ResetFg),
            40..=47 | 100..=107 => effects.push(SgrEffect::SetBg),
            49 => effects.push(SgrEffect::ResetBg),
            n @ (38 | 48) => {
                effects.push(if n == 38 {
                    SgrEffect::SetFg
                } else {
                    SgrEffect::SetBg
                });
                // Skip the extended colour arguments.
                match nums.get(i + 1) {
                    Some(5) => i += 2,
                    Some(2) => i += 4,
                    _ => {}
                }
            }
            _ => {}
        }
        i += 1;
    }
    effects
}

/// Tokenize `s`.
pub fn tokenize(s: &str) -> Vec<Token<'_>> {
    let bytes = s.as_bytes();
    let mut tokens = Vec::new();
    let mut fg: Option<&str> = None;
    let mut bg: Option<&str> = None;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == 0x1b {
            let len = escape_len(&bytes[pos..]);
            let content = &s[pos..pos + len];
            for effect in sgr_effects(content) {
                match effect {
                    SgrEffect::SetFg => fg = Some(content),
                    SgrEffect::ResetFg => fg = None,
                    SgrEffect::SetBg => bg = Some(content),
                    SgrEffect::ResetBg => bg = None,
                    SgrEffect::ResetAll => {
                        fg = None;
                        bg = None;
                    }
                }
            }
            tokens.push(Token {
                kind: TokenKind::EscapeCode,
                content,
                fg,
                bg,
                width: 0,
            });
            pos += len;
        } else if bytes[pos].is_ascii() {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii() && bytes[pos] != 0x1b {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Text,
                content: &s[start..pos],
                fg,
                bg,
                width: pos - start,
            });
        } else {
            let start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii() {
                pos += 1;
            }
            // A grapheme may start with a non-ASCII char and continue with
            // ASCII (rare); graphemes are split over the non-ASCII run only.
            for grapheme in s[start..pos].graphemes(true) {
                tokens.push(Token {
                    kind: TokenKind::ComplexChar,
                    content: grapheme,
                    fg,
                    bg,
                    width: grapheme.width(),
                });
            }
        }
    }

    tokens
}

/// Number of terminal columns `s` occupies.
pub fn print_width(s: &str) -> usize {
    if s.is_ascii() && !s.as_bytes().contains(&0x1b) {
        return s.len();
    }
    tokenize(s).iter().map(|t| t.width).sum()
}

/// True if `s` contains nothing but escape sequences.
#[cfg(test)]
pub fn is_only_escapes(s: &str) -> bool {
    tokenize(s).iter().all(|t| t.kind == TokenKind::EscapeCode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_ascii() {
        let tokens = tokenize("hello");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].width, 5);
    }

    #[test]
    fn test_tokenize_tracks_foreground() {
        let tokens = tokenize("a\x1b[31mb\x1b[39mc");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Text,
                TokenKind::EscapeCode,
                TokenKind::Text,
                TokenKind::EscapeCode,
                TokenKind::Text
            ]
        );
        assert_eq!(tokens[0].fg, None);
        assert_eq!(tokens[2].fg, Some("\x1b[31m"));
        assert_eq!(tokens[4].fg, None);
    }

    #[test]
    fn test_tokenize_tracks_background_and_reset() {
        let tokens = tokenize("\x1b[48;2;1;2;3mx\x1b[0my");
        assert_eq!(tokens[1].bg, Some("\x1b[48;2;1;2;3m"));
        assert_eq!(tokens[1].fg, None);
        assert_eq!(tokens[3].bg, None);
    }

    #[test]
    fn test_complex_chars() {
        let tokens = tokenize("a→日b");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].kind, TokenKind::ComplexChar);
        assert_eq!(tokens[1].width, 1);
        assert_eq!(tokens[2].width, 2);
    }

    #[test]
    fn test_lone_escape_before_multibyte_char() {
        let tokens = tokenize("a\x1bé");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::EscapeCode);
        assert_eq!(tokens[1].content, "\x1b");
        assert_eq!(tokens[2].content, "é");
        assert_eq!(print_width("a\x1bé"), 2);
    }

    #[test]
    fn test_print_width() {
        assert_eq!(print_width("abc"), 3);
        assert_eq!(print_width("\x1b[31mabc\x1b[39m"), 3);
        assert_eq!(print_width("日本"), 4);
        assert_eq!(print_width("\x1b]8;;http://x\x07link\x1b]8;;\x07"), 4);
        assert_eq!(print_width(""), 0);
    }

    #[test]
    fn test_is_only_escapes() {
        assert!(is_only_escapes("\x1b[1m\x1b[22m"));
        assert!(is_only_escapes(""));
        assert!(!is_only_escapes("\x1b[1mx\x1b[22m"));
    }
}
