//! Template lexer.
//!
//! Splits a template into text and `{{ ... }}` actions, and actions into
//! tokens. Handles `{{-`/`-}}` trim markers and `{{/* comments */}}`.

use super::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Text(String),
    LeftDelim,
    RightDelim,
    /// A function name or keyword.
    Ident(String),
    /// `.Name`; a bare `.` is [`Tok::Dot`].
    Field(String),
    Dot,
    /// `$name`, or `$` on its own (empty name).
    Variable(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    LParen,
    RParen,
    Pipe,
    Declare,
    Assign,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
    /// Byte range in the source; used to tell `$x.Foo` from `$x .Foo`.
    pub start: usize,
    pub end: usize,
}

const LEFT: &str = "{{";
const RIGHT: &str = "}}";

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

impl<'a> Lexer<'a> {
    fn err(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn push(&mut self, tok: Tok, start: usize) {
        self.tokens.push(Token {
            tok,
            line: self.line,
            start,
            end: self.pos,
        });
    }

    fn advance(&mut self, n: usize) {
        self.line += self.src[self.pos..self.pos + n].matches('\n').count();
        self.pos += n;
    }

    fn lex(mut self) -> Result<Vec<Token>, TemplateError> {
        let mut trim_next_text = false;
        while self.pos < self.src.len() {
            let rest = self.rest();
            let text_len = rest.find(LEFT).unwrap_or(rest.len());
            let mut text = &rest[..text_len];

            // `{{- ` trims whitespace before the action.
            let after = &rest[text_len..];
            let trim_left = after.starts_with("{{- ")
                || after.starts_with("{{-\t")
                || after.starts_with("{{-\n");
            if trim_next_text {
                text = text.trim_start();
            }
            if trim_left {
                text = text.trim_end();
            }
            if !text.is_empty() {
                self.tokens.push(Token {
                    tok: Tok::Text(text.to_string()),
                    line: self.line,
                    start: self.pos,
                    end: self.pos + text_len,
                });
            }
            self.advance(text_len);
            if self.pos >= self.src.len() {
                break;
            }

            trim_next_text = self.lex_action(trim_left)?;
        }
        Ok(self.tokens)
    }

    /// Lex one action. Returns true if it ended with a `-}}` trim marker.
    fn lex_action(&mut self, trim_left: bool) -> Result<bool, TemplateError> {
        let start = self.pos;
        self.advance(LEFT.len() + if trim_left { 2 } else { 0 });

        // Comments produce no tokens at all.
        let rest = self.rest();
        if rest.starts_with("/*") {
            let Some(close) = rest.find("*/") else {
                return Err(self.err("unclosed comment"));
            };
            self.advance(close + 2);
            let rest = self.rest();
            if rest.starts_with(" -}}") {
                self.advance(4);
                return Ok(true);
            }
            if rest.starts_with(RIGHT) {
                self.advance(2);
                return Ok(false);
            }
            return Err(self.err("comment ends before closing delimiter"));
        }

        self.push(Tok::LeftDelim, start);

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.err("unclosed action"));
            }
            let trim_right = rest.starts_with(" -}}")
                || rest.starts_with("\t-}}")
                || rest.starts_with("\n-}}");
            if trim_right {
                let start = self.pos;
                self.advance(4);
                self.push(Tok::RightDelim, start);
                return Ok(true);
            }
            if rest.starts_with(RIGHT) {
                let start = self.pos;
                self.advance(2);
                self.push(Tok::RightDelim, start);
                return Ok(false);
            }
            self.lex_token()?;
        }
    }

    fn lex_token(&mut self) -> Result<(), TemplateError> {
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(());
        };
        let start = self.pos;

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                self.advance(c.len_utf8());
            }
            '(' => {
                self.advance(1);
                self.push(Tok::LParen, start);
            }
            ')' => {
                self.advance(1);
                self.push(Tok::RParen, start);
            }
            '|' => {
                self.advance(1);
                self.push(Tok::Pipe, start);
            }
            ',' => {
                self.advance(1);
                self.push(Tok::Comma, start);
            }
            '=' => {
                self.advance(1);
                self.push(Tok::Assign, start);
            }
            ':' => {
                if !rest.starts_with(":=") {
                    return Err(self.err("expected :="));
                }
                self.advance(2);
                self.push(Tok::Declare, start);
            }
            '"' => {
                let s = self.lex_quoted()?;
                self.push(Tok::Str(s), start);
            }
            '`' => {
                let Some(close) = rest[1..].find('`') else {
                    return Err(self.err("unterminated raw quoted string"));
                };
                let s = rest[1..1 + close].to_string();
                self.advance(close + 2);
                self.push(Tok::Str(s), start);
            }
            '$' => {
                let len = rest[1..]
                    .find(|c: char| !is_ident_char(c))
                    .unwrap_or(rest.len() - 1);
                let name = rest[1..1 + len].to_string();
                self.advance(1 + len);
                self.push(Tok::Variable(name), start);
            }
            '.' => {
                let after = &rest[1..];
                if after.starts_with(|c: char| c.is_ascii_digit()) {
                    return self.lex_number();
                }
                let len = after
                    .find(|c: char| !is_ident_char(c))
                    .unwrap_or(after.len());
                if len == 0 {
                    self.advance(1);
                    self.push(Tok::Dot, start);
                } else {
                    let name = after[..len].to_string();
                    self.advance(1 + len);
                    self.push(Tok::Field(name), start);
                }
            }
            '-' | '+' | '0'..='9' => return self.lex_number(),
            c if is_ident_char(c) => {
                let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
                let word = &rest[..len];
                let tok = match word {
                    "true" => Tok::Bool(true),
                    "false" => Tok::Bool(false),
                    "nil" => Tok::Nil,
                    _ => Tok::Ident(word.to_string()),
                };
                self.advance(len);
                self.push(tok, start);
            }
            other => return Err(self.err(format!("unexpected {:?} in action", other))),
        }
        Ok(())
    }

    fn lex_number(&mut self) -> Result<(), TemplateError> {
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || (i == 0 && (c == '-' || c == '+')))
            })
            .map_or(rest.len(), |(i, _)| i);
        let text = rest[..len].replace('_', "");

        let tok = if let Ok(i) = text.parse::<i64>() {
            Tok::Int(i)
        } else if let Some(hex) = text.strip_prefix("0x")
            && let Ok(i) = i64::from_str_radix(hex, 16)
        {
            Tok::Int(i)
        } else if let Ok(f) = text.parse::<f64>() {
            Tok::Float(f)
        } else {
            return Err(self.err(format!("bad number syntax: {:?}", &rest[..len])));
        };
        self.advance(len);
        self.push(tok, start);
        Ok(())
    }

    fn lex_quoted(&mut self) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.advance(i + 1);
                    return Ok(out);
                }
                '\n' => break,
                '\\' => {
                    let Some((_, esc)) = chars.next() else {
                        break;
                    };
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'e' => out.push('\x1b'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        'x' => {
                            let hex: String = chars.by_ref().take(2).map(|(_, c)| c).collect();
                            let byte = u8::from_str_radix(&hex, 16)
                                .map_err(|_| self.err("invalid \\x escape"))?;
                            out.push(byte as char);
                        }
                        'u' => {
                            let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                            let ch = u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| self.err("invalid \\u escape"))?;
                            out.push(ch);
                        }
                        other => {
                            return Err(self.err(format!("unknown escape sequence \\{}", other)));
                        }
                    }
                }
                c => out.push(c),
            }
        }
        Err(self.err("unterminated quoted string"))
    }
}

pub fn lex(src: &str) -> Result<Vec<Token>, TemplateError> {
    Lexer {
        src,
        pos: 0,
        line: 1,
        tokens: Vec::new(),
    }
    .lex()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        lex(src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_text_and_fields() {
        assert_eq!(
            toks("hi {{ .Data.Name }}!"),
            vec![
                Tok::Text("hi ".to_string()),
                Tok::LeftDelim,
                Tok::Field("Data".to_string()),
                Tok::Field("Name".to_string()),
                Tok::RightDelim,
                Tok::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            toks(r#"{{ "a\tb" `raw\n` 12 -3 1.5 true nil }}"#),
            vec![
                Tok::LeftDelim,
                Tok::Str("a\tb".to_string()),
                Tok::Str("raw\\n".to_string()),
                Tok::Int(12),
                Tok::Int(-3),
                Tok::Float(1.5),
                Tok::Bool(true),
                Tok::Nil,
                Tok::RightDelim,
            ]
        );
    }

    #[test]
    fn test_variables_and_declarations() {
        assert_eq!(
            toks("{{ $x := . }}{{ $ }}"),
            vec![
                Tok::LeftDelim,
                Tok::Variable("x".to_string()),
                Tok::Declare,
                Tok::Dot,
                Tok::RightDelim,
                Tok::LeftDelim,
                Tok::Variable(String::new()),
                Tok::RightDelim,
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            toks("a  {{- 1 -}}  b"),
            vec![
                Tok::Text("a".to_string()),
                Tok::LeftDelim,
                Tok::Int(1),
                Tok::RightDelim,
                Tok::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            toks("a {{/* hello */}} b"),
            vec![Tok::Text("a ".to_string()), Tok::Text(" b".to_string())]
        );
        assert_eq!(
            toks("a {{- /* hello */ -}} b"),
            vec![Tok::Text("a".to_string()), Tok::Text("b".to_string())]
        );
    }

    #[test]
    fn test_errors() {
        assert!(lex("{{ .Foo ").is_err());
        assert!(lex("{{ \"abc }}").is_err());
        assert!(lex("{{/* abc").is_err());
    }
}
