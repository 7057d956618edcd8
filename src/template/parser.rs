//! Template parser: token stream to syntax tree.

use super::TemplateError;
use super::lexer::{Tok, Token};
use super::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// `{{ pipeline }}`; prints unless the pipeline declares a variable.
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
    /// `{{ template "name" pipeline }}`
    Template {
        name: String,
        pipe: Option<Pipeline>,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Variables declared or assigned by this pipeline.
    pub decl: Vec<String>,
    /// `=` rather than `:=`.
    pub is_assign: bool,
    pub cmds: Vec<Command>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// `.`
    Dot,
    /// `.A.B`, relative to dot.
    Field(Vec<String>),
    /// `$x.A.B`
    Variable(String, Vec<String>),
    /// `(pipeline).A.B`
    Chain(Box<Pipeline>, Vec<String>),
    /// A function name.
    Function(String),
    Literal(Value),
}

/// A parsed template: the main body plus any `define`d templates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub root: Vec<Node>,
    pub defines: HashMap<String, Vec<Node>>,
}

enum End {
    Eof,
    End,
    Else,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    defines: HashMap<String, Vec<Node>>,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn err(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Tok, context: &str) -> Result<(), TemplateError> {
        match self.next() {
            Some(t) if t.tok == expected => Ok(()),
            Some(t) => Err(TemplateError::Syntax {
                line: t.line,
                message: format!("unexpected {:?} in {}", t.tok, context),
            }),
            None => Err(self.err(format!("unexpected EOF in {}", context))),
        }
    }

    /// Is the next token directly after the previous one, with no space?
    fn adjacent(&self) -> bool {
        match (self.tokens.get(self.pos.wrapping_sub(1)), self.tokens.get(self.pos)) {
            (Some(prev), Some(next)) if self.pos > 0 => prev.end == next.start,
            _ => false,
        }
    }

    fn keyword(&self) -> Option<&str> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Tok::LeftDelim), Some(Tok::Ident(word))) => Some(word.as_str()),
            _ => None,
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, End), TemplateError> {
        let mut nodes = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                return Ok((nodes, End::Eof));
            };
            match tok {
                Tok::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    self.pos += 1;
                }
                Tok::LeftDelim => {
                    let keyword = self.keyword().map(str::to_string);
                    match keyword.as_deref() {
                        Some("end") => {
                            self.pos += 2;
                            self.expect(Tok::RightDelim, "end")?;
                            return Ok((nodes, End::End));
                        }
                        Some("else") => {
                            // The caller decides what may follow `else`.
                            self.pos += 2;
                            return Ok((nodes, End::Else));
                        }
                        Some("if") => {
                            self.pos += 2;
                            nodes.push(Node::If(self.parse_branch("if")?));
                        }
                        Some("range") => {
                            self.pos += 2;
                            nodes.push(Node::Range(self.parse_branch("range")?));
                        }
                        Some("with") => {
                            self.pos += 2;
                            nodes.push(Node::With(self.parse_branch("with")?));
                        }
                        Some("define") => {
                            self.pos += 2;
                            self.parse_define()?;
                        }
                        Some("template") => {
                            self.pos += 2;
                            nodes.push(self.parse_template()?);
                        }
                        _ => {
                            self.pos += 1;
                            let pipe = self.parse_pipeline("command", true)?;
                            self.expect(Tok::RightDelim, "command")?;
                            nodes.push(Node::Action(pipe));
                        }
                    }
                }
                other => return Err(self.err(format!("unexpected {:?}", other))),
            }
        }
    }

    fn parse_branch(&mut self, context: &str) -> Result<Branch, TemplateError> {
        let pipe = self.parse_pipeline(context, true)?;
        self.expect(Tok::RightDelim, context)?;

        let (list, end) = self.parse_list()?;
        let else_list = match end {
            End::Eof => return Err(self.err(format!("unexpected EOF in {}", context))),
            End::End => Vec::new(),
            End::Else => {
                // `{{ else if ... }}` and `{{ else with ... }}` chain into a
                // nested branch that shares our `end`.
                let chained = match self.peek() {
                    Some(Tok::Ident(word)) => Some(word.clone()),
                    _ => None,
                };
                match chained.as_deref() {
                    Some("if") if context == "if" => {
                        self.pos += 1;
                        vec![Node::If(self.parse_branch("if")?)]
                    }
                    Some("with") if context == "with" => {
                        self.pos += 1;
                        vec![Node::With(self.parse_branch("with")?)]
                    }
                    _ => {
                        self.expect(Tok::RightDelim, "else")?;
                        let (else_list, end) = self.parse_list()?;
                        if !matches!(end, End::End) {
                            return Err(self.err(format!("expected end in {}", context)));
                        }
                        else_list
                    }
                }
            }
        };

        Ok(Branch {
            pipe,
            list,
            else_list,
        })
    }

    fn parse_define(&mut self) -> Result<(), TemplateError> {
        let name = match self.next().map(|t| t.tok) {
            Some(Tok::Str(name)) => name,
            _ => return Err(self.err("define needs a quoted name")),
        };
        self.expect(Tok::RightDelim, "define")?;
        let (list, end) = self.parse_list()?;
        if !matches!(end, End::End) {
            return Err(self.err(format!("expected end in define \"{}\"", name)));
        }
        self.defines.insert(name, list);
        Ok(())
    }

    fn parse_template(&mut self) -> Result<Node, TemplateError> {
        let line = self.line();
        let name = match self.next().map(|t| t.tok) {
            Some(Tok::Str(name)) => name,
            _ => return Err(self.err("template needs a quoted name")),
        };
        let pipe = if matches!(self.peek(), Some(Tok::RightDelim)) {
            None
        } else {
            Some(self.parse_pipeline("template", false)?)
        };
        self.expect(Tok::RightDelim, "template")?;
        Ok(Node::Template { name, pipe, line })
    }

    fn parse_decl(&mut self) -> (Vec<String>, bool) {
        // `$x :=`, `$x =`, `$i, $v :=`
        let Some(Tok::Variable(a)) = self.peek().cloned() else {
            return (Vec::new(), false);
        };
        match (
            self.peek_at(1).cloned(),
            self.peek_at(2).cloned(),
            self.peek_at(3).cloned(),
        ) {
            (Some(op @ (Tok::Declare | Tok::Assign)), _, _) => {
                self.pos += 2;
                (vec![a], op == Tok::Assign)
            }
            (Some(Tok::Comma), Some(Tok::Variable(b)), Some(op @ (Tok::Declare | Tok::Assign))) => {
                self.pos += 4;
                (vec![a, b], op == Tok::Assign)
            }
            _ => (Vec::new(), false),
        }
    }

    fn parse_pipeline(&mut self, context: &str, allow_decl: bool) -> Result<Pipeline, TemplateError> {
        let line = self.line();
        let (decl, is_assign) = if allow_decl {
            self.parse_decl()
        } else {
            (Vec::new(), false)
        };

        let mut cmds = Vec::new();
        loop {
            let cmd = self.parse_command(context)?;
            cmds.push(cmd);
            match self.peek() {
                Some(Tok::Pipe) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }

        Ok(Pipeline {
            decl,
            is_assign,
            cmds,
            line,
        })
    }

    fn parse_command(&mut self, context: &str) -> Result<Command, TemplateError> {
        let mut args = Vec::new();
        while let Some(tok) = self.peek() {
            if matches!(tok, Tok::RightDelim | Tok::RParen | Tok::Pipe) {
                break;
            }
            args.push(self.parse_operand()?);
        }
        if args.is_empty() {
            return Err(self.err(format!("missing value for {}", context)));
        }
        Ok(Command { args })
    }

    /// Fields written directly after a term, e.g. the `.A.B` in `$x.A.B`.
    fn parse_chain(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        while self.adjacent() {
            match self.peek() {
                Some(Tok::Field(name)) => {
                    fields.push(name.clone());
                    self.pos += 1;
                }
                _ => break,
            }
        }
        fields
    }

    fn parse_operand(&mut self) -> Result<Arg, TemplateError> {
        let Some(token) = self.next() else {
            return Err(self.err("unexpected EOF in operand"));
        };
        let arg = match token.tok {
            Tok::Dot => Arg::Dot,
            Tok::Field(name) => {
                let mut fields = vec![name];
                fields.extend(self.parse_chain());
                Arg::Field(fields)
            }
            Tok::Variable(name) => Arg::Variable(name, self.parse_chain()),
            Tok::Ident(name) => Arg::Function(name),
            Tok::Str(s) => Arg::Literal(Value::String(s)),
            Tok::Int(i) => Arg::Literal(Value::Int(i)),
            Tok::Float(f) => Arg::Literal(Value::Float(f)),
            Tok::Bool(b) => Arg::Literal(Value::Bool(b)),
            Tok::Nil => Arg::Literal(Value::Nil),
            Tok::LParen => {
                let pipe = self.parse_pipeline("parenthesized pipeline", true)?;
                self.expect(Tok::RParen, "parenthesized pipeline")?;
                Arg::Chain(Box::new(pipe), self.parse_chain())
            }
            other => {
                return Err(TemplateError::Syntax {
                    line: token.line,
                    message: format!("unexpected {:?} in operand", other),
                });
            }
        };
        Ok(arg)
    }
}

pub fn parse(tokens: Vec<Token>) -> Result<Tree, TemplateError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        defines: HashMap::new(),
    };
    let (root, end) = parser.parse_list()?;
    match end {
        End::Eof => Ok(Tree {
            root,
            defines: parser.defines,
        }),
        End::End => Err(parser.err("unexpected {{end}}")),
        End::Else => Err(parser.err("unexpected {{else}}")),
    }
}
