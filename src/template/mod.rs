//! Go-flavoured text templates.
//!
//! Templates see their data as a [`Value`] tree. Modules build that tree
//! from serializable structs with [`Value::from_serialize`].

mod exec;
mod funcs;
mod lexer;
mod parser;
mod powerline;
mod value;


pub use funcs::Funcs;
pub use value::Value;

use crate::error::KitschError;
use parser::{Arg, Node, Pipeline, Tree};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    Syntax { line: usize, message: String },
    Exec(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax { line, message } => {
                write!(f, "template syntax error on line {}: {}", line, message)
            }
            TemplateError::Exec(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<TemplateError> for KitschError {
    fn from(err: TemplateError) -> Self {
        KitschError::Template(err.to_string())
    }
}

/// A parsed template, ready to execute any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    tree: Tree,
}

impl Template {
    pub fn parse(name: &str, src: &str) -> Result<Template, TemplateError> {
        let tree = parser::parse(lexer::lex(src)?)?;
        check_functions(&tree.root)?;
        for body in tree.defines.values() {
            check_functions(body)?;
        }
        Ok(Template {
            name: name.to_string(),
            tree,
        })
    }

    pub fn execute(&self, data: &Value, funcs: &Funcs<'_>) -> Result<String, TemplateError> {
        exec::Exec::new(&self.name, &self.tree, funcs).run(data)
    }
}

fn check_functions(nodes: &[Node]) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Action(pipe) => check_pipeline(pipe)?,
            Node::If(branch) | Node::Range(branch) | Node::With(branch) => {
                check_pipeline(&branch.pipe)?;
                check_functions(&branch.list)?;
                check_functions(&branch.else_list)?;
            }
            Node::Template { pipe, .. } => {
                if let Some(pipe) = pipe {
                    check_pipeline(pipe)?;
                }
            }
        }
    }
    Ok(())
}

fn check_pipeline(pipe: &Pipeline) -> Result<(), TemplateError> {
    for arg in pipe.cmds.iter().flat_map(|cmd| &cmd.args) {
        match arg {
            Arg::Function(name) if !funcs::is_builtin(name) => {
                return Err(TemplateError::Syntax {
                    line: pipe.line,
                    message: format!("function \"{}\" not defined", name),
                });
            }
            Arg::Chain(inner, _) => check_pipeline(inner)?,
            _ => {}
        }
    }
    Ok(())
}
