//! Template execution: walks a parsed tree against a data value.

use super::TemplateError;
use super::funcs::{self, Funcs};
use super::parser::{Arg, Branch, Command, Node, Pipeline, Tree};
use super::value::Value;
use std::collections::HashMap;

/// How deeply `include` may recurse into the same named template.
pub const MAX_INCLUDE_DEPTH: usize = 100;

pub struct Exec<'a> {
    name: &'a str,
    tree: &'a Tree,
    funcs: &'a Funcs<'a>,
    vars: Vec<(String, Value)>,
    include_depth: HashMap<String, usize>,
    line: usize,
}

type ExecResult<T> = Result<T, TemplateError>;

impl<'a> Exec<'a> {
    pub fn new(name: &'a str, tree: &'a Tree, funcs: &'a Funcs<'a>) -> Self {
        Exec {
            name,
            tree,
            funcs,
            vars: Vec::new(),
            include_depth: HashMap::new(),
            line: 1,
        }
    }

    fn err(&self, message: impl std::fmt::Display) -> TemplateError {
        TemplateError::Exec(format!("template: {}:{}: {}", self.name, self.line, message))
    }

    pub fn run(&mut self, data: &Value) -> ExecResult<String> {
        self.vars = vec![(String::new(), data.clone())];
        let mut out = String::new();
        let tree = self.tree;
        self.walk(data, &tree.root, &mut out)?;
        Ok(out)
    }

    fn walk(&mut self, dot: &Value, nodes: &[Node], out: &mut String) -> ExecResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(dot, pipe)?;
                    if pipe.decl.is_empty() {
                        out.push_str(&value.to_string());
                    }
                }
                Node::If(branch) => self.walk_if(dot, branch, out)?,
                Node::With(branch) => self.walk_with(dot, branch, out)?,
                Node::Range(branch) => self.walk_range(dot, branch, out)?,
                Node::Template { name, pipe, line } => {
                    self.line = *line;
                    let data = match pipe {
                        Some(pipe) => self.eval_pipeline(dot, pipe)?,
                        None => Value::Nil,
                    };
                    let expanded = self.expand(name, &data)?;
                    out.push_str(&expanded);
                }
            }
        }
        Ok(())
    }

    fn walk_if(&mut self, dot: &Value, branch: &Branch, out: &mut String) -> ExecResult<()> {
        let mark = self.vars.len();
        let cond = self.eval_pipeline(dot, &branch.pipe)?;
        let list = if cond.is_truthy() {
            &branch.list
        } else {
            &branch.else_list
        };
        self.walk(dot, list, out)?;
        self.vars.truncate(mark);
        Ok(())
    }

    fn walk_with(&mut self, dot: &Value, branch: &Branch, out: &mut String) -> ExecResult<()> {
        let mark = self.vars.len();
        let value = self.eval_pipeline(dot, &branch.pipe)?;
        if value.is_truthy() {
            self.walk(&value, &branch.list, out)?;
        } else {
            self.walk(dot, &branch.else_list, out)?;
        }
        self.vars.truncate(mark);
        Ok(())
    }

    fn walk_range(&mut self, dot: &Value, branch: &Branch, out: &mut String) -> ExecResult<()> {
        let value = self.eval_commands(dot, &branch.pipe)?;
        let items: Vec<(Value, Value)> = match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i as i64), v))
                .collect(),
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
            Value::Int(n) => (0..n.max(0)).map(|i| (Value::Int(i), Value::Int(i))).collect(),
            Value::Nil => Vec::new(),
            other => {
                return Err(self.err(format!("range can't iterate over {}", other)));
            }
        };

        if items.is_empty() {
            return self.walk(dot, &branch.else_list, out);
        }

        let decl = &branch.pipe.decl;
        for (key, elem) in items {
            let mark = self.vars.len();
            match decl.as_slice() {
                [] => {}
                [v] => self.vars.push((v.clone(), elem.clone())),
                [k, v, ..] => {
                    self.vars.push((k.clone(), key));
                    self.vars.push((v.clone(), elem.clone()));
                }
            }
            self.walk(&elem, &branch.list, out)?;
            self.vars.truncate(mark);
        }
        Ok(())
    }

    /// Run a named template with `data` as both dot and `$`.
    fn expand(&mut self, name: &str, data: &Value) -> ExecResult<String> {
        let tree = self.tree;
        let Some(body) = tree.defines.get(name) else {
            return Err(self.err(format!("no such template \"{}\"", name)));
        };

        let depth = self.include_depth.entry(name.to_string()).or_insert(0);
        if *depth >= MAX_INCLUDE_DEPTH {
            return Err(self.err(format!(
                "rendering template has a nested reference name: {}",
                name
            )));
        }
        *depth += 1;

        let saved = std::mem::replace(&mut self.vars, vec![(String::new(), data.clone())]);
        let mut out = String::new();
        let result = self.walk(data, body, &mut out);
        self.vars = saved;
        if let Some(depth) = self.include_depth.get_mut(name) {
            *depth -= 1;
        }
        result.map(|_| out)
    }

    fn lookup_var(&self, name: &str) -> ExecResult<Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| self.err(format!("undefined variable: ${}", name)))
    }

    fn eval_pipeline(&mut self, dot: &Value, pipe: &Pipeline) -> ExecResult<Value> {
        let value = self.eval_commands(dot, pipe)?;
        for name in &pipe.decl {
            if pipe.is_assign {
                let Some(slot) = self.vars.iter_mut().rev().find(|(n, _)| n == name) else {
                    return Err(self.err(format!("undefined variable: ${}", name)));
                };
                slot.1 = value.clone();
            } else {
                self.vars.push((name.clone(), value.clone()));
            }
        }
        Ok(value)
    }

    fn eval_commands(&mut self, dot: &Value, pipe: &Pipeline) -> ExecResult<Value> {
        self.line = pipe.line;
        let mut value = None;
        for cmd in &pipe.cmds {
            value = Some(self.eval_command(dot, cmd, value)?);
        }
        Ok(value.unwrap_or_default())
    }

    fn eval_command(
        &mut self,
        dot: &Value,
        cmd: &Command,
        piped: Option<Value>,
    ) -> ExecResult<Value> {
        let (first, rest) = match cmd.args.split_first() {
            Some(split) => split,
            None => return Ok(Value::Nil),
        };
        let has_args = !rest.is_empty() || piped.is_some();

        match first {
            Arg::Function(name) => self.eval_function(dot, name, rest, piped),
            Arg::Field(fields) => self.eval_fields(dot, dot.clone(), fields, rest, piped),
            Arg::Variable(name, fields) => {
                let receiver = self.lookup_var(name)?;
                self.eval_fields(dot, receiver, fields, rest, piped)
            }
            Arg::Chain(pipe, fields) => {
                let receiver = self.eval_pipeline(dot, pipe)?;
                self.eval_fields(dot, receiver, fields, rest, piped)
            }
            _ if has_args => {
                let value = self.eval_arg(dot, first)?;
                Err(self.err(format!("can't give argument to non-function {}", value)))
            }
            _ => self.eval_arg(dot, first),
        }
    }

    /// Follow `fields` from `receiver`. The final field may be a method
    /// call taking `args`.
    fn eval_fields(
        &mut self,
        dot: &Value,
        receiver: Value,
        fields: &[String],
        args: &[Arg],
        piped: Option<Value>,
    ) -> ExecResult<Value> {
        let has_args = !args.is_empty() || piped.is_some();
        let Some((last, path)) = fields.split_last() else {
            if has_args {
                return Err(self.err("can't give argument to non-function"));
            }
            return Ok(receiver);
        };

        let mut current = receiver;
        for field in path {
            current = self.field_or_method(&current, field, Vec::new())?;
        }

        if matches!(current, Value::Powerline(_)) {
            let mut values = self.eval_args(dot, args)?;
            values.extend(piped);
            return self.field_or_method(&current, last, values);
        }
        if has_args {
            return Err(self.err(format!("{} is not a method but has arguments", last)));
        }
        Ok(current.field(last).cloned().unwrap_or_default())
    }

    fn field_or_method(&self, receiver: &Value, name: &str, args: Vec<Value>) -> ExecResult<Value> {
        if matches!(receiver, Value::Powerline(_)) {
            return match funcs::call_method(self.funcs, receiver, name, args) {
                Some(result) => result.map_err(|e| self.err(format!("error calling {}: {}", name, e))),
                None => Err(self.err(format!(
                    "can't evaluate field {} in type {}",
                    name,
                    receiver.type_name()
                ))),
            };
        }
        Ok(receiver.field(name).cloned().unwrap_or_default())
    }

    fn eval_args(&mut self, dot: &Value, args: &[Arg]) -> ExecResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_arg(dot, arg)).collect()
    }

    fn eval_arg(&mut self, dot: &Value, arg: &Arg) -> ExecResult<Value> {
        match arg {
            Arg::Dot => Ok(dot.clone()),
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Function(name) => self.eval_function(dot, name, &[], None),
            Arg::Field(fields) => self.eval_fields(dot, dot.clone(), fields, &[], None),
            Arg::Variable(name, fields) => {
                let receiver = self.lookup_var(name)?;
                self.eval_fields(dot, receiver, fields, &[], None)
            }
            Arg::Chain(pipe, fields) => {
                let receiver = self.eval_pipeline(dot, pipe)?;
                self.eval_fields(dot, receiver, fields, &[], None)
            }
        }
    }

    fn eval_function(
        &mut self,
        dot: &Value,
        name: &str,
        args: &[Arg],
        piped: Option<Value>,
    ) -> ExecResult<Value> {
        match name {
            // Short-circuit: stop at the first falsy (and) or truthy (or)
            // argument and return it.
            "and" | "or" => {
                if args.is_empty() && piped.is_none() {
                    return Err(self.err(format!("missing argument for {}", name)));
                }
                let stop_on = name == "or";
                let mut last = Value::Nil;
                for arg in args {
                    last = self.eval_arg(dot, arg)?;
                    if last.is_truthy() == stop_on {
                        return Ok(last);
                    }
                }
                Ok(piped.unwrap_or(last))
            }
            "include" => {
                let mut values = self.eval_args(dot, args)?;
                values.extend(piped);
                let (template, data) = match values.as_slice() {
                    [Value::String(t)] => (t.clone(), Value::Nil),
                    [Value::String(t), data] => (t.clone(), data.clone()),
                    _ => return Err(self.err("include needs a template name and data")),
                };
                self.expand(&template, &data).map(Value::String)
            }
            _ => {
                let mut values = self.eval_args(dot, args)?;
                values.extend(piped);
                funcs::call(self.funcs, name, values)
                    .map_err(|e| self.err(format!("error calling {}: {}", name, e)))
            }
        }
    }
}
