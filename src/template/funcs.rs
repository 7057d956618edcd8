//! Built-in template functions.
//!
//! `and`, `or`, `include` and `template` need access to the executor and
//! live in `exec`; everything else is here.

use super::powerline::Powerline;
use super::value::Value;
use crate::env::Environment;
use crate::style::{Registry, print_width, to_bg_color, to_fg_color};
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

/// What template functions may reach outside the template.
pub struct Funcs<'a> {
    pub styles: &'a Registry,
    pub env: &'a dyn Environment,
    pub terminal_width: usize,
}

const BUILTINS: &[&str] = &[
    "and",
    "or",
    "not",
    "eq",
    "ne",
    "lt",
    "le",
    "gt",
    "ge",
    "len",
    "index",
    "print",
    "printf",
    "println",
    "default",
    "upper",
    "lower",
    "trim",
    "repeat",
    "include",
    "env",
    "style",
    "fgColor",
    "bgColor",
    "newPowerline",
    "newReversePowerline",
    "rightJustify",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

type FuncResult = Result<Value, String>;

fn arity(name: &str, args: &[Value], n: usize) -> Result<(), String> {
    if args.len() != n {
        return Err(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            n,
            args.len()
        ));
    }
    Ok(())
}

fn string_arg(name: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!(
            "{}: expected string; found {}",
            name,
            other.type_name()
        )),
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, String> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or_else(|| "invalid comparison".to_string()),
            _ => Err(format!(
                "incompatible types for comparison: {} and {}",
                a.type_name(),
                b.type_name()
            )),
        },
    }
}

fn len(value: &Value) -> FuncResult {
    let n = match value {
        Value::String(s) => s.len(),
        Value::List(l) => l.len(),
        Value::Map(m) => m.len(),
        Value::Nil => 0,
        other => return Err(format!("len of type {}", other.type_name())),
    };
    Ok(Value::Int(n as i64))
}

fn index(args: &[Value]) -> FuncResult {
    let Some((first, keys)) = args.split_first() else {
        return Err("index of untyped nil".to_string());
    };
    let mut current = first.clone();
    for key in keys {
        current = match (&current, key) {
            (Value::List(items), k) => {
                let i = k
                    .as_i64()
                    .ok_or_else(|| format!("cannot index list with {}", k.type_name()))?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| format!("index out of range: {}", i))?
            }
            (Value::Map(m), Value::String(k)) => m.get(k).cloned().unwrap_or_default(),
            (Value::Nil, _) => Value::Nil,
            (v, k) => {
                return Err(format!(
                    "can't index item of type {} with {}",
                    v.type_name(),
                    k.type_name()
                ));
            }
        };
    }
    Ok(current)
}

/// Go's `fmt.Sprint`: spaces go between operands when neither is a string.
pub fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0
            && !matches!(arg, Value::String(_))
            && !matches!(args[i - 1], Value::String(_))
        {
            out.push(' ');
        }
        let _ = write!(out, "{}", arg);
    }
    out
}

fn sprintln(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    format!("{}\n", parts.join(" "))
}

/// A subset of Go's `fmt.Sprintf`: flags `-` and `0`, width, precision,
/// and the verbs `v s d f q x X t %`.
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left = false;
        let mut zero = false;
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => left = true,
                '0' => zero = true,
                '+' | ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        let mut width = 0usize;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            width = width * 10 + d as usize;
            chars.next();
        }
        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut p = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                p = p * 10 + d as usize;
                chars.next();
            }
            precision = Some(p);
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.next() else {
            let _ = write!(out, "%!{}(MISSING)", verb);
            continue;
        };

        let formatted = match verb {
            'd' => match arg.as_i64() {
                Some(i) => i.to_string(),
                None => format!("%!d({})", arg),
            },
            'f' => match arg.as_f64() {
                Some(f) => format!("{:.*}", precision.unwrap_or(6), f),
                None => format!("%!f({})", arg),
            },
            'q' => format!("{:?}", arg.to_string()),
            'x' | 'X' => {
                let hex = match arg {
                    Value::Int(i) => format!("{:x}", i),
                    other => hex::encode(other.to_string()),
                };
                if verb == 'X' {
                    hex.to_uppercase()
                } else {
                    hex
                }
            }
            't' => match arg {
                Value::Bool(b) => b.to_string(),
                other => format!("%!t({})", other),
            },
            _ => {
                let s = arg.to_string();
                match (verb, precision) {
                    ('s', Some(p)) => s.chars().take(p).collect(),
                    ('v', Some(p)) if matches!(arg, Value::Float(_)) => {
                        format!("{:.*}", p, arg.as_f64().unwrap_or_default())
                    }
                    _ => s,
                }
            }
        };

        let pad = width.saturating_sub(formatted.chars().count());
        if pad == 0 {
            out.push_str(&formatted);
        } else if left {
            out.push_str(&formatted);
            out.push_str(&" ".repeat(pad));
        } else if zero && matches!(verb, 'd' | 'f' | 'x' | 'X') {
            let (sign, digits) = match formatted.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", formatted.as_str()),
            };
            let _ = write!(out, "{}{}{}", sign, "0".repeat(pad), digits);
        } else {
            out.push_str(&" ".repeat(pad));
            out.push_str(&formatted);
        }
    }

    let extra: Vec<String> = args.map(|a| a.to_string()).collect();
    if !extra.is_empty() {
        let _ = write!(out, "%!(EXTRA {})", extra.join(", "));
    }
    out
}

fn right_justify(text: &str, terminal_width: usize) -> String {
    text.split('\n')
        .map(|line| {
            let column = terminal_width.saturating_sub(print_width(line)).max(1);
            format!("\x1b[s\x1b[{}G{}\x1b[u", column, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn styled(funcs: &Funcs<'_>, descriptor: &str, text: &Value) -> Value {
    let text = text.to_string();
    match funcs.styles.get(descriptor) {
        Ok(style) => Value::String(style.apply(&text)),
        Err(_) => Value::String(text),
    }
}

/// Call the built-in `name`.
pub fn call(funcs: &Funcs<'_>, name: &str, args: Vec<Value>) -> FuncResult {
    match name {
        "not" => {
            arity(name, &args, 1)?;
            Ok(Value::Bool(!args[0].is_truthy()))
        }
        "eq" | "ne" => {
            if args.len() < 2 {
                return Err(format!("missing argument for {}", name));
            }
            let equal = args[1..].iter().any(|other| args[0] == *other);
            Ok(Value::Bool(if name == "eq" { equal } else { !equal }))
        }
        "lt" | "le" | "gt" | "ge" => {
            arity(name, &args, 2)?;
            let ord = compare(&args[0], &args[1])?;
            Ok(Value::Bool(match name {
                "lt" => ord == Ordering::Less,
                "le" => ord != Ordering::Greater,
                "gt" => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        "len" => {
            arity(name, &args, 1)?;
            len(&args[0])
        }
        "index" => index(&args),
        "print" => Ok(Value::String(sprint(&args))),
        "println" => Ok(Value::String(sprintln(&args))),
        "printf" => {
            let Some((format, rest)) = args.split_first() else {
                return Err("printf needs a format".to_string());
            };
            Ok(Value::String(sprintf(&string_arg(name, format)?, rest)))
        }
        "default" => {
            // `default "x" .Value`: the last argument is the given value.
            match args.as_slice() {
                [fallback] => Ok(fallback.clone()),
                [fallback, given] => Ok(if given.is_truthy() {
                    given.clone()
                } else {
                    fallback.clone()
                }),
                _ => Err(format!(
                    "wrong number of args for default: want 2 got {}",
                    args.len()
                )),
            }
        }
        "upper" => {
            arity(name, &args, 1)?;
            Ok(Value::String(args[0].to_string().to_uppercase()))
        }
        "lower" => {
            arity(name, &args, 1)?;
            Ok(Value::String(args[0].to_string().to_lowercase()))
        }
        "trim" => {
            arity(name, &args, 1)?;
            Ok(Value::String(args[0].to_string().trim().to_string()))
        }
        "repeat" => {
            arity(name, &args, 2)?;
            let count = args[0]
                .as_i64()
                .ok_or_else(|| "repeat: count must be a number".to_string())?;
            Ok(Value::String(
                args[1].to_string().repeat(count.max(0) as usize),
            ))
        }
        "env" => {
            arity(name, &args, 1)?;
            Ok(Value::String(funcs.env.getenv(&string_arg(name, &args[0])?)))
        }
        "style" => {
            arity(name, &args, 2)?;
            Ok(styled(funcs, &string_arg(name, &args[0])?, &args[1]))
        }
        "fgColor" => {
            arity(name, &args, 2)?;
            Ok(styled(funcs, &to_fg_color(&args[0].to_string()), &args[1]))
        }
        "bgColor" => {
            arity(name, &args, 2)?;
            Ok(styled(funcs, &to_bg_color(&args[0].to_string()), &args[1]))
        }
        "newPowerline" | "newReversePowerline" => {
            arity(name, &args, 3)?;
            let powerline = Powerline::new(
                &args[0].to_string(),
                &args[1].to_string(),
                &args[2].to_string(),
                name == "newReversePowerline",
            );
            Ok(Value::Powerline(Arc::new(Mutex::new(powerline))))
        }
        "rightJustify" => {
            arity(name, &args, 1)?;
            Ok(Value::String(right_justify(
                &args[0].to_string(),
                funcs.terminal_width,
            )))
        }
        _ => Err(format!("function \"{}\" not defined", name)),
    }
}

/// Call a method on a value, e.g. `$pl.Segment "blue" "text"`.
pub fn call_method(
    funcs: &Funcs<'_>,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
) -> Option<FuncResult> {
    let Value::Powerline(powerline) = receiver else {
        return None;
    };
    let mut powerline = match powerline.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match name {
        "Segment" => Some(arity(name, &args, 2).map(|_| {
            Value::String(powerline.segment(funcs.styles, &args[0].to_string(), &args[1].to_string()))
        })),
        "Finish" => Some(
            arity(name, &args, 0).map(|_| Value::String(powerline.finish(funcs.styles))),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_spacing() {
        assert_eq!(
            sprint(&[Value::Int(1), Value::Int(2), Value::from("a"), Value::Int(3)]),
            "1 2a3"
        );
    }

    #[test]
    fn test_sprintf() {
        let args = [Value::Int(5), Value::from("ab"), Value::Float(1.5)];
        assert_eq!(sprintf("%d-%s-%.2f", &args), "5-ab-1.50");
        assert_eq!(sprintf("%03d|%-4s|%4s", &[Value::Int(7), Value::from("x"), Value::from("y")]), "007|x   |   y");
        assert_eq!(sprintf("100%%", &[]), "100%");
        assert_eq!(sprintf("%d", &[]), "%!d(MISSING)");
        assert_eq!(sprintf("%x", &[Value::Int(255)]), "ff");
        assert_eq!(sprintf("%q", &[Value::from("a")]), "\"a\"");
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&Value::Int(1), &Value::Float(1.5)), Ok(Ordering::Less));
        assert_eq!(
            compare(&Value::from("b"), &Value::from("a")),
            Ok(Ordering::Greater)
        );
        assert!(compare(&Value::from("b"), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_index() {
        let list = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(index(&[list.clone(), Value::Int(1)]), Ok(Value::from("b")));
        assert!(index(&[list, Value::Int(5)]).is_err());

        let map = Value::map([("k", Value::Int(1))]);
        assert_eq!(index(&[map.clone(), Value::from("k")]), Ok(Value::Int(1)));
        assert_eq!(index(&[map, Value::from("nope")]), Ok(Value::Nil));
    }

    #[test]
    fn test_right_justify() {
        assert_eq!(
            right_justify("abc", 10),
            "\x1b[s\x1b[7Gabc\x1b[u"
        );
        assert_eq!(
            right_justify("a\nbb", 10),
            "\x1b[s\x1b[9Ga\x1b[u\n\x1b[s\x1b[8Gbb\x1b[u"
        );
    }

    #[test]
    fn test_right_justify_never_emits_a_column_before_the_first() {
        assert_eq!(right_justify("abcdef", 4), "\x1b[s\x1b[1Gabcdef\x1b[u");
        assert_eq!(right_justify("abc", 3), "\x1b[s\x1b[1Gabc\x1b[u");
        assert_eq!(right_justify("abc", 0), "\x1b[s\x1b[1Gabc\x1b[u");
    }
}
