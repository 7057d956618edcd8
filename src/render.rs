//! Final layout of a rendered prompt and the bytes handed to the shell.

use crate::context::Context;
use crate::modules::{FLEXIBLE_SPACE_MARKER, ModuleWrapper, RenderedModule};
use crate::style::ansi::{TokenKind, tokenize};
use crate::style::print_width;
use std::sync::Arc;

/// Run the root module and lay out its output for the terminal.
pub fn render_prompt(context: &Arc<Context>, root: &ModuleWrapper) -> (RenderedModule, String) {
    let result = root.execute(context);
    let text = layout_flexible_spaces(
        context.globals.terminal_width,
        &result.text,
        &context.flexible_space_replacement,
    );
    (result, text)
}

/// Expand flexible-space markers so each line fills `width` columns.
///
/// Extra space is split evenly between the gaps on a line, with whatever
/// doesn't divide evenly going to the last gap. A line that is already too
/// wide gets `replacement` for each marker instead.
pub fn layout_flexible_spaces(width: usize, text: &str, replacement: &str) -> String {
    if !text.contains(FLEXIBLE_SPACE_MARKER) {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| layout_line(width, line, replacement))
        .collect::<Vec<_>>()
        .join("\n")
}

fn layout_line(width: usize, line: &str, replacement: &str) -> String {
    let segments: Vec<&str> = line.split(FLEXIBLE_SPACE_MARKER).collect();
    if segments.len() < 2 {
        return line.to_string();
    }

    let used: usize = segments.iter().map(|s| print_width(s)).sum();
    let gaps = segments.len() - 1;
    if used >= width {
        return segments.join(replacement);
    }

    let extra = width - used;
    let each = extra / gaps;
    let last = extra - each * (gaps - 1);

    let mut out = String::with_capacity(line.len() + extra);
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            let spaces = if index == gaps { last } else { each };
            out.extend(std::iter::repeat_n(' ', spaces));
        }
        out.push_str(segment);
    }
    out
}

/// Mark escape sequences as zero-width for shells that need to be told,
/// so line editing knows where the cursor is. Characters the shell would
/// read as its own prompt escapes are doubled.
pub fn wrap_escapes(shell: &str, prompt: &str) -> String {
    let (open, close, special) = match shell {
        "bash" => ("\\[", "\\]", '\\'),
        "zsh" => ("%{", "%}", '%'),
        _ => return prompt.to_string(),
    };

    let mut out = String::with_capacity(prompt.len());
    for token in tokenize(prompt) {
        if token.kind == TokenKind::EscapeCode {
            out.push_str(open);
            out.push_str(token.content);
            out.push_str(close);
        } else {
            for c in token.content.chars() {
                if c == special {
                    out.push(c);
                }
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;
    use std::path::Path;

    fn flex(parts: &[&str]) -> String {
        parts.join(FLEXIBLE_SPACE_MARKER)
    }

    #[test]
    fn test_single_gap_fills_width() {
        assert_eq!(layout_flexible_spaces(10, &flex(&["a", "b"]), " "), "a        b");
    }

    #[test]
    fn test_remainder_goes_to_last_gap() {
        assert_eq!(
            layout_flexible_spaces(10, &flex(&["a", "b", "c"]), " "),
            "a   b    c"
        );
    }

    #[test]
    fn test_escapes_and_wide_chars_have_their_printed_width() {
        let line = flex(&["\x1b[32ma\x1b[39m", "日"]);
        assert_eq!(
            layout_flexible_spaces(6, &line, " "),
            "\x1b[32ma\x1b[39m   日"
        );
    }

    #[test]
    fn test_line_too_wide_uses_replacement() {
        assert_eq!(layout_flexible_spaces(3, &flex(&["abc", "def"]), "-"), "abc-def");
        assert_eq!(layout_flexible_spaces(3, &flex(&["abc", "def"]), ""), "abcdef");
    }

    #[test]
    fn test_each_line_is_laid_out_separately() {
        let text = format!("{}\n{}", flex(&["a", "b"]), "$ ");
        assert_eq!(layout_flexible_spaces(4, &text, " "), "a  b\n$ ");
    }

    #[test]
    fn test_text_without_markers_is_unchanged() {
        assert_eq!(layout_flexible_spaces(80, "hello", " "), "hello");
    }

    #[test]
    fn test_wrap_escapes() {
        let prompt = "\x1b[32m$\x1b[39m ";
        assert_eq!(wrap_escapes("bash", prompt), "\\[\x1b[32m\\]$\\[\x1b[39m\\] ");
        assert_eq!(wrap_escapes("zsh", prompt), "%{\x1b[32m%}$%{\x1b[39m%} ");
        assert_eq!(wrap_escapes("fish", prompt), prompt);
    }

    #[test]
    fn test_wrap_escapes_doubles_shell_specials() {
        assert_eq!(wrap_escapes("zsh", "12% "), "12%% ");
        assert_eq!(wrap_escapes("bash", "C:\\Users "), "C:\\\\Users ");
        assert_eq!(wrap_escapes("fish", "12% "), "12% ");
    }

    #[test]
    fn test_wrap_escapes_lone_escape_before_multibyte_char() {
        assert_eq!(wrap_escapes("zsh", "a\x1bé"), "a%{\x1b%}é");
    }

    #[test]
    fn test_render_prompt_lays_out_flexible_space() {
        let root = ModuleWrapper::from_yaml(
            "type: block\njoin: ''\nmodules:\n  - type: text\n    text: a\n  - type: flexible_space\n  - type: text\n    id: b\n    text: b",
        )
        .unwrap();
        let mut context = test_context(Path::new("/tmp"));
        context.globals.terminal_width = 10;

        let (result, text) = render_prompt(&Arc::new(context), &root);
        assert_eq!(text, "a        b");
        assert!(result.text.contains(FLEXIBLE_SPACE_MARKER));
    }

    #[test]
    fn test_flexible_space_survives_templates() {
        let root = ModuleWrapper::from_yaml(
            "type: block\njoin: ''\ntemplate: '[{{ .Text }}]'\nmodules:\n  - type: text\n    text: a\n  - type: flexible_space\n  - type: text\n    id: b\n    text: b",
        )
        .unwrap();
        let mut context = test_context(Path::new("/tmp"));
        context.globals.terminal_width = 10;

        let (_, text) = render_prompt(&Arc::new(context), &root);
        assert_eq!(text, "[a      b]");
    }
}
