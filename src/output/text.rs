// Small string helpers used when shaping docstrings and signatures

/// One level of indentation, as written in the documented sources
pub const INDENT: &str = "    ";

/// Character index of the first non-whitespace character, or 0 when there is none
pub fn count_leading_spaces(s: &str) -> usize {
    s.chars().position(|c| !c.is_whitespace()).unwrap_or(0)
}

/// Remove exactly one four-space indentation level.
///
/// Applies to the start of the text and to every line after a newline.
/// Lines indented by anything other than four spaces are left as they are.
pub fn remove_indentation(s: &str) -> String {
    let dedented = s.replace("\n    ", "\n");
    match dedented.strip_prefix(INDENT) {
        Some(rest) => rest.to_string(),
        None => dedented,
    }
}

/// Keep `target` up to byte `start`, then `insert`, then `target` from byte `end`.
///
/// Offsets past the end are clamped and offsets inside a character move back
/// to its start. With `start > end` the text between them appears twice.
pub fn insert_in_string(target: &str, insert: &str, start: usize, end: usize) -> String {
    let head = &target[..char_floor(target, start)];
    let tail = &target[char_floor(target, end)..];

    let mut result = String::with_capacity(head.len() + insert.len() + tail.len());
    result.push_str(head);
    result.push_str(insert);
    result.push_str(tail);
    result
}

fn char_floor(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Wrap source in a fenced python block
pub fn code_snippet(snippet: &str) -> String {
    format!("```python\n{}\n```\n", snippet)
}

/// Dedent a raw docstring body.
///
/// The summary line is kept as written; the rest loses one indentation level
/// per four columns of the first indented line.
pub fn clean_docstring(raw: &str) -> String {
    let (summary, rest) = match raw.split_once('\n') {
        Some((summary, rest)) => (summary.trim(), rest),
        None => return raw.trim().to_string(),
    };

    let indent = rest
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(count_leading_spaces)
        .unwrap_or(0);

    let mut body = format!("\n{}", rest);
    for _ in 0..indent / INDENT.len() {
        body = body.replace("\n    ", "\n");
    }

    let text = format!("{}{}", summary, body);
    text.trim().to_string()
}

/// Lay out a call signature, one argument per line when it gets too long
pub fn format_signature(path: &str, arguments: &[String], max_line_length: usize) -> String {
    let flat = format!("{}({})", path, arguments.join(", "));
    if flat.len() <= max_line_length || arguments.is_empty() {
        return flat;
    }

    let mut out = format!("{}(\n", path);
    for arg in arguments {
        out.push_str(INDENT);
        out.push_str(arg);
        out.push_str(",\n");
    }
    out.push(')');
    out
}
