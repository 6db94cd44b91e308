//! # Interpolation Module / 变量插值模块
//!
//! Renders template strings against a variable mapping. Recognized references
//! are `$name` and `${name}`, where `name` starts with a letter or `_` and
//! continues with letters, digits or `_`. Unbound names render as the empty
//! string. `\$` suppresses a reference and is passed through as written;
//! `\\` is passed through as written and does not escape a following `$`.
//!
//! 根据变量映射渲染模板字符串。支持 `$name` 与 `${name}` 两种引用形式，
//! 未绑定的变量渲染为空字符串，`\$` 会阻止替换并原样保留。

use std::collections::HashMap;

/// Name → string value, scoped to one test.
pub type Variables = HashMap<String, String>;

const MARKER: char = '$';

/// Substitutes variable references in `template`.
///
/// Templates without a marker are returned unchanged. Otherwise the rendered
/// text is trimmed, since document bodies usually carry layout whitespace
/// around the payload.
///
/// 替换 `template` 中的变量引用。不含标记的模板原样返回；
/// 否则对渲染结果去除首尾空白。
pub fn interpolate(template: &str, variables: &Variables) -> String {
    if !template.contains(MARKER) {
        return template.to_string();
    }

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['\\', MARKER]) {
        rendered.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(escaped) = tail.strip_prefix('\\') {
            // `\\` is one unit, so a reference right after it still substitutes.
            if let Some(after) = escaped.strip_prefix('\\') {
                rendered.push_str("\\\\");
                rest = after;
            } else if escaped.starts_with(MARKER) {
                rendered.push('\\');
                rendered.push(MARKER);
                rest = &escaped[MARKER.len_utf8()..];
            } else {
                rendered.push('\\');
                rest = escaped;
            }
            continue;
        }

        let after_marker = &tail[MARKER.len_utf8()..];
        match scan_reference(after_marker) {
            Some((name, consumed)) => {
                if let Some(value) = variables.get(name) {
                    rendered.push_str(value);
                }
                rest = &after_marker[consumed..];
            }
            None => {
                rendered.push(MARKER);
                rest = after_marker;
            }
        }
    }
    rendered.push_str(rest);

    rendered.trim().to_string()
}

/// Reads a reference right after the marker. Returns the name and the number
/// of bytes consumed (including braces).
fn scan_reference(input: &str) -> Option<(&str, usize)> {
    if let Some(braced) = input.strip_prefix('{') {
        let close = braced.find('}')?;
        let name = &braced[..close];
        return is_identifier(name).then_some((name, close + 2));
    }

    let mut chars = input.char_indices();
    let (_, first) = chars.next()?;
    if !is_identifier_start(first) {
        return None;
    }
    let end = chars
        .find(|(_, c)| !is_identifier_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    Some((&input[..end], end))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_char)
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
