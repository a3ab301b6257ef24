use crate::errors::errors::Error;

use super::{
    tokenizer::{tokenize, PlaceholderGroup, Segment},
    TemplateOptions,
};

/// Resolves template escapes, then escapes what tab-stop syntax reserves.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut characters = text.chars();
    while let Some(character) = characters.next() {
        let literal = match character {
            '\\' => characters.next().unwrap_or('\\'),
            _ => character,
        };
        if matches!(literal, '\\' | '$' | '}') {
            escaped.push('\\');
        }
        escaped.push(literal);
    }
    escaped
}

/// Concatenates the segments of `group`, dropping the first `skip` bytes of its leading text.
fn render_escaped(group: &PlaceholderGroup, rendered: &[String], skip: usize) -> String {
    let mut content = String::new();
    for (position, segment) in group.segments.iter().enumerate() {
        match segment {
            Segment::Text(text) if position == 0 => content.push_str(&escape(text.get(skip..).unwrap_or(""))),
            Segment::Text(text) => content.push_str(&escape(text)),
            Segment::Group(index) => content.push_str(&rendered[*index]),
        }
    }
    content
}

fn convert_group(group: &PlaceholderGroup, rendered: &[String]) -> String {
    let leading = group.leading_text();
    let digits = leading.len() - leading.trim_start_matches(|character: char| character.is_ascii_digit()).len();

    if digits > 0 {
        let number = &leading[..digits];
        if digits == leading.len() && group.segments.len() == 1 {
            return format!("${}", number);
        }
        if leading[digits..].starts_with(':') {
            return format!("${{{}:{}}}", number, render_escaped(group, rendered, digits + 1));
        }
    }

    format!("{{{}}}", render_escaped(group, rendered, 0))
}

/// Rewrites numbered text into tab-stop syntax: `{n}` becomes `$n` and
/// `{n:preview}` becomes `${n:preview}`.
pub fn convert(text: &str, options: &TemplateOptions) -> Result<String, Error> {
    let arena = tokenize(text, options)?;
    let mut rendered = vec![String::new(); arena.len()];

    for index in arena.bottom_up() {
        let group = arena.get(index);
        rendered[index] = if index == arena.root() {
            render_escaped(group, &rendered, 0)
        } else {
            convert_group(group, &rendered)
        };
    }

    Ok(std::mem::take(&mut rendered[arena.root()]))
}
