use std::rc::Rc;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::TemplateOptions;

/// A run of plain text or a nested group, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Group(usize),
}

/// One `{…}` group of a template, stored in a [`GroupArena`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderGroup {
    /// Text between the braces, exactly as written
    pub raw: String,
    pub segments: Vec<Segment>,
    pub parent: Option<usize>,
    /// Content ends with the conversion marker
    pub is_field: bool,
}

impl PlaceholderGroup {
    fn new(parent: Option<usize>) -> Self {
        PlaceholderGroup {
            raw: String::new(),
            segments: vec![],
            parent,
            is_field: false,
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.segments.last_mut() {
            Some(Segment::Text(existing)) => existing.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
    }

    /// Leading text segment, empty when the group opens with a nested group.
    pub fn leading_text(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Text(text)) => text,
            _ => "",
        }
    }
}

/// Groups of one template; index `0` is the synthetic outer group.
#[derive(Debug, Clone)]
pub struct GroupArena {
    groups: Vec<PlaceholderGroup>,
    /// Group indices in the order their closing brace was seen
    closed: Vec<usize>,
}

impl GroupArena {
    pub fn root(&self) -> usize {
        0
    }

    pub fn get(&self, index: usize) -> &PlaceholderGroup {
        &self.groups[index]
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every group after all of its children, left to right, the outer group last.
    pub fn bottom_up(&self) -> impl Iterator<Item = usize> + '_ {
        self.closed.iter().copied()
    }
}

fn malformed(message: &str, offset: usize) -> Error {
    Error::new(
        ErrorImpl::MalformedTemplateText { message: message.to_string() },
        Position(offset as u32, Rc::new(String::from("<template>"))),
    )
}

/// Length of the opaque run starting at `start`, or `None` when the
/// third-party prefix there is never closed.
fn opaque_length(text: &str, start: usize, options: &TemplateOptions) -> Option<usize> {
    let prefix = options.opaque_prefix.as_str();
    let suffix = options.opaque_suffix.as_str();

    let mut depth = 1;
    let mut offset = start + prefix.len();
    while offset < text.len() {
        let rest = &text[offset..];
        if rest.starts_with(suffix) {
            depth -= 1;
            offset += suffix.len();
            if depth == 0 {
                return Some(offset - start);
            }
        } else if rest.starts_with(prefix) {
            depth += 1;
            offset += prefix.len();
        } else if rest.starts_with('\\') {
            offset += escape_length(rest);
        } else {
            offset += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }

    None
}

/// Length of the backslash escape at the start of `rest`.
fn escape_length(rest: &str) -> usize {
    1 + rest[1..].chars().next().map_or(0, char::len_utf8)
}

/// Splits template text into a group arena, wrapping it in a synthetic outer group.
pub fn tokenize(text: &str, options: &TemplateOptions) -> Result<GroupArena, Error> {
    let mut groups = vec![PlaceholderGroup::new(None)];
    let mut closed = vec![];
    // (group index, offset just after its opening brace)
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];

    let mut offset = 0;
    while offset < text.len() {
        let rest = &text[offset..];
        let Some(&(current, opened_at)) = stack.last() else {
            return Err(malformed("group stack underflow", offset));
        };

        // Escaped characters stay in the text as written
        if rest.starts_with('\\') {
            let length = escape_length(rest);
            groups[current].push_text(&rest[..length]);
            offset += length;
            continue;
        }

        if !options.opaque_prefix.is_empty() && rest.starts_with(options.opaque_prefix.as_str()) {
            if let Some(length) = opaque_length(text, offset, options) {
                groups[current].push_text(&text[offset..offset + length]);
                offset += length;
                continue;
            }
        }

        let Some(character) = rest.chars().next() else {
            break;
        };

        match character {
            '{' => {
                let index = groups.len();
                groups.push(PlaceholderGroup::new(Some(current)));
                groups[current].segments.push(Segment::Group(index));
                stack.push((index, offset + 1));
            }
            '}' => {
                if stack.len() == 1 {
                    return Err(malformed("unmatched `}`", offset));
                }
                stack.pop();

                let group = &mut groups[current];
                group.raw = text[opened_at..offset].to_string();
                group.is_field = matches!(
                    group.segments.last(),
                    Some(Segment::Text(last)) if last.ends_with(options.field_marker.as_str())
                );
                closed.push(current);
            }
            _ => groups[current].push_text(&rest[..character.len_utf8()]),
        }

        offset += character.len_utf8();
    }

    if let Some(&(_, opened_at)) = stack.get(1) {
        return Err(malformed("unclosed `{`", opened_at.saturating_sub(1)));
    }

    groups[0].raw = text.to_string();
    closed.push(0);

    Ok(GroupArena { groups, closed })
}
