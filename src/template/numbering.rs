use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::errors::errors::Error;

use super::{
    tokenizer::{tokenize, PlaceholderGroup, Segment},
    TemplateOptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceholderKey {
    Named(String),
    /// Minted once per anonymous field, so it never matches another
    Anonymous(usize),
}

/// Numbers handed out during one pass.
#[derive(Debug, Default)]
pub struct NumberingRegistry {
    numbers: HashMap<PlaceholderKey, usize>,
    used: BTreeSet<usize>,
    minted: usize,
}

impl NumberingRegistry {
    pub fn new() -> Self {
        NumberingRegistry::default()
    }

    pub fn anonymous(&mut self) -> PlaceholderKey {
        self.minted += 1;
        PlaceholderKey::Anonymous(self.minted)
    }

    /// Number of `key`, assigning one past the highest used number on first sight.
    pub fn number_for(&mut self, key: PlaceholderKey) -> usize {
        if let Some(&number) = self.numbers.get(&key) {
            return number;
        }

        let number = self.used.iter().next_back().map_or(1, |highest| highest + 1);
        self.used.insert(number);
        self.numbers.insert(key, number);
        number
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

fn render_segments(group: &PlaceholderGroup, rendered: &[String]) -> String {
    let mut content = String::new();
    for segment in &group.segments {
        match segment {
            Segment::Text(text) => content.push_str(text),
            Segment::Group(index) => content.push_str(&rendered[*index]),
        }
    }
    content
}

fn render_field(
    group: &PlaceholderGroup,
    content: &str,
    registry: &mut NumberingRegistry,
    options: &TemplateOptions,
) -> String {
    let body = content.strip_suffix(options.field_marker.as_str()).unwrap_or(content);

    // The name can only come from text written before any nested group
    let (name, preview) = match group.leading_text().find(':') {
        Some(colon) => (&body[..colon.min(body.len())], body.get(colon + 1..).unwrap_or("")),
        None => ("", body),
    };

    let key = if name.trim().is_empty() {
        registry.anonymous()
    } else {
        PlaceholderKey::Named(name.trim().to_string())
    };
    let number = registry.number_for(key);

    if preview.is_empty() {
        format!("{{{}}}", number)
    } else {
        format!("{{{}:{}}}", number, preview)
    }
}

/// Non-field groups keep their braces, escaped so they never read as a numbered field.
fn render_plain(content: String) -> String {
    if !content.is_empty() && content.chars().all(|character| character.is_ascii_digit()) {
        content
    } else {
        format!("\\{{{}\\}}", content)
    }
}

/// Assigns numbers to the fields of `text`, inner fields first, left to right.
///
/// Every call starts from an empty registry.
pub fn number(text: &str, options: &TemplateOptions) -> Result<String, Error> {
    let arena = tokenize(text, options)?;
    let mut registry = NumberingRegistry::new();
    let mut rendered = vec![String::new(); arena.len()];

    for index in arena.bottom_up() {
        let group = arena.get(index);
        let content = render_segments(group, &rendered);

        rendered[index] = if index == arena.root() {
            content
        } else if group.is_field {
            render_field(group, &content, &mut registry, options)
        } else {
            render_plain(content)
        };
    }

    debug!(fields = registry.len(), "numbered template");
    Ok(std::mem::take(&mut rendered[arena.root()]))
}
