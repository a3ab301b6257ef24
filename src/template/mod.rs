//! Template text: numbering of fill-in fields and conversion into editor
//! tab-stop syntax.
//!
//! A group `{…}` whose content ends with the conversion marker is a field.
//! Its content is `name:preview`, a bare `preview`, or nothing; fields
//! without a name are numbered independently.
//!
//! A backslash makes the next character literal text, so `\{` never opens
//! a group. Numbering keeps escapes as written and conversion resolves them.

use crate::resolver::context::TypeFormat;

pub mod numbering;
pub mod snippet;
pub mod tokenizer;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOptions {
    /// Suffix marking a group as a fillable field
    pub field_marker: String,
    /// Third-party text between these is never split into groups
    pub opaque_prefix: String,
    pub opaque_suffix: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions {
            field_marker: String::from("!f"),
            opaque_prefix: String::from("<"),
            opaque_suffix: String::from(">"),
        }
    }
}

impl TemplateOptions {
    /// Options whose opaque markers match the third-party markers of `format`.
    pub fn for_format(format: &TypeFormat) -> Self {
        TemplateOptions {
            opaque_prefix: format.third_party_prefix.clone(),
            opaque_suffix: format.third_party_suffix.clone(),
            ..TemplateOptions::default()
        }
    }
}

/// Escapes `text` so it reads as literal template text: no groups and no
/// opaque runs.
pub fn escape(text: &str, options: &TemplateOptions) -> String {
    let markers = [options.opaque_prefix.as_str(), options.opaque_suffix.as_str()];

    let mut escaped = String::with_capacity(text.len());
    for (offset, character) in text.char_indices() {
        let rest = &text[offset..];
        if matches!(character, '\\' | '{' | '}')
            || markers.iter().any(|marker| !marker.is_empty() && rest.starts_with(marker))
        {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
