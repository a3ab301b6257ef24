use std::slice::Iter;

use super::context::TypeFormat;

/// Canonical description of the type(s) an expression produces.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Leaf(String),
    Container(String, UniqueTypes),
    Mapping { keys: UniqueTypes, values: UniqueTypes },
    /// Source text of an expression that could not be typed
    Unresolved(String),
    /// Externally defined type, already wrapped in the third-party markers
    ThirdParty(String),
}

impl TypeDescriptor {
    pub fn leaf(name: &str) -> Self {
        TypeDescriptor::Leaf(name.to_string())
    }

    pub fn render(&self, format: &TypeFormat) -> String {
        self.render_with(format, &|text: &str| text.to_string())
    }

    /// Renders with `literal` applied to every piece of text except the
    /// markers around third-party labels.
    pub fn render_with(&self, format: &TypeFormat, literal: &dyn Fn(&str) -> String) -> String {
        match self {
            TypeDescriptor::Leaf(name) => literal(name),
            TypeDescriptor::Container(name, children) => {
                if children.is_empty() {
                    literal(name)
                } else {
                    format!(
                        "{}{}{}{}",
                        literal(name),
                        literal(&format.wrap_prefix),
                        children.render_with(format, literal),
                        literal(&format.wrap_suffix)
                    )
                }
            }
            TypeDescriptor::Mapping { keys, values } => {
                if keys.is_empty() && values.is_empty() {
                    String::from("dict")
                } else {
                    format!(
                        "dict{}{}{}{}{}",
                        literal(&format.wrap_prefix),
                        keys.render_with(format, literal),
                        literal(&format.mapping_join),
                        values.render_with(format, literal),
                        literal(&format.wrap_suffix)
                    )
                }
            }
            TypeDescriptor::Unresolved(text) => literal(text),
            TypeDescriptor::ThirdParty(text) => {
                let label = text
                    .strip_prefix(format.third_party_prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(format.third_party_suffix.as_str()));
                match label {
                    Some(label) => format!(
                        "{}{}{}",
                        format.third_party_prefix,
                        literal(label),
                        format.third_party_suffix
                    ),
                    None => literal(text),
                }
            }
        }
    }

    /// Name of the leaf or container, `dict` for mappings.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Leaf(name) | TypeDescriptor::Container(name, _) => Some(name),
            TypeDescriptor::Mapping { .. } => Some("dict"),
            TypeDescriptor::Unresolved(_) | TypeDescriptor::ThirdParty(_) => None,
        }
    }
}

/// Ordered list of structurally distinct descriptors.
///
/// First-seen order is kept. Containers sharing a name merge their
/// children, and mappings merge both sides, so `[(1,), ('a',)]` describes
/// one `tuple[int or str]` rather than two tuples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniqueTypes(Vec<TypeDescriptor>);

impl UniqueTypes {
    pub fn new() -> Self {
        UniqueTypes(vec![])
    }

    pub fn single(descriptor: TypeDescriptor) -> Self {
        UniqueTypes(vec![descriptor])
    }

    pub fn add(&mut self, descriptor: TypeDescriptor) {
        if self.0.contains(&descriptor) {
            return;
        }

        match descriptor {
            TypeDescriptor::Container(name, children) => {
                let existing = self.0.iter_mut().find_map(|kept| match kept {
                    TypeDescriptor::Container(kept_name, kept_children) if *kept_name == name => {
                        Some(kept_children)
                    }
                    _ => None,
                });

                match existing {
                    Some(kept_children) => kept_children.extend(children),
                    None => self.0.push(TypeDescriptor::Container(name, children)),
                }
            }
            TypeDescriptor::Mapping { keys, values } => {
                let existing = self.0.iter_mut().find_map(|kept| match kept {
                    TypeDescriptor::Mapping { keys, values } => Some((keys, values)),
                    _ => None,
                });

                match existing {
                    Some((kept_keys, kept_values)) => {
                        kept_keys.extend(keys);
                        kept_values.extend(values);
                    }
                    None => self.0.push(TypeDescriptor::Mapping { keys, values }),
                }
            }
            other => self.0.push(other),
        }
    }

    pub fn extend(&mut self, other: UniqueTypes) {
        for descriptor in other.0 {
            self.add(descriptor);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, TypeDescriptor> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&TypeDescriptor> {
        self.0.first()
    }

    pub fn into_vec(self) -> Vec<TypeDescriptor> {
        self.0
    }

    /// Renders every alternative, joined with the alternatives text.
    pub fn render(&self, format: &TypeFormat) -> String {
        self.render_with(format, &|text: &str| text.to_string())
    }

    pub fn render_with(&self, format: &TypeFormat, literal: &dyn Fn(&str) -> String) -> String {
        self.0
            .iter()
            .map(|descriptor| descriptor.render_with(format, literal))
            .collect::<Vec<String>>()
            .join(&literal(&format.alternatives_join))
    }
}

impl FromIterator<TypeDescriptor> for UniqueTypes {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        let mut types = UniqueTypes::new();
        for descriptor in iter {
            types.add(descriptor);
        }
        types
    }
}

impl IntoIterator for UniqueTypes {
    type Item = TypeDescriptor;
    type IntoIter = std::vec::IntoIter<TypeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
