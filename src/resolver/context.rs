use std::{collections::HashMap, fmt::Debug};

use crate::ast::{ast::ExprWrapper, expressions::CallExpr};

/// Strings used when rendering descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFormat {
    pub wrap_prefix: String,
    pub wrap_suffix: String,
    pub alternatives_join: String,
    pub mapping_join: String,
    pub third_party_prefix: String,
    pub third_party_suffix: String,
}

impl Default for TypeFormat {
    fn default() -> Self {
        TypeFormat {
            wrap_prefix: String::from("["),
            wrap_suffix: String::from("]"),
            alternatives_join: String::from(" or "),
            mapping_join: String::from(", "),
            third_party_prefix: String::from("<"),
            third_party_suffix: String::from(">"),
        }
    }
}

pub type ResolverFn = Box<dyn Fn(&CallExpr, &[ExprWrapper]) -> String>;

/// What an override registry entry reports for a qualified path.
pub enum Override {
    Label(String),
    /// Computes the label per call site from the call and its positional arguments
    Resolver(ResolverFn),
}

impl Debug for Override {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Override::Label(label) => write!(f, "Label({:?})", label),
            Override::Resolver(_) => write!(f, "Resolver(..)"),
        }
    }
}

/// Qualified path to result label, consulted before any other lookup
/// except the builtin table.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    entries: HashMap<String, Override>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        OverrideRegistry { entries: HashMap::new() }
    }

    /// A registry pre-filled with common standard library functions.
    pub fn standard() -> Self {
        let mut registry = OverrideRegistry::new();

        // One positional argument may give `None`, a default never does
        let getenv = |_: &CallExpr, arguments: &[ExprWrapper]| {
            if arguments.len() > 1 {
                String::from("str")
            } else {
                String::from("str or None")
            }
        };
        registry.register_resolver("os.getenv", getenv);
        registry.register_resolver("os.environ.get", getenv);

        for (path, label) in [
            ("os.getcwd", "str"),
            ("os.listdir", "list[str]"),
            ("os.path.join", "str"),
            ("os.path.abspath", "str"),
            ("os.path.basename", "str"),
            ("os.path.dirname", "str"),
            ("os.path.exists", "bool"),
            ("os.path.isfile", "bool"),
            ("os.path.isdir", "bool"),
            ("json.dumps", "str"),
            ("time.time", "float"),
            ("str.join", "str"),
            ("str.format", "str"),
            ("str.strip", "str"),
            ("str.lower", "str"),
            ("str.upper", "str"),
            ("str.replace", "str"),
            ("str.encode", "bytes"),
            ("str.split", "list[str]"),
            ("str.startswith", "bool"),
            ("str.endswith", "bool"),
            ("bytes.decode", "str"),
            ("dict.keys", "dict_keys"),
            ("dict.values", "dict_values"),
            ("dict.items", "dict_items"),
        ] {
            registry.register_label(path, label);
        }

        registry
    }

    pub fn register(&mut self, path: impl Into<String>, entry: Override) {
        self.entries.insert(path.into(), entry);
    }

    pub fn register_label(&mut self, path: impl Into<String>, label: impl Into<String>) {
        self.register(path, Override::Label(label.into()));
    }

    pub fn register_resolver<F>(&mut self, path: impl Into<String>, resolver: F)
    where
        F: Fn(&CallExpr, &[ExprWrapper]) -> String + 'static,
    {
        self.register(path, Override::Resolver(Box::new(resolver)));
    }

    pub fn deregister_all(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, path: &str) -> Option<&Override> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-owned settings for one or more resolutions.
#[derive(Debug)]
pub struct ResolutionContext {
    pub overrides: OverrideRegistry,
    /// Resolve calls to functions of the same unit through their exits
    pub follow_local_definitions: bool,
    pub format: TypeFormat,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        ResolutionContext {
            overrides: OverrideRegistry::standard(),
            follow_local_definitions: true,
            format: TypeFormat::default(),
        }
    }
}
