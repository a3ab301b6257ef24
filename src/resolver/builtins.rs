use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Names that never need the third-party markers.
    pub static ref BUILTIN_TYPES: HashSet<&'static str> = HashSet::from([
        "int", "float", "complex", "str", "bytes", "bytearray", "bool", "list", "tuple", "dict",
        "set", "frozenset", "object", "type", "range", "memoryview", "slice", "None", "ellipsis",
        "dict_keys", "dict_values", "dict_items", "Generator", "Any", "Optional", "Union",
        "List", "Dict", "Tuple", "Set", "Iterator", "Iterable", "Callable",
    ]);

    pub static ref BUILTIN_EXCEPTIONS: HashSet<&'static str> = HashSet::from([
        "BaseException", "Exception", "ArithmeticError", "AssertionError", "AttributeError",
        "BufferError", "EOFError", "FileExistsError", "FileNotFoundError", "FloatingPointError",
        "GeneratorExit", "ImportError", "IndexError", "InterruptedError", "IOError",
        "IsADirectoryError", "KeyError", "KeyboardInterrupt", "LookupError", "MemoryError",
        "ModuleNotFoundError", "NameError", "NotADirectoryError", "NotImplementedError",
        "OSError", "OverflowError", "PermissionError", "RecursionError", "ReferenceError",
        "RuntimeError", "StopAsyncIteration", "StopIteration", "SyntaxError", "SystemError",
        "SystemExit", "TimeoutError", "TypeError", "UnboundLocalError", "UnicodeDecodeError",
        "UnicodeEncodeError", "UnicodeError", "ValueError", "ZeroDivisionError",
        "ConnectionError", "BrokenPipeError", "Warning", "UserWarning", "DeprecationWarning",
        "RuntimeWarning",
    ]);

    /// Global callables and the type of their result.
    pub static ref BUILTIN_FUNCTIONS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for constructor in [
            "int", "float", "complex", "str", "bytes", "bytearray", "bool", "list", "tuple",
            "dict", "set", "frozenset", "object", "range", "memoryview", "slice", "type",
        ] {
            map.insert(constructor, constructor);
        }
        map.insert("len", "int");
        map.insert("hash", "int");
        map.insert("id", "int");
        map.insert("ord", "int");
        map.insert("repr", "str");
        map.insert("ascii", "str");
        map.insert("chr", "str");
        map.insert("format", "str");
        map.insert("input", "str");
        map.insert("hex", "str");
        map.insert("oct", "str");
        map.insert("bin", "str");
        map.insert("isinstance", "bool");
        map.insert("issubclass", "bool");
        map.insert("callable", "bool");
        map.insert("hasattr", "bool");
        map.insert("any", "bool");
        map.insert("all", "bool");
        map.insert("sorted", "list");
        map.insert("dir", "list");
        map.insert("vars", "dict");
        map.insert("globals", "dict");
        map.insert("locals", "dict");
        map.insert("print", "None");
        map
    };

    static ref IDENTIFIER: Regex = Regex::new("[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_TYPES.contains(name) || BUILTIN_EXCEPTIONS.contains(name)
}

/// Splits `label` at each `join` that is not inside brackets.
///
/// `Dict[str, int or None] or None` splits into `Dict[str, int or None]`
/// and `None`.
pub fn split_alternatives<'l>(label: &'l str, join: &str) -> Vec<&'l str> {
    if join.is_empty() {
        return vec![label];
    }

    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    let mut offset = 0;
    while offset < label.len() {
        let rest = &label[offset..];
        if depth == 0 && rest.starts_with(join) {
            parts.push(&label[start..offset]);
            offset += join.len();
            start = offset;
            continue;
        }

        let Some(character) = rest.chars().next() else {
            break;
        };
        match character {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        offset += character.len_utf8();
    }
    parts.push(&label[start..]);

    parts
}

/// Whether every identifier in a rendered label is a builtin type or exception.
///
/// `alternatives_join` separates alternatives, at any bracket depth, and is
/// not itself checked.
pub fn is_builtin_label(label: &str, alternatives_join: &str) -> bool {
    split_alternatives(label, alternatives_join).into_iter().all(|part| {
        let part = if alternatives_join.is_empty() {
            part.to_string()
        } else {
            part.replace(alternatives_join, ",")
        };

        let mut identifiers = IDENTIFIER.find_iter(&part).peekable();
        identifiers.peek().is_some() && identifiers.all(|identifier| is_builtin_name(identifier.as_str()))
    })
}
