#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod docstring;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod resolver;
pub mod scope;
pub mod template;

extern crate regex;

/// Byte offset into a named source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Byte range of the span, suitable for slicing the source.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start.0 as usize..self.end.0 as usize
    }
}

/// Returns `(line number, line text, column)` for a byte offset in `source`.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    // An error at end of input points just past the last character
    if pos >= source.len() {
        let line_number = source.matches('\n').count() + 1;
        let line = source.rsplit('\n').next().unwrap_or("").to_string();
        let column = line.len();
        return Some((line_number, line, column));
    }

    let mut start = 0;

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((index + 1, line.to_string(), pos - start));
        }

        start = end;
    }

    None
}

/// Renders an error with the offending source line underlined.
pub fn display_error(error: &Error, file: &str, source: &str) -> String {
    /*
        Error: name (tip)
        -> main.py
           |
        20 | x = $
           | ----^
    */

    let mut output = String::new();

    if let ErrorTip::None = error.get_tip() {
        output.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        output.push_str(&format!("Error: {} ({})\n", error.get_error_name(), error.get_tip()));
    }
    output.push_str(&format!("-> {}\n", file));

    let Some((line, line_text, line_pos)) = get_line_at_position(source, error.get_position().0) else {
        return output;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    output.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    output.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    output.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    output
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string.len() - string.trim_start_matches([' ', '\t']).len();
    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    #[test]
    fn test_get_line_at_position() {
        let source = "Hello, world!\nfoo\n\n    Testing { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(source, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(source, 31).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "    Testing { }\n");
        assert_eq!(line_pos, 12);
    }

    #[test]
    fn test_get_line_past_end() {
        let (line_number, line, line_pos) = super::get_line_at_position("a = 1\nb = (", 11).unwrap();
        assert_eq!(line_number, 2);
        assert_eq!(line, "b = (");
        assert_eq!(line_pos, 5);
    }

    #[test]
    fn test_display_error() {
        let source = "def f():\n    x = $\n";
        let error = Error::new(
            ErrorImpl::UnrecognisedToken { token: String::from("$") },
            Position(17, Rc::new(String::from("main.py"))),
        );

        let rendered = super::display_error(&error, "main.py", source);
        assert_eq!(
            rendered,
            "Error: UnrecognisedToken\n-> main.py\n  |\n2 | x = $\n  | ----^\n"
        );
    }
}
