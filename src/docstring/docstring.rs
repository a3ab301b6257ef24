use std::rc::Rc;

use tracing::{debug, warn};

use crate::{
    ast::{
        ast::{Expr, ExprWrapper},
        statements::ParameterKind,
    },
    errors::errors::{Error, ErrorImpl},
    resolver::{
        context::ResolutionContext,
        descriptor::{TypeDescriptor, UniqueTypes},
        resolver::{render_types, resolve, resolve_exits},
    },
    scope::scope::{ScopeId, SourceUnit},
    template::{escape, numbering::number, snippet::convert, TemplateOptions},
    Position,
};

const INDENT: &str = "    ";

/// Generated text for one function.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Qualified name of the function
    pub function: String,
    /// Raw template text with unnumbered fields
    pub template: String,
    pub numbered: String,
    pub snippet: String,
}

/// Anonymous field previewing `text`, which must already be escaped.
fn field(text: &str) -> String {
    if text.is_empty() {
        String::from("{!f}")
    } else {
        format!("{{:{}!f}}", text)
    }
}

/// Substitutes the source text for expressions that cannot be typed.
fn or_source_text<T>(
    unit: &SourceUnit,
    expr: &ExprWrapper,
    result: Result<T, Error>,
    fallback: impl FnOnce(String) -> T,
) -> Result<T, Error> {
    match result {
        Ok(value) => Ok(value),
        Err(error) if error.is_recoverable() => {
            warn!(
                error = %error.get_internal_error(),
                expression = unit.text_of(expr.get_span()),
                "falling back to source text"
            );
            Ok(fallback(unit.text_of(expr.get_span()).to_string()))
        }
        Err(error) => Err(error),
    }
}

fn exits_section(
    unit: &SourceUnit,
    scope: ScopeId,
    context: &ResolutionContext,
    title: &str,
    exits: &[&ExprWrapper],
    literal: &dyn Fn(&str) -> String,
) -> Result<Option<String>, Error> {
    if exits.is_empty() {
        return Ok(None);
    }

    let mut types = UniqueTypes::new();
    for exit in exits {
        let resolved = resolve_exits(unit, &[*exit], context, scope);
        types.extend(or_source_text(unit, exit, resolved, |text| {
            UniqueTypes::single(TypeDescriptor::Unresolved(text))
        })?);
    }

    if title == "Returns" && render_types(&types, &context.format) == "None" {
        return Ok(None);
    }

    let preview = types.render_with(&context.format, literal);
    Ok(Some(format!("{}:\n{}{}: {{!f}}.\n", title, INDENT, field(&preview))))
}

/// Google-style docstring template for the function scope `scope`.
///
/// Sections are `Args` (without `self`/`cls`), `Returns`, `Yields` and
/// `Raises`, each type a field previewing the resolved type.
pub fn google_template(unit: &SourceUnit, scope: ScopeId, context: &ResolutionContext) -> Result<String, Error> {
    let scopes = unit.scopes();
    let function_scope = scopes.get(scope);
    let Some(function) = &function_scope.function else {
        return Err(Error::new(
            ErrorImpl::FunctionNotFound { function: scopes.qualified_name(scope) },
            function_scope.span.start.clone(),
        ));
    };
    let outer = function_scope.parent.unwrap_or(scopes.root());

    // Source text may contain braces or opaque markers of its own
    let options = TemplateOptions::for_format(&context.format);
    let literal = |text: &str| escape(text, &options);

    let mut sections = vec![String::from("{!f}.\n")];

    let mut args = String::new();
    for (index, parameter) in function.parameters.iter().enumerate() {
        if index == 0 && (parameter.name == "self" || parameter.name == "cls") {
            continue;
        }

        let name = match parameter.kind {
            ParameterKind::VarPositional => format!("*{}", parameter.name),
            ParameterKind::VarKeyword => format!("**{}", parameter.name),
            ParameterKind::Positional | ParameterKind::KeywordOnly => parameter.name.clone(),
        };

        let type_text = match (&parameter.annotation, &parameter.default) {
            (Some(annotation), _) => literal(unit.text_of(annotation.get_span())),
            (None, Some(default)) => {
                let resolved = resolve(unit, default, context, outer);
                or_source_text(unit, default, resolved, TypeDescriptor::Unresolved)?
                    .render_with(&context.format, &literal)
            }
            (None, None) => String::new(),
        };

        args.push_str(&format!("{}{} ({}): {{!f}}.\n", INDENT, name, field(&type_text)));
    }
    if !args.is_empty() {
        sections.push(format!("Args:\n{}", args));
    }

    let returns: Vec<&ExprWrapper> = function_scope.returns.iter().collect();
    let yields: Vec<&ExprWrapper> = function_scope.yields.iter().collect();
    for (title, exits) in [("Returns", &returns), ("Yields", &yields)] {
        if let Some(section) = exits_section(unit, scope, context, title, exits, &literal)? {
            sections.push(section);
        }
    }

    let mut raised = UniqueTypes::new();
    for raise in &function_scope.raises {
        let resolved = resolve(unit, raise, context, scope);
        raised.add(or_source_text(unit, raise, resolved, TypeDescriptor::Unresolved)?);
    }
    if !raised.is_empty() {
        let mut section = String::from("Raises:\n");
        for descriptor in raised.iter() {
            let preview = descriptor.render_with(&context.format, &literal);
            section.push_str(&format!("{}{}: {{!f}}.\n", INDENT, field(&preview)));
        }
        sections.push(section);
    }

    Ok(sections.join("\n"))
}

/// Template, numbered text and snippet for the function scope `scope`.
pub fn render_function(unit: &SourceUnit, scope: ScopeId, context: &ResolutionContext) -> Result<Rendered, Error> {
    let options = TemplateOptions::for_format(&context.format);

    let template = google_template(unit, scope, context)?;
    let numbered = number(&template, &options)?;
    let snippet = convert(&numbered, &options)?;

    let function = unit.scopes().qualified_name(scope);
    debug!(function = function.as_str(), "rendered docstring");

    Ok(Rendered {
        function,
        template,
        numbered,
        snippet,
    })
}

/// Renders `function`, or every function of the unit in source order when `None`.
pub fn render_unit(
    unit: &SourceUnit,
    function: Option<&str>,
    context: &ResolutionContext,
) -> Result<Vec<Rendered>, Error> {
    let scopes = match function {
        Some(name) => {
            let scope = unit.find_function(name).ok_or_else(|| {
                Error::new(
                    ErrorImpl::FunctionNotFound { function: name.to_string() },
                    Position(0, Rc::new(unit.file_name().to_string())),
                )
            })?;
            vec![scope]
        }
        None => unit.functions(),
    };

    scopes
        .into_iter()
        .map(|scope| render_function(unit, scope, context))
        .collect()
}
