use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, ExprType, ExprWrapper},
        expressions::{MemberExpr, SequenceExpr, SequenceKind, StarredExpr, SymbolExpr},
        statements::ParameterKind,
    },
    errors::errors::Error,
    scope::scope::{ScopeId, ScopeKind, SourceUnit},
};

use super::{
    builtins::{BUILTIN_EXCEPTIONS, BUILTIN_FUNCTIONS},
    context::Override,
    descriptor::{TypeDescriptor, UniqueTypes},
    resolver::{Reference, TypeResolver, VisitKey},
};

/// What a strategy found for a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Final descriptors
    Types(UniqueTypes),
    /// A textual label, wrapped as third-party unless it only names builtins
    Label(String),
}

/// One stage of the reference fallback chain.
pub trait ReferenceStrategy {
    fn name(&self) -> &'static str;

    /// `Ok(None)` hands the reference to the next strategy.
    fn try_resolve(&self, resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error>;
}

/// The chain in the order it is tried.
pub fn standard_strategies() -> Vec<Box<dyn ReferenceStrategy>> {
    vec![
        Box::new(BuiltinShortcut),
        Box::new(OverrideLookup),
        Box::new(LocalDefinition),
        Box::new(ImportPath),
        Box::new(AttributePath),
        Box::new(AssignmentSearch),
    ]
}

fn leaf(name: &str) -> Resolution {
    Resolution::Types(UniqueTypes::single(TypeDescriptor::leaf(name)))
}

/// Rewrites the head of `fragments` through the last import binding it
/// before `offset`.
pub fn import_path(unit: &SourceUnit, fragments: &[String], offset: u32) -> Option<String> {
    let (head, rest) = fragments.split_first()?;

    let binding = unit
        .imports()
        .iter()
        .filter(|binding| binding.position < offset && binding.name == *head)
        .last()?;

    let mut path = binding.path.clone();
    for fragment in rest {
        path.push('.');
        path.push_str(fragment);
    }
    Some(path)
}

/// Calls to builtin constructors, exceptions and well-known global functions.
pub struct BuiltinShortcut;

impl ReferenceStrategy for BuiltinShortcut {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn try_resolve(&self, _resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        if reference.call.is_none() {
            return Ok(None);
        }
        let Some(symbol) = reference.target.downcast::<SymbolExpr>() else {
            return Ok(None);
        };

        if let Some(result) = BUILTIN_FUNCTIONS.get(symbol.value.as_str()) {
            return Ok(Some(leaf(result)));
        }
        if BUILTIN_EXCEPTIONS.contains(symbol.value.as_str()) {
            return Ok(Some(leaf(&symbol.value)));
        }

        Ok(None)
    }
}

/// Caller-registered labels, by written path, import path or literal receiver type.
pub struct OverrideLookup;

fn is_literal(expr: &ExprWrapper) -> bool {
    matches!(
        expr.get_expr_type(),
        ExprType::String | ExprType::Number | ExprType::Constant | ExprType::Sequence | ExprType::Dict | ExprType::Comprehension
    )
}

impl ReferenceStrategy for OverrideLookup {
    fn name(&self) -> &'static str {
        "override"
    }

    fn try_resolve(&self, resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        let overrides = &resolver.context().overrides;
        if overrides.is_empty() {
            return Ok(None);
        }

        let mut keys = vec![];
        if let Some(fragments) = reference.fragments() {
            keys.push(fragments.join("."));
            if let Some(path) = import_path(resolver.unit(), &fragments, reference.offset()) {
                keys.push(path);
            }
        }

        // `", ".join(parts)` is looked up as `str.join`
        if let Some(member) = reference.target.downcast::<MemberExpr>() {
            if is_literal(&member.object) {
                let receiver = resolver.resolve_alternatives(&member.object, reference.scope)?;
                if let Some(type_name) = receiver.first().and_then(|descriptor| descriptor.type_name()) {
                    keys.push(format!("{}.{}", type_name, member.property));
                }
            }
        }

        for key in keys {
            match overrides.get(&key) {
                Some(Override::Label(label)) => return Ok(Some(Resolution::Label(label.clone()))),
                Some(Override::Resolver(resolve)) => {
                    if let Some(call) = reference.call {
                        return Ok(Some(Resolution::Label(resolve(call, &call.arguments))));
                    }
                }
                None => {}
            }
        }

        Ok(None)
    }
}

/// Calls to functions defined in the same unit, typed through their exits.
pub struct LocalDefinition;

impl LocalDefinition {
    fn find_function(unit: &SourceUnit, reference: &Reference) -> Option<ScopeId> {
        let scopes = unit.scopes();

        if let Some(symbol) = reference.target.downcast::<SymbolExpr>() {
            // Class bodies are not visible from the methods inside them
            return scopes
                .ancestors(reference.scope)
                .into_iter()
                .filter(|&scope| scopes.get(scope).kind != ScopeKind::Class)
                .find_map(|scope| scopes.child_named(scope, &symbol.value, ScopeKind::Function))
                .or_else(|| scopes.functions_named(&symbol.value).first().copied());
        }

        let member = reference.target.downcast::<MemberExpr>()?;
        let receiver = member.object.downcast::<SymbolExpr>()?;
        if receiver.value != "self" && receiver.value != "cls" {
            return None;
        }

        let class = scopes.enclosing_class(reference.scope)?;
        scopes.child_named(class, &member.property, ScopeKind::Function)
    }
}

impl ReferenceStrategy for LocalDefinition {
    fn name(&self) -> &'static str {
        "local-definition"
    }

    fn try_resolve(&self, resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        if !resolver.context().follow_local_definitions || reference.call.is_none() {
            return Ok(None);
        }

        let unit = resolver.unit();
        let Some(function) = LocalDefinition::find_function(unit, reference) else {
            return Ok(None);
        };
        let scope = unit.scopes().get(function);

        if let Some(annotation) = scope.function.as_ref().and_then(|decl| decl.return_annotation.as_ref()) {
            return Ok(Some(Resolution::Label(unit.text_of(annotation.get_span()).to_string())));
        }

        let exits = scope.exits();
        if exits.is_empty() {
            return Ok(Some(leaf("None")));
        }

        let keys: Vec<VisitKey> = exits.iter().map(|exit| (function, exit.range())).collect();
        if keys.iter().any(|key| resolver.is_visited(key)) {
            trace!(function = scope.name.as_str(), "function already being resolved");
            return Ok(None);
        }

        let types = resolver.memoized(function, |resolver| {
            resolver.visiting(&keys, |resolver| {
                let mut unified = UniqueTypes::new();
                for exit in &exits {
                    match resolver.resolve_alternatives(exit, function) {
                        Ok(types) => unified.extend(types),
                        Err(error) if error.is_recoverable() => {
                            unified.add(TypeDescriptor::Unresolved(resolver.text_of(exit)))
                        }
                        Err(error) => return Err(error),
                    }
                }
                Ok(unified)
            })
        })?;

        Ok(Some(Resolution::Types(types)))
    }
}

/// Rebuilds the dotted path of an imported name.
pub struct ImportPath;

impl ReferenceStrategy for ImportPath {
    fn name(&self) -> &'static str {
        "import-path"
    }

    fn try_resolve(&self, resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        let Some(fragments) = reference.fragments() else {
            return Ok(None);
        };

        Ok(import_path(resolver.unit(), &fragments, reference.offset()).map(Resolution::Label))
    }
}

/// Best-effort textual path of an attribute or call chain.
pub struct AttributePath;

impl ReferenceStrategy for AttributePath {
    fn name(&self) -> &'static str {
        "attribute-path"
    }

    fn try_resolve(&self, _resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        if reference.call.is_none() && reference.target.get_expr_type() != ExprType::Member {
            return Ok(None);
        }

        Ok(reference.fragments().map(|fragments| Resolution::Label(fragments.join("."))))
    }
}

/// Finds what a bare name was last assigned, falling back to the name itself.
pub struct AssignmentSearch;

/// How a name appears in an assignment target.
enum Bound<'e> {
    /// Bound to this value expression
    Value(&'e ExprWrapper),
    /// Bound, but the value cannot be paired with the name
    Unpaired,
}

fn match_target<'e>(target: &'e ExprWrapper, value: Option<&'e ExprWrapper>, name: &str) -> Option<Bound<'e>> {
    match target.get_expr_type() {
        ExprType::Symbol => {
            let symbol = target.downcast::<SymbolExpr>()?;
            if symbol.value != name {
                return None;
            }
            Some(value.map(Bound::Value).unwrap_or(Bound::Unpaired))
        }
        ExprType::Sequence => {
            let targets = target.downcast::<SequenceExpr>()?;
            if targets.kind == SequenceKind::Set {
                return None;
            }

            let values = value
                .and_then(|value| value.downcast::<SequenceExpr>())
                .filter(|values| {
                    values.kind != SequenceKind::Set
                        && values.elements.len() == targets.elements.len()
                        && values.elements.iter().all(|element| element.get_expr_type() != ExprType::Starred)
                });

            match values {
                Some(values) => targets
                    .elements
                    .iter()
                    .zip(values.elements.iter())
                    .find_map(|(target, value)| match_target(target, Some(value), name)),
                None => targets
                    .elements
                    .iter()
                    .find_map(|target| match_target(target, None, name)),
            }
        }
        ExprType::Starred => {
            let starred = target.downcast::<StarredExpr>()?;
            match_target(&starred.value, None, name).map(|_| Bound::Unpaired)
        }
        _ => None,
    }
}

impl AssignmentSearch {
    /// Searches one scope, newest assignment first.
    fn search_scope(
        resolver: &mut TypeResolver,
        scope_id: ScopeId,
        name: &str,
    ) -> Result<Option<Resolution>, Error> {
        let unit = resolver.unit();
        let scope = unit.scopes().get(scope_id);

        for assignment in scope.assignments.iter().rev() {
            let Some(bound) = assignment
                .targets
                .iter()
                .find_map(|target| match_target(target, assignment.value.as_ref(), name))
            else {
                continue;
            };

            if let Some(annotation) = &assignment.annotation {
                return Ok(Some(Resolution::Label(unit.text_of(annotation.get_span()).to_string())));
            }

            let value = match bound {
                Bound::Value(value) => value,
                Bound::Unpaired => return Ok(Some(Resolution::Label(name.to_string()))),
            };

            // `x = x + 1` must not resolve through itself
            let key = (scope_id, value.range());
            if resolver.is_visited(&key) {
                continue;
            }

            let types = resolver.visiting(&[key], |resolver| resolver.resolve_alternatives(value, scope_id))?;
            return Ok(Some(Resolution::Types(types)));
        }

        let Some(parameter) = scope
            .function
            .as_ref()
            .and_then(|decl| decl.parameters.iter().find(|parameter| parameter.name == name))
        else {
            return Ok(None);
        };

        if let Some(annotation) = &parameter.annotation {
            return Ok(Some(Resolution::Label(unit.text_of(annotation.get_span()).to_string())));
        }

        if let Some(default) = &parameter.default {
            let outer = scope.parent.unwrap_or(scope_id);
            let key = (outer, default.range());
            if !resolver.is_visited(&key) {
                let types = resolver.visiting(&[key], |resolver| resolver.resolve_alternatives(default, outer))?;
                return Ok(Some(Resolution::Types(types)));
            }
        }

        Ok(Some(match parameter.kind {
            ParameterKind::VarPositional => leaf("tuple"),
            ParameterKind::VarKeyword => leaf("dict"),
            ParameterKind::Positional | ParameterKind::KeywordOnly => Resolution::Label(name.to_string()),
        }))
    }
}

impl ReferenceStrategy for AssignmentSearch {
    fn name(&self) -> &'static str {
        "assignment"
    }

    fn try_resolve(&self, resolver: &mut TypeResolver, reference: &Reference) -> Result<Option<Resolution>, Error> {
        if reference.call.is_some() {
            return Ok(None);
        }
        let Some(symbol) = reference.expr.downcast::<SymbolExpr>() else {
            return Ok(None);
        };

        let scopes = resolver.unit().scopes();
        let chain: Vec<ScopeId> = scopes
            .ancestors(reference.scope)
            .into_iter()
            .enumerate()
            .filter(|(index, scope)| *index == 0 || scopes.get(*scope).kind != ScopeKind::Class)
            .map(|(_, scope)| scope)
            .collect();

        for scope in chain {
            if let Some(resolution) = AssignmentSearch::search_scope(resolver, scope, &symbol.value)? {
                return Ok(Some(resolution));
            }
        }

        Ok(Some(Resolution::Label(symbol.value.clone())))
    }
}
