use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Expr, ExprType, ExprWrapper},
        expressions::{
            BinaryExpr, CallExpr, ComprehensionExpr, ComprehensionKind, Constant, ConstantExpr,
            DictExpr, MemberExpr, NumberExpr, NumberKind, PrefixExpr, SequenceExpr, StringExpr,
            StringKind, SubscriptExpr, SymbolExpr, TernaryExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    scope::scope::{ScopeId, SourceUnit},
    Position,
};

use super::{
    builtins::{is_builtin_label, split_alternatives},
    context::{ResolutionContext, TypeFormat},
    descriptor::{TypeDescriptor, UniqueTypes},
    strategies::{standard_strategies, ReferenceStrategy, Resolution},
};

/// Explicit bound on nested local-definition and assignment lookups.
pub const MAX_DEPTH: usize = 32;

/// A `(scope, expression range)` pair currently being resolved.
pub type VisitKey = (ScopeId, (u32, u32));

/// A call, attribute access or name being resolved.
pub struct Reference<'e> {
    /// The whole reference expression
    pub expr: &'e ExprWrapper,
    /// Set when the reference is a call
    pub call: Option<&'e CallExpr>,
    /// The callee of a call, otherwise the expression itself
    pub target: &'e ExprWrapper,
    /// Scope the reference appears in
    pub scope: ScopeId,
}

impl<'e> Reference<'e> {
    pub fn new(expr: &'e ExprWrapper, scope: ScopeId) -> Self {
        let call = expr.downcast::<CallExpr>();
        Reference {
            expr,
            call,
            target: call.map(|call| &call.callee).unwrap_or(expr),
            scope,
        }
    }

    pub fn offset(&self) -> u32 {
        self.expr.get_span().start.0
    }

    /// Identifier fragments of the target, left to right, passing through calls.
    ///
    /// `a.b().c` gives `["a", "b", "c"]`; a chain rooted in anything other
    /// than a name gives `None`.
    pub fn fragments(&self) -> Option<Vec<String>> {
        chain_fragments(self.target)
    }
}

fn chain_fragments(expr: &ExprWrapper) -> Option<Vec<String>> {
    match expr.get_expr_type() {
        ExprType::Symbol => expr
            .downcast::<SymbolExpr>()
            .map(|symbol| vec![symbol.value.clone()]),
        ExprType::Member => {
            let member = expr.downcast::<MemberExpr>()?;
            let mut fragments = chain_fragments(&member.object)?;
            fragments.push(member.property.clone());
            Some(fragments)
        }
        ExprType::Call => chain_fragments(&expr.downcast::<CallExpr>()?.callee),
        _ => None,
    }
}

/// Resolves expressions of one source unit; lives for one request.
pub struct TypeResolver<'a> {
    unit: &'a SourceUnit,
    context: &'a ResolutionContext,
    visited: HashSet<VisitKey>,
    depth: usize,
    /// Exits of local functions resolved without hitting a cycle or the depth limit
    memo: HashMap<ScopeId, UniqueTypes>,
    /// Cycle and depth-limit skips so far
    skips: usize,
    strategies: Rc<Vec<Box<dyn ReferenceStrategy>>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(unit: &'a SourceUnit, context: &'a ResolutionContext) -> Self {
        TypeResolver::with_strategies(unit, context, standard_strategies())
    }

    pub fn with_strategies(
        unit: &'a SourceUnit,
        context: &'a ResolutionContext,
        strategies: Vec<Box<dyn ReferenceStrategy>>,
    ) -> Self {
        TypeResolver {
            unit,
            context,
            visited: HashSet::new(),
            depth: 0,
            memo: HashMap::new(),
            skips: 0,
            strategies: Rc::new(strategies),
        }
    }

    pub fn unit(&self) -> &'a SourceUnit {
        self.unit
    }

    pub fn context(&self) -> &'a ResolutionContext {
        self.context
    }

    pub fn format(&self) -> &'a TypeFormat {
        &self.context.format
    }

    pub fn text_of(&self, expr: &ExprWrapper) -> String {
        self.unit.text_of(expr.get_span()).to_string()
    }

    /// Whether `key` is being resolved further up; a hit counts as a skip.
    pub fn is_visited(&mut self, key: &VisitKey) -> bool {
        let visited = self.visited.contains(key);
        if visited {
            self.skips += 1;
        }
        visited
    }

    /// Exits of the local function `function`, computed by `f` at most once per request.
    ///
    /// A result is only kept when nothing was skipped while computing it,
    /// since a skip makes it depend on the lookups in progress.
    pub fn memoized(
        &mut self,
        function: ScopeId,
        f: impl FnOnce(&mut Self) -> Result<UniqueTypes, Error>,
    ) -> Result<UniqueTypes, Error> {
        if let Some(types) = self.memo.get(&function) {
            return Ok(types.clone());
        }

        let skips = self.skips;
        let types = f(self)?;
        if self.skips == skips {
            self.memo.insert(function, types.clone());
        }

        Ok(types)
    }

    /// Marks `keys` as being resolved and runs `f` one level deeper.
    ///
    /// The keys are released again whatever `f` returns.
    pub fn visiting<T>(
        &mut self,
        keys: &[VisitKey],
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::new(
                ErrorImpl::RecursionGuardTripped { depth: self.depth },
                Position(0, Rc::new(self.unit.file_name().to_string())),
            ));
        }

        let inserted: Vec<VisitKey> = keys.iter().copied().filter(|key| self.visited.insert(*key)).collect();
        self.depth += 1;

        let result = f(self);

        self.depth -= 1;
        for key in inserted {
            self.visited.remove(&key);
        }

        result
    }

    /// Resolves an expression to its alternatives.
    pub fn resolve_alternatives(&mut self, expr: &ExprWrapper, scope: ScopeId) -> Result<UniqueTypes, Error> {
        match expr.get_expr_type() {
            ExprType::Number => {
                let kind = expr.downcast::<NumberExpr>().map(|number| number.kind);
                let name = match kind {
                    Some(NumberKind::Float) => "float",
                    Some(NumberKind::Complex) => "complex",
                    _ => "int",
                };
                Ok(UniqueTypes::single(TypeDescriptor::leaf(name)))
            }
            ExprType::String => {
                let kind = expr.downcast::<StringExpr>().map(|string| string.kind);
                let name = if kind == Some(StringKind::Bytes) { "bytes" } else { "str" };
                Ok(UniqueTypes::single(TypeDescriptor::leaf(name)))
            }
            ExprType::Constant => {
                let constant = expr.downcast::<ConstantExpr>().map(|constant| constant.constant);
                let name = match constant {
                    Some(Constant::True) | Some(Constant::False) => "bool",
                    Some(Constant::Ellipsis) => "ellipsis",
                    _ => "None",
                };
                Ok(UniqueTypes::single(TypeDescriptor::leaf(name)))
            }
            ExprType::Symbol | ExprType::Member | ExprType::Call => self.resolve_reference(expr, scope),
            ExprType::Sequence => {
                let Some(sequence) = expr.downcast::<SequenceExpr>() else {
                    return Ok(self.unresolved(expr));
                };

                let mut children = UniqueTypes::new();
                for element in &sequence.elements {
                    // Unpacked elements contribute nothing we can name
                    if element.get_expr_type() == ExprType::Starred {
                        continue;
                    }
                    children.extend(self.resolve_alternatives(element, scope)?);
                }

                Ok(UniqueTypes::single(TypeDescriptor::Container(
                    sequence.kind.type_name().to_string(),
                    children,
                )))
            }
            ExprType::Dict => {
                let Some(dict) = expr.downcast::<DictExpr>() else {
                    return Ok(self.unresolved(expr));
                };

                let mut keys = UniqueTypes::new();
                let mut values = UniqueTypes::new();
                for entry in &dict.entries {
                    let Some(key) = &entry.key else {
                        continue;
                    };
                    keys.extend(self.resolve_alternatives(key, scope)?);
                    values.extend(self.resolve_alternatives(&entry.value, scope)?);
                }

                Ok(UniqueTypes::single(TypeDescriptor::Mapping { keys, values }))
            }
            ExprType::Comprehension => {
                let Some(comprehension) = expr.downcast::<ComprehensionExpr>() else {
                    return Ok(self.unresolved(expr));
                };

                let descriptor = match comprehension.kind {
                    ComprehensionKind::List => TypeDescriptor::Container(
                        String::from("list"),
                        self.resolve_alternatives(&comprehension.element, scope)?,
                    ),
                    ComprehensionKind::Dict => TypeDescriptor::leaf("dict"),
                    ComprehensionKind::Set => TypeDescriptor::leaf("set"),
                    ComprehensionKind::Generator => TypeDescriptor::leaf("Generator"),
                };

                Ok(UniqueTypes::single(descriptor))
            }
            ExprType::Binary => self.resolve_binary(expr, scope),
            ExprType::Prefix => {
                let Some(prefix) = expr.downcast::<PrefixExpr>() else {
                    return Ok(self.unresolved(expr));
                };

                match prefix.operator.kind {
                    TokenKind::Not => Ok(UniqueTypes::single(TypeDescriptor::leaf("bool"))),
                    TokenKind::Await => Ok(self.unresolved(expr)),
                    _ => self.resolve_alternatives(&prefix.right_expr, scope),
                }
            }
            ExprType::Ternary => {
                let Some(ternary) = expr.downcast::<TernaryExpr>() else {
                    return Ok(self.unresolved(expr));
                };

                let mut alternatives = self.resolve_alternatives(&ternary.body, scope)?;
                alternatives.extend(self.resolve_alternatives(&ternary.orelse, scope)?);
                Ok(alternatives)
            }
            ExprType::Subscript => self.resolve_subscript(expr, scope),
            ExprType::Lambda => Err(self.unsupported(expr, "lambda")),
            ExprType::Starred => Err(self.unsupported(expr, "starred")),
            ExprType::Slice => Err(self.unsupported(expr, "slice")),
            ExprType::Yield => Err(self.unsupported(expr, "yield")),
        }
    }

    fn resolve_binary(&mut self, expr: &ExprWrapper, scope: ScopeId) -> Result<UniqueTypes, Error> {
        let Some(binary) = expr.downcast::<BinaryExpr>() else {
            return Ok(self.unresolved(expr));
        };

        if binary.operator.kind.is_relational_or_logical() {
            return Ok(UniqueTypes::single(TypeDescriptor::leaf("bool")));
        }

        let left = self.resolve_alternatives(&binary.left, scope)?;

        // `"%s" % value` formats regardless of the right operand
        if binary.operator.kind == TokenKind::Percent && left == UniqueTypes::single(TypeDescriptor::leaf("str")) {
            return Ok(left);
        }

        let right = self.resolve_alternatives(&binary.right, scope)?;

        let widened = match (left.first(), right.first(), left.len(), right.len()) {
            (Some(TypeDescriptor::Leaf(l)), Some(TypeDescriptor::Leaf(r)), 1, 1) => {
                match (numeric_rank(l), numeric_rank(r)) {
                    (Some(lr), Some(rr)) => Some(if lr >= rr { l.clone() } else { r.clone() }),
                    _ => None,
                }
            }
            _ => None,
        };

        match widened {
            // `/` is true division below complex
            Some(name) if binary.operator.kind == TokenKind::Slash && name != "complex" => {
                Ok(UniqueTypes::single(TypeDescriptor::leaf("float")))
            }
            Some(name) => Ok(UniqueTypes::single(TypeDescriptor::Leaf(name))),
            None if left == right => Ok(left),
            None => Ok(self.unresolved(expr)),
        }
    }

    fn resolve_subscript(&mut self, expr: &ExprWrapper, scope: ScopeId) -> Result<UniqueTypes, Error> {
        let Some(subscript) = expr.downcast::<SubscriptExpr>() else {
            return Ok(self.unresolved(expr));
        };

        let object = self.resolve_alternatives(&subscript.object, scope)?;
        let is_slice = subscript.index.get_expr_type() == ExprType::Slice;

        if object.len() != 1 {
            return Ok(self.unresolved(expr));
        }

        let resolved = match object.first() {
            Some(TypeDescriptor::Container(_, _)) if is_slice => Some(object.clone()),
            Some(TypeDescriptor::Container(_, children)) if children.len() == 1 => Some(children.clone()),
            Some(TypeDescriptor::Mapping { values, .. }) if values.len() == 1 && !is_slice => Some(values.clone()),
            Some(TypeDescriptor::Leaf(name)) if name == "str" || name == "bytes" => Some(object.clone()),
            _ => None,
        };

        Ok(resolved.unwrap_or_else(|| self.unresolved(expr)))
    }

    /// Runs the strategy chain for a call, attribute access or name.
    fn resolve_reference(&mut self, expr: &ExprWrapper, scope: ScopeId) -> Result<UniqueTypes, Error> {
        let reference = Reference::new(expr, scope);
        let strategies = Rc::clone(&self.strategies);

        for strategy in strategies.iter() {
            let resolution = match strategy.try_resolve(self, &reference) {
                Ok(resolution) => resolution,
                Err(error) if matches!(error.get_internal_error(), ErrorImpl::RecursionGuardTripped { .. }) => {
                    trace!(strategy = strategy.name(), "recursion guard tripped, skipping");
                    self.skips += 1;
                    continue;
                }
                Err(error) => return Err(error),
            };

            if let Some(resolution) = resolution {
                debug!(
                    strategy = strategy.name(),
                    reference = self.unit.text_of(expr.get_span()),
                    "resolved reference"
                );
                return Ok(self.classify(resolution));
            }
        }

        Ok(self.unresolved(expr))
    }

    /// Labels made only of builtin names become leaves; anything else is third-party.
    fn classify(&self, resolution: Resolution) -> UniqueTypes {
        match resolution {
            Resolution::Types(types) => types,
            Resolution::Label(label) => {
                let format = self.format();
                if is_builtin_label(&label, &format.alternatives_join) {
                    split_alternatives(&label, &format.alternatives_join)
                        .into_iter()
                        .map(TypeDescriptor::leaf)
                        .collect()
                } else {
                    UniqueTypes::single(TypeDescriptor::ThirdParty(format!(
                        "{}{}{}",
                        format.third_party_prefix, label, format.third_party_suffix
                    )))
                }
            }
        }
    }

    fn unresolved(&self, expr: &ExprWrapper) -> UniqueTypes {
        UniqueTypes::single(TypeDescriptor::Unresolved(self.text_of(expr)))
    }

    fn unsupported(&self, expr: &ExprWrapper, construct: &str) -> Error {
        Error::new(
            ErrorImpl::UnsupportedConstruct { construct: construct.to_string() },
            expr.get_span().start.clone(),
        )
    }
}

fn numeric_rank(name: &str) -> Option<u8> {
    match name {
        "bool" => Some(0),
        "int" => Some(1),
        "float" => Some(2),
        "complex" => Some(3),
        _ => None,
    }
}

/// Resolves one expression appearing in `scope`.
///
/// Several alternatives collapse into one leaf holding their joined rendering.
pub fn resolve(
    unit: &SourceUnit,
    node: &ExprWrapper,
    context: &ResolutionContext,
    scope: ScopeId,
) -> Result<TypeDescriptor, Error> {
    let mut resolver = TypeResolver::new(unit, context);
    let alternatives = resolver.resolve_alternatives(node, scope)?;

    let mut descriptors = alternatives.clone().into_vec();
    Ok(match descriptors.len() {
        0 => TypeDescriptor::Unresolved(unit.text_of(node.get_span()).to_string()),
        1 => descriptors.remove(0),
        _ => TypeDescriptor::Leaf(alternatives.render(&context.format)),
    })
}

/// Resolves the exits of a function and unifies them, first appearance first.
///
/// The exits are marked as visited for the whole request, so an exit that
/// calls its own function degrades to the function's name.
pub fn resolve_exits(
    unit: &SourceUnit,
    exits: &[&ExprWrapper],
    context: &ResolutionContext,
    scope: ScopeId,
) -> Result<UniqueTypes, Error> {
    let mut resolver = TypeResolver::new(unit, context);
    let keys: Vec<VisitKey> = exits.iter().map(|exit| (scope, exit.range())).collect();

    resolver.visiting(&keys, |resolver| {
        let mut unified = UniqueTypes::new();
        for exit in exits {
            unified.extend(resolver.resolve_alternatives(exit, scope)?);
        }
        Ok(unified)
    })
}

pub fn render_types(types: &UniqueTypes, format: &TypeFormat) -> String {
    types.render(format)
}
