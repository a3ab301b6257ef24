use std::{fs::read_to_string, path::Path, rc::Rc};

use tracing::debug;

use crate::{
    ast::{
        ast::{ExprWrapper, Stmt, StmtType, StmtWrapper},
        expressions::{sub_expressions, Constant, ConstantExpr, SequenceExpr, SequenceKind, YieldExpr},
        statements::{
            nested_bodies, AssignStmt, AugAssignStmt, BlockStmt, ClassDeclStmt, ExpressionStmt,
            FnDeclStmt, FromImportStmt, ImportStmt, RaiseStmt, ReturnStmt, TryStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    Position, Span,
};

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// One assignment statement as seen by the scope that owns it.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub targets: Vec<ExprWrapper>,
    pub value: Option<ExprWrapper>,
    pub annotation: Option<ExprWrapper>,
}

/// A module, class or function scope with everything collected for it.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub span: Span,
    /// Declaration of a function scope
    pub function: Option<FnDeclStmt>,
    /// Returned expressions; a bare `return` is a synthetic `None`
    pub returns: Vec<ExprWrapper>,
    pub yields: Vec<ExprWrapper>,
    pub raises: Vec<ExprWrapper>,
    pub assignments: Vec<Assignment>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, name: String, parent: Option<ScopeId>, span: Span) -> Self {
        Scope {
            id,
            kind,
            name,
            parent,
            children: vec![],
            span,
            function: None,
            returns: vec![],
            yields: vec![],
            raises: vec![],
            assignments: vec![],
        }
    }

    /// Return and yield expressions together, in that order.
    pub fn exits(&self) -> Vec<&ExprWrapper> {
        self.returns.iter().chain(self.yields.iter()).collect()
    }
}

/// Arena of scopes; the module scope is always `0`.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn root(&self) -> ScopeId {
        0
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// `id` followed by each enclosing scope up to the module.
    pub fn ancestors(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut current = self.scopes[id].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.scopes[parent].parent;
        }
        chain
    }

    /// The class a method scope belongs to.
    pub fn enclosing_class(&self, id: ScopeId) -> Option<ScopeId> {
        self.ancestors(id)
            .into_iter()
            .skip(1)
            .find(|&ancestor| self.scopes[ancestor].kind == ScopeKind::Class)
    }

    /// A direct child scope of `parent` with the given kind and name.
    pub fn child_named(&self, parent: ScopeId, name: &str, kind: ScopeKind) -> Option<ScopeId> {
        self.scopes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.scopes[child].kind == kind && self.scopes[child].name == name)
    }

    /// Every function scope with the given name, in source order.
    pub fn functions_named(&self, name: &str) -> Vec<ScopeId> {
        self.scopes
            .iter()
            .filter(|scope| scope.kind == ScopeKind::Function && scope.name == name)
            .map(|scope| scope.id)
            .collect()
    }

    /// Dotted name of a scope, e.g. `Service.run`.
    pub fn qualified_name(&self, id: ScopeId) -> String {
        let mut parts: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .filter(|&scope| self.scopes[scope].kind != ScopeKind::Module)
            .map(|scope| self.scopes[scope].name.as_str())
            .collect();
        parts.reverse();
        parts.join(".")
    }
}

/// A name bound by an import statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBinding {
    /// Local name introduced by the import
    pub name: String,
    /// Dotted path the name stands for
    pub path: String,
    /// Offset of the import statement
    pub position: u32,
}

/// A parsed source file with its scopes and imports.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    source: String,
    file: Rc<String>,
    module: BlockStmt,
    scopes: ScopeTree,
    imports: Vec<ImportBinding>,
}

impl SourceUnit {
    pub fn parse(source: &str, file: &str) -> Result<SourceUnit, Error> {
        let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
        let file = Rc::new(file.to_string());
        let module = parse(tokens, Rc::clone(&file))?;

        let mut collector = Collector {
            scopes: vec![Scope::new(0, ScopeKind::Module, String::new(), None, module.span.clone())],
            imports: vec![],
        };
        collector.collect_block(&module.body, 0, &[]);

        debug!(
            file = file.as_str(),
            scopes = collector.scopes.len(),
            imports = collector.imports.len(),
            "collected source unit"
        );

        Ok(SourceUnit {
            source: source.to_string(),
            file,
            module,
            scopes: ScopeTree { scopes: collector.scopes },
            imports: collector.imports,
        })
    }

    /// Reads and parses a file, named after its last path component.
    pub fn load(path: &Path) -> Result<SourceUnit, Error> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let source = read_to_string(path).map_err(|error| {
            Error::new(
                ErrorImpl::UnreadableFile {
                    path: path.display().to_string(),
                    message: error.to_string(),
                },
                Position(0, Rc::new(file_name.clone())),
            )
        })?;

        SourceUnit::parse(&source, &file_name)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_name(&self) -> &str {
        &self.file
    }

    pub fn module(&self) -> &BlockStmt {
        &self.module
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn imports(&self) -> &[ImportBinding] {
        &self.imports
    }

    /// Source text covered by `span`.
    pub fn text_of(&self, span: &Span) -> &str {
        self.source.get(span.range()).unwrap_or("")
    }

    /// Looks a function up by plain (`helper`) or qualified (`Service.run`) name.
    pub fn find_function(&self, name: &str) -> Option<ScopeId> {
        self.scopes
            .iter()
            .filter(|scope| scope.kind == ScopeKind::Function)
            .find(|scope| self.scopes.qualified_name(scope.id) == name)
            .or_else(|| {
                self.scopes
                    .iter()
                    .find(|scope| scope.kind == ScopeKind::Function && scope.name == name)
            })
            .map(|scope| scope.id)
    }

    /// All function scopes in source order.
    pub fn functions(&self) -> Vec<ScopeId> {
        self.scopes
            .iter()
            .filter(|scope| scope.kind == ScopeKind::Function)
            .map(|scope| scope.id)
            .collect()
    }
}

struct Collector {
    scopes: Vec<Scope>,
    imports: Vec<ImportBinding>,
}

impl Collector {
    fn push_scope(&mut self, kind: ScopeKind, name: &str, parent: ScopeId, span: &Span) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, kind, name.to_string(), Some(parent), span.clone()));
        self.scopes[parent].children.push(id);
        id
    }

    /// `handled` holds the exceptions of the innermost enclosing `except` clause.
    fn collect_block(&mut self, body: &[StmtWrapper], scope: ScopeId, handled: &[ExprWrapper]) {
        for stmt in body {
            self.collect_stmt(stmt, scope, handled);
        }
    }

    fn collect_stmt(&mut self, stmt: &StmtWrapper, scope: ScopeId, handled: &[ExprWrapper]) {
        match stmt.get_stmt_type() {
            StmtType::FnDeclStmt => {
                if let Some(function) = stmt.downcast::<FnDeclStmt>() {
                    let id = self.push_scope(ScopeKind::Function, &function.name, scope, &function.span);
                    self.scopes[id].function = Some(function.clone());
                    self.collect_block(&function.body, id, &[]);
                }
            }
            StmtType::ClassDeclStmt => {
                if let Some(class) = stmt.downcast::<ClassDeclStmt>() {
                    let id = self.push_scope(ScopeKind::Class, &class.name, scope, &class.span);
                    self.collect_block(&class.body, id, &[]);
                }
            }
            StmtType::ReturnStmt => {
                if let Some(ret) = stmt.downcast::<ReturnStmt>() {
                    let value = match &ret.value {
                        Some(value) => {
                            self.collect_yields(value, scope);
                            value.clone()
                        }
                        None => synthetic_none(&ret.span),
                    };
                    self.scopes[scope].returns.push(value);
                }
            }
            StmtType::RaiseStmt => {
                if let Some(raise) = stmt.downcast::<RaiseStmt>() {
                    match &raise.exception {
                        Some(exception) => self.scopes[scope].raises.push(exception.clone()),
                        // Bare `raise` re-raises whatever the enclosing handler caught
                        None => self.scopes[scope].raises.extend(handled.iter().cloned()),
                    }
                }
            }
            StmtType::AssignStmt => {
                if let Some(assign) = stmt.downcast::<AssignStmt>() {
                    if let Some(value) = &assign.value {
                        self.collect_yields(value, scope);
                    }
                    self.scopes[scope].assignments.push(Assignment {
                        targets: assign.targets.clone(),
                        value: assign.value.clone(),
                        annotation: assign.annotation.clone(),
                    });
                }
            }
            StmtType::AugAssignStmt => {
                if let Some(assign) = stmt.downcast::<AugAssignStmt>() {
                    self.collect_yields(&assign.value, scope);
                }
            }
            StmtType::ExpressionStmt => {
                if let Some(expression) = stmt.downcast::<ExpressionStmt>() {
                    self.collect_yields(&expression.expression, scope);
                }
            }
            StmtType::ImportStmt => {
                if let Some(import) = stmt.downcast::<ImportStmt>() {
                    for name in &import.names {
                        let binding = match &name.alias {
                            Some(alias) => ImportBinding {
                                name: alias.clone(),
                                path: name.path.clone(),
                                position: import.span.start.0,
                            },
                            None => {
                                // `import a.b` only binds `a`
                                let head = name.path.split('.').next().unwrap_or(&name.path);
                                ImportBinding {
                                    name: head.to_string(),
                                    path: head.to_string(),
                                    position: import.span.start.0,
                                }
                            }
                        };
                        self.imports.push(binding);
                    }
                }
            }
            StmtType::FromImportStmt => {
                if let Some(import) = stmt.downcast::<FromImportStmt>() {
                    for name in &import.names {
                        let path = if import.module.is_empty() || import.module.ends_with('.') {
                            format!("{}{}", import.module, name.path)
                        } else {
                            format!("{}.{}", import.module, name.path)
                        };
                        self.imports.push(ImportBinding {
                            name: name.alias.clone().unwrap_or_else(|| name.path.clone()),
                            path,
                            position: import.span.start.0,
                        });
                    }
                }
            }
            StmtType::TryStmt => {
                if let Some(try_stmt) = stmt.downcast::<TryStmt>() {
                    self.collect_block(&try_stmt.body, scope, handled);
                    for handler in &try_stmt.handlers {
                        let caught = handler.exception.as_ref().map(caught_exceptions).unwrap_or_default();
                        self.collect_block(&handler.body, scope, &caught);
                    }
                    self.collect_block(&try_stmt.orelse, scope, handled);
                    self.collect_block(&try_stmt.finalbody, scope, handled);
                }
            }
            _ => {
                for body in nested_bodies(stmt) {
                    self.collect_block(body, scope, handled);
                }
            }
        }
    }

    /// Records `yield` expressions; `yield from` delegates and is not recorded.
    fn collect_yields(&mut self, expr: &ExprWrapper, scope: ScopeId) {
        if let Some(yield_expr) = expr.downcast::<YieldExpr>() {
            if !yield_expr.is_from {
                let value = match &yield_expr.value {
                    Some(value) => value.clone(),
                    None => synthetic_none(&yield_expr.span),
                };
                self.scopes[scope].yields.push(value);
            }
        }

        for child in sub_expressions(expr) {
            self.collect_yields(child, scope);
        }
    }
}

fn synthetic_none(span: &Span) -> ExprWrapper {
    ExprWrapper::new(ConstantExpr {
        constant: Constant::None,
        span: span.clone(),
    })
}

/// `except (A, B)` catches both `A` and `B`.
fn caught_exceptions(exception: &ExprWrapper) -> Vec<ExprWrapper> {
    match exception.downcast::<SequenceExpr>() {
        Some(sequence) if sequence.kind == SequenceKind::Tuple => sequence.elements.clone(),
        _ => vec![exception.clone()],
    }
}
